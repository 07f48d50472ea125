use serde::{Deserialize, Serialize};

/// Entry ID format: UUID v4, hyphenated lowercase.
pub type EntryId = String;

/// Branch identifier minted by forks: `br_<ulid>`.
pub type BranchId = String;

/// Free-form JSON object carried by messages and custom entries.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Well-known entry type names (the `type` discriminator on disk).
pub mod entry_type {
    pub const MESSAGE: &str = "message";
    pub const COMPACTION: &str = "compaction";
    pub const BRANCH_SUMMARY: &str = "branch_summary";
    pub const MODEL_CHANGE: &str = "model_change";
    pub const THINKING_LEVEL_CHANGE: &str = "thinking_level_change";
    pub const CUSTOM: &str = "custom";
}

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
    #[serde(alias = "tool")]
    ToolResult,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::ToolResult => "tool_result",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            "tool_result" | "tool" => Ok(Role::ToolResult),
            other => Err(format!(
                "unknown role: {other} (expected user, assistant, system or tool_result)"
            )),
        }
    }
}

/// A tool invocation requested by an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: JsonMap,
}

impl MessagePayload {
    /// Plain message with no tool data or metadata.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            metadata: JsonMap::new(),
        }
    }
}

/// Records that `summary` supersedes `removed_entries`. Nothing is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactionPayload {
    pub summary: String,
    #[serde(default)]
    pub removed_entries: Vec<EntryId>,
    pub tokens_before: u64,
    pub tokens_after: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchSummaryPayload {
    pub summary: String,
    pub branch_id: BranchId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelChangePayload {
    #[serde(default)]
    pub old_model: Option<String>,
    pub new_model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingLevelChangePayload {
    #[serde(default)]
    pub old_level: Option<String>,
    pub new_level: String,
}

/// Extension point: an arbitrary tagged record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPayload {
    pub custom_type: String,
    #[serde(default)]
    pub data: JsonMap,
}

/// Variant payload of an entry, discriminated by `type` on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryKind {
    Message(MessagePayload),
    Compaction(CompactionPayload),
    BranchSummary(BranchSummaryPayload),
    ModelChange(ModelChangePayload),
    ThinkingLevelChange(ThinkingLevelChangePayload),
    Custom(CustomPayload),
}

impl EntryKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            EntryKind::Message(_) => entry_type::MESSAGE,
            EntryKind::Compaction(_) => entry_type::COMPACTION,
            EntryKind::BranchSummary(_) => entry_type::BRANCH_SUMMARY,
            EntryKind::ModelChange(_) => entry_type::MODEL_CHANGE,
            EntryKind::ThinkingLevelChange(_) => entry_type::THINKING_LEVEL_CHANGE,
            EntryKind::Custom(_) => entry_type::CUSTOM,
        }
    }
}

/// A single log entry (one JSONL line in the session log).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub parent_id: Option<EntryId>,
    pub timestamp: String,
    #[serde(flatten)]
    pub kind: EntryKind,
}

impl Entry {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn as_message(&self) -> Option<&MessagePayload> {
        match &self.kind {
            EntryKind::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_compaction(&self) -> Option<&CompactionPayload> {
        match &self.kind {
            EntryKind::Compaction(c) => Some(c),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}
