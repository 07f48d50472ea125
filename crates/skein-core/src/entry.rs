use crate::types::{
    BranchSummaryPayload, CompactionPayload, CustomPayload, Entry, EntryId, EntryKind, JsonMap,
    MessagePayload, ModelChangePayload, Role, ThinkingLevelChangePayload,
};

/// Mint a fresh entry id (UUID v4).
pub fn new_entry_id() -> EntryId {
    uuid::Uuid::new_v4().to_string()
}

/// Mint a fresh branch identifier: `br_<ulid>`.
pub fn new_branch_id() -> String {
    format!("br_{}", ulid::Ulid::new().to_string().to_lowercase())
}

pub fn now_rfc3339() -> String {
    let now = time::OffsetDateTime::now_utc();
    now.format(&time::format_description::well_known::Rfc3339)
        .expect("RFC3339 formatting should not fail")
}

/// Build an entry with a fresh id and the current timestamp.
pub fn new_entry(parent_id: Option<&str>, kind: EntryKind) -> Entry {
    Entry {
        id: new_entry_id(),
        parent_id: parent_id.map(|s| s.to_string()),
        timestamp: now_rfc3339(),
        kind,
    }
}

pub fn new_message_entry(parent_id: Option<&str>, role: Role, content: &str) -> Entry {
    new_entry(
        parent_id,
        EntryKind::Message(MessagePayload::new(role, content)),
    )
}

pub fn new_compaction_entry(
    parent_id: Option<&str>,
    summary: &str,
    removed_entries: Vec<EntryId>,
    tokens_before: u64,
    tokens_after: u64,
) -> Entry {
    new_entry(
        parent_id,
        EntryKind::Compaction(CompactionPayload {
            summary: summary.to_string(),
            removed_entries,
            tokens_before,
            tokens_after,
        }),
    )
}

/// Create a `branch_summary` entry with a newly minted branch id.
pub fn new_branch_summary_entry(parent_id: Option<&str>, summary: &str) -> Entry {
    new_entry(
        parent_id,
        EntryKind::BranchSummary(BranchSummaryPayload {
            summary: summary.to_string(),
            branch_id: new_branch_id(),
        }),
    )
}

pub fn new_model_change_entry(
    parent_id: Option<&str>,
    old_model: Option<&str>,
    new_model: &str,
) -> Entry {
    new_entry(
        parent_id,
        EntryKind::ModelChange(ModelChangePayload {
            old_model: old_model.map(|s| s.to_string()),
            new_model: new_model.to_string(),
        }),
    )
}

pub fn new_thinking_level_change_entry(
    parent_id: Option<&str>,
    old_level: Option<&str>,
    new_level: &str,
) -> Entry {
    new_entry(
        parent_id,
        EntryKind::ThinkingLevelChange(ThinkingLevelChangePayload {
            old_level: old_level.map(|s| s.to_string()),
            new_level: new_level.to_string(),
        }),
    )
}

pub fn new_custom_entry(parent_id: Option<&str>, custom_type: &str, data: JsonMap) -> Entry {
    new_entry(
        parent_id,
        EntryKind::Custom(CustomPayload {
            custom_type: custom_type.to_string(),
            data,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{entry_type, ToolCall};

    #[test]
    fn entry_ids_are_uuid_v4() {
        let id = new_entry_id();
        let parsed = uuid::Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_ne!(id, new_entry_id());
    }

    #[test]
    fn branch_ids_have_prefix() {
        let id = new_branch_id();
        assert!(id.starts_with("br_"));
        assert_eq!(id.len(), 3 + 26);
        assert_eq!(id, id.to_lowercase());
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let ts = now_rfc3339();
        time::OffsetDateTime::parse(&ts, &time::format_description::well_known::Rfc3339)
            .unwrap();
    }

    #[test]
    fn message_line_is_flat_with_type_tag() {
        let entry = new_message_entry(None, Role::User, "Hi");
        let val = serde_json::to_value(&entry).unwrap();
        assert_eq!(val["type"], "message");
        assert_eq!(val["role"], "user");
        assert_eq!(val["content"], "Hi");
        assert_eq!(val["id"], entry.id.as_str());
        assert!(val["parent_id"].is_null());
        assert!(val["timestamp"].is_string());
        // empty optionals are not written
        assert!(val.get("tool_calls").is_none());
        assert!(val.get("tool_call_id").is_none());
        assert!(val.get("metadata").is_none());
    }

    #[test]
    fn every_kind_round_trips_through_a_line() {
        let root = new_message_entry(None, Role::System, "be brief");
        let mut data = JsonMap::new();
        data.insert("k".to_string(), serde_json::json!([1, 2]));
        let entries = vec![
            root.clone(),
            new_compaction_entry(Some(&root.id), "sum", vec![root.id.clone()], 900, 120),
            new_branch_summary_entry(Some(&root.id), "fork"),
            new_model_change_entry(Some(&root.id), Some("a"), "b"),
            new_thinking_level_change_entry(Some(&root.id), None, "high"),
            new_custom_entry(Some(&root.id), "bookmark", data),
        ];
        for entry in entries {
            let line = serde_json::to_string(&entry).unwrap();
            assert!(!line.contains('\n'));
            let back: Entry = serde_json::from_str(&line).unwrap();
            assert_eq!(back, entry);
        }
    }

    #[test]
    fn type_names_match_discriminator() {
        let e = new_thinking_level_change_entry(None, Some("low"), "high");
        let val = serde_json::to_value(&e).unwrap();
        assert_eq!(val["type"], entry_type::THINKING_LEVEL_CHANGE);
        assert_eq!(e.type_name(), entry_type::THINKING_LEVEL_CHANGE);
    }

    #[test]
    fn message_with_tool_calls_deserializes() {
        let json = r#"{
            "id": "a1",
            "parent_id": "u1",
            "timestamp": "2026-01-01T00:00:00Z",
            "type": "message",
            "role": "assistant",
            "content": "",
            "tool_calls": [{"id": "call_1", "name": "read", "arguments": {"path": "x"}}],
            "metadata": {"model": "m"}
        }"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        let msg = entry.as_message().unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(
            msg.tool_calls,
            vec![ToolCall {
                id: "call_1".to_string(),
                name: "read".to_string(),
                arguments: serde_json::json!({"path": "x"}),
            }]
        );
        assert_eq!(msg.metadata["model"], "m");
    }

    #[test]
    fn tool_role_alias_accepted() {
        let json = r#"{"id":"t1","parent_id":null,"timestamp":"2026-01-01T00:00:00Z",
            "type":"message","role":"tool","content":"ok","tool_call_id":"call_1"}"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        let msg = entry.as_message().unwrap();
        assert_eq!(msg.role, Role::ToolResult);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn missing_parent_field_means_root() {
        let json = r#"{"id":"m1","timestamp":"2026-01-01T00:00:00Z",
            "type":"model_change","new_model":"b"}"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        assert!(entry.is_root());
        assert!(matches!(
            entry.kind,
            EntryKind::ModelChange(ModelChangePayload { old_model: None, .. })
        ));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let json = r#"{"id":"x","parent_id":null,"timestamp":"t","type":"hologram"}"#;
        assert!(serde_json::from_str::<Entry>(json).is_err());
    }

    #[test]
    fn role_parses_from_cli_strings() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("tool".parse::<Role>().unwrap(), Role::ToolResult);
        assert!("robot".parse::<Role>().is_err());
        assert_eq!(Role::ToolResult.to_string(), "tool_result");
    }
}
