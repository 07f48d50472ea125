use crate::error::{LogError, Result};
use crate::log::SessionLog;
use serde::{Deserialize, Serialize};
use skein_core::{Entry, Role};

/// Role/content pair handed to prompt assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedMessage {
    pub role: Role,
    pub content: String,
}

impl SessionLog {
    /// Reconstruct the branch ending at `entry_id`, root first.
    ///
    /// Walks `parent_id` links upward. An unknown target yields an empty
    /// branch; a parent missing from the log ends the walk early and the
    /// partial chain collected so far is returned. Both are logged.
    pub fn get_branch(&self, entry_id: &str) -> Vec<&Entry> {
        let mut chain = Vec::new();
        let Some(&start) = self.index.get(entry_id) else {
            tracing::warn!(id = %entry_id, "branch target not found");
            return chain;
        };

        let mut visited = vec![false; self.entries.len()];
        let mut current = Some(start);
        while let Some(pos) = current {
            if visited[pos] {
                tracing::warn!(id = %entry_id, "parent cycle detected; branch truncated");
                break;
            }
            visited[pos] = true;
            let entry = &self.entries[pos];
            chain.push(entry);
            current = match &entry.parent_id {
                None => None,
                Some(parent) => match self.index.get(parent) {
                    Some(&p) => Some(p),
                    None => {
                        tracing::warn!(
                            id = %entry.id,
                            parent = %parent,
                            "parent missing from log; returning partial branch"
                        );
                        None
                    }
                },
            };
        }
        chain.reverse();
        chain
    }

    /// Message entries on the branch ending at `entry_id`, root first.
    /// Without an id, the branch of the most recently appended entry is used.
    pub fn get_messages_in_branch(&self, entry_id: Option<&str>) -> Vec<&Entry> {
        let target = match entry_id {
            Some(id) => id,
            None => match self.latest_entry() {
                Some(entry) => entry.id.as_str(),
                None => return Vec::new(),
            },
        };
        self.get_branch(target)
            .into_iter()
            .filter(|e| e.as_message().is_some())
            .collect()
    }

    /// Role/content sequence for the branch ending at `entry_id`
    /// (latest entry when `None`).
    pub fn export_messages(&self, entry_id: Option<&str>) -> Vec<ExportedMessage> {
        self.get_messages_in_branch(entry_id)
            .into_iter()
            .filter_map(|e| e.as_message())
            .map(|m| ExportedMessage {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }

    /// The message history a checkpoint at `entry_id` restores to.
    pub fn restore_branch(&self, entry_id: &str) -> Result<Vec<&Entry>> {
        if !self.contains(entry_id) {
            return Err(LogError::UnknownEntry(entry_id.to_string()));
        }
        Ok(self.get_messages_in_branch(Some(entry_id)))
    }

    /// Like [`restore_branch`](Self::restore_branch), addressed by label.
    pub fn restore_label(&self, name: &str) -> Result<Vec<&Entry>> {
        let id = self
            .get_label(name)
            .ok_or_else(|| LogError::UnknownLabel(name.to_string()))?;
        self.restore_branch(id)
    }
}
