use crate::error::{LogError, Result};
use crate::log::SessionLog;
use skein_core::entry::new_compaction_entry;
use skein_core::{CompactionPayload, Entry, EntryId, EntryKind, MessagePayload};
use std::collections::HashSet;

/// One step of a branch with compactions applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContextItem<'a> {
    /// A compaction point: its summary stands in for the entries it removed.
    Summary {
        entry: &'a Entry,
        compaction: &'a CompactionPayload,
    },
    /// A message no compaction on the branch has superseded.
    Message {
        entry: &'a Entry,
        message: &'a MessagePayload,
    },
}

impl SessionLog {
    /// Create a checkpoint continuing from `from_entry_id`.
    ///
    /// Appends a `branch_summary` entry (fresh branch id) whose parent is
    /// `from_entry_id`, optionally labels it, and returns its id. History is
    /// not copied; later entries hang off the returned id.
    ///
    /// The entry is appended before the label is written. If only the label
    /// write fails the error is [`LogError::ForkLabel`], which carries the id
    /// of the checkpoint that now exists.
    pub fn fork(&mut self, from_entry_id: &str, label: Option<&str>) -> Result<EntryId> {
        let summary = format!("fork from {from_entry_id}");
        let id = self.append_branch_summary(&summary, Some(from_entry_id))?;
        if let Some(name) = label {
            if let Err(source) = self.set_label(name, &id) {
                return Err(LogError::ForkLabel {
                    id,
                    label: name.to_string(),
                    source: Box::new(source),
                });
            }
        }
        tracing::debug!(%id, from = %from_entry_id, label = ?label, "forked");
        Ok(id)
    }

    /// Record that `summary` supersedes `removed_entries`.
    ///
    /// Every removed id must be on the branch ending at `parent_id`. The
    /// removed entries stay in the log; see [`compacted_context`](Self::compacted_context).
    pub fn append_compaction(
        &mut self,
        summary: &str,
        removed_entries: Vec<EntryId>,
        tokens_before: u64,
        tokens_after: u64,
        parent_id: Option<&str>,
    ) -> Result<EntryId> {
        self.check_on_branch(&removed_entries, parent_id)?;
        self.append_fresh(new_compaction_entry(
            parent_id,
            summary,
            removed_entries,
            tokens_before,
            tokens_after,
        ))
    }

    /// Every id in `ids` must lie on the branch ending at `parent_id`.
    fn check_on_branch(&self, ids: &[EntryId], parent_id: Option<&str>) -> Result<()> {
        let ancestors: HashSet<&str> = match parent_id {
            Some(parent) => {
                if !self.contains(parent) {
                    return Err(LogError::UnknownParent(parent.to_string()));
                }
                self.get_branch(parent)
                    .into_iter()
                    .map(|e| e.id.as_str())
                    .collect()
            }
            None => HashSet::new(),
        };
        match ids.iter().find(|id| !ancestors.contains(id.as_str())) {
            Some(stray) => Err(LogError::NotOnBranch { id: stray.clone() }),
            None => Ok(()),
        }
    }

    /// The branch ending at `entry_id` (latest entry when `None`) with
    /// compactions applied: each compaction yields its summary in place, and
    /// messages listed in any compaction's `removed_entries` on the branch
    /// are left out. Non-message, non-compaction entries are skipped.
    ///
    /// The raw walks (`get_branch`, `get_messages_in_branch`) never do this.
    pub fn compacted_context(&self, entry_id: Option<&str>) -> Vec<ContextItem<'_>> {
        let branch = match entry_id {
            Some(id) => self.get_branch(id),
            None => match self.latest_entry() {
                Some(latest) => self.get_branch(&latest.id),
                None => return Vec::new(),
            },
        };

        let removed: HashSet<&str> = branch
            .iter()
            .filter_map(|e| e.as_compaction())
            .flat_map(|c| c.removed_entries.iter().map(|id| id.as_str()))
            .collect();

        branch
            .into_iter()
            .filter_map(|entry| match &entry.kind {
                EntryKind::Compaction(compaction) => Some(ContextItem::Summary { entry, compaction }),
                EntryKind::Message(message) if !removed.contains(entry.id.as_str()) => {
                    Some(ContextItem::Message { entry, message })
                }
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::tests::open_in;
    use skein_core::Role;

    #[test]
    fn fork_links_to_source_and_binds_label() {
        let tmp = tempfile::tempdir().unwrap();
        let mut log = open_in(tmp.path());
        let x = log.append_message(Role::User, "Hi", None).unwrap();
        let f = log.fork(&x, Some("c1")).unwrap();

        assert_eq!(log.get_label("c1"), Some(f.as_str()));
        assert_eq!(log.labels_for(&f), vec!["c1"]);
        let fork = log.get_entry(&f).unwrap();
        assert_eq!(fork.parent_id.as_deref(), Some(x.as_str()));
        match &fork.kind {
            EntryKind::BranchSummary(b) => {
                assert!(b.branch_id.starts_with("br_"));
                assert!(b.summary.contains(&x));
            }
            other => panic!("expected branch summary, got {other:?}"),
        }
    }

    #[test]
    fn fork_label_failure_reports_created_checkpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let mut log = open_in(tmp.path());
        let u1 = log.append_message(Role::User, "Hi", None).unwrap();
        // a directory where the label file belongs makes the label write fail
        std::fs::create_dir_all(&log.paths().labels_json).unwrap();

        let err = log.fork(&u1, Some("c1")).unwrap_err();
        let fork_id = match err {
            LogError::ForkLabel { id, label, .. } => {
                assert_eq!(label, "c1");
                id
            }
            other => panic!("expected ForkLabel, got {other:?}"),
        };
        assert_eq!(log.len(), 2);
        assert_eq!(log.get_entry(&fork_id).unwrap().parent_id.as_deref(), Some(u1.as_str()));
        assert_eq!(log.get_label("c1"), None);

        // the checkpoint is usable without forking again
        let reopened = open_in(tmp.path());
        assert!(reopened.contains(&fork_id));
        assert_eq!(reopened.restore_branch(&fork_id).unwrap().len(), 1);
    }

    #[test]
    fn forks_get_distinct_branch_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let mut log = open_in(tmp.path());
        let x = log.append_message(Role::User, "Hi", None).unwrap();
        let f1 = log.fork(&x, None).unwrap();
        let f2 = log.fork(&x, None).unwrap();
        let branch_id = |id: &str| match &log.get_entry(id).unwrap().kind {
            EntryKind::BranchSummary(b) => b.branch_id.clone(),
            _ => unreachable!(),
        };
        assert_ne!(branch_id(&f1), branch_id(&f2));
        assert_eq!(log.children(&x).len(), 2);
        assert!(log.labels().all().is_empty());
    }

    #[test]
    fn fork_from_unknown_entry_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let mut log = open_in(tmp.path());
        assert!(matches!(
            log.fork("nope", Some("c1")),
            Err(LogError::UnknownParent(_))
        ));
        assert!(log.is_empty());
        assert_eq!(log.get_label("c1"), None);
    }

    #[test]
    fn history_continues_under_fork() {
        let tmp = tempfile::tempdir().unwrap();
        let mut log = open_in(tmp.path());
        let u1 = log.append_message(Role::User, "Hi", None).unwrap();
        log.append_message(Role::Assistant, "Hello", Some(&u1)).unwrap();
        let f = log.fork(&u1, None).unwrap();
        let alt = log.append_message(Role::Assistant, "Howdy", Some(&f)).unwrap();

        let msgs: Vec<&str> = log
            .get_messages_in_branch(Some(&alt))
            .iter()
            .map(|e| e.as_message().unwrap().content.as_str())
            .collect();
        assert_eq!(msgs, vec!["Hi", "Howdy"]);
    }

    #[test]
    fn compaction_is_recorded_not_applied() {
        let tmp = tempfile::tempdir().unwrap();
        let mut log = open_in(tmp.path());
        let u1 = log.append_message(Role::User, "q1", None).unwrap();
        let a1 = log.append_message(Role::Assistant, "r1", Some(&u1)).unwrap();
        let c = log
            .append_compaction("asked q1, got r1", vec![u1.clone(), a1.clone()], 800, 40, Some(&a1))
            .unwrap();
        let u2 = log.append_message(Role::User, "q2", Some(&c)).unwrap();

        let compaction = log.get_entry(&c).unwrap().as_compaction().unwrap();
        assert_eq!(compaction.removed_entries, vec![u1.clone(), a1.clone()]);
        assert_eq!(compaction.tokens_before, 800);
        assert_eq!(compaction.tokens_after, 40);

        // raw view keeps everything
        assert_eq!(log.get_messages_in_branch(Some(&u2)).len(), 3);
        assert!(log.get_entry(&u1).is_some());
    }

    #[test]
    fn compacted_context_swaps_in_summary() {
        let tmp = tempfile::tempdir().unwrap();
        let mut log = open_in(tmp.path());
        let sys = log.append_message(Role::System, "rules", None).unwrap();
        let u1 = log.append_message(Role::User, "q1", Some(&sys)).unwrap();
        let a1 = log.append_message(Role::Assistant, "r1", Some(&u1)).unwrap();
        let c = log
            .append_compaction("summary", vec![u1, a1.clone()], 800, 40, Some(&a1))
            .unwrap();
        let u2 = log.append_message(Role::User, "q2", Some(&c)).unwrap();

        let items = log.compacted_context(Some(&u2));
        let rendered: Vec<String> = items
            .iter()
            .map(|item| match item {
                ContextItem::Summary { compaction, .. } => format!("summary:{}", compaction.summary),
                ContextItem::Message { message, .. } => message.content.clone(),
            })
            .collect();
        assert_eq!(rendered, vec!["rules", "summary:summary", "q2"]);
        assert_eq!(log.compacted_context(None), items);
    }

    #[test]
    fn compaction_on_other_branch_does_not_hide_messages() {
        let tmp = tempfile::tempdir().unwrap();
        let mut log = open_in(tmp.path());
        let u1 = log.append_message(Role::User, "q1", None).unwrap();
        let a1 = log.append_message(Role::Assistant, "r1", Some(&u1)).unwrap();
        log.append_compaction("s", vec![a1.clone()], 10, 1, Some(&a1))
            .unwrap();
        let alt = log.append_message(Role::User, "q1b", Some(&a1)).unwrap();

        let items = log.compacted_context(Some(&alt));
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn compaction_rejects_ids_off_the_branch() {
        let tmp = tempfile::tempdir().unwrap();
        let mut log = open_in(tmp.path());
        let u1 = log.append_message(Role::User, "q1", None).unwrap();
        let other = log.append_message(Role::User, "elsewhere", None).unwrap();
        assert!(matches!(
            log.append_compaction("s", vec![other.clone()], 1, 1, Some(&u1)),
            Err(LogError::NotOnBranch { ref id }) if *id == other
        ));
        assert!(matches!(
            log.append_compaction("s", vec![u1.clone()], 1, 1, None),
            Err(LogError::NotOnBranch { .. })
        ));
        assert!(matches!(
            log.append_compaction("s", vec![], 1, 1, Some("missing")),
            Err(LogError::UnknownParent(_))
        ));
        // a root compaction with nothing removed is fine
        log.append_compaction("fresh start", vec![], 0, 0, None)
            .unwrap();
        assert_eq!(log.len(), 3);
    }
}
