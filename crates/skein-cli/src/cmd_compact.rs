use crate::session::{resolve_or_latest, resolve_ref, Target};

pub struct CompactParams<'a> {
    pub target: &'a Target,
    pub summary: &'a str,
    pub removed: &'a [String],
    pub tokens_before: u64,
    pub tokens_after: u64,
    pub parent: Option<&'a str>,
}

/// `skein compact <summary> --remove <id>... [--tokens-before] [--tokens-after] [--parent]`
pub fn execute(params: CompactParams<'_>) -> anyhow::Result<()> {
    let mut log = params.target.open()?;
    let parent = resolve_or_latest(&log, params.parent)?;
    let removed = params
        .removed
        .iter()
        .map(|r| resolve_ref(&log, r))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let count = removed.len();
    let id = log.append_compaction(
        params.summary,
        removed,
        params.tokens_before,
        params.tokens_after,
        parent.as_deref(),
    )?;
    println!("{id} (supersedes {count} entries)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::target_in;
    use skein_core::Role;

    #[test]
    fn compacts_the_current_branch() {
        let tmp = tempfile::tempdir().unwrap();
        let target = target_in(tmp.path());
        let (u1, a1) = {
            let mut log = target.open().unwrap();
            let u1 = log.append_message(Role::User, "q1", None).unwrap();
            let a1 = log.append_message(Role::Assistant, "r1", Some(&u1)).unwrap();
            (u1, a1)
        };

        let removed = vec![u1.clone(), a1.clone()];
        execute(CompactParams {
            target: &target,
            summary: "asked and answered",
            removed: &removed,
            tokens_before: 500,
            tokens_after: 20,
            parent: None,
        })
        .unwrap();

        let log = target.open().unwrap();
        let latest = log.latest_entry().unwrap();
        assert_eq!(latest.parent_id.as_deref(), Some(a1.as_str()));
        let compaction = latest.as_compaction().unwrap();
        assert_eq!(compaction.removed_entries, removed);
        assert_eq!(log.compacted_context(None).len(), 1);
    }

    #[test]
    fn rejects_entries_off_the_branch() {
        let tmp = tempfile::tempdir().unwrap();
        let target = target_in(tmp.path());
        let stray = {
            let mut log = target.open().unwrap();
            let stray = log.append_message(Role::User, "elsewhere", None).unwrap();
            log.append_message(Role::User, "q1", None).unwrap();
            stray
        };
        let removed = vec![stray];
        let res = execute(CompactParams {
            target: &target,
            summary: "s",
            removed: &removed,
            tokens_before: 0,
            tokens_after: 0,
            parent: None,
        });
        assert!(res.is_err());
        assert_eq!(target.open().unwrap().len(), 2);
    }
}
