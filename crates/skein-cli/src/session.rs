use anyhow::Context;
use skein_core::EntryId;
use skein_log::{LogConfig, SessionLog};
use std::path::PathBuf;

/// Where the session log lives and how to open it, from the global flags.
pub struct Target {
    pub log: Option<PathBuf>,
    pub session: Option<String>,
    pub config: Option<PathBuf>,
}

impl Target {
    pub fn log_path(&self) -> anyhow::Result<PathBuf> {
        match (&self.log, &self.session) {
            (Some(path), _) => Ok(path.clone()),
            (None, Some(id)) => skein_store::session_log_path(id),
            (None, None) => {
                anyhow::bail!("No session log given. Pass --log <file> or --session <id>.")
            }
        }
    }

    /// Config file (if any), then `SKEIN_*` overrides.
    pub fn config(&self) -> anyhow::Result<LogConfig> {
        let Some(path) = &self.config else {
            return Ok(LogConfig::from_env());
        };
        let mut config = LogConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn open(&self) -> anyhow::Result<SessionLog> {
        let path = self.log_path()?;
        let config = self.config()?;
        tracing::debug!(path = %path.display(), ?config, "opening session log");
        let log = SessionLog::open(&path, config)
            .with_context(|| format!("opening session log {}", path.display()))?;
        Ok(log)
    }
}

/// Resolve an entry id or, failing that, a label name.
pub fn resolve_ref(log: &SessionLog, reference: &str) -> anyhow::Result<EntryId> {
    if log.contains(reference) {
        return Ok(reference.to_string());
    }
    match log.get_label(reference) {
        Some(id) => Ok(id.to_string()),
        None => anyhow::bail!("No entry or label named '{reference}'"),
    }
}

/// The referenced entry when given, otherwise the latest entry (none on an
/// empty log).
pub fn resolve_or_latest(
    log: &SessionLog,
    reference: Option<&str>,
) -> anyhow::Result<Option<EntryId>> {
    match reference {
        Some(reference) => resolve_ref(log, reference).map(Some),
        None => Ok(log.latest_entry().map(|e| e.id.clone())),
    }
}

#[cfg(test)]
pub(crate) fn target_in(dir: &std::path::Path) -> Target {
    Target {
        log: Some(dir.join("session.jsonl")),
        session: None,
        config: None,
    }
}
