use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Return the per-user store root.
/// Linux: `$XDG_DATA_HOME/skein/`, macOS: `~/Library/Application Support/skein/`,
/// Windows: `%APPDATA%\skein\` (falls back to `~/.skein/`).
pub fn store_root() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("skein")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".skein")
    } else {
        PathBuf::from(".skein-store")
    }
}

/// Directory holding one log file per session: `store_root/sessions/`.
pub fn sessions_dir() -> PathBuf {
    store_root().join("sessions")
}

/// Log file for a session id under `base`: `<base>/<session_id>.jsonl`.
pub fn session_log_path_in(base: &Path, session_id: &str) -> anyhow::Result<PathBuf> {
    validate_session_id(session_id)?;
    Ok(base.join(format!("{session_id}.jsonl")))
}

/// Log file for a session id in the per-user store.
pub fn session_log_path(session_id: &str) -> anyhow::Result<PathBuf> {
    session_log_path_in(&sessions_dir(), session_id)
}

fn validate_session_id(id: &str) -> anyhow::Result<()> {
    if id.is_empty() || id.len() > 128 {
        anyhow::bail!("invalid session id: must be 1-128 characters");
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
    {
        anyhow::bail!("invalid session id: only [A-Za-z0-9._-] allowed");
    }
    if id.starts_with('.') {
        anyhow::bail!("invalid session id: must not start with '.'");
    }
    Ok(())
}

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("creating temp file in {}", parent.display()))?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
