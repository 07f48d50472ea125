use std::path::{Path, PathBuf};

/// All files that belong to one session log.
#[derive(Debug, Clone)]
pub struct LogPaths {
    pub log_file: PathBuf,
    pub labels_json: PathBuf,
    pub lock_file: PathBuf,
}

impl LogPaths {
    /// Derive sibling paths from the log file. Pure computation, no I/O.
    ///
    /// `chat.jsonl` → `chat.labels.json`, `chat.lock`.
    pub fn for_log(log_file: impl Into<PathBuf>) -> Self {
        let log_file = log_file.into();
        Self {
            labels_json: sibling(&log_file, "labels.json"),
            lock_file: sibling(&log_file, "lock"),
            log_file,
        }
    }

    /// Create the parent directory of the log. Idempotent.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        if let Some(parent) = self.log_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

fn sibling(log_file: &Path, suffix: &str) -> PathBuf {
    let stem = log_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "session".to_string());
    log_file.with_file_name(format!("{stem}.{suffix}"))
}
