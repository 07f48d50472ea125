use crate::error::{LogError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What happens when the line for an appended entry cannot be written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Write first; on failure return the error and keep the entry out of memory.
    #[default]
    Strict,
    /// Index first; on failure log a warning and keep the entry in memory only.
    BestEffort,
}

impl std::str::FromStr for WritePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "strict" => Ok(WritePolicy::Strict),
            "best_effort" | "best-effort" => Ok(WritePolicy::BestEffort),
            other => Err(format!("unknown write policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub write_policy: WritePolicy,
    /// `fsync` after every appended line (a flush always happens).
    pub fsync: bool,
    /// Hold an exclusive advisory lock on `<log stem>.lock` while appending.
    pub lock_appends: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            write_policy: WritePolicy::Strict,
            fsync: false,
            lock_appends: true,
        }
    }
}

impl LogConfig {
    /// Read config from a JSON file. Returns defaults if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| LogError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Defaults overridden by `SKEIN_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply `SKEIN_WRITE_POLICY`, `SKEIN_FSYNC` and `SKEIN_LOCK_APPENDS`
    /// from `lookup`. Unparsable values are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("SKEIN_WRITE_POLICY") {
            match v.trim().parse() {
                Ok(policy) => self.write_policy = policy,
                Err(e) => tracing::warn!(value = %v, "ignoring SKEIN_WRITE_POLICY: {e}"),
            }
        }
        if let Some(v) = lookup("SKEIN_FSYNC") {
            match parse_bool(&v) {
                Some(b) => self.fsync = b,
                None => tracing::warn!(value = %v, "ignoring SKEIN_FSYNC: not a boolean"),
            }
        }
        if let Some(v) = lookup("SKEIN_LOCK_APPENDS") {
            match parse_bool(&v) {
                Some(b) => self.lock_appends = b,
                None => tracing::warn!(value = %v, "ignoring SKEIN_LOCK_APPENDS: not a boolean"),
            }
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
