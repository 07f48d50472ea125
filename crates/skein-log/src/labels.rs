use crate::error::Result;
use skein_core::EntryId;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Named, rebindable pointers into the log, persisted as one JSON object
/// (`{"name": "entry id", ...}`) beside the log file.
///
/// Unlike the log itself this file is rewritten on every change. Writes go
/// through a temp file and rename, so a crash leaves the old or the new map.
#[derive(Debug, Clone)]
pub struct LabelStore {
    path: PathBuf,
    labels: BTreeMap<String, EntryId>,
}

impl LabelStore {
    /// Load labels from `path`. A missing file is an empty map; an unreadable
    /// or malformed file is logged and also treated as empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let labels = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        %error,
                        "label file is malformed; starting with no labels"
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    %error,
                    "cannot read label file; starting with no labels"
                );
                BTreeMap::new()
            }
        };
        Self { path, labels }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(|s| s.as_str())
    }

    /// Bind `name` to `entry_id`, replacing any previous binding.
    /// Memory changes only after the file was replaced.
    pub fn set(&mut self, name: &str, entry_id: &str) -> Result<()> {
        let mut next = self.labels.clone();
        next.insert(name.to_string(), entry_id.to_string());
        self.persist(&next)?;
        self.labels = next;
        Ok(())
    }

    /// Unbind `name`. Returns the entry it pointed at, if any.
    pub fn remove(&mut self, name: &str) -> Result<Option<EntryId>> {
        if !self.labels.contains_key(name) {
            return Ok(None);
        }
        let mut next = self.labels.clone();
        let old = next.remove(name);
        self.persist(&next)?;
        self.labels = next;
        Ok(old)
    }

    /// All bindings, sorted by name.
    pub fn all(&self) -> &BTreeMap<String, EntryId> {
        &self.labels
    }

    /// Names bound to `entry_id`, sorted.
    pub fn names_for(&self, entry_id: &str) -> Vec<&str> {
        self.labels
            .iter()
            .filter(|(_, id)| id.as_str() == entry_id)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn persist(&self, labels: &BTreeMap<String, EntryId>) -> Result<()> {
        let json = serde_json::to_string_pretty(labels)?;
        skein_store::write_atomic(&self.path, json.as_bytes())?;
        Ok(())
    }
}
