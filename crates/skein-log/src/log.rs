use crate::config::{LogConfig, WritePolicy};
use crate::error::{LogError, Result};
use crate::labels::LabelStore;
use crate::lock::AppendLock;
use crate::paths::LogPaths;
use skein_core::entry::{
    new_branch_summary_entry, new_custom_entry, new_entry, new_entry_id, new_message_entry,
    new_model_change_entry, new_thinking_level_change_entry,
};
use skein_core::{Entry, EntryId, EntryKind, JsonMap, MessagePayload, Role};
use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// The append-only session log backed by one JSONL file.
///
/// Entries live in an arena (`entries`, file order) with an id → position
/// index and a parent → children index, both rebuilt on load and extended
/// on every append. Nothing is ever rewritten or removed.
pub struct SessionLog {
    pub(crate) paths: LogPaths,
    pub(crate) config: LogConfig,
    pub(crate) entries: Vec<Entry>,
    pub(crate) index: HashMap<EntryId, usize>,
    pub(crate) children: HashMap<EntryId, Vec<usize>>,
    pub(crate) roots: Vec<usize>,
    pub(crate) labels: LabelStore,
}

impl SessionLog {
    /// Open the log at `path`, loading whatever it already holds.
    /// A missing file is an empty log; it is created on first append.
    pub fn open(path: impl AsRef<Path>, config: LogConfig) -> Result<Self> {
        let paths = LogPaths::for_log(path.as_ref());
        let labels = LabelStore::load(&paths.labels_json);
        let mut log = Self {
            paths,
            config,
            entries: Vec::new(),
            index: HashMap::new(),
            children: HashMap::new(),
            roots: Vec::new(),
            labels,
        };
        log.load()?;
        Ok(log)
    }

    /// Re-read the log and label files from scratch.
    pub fn reload(&mut self) -> Result<()> {
        self.entries.clear();
        self.index.clear();
        self.children.clear();
        self.roots.clear();
        self.labels = LabelStore::load(&self.paths.labels_json);
        self.load()
    }

    /// Parse every line of the log file. Unreadable lines are skipped with a
    /// warning; a torn final line from a crash is just another such line.
    fn load(&mut self) -> Result<()> {
        let bytes = match std::fs::read(&self.paths.log_file) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for (n, line) in bytes.split(|b| *b == b'\n').enumerate() {
            let line_no = n + 1;
            if line.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }
            let entry: Entry = match serde_json::from_slice(line) {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!(
                        path = %self.paths.log_file.display(),
                        line = line_no,
                        %error,
                        "skipping unreadable log line"
                    );
                    continue;
                }
            };
            if self.index.contains_key(&entry.id) {
                tracing::warn!(
                    line = line_no,
                    id = %entry.id,
                    "skipping log line with duplicate entry id"
                );
                continue;
            }
            if let Some(parent) = &entry.parent_id {
                if !self.index.contains_key(parent) {
                    tracing::warn!(
                        line = line_no,
                        id = %entry.id,
                        parent = %parent,
                        "entry refers to a parent that does not precede it"
                    );
                }
            }
            self.insert(entry);
        }
        tracing::debug!(
            path = %self.paths.log_file.display(),
            entries = self.entries.len(),
            "session log loaded"
        );
        Ok(())
    }

    /// Add an entry to the arena and both indexes.
    fn insert(&mut self, entry: Entry) {
        let pos = self.entries.len();
        match &entry.parent_id {
            Some(parent) => self.children.entry(parent.clone()).or_default().push(pos),
            None => self.roots.push(pos),
        }
        self.index.insert(entry.id.clone(), pos);
        self.entries.push(entry);
    }

    /// Append a fully built entry. Rejects ids already in the log and
    /// parents that are not in it.
    pub fn append_entry(&mut self, entry: Entry) -> Result<EntryId> {
        if self.index.contains_key(&entry.id) {
            return Err(LogError::DuplicateId(entry.id));
        }
        if let Some(parent) = &entry.parent_id {
            if !self.index.contains_key(parent) {
                return Err(LogError::UnknownParent(parent.clone()));
            }
        }

        let line = serde_json::to_string(&entry)?;
        let id = entry.id.clone();
        match self.config.write_policy {
            WritePolicy::Strict => {
                self.write_line(&line)?;
                self.insert(entry);
            }
            WritePolicy::BestEffort => {
                self.insert(entry);
                if let Err(error) = self.write_line(&line) {
                    tracing::warn!(
                        %id,
                        %error,
                        "entry kept in memory only; log write failed"
                    );
                }
            }
        }
        Ok(id)
    }

    /// Append one line and flush it before returning.
    fn write_line(&self, line: &str) -> Result<()> {
        let path = &self.paths.log_file;
        let write_err = |source: std::io::Error| LogError::Write {
            path: path.clone(),
            source,
        };

        self.paths.ensure_layout().map_err(write_err)?;
        let _lock = if self.config.lock_appends {
            Some(AppendLock::acquire(&self.paths)?)
        } else {
            None
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(write_err)?;

        let mut buf = String::with_capacity(line.len() + 2);
        // A crash may have left a torn line without its newline; never glue onto it.
        if !ends_with_newline(&mut file).map_err(write_err)? {
            buf.push('\n');
        }
        buf.push_str(line);
        buf.push('\n');

        file.write_all(buf.as_bytes()).map_err(write_err)?;
        file.flush().map_err(write_err)?;
        if self.config.fsync {
            file.sync_all().map_err(write_err)?;
        }
        Ok(())
    }

    /// Append a freshly built entry, re-minting its id on the off chance it
    /// collides with one already in the log.
    pub(crate) fn append_fresh(&mut self, mut entry: Entry) -> Result<EntryId> {
        while self.index.contains_key(&entry.id) {
            entry.id = new_entry_id();
        }
        self.append_entry(entry)
    }

    // ── Producers ──

    pub fn append(&mut self, parent_id: Option<&str>, kind: EntryKind) -> Result<EntryId> {
        self.append_fresh(new_entry(parent_id, kind))
    }

    pub fn append_message(
        &mut self,
        role: Role,
        content: &str,
        parent_id: Option<&str>,
    ) -> Result<EntryId> {
        self.append_fresh(new_message_entry(parent_id, role, content))
    }

    /// Append a message carrying tool calls, a tool-call id or metadata.
    pub fn append_message_with(
        &mut self,
        message: MessagePayload,
        parent_id: Option<&str>,
    ) -> Result<EntryId> {
        self.append(parent_id, EntryKind::Message(message))
    }

    pub fn append_model_change(
        &mut self,
        old_model: Option<&str>,
        new_model: &str,
        parent_id: Option<&str>,
    ) -> Result<EntryId> {
        self.append_fresh(new_model_change_entry(parent_id, old_model, new_model))
    }

    pub fn append_thinking_level_change(
        &mut self,
        old_level: Option<&str>,
        new_level: &str,
        parent_id: Option<&str>,
    ) -> Result<EntryId> {
        self.append_fresh(new_thinking_level_change_entry(
            parent_id, old_level, new_level,
        ))
    }

    pub fn append_custom(
        &mut self,
        custom_type: &str,
        data: JsonMap,
        parent_id: Option<&str>,
    ) -> Result<EntryId> {
        self.append_fresh(new_custom_entry(parent_id, custom_type, data))
    }

    /// Append a `branch_summary` entry with a freshly minted branch id.
    pub fn append_branch_summary(
        &mut self,
        summary: &str,
        parent_id: Option<&str>,
    ) -> Result<EntryId> {
        self.append_fresh(new_branch_summary_entry(parent_id, summary))
    }

    // ── Labels ──

    /// Bind `name` to an existing entry.
    pub fn set_label(&mut self, name: &str, entry_id: &str) -> Result<()> {
        if !self.index.contains_key(entry_id) {
            return Err(LogError::UnknownEntry(entry_id.to_string()));
        }
        self.labels.set(name, entry_id)
    }

    pub fn get_label(&self, name: &str) -> Option<&str> {
        self.labels.get(name)
    }

    pub fn remove_label(&mut self, name: &str) -> Result<Option<EntryId>> {
        self.labels.remove(name)
    }

    pub fn labels(&self) -> &LabelStore {
        &self.labels
    }

    /// Labels currently bound to `entry_id`, sorted.
    pub fn labels_for(&self, entry_id: &str) -> Vec<&str> {
        self.labels.names_for(entry_id)
    }

    // ── Accessors ──

    pub fn paths(&self) -> &LogPaths {
        &self.paths
    }

    pub fn path(&self) -> &Path {
        &self.paths.log_file
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// All entries in file order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get_entry(&self, id: &str) -> Option<&Entry> {
        self.index.get(id).map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// The most recently appended entry in the whole log.
    pub fn latest_entry(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Direct children of `id`, in file order.
    pub fn children(&self, id: &str) -> Vec<&Entry> {
        self.child_positions(id)
            .iter()
            .map(|&pos| &self.entries[pos])
            .collect()
    }

    /// Entries without a parent, in file order.
    pub fn roots(&self) -> Vec<&Entry> {
        self.roots.iter().map(|&pos| &self.entries[pos]).collect()
    }

    pub(crate) fn child_positions(&self, id: &str) -> &[usize] {
        self.children.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

fn ends_with_newline(file: &mut std::fs::File) -> std::io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
