use skein_core::EntryId;
use std::path::PathBuf;

pub type Result<T, E = LogError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("parent entry not found: {0}")]
    UnknownParent(EntryId),

    #[error("entry not found: {0}")]
    UnknownEntry(EntryId),

    #[error("label not found: {0}")]
    UnknownLabel(String),

    #[error("duplicate entry id: {0}")]
    DuplicateId(EntryId),

    #[error("entry {id} is not an ancestor of the compaction point")]
    NotOnBranch { id: EntryId },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The fork entry `id` was appended; only binding `label` to it failed.
    #[error("fork {id} was created but label '{label}' was not saved: {source}")]
    ForkLabel {
        id: EntryId,
        label: String,
        #[source]
        source: Box<LogError>,
    },

    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
