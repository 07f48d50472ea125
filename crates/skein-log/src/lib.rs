pub mod branch;
pub mod config;
pub mod error;
pub mod export;
pub mod labels;
pub mod lock;
pub mod log;
pub mod paths;
pub mod tree;

pub use branch::ContextItem;
pub use config::{LogConfig, WritePolicy};
pub use error::{LogError, Result};
pub use export::TreeNode;
pub use labels::LabelStore;
pub use lock::AppendLock;
pub use log::SessionLog;
pub use paths::LogPaths;
pub use tree::ExportedMessage;
