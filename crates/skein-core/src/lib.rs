pub mod entry;
pub mod types;

pub use types::*;
