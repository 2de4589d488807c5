pub mod snapshot;
pub mod walk;

pub use snapshot::{DirectorySnapshot, FileRecord};
