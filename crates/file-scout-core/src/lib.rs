pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod files;
pub mod hasher;
mod pool;
pub mod progress;
pub mod scanner;

pub use analysis::{DedupReport, DuplicateGroup, WordCount, WordFrequencyTable};
pub use config::EngineConfig;
pub use engine::FileEngine;
pub use error::{Error, Result};
pub use hasher::ContentDigest;
pub use progress::{ProgressReporter, SilentReporter};
pub use scanner::{DirectorySnapshot, FileRecord};
