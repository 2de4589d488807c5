pub mod chunker;
pub mod duplicates;
pub mod search;
pub mod word_count;

pub use duplicates::{DedupReport, DeletionFailure, DuplicateGroup};
pub use word_count::{WordCount, WordFrequencyTable};
