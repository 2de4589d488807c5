/// Trait for reporting engine progress.
///
/// The CLI implements it with indicatif bars. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_load_start(&self) {}
    fn on_load_progress(&self, _files_read: usize, _total_files: usize) {}
    fn on_load_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_hash_start(&self) {}
    fn on_hash_progress(&self, _files_hashed: usize, _total_files: usize) {}
    fn on_hash_complete(&self, _duplicate_groups: usize, _duration_secs: f64) {}
    fn on_file_removed(&self, _name: &str) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
