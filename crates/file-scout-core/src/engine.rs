use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::analysis::{duplicates, search, word_count};
use crate::analysis::{DedupReport, WordFrequencyTable};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::files;
use crate::progress::ProgressReporter;
use crate::scanner::DirectorySnapshot;

/// Entry point for callers. Holds configuration only; every operation takes
/// the snapshot it works on, so one engine can serve many directories.
pub struct FileEngine {
    config: EngineConfig,
}

impl FileEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn load_directory(
        &self,
        path: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<DirectorySnapshot> {
        info!("Loading directory {}", path.display());
        let snapshot = DirectorySnapshot::load(path, &self.config, reporter)?;
        info!(
            "{} files, {} bytes total",
            snapshot.len(),
            snapshot.total_bytes()
        );
        Ok(snapshot)
    }

    pub fn create_file(&self, snapshot: &DirectorySnapshot, name: &str, content: &str) -> Result<()> {
        files::create_file(snapshot.root(), name, content)?;
        info!("Created '{}'", name);
        Ok(())
    }

    pub fn delete_file(&self, snapshot: &DirectorySnapshot, name: &str) -> Result<()> {
        files::delete_file(snapshot.root(), name)?;
        info!("Deleted '{}'", name);
        Ok(())
    }

    pub fn append_file(&self, snapshot: &DirectorySnapshot, name: &str, content: &str) -> Result<()> {
        files::append_file(snapshot.root(), name, content)?;
        info!("Appended to '{}'", name);
        Ok(())
    }

    /// Remove content duplicates among the snapshot's files, keeping the
    /// lexicographically smallest name of each group.
    pub fn delete_duplicates(
        &self,
        snapshot: &mut DirectorySnapshot,
        reporter: &dyn ProgressReporter,
    ) -> Result<DedupReport> {
        info!("Building content hash for possible dupes...");
        duplicates::find_and_remove(snapshot, self.config.io_workers(), reporter)
    }

    pub fn search_keyword(&self, snapshot: &DirectorySnapshot, keyword: &str) -> Result<Vec<String>> {
        search::search(snapshot, keyword, self.config.io_workers())
    }

    /// Word frequencies of one file, computed by `worker_count` threads.
    pub fn count_words(
        &self,
        snapshot: &DirectorySnapshot,
        name: &str,
        worker_count: usize,
    ) -> Result<WordFrequencyTable> {
        let workers = self.config.validate_workers(worker_count)?;
        let path = snapshot.resolve(name)?;

        let metadata = fs::metadata(&path).map_err(|e| Error::from_io(&path, e))?;
        if !metadata.is_file() {
            return Err(Error::NotFound(path));
        }
        let content = fs::read(&path).map_err(|e| Error::from_io(&path, e))?;

        let start = Instant::now();
        let table = word_count::count(&content, workers)?;
        debug!(
            "Counted '{}' with {} workers in {:.3}s",
            name,
            workers,
            start.elapsed().as_secs_f64()
        );
        Ok(table)
    }
}
