use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::walk::{self, Candidate};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::files;
use crate::hasher::ContentDigest;
use crate::pool::build_pool;
use crate::progress::ProgressReporter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub name: String,
    pub path: PathBuf,
    pub byte_size: u64,
    /// Maximal runs of non-whitespace.
    pub word_count: u64,
    /// Unicode scalar values, not bytes.
    pub char_count: u64,
    /// Filled in only when deduplication hashes this file.
    pub content_digest: Option<ContentDigest>,
}

/// Catalog of the text files directly under one directory, in file-name order.
///
/// A snapshot is a cache of what was on disk at load time, never a lock.
/// Operations that act on a file re-check the filesystem first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectorySnapshot {
    root: PathBuf,
    records: Vec<FileRecord>,
}

impl DirectorySnapshot {
    /// Scan `root` and read every catalogued file to compute its counts.
    pub fn load(
        root: &Path,
        config: &EngineConfig,
        reporter: &dyn ProgressReporter,
    ) -> Result<Self> {
        reporter.on_load_start();
        let start = Instant::now();

        let candidates = walk::list_candidates(root, config)?;
        let total = candidates.len();
        let files_read = AtomicUsize::new(0);
        info!("Reading {} files under {}", total, root.display());

        let pool = build_pool(config.io_workers(), "load")?;
        let records: Vec<Option<FileRecord>> = pool.install(|| {
            candidates
                .par_iter()
                .map(|candidate| {
                    let record = read_record(candidate);
                    let done = files_read.fetch_add(1, Ordering::Relaxed) + 1;
                    reporter.on_load_progress(done, total);
                    record
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let records: Vec<FileRecord> = records.into_iter().flatten().collect();
        let elapsed = start.elapsed().as_secs_f64();
        debug!(
            "Load completed in {:.2}s — {} of {} files catalogued",
            elapsed,
            records.len(),
            total
        );
        reporter.on_load_complete(records.len(), elapsed);

        Ok(Self {
            root: root.to_path_buf(),
            records,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileRecord> {
        self.records.iter()
    }

    pub fn get(&self, name: &str) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.byte_size).sum()
    }

    /// Path for `name` under this snapshot's root. The file need not be in
    /// the snapshot, or even exist.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        files::resolve_name(&self.root, name)
    }

    pub(crate) fn set_digest(&mut self, name: &str, digest: ContentDigest) {
        if let Some(record) = self.records.iter_mut().find(|r| r.name == name) {
            record.content_digest = Some(digest);
        }
    }

    pub(crate) fn forget(&mut self, removed: &[String]) {
        self.records.retain(|r| !removed.contains(&r.name));
    }
}

/// Word and char counts of a piece of text.
pub fn text_stats(content: &str) -> (u64, u64) {
    let words = content.split_whitespace().count() as u64;
    let chars = content.chars().count() as u64;
    (words, chars)
}

fn read_record(candidate: &Candidate) -> Result<Option<FileRecord>> {
    let path = &candidate.path;
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if is_skippable(&err) => {
            warn!(file = %path.display(), error = %err, "Skipping file during load");
            return Ok(None);
        }
        Err(err) => return Err(Error::from_io(path, err)),
    };

    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(_) => {
            warn!("Skipping non UTF-8 file {}", path.display());
            return Ok(None);
        }
    };

    let (word_count, char_count) = text_stats(&content);
    Ok(Some(FileRecord {
        name: candidate.name.clone(),
        path: path.clone(),
        byte_size: content.len() as u64,
        word_count,
        char_count,
        content_digest: None,
    }))
}

fn is_skippable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    )
}
