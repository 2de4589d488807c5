use dashmap::DashMap;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::hasher::{self, xxhash, ContentDigest};
use crate::pool::build_pool;
use crate::progress::ProgressReporter;
use crate::scanner::{DirectorySnapshot, FileRecord};

/// Files sharing one content digest. `canonical` is the lexicographically
/// smallest name and is the one kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub digest: ContentDigest,
    pub byte_size: u64,
    pub canonical: String,
    pub duplicates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionFailure {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    /// Deleted files, in snapshot order.
    pub removed_files: Vec<String>,
    /// Every snapshot file that was not removed, in snapshot order.
    pub kept_files: Vec<String>,
    pub failures: Vec<DeletionFailure>,
    pub groups: Vec<DuplicateGroup>,
}

/// Group snapshot files by content.
///
/// Three tiers, each only run on what the previous one could not rule out:
/// 1. Byte size (already in the snapshot)
/// 2. XxHash64 of the first 1KB
/// 3. Full BLAKE3 digest
///
/// Hashing is all-or-nothing: if any file cannot be hashed the whole pass
/// fails with that file's error and nothing is grouped. Computed digests are
/// stored on the snapshot records.
pub fn find_duplicates(
    snapshot: &mut DirectorySnapshot,
    workers: usize,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<DuplicateGroup>> {
    reporter.on_hash_start();
    let start = Instant::now();
    let pool = build_pool(workers, "hash")?;

    let records = snapshot.records();
    let mut size_to_files: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        size_to_files.entry(record.byte_size).or_default().push(index);
    }
    let candidates: Vec<usize> = size_to_files
        .into_values()
        .filter(|indices| indices.len() > 1)
        .flatten()
        .collect();

    // First pass: partial hash to eliminate non-dupes quickly
    let partial_hash_to_files: DashMap<(u64, u64), Vec<usize>> = DashMap::new();
    pool.install(|| {
        candidates.par_iter().try_for_each(|&index| {
            let record = &records[index];
            let hash = xxhash::prehash(&record.path).map_err(|e| {
                error!("Error prehashing '{}': {}", record.path.display(), e);
                e
            })?;
            partial_hash_to_files
                .entry((record.byte_size, hash))
                .or_default()
                .push(index);
            Ok::<(), Error>(())
        })
    })?;

    // Second pass: full digest only on partial-hash collisions
    let to_digest: Vec<usize> = partial_hash_to_files
        .into_iter()
        .filter(|(_, indices)| indices.len() > 1)
        .flat_map(|(_, indices)| indices)
        .collect();
    let total = to_digest.len();
    let hashed = AtomicUsize::new(0);
    let digest_to_files: DashMap<ContentDigest, Vec<usize>> = DashMap::new();
    pool.install(|| {
        to_digest.par_iter().try_for_each(|&index| {
            let record = &records[index];
            let digest = hasher::digest(&record.path).map_err(|e| {
                error!("Error hashing '{}': {}", record.path.display(), e);
                e
            })?;
            digest_to_files.entry(digest).or_default().push(index);
            let done = hashed.fetch_add(1, Ordering::Relaxed) + 1;
            reporter.on_hash_progress(done, total);
            Ok::<(), Error>(())
        })
    })?;

    let mut digests: Vec<(String, ContentDigest)> = Vec::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    for (digest, mut indices) in digest_to_files {
        // Records are in name order, so index order is name order.
        indices.sort_unstable();
        for &index in &indices {
            digests.push((records[index].name.clone(), digest));
        }
        if indices.len() > 1 {
            groups.push(build_group(records, digest, &indices));
        }
    }
    groups.sort_by(|a, b| a.canonical.cmp(&b.canonical));

    for (name, digest) in digests {
        snapshot.set_digest(&name, digest);
    }

    let elapsed = start.elapsed().as_secs_f64();
    debug!(
        "Hash completed in {:.2}s — {} candidates, {} fully hashed, {} duplicate groups",
        elapsed,
        candidates.len(),
        total,
        groups.len()
    );
    reporter.on_hash_complete(groups.len(), elapsed);
    Ok(groups)
}

fn build_group(records: &[FileRecord], digest: ContentDigest, indices: &[usize]) -> DuplicateGroup {
    let canonical = &records[indices[0]];
    DuplicateGroup {
        digest,
        byte_size: canonical.byte_size,
        canonical: canonical.name.clone(),
        duplicates: indices[1..]
            .iter()
            .map(|&index| records[index].name.clone())
            .collect(),
    }
}

/// Find duplicate groups and delete every non-canonical file.
///
/// Nothing is deleted unless the hashing pass succeeds for every candidate.
/// Deletion is then best effort: a file that cannot be removed is recorded in
/// `failures` and the rest are still processed. Before anything in a group
/// is deleted, the canonical file is re-hashed; if it changed or vanished
/// the whole group is skipped. Each duplicate is likewise re-hashed right
/// before removal. Removed files are dropped from the snapshot.
pub fn find_and_remove(
    snapshot: &mut DirectorySnapshot,
    workers: usize,
    reporter: &dyn ProgressReporter,
) -> Result<DedupReport> {
    let groups = find_duplicates(snapshot, workers, reporter)?;
    info!("Removing duplicates from {} groups", groups.len());

    let mut removed: HashSet<String> = HashSet::new();
    let mut failures: Vec<DeletionFailure> = Vec::new();

    for group in &groups {
        if let Err(reason) = verify_unchanged(snapshot, &group.canonical, &group.digest) {
            warn!(
                "Keeping group of '{}' intact: canonical file {}",
                group.canonical, reason
            );
            failures.extend(group.duplicates.iter().map(|name| DeletionFailure {
                name: name.clone(),
                reason: format!("canonical file '{}' {}", group.canonical, reason),
            }));
            continue;
        }

        for name in &group.duplicates {
            match remove_duplicate(snapshot, name, &group.digest) {
                Ok(()) => {
                    debug!("Removed duplicate '{}' of '{}'", name, group.canonical);
                    reporter.on_file_removed(name);
                    removed.insert(name.clone());
                }
                Err(reason) => {
                    error!("Failed to remove '{}': {}", name, reason);
                    failures.push(DeletionFailure {
                        name: name.clone(),
                        reason,
                    });
                }
            }
        }
    }

    let (removed_files, kept_files): (Vec<String>, Vec<String>) = snapshot
        .names()
        .into_iter()
        .partition(|name| removed.contains(name));
    snapshot.forget(&removed_files);

    info!(
        "Duplicate removal: {} removed, {} failed, {} kept",
        removed_files.len(),
        failures.len(),
        kept_files.len()
    );

    Ok(DedupReport {
        removed_files,
        kept_files,
        failures,
        groups,
    })
}

fn verify_unchanged(
    snapshot: &DirectorySnapshot,
    name: &str,
    expected: &ContentDigest,
) -> std::result::Result<(), String> {
    let path = snapshot.resolve(name).map_err(|e| e.to_string())?;
    match hasher::digest(&path) {
        Ok(digest) if digest == *expected => Ok(()),
        Ok(_) => Err("changed since it was hashed".to_string()),
        Err(Error::NotFound(_)) => Err("no longer exists".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn remove_duplicate(
    snapshot: &DirectorySnapshot,
    name: &str,
    expected: &ContentDigest,
) -> std::result::Result<(), String> {
    verify_unchanged(snapshot, name, expected)?;
    let path = snapshot.resolve(name).map_err(|e| e.to_string())?;
    fs::remove_file(&path).map_err(|e| Error::from_io(&path, e).to_string())
}
