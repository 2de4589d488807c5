use memchr::memmem;
use rayon::prelude::*;
use std::fs;
use std::io;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::pool::build_pool;
use crate::scanner::{DirectorySnapshot, FileRecord};

/// Names of the snapshot files whose content contains `keyword`, as an exact
/// case-sensitive substring, in snapshot order.
pub fn search(
    snapshot: &DirectorySnapshot,
    keyword: &str,
    workers: usize,
) -> Result<Vec<String>> {
    if keyword.is_empty() {
        return Err(Error::invalid("keyword must not be empty"));
    }

    let finder = memmem::Finder::new(keyword.as_bytes());
    let pool = build_pool(workers, "search")?;
    let hits: Vec<bool> = pool.install(|| {
        snapshot
            .records()
            .par_iter()
            .map(|record| contains(record, &finder))
            .collect::<Result<Vec<_>>>()
    })?;

    let matches: Vec<String> = snapshot
        .iter()
        .zip(hits)
        .filter(|(_, hit)| *hit)
        .map(|(record, _)| record.name.clone())
        .collect();

    debug!(
        "Keyword '{}' found in {} of {} files",
        keyword,
        matches.len(),
        snapshot.len()
    );
    Ok(matches)
}

fn contains(record: &FileRecord, finder: &memmem::Finder<'_>) -> Result<bool> {
    let haystack = match fs::read(&record.path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!("{} vanished since the snapshot was taken", record.path.display());
            return Ok(false);
        }
        Err(err) => return Err(Error::from_io(&record.path, err)),
    };
    Ok(finder.find(&haystack).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn record_for(path: &Path) -> FileRecord {
        FileRecord {
            name: "f.txt".to_string(),
            path: path.to_path_buf(),
            byte_size: 0,
            word_count: 0,
            char_count: 0,
            content_digest: None,
        }
    }

    #[test]
    fn test_contains_is_case_sensitive_substring() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, "Hello world").unwrap();
        let record = record_for(&path);

        assert!(contains(&record, &memmem::Finder::new("o w")).unwrap());
        assert!(contains(&record, &memmem::Finder::new("Hello world")).unwrap());
        assert!(!contains(&record, &memmem::Finder::new("hello")).unwrap());
        assert!(!contains(&record, &memmem::Finder::new("Hello world!")).unwrap());
    }

    #[test]
    fn test_contains_treats_vanished_file_as_no_match() {
        let dir = tempdir().unwrap();
        let record = record_for(&dir.path().join("gone.txt"));
        assert!(!contains(&record, &memmem::Finder::new("x")).unwrap());
    }
}
