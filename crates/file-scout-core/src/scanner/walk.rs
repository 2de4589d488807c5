use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, warn};
use walkdir::WalkDir;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::files::APPEND_TEMP_PREFIX;

/// A regular file found directly under the root, before its content is read.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub path: PathBuf,
}

/// Non-recursive listing of the regular files directly under `root`, sorted
/// by file name. Sub-directories, symlinks and in-flight append files are
/// skipped, as are files rejected by the extension filter or an ignore
/// pattern.
pub fn list_candidates(root: &Path, config: &EngineConfig) -> Result<Vec<Candidate>> {
    let metadata = fs::metadata(root).map_err(|e| Error::from_io(root, e))?;
    if !metadata.is_dir() {
        return Err(Error::NotFound(root.to_path_buf()));
    }

    let ignore_patterns = compile_patterns(&config.ignore_patterns);
    let mut candidates = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            // Depth 0 is the root itself; anything else is one bad entry.
            Err(err) if err.depth() == 0 => return Err(walk_error(root, err)),
            Err(err) => {
                warn!(error = %err, "Skipping unreadable directory entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let name = match entry.file_name().to_str() {
            Some(name) => name.to_string(),
            None => {
                warn!("Skipping file with non UTF-8 name: {}", path.display());
                continue;
            }
        };

        if name.starts_with(APPEND_TEMP_PREFIX) || !config.accepts_extension(path) {
            continue;
        }

        if ignore_patterns
            .iter()
            .any(|pattern| pattern.matches(&name) || pattern.matches_path(path))
        {
            continue;
        }

        candidates.push(Candidate {
            name,
            path: path.to_path_buf(),
        });
    }

    Ok(candidates)
}

fn compile_patterns(globs: &[String]) -> Vec<Pattern> {
    globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}

fn walk_error(root: &Path, err: walkdir::Error) -> Error {
    let path = err.path().unwrap_or(root).to_path_buf();
    match err.into_io_error() {
        Some(io_err) => Error::from_io(&path, io_err),
        None => Error::Io {
            path,
            source: io::Error::new(io::ErrorKind::Other, "filesystem loop detected"),
        },
    }
}
