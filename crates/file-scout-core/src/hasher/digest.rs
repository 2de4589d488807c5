use serde::{Serialize, Serializer};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use crate::error::{Error, Result};

/// 256-bit BLAKE3 digest of a file's full content.
///
/// Two files with equal digests are treated as content-identical. This is an
/// approximation of a byte-for-byte compare; a BLAKE3 collision would make
/// two different files look like duplicates, which is an accepted risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest([u8; blake3::OUT_LEN]);

impl ContentDigest {
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }
}

impl From<blake3::Hash> for ContentDigest {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Stream a file through BLAKE3.
pub fn digest(file: &Path) -> Result<ContentDigest> {
    let f = File::open(file).map_err(|e| Error::from_io(file, e))?;
    let mut reader = BufReader::new(f);
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut reader, &mut hasher).map_err(|e| Error::from_io(file, e))?;
    Ok(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_digest_matches_in_memory_hash() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "shared content xyz").unwrap();

        let from_file = digest(&path).unwrap();
        assert_eq!(from_file, ContentDigest::of_bytes(b"shared content xyz"));
        assert_eq!(from_file.to_string().len(), 64);
    }

    #[test]
    fn test_digest_differs_on_content() {
        assert_ne!(
            ContentDigest::of_bytes(b"unique content a"),
            ContentDigest::of_bytes(b"unique content b")
        );
    }

    #[test]
    fn test_digest_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            digest(&dir.path().join("gone.txt")),
            Err(Error::NotFound(_))
        ));
    }
}
