use std::fs::File;
use std::hash::Hasher as _;
use std::io::Read;
use std::path::Path;
use twox_hash::XxHash64;

use crate::error::{Error, Result};

const PARTIAL_HASH_LENGTH: usize = 1024; // 1KB

/// Cheap prefilter: XxHash64 of the first 1KB. Equal prehashes only mean
/// "possibly identical"; the full digest decides.
pub fn prehash(file: &Path) -> Result<u64> {
    let data = read_portion(file).map_err(|e| Error::from_io(file, e))?;
    Ok(hash_data(&data))
}

fn read_portion(file: &Path) -> std::io::Result<Vec<u8>> {
    let f = File::open(file)?;
    let mut buffer = Vec::with_capacity(PARTIAL_HASH_LENGTH);
    f.take(PARTIAL_HASH_LENGTH as u64).read_to_end(&mut buffer)?;
    Ok(buffer)
}

pub fn hash_data(data: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(data);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_prehash_only_sees_first_kilobyte() {
        let dir = tempdir().unwrap();
        let mut a = vec![b'x'; PARTIAL_HASH_LENGTH];
        let mut b = a.clone();
        a.extend_from_slice(b"tail one");
        b.extend_from_slice(b"tail two");
        fs::write(dir.path().join("a.txt"), &a).unwrap();
        fs::write(dir.path().join("b.txt"), &b).unwrap();

        assert_eq!(
            prehash(&dir.path().join("a.txt")).unwrap(),
            prehash(&dir.path().join("b.txt")).unwrap()
        );
    }

    #[test]
    fn test_prehash_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            prehash(&dir.path().join("nope.txt")),
            Err(Error::NotFound(_))
        ));
    }
}
