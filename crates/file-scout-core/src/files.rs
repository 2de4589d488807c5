use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::Builder;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Name prefix of in-flight append files. Directory scans skip these.
pub(crate) const APPEND_TEMP_PREFIX: &str = ".file-scout-append-";

/// Join `name` onto `root`, accepting only a single plain file name so the
/// result always sits directly under the root.
pub(crate) fn resolve_name(root: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty() {
        return Err(Error::invalid("file name must not be empty"));
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(root.join(name)),
        _ => Err(Error::invalid(format!(
            "'{}' is not a plain file name",
            name
        ))),
    }
}

/// Create `name` with `content`. Fails with `Conflict` if anything already
/// has that name; a failed write leaves no file behind.
pub fn create_file(root: &Path, name: &str, content: &str) -> Result<()> {
    let path = resolve_name(root, name)?;

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| Error::from_io(&path, e))?;

    if let Err(err) = write_and_sync(file, content.as_bytes()) {
        if let Err(cleanup) = fs::remove_file(&path) {
            warn!("Could not remove partially written {}: {}", path.display(), cleanup);
        }
        return Err(Error::from_io(&path, err));
    }

    debug!("Created {} ({} bytes)", path.display(), content.len());
    Ok(())
}

fn write_and_sync(file: File, data: &[u8]) -> io::Result<()> {
    let mut writer = BufWriter::new(file);
    writer.write_all(data)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

pub fn delete_file(root: &Path, name: &str) -> Result<()> {
    let path = resolve_name(root, name)?;
    let metadata = fs::symlink_metadata(&path).map_err(|e| Error::from_io(&path, e))?;
    if !metadata.is_file() {
        return Err(Error::NotFound(path));
    }
    fs::remove_file(&path).map_err(|e| Error::from_io(&path, e))?;
    debug!("Deleted {}", path.display());
    Ok(())
}

/// Append `content` to an existing regular file. Symlinks are refused like
/// in `delete_file`, since the rename would replace the link itself.
///
/// The old content and the addition are written to a temp file in the same
/// directory which then replaces the original in one rename. Readers see the
/// old file or the new one, never a partial write.
pub fn append_file(root: &Path, name: &str, content: &str) -> Result<()> {
    let path = resolve_name(root, name)?;
    let metadata = fs::symlink_metadata(&path).map_err(|e| Error::from_io(&path, e))?;
    if !metadata.is_file() {
        return Err(Error::NotFound(path));
    }

    let mut tmp = Builder::new()
        .prefix(APPEND_TEMP_PREFIX)
        .tempfile_in(root)
        .map_err(|e| Error::from_io(root, e))?;
    copy_with_suffix(&path, tmp.as_file_mut(), content.as_bytes())
        .map_err(|e| Error::from_io(&path, e))?;
    fs::set_permissions(tmp.path(), metadata.permissions())
        .map_err(|e| Error::from_io(tmp.path(), e))?;

    // An unpersisted temp file deletes itself on drop.
    tmp.persist(&path).map_err(|e| Error::from_io(&path, e.error))?;

    debug!("Appended {} bytes to {}", content.len(), path.display());
    Ok(())
}

fn copy_with_suffix(source: &Path, dest: &mut File, suffix: &[u8]) -> io::Result<()> {
    let mut original = File::open(source)?;
    {
        let mut writer = BufWriter::new(&mut *dest);
        io::copy(&mut original, &mut writer)?;
        writer.write_all(suffix)?;
        writer.flush()?;
    }
    dest.sync_all()
}
