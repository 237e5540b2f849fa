//! Raw record persistence.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Raw record persistence keyed by path.
///
/// Implementations must report an absent record as
/// [`io::ErrorKind::NotFound`] so callers can tell "never written" apart
/// from a real failure.
pub trait RecordStore: Send + Sync {
    /// Reads the whole record at `path`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the record does not exist, or any other I/O error.
    fn read_record(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replaces the record at `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directories or the record cannot be written.
    fn write_record(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Removes `path` and everything below it. A missing path is not an error.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if an existing tree cannot be removed.
    fn delete_tree(&self, path: &Path) -> io::Result<()>;
}

/// Filesystem-backed [`RecordStore`].
///
/// Writes go to a uniquely named temp file in the target directory which is
/// then renamed over the target, so a concurrent reader sees either the old
/// or the new record and concurrent writers never share a temp file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRecordStore;

impl FsRecordStore {
    /// Creates a new filesystem record store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl RecordStore for FsRecordStore {
    fn read_record(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_record(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(bytes)?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn delete_tree(&self, path: &Path) -> io::Result<()> {
        match fs::remove_dir_all(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
