use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::error::PersistenceError;

/// The file name of the legacy binary ban list.
pub const LEGACY_FILE_NAME: &str = "banlist.dat";
/// The file name of the JSON ban list.
pub const JSON_FILE_NAME: &str = "banlist.json";

const TEMP_SUFFIX: &str = ".new";

/// Which encoding a ban list file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BanFileFormat {
    /// The read-only binary format written by older nodes.
    Legacy,
    /// The JSON format, read and written.
    Json,
}

impl core::fmt::Display for BanFileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BanFileFormat::Legacy => write!(f, "legacy"),
            BanFileFormat::Json => write!(f, "json"),
        }
    }
}

/// A ban list file and the format it is known to hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BanFile {
    /// Where the file lives.
    pub path: PathBuf,
    /// The encoding of the file.
    pub format: BanFileFormat,
}

impl BanFile {
    /// The legacy ban list inside a data directory.
    pub fn legacy_in(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(LEGACY_FILE_NAME),
            format: BanFileFormat::Legacy,
        }
    }

    /// The JSON ban list inside a data directory.
    pub fn json_in(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(JSON_FILE_NAME),
            format: BanFileFormat::Json,
        }
    }

    /// The contents of the file, or `None` if it does not exist.
    pub fn read(&self) -> Result<Option<Vec<u8>>, PersistenceError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Replace the contents of the file. The bytes are written and synced to a temporary
    /// file next to the target, which is then renamed over it, so a reader sees either the
    /// old or the new contents in full.
    pub fn write_atomic(&self, bytes: &[u8]) -> Result<(), PersistenceError> {
        let temp_path = self.temp_path();
        let write = |path: &Path| -> std::io::Result<()> {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            let mut file = File::create(path)?;
            file.write_all(bytes)?;
            file.sync_all()
        };
        if let Err(source) = write(&temp_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(PersistenceError::Write {
                path: temp_path,
                source,
            });
        }
        if let Err(source) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(PersistenceError::Rename {
                path: self.path.clone(),
                source,
            });
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name: OsString = self.path.clone().into_os_string();
        name.push(TEMP_SUFFIX);
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = BanFile::json_in(dir.path());
        assert!(file.read().unwrap().is_none());
    }

    #[test]
    fn test_write_replaces_contents() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = BanFile::json_in(dir.path().join("nested"));
        file.write_atomic(b"first").unwrap();
        file.write_atomic(b"second").unwrap();
        assert_eq!(file.read().unwrap().unwrap(), b"second");
        assert!(!file.temp_path().exists());
    }

    #[test]
    fn test_unreadable_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        // A directory in place of the file cannot be read.
        fs::create_dir(dir.path().join(LEGACY_FILE_NAME)).unwrap();
        let file = BanFile::legacy_in(dir.path());
        assert!(matches!(file.read(), Err(PersistenceError::Read { .. })));
    }

    #[test]
    fn test_failed_rename_leaves_no_temp_file() {
        let dir = tempfile::TempDir::new().unwrap();
        // A non-empty directory cannot be replaced by a file.
        let target = dir.path().join(JSON_FILE_NAME);
        fs::create_dir(&target).unwrap();
        fs::write(target.join("occupied"), b"x").unwrap();
        let file = BanFile::json_in(dir.path());
        assert!(matches!(
            file.write_atomic(b"{}"),
            Err(PersistenceError::Rename { .. })
        ));
        assert!(!file.temp_path().exists());
    }
}
