//! Storage persisted as one file per key.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{Result, Storage, StorageError};

const EXTENSION: &str = "json";

/// Directory-backed storage.
///
/// Writes go to a sibling temporary file first and are renamed in place,
/// so readers never observe a half-written document. Concurrent writers
/// are not coordinated: the last rename wins.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) the storage directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            key: root.display().to_string(),
            source,
        })?;

        tracing::debug!(path = %root.display(), "file storage opened");
        Ok(Self { root })
    }

    /// Keys may contain `@` and `.` (emails) but never path separators.
    fn file_name(key: &str) -> String {
        let sanitized: String = key
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '\0' => '_',
                c => c,
            })
            .collect();
        format!("{sanitized}.{EXTENSION}")
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(Self::file_name(key))
    }

    fn io(key: &str) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
        move |source| StorageError::Io {
            key: key.to_owned(),
            source,
        }
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Self::io(key)(err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path(key);
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));

        fs::write(&tmp, value).map_err(Self::io(key))?;
        fs::rename(&tmp, &path).map_err(Self::io(key))
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Self::io(key)(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("state")).unwrap();

        assert_eq!(storage.get("profile_a@b.co").unwrap(), None);
        storage.set("profile_a@b.co", r#"{"bio":"hi"}"#).unwrap();
        assert_eq!(
            storage.get("profile_a@b.co").unwrap().as_deref(),
            Some(r#"{"bio":"hi"}"#)
        );
        assert!(dir.path().join("state/profile_a@b.co.json").is_file());

        storage.remove("profile_a@b.co").unwrap();
        storage.remove("profile_a@b.co").unwrap();
        assert_eq!(storage.get("profile_a@b.co").unwrap(), None);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileStorage::open(dir.path())
            .unwrap()
            .set("unifyr_user", "{}")
            .unwrap();

        let storage = FileStorage::open(dir.path()).unwrap();
        assert_eq!(storage.get("unifyr_user").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_key_cannot_escape_root() {
        assert_eq!(FileStorage::file_name("../etc/passwd"), ".._etc_passwd.json");
    }
}
