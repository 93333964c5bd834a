use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage directory missing or not writable: {0}")]
    StorageDir(String),
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Key-value files scoped to one backend origin. Two backends never see
/// each other's history or preferences.
#[derive(Debug, Clone)]
pub struct OriginStorage {
    dir: PathBuf,
}

impl OriginStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// `{root}/{scope}` where scope is derived from `origin`.
    pub fn for_origin(root: &Path, origin: &str) -> Self {
        Self::new(root.join(origin_scope(origin)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `Ok(None)` when the key has never been written.
    pub fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(PersistError::Io(err)),
        }
    }

    /// Writes through a temp file and rename, so readers never see a
    /// partial value.
    pub fn write(&self, key: &str, content: &str) -> Result<PathBuf, PersistError> {
        let target = self.path_for(key)?;
        ensure_dir(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }

    /// Returns false if the key did not exist.
    pub fn remove(&self, key: &str) -> Result<bool, PersistError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(PersistError::Io(err)),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(PersistError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

fn ensure_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::StorageDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::StorageDir("path is not a directory".into()));
        }
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| PersistError::StorageDir(e.to_string()))
}

/// Readable, filesystem-safe directory name for an origin, e.g.
/// `127.0.0.1_5000-1a2b3c4d`. The hash keeps distinct origins apart after
/// the readable part is flattened.
pub fn origin_scope(origin: &str) -> String {
    let origin = origin.trim().trim_end_matches('/');
    let readable: String = origin
        .split_once("://")
        .map_or(origin, |(_, rest)| rest)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
        .take(48)
        .collect();
    let digest = Sha256::digest(origin.as_bytes());
    let short: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
    format!("{readable}-{short}")
}
