//! File-backed key/value storage for the session snapshot.
//!
//! One file per key under a base directory. Writes go to a temporary file
//! that is renamed over the target, so a crash mid-write leaves the previous
//! snapshot intact.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use liftlog_core::KeyValueStorage;
use liftlog_domain::{LiftlogError, Result};
use parking_lot::Mutex;
use tracing::trace;

use crate::errors::InfraError;

/// Key/value storage rooted at a directory.
pub struct FileKeyValueStorage {
    dir: PathBuf,
    // Serialises writers so temp files never collide.
    write_lock: Mutex<()>,
}

impl FileKeyValueStorage {
    /// Create the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(InfraError::from)?;
        Ok(Self { dir, write_lock: Mutex::new(()) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            || key.starts_with('.')
        {
            return Err(LiftlogError::InvalidInput(format!("invalid storage key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStorage for FileKeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(InfraError::from(err).into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");

        let _guard = self.write_lock.lock();
        let write = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        };
        write().map_err(InfraError::from)?;
        trace!(key, bytes = value.len(), "value written");
        Ok(())
    }
}
