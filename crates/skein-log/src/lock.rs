use crate::error::{LogError, Result};
use crate::paths::LogPaths;
use fs2::FileExt;
use std::fs::{File, OpenOptions};

/// Exclusive advisory lock on `<log stem>.lock`, held while one line is
/// appended. Cooperating processes serialize their appends on it.
/// Automatically released when dropped.
pub struct AppendLock {
    _file: File,
}

impl AppendLock {
    /// Acquire the lock, blocking until any other holder releases it.
    pub fn acquire(paths: &LogPaths) -> Result<Self> {
        let file = Self::open(paths)?;
        file.lock_exclusive().map_err(|source| LogError::Lock {
            path: paths.lock_file.clone(),
            source,
        })?;
        Ok(Self { _file: file })
    }

    /// Try to acquire the lock without blocking. `Ok(None)` when held elsewhere.
    pub fn try_acquire(paths: &LogPaths) -> Result<Option<Self>> {
        let file = Self::open(paths)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { _file: file })),
            Err(_) => Ok(None),
        }
    }

    fn open(paths: &LogPaths) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&paths.lock_file)
            .map_err(|source| LogError::Lock {
                path: paths.lock_file.clone(),
                source,
            })
    }
}
