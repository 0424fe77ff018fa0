//! Filesystem Storage
//!
//! Stores files under a root directory on the local filesystem.
//!
//! ## Responsibilities
//! - Create the root directory on startup
//! - Resolve validated names under the root
//! - Stage uploads next to their destination and rename on commit
//! - Serialize writers of the same name

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

use crate::error::{FtpError, Result};

use super::name::{is_staging_name, validate_name, STAGING_PREFIX, STAGING_SUFFIX};
use super::{PendingWrite, Storage};

/// Per-name writer locks, shared with outstanding pending writes
type LockTable = Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>;

/// Storage backed by a directory
///
/// ## Concurrency:
/// - `write_locks`: one lock per name being written; a second writer of the
///   same name blocks until the first commits or aborts
/// - `next_staging_id`: Atomic counter (lock-free)
/// - All methods use `&self` (no exclusive access needed)
pub struct FsStorage {
    /// Directory all names are resolved under
    root: PathBuf,

    /// Writers currently holding a name
    write_locks: Arc<LockTable>,

    /// Suffix for unique staging file names
    next_staging_id: AtomicU64,
}

impl FsStorage {
    /// Open storage rooted at `root`, creating the directory if needed
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;

        Ok(Self {
            root: root.to_path_buf(),
            write_locks: Arc::new(Mutex::new(HashMap::new())),
            next_staging_id: AtomicU64::new(1),
        })
    }

    /// The storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a validated name under the root
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// Delete staging files left under the root by an interrupted process
    ///
    /// Must run before any upload starts; returns how many were removed.
    pub fn remove_stale_staging(&self) -> Result<usize> {
        let mut removed = 0;
        let mut dirs = vec![self.root.clone()];

        while let Some(dir) = dirs.pop() {
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                let file_type = entry.file_type()?;

                if file_type.is_dir() {
                    dirs.push(entry.path());
                } else if file_type.is_file()
                    && entry.file_name().to_str().is_some_and(is_staging_name)
                {
                    fs::remove_file(entry.path())?;
                    tracing::debug!("Removed stale staging file {}", entry.path().display());
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            tracing::info!(
                "Removed {} stale staging file(s) under {}",
                removed,
                self.root.display()
            );
        }
        Ok(removed)
    }

    /// Number of destinations with an active or waiting writer
    pub fn active_writers(&self) -> usize {
        self.write_locks.lock().len()
    }

    fn lock_path(&self, path: &Path) -> ArcMutexGuard<RawMutex, ()> {
        let lock = {
            let mut table = self.write_locks.lock();
            Arc::clone(table.entry(path.to_path_buf()).or_default())
        };
        lock.lock_arc()
    }

    fn staging_path(&self, final_path: &Path) -> Result<PathBuf> {
        let file_name = final_path
            .file_name()
            .ok_or_else(|| FtpError::InvalidName(final_path.display().to_string()))?
            .to_string_lossy();
        let id = self.next_staging_id.fetch_add(1, Ordering::Relaxed);

        Ok(final_path.with_file_name(format!(
            "{}{}.{}{}",
            STAGING_PREFIX, file_name, id, STAGING_SUFFIX
        )))
    }
}

impl Storage for FsStorage {
    type Reader = File;
    type Writer = FsPendingWrite;

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.resolve(name)?.is_file())
    }

    fn open_for_read(&self, name: &str) -> Result<(File, u64)> {
        let path = self.resolve(name)?;
        if !path.is_file() {
            return Err(FtpError::FileNotFound(name.to_string()));
        }

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FtpError::FileNotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let size = file.metadata()?.len();

        Ok((file, size))
    }

    fn create_for_write(&self, name: &str) -> Result<FsPendingWrite> {
        let final_path = self.resolve(name)?;
        let guard = self.lock_path(&final_path);

        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let staging_path = self.staging_path(&final_path)?;
        let file = File::create(&staging_path)?;

        tracing::trace!("Staging {} at {}", name, staging_path.display());

        Ok(FsPendingWrite {
            file,
            staging_path,
            final_path,
            committed: false,
            guard: Some(guard),
            locks: Arc::clone(&self.write_locks),
        })
    }

    fn list_regular_files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }

            match entry.file_name().into_string() {
                Ok(name) if is_staging_name(&name) => {}
                Ok(name) => names.push(name),
                Err(raw) => {
                    tracing::debug!("Skipping non UTF-8 file name {:?}", raw);
                }
            }
        }

        Ok(names)
    }
}

/// An upload being written to a staging file
///
/// `commit` renames the staging file over the destination. Dropping it
/// without committing removes the staging file and leaves any previous
/// destination content untouched.
pub struct FsPendingWrite {
    file: File,
    staging_path: PathBuf,
    final_path: PathBuf,
    committed: bool,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
    locks: Arc<LockTable>,
}

impl Write for FsPendingWrite {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl PendingWrite for FsPendingWrite {
    fn commit(mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        fs::rename(&self.staging_path, &self.final_path)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for FsPendingWrite {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = fs::remove_file(&self.staging_path) {
                tracing::warn!(
                    "Failed to remove staging file {}: {}",
                    self.staging_path.display(),
                    e
                );
            }
        }

        // Release the name, then forget its lock if nobody else is waiting
        drop(self.guard.take());
        let mut table = self.locks.lock();
        if let Some(lock) = table.get(&self.final_path) {
            if Arc::strong_count(lock) == 1 {
                table.remove(&self.final_path);
            }
        }
    }
}
