//! # Single-instance guard backed by a PID file.
//!
//! [`ProcessLock`] keeps two copies of a program from driving the same hardware.
//! The record lives at `<lock_dir>/<name>.lock` and holds the owner's PID followed
//! by a newline.
//!
//! ## Acquire
//! ```text
//! write pid to temp file (same dir) ──► persist_noclobber(path)
//!        ├─ ok                 → held
//!        └─ already exists     → read record
//!               ├─ live pid    → LockError::Held
//!               └─ dead / garbage → persist(path) (atomic replace)
//!                                   └─ re-read: ours → held, else LockError::Held
//! ```
//!
//! The re-read after a reclaim catches a competitor that replaced the record
//! before our read, not one that replaces it after. Two processes reclaiming
//! the same stale record can interleave as A-persist, A-read, B-persist, B-read
//! and both believe they hold it. Like PID reuse, this window is accepted.
//!
//! ## Rules
//! - Publishing is atomic: readers never see a half-written record
//! - `release` only removes a record that still names this process
//! - `is_locked` and `holder` never modify the record
//! - Dropping a holding `ProcessLock` (or its [`LockGuard`]) releases it

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::LockError;

/// PID-file based mutual exclusion between processes.
#[derive(Debug)]
pub struct ProcessLock {
    name: String,
    path: PathBuf,
    held: bool,
}

impl ProcessLock {
    /// Lock named `name` in the OS temp directory.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_dir(name, std::env::temp_dir())
    }

    /// Lock named `name` in `dir`.
    pub fn with_dir(name: impl Into<String>, dir: impl AsRef<Path>) -> Self {
        let name = name.into();
        let path = dir.as_ref().join(format!("{name}.lock"));
        Self {
            name,
            path,
            held: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Location of the lock record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if this instance acquired the lock and has not released it.
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Takes the lock or fails with [`LockError::Held`] naming the live holder.
    ///
    /// Stale records (dead PID, unreadable content) are reclaimed. Concurrent
    /// reclaimers of the same stale record are not fully excluded (see module docs).
    /// Acquiring a lock this instance already holds is a no-op.
    pub fn acquire(&mut self) -> Result<(), LockError> {
        let me = std::process::id();
        if self.held && self.read_record()? == Some(me) {
            return Ok(());
        }

        match self.publish(false) {
            Ok(()) => return self.acquired(),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(self.io_error(e)),
        }

        match self.read_record()? {
            Some(pid) if pid_alive(pid) => return Err(self.held_by(pid)),
            stale => {
                warn!(lock = %self.name, stale_pid = ?stale, path = %self.path.display(), "reclaiming stale lock");
                self.publish(true).map_err(|e| self.io_error(e))?;
            }
        }

        // Detects a reclaimer that replaced the record before this read; one that
        // replaces it afterwards goes unnoticed (see module docs).
        match self.read_record()? {
            Some(pid) if pid == me => self.acquired(),
            Some(pid) => Err(self.held_by(pid)),
            None => Err(self.io_error(io::Error::new(
                io::ErrorKind::NotFound,
                "lock record vanished while reclaiming",
            ))),
        }
    }

    /// Removes the record if this instance holds it and it still names this process.
    ///
    /// Otherwise a no-op.
    pub fn release(&mut self) -> Result<(), LockError> {
        if !self.held {
            return Ok(());
        }
        self.held = false;

        if self.read_record()? != Some(std::process::id()) {
            debug!(lock = %self.name, "lock record no longer ours; leaving it");
            return Ok(());
        }
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(lock = %self.name, "lock released");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// True if a record exists and names a live process (this one included).
    pub fn is_locked(&self) -> bool {
        matches!(self.read_record(), Ok(Some(pid)) if pid_alive(pid))
    }

    /// PID recorded in the lock file, if it parses.
    pub fn holder(&self) -> Option<u32> {
        self.read_record().ok().flatten()
    }

    /// Acquires the lock and returns a guard that releases it on drop.
    pub fn guard(mut self) -> Result<LockGuard, LockError> {
        self.acquire()?;
        Ok(LockGuard { lock: self })
    }

    fn acquired(&mut self) -> Result<(), LockError> {
        self.held = true;
        info!(lock = %self.name, pid = std::process::id(), path = %self.path.display(), "lock acquired");
        Ok(())
    }

    /// Atomically publishes our PID; `replace` selects overwrite over create-only.
    fn publish(&self, replace: bool) -> io::Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        writeln!(tmp, "{}", std::process::id())?;
        tmp.as_file().sync_all()?;

        if replace {
            tmp.persist(&self.path).map_err(|e| e.error)?;
        } else {
            tmp.persist_noclobber(&self.path).map_err(|e| e.error)?;
        }
        Ok(())
    }

    /// Reads the record: `None` if missing or not a PID.
    fn read_record(&self) -> Result<Option<u32>, LockError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text.trim().parse::<u32>().ok().filter(|pid| *pid > 0)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn held_by(&self, pid: u32) -> LockError {
        LockError::Held {
            name: self.name.clone(),
            pid,
            path: self.path.clone(),
        }
    }

    fn io_error(&self, source: io::Error) -> LockError {
        LockError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(lock = %self.name, error = %e, "failed to release lock on drop");
        }
    }
}

/// Scoped lock ownership: the lock is released when the guard drops.
#[derive(Debug)]
pub struct LockGuard {
    lock: ProcessLock,
}

impl LockGuard {
    /// The held lock.
    pub fn lock(&self) -> &ProcessLock {
        &self.lock
    }

    /// Releases now, reporting errors that a drop would only log.
    pub fn release(mut self) -> Result<(), LockError> {
        self.lock.release()
    }
}

/// Probes a PID with signal 0; `EPERM` means it exists under another user.
#[cfg(unix)]
fn pid_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // Safety: signal 0 performs existence and permission checks only.
    let rc = unsafe { libc::kill(pid, 0) };
    rc == 0 || io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

/// Without a portable probe a recorded PID is assumed alive.
#[cfg(not(unix))]
fn pid_alive(_pid: u32) -> bool {
    true
}
