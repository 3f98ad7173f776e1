//! Shared batch log file.
//!
//! Workers on every thread funnel their diagnostic lines through one
//! [`SharedLogger`]. Each call appends whole lines under an internal lock,
//! so concurrent writes interleave per entry but never mid-line. The lock
//! here is independent of the task-queue monitor and is never held while
//! waiting on it.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Local;

const RULE: &str = "========================================";

/// Append-only log destination shared by all workers of one batch run.
pub struct SharedLogger {
    path: PathBuf,
    inner: Mutex<Option<BufWriter<File>>>,
}

impl SharedLogger {
    /// Open (or create) the log file in append mode and write the
    /// timestamped batch start banner.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let logger = Self {
            path: path.to_path_buf(),
            inner: Mutex::new(Some(BufWriter::new(file))),
        };
        logger.banner("Batch processing started");
        Ok(logger)
    }

    /// Append one line and flush. The entry is written atomically with
    /// respect to other `write`/`banner` calls.
    pub fn write(&self, line: &str) {
        let mut guard = self.lock();
        if let Some(writer) = guard.as_mut() {
            if let Err(err) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
                log::warn!("failed to write to {}: {err}", self.path.display());
            }
        }
    }

    /// Append a timestamped banner block as a single atomic entry.
    pub fn banner(&self, text: &str) {
        let now = Local::now().format("%Y-%m-%d %H:%M:%S");
        self.write_block(&format!("\n{RULE}\n{text}: {now}\n{RULE}"));
    }

    /// Write the batch end banner and release the file handle. Subsequent
    /// `write` calls become no-ops; calling `close` again does nothing.
    pub fn close(&self) {
        let mut guard = self.lock();
        if let Some(mut writer) = guard.take() {
            let now = Local::now().format("%Y-%m-%d %H:%M:%S");
            let _ = writeln!(writer, "\n{RULE}\nBatch processing ended: {now}\n{RULE}");
            let _ = writer.flush();
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_block(&self, block: &str) {
        let mut guard = self.lock();
        if let Some(writer) = guard.as_mut() {
            if let Err(err) = writeln!(writer, "{block}").and_then(|()| writer.flush()) {
                log::warn!("failed to write to {}: {err}", self.path.display());
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<BufWriter<File>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SharedLogger {
    fn drop(&mut self) {
        self.close();
    }
}
