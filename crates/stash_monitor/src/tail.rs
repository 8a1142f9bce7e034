//! Incremental reading of a growing log file.
//!
//! [`SizeWatcher`] turns file system notifications into [`SizeChange`]s and
//! [`TailReader`] turns each change into the lines appended since the last
//! one. A shrinking file resets the read position to the new size; the bytes
//! written between the shrink and the next notification are never read.

use crate::error::MonitorError;
use notify::{Event, PollWatcher, RecursiveMode, Watcher};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// File size before and after a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeChange {
    pub previous: u64,
    pub current: u64,
}

/// Returns the current size of the file at `path`.
pub async fn file_size(path: &Path) -> Result<u64, MonitorError> {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.len())
        .map_err(|e| MonitorError::Metadata(path.to_path_buf(), e))
}

/// Produces size changes for one file from a [`notify::PollWatcher`].
///
/// The watcher thread compares the file's metadata every poll interval and
/// forwards what it sees into an unbounded channel. Each notification is
/// followed by a fresh stat, so several writes between two notifications
/// collapse into one [`SizeChange`].
pub struct SizeWatcher {
    path: PathBuf,
    last_size: u64,
    notifications: mpsc::UnboundedReceiver<notify::Result<Event>>,
    _watcher: PollWatcher,
}

impl SizeWatcher {
    /// Starts watching `path` from its current size.
    ///
    /// # Arguments
    ///
    /// * `path` - The log file to watch
    /// * `poll_interval` - How often the watcher thread compares metadata
    ///
    /// # Returns
    ///
    /// A watcher whose baseline is the size observed after the watch was
    /// registered. Fails with [`MonitorError::Metadata`] if the file cannot
    /// be stat'ed and [`MonitorError::Watch`] if the watcher cannot start.
    pub async fn new(path: impl Into<PathBuf>, poll_interval: Duration) -> Result<Self, MonitorError> {
        let path = path.into();
        // A missing file is reported as a metadata error, not a watch error.
        file_size(&path).await?;

        let (tx, notifications) = mpsc::unbounded_channel::<notify::Result<Event>>();
        let config = notify::Config::default().with_poll_interval(poll_interval);
        let mut watcher = PollWatcher::new(
            move |result: notify::Result<Event>| {
                if tx.send(result).is_err() {
                    debug!("Log watcher notification receiver dropped");
                }
            },
            config,
        )
        .map_err(|e| MonitorError::Watch(path.clone(), e))?;
        watcher
            .watch(&path, RecursiveMode::NonRecursive)
            .map_err(|e| MonitorError::Watch(path.clone(), e))?;

        let last_size = file_size(&path).await?;
        Ok(Self {
            path,
            last_size,
            notifications,
            _watcher: watcher,
        })
    }

    pub fn last_size(&self) -> u64 {
        self.last_size
    }

    /// Waits for the next notification about the file.
    ///
    /// Watcher errors are logged and still count as a notification, so the
    /// following stat decides whether the file is usable. Cancel safe.
    pub async fn notified(&mut self) -> Result<(), MonitorError> {
        match self.notifications.recv().await {
            Some(Ok(event)) => {
                trace!("🔔 {} notified: {:?}", self.path.display(), event.kind);
                Ok(())
            }
            Some(Err(e)) => {
                warn!("⚠️ Watcher error for {}: {}", self.path.display(), e);
                Ok(())
            }
            None => Err(MonitorError::WatcherStopped(self.path.clone())),
        }
    }

    /// Stats the file once and reports a change if its size moved.
    pub async fn poll(&mut self) -> Result<Option<SizeChange>, MonitorError> {
        let current = file_size(&self.path).await?;
        if current == self.last_size {
            return Ok(None);
        }

        let change = SizeChange {
            previous: self.last_size,
            current,
        };
        self.last_size = current;
        trace!("📏 {} changed size {} -> {}", self.path.display(), change.previous, change.current);
        Ok(Some(change))
    }
}

/// Reads only the byte range appended since the last notification.
#[derive(Debug)]
pub struct TailReader {
    path: PathBuf,
    known_size: u64,
}

impl TailReader {
    pub fn with_known_size(path: impl Into<PathBuf>, known_size: u64) -> Self {
        Self {
            path: path.into(),
            known_size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn known_size(&self) -> u64 {
        self.known_size
    }

    /// Applies a change notification and returns the newly appended lines.
    ///
    /// # Arguments
    ///
    /// * `change` - Sizes before and after the notification
    ///
    /// # Returns
    ///
    /// * Shrink (`current < previous`): the position resets to `current` and
    ///   nothing is read
    /// * No growth past the known size: nothing is read
    /// * Growth: exactly `current - known_size` bytes are read from
    ///   `known_size`, split into lines in file order with terminators
    ///   removed and empty fragments dropped
    ///
    /// # Errors
    ///
    /// [`MonitorError::Open`] or [`MonitorError::Read`] if the bytes cannot
    /// be read. The known size is left unchanged in that case.
    pub async fn apply(&mut self, change: SizeChange) -> Result<Vec<String>, MonitorError> {
        if change.current < change.previous {
            debug!(
                "✂️ {} shrank from {} to {} bytes, resetting position",
                self.path.display(),
                change.previous,
                change.current
            );
            self.known_size = change.current;
            return Ok(Vec::new());
        }

        if change.current <= self.known_size {
            return Ok(Vec::new());
        }

        let offset = self.known_size;
        let len = change.current - offset;
        let bytes = self.read_range(offset, len).await?;
        self.known_size = change.current;
        trace!("📖 Read {} bytes at offset {} from {}", bytes.len(), offset, self.path.display());

        Ok(split_lines(&bytes))
    }

    async fn read_range(&self, offset: u64, len: u64) -> Result<Vec<u8>, MonitorError> {
        let read_error = |source| MonitorError::Read {
            path: self.path.clone(),
            offset,
            len,
            source,
        };

        let mut file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| MonitorError::Open(self.path.clone(), e))?;
        file.seek(SeekFrom::Start(offset)).await.map_err(read_error)?;

        let mut buffer = Vec::with_capacity(len as usize);
        file.take(len)
            .read_to_end(&mut buffer)
            .await
            .map_err(read_error)?;
        Ok(buffer)
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
