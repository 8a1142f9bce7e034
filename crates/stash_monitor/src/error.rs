//! Error types for the stash monitor

use std::{io::Error as IoError, path::PathBuf};
use thiserror::Error;

/// Failures that stop the monitoring loop.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Failed to read metadata for {0}: {1}")]
    Metadata(PathBuf, IoError),

    #[error("Failed to open log file {0}: {1}")]
    Open(PathBuf, IoError),

    #[error("Failed to read {len} bytes at offset {offset} from {path}: {source}")]
    Read {
        path: PathBuf,
        offset: u64,
        len: u64,
        #[source]
        source: IoError,
    },

    #[error("Failed to watch {0}: {1}")]
    Watch(PathBuf, notify::Error),

    #[error("Watcher for {0} stopped delivering notifications")]
    WatcherStopped(PathBuf),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Rejected threshold updates. The previous value stays in effect.
#[derive(Debug, Error, PartialEq)]
pub enum ThresholdError {
    #[error("'{0}' is not a number")]
    NotNumeric(String),

    #[error("Distance must be a finite number, got {0}")]
    NotFinite(f64),
}

/// Storage keyword configuration errors
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Storage type keyword cannot be empty")]
    EmptyKeyword,

    #[error("Invalid pattern for storage type '{0}': {1}")]
    InvalidKeyword(String, regex::Error),
}

/// Delivery failures reported by an [`AlertSink`](crate::sink::AlertSink).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Sink is closed")]
    Closed,

    #[error("Failed to serialize dispatch: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write dispatch: {0}")]
    Io(#[from] IoError),
}
