//! Dispatch destinations used by the sentinel binary.
//!
//! Every dispatch is logged through tracing. When an output file is
//! configured, dispatches are additionally appended to it as JSON lines.

use async_trait::async_trait;
use stash_monitor::{AlertSink, Dispatch, DispatchError};
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Writes each dispatch as a structured log event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl AlertSink for TracingSink {
    async fn deliver(&self, dispatch: &Dispatch) -> Result<(), DispatchError> {
        match dispatch {
            Dispatch::DistanceAlert(alert) => {
                warn!(
                    player = %alert.player,
                    id = %alert.id,
                    item = %alert.item,
                    source = %alert.source_label,
                    distance_meters = alert.distance_meters,
                    "🚨 Distance alert: {} removed {} from {} at {}m (player <{}>, storage <{}>)",
                    alert.player,
                    alert.item,
                    alert.source_label,
                    alert.distance_meters,
                    alert.actor_position,
                    alert.storage_position
                );
            }
            Dispatch::LootSummary(summary) => {
                info!(
                    player = %summary.player,
                    storage_type = %summary.storage_type,
                    total_count = summary.total_count,
                    "📦 Loot summary: {} took {} items from {}: {}",
                    summary.player,
                    summary.total_count,
                    summary.storage_type,
                    summary.items.join(", ")
                );
            }
        }
        Ok(())
    }
}

/// Appends one JSON object per dispatch to a file.
#[derive(Debug)]
pub struct JsonLinesSink {
    file: Mutex<File>,
}

impl JsonLinesSink {
    /// Opens `path` for appending, creating it if needed.
    pub async fn create(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

#[async_trait]
impl AlertSink for JsonLinesSink {
    async fn deliver(&self, dispatch: &Dispatch) -> Result<(), DispatchError> {
        let mut line = serde_json::to_vec(dispatch)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Delivers to every inner sink in order.
///
/// All sinks are attempted; the first error encountered is returned.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn AlertSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl AlertSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

#[async_trait]
impl AlertSink for FanoutSink {
    async fn deliver(&self, dispatch: &Dispatch) -> Result<(), DispatchError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.deliver(dispatch).await {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
