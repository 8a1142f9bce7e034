//! Delivery seam for alerts and summaries.
//!
//! The monitor does not know where dispatches end up. Implement
//! [`AlertSink`] to forward them to a chat service, a file, a queue, etc.
//! Delivery is best effort: a failed delivery is logged by the monitor and
//! never retried.

use crate::error::DispatchError;
use crate::types::Dispatch;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, dispatch: &Dispatch) -> Result<(), DispatchError>;
}

#[async_trait]
impl<S: AlertSink + ?Sized> AlertSink for Arc<S> {
    async fn deliver(&self, dispatch: &Dispatch) -> Result<(), DispatchError> {
        (**self).deliver(dispatch).await
    }
}

#[async_trait]
impl<S: AlertSink + ?Sized> AlertSink for Box<S> {
    async fn deliver(&self, dispatch: &Dispatch) -> Result<(), DispatchError> {
        (**self).deliver(dispatch).await
    }
}

/// Forwards dispatches into an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Dispatch>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Dispatch>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl AlertSink for ChannelSink {
    async fn deliver(&self, dispatch: &Dispatch) -> Result<(), DispatchError> {
        self.tx
            .send(dispatch.clone())
            .map_err(|_| DispatchError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LootSummary;

    fn summary() -> Dispatch {
        Dispatch::LootSummary(LootSummary {
            player: "Survivor".to_string(),
            total_count: 1,
            storage_type: "Barrel".to_string(),
            items: vec!["Apple".to_string()],
        })
    }

    #[tokio::test]
    async fn test_channel_sink_forwards() {
        let (sink, mut rx) = ChannelSink::new();
        let shared: Arc<dyn AlertSink> = Arc::new(sink);
        shared.deliver(&summary()).await.unwrap();
        assert_eq!(rx.recv().await, Some(summary()));
    }

    #[tokio::test]
    async fn test_channel_sink_closed() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        assert!(matches!(sink.deliver(&summary()).await, Err(DispatchError::Closed)));
    }
}
