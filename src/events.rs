use std::{sync::Arc, time::Duration};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::cleaner::{AzureCleaner, CleanupRequest};

/// Cleanup requested for a closed pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzdoCleanupEvent {
    pub pull_request_id: u32,
    pub remote_url: String,
    pub raw_project_url: String,
}

impl From<AzdoCleanupEvent> for CleanupRequest {
    fn from(event: AzdoCleanupEvent) -> Self {
        CleanupRequest {
            ids: vec![event.pull_request_id],
            project_url: Some(event.raw_project_url),
            remote_url: Some(event.remote_url),
            ..CleanupRequest::default()
        }
    }
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Queue the event for processing once `delay` has passed.
    async fn publish(&self, event: AzdoCleanupEvent, delay: Duration) -> Result<()>;
}

/// In-process queue: each published event waits out its delay on its own task,
/// then a single consumer hands events to the cleaner one at a time.
#[derive(Clone)]
pub struct DelayedQueue {
    tx: mpsc::UnboundedSender<AzdoCleanupEvent>,
}

impl DelayedQueue {
    /// Start the consumer task and return the publishing side.
    pub fn start(cleaner: Arc<AzureCleaner>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<AzdoCleanupEvent>();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let pull_request_id = event.pull_request_id;
                tracing::debug!(pull_request_id, "Processing cleanup event");
                if let Err(e) = cleaner.handle(event.into()).await {
                    tracing::error!(error = ?e, pull_request_id, "Cleanup failed");
                }
            }
        });
        Self { tx }
    }
}

#[async_trait]
impl EventPublisher for DelayedQueue {
    async fn publish(&self, event: AzdoCleanupEvent, delay: Duration) -> Result<()> {
        if self.tx.is_closed() {
            return Err(anyhow!("event consumer has stopped"));
        }

        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(event).is_err() {
                tracing::warn!("Event consumer stopped before a delayed event was delivered");
            }
        });
        Ok(())
    }
}
