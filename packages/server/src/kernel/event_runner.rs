//! Task runners for webhook events.
//!
//! Two implementations of [`BaseEventRunner`], picked once at startup:
//!
//! - [`TokioEventRunner`] - a fixed pool of tokio workers draining a bounded
//!   queue and applying each event to the record store
//! - [`LoggingEventRunner`] - records that an event arrived and drops it,
//!   for deployments without workers
//!
//! # Architecture
//!
//! ```text
//! webhook handler ──enqueue──► mpsc (bounded) ──► worker 0..N
//!                                                    └─► process_email_event(store, event)
//! ```

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BaseEventRunner, BaseRecordStore};
use crate::domains::email_events::{process_email_event, EmailEvent};

/// Configuration for the worker pool.
#[derive(Debug, Clone)]
pub struct EventRunnerConfig {
    /// Number of concurrent workers
    pub workers: usize,
    /// Events that can wait in the queue before `enqueue` has to wait
    pub queue_capacity: usize,
}

impl Default for EventRunnerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
        }
    }
}

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<EmailEvent>>>;

/// Worker pool that processes events in the background.
pub struct TokioEventRunner {
    sender: Mutex<Option<mpsc::Sender<EmailEvent>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl TokioEventRunner {
    /// Start the workers. Must be called inside a tokio runtime.
    pub fn spawn(store: Arc<dyn BaseRecordStore>, config: EventRunnerConfig) -> Self {
        let worker_count = config.workers.max(1);
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let receiver: SharedReceiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let workers = (0..worker_count)
            .map(|worker_id| tokio::spawn(run_worker(worker_id, receiver.clone(), store.clone())))
            .collect();

        info!(workers = worker_count, capacity = config.queue_capacity, "Email event workers started");

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        }
    }

    /// Stop accepting events and wait for queued ones to finish.
    pub async fn shutdown(&self) {
        // Dropping the last sender closes the channel; workers exit once drained.
        self.sender.lock().map(|mut s| s.take()).ok();

        let handles: Vec<JoinHandle<()>> = self
            .workers
            .lock()
            .map(|mut w| std::mem::take(&mut *w))
            .unwrap_or_default();

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Email event worker ended abnormally");
            }
        }
        info!("Email event workers stopped");
    }
}

async fn run_worker(worker_id: usize, receiver: SharedReceiver, store: Arc<dyn BaseRecordStore>) {
    loop {
        let next = receiver.lock().await.recv().await;
        let Some(event) = next else {
            break;
        };

        let ok = process_email_event(store.as_ref(), &event).await;
        debug!(
            worker_id,
            kind = %event.kind(),
            email_id = %event.email_id(),
            success = ok,
            "Email event task finished"
        );
    }
    debug!(worker_id, "Email event worker exiting");
}

#[async_trait]
impl BaseEventRunner for TokioEventRunner {
    async fn enqueue(&self, event: EmailEvent) -> Result<()> {
        let sender = self
            .sender
            .lock()
            .map_err(|_| anyhow!("event queue lock poisoned"))?
            .clone()
            .ok_or_else(|| anyhow!("event runner is shut down"))?;

        sender
            .send(event)
            .await
            .map_err(|_| anyhow!("event queue closed"))
    }

    fn name(&self) -> &'static str {
        "tokio"
    }
}

/// Stand-in used when no workers are configured: the event is logged, not
/// processed.
#[derive(Debug, Default, Clone)]
pub struct LoggingEventRunner;

#[async_trait]
impl BaseEventRunner for LoggingEventRunner {
    async fn enqueue(&self, event: EmailEvent) -> Result<()> {
        info!(
            kind = %event.kind(),
            email_id = %event.email_id(),
            "Received email event (no event workers - not processed)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "logging"
    }
}
