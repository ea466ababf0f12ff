//! Work router for distributing work items to thread pool.

use crate::source::WorkMessage;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Work router that distributes work items to a pool of workers.
///
/// Uses bounded channels to provide backpressure when workers are busy.
pub struct WorkRouter {
    /// Senders for each worker thread
    senders: Vec<mpsc::Sender<WorkMessage>>,

    /// Round-robin counter for distribution
    next_worker: AtomicUsize,

    /// Whether the router is shutdown
    shutdown: AtomicBool,
}

impl WorkRouter {
    /// Create a new work router with the specified number of workers and buffer size.
    pub fn new(num_workers: usize, buffer_size: usize) -> (Self, Vec<mpsc::Receiver<WorkMessage>>) {
        let mut senders = Vec::with_capacity(num_workers);
        let mut receivers = Vec::with_capacity(num_workers);

        for _ in 0..num_workers {
            let (tx, rx) = mpsc::channel(buffer_size);
            senders.push(tx);
            receivers.push(rx);
        }

        let router = Self {
            senders,
            next_worker: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
        };

        (router, receivers)
    }

    /// Route a work message to a worker using round-robin distribution.
    ///
    /// Returns `Ok(())` if the message was sent successfully.
    /// Returns `Err(message)` if the router is shutdown or all channels are closed.
    pub async fn route(&self, message: WorkMessage) -> Result<(), WorkMessage> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(message);
        }

        // Round-robin selection
        let worker_idx = self.next_worker.fetch_add(1, Ordering::Relaxed) % self.senders.len();
        let sender = &self.senders[worker_idx];

        trace!(
            worker = worker_idx,
            message_id = %message.id,
            "Routing message to worker"
        );

        sender.send(message).await.map_err(|e| e.0)
    }

    /// Route a batch of work messages to workers.
    ///
    /// Returns the messages that could not be routed.
    pub async fn route_batch(&self, messages: Vec<WorkMessage>) -> Vec<WorkMessage> {
        let mut failed = Vec::new();

        for message in messages {
            if let Err(msg) = self.route(message).await {
                failed.push(msg);
            }
        }

        if !failed.is_empty() {
            debug!("{} messages could not be routed", failed.len());
        }

        failed
    }

    /// Signal shutdown to all workers.
    ///
    /// After calling this, `route` will return errors for new messages.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        debug!("Work router shutdown signaled");
    }

    /// Check if the router is shutdown.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Get the number of workers.
    pub fn num_workers(&self) -> usize {
        self.senders.len()
    }
}
