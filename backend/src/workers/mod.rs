//! Long-lived bus listeners.
//!
//! One tokio task per inbound channel. Messages on a channel are processed
//! sequentially; the two workers run concurrently with each other and with
//! HTTP handlers. Both stop when the bus closes or the shutdown signal is
//! raised through [`WorkerHandles::shutdown`].

pub mod element_updates;
pub mod messages;
pub mod visibility_requests;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::bus::{MessageBus, ELEMENT_UPDATES, VISIBILITY_REQUESTS_PATTERN};
use crate::services::engine::TrackingEngine;

/// Running workers and the signal that stops them.
pub struct WorkerHandles {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerHandles {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Signal every worker and wait for them to exit. A message being
    /// processed is finished first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "worker task ended abnormally");
            }
        }
        info!("workers stopped");
    }
}

/// Subscribe both workers on `bus` and spawn them.
pub fn spawn_workers(engine: TrackingEngine, bus: &MessageBus) -> WorkerHandles {
    let (shutdown, shutdown_rx) = watch::channel(false);

    let handles = vec![
        tokio::spawn(element_updates::run(
            engine.clone(),
            bus.subscribe(ELEMENT_UPDATES),
            shutdown_rx.clone(),
        )),
        tokio::spawn(visibility_requests::run(
            engine,
            bus.subscribe(VISIBILITY_REQUESTS_PATTERN),
            shutdown_rx,
        )),
    ];

    WorkerHandles { shutdown, handles }
}
