//! Listener for `element-updates`.
//!
//! Each message carries one element set. The worker classifies the orbit,
//! samples it with the regime's cadence and distributes the batch. Messages
//! are handled one at a time in arrival order; a message that fails is
//! logged and dropped.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::messages::ElementUpdateMessage;
use crate::bus::{BusMessage, Subscription};
use crate::error::{TrackingError, TrackingResult};
use crate::models::SampleInstant;
use crate::services::engine::TrackingEngine;
use crate::services::propagation::DistributionReport;

/// Consume `subscription` until the bus closes or `shutdown` turns true.
pub async fn run(
    engine: TrackingEngine,
    mut subscription: Subscription,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(pattern = subscription.pattern(), "element-update worker started");
    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            message = subscription.recv() => match message {
                Some(message) => {
                    if let Err(e) = handle_message(&engine, &message).await {
                        warn!(channel = %message.channel, error = %e, "dropping element update");
                    }
                }
                None => break,
            },
        }
    }
    info!("element-update worker stopped");
}

/// Process one raw `element-updates` payload.
pub async fn handle_message(
    engine: &TrackingEngine,
    message: &BusMessage,
) -> TrackingResult<DistributionReport> {
    let update: ElementUpdateMessage = serde_json::from_str(&message.payload)
        .map_err(|e| TrackingError::validation(format!("malformed element update: {}", e)))?;
    let (elements, start) = update.into_elements(SampleInstant::now())?;
    debug!(object_id = %elements.id, %start, "received element update");

    engine.process_element_update(elements, start).await
}
