//! Listener for `visibility-requests:*`.
//!
//! Each message is a JSON array of entries for one requester. Every entry is
//! scanned for its first completed pass and the windows found replace the
//! requester's previous result set.

use tokio::sync::watch;
use tracing::{info, warn};

use super::messages::{VisibilityDefaults, VisibilityRequestEntry};
use crate::bus::{BusMessage, Subscription, VISIBILITY_REQUESTS_PREFIX};
use crate::error::{TrackingError, TrackingResult};
use crate::services::engine::TrackingEngine;

pub async fn run(
    engine: TrackingEngine,
    mut subscription: Subscription,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(pattern = subscription.pattern(), "visibility-request worker started");
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
                        warn!(channel = %message.channel, error = %e, "dropping visibility request");
                    }
                }
                None => break,
            },
        }
    }
    info!("visibility-request worker stopped");
}

/// Requester named by the channel suffix, else by the first entry's user id.
pub fn resolve_requester_id(channel: &str, entries: &[VisibilityRequestEntry]) -> Option<String> {
    channel
        .strip_prefix(VISIBILITY_REQUESTS_PREFIX)
        .filter(|suffix| !suffix.is_empty())
        .map(str::to_string)
        .or_else(|| entries.first().and_then(|entry| entry.user_uid.clone()))
}

/// Process one batch. Returns the number of windows stored.
pub async fn handle_message(engine: &TrackingEngine, message: &BusMessage) -> TrackingResult<usize> {
    let entries: Vec<VisibilityRequestEntry> = serde_json::from_str(&message.payload)
        .map_err(|e| TrackingError::validation(format!("malformed visibility batch: {}", e)))?;
    let requester_id = resolve_requester_id(&message.channel, &entries)
        .ok_or_else(|| TrackingError::validation("requester id is required"))?;

    let settings = &engine.config().visibility;
    let defaults = VisibilityDefaults {
        horizon_deg: settings.default_horizon_deg,
        interval_seconds: settings.default_interval_seconds,
    };

    let mut requests = Vec::with_capacity(entries.len());
    for entry in entries {
        let satellite_id = entry.satellite_id.clone();
        match entry.into_request(&requester_id, defaults) {
            Ok(request) => requests.push(request),
            Err(e) => warn!(
                requester_id = %requester_id,
                object_id = %satellite_id,
                error = %e,
                "skipping invalid visibility entry"
            ),
        }
    }

    engine.process_visibility_batch(&requester_id, requests).await
}
