//! HTTP handlers for the REST API.
//!
//! Handlers parse and convert bodies, then delegate to the
//! [`TrackingEngine`](crate::services::TrackingEngine).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{info, warn};

use super::dto::{
    HealthResponse, PositionsQuery, PositionsResponse, PropagateBody, PropagateResponse,
    PublishResponse, VisibilityBody, VisibilityResponse, VisibilityResultsResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::bus::{ELEMENT_UPDATES, POSITIONS, VISIBILITY_REQUESTS_PREFIX};
use crate::error::TrackingError;
use crate::models::{SampleInstant, SamplePoint};
use crate::services::job_tracker::Job;
use crate::workers::messages::{ElementUpdateMessage, VisibilityRequestEntry};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Reports the store backend's reachability. Never fails itself.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let backend = match state.engine.store().health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: format!("{} ({})", state.backend, backend),
    })
}

// =============================================================================
// Propagation
// =============================================================================

/// POST /v1/propagate
///
/// Samples the ground track and returns the positions. Storing and publishing
/// them continues in a background job reported as `jobId`.
pub async fn propagate(
    State(state): State<AppState>,
    Json(body): Json<PropagateBody>,
) -> HandlerResult<PropagateResponse> {
    let request = body.into_request(&state.engine.config().propagation)?;
    let outcome = state.engine.propagate_and_spawn(request).await?;

    Ok(Json(PropagateResponse {
        object_id: outcome.object_id,
        job_id: outcome.job_id,
        positions: outcome.samples,
    }))
}

/// GET /v1/objects/{object_id}/positions?start=&end=
pub async fn get_positions(
    State(state): State<AppState>,
    Path(object_id): Path<String>,
    Query(query): Query<PositionsQuery>,
) -> HandlerResult<PositionsResponse> {
    let start = SampleInstant::parse(&query.start)?;
    let end = SampleInstant::parse(&query.end)?;
    let positions = state
        .engine
        .store()
        .range_query(&object_id, start, end)
        .await?;

    Ok(Json(PositionsResponse {
        object_id,
        count: positions.len(),
        positions,
    }))
}

// =============================================================================
// Visibility
// =============================================================================

/// POST /v1/visibility
///
/// First completed pass of one object over one observer, or `null`.
pub async fn check_visibility(
    State(state): State<AppState>,
    Json(body): Json<VisibilityBody>,
) -> HandlerResult<VisibilityResponse> {
    let request = body.into_request(&state.engine.config().visibility)?;
    let window = state.engine.find_window(request).await?;
    Ok(Json(VisibilityResponse { window }))
}

/// GET /v1/visibility/{requester_id}
pub async fn get_visibility_results(
    State(state): State<AppState>,
    Path(requester_id): Path<String>,
) -> HandlerResult<VisibilityResultsResponse> {
    let windows = state
        .engine
        .store()
        .fetch_visibility_results(&requester_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No visibility results for {}", requester_id))
        })?;

    Ok(Json(VisibilityResultsResponse {
        requester_id,
        windows,
    }))
}

// =============================================================================
// Bus ingress
// =============================================================================

fn accepted(channel: String, receivers: usize) -> (StatusCode, Json<PublishResponse>) {
    if receivers == 0 {
        warn!(channel = %channel, "no subscriber on channel, message dropped");
    } else {
        info!(channel = %channel, receivers, "message queued");
    }
    (StatusCode::ACCEPTED, Json(PublishResponse { channel, receivers }))
}

/// POST /v1/element-updates
///
/// Queues an element set for the element-update worker. The message is
/// checked the way the worker reads it, so a rejected update never reaches
/// the bus.
pub async fn publish_element_update(
    State(state): State<AppState>,
    Json(update): Json<ElementUpdateMessage>,
) -> Result<(StatusCode, Json<PublishResponse>), AppError> {
    update.clone().into_elements(SampleInstant::now())?;
    let receivers = state.bus.publish_json(ELEMENT_UPDATES, &update)?;
    Ok(accepted(ELEMENT_UPDATES.to_string(), receivers))
}

/// POST /v1/visibility-requests/{requester_id}
///
/// Queues a batch for the visibility-request worker. Results replace the
/// requester's set at `GET /v1/visibility/{requester_id}` once scanned.
pub async fn publish_visibility_requests(
    State(state): State<AppState>,
    Path(requester_id): Path<String>,
    Json(entries): Json<Vec<VisibilityRequestEntry>>,
) -> Result<(StatusCode, Json<PublishResponse>), AppError> {
    if requester_id.trim().is_empty() {
        return Err(TrackingError::validation("requester id is required").into());
    }
    let channel = format!("{}{}", VISIBILITY_REQUESTS_PREFIX, requester_id);
    let receivers = state.bus.publish_json(&channel, &entries)?;
    Ok(accepted(channel, receivers))
}

// =============================================================================
// Jobs
// =============================================================================

/// GET /v1/jobs/{job_id}
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> HandlerResult<Job> {
    state
        .engine
        .jobs()
        .get_job(&job_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))
}

// =============================================================================
// Streaming
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamQuery {
    /// Only forward samples of this object.
    #[serde(default)]
    pub object_id: Option<String>,
}

/// GET /v1/positions/stream
///
/// Server-sent events, one `position` event per published sample.
pub async fn stream_positions(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut subscription = state.bus.subscribe(POSITIONS);
    let stream = async_stream::stream! {
        while let Some(message) = subscription.recv().await {
            if let Some(ref wanted) = query.object_id {
                let matches = serde_json::from_str::<SamplePoint>(&message.payload)
                    .map(|sample| &sample.object_id == wanted)
                    .unwrap_or(false);
                if !matches {
                    continue;
                }
            }
            yield Ok(Event::default().event("position").data(message.payload));
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
