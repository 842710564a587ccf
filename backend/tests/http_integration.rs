//! REST API tests against the router, without binding a socket.
#![cfg(feature = "http-server")]

mod support;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use orbitcast::http::{create_router, AppState};
use orbitcast::db::DistributionRepository;
use orbitcast::services::JobStatus;
use orbitcast::workers::spawn_workers;
use serde_json::{json, Value};
use support::{epoch, eventually, harness, Harness, ScriptedOracle, ISS_LINE1, ISS_LINE2};
use tower::ServiceExt;

fn router(h: &Harness) -> Router {
    create_router(AppState::new(h.engine.clone(), h.bus.clone()))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 4 * 1024 * 1024).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        // extractor rejections answer in plain text
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_backend() {
    let h = harness(ScriptedOracle::leo());
    let (status, body) = send(router(&h), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "local (connected)");

    h.store.set_healthy(false);
    let (status, body) = send(router(&h), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "local (disconnected)");
}

#[tokio::test]
async fn test_propagate_returns_positions_and_distributes() {
    let h = harness(ScriptedOracle::leo());
    let request = post_json(
        "/v1/propagate",
        json!({
            "objectId": "25544",
            "line1": ISS_LINE1,
            "line2": ISS_LINE2,
            "startTime": "2024-06-01T00:00:00Z"
        }),
    );
    let (status, body) = send(router(&h), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["objectId"], "25544");
    assert_eq!(body["positions"].as_array().unwrap().len(), 361);
    assert_eq!(body["positions"][0]["timestamp"], "2024-06-01T00:00:00Z");

    let job_id = body["jobId"].as_str().unwrap().to_string();
    let jobs = h.engine.jobs().clone();
    let finished_job = job_id.clone();
    assert!(
        eventually(|| {
            let jobs = jobs.clone();
            let job_id = finished_job.clone();
            async move { jobs.get_job(&job_id).map(|j| j.status) == Some(JobStatus::Completed) }
        })
        .await
    );

    let (status, job) = send(router(&h), get(&format!("/v1/jobs/{}", job_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["status"], "completed");
    assert_eq!(job["result"]["persisted"], 361);

    let uri = "/v1/objects/25544/positions?start=2024-06-01T00:00:00Z&end=2024-06-01T00:01:00Z";
    let (status, body) = send(router(&h), get(uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 5);
}

#[tokio::test]
async fn test_propagate_missing_fields_is_client_error() {
    let h = harness(ScriptedOracle::leo());
    let request = post_json("/v1/propagate", json!({"line1": ISS_LINE1, "line2": ISS_LINE2}));
    let (status, body) = send(router(&h), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("TLE data and start time are required"));
    assert_eq!(h.oracle.calls(), 0);
}

#[tokio::test]
async fn test_propagate_bad_timestamp_and_interval() {
    let h = harness(ScriptedOracle::leo());
    let request = post_json(
        "/v1/propagate",
        json!({"line1": ISS_LINE1, "line2": ISS_LINE2, "startTime": "01/06/2024"}),
    );
    let (status, body) = send(router(&h), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_TIMESTAMP");
    assert_eq!(body["details"], "01/06/2024");

    let request = post_json(
        "/v1/propagate",
        json!({
            "line1": ISS_LINE1,
            "line2": ISS_LINE2,
            "startTime": "2024-06-01T00:00:00Z",
            "intervalSeconds": 0
        }),
    );
    let (status, body) = send(router(&h), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INTERVAL");
}

#[tokio::test]
async fn test_propagate_oracle_failure_is_unprocessable() {
    let h = harness(ScriptedOracle::leo());
    let request = post_json(
        "/v1/propagate",
        json!({
            "objectId": "decayed",
            "line1": ISS_LINE1,
            "line2": ISS_LINE2,
            "startTime": "2024-06-01T00:00:00Z"
        }),
    );
    let (status, body) = send(router(&h), request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "ORACLE_ERROR");
}

#[tokio::test]
async fn test_visibility_check() {
    let h = harness(ScriptedOracle::new(400.0, |s| {
        if (100..700).contains(&s) {
            25.0
        } else {
            2.0
        }
    }));
    let body = json!({
        "objectId": "25544",
        "objectName": "ISS (ZARYA)",
        "line1": ISS_LINE1,
        "line2": ISS_LINE2,
        "observer": {"latitude": 48.85, "longitude": 2.35, "horizon": 10.0},
        "startTime": "2024-06-01T00:00:00Z",
        "endTime": "2024-06-01T01:00:00Z"
    });
    let (status, response) = send(router(&h), post_json("/v1/visibility", body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["window"]["aos"], epoch().plus_seconds(100).to_rfc3339());
    assert_eq!(response["window"]["los"], epoch().plus_seconds(700).to_rfc3339());

    // default horizon of 30 degrees is never crossed
    let mut body = body;
    body["observer"] = json!({"latitude": 48.85, "longitude": 2.35});
    let (status, response) = send(router(&h), post_json("/v1/visibility", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response["window"].is_null());
}

#[tokio::test]
async fn test_unknown_resources_are_not_found() {
    let h = harness(ScriptedOracle::leo());
    let (status, body) = send(router(&h), get("/v1/visibility/nobody")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = send(router(&h), get("/v1/jobs/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stored_visibility_results_are_served() {
    let h = harness(ScriptedOracle::leo());
    h.engine
        .process_visibility_batch("dave", Vec::new())
        .await
        .unwrap();

    let (status, body) = send(router(&h), get("/v1/visibility/dave")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requesterId"], "dave");
    assert!(body["windows"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_positions_query_rejects_bad_range_timestamp() {
    let h = harness(ScriptedOracle::leo());
    let (status, body) = send(
        router(&h),
        get("/v1/objects/25544/positions?start=nope&end=2024-06-01T00:01:00Z"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_TIMESTAMP");
}

#[tokio::test]
async fn test_propagate_duration_past_time_range_is_client_error() {
    let h = harness(ScriptedOracle::leo());
    let request = post_json(
        "/v1/propagate",
        json!({
            "line1": ISS_LINE1,
            "line2": ISS_LINE2,
            "startTime": "2024-06-01T00:00:00Z",
            "durationMinutes": i64::MAX / 2
        }),
    );
    let (status, body) = send(router(&h), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(h.oracle.calls(), 0);
}

#[tokio::test]
async fn test_element_update_endpoint_drives_worker() {
    let h = harness(ScriptedOracle::leo());
    let workers = spawn_workers(h.engine.clone(), &h.bus);

    let request = post_json(
        "/v1/element-updates",
        json!({
            "id": "25544",
            "line_1": ISS_LINE1,
            "line_2": ISS_LINE2,
            "epoch": "2024-06-01T00:00:00Z"
        }),
    );
    let (status, body) = send(router(&h), request).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["channel"], "element-updates");
    assert_eq!(body["receivers"], 1);

    let store = h.store.clone();
    assert!(
        eventually(|| {
            let store = store.clone();
            async move { store.sample_count("25544").await.unwrap() == 1441 }
        })
        .await
    );

    workers.shutdown().await;
}

#[tokio::test]
async fn test_element_update_endpoint_rejects_missing_id() {
    let h = harness(ScriptedOracle::leo());
    let mut updates = h.bus.subscribe("element-updates");

    let request = post_json(
        "/v1/element-updates",
        json!({"line_1": ISS_LINE1, "line_2": ISS_LINE2}),
    );
    let (status, _) = send(router(&h), request).await;
    assert!(status.is_client_error());

    let request = post_json(
        "/v1/element-updates",
        json!({"id": "", "line_1": ISS_LINE1, "line_2": ISS_LINE2}),
    );
    let (status, body) = send(router(&h), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    assert!(updates.try_recv().is_none());
}

#[tokio::test]
async fn test_visibility_request_endpoint_drives_worker() {
    let h = harness(ScriptedOracle::new(400.0, |s| {
        if (100..700).contains(&s) {
            40.0
        } else {
            -5.0
        }
    }));
    let workers = spawn_workers(h.engine.clone(), &h.bus);

    let batch = json!([{
        "satelliteID": "25544",
        "satelliteName": "ISS (ZARYA)",
        "startTime": "2024-06-01T00:00:00Z",
        "endTime": "2024-06-01T01:00:00Z",
        "tleLine1": ISS_LINE1,
        "tleLine2": ISS_LINE2,
        "userLocation": {"latitude": 48.85, "longitude": 2.35, "horizon": 10.0},
        "userUID": "erin"
    }]);
    let (status, body) = send(router(&h), post_json("/v1/visibility-requests/erin", batch)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["channel"], "visibility-requests:erin");
    assert_eq!(body["receivers"], 1);

    let store = h.store.clone();
    assert!(
        eventually(|| {
            let store = store.clone();
            async move { store.fetch_visibility_results("erin").await.unwrap().is_some() }
        })
        .await
    );

    let (status, body) = send(router(&h), get("/v1/visibility/erin")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["windows"][0]["aos"], epoch().plus_seconds(100).to_rfc3339());
    assert_eq!(body["windows"][0]["los"], epoch().plus_seconds(700).to_rfc3339());

    workers.shutdown().await;
}
