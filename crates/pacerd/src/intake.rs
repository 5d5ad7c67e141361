//! Event intake — the operator-facing HTTP surface.
//!
//! Bridges raw notifications into domain events: `/api/v1/events`
//! accepts ready-made events, `/api/v1/topology` accepts two placement
//! snapshots, diffs them, and emits a `DEPLOYMENT_CHANGE` event only
//! when the topology actually changed.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use pacer_control::{DispatchOutcome, EventRouter};
use pacer_core::{Event, ThroughputKey, event};
use pacer_topology::{PlacementRecord, detect_change, node_service_counts};
use serde::Deserialize;
use tracing::{error, info};

/// Shared state for intake handlers.
#[derive(Clone)]
pub struct IntakeState {
    pub router: Arc<EventRouter>,
}

/// Build the intake router.
pub fn build_intake(router: Arc<EventRouter>) -> Router {
    let state = IntakeState { router };
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/v1/events", post(submit_event))
        .route("/api/v1/topology", post(submit_topology))
        .with_state(state)
}

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn outcome_tag(outcome: DispatchOutcome) -> &'static str {
    match outcome {
        DispatchOutcome::Handled => "handled",
        DispatchOutcome::NoHandler => "ignored",
        DispatchOutcome::Busy => "dropped",
    }
}

/// GET /healthz
async fn healthz() -> &'static str {
    "ok"
}

/// POST /api/v1/events
pub async fn submit_event(
    State(state): State<IntakeState>,
    Json(event): Json<Event>,
) -> impl IntoResponse {
    match state.router.dispatch(&event).await {
        Ok(outcome) => {
            ApiResponse::ok(serde_json::json!({ "outcome": outcome_tag(outcome) })).into_response()
        }
        Err(e) => {
            error!(event_type = %event.event_type, error = %e, "adjustment cycle failed");
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
    }
}

/// Two placement snapshots to compare.
#[derive(Debug, Deserialize)]
pub struct TopologySnapshots {
    #[serde(default)]
    pub old: Vec<PlacementRecord>,
    #[serde(default)]
    pub new: Vec<PlacementRecord>,
}

/// POST /api/v1/topology
///
/// Diffs the snapshots and, on a real change, synthesizes a
/// `DEPLOYMENT_CHANGE` event whose `payload.hash` names the first
/// affected node with its new service counts.
pub async fn submit_topology(
    State(state): State<IntakeState>,
    Json(snapshots): Json<TopologySnapshots>,
) -> impl IntoResponse {
    let report = detect_change(&snapshots.old, &snapshots.new);
    if !report.changed {
        return ApiResponse::ok(serde_json::json!({
            "changed": false,
            "outcome": "unchanged",
        }))
        .into_response();
    }

    info!(
        added = report.diff.added_nodes.len(),
        removed = report.diff.removed_nodes.len(),
        changed_nodes = report.diff.changed_nodes.len(),
        "topology changed, emitting deployment change event"
    );

    let new_counts = node_service_counts(&snapshots.new);
    // Prefer a node whose mix changed, then a freshly added one.
    let affected = report
        .diff
        .changed_nodes
        .keys()
        .chain(report.diff.added_nodes.iter())
        .next()
        .cloned();

    let hash = affected.map(|node| {
        let services = new_counts.get(&node).cloned().unwrap_or_default();
        serde_json::to_value(ThroughputKey { node, services }).unwrap_or_default()
    });

    let payload = serde_json::json!({
        "hash": hash,
        "diff": report.diff,
    });
    let change = Event::now(event::DEPLOYMENT_CHANGE, payload, "topology-intake");

    match state.router.dispatch(&change).await {
        Ok(outcome) => ApiResponse::ok(serde_json::json!({
            "changed": true,
            "outcome": outcome_tag(outcome),
            "diff": report.diff,
        }))
        .into_response(),
        Err(e) => {
            error!(error = %e, "adjustment cycle failed");
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
    }
}
