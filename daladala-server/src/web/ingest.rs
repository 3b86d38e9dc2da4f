//! Position ingest API — device/driver apps POST batches of reports here.
//!
//! Every report gets an individual decision; the response summarizes counts
//! and itemizes validation failures so a producer can fix its payloads.
//! Accepted updates are fanned out to the WebSocket live feed.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use daladala_core::{IngestOutcome, RawReport, RejectReason};

use crate::web::{now, AppState};
use crate::web::live::LiveUpdate;

#[derive(Deserialize)]
pub struct IngestRequest {
    reports: Vec<RawReport>,
}

/// POST /api/v1/positions — batch ingest.
pub async fn api_ingest_positions(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IngestRequest>,
) -> (StatusCode, Json<Value>) {
    let received_at = now();

    let mut accepted = 0u64;
    let mut rejected_stale = 0u64;
    let mut rejected_duplicate = 0u64;
    let mut invalid = 0u64;
    let mut errors: Vec<Value> = Vec::new();

    for (i, raw) in body.reports.into_iter().enumerate() {
        let update = LiveUpdate::from_raw(&raw, received_at);
        match state.ingestor.ingest(raw, received_at) {
            Ok(IngestOutcome::Accepted { sequence, .. }) => {
                accepted += 1;
                // No subscribers is fine; send only fails when nobody listens
                let _ = state.updates.send(update.with_sequence(sequence));
            }
            Ok(IngestOutcome::Rejected {
                reason: RejectReason::Stale,
            }) => rejected_stale += 1,
            Ok(IngestOutcome::Rejected {
                reason: RejectReason::Duplicate,
            }) => rejected_duplicate += 1,
            Err(err) => {
                invalid += 1;
                errors.push(json!({
                    "index": i,
                    "vehicle_id": update.vehicle_id,
                    "error": err.to_string(),
                }));
            }
        }
    }

    (
        StatusCode::OK,
        Json(json!({
            "accepted": accepted,
            "rejected_stale": rejected_stale,
            "rejected_duplicate": rejected_duplicate,
            "invalid": invalid,
            "errors": errors,
        })),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
