//! REST API route handlers for fleet queries and administration.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use daladala_core::{BoundingBox, VehicleStatus};

use crate::web::{now, AppState};

// ---------------------------------------------------------------------------
// Query param types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct FleetParams {
    min_lat: Option<f64>,
    max_lat: Option<f64>,
    min_lon: Option<f64>,
    max_lon: Option<f64>,
    status: Option<String>,
}

impl FleetParams {
    /// All four corners or none; a partial box is a caller error.
    fn bounds(&self) -> Result<Option<BoundingBox>, String> {
        match (self.min_lat, self.max_lat, self.min_lon, self.max_lon) {
            (Some(min_lat), Some(max_lat), Some(min_lon), Some(max_lon)) => {
                Ok(Some(BoundingBox {
                    min_lat,
                    max_lat,
                    min_lon,
                    max_lon,
                }))
            }
            (None, None, None, None) => Ok(None),
            _ => Err("bounding box requires min_lat, max_lat, min_lon, max_lon".to_string()),
        }
    }

    fn status(&self) -> Result<Option<VehicleStatus>, String> {
        self.status.as_deref().map(str::parse).transpose()
    }
}

fn bad_request(message: String) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message})))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/vehicles — fleet listing, optionally filtered by bounding box
/// and/or status, sorted by vehicle_id.
pub async fn api_vehicles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FleetParams>,
) -> impl IntoResponse {
    let bounds = match params.bounds() {
        Ok(b) => b,
        Err(message) => return bad_request(message).into_response(),
    };
    let status = match params.status() {
        Ok(s) => s,
        Err(message) => return bad_request(message).into_response(),
    };

    let vehicles = state.query.list_fleet(bounds, status, now());
    Json(serde_json::to_value(&vehicles).unwrap_or(json!([]))).into_response()
}

/// GET /api/vehicles/:id — single vehicle detail.
pub async fn api_vehicle_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.query.get_vehicle(&id, now()) {
        Some(vehicle) => Json(serde_json::to_value(&vehicle).unwrap_or(json!({}))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "vehicle not found"})),
        )
            .into_response(),
    }
}

/// DELETE /api/vehicles/:id — administrative removal.
pub async fn api_vehicle_remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.remove(&id) {
        Some(_) => {
            tracing::info!(vehicle = %id, "vehicle removed");
            Json(json!({"removed": id})).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "vehicle not found"})),
        )
            .into_response(),
    }
}

/// GET /api/stats — store counters and fleet size.
pub async fn api_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "vehicles": state.store.len(),
        "counters": state.store.counters(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use daladala_core::{RawReport, TrackingConfig, VehicleStateStore};

    fn test_state() -> Arc<AppState> {
        let config = TrackingConfig::new(60.0, 300.0, 30.0, 5.0).unwrap();
        Arc::new(AppState::new(Arc::new(VehicleStateStore::new(config))))
    }

    fn seed(state: &AppState, vehicle_id: &str, lat: f64, lon: f64) {
        let received_at = now();
        state
            .ingestor
            .ingest(
                RawReport {
                    vehicle_id: vehicle_id.to_string(),
                    lat,
                    lon,
                    heading_deg: None,
                    speed_kmh: None,
                    recorded_at: received_at,
                },
                received_at,
            )
            .unwrap();
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_api_vehicles_empty() {
        let app = crate::web::build_router(test_state());
        let response = app.oneshot(get("/api/vehicles")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_api_vehicles_sorted() {
        let state = test_state();
        seed(&state, "bus-2", -6.8, 39.3);
        seed(&state, "bus-1", -6.9, 39.2);

        let app = crate::web::build_router(state);
        let json = body_json(app.oneshot(get("/api/vehicles")).await.unwrap()).await;
        assert_eq!(json[0]["vehicle_id"], "bus-1");
        assert_eq!(json[1]["vehicle_id"], "bus-2");
        assert_eq!(json[0]["status"], "active");
    }

    #[tokio::test]
    async fn test_api_vehicles_bounding_box() {
        let state = test_state();
        seed(&state, "bus-in", -6.8, 39.3);
        seed(&state, "bus-out", 10.0, 10.0);

        let app = crate::web::build_router(state);
        let json = body_json(
            app.oneshot(get(
                "/api/vehicles?min_lat=-7&max_lat=-6&min_lon=39&max_lon=40",
            ))
            .await
            .unwrap(),
        )
        .await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["vehicle_id"], "bus-in");
    }

    #[tokio::test]
    async fn test_api_vehicles_partial_bbox_rejected() {
        let app = crate::web::build_router(test_state());
        let response = app
            .oneshot(get("/api/vehicles?min_lat=-7"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_vehicles_bad_status_rejected() {
        let app = crate::web::build_router(test_state());
        let response = app
            .oneshot(get("/api/vehicles?status=parked"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_vehicle_detail_and_404() {
        let state = test_state();
        seed(&state, "bus-12", -6.8, 39.3);

        let app = crate::web::build_router(Arc::clone(&state));
        let json = body_json(app.oneshot(get("/api/vehicles/bus-12")).await.unwrap()).await;
        assert_eq!(json["vehicle_id"], "bus-12");
        assert_eq!(json["sequence"], 1);

        let app = crate::web::build_router(state);
        let response = app.oneshot(get("/api/vehicles/ghost")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_vehicle_remove() {
        let state = test_state();
        seed(&state, "bus-12", -6.8, 39.3);

        let app = crate::web::build_router(Arc::clone(&state));
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/vehicles/bus-12")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.store.is_empty());
    }

    #[tokio::test]
    async fn test_api_stats() {
        let state = test_state();
        seed(&state, "bus-12", -6.8, 39.3);

        let app = crate::web::build_router(state);
        let json = body_json(app.oneshot(get("/api/stats")).await.unwrap()).await;
        assert_eq!(json["vehicles"], 1);
        assert_eq!(json["counters"]["accepted"], 1);
    }
}
