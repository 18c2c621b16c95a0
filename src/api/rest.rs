// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Reads take the session read lock;
// every mutation takes the write lock, bumps `state_version`, and returns the
// updated piece of state so the caller never needs a second round trip.
//
// CORS is configured permissively; the chart page is served from elsewhere.
// =============================================================================

use std::ops::Range;
use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::engine::{ChartEngine, IndicatorDraw, CANDLE_PANE};
use crate::error::ChartError;
use crate::overlay::{Overlay, OverlayAnchor, OverlayKind};
use crate::render::{Coordinate, DataSpaceAxis, OverlayFigure};
use crate::series::Candle;
use crate::types::ReferenceLineState;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/state", get(full_state))
        .route("/api/v1/candles", get(candles))
        .route("/api/v1/indicators", get(indicators))
        .route(
            "/api/v1/indicators/reference-line/toggle",
            post(toggle_reference_line),
        )
        .route("/api/v1/render", get(render))
        .route(
            "/api/v1/overlays",
            get(list_overlays).post(create_overlay).delete(clear_overlays),
        )
        .route("/api/v1/overlays/anchor", post(place_anchor))
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

/// `ChartError` rendered as a JSON body with a matching status code.
pub struct ApiError(ChartError);

impl From<ChartError> for ApiError {
    fn from(e: ChartError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ChartError::DataUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ChartError::InvalidTimestamp(_) => StatusCode::BAD_REQUEST,
            ChartError::NoOverlayInProgress => StatusCode::CONFLICT,
            ChartError::UnknownIndicator(_) => StatusCode::NOT_FOUND,
        };
        warn!(status = %status, error = %self.0, "request rejected");
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Health / state
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

async fn full_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

// =============================================================================
// Series and indicators
// =============================================================================

async fn candles(State(state): State<Arc<AppState>>) -> Json<Vec<Candle>> {
    Json(state.session.read().engine().candles().to_vec())
}

async fn indicators(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.session.read().engine().views())
}

#[derive(Serialize)]
struct ToggleResponse {
    reference_line: ReferenceLineState,
    indicators: Vec<String>,
}

async fn toggle_reference_line(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let resp = {
        let mut session = state.session.write();
        let reference_line = session.toggle_reference_line()?;
        ToggleResponse {
            reference_line,
            indicators: session.engine().active_indicators(CANDLE_PANE),
        }
    };
    state.increment_version();
    Ok(Json(resp))
}

// =============================================================================
// Render
// =============================================================================

#[derive(Debug, Deserialize)]
struct RenderQuery {
    from: Option<usize>,
    to: Option<usize>,
}

#[derive(Serialize)]
struct OverlayRender {
    id: Uuid,
    figures: Vec<OverlayFigure>,
}

#[derive(Serialize)]
struct RenderResponse {
    from: usize,
    to: usize,
    indicators: Vec<IndicatorDraw>,
    overlays: Vec<OverlayRender>,
}

/// Index of the candle at or after `timestamp`, as an x position on the same
/// index axis the indicators draw on.
fn anchor_coordinate(candles: &[Candle], anchor: &OverlayAnchor) -> Coordinate {
    let index = candles.partition_point(|c| c.timestamp < anchor.timestamp);
    Coordinate {
        x: index as f64,
        y: anchor.value,
    }
}

/// Window `[from, to)` requested by the client; missing bounds cover the
/// whole series.
fn requested_window(query: &RenderQuery, len: usize) -> Range<usize> {
    let to = query.to.unwrap_or(len).min(len);
    let from = query.from.unwrap_or(0).min(to);
    from..to
}

async fn render(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RenderQuery>,
) -> Json<RenderResponse> {
    let session = state.session.read();
    let engine = session.engine();
    let candles = engine.candles();
    let window = requested_window(&query, candles.len());

    let indicators = engine.draw(CANDLE_PANE, window.clone(), &DataSpaceAxis, &DataSpaceAxis);

    let overlays = session
        .overlays()
        .iter()
        .filter(|o| o.is_complete())
        .map(|o| {
            let coordinates: Vec<Coordinate> = o
                .points
                .iter()
                .map(|p| anchor_coordinate(candles, p))
                .collect();
            OverlayRender {
                id: o.id,
                figures: o.point_figures(&coordinates),
            }
        })
        .collect();

    Json(RenderResponse {
        from: window.start,
        to: window.end,
        indicators,
        overlays,
    })
}

// =============================================================================
// Overlays
// =============================================================================

async fn list_overlays(State(state): State<Arc<AppState>>) -> Json<Vec<Overlay>> {
    Json(state.session.read().overlays().to_vec())
}

#[derive(Debug, Deserialize)]
struct CreateOverlayRequest {
    kind: OverlayKind,
}

async fn create_overlay(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOverlayRequest>,
) -> impl IntoResponse {
    let id = state.session.write().create_overlay(req.kind);
    state.increment_version();
    info!(id = %id, kind = %req.kind, "overlay creation requested");
    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id, "kind": req.kind })),
    )
}

async fn place_anchor(
    State(state): State<Arc<AppState>>,
    Json(anchor): Json<OverlayAnchor>,
) -> Result<Json<Overlay>, ApiError> {
    let overlay = state.session.write().place_overlay_anchor(anchor)?.clone();
    state.increment_version();
    Ok(Json(overlay))
}

async fn clear_overlays(State(state): State<Arc<AppState>>) -> StatusCode {
    state.session.write().clear_overlays();
    state.increment_version();
    StatusCode::NO_CONTENT
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::engine::IndicatorPipeline;
    use crate::runtime_config::ChartConfig;
    use crate::series::{ChartData, Transaction};
    use crate::session::ChartSession;
    use crate::types::TradeMode;

    fn app() -> (Router, Arc<AppState>) {
        let config = ChartConfig::default();
        let data = ChartData {
            candles: (0..4)
                .map(|i| Candle {
                    timestamp: 1_000_000 + i * 60_000,
                    open: 0.0,
                    high: 0.0,
                    low: 0.0,
                    close: i as f64,
                })
                .collect(),
            transactions: vec![Transaction {
                timestamp: 1_060,
                mode: TradeMode::Buy,
                price: 10.0,
                amount: 0.1,
            }],
        };
        let session =
            ChartSession::new(IndicatorPipeline::new(), data, config.session_options()).unwrap();
        let state = Arc::new(AppState::new(config, session));
        (router(state.clone()), state)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = app();
        let (status, body) = call(&app, Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn candles_are_served_in_order() {
        let (app, _) = app();
        let (_, body) = call(&app, Method::GET, "/api/v1/candles", None).await;
        let candles = body.as_array().unwrap();
        assert_eq!(candles.len(), 4);
        assert_eq!(candles[1]["timestamp"], 1_060_000);
    }

    #[tokio::test]
    async fn toggle_adds_then_removes_reference_line() {
        let (app, state) = app();
        let v0 = state.current_state_version();
        let uri = "/api/v1/indicators/reference-line/toggle";

        let (status, body) = call(&app, Method::POST, uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reference_line"], "PRESENT");
        assert_eq!(body["indicators"].as_array().unwrap().len(), 2);

        let (_, body) = call(&app, Method::POST, uri, None).await;
        assert_eq!(body["reference_line"], "ABSENT");
        assert_eq!(body["indicators"], serde_json::json!(["Transaction"]));
        assert_eq!(state.current_state_version(), v0 + 2);
    }

    #[tokio::test]
    async fn render_draws_visible_transactions() {
        let (app, _) = app();
        let (_, body) = call(&app, Method::GET, "/api/v1/render?from=0&to=2", None).await;
        assert_eq!(body["from"], 0);
        assert_eq!(body["to"], 2);
        let circles = body["indicators"][0]["instructions"].as_array().unwrap();
        assert_eq!(circles.len(), 1);
        assert_eq!(circles[0]["x"], 1.0);
        assert_eq!(circles[0]["color"], "#FF007F");

        let (_, body) = call(&app, Method::GET, "/api/v1/render?from=2", None).await;
        assert_eq!(body["to"], 4);
        assert!(body["indicators"][0]["instructions"]
            .as_array()
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn anchor_without_overlay_conflicts() {
        let (app, _) = app();
        let anchor = serde_json::json!({ "value": 1.0, "timestamp": 1_000_000 });
        let (status, body) = call(&app, Method::POST, "/api/v1/overlays/anchor", Some(anchor)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("no overlay"));
    }

    #[tokio::test]
    async fn measure_overlay_round_trip() {
        let (app, _) = app();
        let (status, created) = call(
            &app,
            Method::POST,
            "/api/v1/overlays",
            Some(serde_json::json!({ "kind": "measure" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        for (value, timestamp) in [(2.0, 1_000_000), (1.5, 1_180_000)] {
            call(
                &app,
                Method::POST,
                "/api/v1/overlays/anchor",
                Some(serde_json::json!({ "value": value, "timestamp": timestamp })),
            )
            .await;
        }

        let (_, overlays) = call(&app, Method::GET, "/api/v1/overlays", None).await;
        assert_eq!(overlays[0]["id"], created["id"]);
        assert_eq!(overlays[0]["state"], "measured");
        assert_eq!(overlays[0]["delta_label"], "-0.50");
        assert_eq!(overlays[0]["elapsed_label"], "3min");

        let (_, body) = call(&app, Method::GET, "/api/v1/render", None).await;
        let figures = body["overlays"][0]["figures"].as_array().unwrap();
        assert_eq!(figures[0]["type"], "rect");
        assert_eq!(figures[0]["width"], 3.0);
        assert_eq!(figures[1]["text"], "-0.50, 3min");

        let (status, _) = call(&app, Method::DELETE, "/api/v1/overlays", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, overlays) = call(&app, Method::GET, "/api/v1/overlays", None).await;
        assert!(overlays.as_array().unwrap().is_empty());
    }

    #[test]
    fn window_is_clamped_to_series() {
        let q = RenderQuery {
            from: Some(8),
            to: Some(20),
        };
        assert_eq!(requested_window(&q, 5), 5..5);
        let q = RenderQuery {
            from: None,
            to: None,
        };
        assert_eq!(requested_window(&q, 5), 0..5);
    }
}
