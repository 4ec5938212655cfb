//! HTTP surface for the wash recommender, using axum.
//!
//! A thin adapter: requests are decoded, handed to the shared [`Washer`] or
//! the in-memory [`ClothCatalog`], and the result is encoded as JSON.
//!
//! # Endpoints
//!
//! - `GET  /` - status message
//! - `GET  /health` - health check
//! - `POST /simulation/` - [`WashRequest`] in, [`WashProgram`] out
//! - `POST /simulation/load` - catalog ids in, aggregated load and program out
//! - `POST /admin/clothes/` - add a cloth to the catalog
//! - `GET  /admin/clothes/?skip=&limit=` - list the catalog
//!
//! Failures are returned as [`ErrorResponse`] JSON with the mapped status.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{ErrorCode, ErrorResponse, WashError};
use crate::washer::catalog::DEFAULT_LIMIT;
use crate::washer::{
    CatalogEntry, ClothCatalog, ClothItem, LoadSummary, WashProgram, WashRequest, Washer,
};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the server
pub struct AppState {
    /// Shared rule bank plus engine options; read-only
    pub washer: Washer<'static>,
    /// Cloth catalog (read-write, in memory only)
    pub catalog: RwLock<ClothCatalog>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(washer: Washer<'static>, config: ServerConfig) -> Self {
        Self {
            washer,
            catalog: RwLock::new(ClothCatalog::new()),
            config,
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /admin/clothes/
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    skip: Option<usize>,
    limit: Option<usize>,
}

/// Body of POST /simulation/load
#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    pub cloth_ids: Vec<u64>,
}

#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub load: LoadSummary,
    #[serde(flatten)]
    pub program: WashProgram,
}

/// A [`WashError`] on its way out as JSON
#[derive(Debug)]
pub struct ApiError(WashError);

impl From<WashError> for ApiError {
    fn from(err: WashError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(
            WashError::validation(rejection.body_text())
                .with_code(ErrorCode::InvalidFormat)
                .with_context("format", "JSON"),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if err.is_model_fault() {
            error!(error = %err, "rule bank is malformed");
        } else if err.is_client_error() {
            debug!(code = ?err.code, "request rejected");
        } else {
            warn!(error = %err, "request failed");
        }
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(&err))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Route Handlers
// ============================================================================

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Washing Machine Fuzzy Logic Backend is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// POST /simulation/
async fn simulate(
    State(state): State<SharedState>,
    body: Result<Json<WashRequest>, JsonRejection>,
) -> ApiResult<WashProgram> {
    let Json(request) = body?;
    let program = state.washer.recommend(&request)?;
    info!(
        load = request.total_load,
        dirt = request.avg_dirt_level,
        delicateness = request.max_delicateness,
        "simulation served"
    );
    Ok(Json(program))
}

/// POST /simulation/load
async fn simulate_load(
    State(state): State<SharedState>,
    body: Result<Json<LoadRequest>, JsonRejection>,
) -> ApiResult<LoadResponse> {
    let Json(request) = body?;
    let items = state.catalog.read().await.items(&request.cloth_ids)?;
    let load = LoadSummary::from_items(&items)?;
    let program = state.washer.recommend(&load.to_request())?;
    Ok(Json(LoadResponse { load, program }))
}

/// POST /admin/clothes/
async fn create_cloth(
    State(state): State<SharedState>,
    body: Result<Json<ClothItem>, JsonRejection>,
) -> ApiResult<CatalogEntry> {
    let Json(item) = body?;
    let entry = state.catalog.write().await.create(item)?;
    info!(id = entry.id, name = %entry.item.name, "cloth added");
    Ok(Json(entry))
}

/// GET /admin/clothes/
async fn list_clothes(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<CatalogEntry>> {
    let catalog = state.catalog.read().await;
    Json(catalog.list(params.skip.unwrap_or(0), params.limit.unwrap_or(DEFAULT_LIMIT)))
}

// ============================================================================
// Server Setup
// ============================================================================

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    let cors_enabled = state.config.cors_enabled;
    let max_body_size = state.config.max_body_size;

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/simulation", post(simulate))
        .route("/simulation/", post(simulate))
        .route("/simulation/load", post(simulate_load))
        .route("/admin/clothes", get(list_clothes).post(create_cloth))
        .route("/admin/clothes/", get(list_clothes).post(create_cloth))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_enabled {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_origin(Any)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);
        router = router.layer(cors);
    }

    router
}

/// Serve until Ctrl+C
pub async fn run_server(washer: Washer<'static>, config: ServerConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    let app = create_router(Arc::new(AppState::new(washer, config)));

    info!(%addr, "wash server listening");
    eprintln!("Wash server listening on http://{}", addr);
    eprintln!("Press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C; serving until killed");
        std::future::pending::<()>().await;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::InferenceEngine;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    fn app() -> Router {
        let washer = Washer::shared(InferenceEngine::new()).unwrap();
        create_router(Arc::new(AppState::new(washer, ServerConfig::default())))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_root_message() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["message"], "Washing Machine Fuzzy Logic Backend is running");
    }

    #[tokio::test]
    async fn test_simulation() {
        let response = app()
            .oneshot(post_json(
                "/simulation/",
                r#"{"total_load": 2, "avg_dirt_level": 2, "max_delicateness": 2}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert!(json["wash_time"].as_f64().unwrap() < 20.0);
        assert!(json["spin_speed"].as_f64().unwrap() > 1000.0);
        assert!((json["detergent_amount"].as_f64().unwrap() - 30.0).abs() < 1e-3);
        assert_eq!(
            json["explanation"],
            "Fuzzy Calculation based on Load=2.0, Dirt=2.0, Sensitivity=2.0"
        );
    }

    #[tokio::test]
    async fn test_simulation_rejects_bad_json() {
        let response = app()
            .oneshot(post_json("/simulation/", r#"{"total_load": 2}"#))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
        let json = json_body(response).await;
        assert_eq!(json["error"], true);
        assert_eq!(json["code"], "InvalidFormat");
    }

    #[tokio::test]
    async fn test_catalog_and_load_simulation() {
        let app = app();

        for body in [
            r#"{"name": "jeans", "image_url": "/img/jeans.png", "weight": 0.8,
                "dirt_level": 7, "delicateness": 2}"#,
            r#"{"name": "sweater", "weight": 0.9, "dirt_level": 3, "delicateness": 9}"#,
        ] {
            let response = app.clone().oneshot(post_json("/admin/clothes/", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/admin/clothes/?skip=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["id"], 2);
        assert_eq!(json[0]["name"], "sweater");

        let response = app
            .clone()
            .oneshot(post_json("/simulation/load", r#"{"cloth_ids": [1, 2]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert!((json["load"]["total_load"].as_f64().unwrap() - 1.7).abs() < 1e-9);
        assert_eq!(json["load"]["avg_dirt_level"], 5.0);
        assert_eq!(json["load"]["max_delicateness"], 9.0);
        // delicate garment drives the spin down
        assert!(json["spin_speed"].as_f64().unwrap() < 600.0);

        let response = app
            .oneshot(post_json("/simulation/load", r#"{"cloth_ids": [7]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_cloth_rejected() {
        let response = app()
            .oneshot(post_json(
                "/admin/clothes/",
                r#"{"name": "duvet", "weight": 14, "dirt_level": 3, "delicateness": 2}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["code"], "InvalidValue");
    }

    #[tokio::test]
    async fn test_empty_load_rejected() {
        let response = app()
            .oneshot(post_json("/simulation/load", r#"{"cloth_ids": []}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
