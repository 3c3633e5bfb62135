pub mod config;
pub mod error;
pub mod form;
pub mod generate;
pub mod metrics;
pub mod model;
pub mod validation;

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tts_core::{AudioStager, ReferenceResolver, VoiceCatalog, VoiceCategory};

use crate::config::ServerConfig;
use crate::generate::generate_endpoint;
use crate::metrics::{metrics_endpoint, AppMetrics};
use crate::model::ModelSlot;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AppState {
    pub model: ModelSlot,
    pub resolver: Arc<ReferenceResolver>,
    pub metrics: AppMetrics,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig, model: ModelSlot) -> Self {
        let resolver = ReferenceResolver::new(
            VoiceCatalog::new(&config.voices_dir),
            AudioStager::new(&config.staging_dir),
        );
        Self {
            model,
            resolver: Arc::new(resolver),
            metrics: AppMetrics::default(),
            config,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub device: String,
    pub model: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, model) = match state.model.get() {
        Some(loaded) => ("ok", loaded.name().to_string()),
        None => ("loading", state.config.model_name.clone()),
    };
    Json(HealthResponse {
        status,
        device: state.config.device.clone(),
        model,
    })
}

pub async fn liveness() -> &'static str {
    "ok"
}

pub async fn list_voices(State(state): State<AppState>) -> Json<BTreeMap<VoiceCategory, Vec<String>>> {
    Json(state.resolver.catalog().list_voices())
}

// Request ID middleware for tracing
async fn add_request_id(mut request: Request, next: Next) -> Response {
    let request_id = HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("-"));
    request
        .headers_mut()
        .insert(REQUEST_ID_HEADER, request_id.clone());
    let mut response = next.run(request).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, request_id);
    response
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    let origins: Vec<HeaderValue> = match &config.cors_allowed_origins {
        Some(allowed) => allowed.iter().filter_map(|origin| origin.parse().ok()).collect(),
        None => {
            warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (development mode)");
            return base.allow_origin(Any);
        }
    };

    if origins.is_empty() {
        warn!("CORS_ALLOWED_ORIGINS is empty, falling back to permissive CORS");
        base.allow_origin(Any)
    } else {
        info!("CORS configured for {} origin(s)", origins.len());
        base.allow_origin(AllowOrigin::list(origins))
    }
}

/// Assemble routes and middleware around `state`.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let api = Router::new()
        .route("/", get(health_check))
        .route("/healthz", get(liveness))
        .route("/voices", get(list_voices))
        .route("/generate", post(generate_endpoint))
        .route("/metrics", get(metrics_endpoint));

    let mut app = Router::new()
        .merge(api.clone()) // root paths
        .nest("/api", api) // /api prefix
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(axum::middleware::from_fn(add_request_id));

    if let Some(timeout) = config.request_timeout() {
        info!("Request timeout: {}s", timeout.as_secs());
        app = app.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config)),
    )
    .with_state(state)
}
