//! REST gateway built on axum.

use super::models::{
    ErrorResponse, FeaturesResponse, PipelinesResponse, TranslateRequest, TranslateResponse,
};
use crate::config::ServerConfig;
use crate::error::LimestoneError;
use crate::features::FeatureGroups;
use crate::pipeline::resolve_column_transformer;
use crate::registry::PipelineRegistry;
use crate::translator::translate_explanation;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Thread-safe shared gateway reference for axum handlers.
///
/// Everything in the state is read-only after startup, so no lock is needed.
pub type SharedGateway = Arc<GatewayState>;

/// Loaded pipelines plus the settings the handlers consult.
#[derive(Debug)]
pub struct GatewayState {
    config: ServerConfig,
    features: FeatureGroups,
    registry: PipelineRegistry,
    started_at: DateTime<Utc>,
}

impl GatewayState {
    pub fn new(config: ServerConfig, features: FeatureGroups, registry: PipelineRegistry) -> Self {
        Self {
            config,
            features,
            registry,
            started_at: Utc::now(),
        }
    }

    pub fn shared(self) -> SharedGateway {
        Arc::new(self)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &PipelineRegistry {
        &self.registry
    }

    /// Uptime in seconds since the state was created.
    pub fn uptime_secs(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }
}

/// JSON error response carrying an HTTP status.
#[derive(Debug)]
pub struct ApiError(LimestoneError);

impl From<LimestoneError> for ApiError {
    fn from(err: LimestoneError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LimestoneError::PipelineNotFound(_) => StatusCode::NOT_FOUND,
            LimestoneError::Config(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LimestoneError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LimestoneError::Io(_) | LimestoneError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the axum Router with all REST routes.
pub fn router(shared: SharedGateway) -> Router {
    let cors = cors_layer(&shared.config.cors_origins);
    Router::new()
        .route("/health", get(health_handler))
        .route("/pipelines", get(list_pipelines))
        .route("/pipelines/{name}/features", get(pipeline_features))
        .route("/translate/{name}", post(translate_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Health check endpoint.
async fn health_handler(State(gw): State<SharedGateway>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "pipelines": gw.registry.len(),
        "uptime_secs": gw.uptime_secs(),
    }))
}

async fn list_pipelines(State(gw): State<SharedGateway>) -> Json<PipelinesResponse> {
    Json(PipelinesResponse {
        pipelines: gw.registry.names(),
    })
}

async fn pipeline_features(
    State(gw): State<SharedGateway>,
    Path(name): Path<String>,
) -> Result<Json<FeaturesResponse>, ApiError> {
    let pipeline = gw.registry.get(&name)?;
    let features = resolve_column_transformer(pipeline)?.feature_names_out()?;
    Ok(Json(FeaturesResponse {
        pipeline_name: name,
        features,
    }))
}

async fn translate_handler(
    State(gw): State<SharedGateway>,
    Path(name): Path<String>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let pipeline = gw.registry.get(&name)?;
    let translated = translate_explanation(&request.lime_explanation, pipeline, &gw.features)?;
    Ok(Json(TranslateResponse {
        pipeline_name: name,
        lime_explanation: translated,
    }))
}

/// Start the gateway on the configured address.
///
/// Runs until Ctrl-C is received.
pub async fn run(gw: SharedGateway) -> Result<(), std::io::Error> {
    let addr = format!("{}:{}", gw.config.host, gw.config.port);
    let app = router(gw);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Limestone gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Limestone gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
