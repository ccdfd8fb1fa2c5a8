use axum::{
    extract::{rejection::JsonRejection, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use taskroute_agent::Agent;
use taskroute_core::{Error, PerformanceMode, TaskResponse};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use super::load_config;

type GatewayState = Arc<Agent>;

/// Maps agent errors onto HTTP statuses with a `{error}` body.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Uninitialized(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Execution { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(kind = self.0.kind(), error = %self.0, "Request failed");
        } else {
            warn!(kind = self.0.kind(), error = %self.0, "Request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| ApiError(Error::Validation(format!("invalid JSON body: {}", e.body_text()))))
}

/// Required string field of a JSON body.
fn string_field<'a>(body: &'a Value, field: &str) -> Result<&'a str, ApiError> {
    body.get(field).and_then(Value::as_str).ok_or_else(|| {
        ApiError(Error::Validation(format!("field '{}' must be a string", field)))
    })
}

async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn handle_status(State(agent): State<GatewayState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(agent.status()?))
}

async fn handle_tools(State(agent): State<GatewayState>) -> impl IntoResponse {
    let tools = agent.tools_info();
    let count = tools.len();
    Json(serde_json::json!({
        "tools": tools,
        "count": count,
    }))
}

/// POST /task: `{task}` → `{result, processing_time, cached}`
async fn handle_task(
    State(agent): State<GatewayState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let body = json_body(payload)?;
    let task = string_field(&body, "task")?;
    Ok(Json(agent.process_task(task).await?))
}

async fn handle_cache_stats(State(agent): State<GatewayState>) -> Result<impl IntoResponse, ApiError> {
    let stats = agent.cache_stats()?;
    Ok(Json(serde_json::json!({
        "hits": stats.hits,
        "misses": stats.misses,
        "keys": stats.keys,
        "hitRate": stats.hit_rate(),
    })))
}

async fn handle_cache_clear(State(agent): State<GatewayState>) -> Result<impl IntoResponse, ApiError> {
    agent.clear_cache()?;
    Ok(Json(serde_json::json!({ "cleared": true })))
}

/// POST /mode: `{mode}` switches the performance mode for later requests.
async fn handle_mode(
    State(agent): State<GatewayState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let body = json_body(payload)?;
    let mode: PerformanceMode = string_field(&body, "mode")?.parse()?;
    let previous = agent.set_performance_mode(mode)?;
    Ok(Json(serde_json::json!({
        "mode": mode,
        "previous": previous,
    })))
}

async fn handle_not_found(uri: Uri) -> ApiError {
    ApiError(Error::NotFound(format!("no route for {}", uri.path())))
}

pub fn build_router(agent: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/status", get(handle_status))
        .route("/tools", get(handle_tools))
        .route("/task", post(handle_task))
        .route("/cache/stats", get(handle_cache_stats))
        .route("/cache/clear", post(handle_cache_clear))
        .route("/mode", post(handle_mode))
        .fallback(handle_not_found)
        .layer(CorsLayer::permissive().allow_credentials(false))
        .layer(TraceLayer::new_for_http())
        .with_state(agent)
}

pub async fn run(cli_host: Option<String>, cli_port: Option<u16>) -> anyhow::Result<()> {
    let (_, config) = load_config()?;
    let host = cli_host.unwrap_or_else(|| config.gateway.host.clone());
    let port = cli_port.unwrap_or(config.gateway.port);

    let agent = Agent::from_config(config)?;
    agent.initialize().await?;
    let app = build_router(Arc::new(agent));

    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
