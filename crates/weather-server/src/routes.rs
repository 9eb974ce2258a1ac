use crate::metrics::publish_cache_stats;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use weather_core::{ErrorKind, ProviderInfo, WeatherError, WeatherReading, WeatherService};

/// Shared application state passed to all handlers.
pub struct AppState {
    pub service: WeatherService,
    /// `None` when no recorder is installed; `/metrics` then answers 404.
    pub prometheus: Option<PrometheusHandle>,
}

pub fn router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/api/weather", get(weather_handler))
        .route("/api/providers", get(providers_handler))
        .route("/api/cache/stats", get(cache_stats_handler))
        .route("/health", get(|| async { "ok" }))
        .route("/metrics", get(metrics_handler))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    #[serde(default)]
    pub city: String,
}

/// GET /api/weather?city=<name>
pub async fn weather_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherReading>, ApiError> {
    let reading = state.service.get_weather(&query.city).await?;
    Ok(Json(reading))
}

/// GET /api/providers
pub async fn providers_handler(State(state): State<Arc<AppState>>) -> Json<ProviderInfo> {
    Json(state.service.provider_info())
}

/// GET /api/cache/stats
pub async fn cache_stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.service.cache_metrics();
    Json(serde_json::json!({
        "backend": state.service.cache_backend(),
        "hits": stats.hits,
        "misses": stats.misses,
        "total_ops": stats.total_ops(),
        "hit_ratio": stats.hit_ratio(),
    }))
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.prometheus {
        Some(handle) => {
            publish_cache_stats(state.service.cache_metrics(), state.service.cache_backend());
            handle.render().into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Maps pipeline failures to HTTP responses with a JSON `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError(pub WeatherError);

impl From<WeatherError> for ApiError {
    fn from(e: WeatherError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::ExternalApi | ErrorKind::Configuration => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self.0, "weather request failed");
        }
        let body = Json(serde_json::json!({
            "error": self.0.to_string(),
            "kind": self.0.kind(),
        }));
        (status, body).into_response()
    }
}
