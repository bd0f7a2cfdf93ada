use crate::services::get_metrics;
use crate::services::providers::ProviderError;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Status reported by `/health` for a failed provider probe.
pub fn status_for(error: &ProviderError) -> StatusCode {
    match error {
        ProviderError::Authentication(_) => StatusCode::UNAUTHORIZED,
        ProviderError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        ProviderError::Unavailable(_) | ProviderError::Connection(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Health check endpoint; probes the completion provider.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let provider = state.completion.provider();

    match provider.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "assistant-service",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => {
            tracing::warn!(provider = provider.name(), error = %e, "Health check failed");
            (
                status_for(&e),
                Json(json!({
                    "status": "unhealthy",
                    "service": "assistant-service",
                    "error": e.to_string()
                })),
            )
        }
    }
}

/// Readiness check endpoint for K8s readiness probes.
pub async fn readiness_check() -> impl IntoResponse {
    StatusCode::OK
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&ProviderError::Authentication("bad key".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&ProviderError::RateLimited("slow down".into())),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_for(&ProviderError::Unavailable("down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&ProviderError::Connection("refused".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&ProviderError::Api {
                status: 400,
                message: "bad".into()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
