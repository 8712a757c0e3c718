use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::{BoxError, Json, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use tower::limit::ConcurrencyLimitLayer;
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub(crate) struct RequestLimits {
    pub(crate) body_limit_bytes: usize,
    pub(crate) concurrency_limit: usize,
    pub(crate) timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// Dropping a timed out request future cancels its store and classifier calls.
pub(crate) fn apply_limits(router: Router, limits: RequestLimits) -> Router {
    router.layer(DefaultBodyLimit::max(limits.body_limit_bytes)).layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_limit_error))
            .layer(TimeoutLayer::new(limits.timeout))
            .layer(ConcurrencyLimitLayer::new(limits.concurrency_limit)),
    )
}

async fn handle_limit_error(err: BoxError) -> (StatusCode, Json<ErrorBody>) {
    if err.is::<Elapsed>() {
        warn!("request timed out");
        return (
            StatusCode::REQUEST_TIMEOUT,
            Json(ErrorBody {
                error: "request timed out",
            }),
        );
    }
    warn!(error = %err, "request rejected by middleware");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "internal error",
        }),
    )
}
