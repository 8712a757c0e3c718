use axum::Router;
use axum::middleware;
use axum::routing::get;

use super::AppState;
use super::handlers::posts::get_feed;
use super::middleware::auth::bearer_auth_middleware;

pub(crate) mod posts;
pub(crate) mod profile;

/// Every route here requires a verified bearer token.
pub(crate) fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/feed", get(get_feed))
        .nest("/posts", posts::router())
        .nest("/profile", profile::router())
        .layer(middleware::from_fn_with_state(
            state,
            bearer_auth_middleware,
        ))
}
