use axum::Router;
use axum::routing::get;

use crate::presentation::AppState;
use crate::presentation::handlers::profile::{get_profile, update_profile};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(get_profile).put(update_profile))
}
