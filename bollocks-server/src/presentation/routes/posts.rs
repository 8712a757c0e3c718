use axum::Router;
use axum::routing::{get, patch, post};

use crate::presentation::AppState;
use crate::presentation::handlers::posts::{
    create_post, delete_post, get_posts, toggle_like, update_post,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_posts).post(create_post))
        .route("/{id}", patch(update_post).delete(delete_post))
        .route("/{id}/likes", post(toggle_like))
}
