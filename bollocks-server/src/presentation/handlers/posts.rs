use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::post::{CreatePostRequest, Post, UpdatePostRequest};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreatePostDto {
    #[validate(length(min = 1))]
    pub(crate) bollocks: String,
    /// Used only when no tags can be derived from the content.
    #[serde(default)]
    #[validate(length(max = 20))]
    pub(crate) tags: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct UpdatePostDto {
    #[validate(length(min = 1))]
    pub(crate) bollocks: String,
}

/// Public view of a post. Author and likers stay private.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDto {
    pub(crate) id: String,
    pub(crate) bollocks: String,
    pub(crate) tags: Vec<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) likes: usize,
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        let likes = post.like_count();
        Self {
            id: post.id,
            bollocks: post.content,
            tags: post.tags,
            created_at: post.created_at,
            likes,
        }
    }
}

fn to_dtos(posts: Vec<Post>) -> Vec<PostDto> {
    posts.into_iter().map(PostDto::from).collect()
}

#[utoipa::path(
    get,
    path = "/feed",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Posts by other authors, newest first", body = [PostDto]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_feed(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<(StatusCode, Json<Vec<PostDto>>)> {
    let posts = state.engagement.get_feed(&auth.user_id).await?;
    Ok((StatusCode::OK, Json(to_dtos(posts))))
}

#[utoipa::path(
    get,
    path = "/posts",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Caller's own posts, newest first", body = [PostDto]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_posts(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<(StatusCode, Json<Vec<PostDto>>)> {
    let posts = state.engagement.get_posts(&auth.user_id).await?;
    Ok((StatusCode::OK, Json(to_dtos(posts))))
}

#[utoipa::path(
    post,
    path = "/posts",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    request_body = CreatePostDto,
    responses(
        (status = 201, description = "Post created", body = PostDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(dto): Json<CreatePostDto>,
) -> AppResult<(StatusCode, HeaderMap, Json<PostDto>)> {
    dto.validate()?;
    let req = CreatePostRequest {
        content: dto.bollocks,
        hints: dto.tags,
    };

    let post = state.engagement.create_post(&auth.user_id, req).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/posts/{}", post.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(PostDto::from(post))))
}

#[utoipa::path(
    patch,
    path = "/posts/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = String, Path, description = "Post id")
    ),
    request_body = UpdatePostDto,
    responses(
        (status = 200, description = "Post updated", body = PostDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Post not found"),
        (status = 409, description = "Post was modified concurrently"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
    Json(dto): Json<UpdatePostDto>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    dto.validate()?;
    let req = UpdatePostRequest {
        content: dto.bollocks,
    };

    let post = state
        .engagement
        .update_post(&auth.user_id, &id, req)
        .await?;
    Ok((StatusCode::OK, Json(PostDto::from(post))))
}

#[utoipa::path(
    delete,
    path = "/posts/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = String, Path, description = "Post id")
    ),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Post not found"),
        (status = 409, description = "Post was modified concurrently"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.engagement.delete_post(&auth.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/posts/{id}/likes",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = String, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Like toggled", body = PostDto),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 409, description = "Too much contention, retry"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn toggle_like(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let post = state.engagement.toggle_like(&auth.user_id, &id).await?;
    Ok((StatusCode::OK, Json(PostDto::from(post))))
}
