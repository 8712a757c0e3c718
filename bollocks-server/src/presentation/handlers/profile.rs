use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::profile::Profile;
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::middleware::auth::AuthenticatedUser;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ProfileDto {
    pub(crate) interests: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct UpdateProfileDto {
    #[validate(length(max = 50))]
    pub(crate) interests: Vec<String>,
}

impl From<Profile> for ProfileDto {
    fn from(profile: Profile) -> Self {
        Self {
            interests: profile.interests,
        }
    }
}

#[utoipa::path(
    get,
    path = "/profile",
    tag = "profile",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Caller's profile", body = ProfileDto),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_profile(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<(StatusCode, Json<ProfileDto>)> {
    let profile = state.profiles.get_profile(&auth.user_id).await?;
    Ok((StatusCode::OK, Json(ProfileDto::from(profile))))
}

#[utoipa::path(
    put,
    path = "/profile",
    tag = "profile",
    security(
        ("bearer_auth" = [])
    ),
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = ProfileDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_profile(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(dto): Json<UpdateProfileDto>,
) -> AppResult<(StatusCode, Json<ProfileDto>)> {
    dto.validate()?;
    let profile = state
        .profiles
        .update_profile(&auth.user_id, dto.interests)
        .await?;
    Ok((StatusCode::OK, Json(ProfileDto::from(profile))))
}
