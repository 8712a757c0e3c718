use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::handlers::posts::{CreatePostDto, PostDto, UpdatePostDto};
use crate::presentation::handlers::profile::{ProfileDto, UpdateProfileDto};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::handlers::posts::get_feed,
        crate::presentation::handlers::posts::get_posts,
        crate::presentation::handlers::posts::create_post,
        crate::presentation::handlers::posts::update_post,
        crate::presentation::handlers::posts::delete_post,
        crate::presentation::handlers::posts::toggle_like,
        crate::presentation::handlers::profile::get_profile,
        crate::presentation::handlers::profile::update_profile
    ),
    components(
        schemas(
            CreatePostDto,
            UpdatePostDto,
            PostDto,
            ProfileDto,
            UpdateProfileDto
        )
    ),
    tags(
        (name = "posts", description = "Posting, feed and likes"),
        (name = "profile", description = "Caller profile")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}
