use std::sync::Arc;

use crate::application::engagement_service::EngagementService;
use crate::application::profile_service::ProfileService;
use crate::data::post_repository::DynPostRepository;
use crate::data::profile_repository::DynProfileRepository;
use crate::infrastructure::identity::IdentityVerifier;

pub(crate) mod app_error;
pub(crate) mod handlers;
pub(crate) mod http_handlers;
pub(crate) mod middleware;
pub(crate) mod openapi;
pub(crate) mod routes;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) engagement: Arc<EngagementService<DynPostRepository>>,
    pub(crate) profiles: Arc<ProfileService<DynProfileRepository>>,
    pub(crate) identity: Arc<dyn IdentityVerifier>,
}

impl AppState {
    pub(crate) fn new(
        engagement: Arc<EngagementService<DynPostRepository>>,
        profiles: Arc<ProfileService<DynProfileRepository>>,
        identity: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            engagement,
            profiles,
            identity,
        }
    }
}
