use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::identity::UserId;
use crate::domain::profile::Profile;

#[async_trait]
pub(crate) trait ProfileRepository: Send + Sync {
    async fn get_profile(&self, owner: &UserId) -> Result<Option<Profile>, DomainError>;
    async fn upsert_profile(&self, owner: &UserId, profile: Profile)
    -> Result<Profile, DomainError>;
}

pub(crate) type DynProfileRepository = Arc<dyn ProfileRepository>;

#[async_trait]
impl<T: ProfileRepository + ?Sized> ProfileRepository for Arc<T> {
    async fn get_profile(&self, owner: &UserId) -> Result<Option<Profile>, DomainError> {
        (**self).get_profile(owner).await
    }

    async fn upsert_profile(
        &self,
        owner: &UserId,
        profile: Profile,
    ) -> Result<Profile, DomainError> {
        (**self).upsert_profile(owner, profile).await
    }
}
