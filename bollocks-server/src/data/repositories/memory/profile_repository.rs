use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::data::profile_repository::ProfileRepository;
use crate::domain::error::DomainError;
use crate::domain::identity::UserId;
use crate::domain::profile::Profile;

#[derive(Debug, Default)]
pub(crate) struct MemoryProfileRepository {
    profiles: RwLock<HashMap<UserId, Profile>>,
}

impl MemoryProfileRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for MemoryProfileRepository {
    async fn get_profile(&self, owner: &UserId) -> Result<Option<Profile>, DomainError> {
        Ok(self.profiles.read().await.get(owner).cloned())
    }

    async fn upsert_profile(
        &self,
        owner: &UserId,
        profile: Profile,
    ) -> Result<Profile, DomainError> {
        self.profiles
            .write()
            .await
            .insert(owner.clone(), profile.clone());
        Ok(profile)
    }
}
