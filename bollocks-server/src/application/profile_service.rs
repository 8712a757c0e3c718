use crate::data::profile_repository::ProfileRepository;
use crate::domain::error::DomainError;
use crate::domain::identity::UserId;
use crate::domain::profile::Profile;

pub(crate) struct ProfileService<R: ProfileRepository> {
    repo: R,
}

impl<R: ProfileRepository> ProfileService<R> {
    pub(crate) fn new(repo: R) -> Self {
        Self { repo }
    }

    /// A caller without a stored profile gets an empty one.
    pub(crate) async fn get_profile(&self, caller: &UserId) -> Result<Profile, DomainError> {
        Ok(self.repo.get_profile(caller).await?.unwrap_or_default())
    }

    pub(crate) async fn update_profile(
        &self,
        caller: &UserId,
        interests: Vec<String>,
    ) -> Result<Profile, DomainError> {
        self.repo
            .upsert_profile(caller, Profile::sanitized(interests))
            .await
    }
}
