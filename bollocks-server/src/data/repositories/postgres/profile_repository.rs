use async_trait::async_trait;
use sqlx::PgPool;

use crate::data::profile_repository::ProfileRepository;
use crate::domain::error::DomainError;
use crate::domain::identity::UserId;
use crate::domain::profile::Profile;

#[derive(Debug, Clone)]
pub(crate) struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn get_profile(&self, owner: &UserId) -> Result<Option<Profile>, DomainError> {
        let interests = sqlx::query_scalar::<_, Vec<String>>(
            r#"
            SELECT interests
            FROM profiles
            WHERE owner = $1
            "#,
        )
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| DomainError::Upstream(err.to_string()))?;

        Ok(interests.map(|interests| Profile { interests }))
    }

    async fn upsert_profile(
        &self,
        owner: &UserId,
        profile: Profile,
    ) -> Result<Profile, DomainError> {
        let interests = sqlx::query_scalar::<_, Vec<String>>(
            r#"
            INSERT INTO profiles (owner, interests)
            VALUES ($1, $2)
            ON CONFLICT (owner) DO UPDATE
            SET interests = EXCLUDED.interests,
                updated_at = NOW()
            RETURNING interests
            "#,
        )
        .bind(owner.as_str())
        .bind(&profile.interests)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| DomainError::Upstream(err.to_string()))?;

        Ok(Profile { interests })
    }
}
