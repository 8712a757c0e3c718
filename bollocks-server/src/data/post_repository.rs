use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::identity::UserId;
use crate::domain::post::Post;

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) content: String,
    pub(crate) tags: Vec<String>,
    pub(crate) author: UserId,
}

#[derive(Debug, Clone)]
pub(crate) struct PostPatch {
    pub(crate) content: String,
    pub(crate) tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) enum AuthorFilter {
    AuthoredBy(UserId),
    NotAuthoredBy(UserId),
}

impl AuthorFilter {
    pub(crate) fn matches(&self, post: &Post) -> bool {
        match self {
            AuthorFilter::AuthoredBy(author) => post.is_authored_by(author),
            AuthorFilter::NotAuthoredBy(author) => !post.is_authored_by(author),
        }
    }
}

/// Document store for posts.
///
/// Every write that depends on a previous read is conditional on the post's
/// `version`: a mismatch yields [`DomainError::Conflict`], a missing post yields
/// [`DomainError::NotFound`]. A successful conditional write bumps the version.
/// Listings are ordered newest first (`created_at DESC, id DESC`).
#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    async fn insert_post(&self, input: NewPost) -> Result<Post, DomainError>;
    async fn get_post(&self, id: &str) -> Result<Option<Post>, DomainError>;
    async fn list_posts(&self, filter: AuthorFilter) -> Result<Vec<Post>, DomainError>;
    async fn update_post_if_version(
        &self,
        id: &str,
        expected_version: i64,
        patch: PostPatch,
    ) -> Result<Post, DomainError>;
    async fn delete_post_if_version(&self, id: &str, expected_version: i64)
    -> Result<(), DomainError>;
    async fn replace_likers_if_version(
        &self,
        id: &str,
        expected_version: i64,
        likers: Vec<UserId>,
    ) -> Result<Post, DomainError>;
}

pub(crate) type DynPostRepository = Arc<dyn PostRepository>;

#[async_trait]
impl<T: PostRepository + ?Sized> PostRepository for Arc<T> {
    async fn insert_post(&self, input: NewPost) -> Result<Post, DomainError> {
        (**self).insert_post(input).await
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>, DomainError> {
        (**self).get_post(id).await
    }

    async fn list_posts(&self, filter: AuthorFilter) -> Result<Vec<Post>, DomainError> {
        (**self).list_posts(filter).await
    }

    async fn update_post_if_version(
        &self,
        id: &str,
        expected_version: i64,
        patch: PostPatch,
    ) -> Result<Post, DomainError> {
        (**self).update_post_if_version(id, expected_version, patch).await
    }

    async fn delete_post_if_version(
        &self,
        id: &str,
        expected_version: i64,
    ) -> Result<(), DomainError> {
        (**self).delete_post_if_version(id, expected_version).await
    }

    async fn replace_likers_if_version(
        &self,
        id: &str,
        expected_version: i64,
        likers: Vec<UserId>,
    ) -> Result<Post, DomainError> {
        (**self)
            .replace_likers_if_version(id, expected_version, likers)
            .await
    }
}
