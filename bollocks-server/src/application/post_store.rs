use tracing::debug;

use crate::data::post_repository::{AuthorFilter, NewPost, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::identity::UserId;
use crate::domain::post::Post;

/// Post persistence on top of a [`PostRepository`].
///
/// Turns repository lookups into `NotFound` errors and runs the like toggle as
/// an optimistic read-modify-write. Only a `Conflict` from the conditional
/// write is treated as an aborted transaction and re-run; every other error
/// is returned as is.
pub(crate) struct PostStore<R: PostRepository> {
    repo: R,
    like_max_attempts: u32,
}

impl<R: PostRepository> PostStore<R> {
    pub(crate) fn new(repo: R, like_max_attempts: u32) -> Self {
        Self {
            repo,
            like_max_attempts: like_max_attempts.max(1),
        }
    }

    pub(crate) async fn insert(
        &self,
        content: String,
        tags: Vec<String>,
        author: UserId,
    ) -> Result<Post, DomainError> {
        self.repo
            .insert_post(NewPost {
                content,
                tags,
                author,
            })
            .await
    }

    pub(crate) async fn get(&self, id: &str) -> Result<Post, DomainError> {
        self.repo
            .get_post(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("post id: {id}")))
    }

    pub(crate) async fn list_authored_by(&self, identity: &UserId) -> Result<Vec<Post>, DomainError> {
        self.repo
            .list_posts(AuthorFilter::AuthoredBy(identity.clone()))
            .await
    }

    pub(crate) async fn list_not_authored_by(
        &self,
        identity: &UserId,
    ) -> Result<Vec<Post>, DomainError> {
        self.repo
            .list_posts(AuthorFilter::NotAuthoredBy(identity.clone()))
            .await
    }

    pub(crate) async fn update(
        &self,
        id: &str,
        content: String,
        tags: Vec<String>,
        expected_version: i64,
    ) -> Result<Post, DomainError> {
        self.repo
            .update_post_if_version(id, expected_version, PostPatch { content, tags })
            .await
    }

    pub(crate) async fn delete(&self, id: &str, expected_version: i64) -> Result<(), DomainError> {
        self.repo.delete_post_if_version(id, expected_version).await
    }

    pub(crate) async fn toggle_like(&self, id: &str, identity: &UserId) -> Result<Post, DomainError> {
        let mut attempt = 1;
        loop {
            let current = self.get(id).await?;
            let likers = current.toggled_likers(identity);

            match self
                .repo
                .replace_likers_if_version(id, current.version, likers)
                .await
            {
                Ok(post) => return Ok(post),
                Err(DomainError::Conflict(reason)) if attempt < self.like_max_attempts => {
                    debug!(post_id = %id, attempt, %reason, "like toggle aborted, re-running");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
