use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::data::post_repository::{AuthorFilter, NewPost, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::identity::UserId;
use crate::domain::post::Post;

/// Process-local post store. Writes are serialized by the map lock, so the
/// version checks behave like the conditional writes of the Postgres backend.
#[derive(Debug, Default)]
pub(crate) struct MemoryPostRepository {
    posts: RwLock<HashMap<String, Post>>,
    next_id: AtomicU64,
}

impl MemoryPostRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> String {
        let seq = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{seq:016x}")
    }
}

fn check_version(post: Option<&Post>, id: &str, expected_version: i64) -> Result<(), DomainError> {
    match post {
        None => Err(DomainError::NotFound(format!("post id: {id}"))),
        Some(post) if post.version != expected_version => {
            Err(DomainError::Conflict(format!("post id: {id}")))
        }
        Some(_) => Ok(()),
    }
}

#[async_trait]
impl PostRepository for MemoryPostRepository {
    async fn insert_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let post = Post::new(
            self.allocate_id(),
            input.content,
            input.tags,
            input.author.clone(),
            Utc::now(),
            vec![input.author],
            1,
        )?;

        self.posts
            .write()
            .await
            .insert(post.id.clone(), post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>, DomainError> {
        Ok(self.posts.read().await.get(id).cloned())
    }

    async fn list_posts(&self, filter: AuthorFilter) -> Result<Vec<Post>, DomainError> {
        let mut posts: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|post| filter.matches(post))
            .cloned()
            .collect();

        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(posts)
    }

    async fn update_post_if_version(
        &self,
        id: &str,
        expected_version: i64,
        patch: PostPatch,
    ) -> Result<Post, DomainError> {
        let mut posts = self.posts.write().await;
        check_version(posts.get(id), id, expected_version)?;

        let post = posts
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("post id: {id}")))?;
        post.content = patch.content;
        post.tags = patch.tags;
        post.version += 1;
        Ok(post.clone())
    }

    async fn delete_post_if_version(
        &self,
        id: &str,
        expected_version: i64,
    ) -> Result<(), DomainError> {
        let mut posts = self.posts.write().await;
        check_version(posts.get(id), id, expected_version)?;
        posts.remove(id);
        Ok(())
    }

    async fn replace_likers_if_version(
        &self,
        id: &str,
        expected_version: i64,
        likers: Vec<UserId>,
    ) -> Result<Post, DomainError> {
        let mut posts = self.posts.write().await;
        check_version(posts.get(id), id, expected_version)?;

        let post = posts
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("post id: {id}")))?;
        post.likers = likers;
        post.version += 1;
        Ok(post.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryPostRepository;
    use crate::data::post_repository::{AuthorFilter, NewPost, PostPatch, PostRepository};
    use crate::domain::error::DomainError;
    use crate::domain::identity::UserId;

    fn new_post(author: &UserId, content: &str) -> NewPost {
        NewPost {
            content: content.to_string(),
            tags: vec![],
            author: author.clone(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_distinct_ids_and_author_like() {
        let repo = MemoryPostRepository::new();
        let alice = UserId::new("alice").expect("valid user id");

        let first = repo
            .insert_post(new_post(&alice, "one"))
            .await
            .expect("insert must succeed");
        let second = repo
            .insert_post(new_post(&alice, "two"))
            .await
            .expect("insert must succeed");

        assert_ne!(first.id, second.id);
        assert_eq!(first.likers, vec![alice]);
        assert_eq!(first.version, 1);
    }

    #[tokio::test]
    async fn list_posts_orders_newest_first_and_filters_by_author() {
        let repo = MemoryPostRepository::new();
        let alice = UserId::new("alice").expect("valid user id");
        let bob = UserId::new("bob").expect("valid user id");

        let older = repo.insert_post(new_post(&alice, "older")).await.expect("insert");
        let newer = repo.insert_post(new_post(&alice, "newer")).await.expect("insert");
        repo.insert_post(new_post(&bob, "bob's")).await.expect("insert");

        let mine = repo
            .list_posts(AuthorFilter::AuthoredBy(alice.clone()))
            .await
            .expect("list must succeed");
        let ids: Vec<_> = mine.iter().map(|post| post.id.clone()).collect();
        assert_eq!(ids, vec![newer.id, older.id]);

        let others = repo
            .list_posts(AuthorFilter::NotAuthoredBy(alice))
            .await
            .expect("list must succeed");
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].author, bob);
    }

    #[tokio::test]
    async fn stale_version_conflicts_and_missing_post_is_not_found() {
        let repo = MemoryPostRepository::new();
        let alice = UserId::new("alice").expect("valid user id");
        let post = repo.insert_post(new_post(&alice, "body")).await.expect("insert");

        let patch = PostPatch {
            content: "edited".to_string(),
            tags: vec!["x".to_string()],
        };
        let updated = repo
            .update_post_if_version(&post.id, 1, patch.clone())
            .await
            .expect("first update must succeed");
        assert_eq!(updated.version, 2);
        assert_eq!(updated.likers, post.likers);

        let err = repo
            .update_post_if_version(&post.id, 1, patch)
            .await
            .expect_err("stale update must fail");
        assert!(matches!(err, DomainError::Conflict(_)));

        let err = repo
            .delete_post_if_version("missing", 1)
            .await
            .expect_err("missing post must fail");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_with_stale_version_conflicts_and_keeps_post() {
        let repo = MemoryPostRepository::new();
        let alice = UserId::new("alice").expect("valid user id");
        let bob = UserId::new("bob").expect("valid user id");
        let post = repo.insert_post(new_post(&alice, "body")).await.expect("insert");

        let liked = repo
            .replace_likers_if_version(&post.id, post.version, vec![alice.clone(), bob])
            .await
            .expect("like must succeed");
        assert_eq!(liked.version, 2);

        let err = repo
            .delete_post_if_version(&post.id, post.version)
            .await
            .expect_err("stale delete must fail");
        assert!(matches!(err, DomainError::Conflict(_)));

        let still_there = repo.get_post(&post.id).await.expect("get must succeed");
        assert_eq!(still_there.map(|p| p.version), Some(2));

        repo.delete_post_if_version(&post.id, liked.version)
            .await
            .expect("current version deletes");
        assert!(repo.get_post(&post.id).await.expect("get must succeed").is_none());
    }
}
