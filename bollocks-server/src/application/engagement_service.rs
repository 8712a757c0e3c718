use tracing::{info, warn};

use crate::application::post_store::PostStore;
use crate::application::tag_deriver::TagDeriver;
use crate::data::post_repository::PostRepository;
use crate::domain::error::DomainError;
use crate::domain::identity::UserId;
use crate::domain::post::{CreatePostRequest, Post, UpdatePostRequest};

pub(crate) struct EngagementService<R: PostRepository> {
    store: PostStore<R>,
    tags: TagDeriver,
}

impl<R: PostRepository> EngagementService<R> {
    pub(crate) fn new(store: PostStore<R>, tags: TagDeriver) -> Self {
        Self { store, tags }
    }

    pub(crate) async fn create_post(
        &self,
        caller: &UserId,
        req: CreatePostRequest,
    ) -> Result<Post, DomainError> {
        let req = req.validate()?;

        let mut tags = self.tags.derive_tags(&req.content).await;
        if tags.is_empty() {
            tags = req.hints;
        }

        let post = self.store.insert(req.content, tags, caller.clone()).await?;
        info!(post_id = %post.id, tags = post.tags.len(), "post created");
        Ok(post)
    }

    /// Existence is checked before authorship: a missing post is `NotFound`
    /// for every caller.
    pub(crate) async fn update_post(
        &self,
        caller: &UserId,
        post_id: &str,
        req: UpdatePostRequest,
    ) -> Result<Post, DomainError> {
        let req = req.validate()?;
        let tags = self.tags.derive_tags(&req.content).await;

        let original = self.store.get(post_id).await?;
        if !original.is_authored_by(caller) {
            warn!(post_id, "update rejected for non-author");
            return Err(DomainError::Forbidden);
        }

        self.store
            .update(post_id, req.content, tags, original.version)
            .await
    }

    pub(crate) async fn delete_post(&self, caller: &UserId, post_id: &str) -> Result<(), DomainError> {
        let original = self.store.get(post_id).await?;
        if !original.is_authored_by(caller) {
            warn!(post_id, "delete rejected for non-author");
            return Err(DomainError::Forbidden);
        }

        self.store.delete(post_id, original.version).await?;
        info!(post_id, "post deleted");
        Ok(())
    }

    pub(crate) async fn toggle_like(&self, caller: &UserId, post_id: &str) -> Result<Post, DomainError> {
        self.store.toggle_like(post_id, caller).await
    }

    pub(crate) async fn get_feed(&self, caller: &UserId) -> Result<Vec<Post>, DomainError> {
        self.store.list_not_authored_by(caller).await
    }

    pub(crate) async fn get_posts(&self, caller: &UserId) -> Result<Vec<Post>, DomainError> {
        self.store.list_authored_by(caller).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::EngagementService;
    use crate::application::post_store::PostStore;
    use crate::application::tag_deriver::TagDeriver;
    use crate::application::tag_deriver::tests::FakeClassifier;
    use crate::data::repositories::memory::post_repository::MemoryPostRepository;
    use crate::domain::error::DomainError;
    use crate::domain::identity::UserId;
    use crate::domain::post::{CreatePostRequest, UpdatePostRequest};

    type Service = EngagementService<Arc<MemoryPostRepository>>;

    fn service_with(tags: TagDeriver) -> (Service, Arc<MemoryPostRepository>) {
        let repo = Arc::new(MemoryPostRepository::new());
        let service = EngagementService::new(PostStore::new(repo.clone(), 5), tags);
        (service, repo)
    }

    fn service() -> Service {
        service_with(TagDeriver::hashtags_only()).0
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).expect("valid user id")
    }

    fn create(content: &str) -> CreatePostRequest {
        CreatePostRequest {
            content: content.to_string(),
            hints: Vec::new(),
        }
    }

    fn update(content: &str) -> UpdatePostRequest {
        UpdatePostRequest {
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn create_without_hashtags_stores_author_as_only_liker() {
        let service = service();
        let alice = user("alice");

        let post = service
            .create_post(&alice, create("no hashtags here"))
            .await
            .expect("create must succeed");

        assert_eq!(post.author, alice);
        assert_eq!(post.likers, vec![alice]);
        assert_eq!(post.like_count(), 1);
        assert!(post.tags.is_empty());
    }

    #[tokio::test]
    async fn create_uses_hashtags_when_classifier_is_disabled() {
        let post = service()
            .create_post(&user("alice"), create("hello #Foo #foo #bar"))
            .await
            .expect("create must succeed");
        assert_eq!(post.tags, vec!["bar", "foo"]);
    }

    #[tokio::test]
    async fn create_uses_classifier_tags_when_available() {
        let deriver = TagDeriver::new(
            Some(Arc::new(FakeClassifier::replying("```json\n[\"Tea\", \"britain\"]\n```"))),
            Duration::from_secs(1),
        );
        let (service, _) = service_with(deriver);

        let post = service
            .create_post(&user("alice"), create("a proper cuppa"))
            .await
            .expect("create must succeed");
        assert_eq!(post.tags, vec!["tea", "britain"]);
    }

    #[tokio::test]
    async fn create_survives_classifier_failure() {
        let deriver = TagDeriver::new(
            Some(Arc::new(FakeClassifier::failing())),
            Duration::from_secs(1),
        );
        let (service, _) = service_with(deriver);

        let post = service
            .create_post(&user("alice"), create("#Rain again"))
            .await
            .expect("create must succeed despite classifier failure");
        assert_eq!(post.tags, vec!["rain"]);
    }

    #[tokio::test]
    async fn create_falls_back_to_caller_hints_when_nothing_derived() {
        let req = CreatePostRequest {
            content: "plain words".to_string(),
            hints: vec!["Weather".to_string(), "weather".to_string()],
        };
        let post = service()
            .create_post(&user("alice"), req)
            .await
            .expect("create must succeed");
        assert_eq!(post.tags, vec!["weather"]);
    }

    #[tokio::test]
    async fn create_rejects_blank_content() {
        let err = service()
            .create_post(&user("alice"), create("   "))
            .await
            .expect_err("blank content must fail");
        assert!(matches!(err, DomainError::Validation { field: "content", .. }));
    }

    #[tokio::test]
    async fn update_by_author_rederives_tags() {
        let service = service();
        let alice = user("alice");
        let post = service
            .create_post(&alice, create("#old news"))
            .await
            .expect("create must succeed");

        let updated = service
            .update_post(&alice, &post.id, update("#new #News"))
            .await
            .expect("update must succeed");

        assert_eq!(updated.content, "#new #News");
        assert_eq!(updated.tags, vec!["new", "news"]);
        assert_eq!(updated.like_count(), 1);
    }

    #[tokio::test]
    async fn update_by_non_author_is_forbidden_and_leaves_post_unchanged() {
        let (service, _) = service_with(TagDeriver::hashtags_only());
        let alice = user("alice");
        let post = service
            .create_post(&alice, create("#mine"))
            .await
            .expect("create must succeed");

        for _ in 0..2 {
            let err = service
                .update_post(&user("mallory"), &post.id, update("#hijacked"))
                .await
                .expect_err("must be forbidden");
            assert!(matches!(err, DomainError::Forbidden));
        }

        let stored = service.get_posts(&alice).await.expect("list must succeed");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].content, post.content);
        assert_eq!(stored[0].tags, post.tags);
        assert_eq!(stored[0].version, post.version);
    }

    #[tokio::test]
    async fn update_of_missing_post_is_not_found_even_for_non_author() {
        let err = service()
            .update_post(&user("mallory"), "missing", update("body"))
            .await
            .expect_err("post must be missing");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_by_author_removes_post() {
        let service = service();
        let alice = user("alice");
        let post = service
            .create_post(&alice, create("short lived"))
            .await
            .expect("create must succeed");

        service
            .delete_post(&alice, &post.id)
            .await
            .expect("delete must succeed");

        assert!(service.get_posts(&alice).await.expect("list").is_empty());
        let err = service
            .toggle_like(&user("bob"), &post.id)
            .await
            .expect_err("deleted post must be gone");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_by_non_author_is_forbidden() {
        let service = service();
        let post = service
            .create_post(&user("alice"), create("keep me"))
            .await
            .expect("create must succeed");

        let err = service
            .delete_post(&user("bob"), &post.id)
            .await
            .expect_err("must be forbidden");
        assert!(matches!(err, DomainError::Forbidden));
        assert_eq!(service.get_feed(&user("bob")).await.expect("feed").len(), 1);
    }

    #[tokio::test]
    async fn delete_of_unknown_id_is_not_found() {
        let err = service()
            .delete_post(&user("alice"), "does-not-exist")
            .await
            .expect_err("post must be missing");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn toggle_like_needs_no_ownership_and_is_its_own_inverse() {
        let service = service();
        let alice = user("alice");
        let bob = user("bob");
        let post = service
            .create_post(&alice, create("like me"))
            .await
            .expect("create must succeed");

        let liked = service.toggle_like(&bob, &post.id).await.expect("like");
        assert_eq!(liked.like_count(), 2);

        let unliked = service.toggle_like(&bob, &post.id).await.expect("unlike");
        assert_eq!(unliked.like_count(), 1);
        assert_eq!(unliked.likers, vec![alice]);
    }

    #[tokio::test]
    async fn feed_shows_other_authors_and_posts_show_own() {
        let service = service();
        let alice = user("alice");
        let bob = user("bob");

        let post = service
            .create_post(&alice, create("from alice"))
            .await
            .expect("create must succeed");

        let bob_feed = service.get_feed(&bob).await.expect("feed");
        assert!(bob_feed.iter().any(|p| p.id == post.id));

        let alice_feed = service.get_feed(&alice).await.expect("feed");
        assert!(alice_feed.iter().all(|p| p.id != post.id));

        let alice_posts = service.get_posts(&alice).await.expect("posts");
        assert!(alice_posts.iter().any(|p| p.id == post.id));
    }

    #[tokio::test]
    async fn feed_is_newest_first() {
        let service = service();
        let alice = user("alice");
        let first = service
            .create_post(&alice, create("first"))
            .await
            .expect("create must succeed");
        let second = service
            .create_post(&alice, create("second"))
            .await
            .expect("create must succeed");

        let feed = service.get_feed(&user("bob")).await.expect("feed");
        let ids: Vec<_> = feed.into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
