use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::identity::UserId;

// Same word class the hashtag fallback extracts.
static TAG_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("tag word regex is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Post {
    pub(crate) id: String,
    pub(crate) content: String,
    pub(crate) tags: Vec<String>,
    pub(crate) author: UserId,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) likers: Vec<UserId>,
    pub(crate) version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreatePostRequest {
    pub(crate) content: String,
    pub(crate) hints: Vec<String>,
}

impl CreatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            content: normalize_content(&self.content)?,
            hints: normalize_tags(self.hints),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UpdatePostRequest {
    pub(crate) content: String,
}

impl UpdatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            content: normalize_content(&self.content)?,
        })
    }
}

impl Post {
    pub(crate) fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        tags: Vec<String>,
        author: UserId,
        created_at: DateTime<Utc>,
        likers: Vec<UserId>,
        version: i64,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::Validation {
                field: "id",
                message: "must not be empty",
            });
        }
        if version <= 0 {
            return Err(DomainError::Validation {
                field: "version",
                message: "must be > 0",
            });
        }
        let content = normalize_content(&content.into())?;

        let mut unique_likers: Vec<UserId> = Vec::with_capacity(likers.len());
        for liker in likers {
            if !unique_likers.contains(&liker) {
                unique_likers.push(liker);
            }
        }

        Ok(Self {
            id,
            content,
            tags: normalize_tags(tags),
            author,
            created_at,
            likers: unique_likers,
            version,
        })
    }

    pub(crate) fn like_count(&self) -> usize {
        self.likers.len()
    }

    pub(crate) fn is_authored_by(&self, identity: &UserId) -> bool {
        &self.author == identity
    }

    pub(crate) fn is_liked_by(&self, identity: &UserId) -> bool {
        self.likers.contains(identity)
    }

    /// Liker set after flipping `identity`'s membership. The post itself is untouched.
    pub(crate) fn toggled_likers(&self, identity: &UserId) -> Vec<UserId> {
        if self.is_liked_by(identity) {
            self.likers
                .iter()
                .filter(|liker| *liker != identity)
                .cloned()
                .collect()
        } else {
            let mut likers = self.likers.clone();
            likers.push(identity.clone());
            likers
        }
    }
}

/// Normalizes a single tag: trimmed, without leading `#`s, lowercase, one `\w+` word.
pub(crate) fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().trim_start_matches('#').to_lowercase();
    TAG_WORD.is_match(&tag).then_some(tag)
}

/// Normalizes tags and drops duplicates, keeping the first occurrence.
pub(crate) fn normalize_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.into_iter().filter_map(|tag| normalize_tag(tag.as_ref())) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

fn normalize_content(content: &str) -> Result<String, DomainError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(DomainError::Validation {
            field: "content",
            message: "must not be empty",
        });
    }
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{
        CreatePostRequest, DomainError, Post, UpdatePostRequest, normalize_tag, normalize_tags,
    };
    use crate::domain::identity::UserId;

    #[test]
    fn create_post_request_validate_rejects_blank_content() {
        let req = CreatePostRequest {
            content: "   ".to_string(),
            hints: Vec::new(),
        };

        let err = req.validate().expect_err("content must be rejected");
        assert_validation_field(err, "content");
    }

    #[test]
    fn update_post_request_validate_trims_content() {
        let req = UpdatePostRequest {
            content: "  new body  ".to_string(),
        };

        let validated = req.validate().expect("must validate");
        assert_eq!(validated.content, "new body");
    }

    #[test]
    fn create_post_request_validate_normalizes_hints() {
        let req = CreatePostRequest {
            content: "body".to_string(),
            hints: vec!["Rust".into(), "#rust".into(), " ".into(), "two words".into()],
        };

        let validated = req.validate().expect("must validate");
        assert_eq!(validated.hints, vec!["rust".to_string()]);
    }

    #[test]
    fn normalize_tag_strips_every_leading_hash() {
        assert_eq!(normalize_tag("##Rust").as_deref(), Some("rust"));
        assert_eq!(normalize_tag(" #snake_case ").as_deref(), Some("snake_case"));
        assert_eq!(normalize_tag("###"), None);
    }

    #[test]
    fn normalize_tag_rejects_non_word_tokens() {
        assert_eq!(normalize_tag("c++"), None);
        assert_eq!(normalize_tag("rock-n-roll"), None);
        assert_eq!(normalize_tag("!!!"), None);
        assert_eq!(normalize_tag("two words"), None);
        assert_eq!(normalize_tag("Café").as_deref(), Some("café"));
    }

    #[test]
    fn normalize_tags_is_case_insensitive_and_order_preserving() {
        let tags = normalize_tags(["Beta", "alpha", "BETA", "", "gamma"]);
        assert_eq!(tags, vec!["beta", "alpha", "gamma"]);
    }

    #[test]
    fn post_new_deduplicates_likers() {
        let alice = user("alice");
        let post = Post::new(
            "p1",
            "content",
            vec![],
            alice.clone(),
            Utc::now(),
            vec![alice.clone(), alice.clone()],
            1,
        )
        .expect("post should be created");

        assert_eq!(post.like_count(), 1);
        assert!(post.is_authored_by(&alice));
    }

    #[test]
    fn post_new_rejects_non_positive_version() {
        let err = Post::new("p1", "content", vec![], user("a"), Utc::now(), vec![], 0)
            .expect_err("version must be > 0");
        assert_validation_field(err, "version");
    }

    #[test]
    fn toggled_likers_adds_then_removes() {
        let alice = user("alice");
        let bob = user("bob");
        let post = Post::new("p1", "content", vec![], alice.clone(), Utc::now(), vec![alice], 1)
            .expect("post should be created");

        let liked = post.toggled_likers(&bob);
        assert_eq!(liked.len(), 2);
        assert!(liked.contains(&bob));

        let mut after = post.clone();
        after.likers = liked;
        let unliked = after.toggled_likers(&bob);
        assert_eq!(unliked, post.likers);
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).expect("valid user id")
    }

    fn assert_validation_field(err: DomainError, expected_field: &'static str) {
        match err {
            DomainError::Validation { field, .. } => assert_eq!(field, expected_field),
            _ => panic!("expected DomainError::Validation"),
        }
    }
}
