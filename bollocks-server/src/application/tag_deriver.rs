use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::post::normalize_tags;

const MAX_TAGS: usize = 5;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n?(.*?)\s*```\s*$").expect("code fence regex is valid")
});

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("hashtag regex is valid"));

#[derive(Debug, Error)]
pub(crate) enum ClassifierError {
    #[error("no classifier configured")]
    NotConfigured,

    #[error("classifier request failed: {0}")]
    Transport(String),

    #[error("classifier returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("classifier did not answer within {0:?}")]
    Timeout(Duration),

    #[error("classifier reply could not be parsed: {0}")]
    Parse(String),

    #[error("classifier produced no usable tags")]
    Empty,
}

/// External text generator used to suggest tags.
#[async_trait]
pub(crate) trait TagClassifier: Send + Sync {
    /// Sends `prompt` and returns the generated text verbatim.
    async fn generate(&self, prompt: &str) -> Result<String, ClassifierError>;
}

/// Derives tags for post content: classifier first, hashtags when that fails.
#[derive(Clone)]
pub(crate) struct TagDeriver {
    classifier: Option<Arc<dyn TagClassifier>>,
    timeout: Duration,
}

impl TagDeriver {
    pub(crate) fn new(classifier: Option<Arc<dyn TagClassifier>>, timeout: Duration) -> Self {
        Self {
            classifier,
            timeout,
        }
    }

    pub(crate) fn hashtags_only() -> Self {
        Self::new(None, Duration::ZERO)
    }

    /// Never fails. Falls back to [`hashtag_tags`] on any classifier error.
    pub(crate) async fn derive_tags(&self, content: &str) -> Vec<String> {
        match self.classify(content).await {
            Ok(tags) => tags,
            Err(ClassifierError::NotConfigured) => hashtag_tags(content),
            Err(err) => {
                warn!(error = %err, "tag classifier failed, using hashtag fallback");
                hashtag_tags(content)
            }
        }
    }

    async fn classify(&self, content: &str) -> Result<Vec<String>, ClassifierError> {
        let classifier = self
            .classifier
            .as_ref()
            .ok_or(ClassifierError::NotConfigured)?;

        let reply = tokio::time::timeout(self.timeout, classifier.generate(&tag_prompt(content)))
            .await
            .map_err(|_| ClassifierError::Timeout(self.timeout))??;

        let tags = parse_tag_reply(&reply)?;
        debug!(count = tags.len(), "classifier tags accepted");
        Ok(tags)
    }
}

pub(crate) fn tag_prompt(content: &str) -> String {
    format!(
        "Analyze the following text and generate 3-5 relevant, single-word, lowercase tags. \
         Return the tags as a JSON array of strings. \
         Do not include any other text or markdown in your response. Text: \"{content}\""
    )
}

/// Parses a JSON array of strings, optionally wrapped in a markdown code fence.
pub(crate) fn parse_tag_reply(reply: &str) -> Result<Vec<String>, ClassifierError> {
    let body = CODE_FENCE
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map_or(reply, |m| m.as_str());

    let raw: Vec<String> =
        serde_json::from_str(body.trim()).map_err(|err| ClassifierError::Parse(err.to_string()))?;

    let mut tags = normalize_tags(raw);
    tags.truncate(MAX_TAGS);
    if tags.is_empty() {
        return Err(ClassifierError::Empty);
    }
    Ok(tags)
}

/// `#word` tokens, lowercased, sorted and deduplicated.
pub(crate) fn hashtag_tags(content: &str) -> Vec<String> {
    let mut tags: Vec<String> = HASHTAG
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}
