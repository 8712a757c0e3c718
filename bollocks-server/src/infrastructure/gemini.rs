use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::tag_deriver::{ClassifierError, TagClassifier};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini `generateContent` client used as the tag classifier.
#[derive(Debug, Clone)]
pub(crate) struct GeminiClassifier {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<ContentDto<'a>>,
}

#[derive(Debug, Serialize)]
struct ContentDto<'a> {
    role: &'a str,
    parts: Vec<PartDto<'a>>,
}

#[derive(Debug, Serialize)]
struct PartDto<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<CandidateDto>,
}

#[derive(Debug, Deserialize)]
struct CandidateDto {
    content: Option<CandidateContentDto>,
}

#[derive(Debug, Deserialize)]
struct CandidateContentDto {
    #[serde(default)]
    parts: Vec<ReplyPartDto>,
}

#[derive(Debug, Deserialize)]
struct ReplyPartDto {
    text: Option<String>,
}

impl GeminiClassifier {
    /// Returns `None` when no API key is configured.
    pub(crate) fn from_settings(
        api_key: Option<&str>,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Option<Self>, ClassifierError> {
        let Some(api_key) = api_key.filter(|key| !key.trim().is_empty()) else {
            return Ok(None);
        };

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        Ok(Some(Self {
            http_client,
            api_key: api_key.trim().to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }))
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TagClassifier for GeminiClassifier {
    async fn generate(&self, prompt: &str) -> Result<String, ClassifierError> {
        let request = GenerateContentRequest {
            contents: vec![ContentDto {
                role: "user",
                parts: vec![PartDto { text: prompt }],
            }],
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, model = %self.model, "Gemini API error");
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(e.without_url().to_string()))?;

        let text = first_candidate_text(reply)
            .ok_or_else(|| ClassifierError::Parse("no content returned from Gemini".to_string()))?;
        debug!(model = %self.model, bytes = text.len(), "Gemini reply received");
        Ok(text)
    }
}

// reqwest errors render the request URL; keep it out of logs.
fn transport_error(err: reqwest::Error) -> ClassifierError {
    ClassifierError::Transport(err.without_url().to_string())
}

fn first_candidate_text(reply: GenerateContentResponse) -> Option<String> {
    reply
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()?
        .text
}
