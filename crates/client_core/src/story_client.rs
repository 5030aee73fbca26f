use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::StoryResult,
    error::ErrorBody,
    protocol::{GenerateStoryRequest, GenerateStoryResponse, GENERATE_STORY_PATH},
};
use tracing::{info, warn};

use crate::error::StoryRequestError;

#[async_trait]
pub trait StoryService: Send + Sync {
    async fn generate_story(
        &self,
        request: &GenerateStoryRequest,
    ) -> Result<StoryResult, StoryRequestError>;
}

pub struct HttpStoryClient {
    http: Client,
    base_url: String,
}

impl HttpStoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self) -> String {
        format!("{}{GENERATE_STORY_PATH}", self.base_url)
    }
}

#[async_trait]
impl StoryService for HttpStoryClient {
    async fn generate_story(
        &self,
        request: &GenerateStoryRequest,
    ) -> Result<StoryResult, StoryRequestError> {
        let endpoint = self.endpoint();
        info!(
            endpoint = %endpoint,
            mood = %request.mood,
            expressions = request.expressions.len(),
            "story: requesting generation"
        );

        let response = self
            .http
            .post(&endpoint)
            .json(request)
            .send()
            .await
            .map_err(|err| StoryRequestError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| StoryRequestError::Transport(err.to_string()))?;

        if !status.is_success() {
            let message = ErrorBody::from_slice(&body)
                .and_then(|body| body.message().map(str::to_string))
                .unwrap_or_else(|| {
                    format!("Request failed with status code {}", status.as_u16())
                });
            warn!(status = status.as_u16(), "story: generation failed: {message}");
            return Err(StoryRequestError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let decoded: GenerateStoryResponse = serde_json::from_slice(&body)
            .map_err(|err| StoryRequestError::Decode(err.to_string()))?;
        info!(mood = %decoded.mood, chars = decoded.story.len(), "story: generated");
        Ok(decoded.into())
    }
}

#[cfg(test)]
#[path = "tests/story_client_tests.rs"]
mod tests;
