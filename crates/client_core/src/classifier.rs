use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{CapturedImage, Mood, MoodScores},
    protocol::{DetectExpressionsRequest, DetectExpressionsResponse},
};
use tokio::sync::OnceCell;
use tracing::{info, warn};

pub const DETECT_EXPRESSIONS_PATH: &str = "/api/detect-expressions";
pub const CLASSIFIER_HEALTH_PATH: &str = "/health";

/// Optional facial-expression model.
#[async_trait]
pub trait ExpressionClassifier: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }
    /// Prepares the model. Called before every detection; implementations cache.
    async fn load(&self) -> Result<()>;
    /// `Ok(None)` when no face is found.
    async fn detect_expressions(&self, image: &CapturedImage) -> Result<Option<MoodScores>>;
}

pub struct MissingExpressionClassifier;

#[async_trait]
impl ExpressionClassifier for MissingExpressionClassifier {
    fn is_available(&self) -> bool {
        false
    }

    async fn load(&self) -> Result<()> {
        Err(anyhow!("expression classifier is unavailable"))
    }

    async fn detect_expressions(&self, _image: &CapturedImage) -> Result<Option<MoodScores>> {
        Err(anyhow!("expression classifier is unavailable"))
    }
}

/// Classifier reached over HTTP: `GET /health` to load, `POST /api/detect-expressions` to infer.
pub struct HttpExpressionClassifier {
    http: Client,
    base_url: String,
    loaded: OnceCell<()>,
}

impl HttpExpressionClassifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            loaded: OnceCell::new(),
        }
    }
}

#[async_trait]
impl ExpressionClassifier for HttpExpressionClassifier {
    async fn load(&self) -> Result<()> {
        self.loaded
            .get_or_try_init(|| async {
                self.http
                    .get(format!("{}{CLASSIFIER_HEALTH_PATH}", self.base_url))
                    .send()
                    .await
                    .with_context(|| format!("classifier unreachable at {}", self.base_url))?
                    .error_for_status()?;
                info!(classifier = %self.base_url, "classifier: model ready");
                Ok::<(), anyhow::Error>(())
            })
            .await?;
        Ok(())
    }

    async fn detect_expressions(&self, image: &CapturedImage) -> Result<Option<MoodScores>> {
        let response: DetectExpressionsResponse = self
            .http
            .post(format!("{}{DETECT_EXPRESSIONS_PATH}", self.base_url))
            .json(&DetectExpressionsRequest {
                image_data: image.to_data_url(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.expressions)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationOutcome {
    pub mood: Mood,
    pub scores: MoodScores,
    /// True when the classifier was missing or failed and the neutral fallback was used.
    pub degraded: bool,
}

impl ClassificationOutcome {
    fn fallback(degraded: bool) -> Self {
        Self {
            mood: Mood::Neutral,
            scores: MoodScores::new(),
            degraded,
        }
    }
}

/// Never fails: any classifier error degrades to `neutral` with no scores.
pub async fn classify_mood(
    classifier: &dyn ExpressionClassifier,
    image: &CapturedImage,
) -> ClassificationOutcome {
    if !classifier.is_available() {
        info!("classifier: unavailable; using neutral mood");
        return ClassificationOutcome::fallback(true);
    }

    let detected = async {
        classifier.load().await?;
        classifier.detect_expressions(image).await
    }
    .await;

    match detected {
        Ok(Some(scores)) if !scores.is_empty() => {
            let mood = scores.top().unwrap_or_default();
            info!(mood = %mood, labels = scores.len(), "classifier: expression detected");
            ClassificationOutcome {
                mood,
                scores,
                degraded: false,
            }
        }
        Ok(_) => {
            info!("classifier: no face found; using neutral mood");
            ClassificationOutcome::fallback(false)
        }
        Err(err) => {
            warn!("classifier: degraded to neutral mood: {err:#}");
            ClassificationOutcome::fallback(true)
        }
    }
}

#[cfg(test)]
#[path = "tests/classifier_tests.rs"]
mod tests;
