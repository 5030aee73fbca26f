use std::{fmt, sync::Arc};

use camera::{ActiveCamera, CameraConnector, CameraError, DEFAULT_JPEG_QUALITY};
use shared::{
    domain::{CapturedImage, Mood, StoryResult},
    protocol::GenerateStoryRequest,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub mod classifier;
pub mod config;
pub mod error;
pub mod render;
pub mod story_client;

pub use classifier::{
    classify_mood, ClassificationOutcome, ExpressionClassifier, HttpExpressionClassifier,
    MissingExpressionClassifier,
};
pub use config::{load_settings, Settings};
pub use error::{FlowError, SettingsError, StoryRequestError};
pub use render::{mood_glyph, ResultView};
pub use story_client::{HttpStoryClient, StoryService};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WizardStep {
    #[default]
    Hero,
    Capture,
    Preview,
    /// Pending sub-state while the mood is classified and the story requested.
    Analyzing,
    Result,
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardStep::Hero => "hero",
            WizardStep::Capture => "capture",
            WizardStep::Preview => "preview",
            WizardStep::Analyzing => "analyzing",
            WizardStep::Result => "result",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    StepChanged(WizardStep),
    CameraReady { camera: String },
    CameraUnavailable(String),
    Captured { width: u32, height: u32 },
    MoodClassified { mood: Mood, degraded: bool },
    StoryReady(StoryResult),
    StoryFailed(String),
}

#[derive(Default)]
struct FlowState {
    step: WizardStep,
    camera: Option<ActiveCamera>,
    camera_error: Option<String>,
    image: Option<CapturedImage>,
    result: Option<StoryResult>,
    banner: Option<String>,
}

/// Capture → preview → story wizard.
///
/// Holds the wizard position together with the data that belongs to it: the live camera only
/// while in `Capture`, the image from `Preview` on, the story only in `Result`.
pub struct StoryFlow {
    camera_connector: Arc<dyn CameraConnector>,
    classifier: Arc<dyn ExpressionClassifier>,
    story_service: Arc<dyn StoryService>,
    jpeg_quality: u8,
    state: FlowState,
    events: broadcast::Sender<FlowEvent>,
}

impl StoryFlow {
    pub fn new(
        camera_connector: Arc<dyn CameraConnector>,
        classifier: Arc<dyn ExpressionClassifier>,
        story_service: Arc<dyn StoryService>,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            camera_connector,
            classifier,
            story_service,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            state: FlowState::default(),
            events,
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<FlowEvent> {
        self.events.subscribe()
    }

    pub fn step(&self) -> WizardStep {
        self.state.step
    }

    pub fn is_loading(&self) -> bool {
        self.state.step == WizardStep::Analyzing
    }

    pub fn is_camera_ready(&self) -> bool {
        self.state
            .camera
            .as_ref()
            .is_some_and(ActiveCamera::is_ready)
    }

    /// Blocking message shown on the capture screen when the camera could not be opened.
    pub fn camera_error(&self) -> Option<&str> {
        self.state.camera_error.as_deref()
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.state.image.as_ref()
    }

    pub fn result(&self) -> Option<&StoryResult> {
        self.state.result.as_ref()
    }

    /// Transient error from the last story request.
    pub fn banner(&self) -> Option<&str> {
        self.state.banner.as_deref()
    }

    /// Glyph and narrative for the result screen; `None` outside it.
    pub fn render_result(&self) -> Option<ResultView> {
        if self.state.step != WizardStep::Result {
            return None;
        }
        self.state.result.as_ref().map(ResultView::new)
    }

    /// Hero → capture.
    pub async fn start(&mut self) -> Result<(), FlowError> {
        self.require(WizardStep::Hero, "start")?;
        self.enter_capture().await
    }

    /// Opens the camera for the capture step. Does nothing when a stream is already live.
    pub async fn acquire_camera(&mut self) -> Result<(), FlowError> {
        self.require(WizardStep::Capture, "acquire the camera")?;
        if self.is_camera_ready() {
            return Ok(());
        }
        self.state.camera = None;

        match ActiveCamera::acquire(self.camera_connector.as_ref()).await {
            Ok(camera) => {
                let label = camera.label().to_string();
                self.state.camera = Some(camera);
                self.state.camera_error = None;
                self.emit(FlowEvent::CameraReady { camera: label });
                Ok(())
            }
            Err(err) => {
                let reason = match err {
                    CameraError::Unavailable { reason } => reason,
                    other => other.to_string(),
                };
                warn!("flow: camera unavailable: {reason}");
                self.state.camera_error = Some(render::CAMERA_UNAVAILABLE.to_string());
                self.emit(FlowEvent::CameraUnavailable(reason.clone()));
                Err(FlowError::CameraUnavailable(reason))
            }
        }
    }

    /// Samples the live stream into a still image and moves to preview.
    ///
    /// Returns `Ok(false)` without side effects when there is no live stream.
    pub async fn capture_frame(&mut self) -> Result<bool, FlowError> {
        if self.state.step != WizardStep::Capture {
            debug!(step = %self.state.step, "flow: capture ignored outside capture step");
            return Ok(false);
        }
        let Some(camera) = self.state.camera.as_mut() else {
            debug!("flow: capture ignored without a live camera");
            return Ok(false);
        };

        let frame = camera.grab_frame().await.map_err(FlowError::Capture)?;
        let image = frame
            .encode_jpeg(self.jpeg_quality)
            .map_err(FlowError::Capture)?;
        let (width, height) = (image.width, image.height);

        if let Some(camera) = self.state.camera.take() {
            camera.release();
        }
        self.state.image = Some(image);
        self.emit(FlowEvent::Captured { width, height });
        self.set_step(WizardStep::Preview);
        Ok(true)
    }

    /// Preview → capture, discarding the captured image.
    pub async fn retake(&mut self) -> Result<(), FlowError> {
        self.require(WizardStep::Preview, "retake")?;
        self.state.image = None;
        self.enter_capture().await
    }

    /// Classifies the captured image and requests a story for it.
    ///
    /// On failure the flow returns to preview with the image intact and the banner set.
    pub async fn analyze(&mut self) -> Result<StoryResult, FlowError> {
        self.require(WizardStep::Preview, "analyze")?;
        let Some(image) = self.state.image.clone() else {
            return Err(FlowError::MissingImage);
        };

        self.state.banner = None;
        self.set_step(WizardStep::Analyzing);

        let outcome = classify_mood(self.classifier.as_ref(), &image).await;
        self.emit(FlowEvent::MoodClassified {
            mood: outcome.mood,
            degraded: outcome.degraded,
        });

        let request = GenerateStoryRequest::new(&image, outcome.mood, outcome.scores);
        match self.story_service.generate_story(&request).await {
            Ok(result) => {
                self.state.result = Some(result.clone());
                self.emit(FlowEvent::StoryReady(result.clone()));
                self.set_step(WizardStep::Result);
                Ok(result)
            }
            Err(err) => {
                let message = err.user_message();
                warn!("flow: story request failed: {err}");
                self.state.banner = Some(message.clone());
                self.emit(FlowEvent::StoryFailed(message));
                self.set_step(WizardStep::Preview);
                Err(err.into())
            }
        }
    }

    /// Result → capture, discarding both image and story.
    pub async fn try_again(&mut self) -> Result<(), FlowError> {
        self.require(WizardStep::Result, "try again")?;
        self.state.image = None;
        self.state.result = None;
        self.enter_capture().await
    }

    /// Drops every piece of session state and returns to the hero screen.
    pub fn reset(&mut self) {
        if let Some(camera) = self.state.camera.take() {
            camera.release();
        }
        self.state = FlowState {
            step: self.state.step,
            ..FlowState::default()
        };
        self.set_step(WizardStep::Hero);
    }

    async fn enter_capture(&mut self) -> Result<(), FlowError> {
        self.state.camera_error = None;
        self.set_step(WizardStep::Capture);
        self.acquire_camera().await
    }

    fn require(&self, expected: WizardStep, action: &'static str) -> Result<(), FlowError> {
        match self.state.step {
            step if step == expected => Ok(()),
            WizardStep::Analyzing => Err(FlowError::Busy),
            step => Err(FlowError::InvalidTransition { action, step }),
        }
    }

    fn set_step(&mut self, step: WizardStep) {
        if step != WizardStep::Capture {
            if let Some(camera) = self.state.camera.take() {
                camera.release();
            }
        }
        info!(from = %self.state.step, to = %step, "flow: step changed");
        self.state.step = step;
        self.emit(FlowEvent::StepChanged(step));
    }

    fn emit(&self, event: FlowEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
