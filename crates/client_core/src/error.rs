use camera::CameraError;
use thiserror::Error;

use crate::WizardStep;

pub const GENERIC_STORY_FAILURE: &str = "Failed to generate story";

#[derive(Debug, Clone, Error)]
pub enum StoryRequestError {
    /// Non-2xx response. `message` is the server `detail` when one was supplied.
    #[error("story service returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("story request failed: {0}")]
    Transport(String),
    #[error("invalid story response: {0}")]
    Decode(String),
}

impl StoryRequestError {
    /// Text for the error banner.
    pub fn user_message(&self) -> String {
        let message = match self {
            StoryRequestError::Server { message, .. } => message.as_str(),
            StoryRequestError::Transport(message) => message.as_str(),
            StoryRequestError::Decode(_) => "",
        };
        if message.trim().is_empty() {
            GENERIC_STORY_FAILURE.to_string()
        } else {
            message.to_string()
        }
    }
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("cannot {action} from the {step} step")]
    InvalidTransition {
        action: &'static str,
        step: WizardStep,
    },
    #[error("a story request is already in progress")]
    Busy,
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
    #[error("capture failed: {0}")]
    Capture(#[source] CameraError),
    #[error("no captured image to analyze")]
    MissingImage,
    #[error(transparent)]
    StoryRequest(#[from] StoryRequestError),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid {field} '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid camera source: {0}")]
    InvalidCamera(String),
    #[error("invalid jpeg quality '{0}': expected an integer")]
    InvalidJpegQuality(String),
}
