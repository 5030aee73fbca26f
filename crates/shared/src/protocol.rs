use serde::{Deserialize, Serialize};

use crate::domain::{CapturedImage, Mood, MoodScores, StoryResult};

pub const GENERATE_STORY_PATH: &str = "/api/generate-story";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateStoryRequest {
    /// Data URL of the captured JPEG.
    pub image_data: String,
    pub mood: Mood,
    #[serde(default)]
    pub expressions: MoodScores,
}

impl GenerateStoryRequest {
    pub fn new(image: &CapturedImage, mood: Mood, expressions: MoodScores) -> Self {
        Self {
            image_data: image.to_data_url(),
            mood,
            expressions,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateStoryResponse {
    #[serde(default)]
    pub mood: String,
    pub story: String,
}

impl From<GenerateStoryResponse> for StoryResult {
    fn from(value: GenerateStoryResponse) -> Self {
        Self {
            mood: value.mood,
            story: value.story,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectExpressionsRequest {
    pub image_data: String,
}

/// `expressions` is absent or null when no face was found.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectExpressionsResponse {
    #[serde(default)]
    pub expressions: Option<MoodScores>,
}
