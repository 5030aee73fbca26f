use std::{collections::BTreeMap, fmt, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Emotion labels produced by the expression classifier.
///
/// Declaration order doubles as the tie-break order when picking the top score.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl Mood {
    pub const ALL: [Mood; 7] = [
        Mood::Neutral,
        Mood::Happy,
        Mood::Sad,
        Mood::Angry,
        Mood::Fearful,
        Mood::Disgusted,
        Mood::Surprised,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Neutral => "neutral",
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Fearful => "fearful",
            Mood::Disgusted => "disgusted",
            Mood::Surprised => "surprised",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mood label: {0}")]
pub struct UnknownMood(pub String);

impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Mood::ALL
            .into_iter()
            .find(|mood| mood.as_str() == lower)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

/// Confidence per emotion label. Empty when classification was skipped or failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoodScores(pub BTreeMap<Mood, f64>);

impl MoodScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, mood: Mood) -> Option<f64> {
        self.0.get(&mood).copied()
    }

    pub fn insert(&mut self, mood: Mood, confidence: f64) {
        self.0.insert(mood, confidence);
    }

    /// Highest-confidence label. Non-finite scores are ignored; ties keep the earlier label.
    pub fn top(&self) -> Option<Mood> {
        let mut best: Option<(Mood, f64)> = None;
        for (mood, score) in &self.0 {
            if !score.is_finite() {
                continue;
            }
            match best {
                Some((_, best_score)) if *score <= best_score => {}
                _ => best = Some((*mood, *score)),
            }
        }
        best.map(|(mood, _)| mood)
    }
}

impl FromIterator<(Mood, f64)> for MoodScores {
    fn from_iter<T: IntoIterator<Item = (Mood, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Encoded still image taken from the camera.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl CapturedImage {
    pub fn jpeg(width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: "image/jpeg".to_string(),
            width,
            height,
            bytes,
        }
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("mime_type", &self.mime_type)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Mood label and narrative returned by the story service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryResult {
    pub mood: String,
    pub story: String,
}
