//! Presentation helpers: mood glyphs, result view, and screen copy.

use shared::domain::{Mood, StoryResult};

pub const DEFAULT_GLYPH: &str = "☁️";

pub const APP_TITLE: &str = "Mood Story";
pub const HERO_TITLE: &str = "Mood Story Generator";
pub const HERO_TAGLINE: &str = "Capture your mood with the camera, let AI read your expression, \
and enjoy a short, personalized story with a matching illustration.";
pub const STEP_OVERVIEW: [&str; 3] = ["Capture", "Preview", "Story"];
pub const STEP_OVERVIEW_DETAIL: &str =
    "Use your camera, confirm the shot, and get a personalized story.";
pub const REQUESTING_CAMERA: &str = "Requesting camera…";
pub const CAMERA_UNAVAILABLE: &str =
    "Could not access camera. Please allow permission or use a supported device.";
pub const CAPTURE_HINT: &str = "Make sure your face is visible and well-lit. \
When you are ready, capture a photo to analyze the mood.";
pub const PREVIEW_HINT: &str =
    "Looks good? We will detect your mood and generate a story based on your expression.";
pub const ANALYZING: &str = "Analyzing mood and writing your story…";
pub const FOOTER: &str = "Built with camera, face detection, and storytelling. Enjoy.";

pub fn glyph_for(mood: Mood) -> &'static str {
    match mood {
        Mood::Happy => "🌞",
        Mood::Sad => "🌧️",
        Mood::Angry => "🔥",
        Mood::Fearful => "🌙",
        Mood::Disgusted => "🍃",
        Mood::Surprised => "✨",
        Mood::Neutral => DEFAULT_GLYPH,
    }
}

/// Case-insensitive; anything outside the known labels gets the neutral cloud.
pub fn mood_glyph(label: &str) -> &'static str {
    let lower = label.to_lowercase();
    Mood::ALL
        .into_iter()
        .find(|mood| mood.as_str() == lower)
        .map(glyph_for)
        .unwrap_or(DEFAULT_GLYPH)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub glyph: &'static str,
    pub mood: String,
    pub story: String,
}

impl ResultView {
    pub fn new(result: &StoryResult) -> Self {
        Self {
            glyph: mood_glyph(&result.mood),
            mood: result.mood.clone(),
            story: result.story.clone(),
        }
    }

    pub fn render_text(&self) -> String {
        format!(
            "{}  Detected mood: {}\n\n{}\n",
            self.glyph, self.mood, self.story
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_labels_map_to_their_glyphs() {
        assert_eq!(mood_glyph("happy"), "🌞");
        assert_eq!(mood_glyph("SAD"), "🌧️");
        assert_eq!(mood_glyph("Surprised"), "✨");
        assert_eq!(mood_glyph("neutral"), "☁️");
    }

    #[test]
    fn unknown_labels_map_to_default_glyph() {
        for label in ["", "bored", "happy ", "joy", "😀"] {
            assert_eq!(mood_glyph(label), DEFAULT_GLYPH, "label {label:?}");
        }
    }

    #[test]
    fn result_view_keeps_story_verbatim() {
        let story = "  Line one.\n\n\tLine two with <b>markup</b>  ";
        let view = ResultView::new(&StoryResult {
            mood: "happy".into(),
            story: story.into(),
        });
        assert_eq!(view.glyph, "🌞");
        assert_eq!(view.story, story);
        assert!(view.render_text().contains(story));
    }
}
