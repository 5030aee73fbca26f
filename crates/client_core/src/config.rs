use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use camera::{CameraSource, DEFAULT_JPEG_QUALITY};
use serde::Deserialize;
use url::Url;

use crate::error::SettingsError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_SETTINGS_FILE: &str = "mood_story.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: String,
    pub classifier_url: Option<String>,
    pub camera: CameraSource,
    pub jpeg_quality: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            classifier_url: None,
            camera: CameraSource::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    backend_url: Option<String>,
    classifier_url: Option<String>,
    camera: Option<String>,
    jpeg_quality: Option<i64>,
}

/// Defaults, then the settings file, then environment variables.
///
/// An explicit `path` must exist; the default `mood_story.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &raw, &path)?,
        Err(err) if err.kind() == ErrorKind::NotFound && !required => {}
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

pub(crate) fn apply_file(
    settings: &mut Settings,
    raw: &str,
    path: &Path,
) -> Result<(), SettingsError> {
    let file_cfg: FileSettings = toml::from_str(raw).map_err(|source| SettingsError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    if let Some(v) = file_cfg.backend_url {
        settings.backend_url = normalize_base_url("backend_url", &v)?;
    }
    if let Some(v) = file_cfg.classifier_url {
        settings.classifier_url = normalize_optional_url("classifier_url", &v)?;
    }
    if let Some(v) = file_cfg.camera {
        settings.camera = v.parse().map_err(SettingsError::InvalidCamera)?;
    }
    if let Some(v) = file_cfg.jpeg_quality {
        settings.jpeg_quality = parse_jpeg_quality(&v.to_string())?;
    }
    Ok(())
}

/// Later keys in each list take precedence.
pub(crate) fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), SettingsError> {
    for key in ["BACKEND_URL", "MOOD_STORY__BACKEND_URL"] {
        if let Some(v) = lookup(key) {
            settings.backend_url = normalize_base_url("backend_url", &v)?;
        }
    }
    for key in ["CLASSIFIER_URL", "MOOD_STORY__CLASSIFIER_URL"] {
        if let Some(v) = lookup(key) {
            settings.classifier_url = normalize_optional_url("classifier_url", &v)?;
        }
    }
    if let Some(v) = lookup("MOOD_STORY__CAMERA") {
        settings.camera = v.parse().map_err(SettingsError::InvalidCamera)?;
    }
    if let Some(v) = lookup("MOOD_STORY__JPEG_QUALITY") {
        settings.jpeg_quality = parse_jpeg_quality(&v)?;
    }
    Ok(())
}

/// Trims whitespace and trailing slashes. Empty input falls back to the default backend.
pub fn normalize_base_url(field: &'static str, raw: &str) -> Result<String, SettingsError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(DEFAULT_BACKEND_URL.to_string());
    }

    let parsed = Url::parse(trimmed).map_err(|err| SettingsError::InvalidUrl {
        field,
        value: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SettingsError::InvalidUrl {
            field,
            value: raw.to_string(),
            reason: "url must start with http:// or https://".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_url(
    field: &'static str,
    raw: &str,
) -> Result<Option<String>, SettingsError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    normalize_base_url(field, raw).map(Some)
}

/// Any integer is accepted and clamped to 1..=100.
pub fn parse_jpeg_quality(raw: &str) -> Result<u8, SettingsError> {
    let value = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| SettingsError::InvalidJpegQuality(raw.to_string()))?;
    Ok(value.clamp(1, 100) as u8)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
