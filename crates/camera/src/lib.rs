//! Camera capability: device connectors, live streams, and still-frame encoding.

use async_trait::async_trait;
use image::{codecs::jpeg::JpegEncoder, RgbImage};
use shared::domain::CapturedImage;
use thiserror::Error;
use tracing::{debug, info};

mod command;
mod file;
mod source;

pub use command::CommandCamera;
pub use file::FileCamera;
pub use source::CameraSource;

pub const DEFAULT_JPEG_QUALITY: u8 = 92;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("camera stream is not active")]
    Inactive,
    #[error("camera produced an empty frame")]
    EmptyFrame,
    #[error("failed to read frame: {0}")]
    Frame(#[source] anyhow::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
}

impl CameraError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// A single decoded video frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: RgbImage,
}

impl Frame {
    pub fn new(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    /// Decodes any image format the `image` crate understands into an RGB frame.
    pub fn decode(bytes: &[u8]) -> Result<Self, CameraError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|err| CameraError::Frame(anyhow::Error::new(err)))?;
        Ok(Self::new(decoded.to_rgb8()))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn encode_jpeg(&self, quality: u8) -> Result<CapturedImage, CameraError> {
        if self.width() == 0 || self.height() == 0 {
            return Err(CameraError::EmptyFrame);
        }
        let mut bytes = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
            encoder.encode_image(&self.pixels)?;
        }
        debug!(
            width = self.width(),
            height = self.height(),
            jpeg_bytes = bytes.len(),
            "camera: frame encoded"
        );
        Ok(CapturedImage::jpeg(self.width(), self.height(), bytes))
    }
}

#[async_trait]
pub trait CameraStream: Send + Sync {
    async fn grab_frame(&mut self) -> Result<Frame, CameraError>;
    /// Releases the underlying device. Must be idempotent.
    fn stop(&mut self);
    fn is_active(&self) -> bool;
    fn label(&self) -> &str;
}

#[async_trait]
pub trait CameraConnector: Send + Sync {
    async fn open(&self) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// Owns an open stream and stops it when dropped.
pub struct ActiveCamera {
    stream: Box<dyn CameraStream>,
}

impl ActiveCamera {
    pub async fn acquire(connector: &dyn CameraConnector) -> Result<Self, CameraError> {
        let stream = connector.open().await?;
        info!(camera = stream.label(), "camera: stream acquired");
        Ok(Self { stream })
    }

    pub fn is_ready(&self) -> bool {
        self.stream.is_active()
    }

    pub fn label(&self) -> &str {
        self.stream.label()
    }

    pub async fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        if !self.stream.is_active() {
            return Err(CameraError::Inactive);
        }
        self.stream.grab_frame().await
    }

    pub fn release(self) {}
}

impl Drop for ActiveCamera {
    fn drop(&mut self) {
        if self.stream.is_active() {
            info!(camera = self.stream.label(), "camera: stream released");
        }
        self.stream.stop();
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
