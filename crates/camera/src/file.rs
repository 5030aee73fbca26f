use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;

use crate::{CameraConnector, CameraError, CameraStream, Frame};

/// Treats an image file as a camera. Each grab re-reads the file, so replacing it on disk
/// behaves like a changing scene.
#[derive(Debug, Clone)]
pub struct FileCamera {
    path: PathBuf,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn read_frame(path: &Path) -> Result<Frame, CameraError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| CameraError::Frame(anyhow::Error::new(err)))?;
    Frame::decode(&bytes)
}

#[async_trait]
impl CameraConnector for FileCamera {
    async fn open(&self) -> Result<Box<dyn CameraStream>, CameraError> {
        if let Err(err) = read_frame(&self.path).await {
            warn!(path = %self.path.display(), "camera: file source unusable: {err}");
            return Err(CameraError::unavailable(format!(
                "{}: {err}",
                self.path.display()
            )));
        }
        Ok(Box::new(FileStream {
            path: self.path.clone(),
            label: format!("file:{}", self.path.display()),
            active: true,
        }))
    }
}

struct FileStream {
    path: PathBuf,
    label: String,
    active: bool,
}

#[async_trait]
impl CameraStream for FileStream {
    async fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        if !self.active {
            return Err(CameraError::Inactive);
        }
        read_frame(&self.path).await
    }

    fn stop(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn label(&self) -> &str {
        &self.label
    }
}
