use std::{io::ErrorKind, process::Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::{CameraConnector, CameraError, CameraStream, Frame};

/// Captures frames by running an external program that writes one encoded image to stdout,
/// e.g. `ffmpeg -f v4l2 -i /dev/video0 -frames:v 1 -f image2pipe -vcodec mjpeg -`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
}

impl CommandCamera {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    async fn run_capture(&self) -> Result<Frame, CameraError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| {
                if err.kind() == ErrorKind::NotFound {
                    CameraError::unavailable(format!("capture program not found: {}", self.program))
                } else if err.kind() == ErrorKind::PermissionDenied {
                    CameraError::unavailable(format!("permission denied running {}", self.program))
                } else {
                    CameraError::Frame(anyhow::Error::new(err))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CameraError::unavailable(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        debug!(
            program = %self.program,
            bytes = output.stdout.len(),
            "camera: capture command produced frame"
        );
        Frame::decode(&output.stdout)
    }
}

#[async_trait]
impl CameraConnector for CommandCamera {
    async fn open(&self) -> Result<Box<dyn CameraStream>, CameraError> {
        // Probe once so a missing device is reported at acquisition rather than on capture.
        match self.run_capture().await {
            Ok(_) => {}
            Err(CameraError::Unavailable { reason }) => {
                warn!(program = %self.program, "camera: device probe failed: {reason}");
                return Err(CameraError::Unavailable { reason });
            }
            Err(err) => {
                warn!(program = %self.program, "camera: device probe failed: {err}");
                return Err(CameraError::unavailable(err.to_string()));
            }
        }

        Ok(Box::new(CommandStream {
            camera: self.clone(),
            label: format!("command:{}", self.program),
            active: true,
        }))
    }
}

struct CommandStream {
    camera: CommandCamera,
    label: String,
    active: bool,
}

#[async_trait]
impl CameraStream for CommandStream {
    async fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        if !self.active {
            return Err(CameraError::Inactive);
        }
        self.camera.run_capture().await
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
