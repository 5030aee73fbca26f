use std::{fmt, path::PathBuf, str::FromStr};

use crate::{CameraConnector, CommandCamera, FileCamera};

/// Where frames come from, written as `file:<path>` or `command:<program> [args...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraSource {
    File(PathBuf),
    Command { program: String, args: Vec<String> },
}

impl CameraSource {
    /// One-frame v4l2 grab through ffmpeg, emitted as MJPEG on stdout.
    pub fn default_device() -> Self {
        let argv = [
            "-loglevel",
            "error",
            "-f",
            "v4l2",
            "-i",
            "/dev/video0",
            "-frames:v",
            "1",
            "-f",
            "image2pipe",
            "-vcodec",
            "mjpeg",
            "-",
        ];
        Self::Command {
            program: "ffmpeg".to_string(),
            args: argv.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    pub fn connector(&self) -> Box<dyn CameraConnector> {
        match self {
            CameraSource::File(path) => Box::new(FileCamera::new(path.clone())),
            CameraSource::Command { program, args } => {
                Box::new(CommandCamera::new(program.clone(), args.clone()))
            }
        }
    }
}

impl Default for CameraSource {
    fn default() -> Self {
        Self::default_device()
    }
}

impl fmt::Display for CameraSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraSource::File(path) => write!(f, "file:{}", path.display()),
            CameraSource::Command { program, args } => {
                write!(f, "command:{program}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for CameraSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(path) = s.strip_prefix("file:") {
            let path = path.trim();
            if path.is_empty() {
                return Err("file camera source needs a path".to_string());
            }
            return Ok(CameraSource::File(PathBuf::from(path)));
        }
        if let Some(command) = s.strip_prefix("command:") {
            let mut parts = command.split_whitespace().map(str::to_string);
            let Some(program) = parts.next() else {
                return Err("command camera source needs a program".to_string());
            };
            return Ok(CameraSource::Command {
                program,
                args: parts.collect(),
            });
        }
        Err(format!(
            "unsupported camera source '{s}'; expected file:<path> or command:<program> [args]"
        ))
    }
}
