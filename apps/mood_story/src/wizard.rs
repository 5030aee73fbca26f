//! Terminal rendering and input handling for the story wizard.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use chrono::Local;
use client_core::{render, FlowError, StoryFlow, WizardStep};
use shared::domain::CapturedImage;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Primary,
    Retake,
    Analyze,
    TryAgain,
    Home,
    Quit,
    Unknown,
}

/// Same key means different things per screen; `r` is retry on capture and retake on preview.
pub fn parse_command(step: WizardStep, line: &str) -> Command {
    match (step, line.trim().to_ascii_lowercase().as_str()) {
        (_, "q" | "quit" | "exit") => Command::Quit,
        (_, "h" | "home") => Command::Home,
        (_, "") => Command::Primary,
        (WizardStep::Capture | WizardStep::Preview, "r" | "retake" | "retry") => Command::Retake,
        (WizardStep::Capture, "c" | "capture") => Command::Primary,
        (WizardStep::Preview, "a" | "analyze" | "generate") => Command::Analyze,
        (WizardStep::Result, "t" | "try" | "again") => Command::TryAgain,
        (WizardStep::Hero, "s" | "start") => Command::Primary,
        _ => Command::Unknown,
    }
}

pub struct Screen {
    backend_url: String,
}

impl Screen {
    pub fn new(backend_url: String) -> Self {
        Self { backend_url }
    }

    fn header(&self) -> String {
        format!("{}    Backend: {}", render::APP_TITLE, self.backend_url)
    }

    pub fn hero(&self) -> String {
        let mut out = format!(
            "{}\n\n{}\n{}\n\n",
            self.header(),
            render::HERO_TITLE,
            render::HERO_TAGLINE
        );
        for (index, title) in render::STEP_OVERVIEW.iter().enumerate() {
            out.push_str(&format!(
                "  {}. {title}: Step {} of the flow. {}\n",
                index + 1,
                index + 1,
                render::STEP_OVERVIEW_DETAIL
            ));
        }
        out.push_str("\n[Enter] Start with Camera   [q] Quit");
        out
    }

    pub fn capture(&self, flow: &StoryFlow) -> String {
        let mut out = format!("{}\n\nCamera\n", self.header());
        if let Some(error) = flow.camera_error() {
            out.push_str(&format!("{error}\n\n[r] Retry camera   [h] Home   [q] Quit"));
        } else if !flow.is_camera_ready() {
            out.push_str(render::REQUESTING_CAMERA);
        } else {
            out.push_str(&format!(
                "{}\n\n[Enter] Capture   [h] Home   [q] Quit",
                render::CAPTURE_HINT
            ));
        }
        out
    }

    pub fn preview(&self, flow: &StoryFlow, saved_to: Option<&Path>) -> String {
        let mut out = format!("{}\n\nPreview\n", self.header());
        if let Some(image) = flow.image() {
            out.push_str(&format!(
                "Captured {}x{} ({} bytes)",
                image.width,
                image.height,
                image.bytes.len()
            ));
            if let Some(path) = saved_to {
                out.push_str(&format!(" -> {}", path.display()));
            }
            out.push('\n');
        }
        out.push_str(&format!(
            "{}\n\n[r] Retake   [Enter/a] Analyze & Generate   [h] Home   [q] Quit",
            render::PREVIEW_HINT
        ));
        if let Some(banner) = flow.banner() {
            out.push_str(&format!("\n\n! {banner}"));
        }
        out
    }

    pub fn result(&self, flow: &StoryFlow) -> String {
        let mut out = format!("{}\n\n", self.header());
        if let Some(view) = flow.render_result() {
            out.push_str(&view.render_text());
        }
        out.push_str("\n[t] Try Again   [h] Home   [q] Quit");
        out
    }
}

/// On-disk copy of the captured image. At most one file exists, and only while the flow
/// still holds the image.
pub struct PreviewFile {
    dir: PathBuf,
    current: Option<PathBuf>,
    saved: u32,
}

impl PreviewFile {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            current: None,
            saved: 0,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    pub async fn save(&mut self, image: &CapturedImage) -> Result<PathBuf> {
        self.discard().await;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        self.saved += 1;
        let filename = format!(
            "mood-story-{}-{}-{}.jpg",
            Local::now().format("%Y%m%d-%H%M%S%.3f"),
            std::process::id(),
            self.saved
        );
        let path = self.dir.join(filename);
        tokio::fs::write(&path, &image.bytes)
            .await
            .with_context(|| format!("failed to write preview {}", path.display()))?;
        self.current = Some(path.clone());
        Ok(path)
    }

    pub async fn discard(&mut self) {
        let Some(path) = self.current.take() else {
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "preview removed"),
            Err(err) => warn!(path = %path.display(), "preview not removed: {err}"),
        }
    }

    /// Writes the image once when the flow gains one, removes the file when it drops it.
    pub async fn sync(&mut self, flow: &StoryFlow) {
        match flow.image() {
            Some(image) if self.current.is_none() => {
                if let Err(err) = self.save(image).await {
                    warn!("preview not saved: {err:#}");
                }
            }
            Some(_) => {}
            None => self.discard().await,
        }
    }
}

fn show(out: &mut impl Write, text: &str) -> Result<()> {
    writeln!(out, "\n{text}")?;
    Ok(())
}

async fn run_analyze(flow: &mut StoryFlow, out: &mut impl Write) -> Result<()> {
    show(out, render::ANALYZING)?;
    if let Err(err) = flow.analyze().await {
        if !matches!(err, FlowError::StoryRequest(_)) {
            warn!("analyze rejected: {err}");
        }
    }
    Ok(())
}

fn render_step(
    flow: &StoryFlow,
    screen: &Screen,
    preview: &PreviewFile,
    out: &mut impl Write,
) -> Result<()> {
    match flow.step() {
        WizardStep::Hero => show(out, &screen.hero()),
        WizardStep::Capture => show(out, &screen.capture(flow)),
        WizardStep::Preview => show(out, &screen.preview(flow, preview.path())),
        WizardStep::Analyzing => show(out, render::ANALYZING),
        WizardStep::Result => show(out, &screen.result(flow)),
    }
}

/// Errors from the flow are already reflected in its state and shown on the next render.
fn log_flow_error(result: Result<(), FlowError>) {
    if let Err(err) = result {
        match err {
            FlowError::CameraUnavailable(_) | FlowError::StoryRequest(_) => {}
            other => warn!("{other}"),
        }
    }
}

pub async fn run_interactive(
    flow: &mut StoryFlow,
    screen: &Screen,
    preview: &mut PreviewFile,
    input: impl AsyncBufRead + Unpin,
    out: &mut impl Write,
) -> Result<()> {
    let mut lines = input.lines();

    loop {
        render_step(flow, screen, preview, out)?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match (flow.step(), parse_command(flow.step(), &line)) {
            (_, Command::Quit) => break,
            (_, Command::Home) => flow.reset(),
            (WizardStep::Hero, Command::Primary) => log_flow_error(flow.start().await),
            (WizardStep::Capture, Command::Primary) => {
                if let Err(err) = flow.capture_frame().await {
                    warn!("{err}");
                }
            }
            (WizardStep::Capture, Command::Retake) => log_flow_error(flow.acquire_camera().await),
            (WizardStep::Preview, Command::Retake) => log_flow_error(flow.retake().await),
            (WizardStep::Preview, Command::Primary | Command::Analyze) => {
                run_analyze(flow, out).await?
            }
            (WizardStep::Result, Command::TryAgain) => log_flow_error(flow.try_again().await),
            _ => writeln!(out, "Unrecognised input: {}", line.trim())?,
        }
        preview.sync(flow).await;
    }

    flow.reset();
    preview.discard().await;
    writeln!(out, "\n{}", render::FOOTER)?;
    Ok(())
}

/// Start, capture and analyze without prompting; prints only the result screen text.
pub async fn run_auto(flow: &mut StoryFlow, out: &mut impl Write) -> Result<()> {
    if flow.start().await.is_err() {
        bail!(render::CAMERA_UNAVAILABLE);
    }
    if !flow.capture_frame().await? {
        bail!("camera stream was not ready for capture");
    }

    eprintln!("{}", render::ANALYZING);
    if let Err(err) = flow.analyze().await {
        let message = flow
            .banner()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        bail!(message);
    }
    if let Some(view) = flow.render_result() {
        write!(out, "{}", view.render_text())?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
