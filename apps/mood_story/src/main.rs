use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use camera::CameraSource;
use clap::Parser;
use client_core::{
    config::parse_jpeg_quality, load_settings, ExpressionClassifier, HttpExpressionClassifier,
    HttpStoryClient, MissingExpressionClassifier, Settings, StoryFlow,
};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod wizard;

#[derive(Parser, Debug)]
#[command(name = "mood_story", about = "Capture your mood and get a story written for it")]
struct Args {
    /// Settings file (defaults to ./mood_story.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Story service base URL.
    #[arg(long)]
    backend_url: Option<String>,
    /// Expression classifier base URL; omit to always use the neutral mood.
    #[arg(long)]
    classifier_url: Option<String>,
    /// Camera source: file:<path> or command:<program> [args].
    #[arg(long)]
    camera: Option<String>,
    #[arg(long)]
    jpeg_quality: Option<String>,
    /// Where the interactive preview image is kept while it is on screen.
    #[arg(long)]
    preview_dir: Option<PathBuf>,
    /// Run start, capture and analyze without prompting.
    #[arg(long)]
    auto: bool,
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_settings(args: &Args) -> Result<Settings> {
    let mut settings = load_settings(args.config.as_deref()).context("failed to load settings")?;

    if let Some(v) = &args.backend_url {
        settings.backend_url = client_core::config::normalize_base_url("backend_url", v)?;
    }
    if let Some(v) = &args.classifier_url {
        settings.classifier_url = if v.trim().is_empty() {
            None
        } else {
            Some(client_core::config::normalize_base_url("classifier_url", v)?)
        };
    }
    if let Some(v) = &args.camera {
        settings.camera = v
            .parse::<CameraSource>()
            .map_err(client_core::SettingsError::InvalidCamera)?;
    }
    if let Some(v) = &args.jpeg_quality {
        settings.jpeg_quality = parse_jpeg_quality(v)?;
    }
    Ok(settings)
}

fn build_flow(settings: &Settings) -> StoryFlow {
    let classifier: Arc<dyn ExpressionClassifier> = match &settings.classifier_url {
        Some(url) => Arc::new(HttpExpressionClassifier::new(url.clone())),
        None => Arc::new(MissingExpressionClassifier),
    };
    StoryFlow::new(
        Arc::from(settings.camera.connector()),
        classifier,
        Arc::new(HttpStoryClient::new(settings.backend_url.clone())),
    )
    .with_jpeg_quality(settings.jpeg_quality)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let settings = resolve_settings(&args)?;
    info!(
        backend = %settings.backend_url,
        classifier = settings.classifier_url.as_deref().unwrap_or("none"),
        camera = %settings.camera,
        "mood_story: starting"
    );

    let mut flow = build_flow(&settings);
    let mut stdout = std::io::stdout();

    if args.auto {
        return wizard::run_auto(&mut flow, &mut stdout).await;
    }
    let screen = wizard::Screen::new(settings.backend_url.clone());
    let preview_dir = args.preview_dir.clone().unwrap_or_else(std::env::temp_dir);
    let mut preview = wizard::PreviewFile::new(preview_dir);
    let input = BufReader::new(tokio::io::stdin());
    wizard::run_interactive(&mut flow, &screen, &mut preview, input, &mut stdout).await
}
