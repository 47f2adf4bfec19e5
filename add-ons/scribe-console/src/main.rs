//! Scribe console launcher.
//!
//! With no argument, opens two terminal windows — one live transcript, one
//! rolling summary — each running this executable with a mode argument.
//! With `transcript` or `summary`, runs that console directly.

use anyhow::Context;
use scribe_core::{MeetingService, Mode, OpenRouterSummarizer, ScribeConfig, SonioxRealtime};
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[scribe-console] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mode = std::env::args().nth(1);
    if let Err(e) = run(mode.as_deref()).await {
        tracing::error!("fatal: {:#}", e);
        eprintln!("\nThere was an unexpected error\n");
        std::process::exit(1);
    }
}

async fn run(mode: Option<&str>) -> anyhow::Result<()> {
    let config = ScribeConfig::load().context("load scribe.toml")?;
    config
        .ensure_directories()
        .context("create output directories")?;

    let Some(mode) = mode else {
        return launch_consoles();
    };

    match mode.parse::<Mode>()? {
        Mode::Transcript => {
            let api_key = config
                .stt_api_key()
                .context("transcription needs an API key (scribe.toml stt_api_key or SONIOX_API_KEY)")?;
            let transcriber = SonioxRealtime::new(api_key).with_model(&config.stt_model);
            let service = MeetingService::new(config);
            service.run_transcription(Arc::new(transcriber)).await?;
        }
        Mode::Summary => {
            let api_key = config
                .llm_api_key()
                .context("summaries need an API key (scribe.toml llm_api_key or OPENROUTER_API_KEY)")?;
            let summarizer = OpenRouterSummarizer::new(api_key)
                .with_model(&config.llm_model)
                .with_template(config.notes_template());
            let service = MeetingService::new(config);
            service.run_summary(Arc::new(summarizer)).await?;
        }
    }
    Ok(())
}

/// Open the transcript and summary consoles as separate terminal windows.
fn launch_consoles() -> anyhow::Result<()> {
    let exe = std::env::current_exe().context("resolve current executable")?;

    spawn_console("Transcript", "transcript", &exe)?;
    spawn_console("Summary", "summary", &exe)?;

    println!("Launched transcript and summary consoles");
    Ok(())
}

fn spawn_console(title: &str, mode: &str, exe: &Path) -> anyhow::Result<()> {
    tracing::info!("opening {} console", title);

    #[cfg(target_os = "windows")]
    {
        Command::new("cmd")
            .args(["/c", "start", title, &exe.display().to_string(), mode])
            .spawn()
            .with_context(|| format!("launch {} console", title))?;
    }

    #[cfg(target_os = "macos")]
    {
        let script = format!(
            "tell application \"Terminal\" to do script \"{} {}\"",
            exe.display(),
            mode
        );
        Command::new("osascript")
            .args(["-e", &script])
            .spawn()
            .with_context(|| format!("launch {} console", title))?;
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        Command::new("x-terminal-emulator")
            .args(["-T", title, "-e"])
            .arg(exe)
            .arg(mode)
            .spawn()
            .with_context(|| format!("launch {} console", title))?;
    }

    Ok(())
}
