//! Gemini PDF Translator CLI - translate a PDF into an overlaid sibling copy.

use anyhow::{Context, Result, bail};
use clap::Parser;
use gemini_pdf_core::{AppConfig, CredentialStore, JobDriver, JobEvent, JobRunner, Lang};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "gemini-pdf-translate")]
#[command(author, version, about = "Overlay-translate PDF documents via Gemini", long_about = None)]
struct Args {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Target language code
    #[arg(short = 't', long, default_value = gemini_pdf_core::DEFAULT_TARGET_LANG)]
    target: String,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_API_BASE")]
    api_base: Option<String>,

    /// Gemini API key. Falls back to the stored credential; when given
    /// explicitly it is saved for later runs.
    #[arg(long, env = "GEMINI_API_KEY")]
    api_key: Option<String>,

    /// Model name
    #[arg(long, env = "GEMINI_MODEL")]
    model: Option<String>,

    /// Bundled TrueType font file for the translated text
    #[arg(long)]
    font: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    // Override config with CLI arguments
    config.target_lang = Lang::new(&args.target);
    if let Some(api_base) = args.api_base {
        config.translator.api_base = api_base;
    }
    if let Some(model) = args.model {
        config.translator.model = model;
    }
    if let Some(font) = args.font {
        config.font_file = Some(font);
    }

    // The driver gates the job on a valid selection
    let mut driver = JobDriver::new();
    if !driver.select_file(&args.input) {
        bail!("{} is not a PDF file", args.input.display());
    }

    // Resolve the credential: an explicitly passed key wins and is saved
    // for later runs; otherwise the stored one is used.
    let store = CredentialStore::open_default();
    let api_key = match args.api_key {
        Some(key) => {
            if let Err(e) = store.save(&key) {
                warn!("Could not persist API key: {}", e);
            }
            key
        }
        None => store
            .load()
            .ok_or(gemini_pdf_core::Error::CredentialMissing)
            .context("Pass --api-key (or set GEMINI_API_KEY) once; it will be remembered")?,
    };

    let input = driver.start().context("No file selected")?;
    info!("Starting translation of {}", input.display());

    // The job runs on its own worker; this task only renders events
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let runner = JobRunner::from_config(config, api_key, tx);
    let job = tokio::spawn(async move { runner.run(&input).await });

    let pb = ProgressBar::new(100);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    while let Some(event) = rx.recv().await {
        match event {
            JobEvent::Status(text) => pb.set_message(text),
            JobEvent::Progress(percent) => pb.set_position(u64::from(percent)),
            JobEvent::Completed { .. } => pb.finish_with_message("Translation complete"),
            JobEvent::Failed { message } => pb.abandon_with_message(message),
        }
    }

    let result = job.await.context("Translation job panicked")?;
    driver.finish();

    let output = result.context("Translation failed")?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("Translated PDF saved to: {}", output.display());
    }

    Ok(())
}
