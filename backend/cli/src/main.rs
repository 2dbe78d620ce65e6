mod pipeline;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use docintel_config::{load_env_file, Settings, DEFAULT_DOCUMENT_URL};
use docintel_core::ReviewError;
use docintel_logging::{init_logger, redact_sensitive_data};
use docintel_review::providers::OpenAiProvider;
use docintel_review::ContentReviewer;
use docintel_understanding::AzureDocumentAnalyzer;

use pipeline::run_pipeline;

#[derive(Parser)]
#[command(name = "docintel")]
#[command(about = "OCR a document image, summarise word confidence, and ask a language model to review it")]
#[command(version)]
struct Cli {
    /// URL of the document image to analyse
    #[arg(long, default_value = DEFAULT_DOCUMENT_URL)]
    url: String,

    /// Environment file to load instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Also write JSON logs to a daily rolling file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = redact_sensitive_data(&format!("{err:#}"));
            eprintln!("Error: {message}");
            let code = err
                .downcast_ref::<ReviewError>()
                .map(ReviewError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let env_file = load_env_file(cli.env_file.as_deref())?;
    init_logger("info", cli.log_dir.as_deref());
    if let Some(path) = &env_file {
        debug!(path = %path.display(), "Loaded environment file");
    }

    let settings = Settings::from_env()?;
    debug!(settings = %settings.redacted(), "Loaded settings");

    let analyzer = AzureDocumentAnalyzer::new(&settings.azure_endpoint, &settings.azure_key);
    let provider =
        OpenAiProvider::new(&settings.openai_api_key).with_base_url(&settings.openai_base_url);
    let reviewer = ContentReviewer::new(Arc::new(provider), &settings.openai_model);

    info!(document = %cli.url, "Starting document review");
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_pipeline(&analyzer, &reviewer, &cli.url, &mut out).await?;
    Ok(())
}
