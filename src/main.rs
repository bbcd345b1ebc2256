use std::process;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod server;
mod study;
mod utils;

use config::{build_cli, AppConfig};
use server::http_server::{start_server, AppState};
use study::extractor::DocumentExtractor;
use study::pipeline::StudyGuidePipeline;
use utils::fetch::HttpDocumentSource;
use utils::gemini::GeminiClient;
use utils::youtube_search::YouTubeSearchClient;

fn print_banner(config: &AppConfig) {
    let line = "═".repeat(58);
    eprintln!("\n\x1b[36m╔{}╗", line);
    eprintln!("   \x1b[1mStudy Guide Server\x1b[0m\x1b[36m");
    eprintln!("   POST http://{}/analyze-file-url", config.bind_addr());
    eprintln!("   model: {}", config.gemini_model);
    eprintln!("╚{}╝\x1b[0m\n", line);
}

fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let source = HttpDocumentSource::new(config.fetch_timeout, config.max_document_bytes)?;
    let generator = GeminiClient::new(
        config.gemini_api_key.clone(),
        &config.gemini_model,
        &config.gemini_base_url,
        config.generation_timeout,
    )?;
    let videos = YouTubeSearchClient::new(
        config.youtube_api_key.clone(),
        &config.youtube_base_url,
        config.video_timeout,
    )?;

    let pipeline = StudyGuidePipeline::new(
        Arc::new(source),
        DocumentExtractor::new(config.scratch_dir.clone()),
        Arc::new(generator),
        Arc::new(videos),
    );

    Ok(AppState {
        pipeline: Arc::new(pipeline),
        expose_error_details: config.expose_error_details,
        port: config.port,
    })
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();

    // Initialize tracing to stderr; RUST_LOG wins over the defaults
    let default_level = if matches.get_flag("quiet") { "error" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let config = match AppConfig::from_matches(&matches) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    // Log configuration status (without exposing secrets)
    info!(
        model = %config.gemini_model,
        scratch_dir = %config.scratch_dir.display(),
        redact_details = !config.expose_error_details,
        "Gemini and YouTube API keys loaded"
    );

    if !config.quiet {
        print_banner(&config);
    }

    let state = match build_state(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize HTTP clients: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = start_server(config.bind_addr(), state).await {
        error!("Failed to start server: {}", e);
        process::exit(1);
    }
}
