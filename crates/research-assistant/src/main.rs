//! Research Assistant - Entry Point
//!
//! Loads configuration from the environment (and `.env`), applies CLI
//! overrides, and serves the HTTP API.

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use research_assistant::config::{Config, GenerationDevice, StoreBackend};
use research_assistant::server::{ApiServer, AppState};

#[derive(Parser, Debug)]
#[command(name = "research-assistant")]
#[command(about = "Research assistant API: arXiv search, paper graph and LLM-backed QA")]
#[command(version)]
struct Cli {
    /// HTTP server port
    #[arg(long, default_value = "8000", env = "PORT")]
    port: u16,

    /// Paper store backend (overrides STORE_BACKEND)
    #[arg(long, value_enum)]
    store: Option<StoreBackend>,

    /// Generation model (overrides GENERATION_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Force the generation engine onto the CPU
    #[arg(long)]
    cpu: bool,

    /// Largest PDF to download, in bytes (overrides MAX_PDF_BYTES)
    #[arg(long)]
    max_pdf_bytes: Option<usize>,

    /// Disable vision-model figure descriptions
    #[arg(long)]
    no_vision: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    let mut config = Config::from_env()?;
    if let Some(store) = cli.store {
        config.store_backend = store;
    }
    if let Some(model) = cli.model {
        config.generation_model = model;
    }
    if cli.cpu {
        config.generation_device = GenerationDevice::Cpu;
    }
    if let Some(bytes) = cli.max_pdf_bytes {
        config.max_pdf_bytes = bytes;
    }
    if cli.no_vision {
        config.vision_model = None;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        store = ?config.store_backend,
        model = %config.generation_model,
        device = ?config.generation_device,
        vision = ?config.vision_model,
        embeddings = config.embedding_url.as_deref().unwrap_or("local hashing"),
        "Starting research assistant"
    );

    let state = AppState::from_config(&config)?;
    ApiServer::new(state).run_http(cli.port).await
}
