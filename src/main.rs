// src/main.rs

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use basalt::config::CONFIG;
use basalt::oracle::{AnalysisOracle, GeminiClient, UnconfiguredOracle};
use basalt::persistence::JsonFileStore;
use basalt::state::{create_app_state, spawn_workflow_reaper};

#[derive(Parser, Debug)]
#[command(name = "basalt", about = "Snippet vault service", version)]
struct Args {
    /// Address to bind, overriding BASALT_HOST/BASALT_PORT.
    #[arg(long)]
    bind: Option<String>,

    /// Vault data file, overriding BASALT_DATA_FILE.
    #[arg(long, env = "BASALT_DATA_FILE")]
    data_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let data_file = args.data_file.unwrap_or_else(|| CONFIG.data_file.clone());
    let bind_address = args.bind.unwrap_or_else(|| CONFIG.bind_address());

    info!("Starting basalt");
    info!("Vault file: {}", data_file.display());

    let oracle: Arc<dyn AnalysisOracle> = match &CONFIG.gemini_api_key {
        Some(key) => {
            info!("Analysis oracle: {}", CONFIG.gemini_model);
            Arc::new(GeminiClient::new(
                key.clone(),
                CONFIG.gemini_model.clone(),
                CONFIG.gemini_base_url.clone(),
                CONFIG.oracle_timeout_duration(),
            )?)
        }
        None => {
            warn!("GEMINI_API_KEY not set; captures that need analysis will fail");
            Arc::new(UnconfiguredOracle)
        }
    };

    let blob = Arc::new(JsonFileStore::new(data_file));
    let state = create_app_state(blob, oracle).await?;
    spawn_workflow_reaper(state.clone(), CONFIG.workflow_ttl());

    let cors = match CONFIG.cors_origin.as_str() {
        "*" => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        origin => CorsLayer::new()
            .allow_origin(origin.parse::<axum::http::HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = basalt::api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = bind_address.parse()?;
    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
