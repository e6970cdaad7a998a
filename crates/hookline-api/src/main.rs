//! Hookline webhook server

use anyhow::Context;
use clap::Parser;
use hookline_api::{AppState, routes};
use hookline_config::{ConfigStore, ServerConfig, SinkBackend, parse_server_config};
use hookline_core::JobSink;
use hookline_sink::{InMemorySink, KubernetesSink};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hookline-server")]
#[command(about = "Receive git webhooks and create integration jobs", long_about = None)]
#[command(version)]
struct Args {
    /// Server configuration file (KDL)
    #[arg(short, long, env = "HOOKLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "HOOKLINE_LISTEN")]
    listen: Option<String>,

    /// Directory of integration configs
    #[arg(long, env = "HOOKLINE_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Where to create integration jobs: kubernetes, or memory (development
    /// only; keeps the most recent jobs in process)
    #[arg(long, env = "HOOKLINE_SINK")]
    sink: Option<SinkBackend>,
}

impl Args {
    fn server_config(&self) -> anyhow::Result<ServerConfig> {
        let mut server = match &self.config {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                parse_server_config(&content)
                    .with_context(|| format!("invalid server config {}", path.display()))?
            }
            None => ServerConfig::default(),
        };

        if let Some(listen) = &self.listen {
            server.listen = listen.clone();
        }
        if let Some(dir) = &self.config_dir {
            server.config_dir = dir.clone();
        }
        if let Some(sink) = self.sink {
            server.sink = sink;
        }
        Ok(server)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server = Args::parse().server_config()?;

    let configs = ConfigStore::load_dir(&server.config_dir).with_context(|| {
        format!(
            "failed to load integration configs from {}",
            server.config_dir.display()
        )
    })?;
    info!(count = configs.len(), "Integration configs loaded");

    let sink: Arc<dyn JobSink> = match server.sink {
        SinkBackend::Memory => {
            warn!("Using the in-memory sink; integration jobs are not persisted");
            Arc::new(InMemorySink::new())
        }
        SinkBackend::Kubernetes => Arc::new(KubernetesSink::new().await?),
    };
    info!(sink = sink.name(), "Job sink ready");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(server.http_timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let state = AppState::new(configs, sink, http);
    let app = routes::router(state).layer(TraceLayer::new_for_http());

    info!("Starting server on {}", server.listen);
    let listener = TcpListener::bind(&server.listen)
        .await
        .with_context(|| format!("failed to bind {}", server.listen))?;
    axum::serve(listener, app).await?;

    Ok(())
}
