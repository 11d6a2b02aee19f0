#![forbid(unsafe_code)]

//! `brushbot` — Slack image-generation webhook server binary.
//!
//! Bootstraps configuration, fetches Slack credentials, constructs the AWS
//! service clients once, and serves the Events API webhook until shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use brushbot::config::GlobalConfig;
use brushbot::dedup::DynamoDedupStore;
use brushbot::model::BedrockImageModel;
use brushbot::server;
use brushbot::slack::client::SlackHttpClient;
use brushbot::state::AppState;
use brushbot::storage::S3ImageStore;
use brushbot::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "brushbot", about = "Slack image-generation webhook server", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("brushbot server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;

    // ── AWS clients, constructed once per process ───────
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);

    config.load_secrets(&secrets_client).await?;
    let config = Arc::new(config);
    info!("configuration loaded");

    let dedup = DynamoDedupStore::new(
        aws_sdk_dynamodb::Client::new(&aws_config),
        config.dedup_table.clone(),
        config.dedup_retention_days,
    );
    let store = S3ImageStore::new(
        aws_sdk_s3::Client::new(&aws_config),
        config.image_bucket.clone(),
        config.cdn_domain.clone(),
    );
    let model = BedrockImageModel::new(
        aws_sdk_bedrockruntime::Client::new(&aws_config),
        config.model.clone(),
    );
    let slack = SlackHttpClient::new(config.bot_token.clone());

    // ── Build shared application state ──────────────────
    let state = Arc::new(AppState {
        config: Arc::clone(&config),
        dedup: Arc::new(dedup),
        model: Arc::new(model),
        store: Arc::new(store),
        slack: Arc::new(slack),
    });

    // ── Serve until shutdown signal ─────────────────────
    server::serve(state, shutdown_signal()).await?;
    info!("brushbot shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
