//! lsad: hidden-gallery container recovery daemon
//!
//! Usage:
//!   lsad [--config /etc/lsa/lsa.toml] [--listen 0.0.0.0:8000]
//!
//! Clients POST a `.lsa` / `.lsav` container to `/api/decrypt` and receive the
//! recovered media with its inferred filename and MIME type.

mod metrics;
mod server;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lsa_core::config::LsaConfig;
use lsa_recovery::Recoverer;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lsad", version, about = "Hidden-gallery container recovery daemon")]
struct Cli {
    /// Path to lsa.toml configuration file
    #[arg(long, short = 'c', env = "LSA_CONFIG", default_value = "/etc/lsa/lsa.toml")]
    config: PathBuf,

    /// Listen address (overrides server.listen)
    #[arg(long, env = "LSA_LISTEN")]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides server.log_level
    #[arg(long, env = "LSA_LOG")]
    log: Option<String>,

    /// Log format; overrides server.log_format
    #[arg(long, env = "LSA_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    fn from_config(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = LsaConfig::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    let level = cli.log.clone().unwrap_or_else(|| config.server.log_level.clone());
    let format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| LogFormat::from_config(&config.server.log_format));
    init_logging(&level, &format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        config_found = cli.config.exists(),
        "lsad starting"
    );

    let recoverer = Recoverer::from_config(&config).context("building transform provider")?;
    info!(
        provider = recoverer.provider_name(),
        max_upload_bytes = config.server.max_upload_bytes,
        sniff_window = config.recovery.sniff_window,
        strict_video_header = config.recovery.strict_video_header,
        "recovery pipeline ready"
    );

    let (registry, metrics) = metrics::new_registry();
    let state = server::AppState {
        recoverer,
        metrics,
        registry,
        max_upload_bytes: config.server.max_upload_bytes,
    };
    let app = server::router(state, &config.server);

    let listen = cli.listen.unwrap_or_else(|| config.server.listen.clone());
    server::serve(&listen, app).await
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
}
