//! Verdant Daemon - Main entry point
//!
//! Serves the WebXR frontend, the plant model directory and the plant
//! catalog API on the local network.

mod api;
mod config;
mod server;
mod state;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "verdant")]
#[command(about = "AR plant viewer host")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "verdant.toml")]
    config: PathBuf,

    /// Bind address for web server
    #[arg(short, long)]
    bind: Option<String>,

    /// Log filter (a level such as "debug", or directives like
    /// "verdant=debug,tower_http=info"); RUST_LOG takes precedence
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write a default configuration file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = log_filter(&args.log_level, std::env::var("RUST_LOG").ok().as_deref())?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Verdant v{}", env!("CARGO_PKG_VERSION"));

    if args.init_config {
        if args.config.exists() {
            anyhow::bail!("{} already exists", args.config.display());
        }
        config::save_default_config(&args.config)?;
        info!(path = %args.config.display(), "Wrote default configuration");
        return Ok(());
    }

    let mut config = config::load_config(&args.config)?;

    if let Some(bind) = args.bind {
        config.daemon.bind = bind;
    }
    config.validate()?;

    info!(
        web_root = %config.web.root,
        models = %config.models.path,
        "Configuration loaded"
    );

    let state = state::AppState::new(config.clone())?;

    server::run(state, &config.daemon.bind, config.daemon.tls.as_ref()).await
}

/// `RUST_LOG` when set, the `--log-level` directives otherwise
fn log_filter(cli: &str, env: Option<&str>) -> Result<EnvFilter> {
    let directives = env.filter(|d| !d.trim().is_empty()).unwrap_or(cli);
    EnvFilter::try_new(directives).with_context(|| format!("invalid log filter {:?}", directives))
}
