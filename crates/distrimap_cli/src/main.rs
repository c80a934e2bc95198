//! `distrimap` server executable.
//!
//! # Responsibility
//! - Resolve configuration from flags, environment and `.env`.
//! - Own process lifecycle: logging, store, HTTP server, graceful shutdown.

use anyhow::{Context, Result};
use clap::Parser;
use distrimap_api::config::{DEFAULT_DB_FILE_NAME, DEFAULT_LIMIT, MAX_LIMIT};
use distrimap_api::{build_router, AppState, ServerConfig};
use distrimap_core::db::open_db;
use distrimap_core::{core_version, default_log_level, init_logging, DEFAULT_RADIUS_KM};
use log::{error, info, warn};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::signal;

#[derive(Debug, Parser)]
#[command(name = "distrimap", version, about = "Distributeur directory HTTP server")]
struct Args {
    /// SQLite database file; created and migrated on first start.
    #[arg(long, env = "DISTRIMAP_DB_PATH", default_value = DEFAULT_DB_FILE_NAME)]
    db_path: PathBuf,

    /// Socket address to listen on.
    #[arg(long, env = "DISTRIMAP_ADDR", default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// trace|debug|info|warn|error; defaults by build mode.
    #[arg(long, env = "DISTRIMAP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rotating log files; stderr only when unset.
    #[arg(long, env = "DISTRIMAP_LOG_DIR")]
    log_dir: Option<String>,

    /// Bearer token for admin routes; admin routes are disabled when unset.
    #[arg(long, env = "DISTRIMAP_ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,

    /// Radius used when a located listing omits `radius`.
    #[arg(long, env = "DISTRIMAP_DEFAULT_RADIUS_KM", default_value_t = DEFAULT_RADIUS_KM)]
    default_radius_km: f64,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.addr,
            db_path: self.db_path,
            admin_token: self
                .admin_token
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty()),
            default_radius_km: self.default_radius_km,
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = dotenv::dotenv().ok();
    let args = Args::parse();

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    init_logging(&level, args.log_dir.as_deref())
        .map_err(anyhow::Error::msg)
        .context("failed to initialize logging")?;
    if let Some(path) = env_file {
        info!(
            "event=env_load module=cli status=ok path={}",
            path.display()
        );
    }

    let config = args.into_config();
    config.validate().context("invalid server configuration")?;
    if !config.admin_enabled() {
        warn!("event=admin_disabled module=cli status=ok reason=no_admin_token");
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open store at {}", config.db_path.display()))?;
    let state = AppState::try_new(conn, config).context("store schema check failed")?;

    serve(state.clone()).await?;

    state.close().context("failed to close store")?;
    info!("event=app_shutdown module=cli status=ok");
    Ok(())
}

async fn serve(state: AppState) -> Result<()> {
    let addr = state.config().bind_addr;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        "event=server_start module=cli status=ok addr={} version={}",
        listener.local_addr().context("listener has no local address")?,
        core_version()
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("event=server_stop module=cli status=ok");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// If no handler can be installed the server keeps running rather than
/// shutting down immediately.
async fn shutdown_signal() {
    match wait_for_signal().await {
        Ok(name) => info!("event=shutdown_signal module=cli status=ok signal={name}"),
        Err(err) => {
            error!("event=shutdown_signal module=cli status=error error={err:#}");
            std::future::pending::<()>().await;
        }
    }
}

async fn wait_for_signal() -> Result<&'static str> {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .context("failed to install Ctrl+C handler")
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res.map(|()| "SIGINT"),
        res = terminate => res.map(|()| "SIGTERM"),
    }
}
