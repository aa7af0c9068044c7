//! Signage Player (signage-player) - Main entry point
//!
//! Starts the scheduler loop, the render backends and the HTTP API, and
//! tears them down in order on Ctrl+C / SIGTERM.

use std::fs::OpenOptions;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signage_common::config::{
    load_toml_or_default, locate_config_file, RootFolderInitializer, RootFolderResolver,
};
use signage_player::api::{create_router, AppContext};
use signage_player::config::PlayerConfig;
use signage_player::content_store::ContentStore;
use signage_player::playback::{PlaybackEngine, Scheduler};
use signage_player::registry::SqliteRegistry;
use signage_player::render::{KioskBrowser, MpvRenderer, Renderers};
use signage_player::SharedState;

/// Command-line arguments for signage-player
#[derive(Parser, Debug)]
#[command(name = "signage-player")]
#[command(about = "Looping digital signage player")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "SIGNAGE_PORT")]
    port: Option<u16>,

    /// Root folder for database, logs and content
    #[arg(short, long, env = "SIGNAGE_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "SIGNAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Service mode: listen on all interfaces instead of localhost
    #[arg(long, env = "SIGNAGE_SERVICE")]
    service: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configuration comes first: it may name the root folder the log lives in
    let config_path = locate_config_file(args.config.as_deref());
    let mut config: PlayerConfig =
        load_toml_or_default(config_path.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.service {
        config.bind_address = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    }

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(args.root_folder.clone())
        .with_config_value(config.root_folder.clone())
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    init_tracing(&initializer.log_path())?;

    // Log build identification immediately after tracing init
    info!(
        "Starting Signage Player (signage-player) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: built-in defaults"),
    }
    info!("Root folder: {}", initializer.root().display());

    let config = Arc::new(config);
    let state = Arc::new(SharedState::new(config.event_queue_capacity));

    let registry = Arc::new(
        SqliteRegistry::connect(&initializer.database_path())
            .await
            .context("Failed to open content database")?,
    );
    let store = ContentStore::init(initializer.content_dir())
        .await
        .context("Failed to initialize content directory")?;

    // mpv serves both images and video
    let mpv = Arc::new(MpvRenderer::new(config.renderer.clone()));
    let renderers = Renderers {
        video: mpv.clone(),
        image: mpv.clone(),
        web: Arc::new(KioskBrowser::new(&config.renderer)),
    };

    let engine = PlaybackEngine::new(
        renderers,
        Arc::clone(&state),
        config.fade.to_fade(),
        config.fade.target_volume,
    );
    let scheduler = Arc::new(Scheduler::new(
        registry,
        engine,
        Arc::clone(&state),
        config.idle_backoff(),
    ));

    let shutdown = CancellationToken::new();
    let scheduler_task = scheduler.spawn(shutdown.clone());

    let app = create_router(AppContext {
        scheduler: Arc::clone(&scheduler),
        store,
        config: Arc::clone(&config),
        shutdown: shutdown.clone(),
    });

    let addr = SocketAddr::new(config.bind_address, config.port);
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let server_shutdown = shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Ends the scheduler loop and open event streams so the server can drain
            server_shutdown.cancel();
        })
        .await;

    // Teardown order: loop, then render targets, then mpv itself
    shutdown.cancel();
    if let Err(e) = scheduler_task.await {
        error!("Scheduler task failed: {}", e);
    }
    scheduler.stop().await;
    mpv.shutdown().await;

    served.context("Server error")?;
    info!("Shutdown complete");
    Ok(())
}

/// Install tracing: `RUST_LOG` filter, stdout and an appended log file
fn init_tracing(log_path: &Path) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signage_player=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
