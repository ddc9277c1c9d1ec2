//! Claim Machinery REST API Server
//!
//! Loads the template catalog once at startup and serves it over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! # Directory only
//! cargo run --bin claim_machinery_server -- --templates-dir templates
//!
//! # Directory plus profile (profile wins on name collisions)
//! TEMPLATE_PROFILE_PATH=profile.yaml cargo run --bin claim_machinery_server
//!
//! curl http://localhost:8080/api/v1/claim-templates
//! curl -X POST http://localhost:8080/api/v1/claim-templates/volumeclaim/order \
//!   -H "Content-Type: application/json" \
//!   -d '{"parameters": {"namespace": "test"}}'
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use claim_machinery::api::{create_router, AppState};
use claim_machinery::config::{default_log_filter, Settings};
use claim_machinery::{Catalog, KclRenderer};

#[derive(Parser)]
#[command(name = "claim_machinery_server")]
#[command(about = "Serve claim templates and render them with KCL")]
struct Cli {
    /// Path to templates directory
    #[arg(long, env = "TEMPLATES_DIR")]
    templates_dir: Option<PathBuf>,

    /// Path to template profile YAML
    #[arg(long = "template-profile-path", env = "TEMPLATE_PROFILE_PATH")]
    profile_path: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// KCL binary used for rendering
    #[arg(long, env = "KCL_BIN")]
    kcl_bin: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut settings = Settings::from_env();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter().into()),
        )
        .init();

    if let Some(dir) = cli.templates_dir {
        settings.catalog.templates_dir = dir;
    }
    if let Some(profile) = cli.profile_path {
        settings.catalog.profile_path = Some(profile);
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }
    if let Some(bin) = cli.kcl_bin {
        settings.render.kcl_binary = bin;
    }

    tracing::info!("Claim Machinery API starting");

    let build = Catalog::build(&settings.catalog)
        .await
        .context("failed to build template catalog")?;

    let state = AppState::new(build.catalog, KclRenderer::from_settings(&settings.render));
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
