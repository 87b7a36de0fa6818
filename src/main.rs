//! Alt Tong: Accept-Language switching forward proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client (browser with proxy set)
//!         │
//!         ▼
//!   ┌─────────────┐   ┌─────────────────┐   ┌──────────────┐
//!   │ http proxy  │──▶│ WebRequestHub   │──▶│  upstream    │
//!   │ (absolute   │   │ defaults + hooks│   │  origin      │
//!   │  form)      │   └────────▲────────┘   └──────────────┘
//!   └─────────────┘            │ Accept-Language rewrite
//!                      ┌───────┴────────┐   ┌──────────────┐
//!   admin API / CLI ──▶│  AltTong       │──▶│ menu board   │
//!                      │  controller    │   │ storage      │
//!                      └────────────────┘   └──────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use alt_tong::admin::{setup_admin_router, AdminState};
use alt_tong::config::loader::load_or_default;
use alt_tong::http::ProxyServer;
use alt_tong::lifecycle::{build_services, signals, Shutdown};
use alt_tong::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "alt-tong")]
#[command(about = "Forward proxy that switches the Accept-Language header", long_about = None)]
struct Args {
    /// Path to the TOML config file; defaults apply when it is missing.
    #[arg(short, long, default_value = "alt-tong.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(&args.config)?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "alt-tong starting");
    tracing::info!(
        proxy_address = %config.listener.bind_address,
        admin_address = %config.admin.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let services = build_services(&config)?;
    let shutdown = Shutdown::new();

    let proxy_listener = TcpListener::bind(&config.listener.bind_address).await?;
    let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;

    let proxy = ProxyServer::new(&config, services.hub.clone());
    let proxy_task = tokio::spawn(proxy.run(proxy_listener, shutdown.subscribe()));

    let admin_router = setup_admin_router(AdminState {
        alt: services.alt.clone(),
        api_key: config.admin.api_key.clone(),
    });
    let mut admin_shutdown = shutdown.subscribe();
    let admin_task = tokio::spawn(async move {
        tracing::info!(address = ?admin_listener.local_addr().ok(), "Admin API listening");
        axum::serve(admin_listener, admin_router)
            .with_graceful_shutdown(async move {
                let _ = admin_shutdown.recv().await;
            })
            .await
    });

    // Listeners are up, so the probe can go through the hub.
    let alt = services.alt.clone();
    tokio::spawn(async move {
        let report = alt.configure(None).await;
        if !report.errors.is_empty() {
            tracing::warn!(errors = ?report.errors, "Initial configuration incomplete");
        }
    });

    signals::shutdown_on_signal(&shutdown).await;

    proxy_task.await??;
    admin_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
