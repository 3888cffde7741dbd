// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use solar_dashboard::application::dashboard_service::DashboardService;
use solar_dashboard::application::history_service::HistoryService;
use solar_dashboard::application::live_channel::LiveUpdateChannel;
use solar_dashboard::infrastructure::config::load_dashboard_config;
use solar_dashboard::infrastructure::http_history::HttpHistoryService;
use solar_dashboard::infrastructure::sse_channel::SseLiveChannel;
use solar_dashboard::infrastructure::static_location::StaticLocationProvider;
use solar_dashboard::presentation::{self, app_state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_dashboard_config()?;
    config.log_config();

    // Create collaborators (infrastructure layer)
    let history = config.history.base_url.clone().map(|url| {
        Arc::new(HttpHistoryService::new(url)) as Arc<dyn HistoryService>
    });
    if history.is_none() {
        tracing::warn!("history.base_url is not set; every reload will fail");
    }
    let live = config.live.url.clone().map(|url| {
        let mut channel = SseLiveChannel::new(url);
        if let Some(secs) = config.live.connect_timeout_secs {
            channel = channel.with_connect_timeout(Duration::from_secs(secs));
        }
        Arc::new(channel) as Arc<dyn LiveUpdateChannel>
    });
    let location = Arc::new(StaticLocationProvider::from_settings(&config.location));

    // Start the dashboard (application layer)
    let service = DashboardService::new(history, live, location, config.sync.to_options());
    let (dashboard, dashboard_task) = service.spawn();

    // Build router (presentation layer)
    let control = dashboard.clone();
    let router = presentation::router(Arc::new(AppState { dashboard }));

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid server.bind address: {}", config.server.bind))?;
    tracing::info!("Starting solar dashboard on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Ends open snapshot streams so the server can drain
            if let Err(e) = control.shutdown().await {
                tracing::warn!("Dashboard already stopped: {}", e);
            }
        })
        .await?;

    // The dashboard task has released its live-update subscription
    dashboard_task.await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
