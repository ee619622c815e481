// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use tower_http::trace::TraceLayer;

use crate::application::plan_repository::MaintenancePlanRepository;
use crate::application::schedule_service::MaintenanceScheduleService;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::memory_repository::InMemoryPlanRepository;
use crate::infrastructure::rest_repository::RestPlanRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (RUST_LOG controls the filter)
    tracing_subscriber::fmt::init();

    // Load configuration
    let app_config = load_app_config().context("Failed to load configuration")?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn MaintenancePlanRepository> = match app_config.backend.base_url {
        Some(base_url) => {
            tracing::info!("Persisting maintenance plans to {}", base_url);
            Arc::new(RestPlanRepository::new(base_url, app_config.backend.token))
        }
        None => {
            tracing::warn!("No backend.base_url configured, keeping maintenance plans in memory");
            Arc::new(InMemoryPlanRepository::new())
        }
    };

    // Create services (application layer)
    let schedule_service =
        MaintenanceScheduleService::new(repository, app_config.schedule.projection());

    // Create application state
    let state = Arc::new(AppState { schedule_service });

    // Build router (presentation layer)
    let router = router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = app_config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", app_config.server.bind_addr))?;
    tracing::info!("Starting maintenance-scheduler service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
