//! # Authgate API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::num::NonZeroU32;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use authgate_infra::RequestThrottle;

mod background;
mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use config::AppConfig;
use middleware::cors;
use middleware::throttle::ThrottleMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env()?;

    tracing::info!(
        "Starting Authgate API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::build(&config).await?;

    let throttle = NonZeroU32::new(config.throttle_per_minute)
        .map(|per_minute| Arc::new(RequestThrottle::new(per_minute)));
    match &throttle {
        Some(t) => tracing::info!(per_minute = t.per_minute(), "Request throttle enabled"),
        None => tracing::warn!("Request throttle disabled"),
    }

    #[cfg(feature = "scheduler")]
    let mut scheduler = start_scheduler(&config, &state, throttle.clone()).await?;

    let server_state = state.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(ThrottleMiddleware::new(throttle.clone()))
            .wrap(TracingLogger::default())
            .wrap(cors::cors_headers())
            .app_data(web::Data::new(server_state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    #[cfg(feature = "scheduler")]
    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }

    Ok(())
}

#[cfg(feature = "scheduler")]
async fn start_scheduler(
    config: &AppConfig,
    state: &AppState,
    throttle: Option<Arc<RequestThrottle>>,
) -> anyhow::Result<Option<background::scheduler::MaintenanceScheduler>> {
    use authgate_core::ports::SystemClock;
    use background::scheduler::{MaintenanceScheduler, THROTTLE_PRUNE_CRON, enabled_from_env};

    if !enabled_from_env() {
        tracing::info!("Maintenance scheduler disabled");
        return Ok(None);
    }

    let mut scheduler = MaintenanceScheduler::new().await?;
    scheduler
        .register_compaction(
            &config.compaction.cron,
            state.gateway.ledger().clone(),
            Arc::new(SystemClock),
            config.compaction.retention,
        )
        .await?;

    if let Some(throttle) = throttle {
        scheduler
            .register_throttle_prune(THROTTLE_PRUNE_CRON, throttle)
            .await?;
    }

    scheduler.start().await?;
    Ok(Some(scheduler))
}
