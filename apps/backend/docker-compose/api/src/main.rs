#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use axum::{Router, middleware::from_fn, routing::get};
use eduhub_api::{construct_router, schema::sync_schema, state::State};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

mod config;
mod metrics;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    metrics::init_telemetry()?;

    tracing::info!("Starting EduHub API Service");

    let config = config::Config::from_env()?;
    tracing::info!(
        port = config.port,
        payments = config.api.payment.is_some(),
        currency = %config.api.currency,
        "Loaded configuration"
    );

    let state = State::connect(
        &config.database_url,
        config.db_max_connections,
        config.api.clone(),
    )
    .await?;

    if config.run_schema_sync {
        sync_schema(&state.db).await?;
    }

    let state = Arc::new(state);

    let app = Router::new()
        .merge(construct_router(state.clone()))
        .route("/metrics", get(metrics::handler))
        .route_layer(from_fn(metrics::track_requests))
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        return;
    }
    tracing::info!("Shutdown signal received");
}
