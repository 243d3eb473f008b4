// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Clinic Desk web server
//!
//! Serves the booking pages and talks to the hosted Supabase project on
//! behalf of each browser.

use clinic_desk::{config::Config, services::SupabaseClient, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Clinic Desk");

    let backend = Arc::new(SupabaseClient::new(
        &config.supabase_url,
        &config.supabase_anon_key,
    ));
    tracing::info!(url = %config.supabase_url, "Supabase client initialized");

    let state = Arc::new(AppState::new(config.clone(), backend));

    // Evict idle browser state in the background
    let sweep_state = state.clone();
    let idle_timeout = config.client_idle_timeout;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(idle_timeout / 4);
        loop {
            interval.tick().await;
            sweep_state.clients.purge_idle(idle_timeout);
        }
    });

    // Build router
    let app = clinic_desk::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_desk=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
