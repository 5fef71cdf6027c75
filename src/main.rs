// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chat Assistant API Server
//!
//! Authenticates users with Google (OAuth session or Firebase ID token) and
//! serves their profile to the frontend.

use chat_assistant_api::{
    config::{Config, DatabaseKind},
    db::UserDirectory,
    services::{IdentityVerifier, SessionStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;

    // Missing configuration aborts startup
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        auth_mode = ?config.auth_mode,
        database = ?config.database,
        "Starting chat assistant API"
    );

    let users = match config.database {
        DatabaseKind::Firestore => UserDirectory::connect(&config.gcp_project_id).await?,
        DatabaseKind::Memory => {
            tracing::warn!("Using in-memory user directory; users are lost on restart");
            UserDirectory::in_memory()
        }
    };

    let identity = IdentityVerifier::from_config(&config)?;

    let state = Arc::new(AppState {
        config: config.clone(),
        users,
        identity,
        sessions: SessionStore::default(),
    });

    let app = chat_assistant_api::routes::create_router(state);

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
                .add_directive("chat_assistant_api=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
