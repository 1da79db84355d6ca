//! One-shot arcade backend: entry point.
//!
//! Turns free-text prompts into signed game configs built from the images
//! in an asset bucket, and accepts leaderboard scores only when they carry
//! a valid, unexpired play token.

mod api;
mod config;
mod db;
mod errors;
mod issuer;
mod models;
mod planner;
mod selector;
mod signing;
mod storage;
mod validator;
mod vocab;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use reqwest::Client;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use signing::PlaySigner;
use storage::StorageClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    let pool = db::init_pool(&config.database_url).await?;

    // Outbound client for the asset listing; bounded so a slow bucket
    // cannot hang config issuance.
    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
        .build()?;

    let api_state = Arc::new(api::ApiState {
        pool,
        storage: StorageClient::new(client, &config),
        signer: PlaySigner::new(&config.score_secret),
        sprites_prefix: config.sprites_prefix.clone(),
        backgrounds_prefix: config.backgrounds_prefix.clone(),
    });

    let app = Router::new()
        .route("/health", get(api::health))
        .route("/api/one-shot", get(api::one_shot))
        .route("/api/daily", get(api::daily))
        .route("/api/score", post(api::submit_score))
        .route("/api/leaderboard", get(api::leaderboard))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(api_state);

    let addr = format!("0.0.0.0:{}", config.api_port);
    let bucket = &config.storage_bucket;
    info!("API listening on http://{addr} (bucket: {bucket})");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
