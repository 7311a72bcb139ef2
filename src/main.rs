mod config;
mod db;
mod domain;
mod error;
mod services;
mod state;
mod web;

use crate::config::Config;
use crate::db::supabase::SupabaseClient;
use crate::services::lifecycle::ChecklistManager;
use crate::services::transcription::WhisperTranscriber;
use crate::state::{AppState, SharedState};
use anyhow::Context;
use axum::Router;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Supabase and OpenAI credentials are required")?;
    tracing::info!(
        "Using Supabase at {} (table {}, bucket {})",
        config.supabase_url,
        config.table,
        config.bucket
    );

    let supabase = Arc::new(SupabaseClient::new(&config));
    let transcriber = Arc::new(WhisperTranscriber::new(config.openai_api_key.clone()));

    let shared: SharedState = Arc::new(AppState {
        manager: RwLock::new(ChecklistManager::new(supabase.clone())),
        blobs: supabase,
        transcriber,
        language: config.transcription_language.clone(),
    });

    let app = Router::new()
        .merge(web::routes(shared))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
