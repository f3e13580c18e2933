/*
 * Responsibility
 * - Load Config → logging → build the verifier singleton + authorizer → assemble the Router
 * - Apply HTTP middleware
 * - axum::serve()
 */
use std::{panic, process, sync::Arc, time::Duration};

use anyhow::Result;
use axum::Router;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::authorizer::Authorizer;
use crate::config::{AppEnv, Config, LogFormat};
use crate::middleware;
use crate::services::verifier::build_verifier;
use crate::state::AppState;

fn init_tracing(format: LogFormat) {
    // RUST_LOG wins, e.g. RUST_LOG=info,api_authorizer=debug,tower_http=debug
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,api_authorizer=info,tower_http=warn"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

/// Panics inside request tasks are logged with their origin. Development builds abort so the
/// failure cannot go unnoticed; production keeps serving other requests.
fn init_panic_hook(app_env: AppEnv) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");

        tracing::error!(%location, panic_message = message, "panic");

        if app_env.is_production() {
            default_hook(info);
        } else {
            process::abort();
        }
    }))
}

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;

    init_tracing(config.log_format);
    init_panic_hook(config.app_env);

    tracing::info!(
        env = ?config.app_env,
        addr = %config.addr,
        issuer = %config.issuer(),
        clients = config.client_ids.len(),
        token_use = %config.token_use,
        request_timeout_ms = config.request_timeout.as_millis() as u64,
        "starting authorizer"
    );

    let state = build_state(&config).await?;
    let app = build_router(state, config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the shared state. An unreachable key endpoint is logged and does not fail startup;
/// keys are fetched again on first use.
pub async fn build_state(config: &Config) -> Result<AppState> {
    // One verifier per process: its key cache is shared by every request.
    let verifier = build_verifier(config)?;

    match verifier.hydrate().await {
        Ok(keys) => tracing::info!(keys, "signing keys loaded"),
        Err(err) => tracing::warn!(error = %err, "could not prefetch signing keys"),
    }

    let authorizer = Arc::new(Authorizer::new(verifier));
    Ok(AppState::new(authorizer))
}

pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes())
        .with_state(state);

    middleware::http::apply(router, request_timeout)
}
