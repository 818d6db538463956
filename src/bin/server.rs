use std::sync::Arc;

use anyhow::Context;
use arena_tactician_server::arena_protocol::{answer_tick, PayloadShape};
use arena_tactician_server::config::{parse_port, EngineConfig};
use arena_tactician_server::engine::TacticalEngine;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rand::Rng;
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// One engine per process; the lock spans a whole tick.
type SharedEngine = Arc<Mutex<TacticalEngine>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let port = parse_port(std::env::var("PORT").ok().as_deref());
    let config = EngineConfig::from_env(rand::rng().random());
    info!(
        port,
        lane_policy = ?config.lane_policy,
        escape_hit_threshold = config.escape_hit_threshold,
        seed = config.seed,
        "engine configured"
    );

    let state: SharedEngine = Arc::new(Mutex::new(TacticalEngine::new(config)));
    let app = build_router(state);

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind server socket on {bind_addr}"))?;

    info!("listening on :{port}");
    axum::serve(listener, app)
        .await
        .context("server runtime failed")?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            let legacy = std::env::var("LOGLEVEL").unwrap_or_else(|_| "info".to_string());
            EnvFilter::try_new(legacy.to_ascii_lowercase())
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_router(state: SharedEngine) -> Router {
    Router::new()
        .route("/", get(index).post(move_handler))
        .route("/healthz", get(healthz))
        .route("/reset", post(reset_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> &'static str {
    "Let the battle begin!"
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn reset_handler(State(state): State<SharedEngine>) -> impl IntoResponse {
    state.lock().await.reset();
    info!("match state reset");
    Json(json!({ "ok": true }))
}

async fn move_handler(State(state): State<SharedEngine>, body: String) -> Response {
    let mut guard = state.lock().await;
    match answer_tick(&mut guard, &body) {
        Ok(answer) => {
            let code = answer.decision.code;
            debug!(shape = ?answer.shape, rule = ?answer.decision.rule, %code, "tick answered");
            match answer.shape {
                PayloadShape::Arena => code.as_str().into_response(),
                PayloadShape::Flat => Json(json!({ "move": code.as_str() })).into_response(),
            }
        }
        Err(error) => {
            warn!(%error, "tick rejected");
            (StatusCode::UNPROCESSABLE_ENTITY, error.to_string()).into_response()
        }
    }
}
