use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use dicey_core::cache::ActiveMessageCache;
use serde::Serialize;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    cache: Arc<ActiveMessageCache>,
    started_at: DateTime<Utc>,
}

impl HealthState {
    pub fn new(cache: Arc<ActiveMessageCache>) -> Self {
        Self { cache, started_at: Utc::now() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub cache: HealthCheck,
    pub uptime_seconds: i64,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/healthz", get(healthz)).with_state(state)
}

pub async fn spawn(bind_address: &str, port: u16, state: HealthState) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(state)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn healthz(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let tracked = state.cache.tracked_channels();
    let payload = HealthResponse {
        status: "ok",
        service: HealthCheck {
            status: "ready",
            detail: "dicey-server runtime initialized".to_string(),
        },
        cache: HealthCheck {
            status: "ready",
            detail: format!("tracking button messages in {tracked} channels"),
        },
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}
