use std::sync::Arc;
use std::time::Duration;

use admin_session::middleware::{
    AdminSession, Argon2Verifier, AuthConfig, AuthService, MemorySessionStore, spawn_expiry_sweep,
};
use anyhow::{Context, Result, bail};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AuthConfig::from_env().context("Invalid auth configuration")?;

    let username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into());
    let password = match std::env::var("ADMIN_PASSWORD") {
        Ok(p) => p,
        Err(_) => {
            tracing::warn!("ADMIN_PASSWORD not set, using the default admin password");
            "admin123".into()
        }
    };
    let verifier = Argon2Verifier::new()
        .and_then(|v| v.with_account(username.clone(), &password))
        .context("Failed to hash admin password")?;

    let store = Arc::new(MemorySessionStore::new());
    let sweep_every = sweep_interval().context("Invalid SWEEP_INTERVAL_SECS")?;
    let _sweeper = spawn_expiry_sweep(store.clone(), sweep_every);

    let service = AuthService::from_shared(config, Arc::new(verifier), store);

    let admin_api = Router::new().route("/admin/api/me", get(me));

    let app = Router::new()
        .merge(service.routes())
        .merge(service.protect(admin_api));

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(%addr, admin = %username, "Admin session server listening");
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn sweep_interval() -> Result<Duration> {
    let Ok(raw) = std::env::var("SWEEP_INTERVAL_SECS") else {
        return Ok(Duration::from_secs(300));
    };
    let secs: u64 = raw.parse().with_context(|| format!("not a number: {raw:?}"))?;
    if secs == 0 {
        bail!("must be at least 1 second");
    }
    Ok(Duration::from_secs(secs))
}

async fn me(admin: AdminSession) -> Json<Value> {
    Json(json!({
        "principal": admin.principal,
        "expiresAt": admin.expires_at.unix_timestamp(),
    }))
}
