//! Gateway HTTP server: per-tenant callback endpoints and a health probe.

use crate::answer::AnswerClient;
use crate::config::{Config, TenantConfig, TenantMap};
use crate::line::{self, LineClient, SignatureError};
use crate::router;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Per-tenant request state: the frozen config plus the clients owned for the
/// process lifetime. Cloned per request; everything inside is shared.
#[derive(Clone)]
pub struct TenantState {
    pub name: String,
    pub tenant: Arc<TenantConfig>,
    pub line: Arc<LineClient>,
    pub answers: AnswerClient,
}

/// Build the router: one callback route per tenant plus a health probe.
///
/// A tenant whose reply client cannot be constructed is skipped with a warning;
/// the remaining tenants still get endpoints.
pub fn build_app(tenants: &TenantMap) -> Router {
    let mut app = Router::new();
    let mut registered = 0usize;
    for (name, tenant) in tenants {
        let client = match LineClient::new(&tenant.delivery_token) {
            Ok(client) => client,
            Err(e) => {
                log::warn!("{}: reply client unavailable, endpoint skipped: {}", name, e);
                continue;
            }
        };
        let state = TenantState {
            name: name.clone(),
            tenant: Arc::new(tenant.clone()),
            line: Arc::new(client),
            answers: AnswerClient::new(Duration::from_secs(tenant.api_timeout_secs)),
        };
        let path = format!("/{}/callback", name);
        app = app.route(&path, post(tenant_callback).with_state(state));
        registered += 1;
        log::debug!("registered callback handler at {}", path);
    }
    log::info!("registered {} callback endpoint(s)", registered);

    let tenant_count = registered;
    app.route(
        "/",
        get(move || async move {
            Json(json!({ "runtime": "running", "tenants": tenant_count }))
        }),
    )
}

/// POST /{tenant}/callback — verify the signature, parse events, route replies.
///
/// 400 for a bad or missing signature, 500 for any other verification or parse
/// failure, 200 otherwise. Per-event failures never change the response code.
async fn tenant_callback(
    State(state): State<TenantState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = headers
        .get(line::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    if let Err(e) = line::verify_signature(&state.tenant.signing_secret, signature, &body) {
        return match e {
            SignatureError::Missing | SignatureError::Invalid => {
                log::debug!("{}: rejected callback: {}", state.name, e);
                StatusCode::BAD_REQUEST
            }
            SignatureError::Internal(msg) => {
                log::warn!("{}: signature verification failed: {}", state.name, msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
    }

    // The signature authenticated the platform as sender, so a body that does
    // not parse is an infrastructure fault, not a bad request.
    let envelope = match line::parse_envelope(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            log::warn!("{}: authenticated payload did not parse: {}", state.name, e);
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    router::route_events(
        &state.name,
        &state.tenant,
        &state.answers,
        state.line.as_ref(),
        &envelope.events,
    )
    .await;
    StatusCode::OK
}

/// Run the gateway until SIGINT or SIGTERM.
pub async fn run_gateway(config: Config, tenants: TenantMap) -> Result<()> {
    let app = build_app(&tenants);
    let bind_addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}
