//! HTTP surface: the Telegram webhook, its admin views, health, and the
//! announcement hand-off used by the host application.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::models::record::FinancialRecord;
use crate::models::supply::SupplyRequest;
use crate::state::AppState;
use crate::telegram::events;
use crate::telegram::format;
use crate::telegram::notifier::Notification;
use crate::telegram::update;
use crate::{AppError, Result};

/// Header Telegram uses to echo the webhook secret.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Build the router for `state`. The `/notify/*` routes are mounted only
/// when a notify token is configured.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    let webhook_path = state.config.telegram.webhook_path.clone();
    let mut router = Router::new()
        .route(&webhook_path, post(receive_update).get(webhook_admin))
        .route("/health", get(health));

    if state.config.notify_token.is_some() {
        router = router
            .route("/notify/transaction", post(notify_transaction))
            .route("/notify/supply", post(notify_supply));
    } else {
        info!("notify token not configured; /notify routes disabled");
    }

    router.with_state(state)
}

/// Bind `bind_address:http_port` and serve until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Config` if the address is invalid or cannot be bound.
pub async fn serve(state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let addr = format!("{}:{}", state.config.bind_address, state.config.http_port);
    let bind: SocketAddr = addr
        .parse()
        .map_err(|err| AppError::Config(format!("invalid bind address {addr}: {err}")))?;
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind {bind}: {err}")))?;

    serve_listener(listener, state, ct).await
}

/// Serve on an already-bound listener until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Io` if the server fails while running.
pub async fn serve_listener(
    listener: TcpListener,
    state: Arc<AppState>,
    ct: CancellationToken,
) -> Result<()> {
    let local = listener.local_addr()?;
    info!(
        %local,
        webhook_path = %state.config.telegram.webhook_path,
        "starting webhook server"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await?;

    info!("webhook server shut down");
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn error_reply(err: &AppError) -> Response {
    let status = match err {
        AppError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Db(_) => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Telegram(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    reply(status, json!({ "ok": false, "error": err.to_string() }))
}

// ── Webhook ─────────────────────────────────────────────────────────

fn secret_matches(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(expected) = state.config.telegram.webhook_secret.as_deref() else {
        return true;
    };
    headers
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|given| given == expected)
}

async fn receive_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !secret_matches(&state, &headers) {
        warn!("webhook call with missing or wrong secret token");
        return reply(StatusCode::UNAUTHORIZED, json!({ "ok": false }));
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(%err, "webhook body is not JSON");
            return reply(StatusCode::BAD_REQUEST, json!({ "ok": false }));
        }
    };

    events::handle_update(&state, update::classify(&payload)).await;
    reply(StatusCode::OK, json!({ "ok": true }))
}

#[derive(Debug, Deserialize)]
struct WebhookAdminQuery {
    #[serde(default)]
    set: Option<String>,
}

impl WebhookAdminQuery {
    fn wants_registration(&self) -> bool {
        matches!(self.set.as_deref(), Some("1" | "true" | "yes"))
    }
}

async fn webhook_admin(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WebhookAdminQuery>,
) -> Response {
    let expected = state.config.telegram.webhook_url();

    if query.wants_registration() {
        let report = state
            .notifier
            .register(&expected, state.config.telegram.webhook_secret.as_deref())
            .await;
        info!(
            webhook_url = %report.webhook_url,
            webhook_ok = report.telegram.ok,
            menu_ok = report.menu.ok,
            "webhook registration requested"
        );
        return reply(
            StatusCode::OK,
            json!({
                "ok": report.ok(),
                "webhookUrl": report.webhook_url,
                "telegram": report.telegram,
                "menu": report.menu,
            }),
        );
    }

    match state.notifier.webhook_status().await {
        Ok(info) => {
            let webhook_set = info.url.as_deref() == Some(expected.as_str());
            let hint = if webhook_set {
                "Webhook is registered.".to_owned()
            } else {
                format!(
                    "Open {}?set=1 to register {expected}",
                    state.config.telegram.webhook_path
                )
            };
            let mut body = json!({
                "ok": true,
                "webhookSet": webhook_set,
                "webhookUrl": info.url,
                "hint": hint,
            });
            if info.pending_update_count > 0 {
                body["pendingUpdateCount"] = json!(info.pending_update_count);
            }
            if let Some(message) = info.last_error_message {
                body["lastErrorMessage"] = json!(message);
            }
            reply(StatusCode::OK, body)
        }
        Err(err) => {
            warn!(%err, "webhook status query failed");
            error_reply(&err)
        }
    }
}

// ── Announcements ───────────────────────────────────────────────────

fn bearer_matches(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(expected) = state.config.notify_token.as_deref() else {
        return false;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|given| given.trim() == expected)
}

async fn announce(state: &AppState, notification: Notification) -> Response {
    let chat_ids = state.admins.chat_ids();
    match state.notifier.send_structured(&chat_ids, &notification).await {
        Ok(report) => reply(
            StatusCode::OK,
            json!({
                "ok": report.is_complete(),
                "delivered": report.delivered,
                "failed": report.failed,
            }),
        ),
        Err(err) => {
            warn!(%err, "announcement rejected");
            error_reply(&err)
        }
    }
}

async fn notify_transaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(record): Json<FinancialRecord>,
) -> Response {
    if !bearer_matches(&state, &headers) {
        warn!("notify call with missing or wrong bearer token");
        return error_reply(&AppError::Unauthorized("invalid notify token".into()));
    }

    // A pending record nobody can press a button for must not be stored.
    if record.is_pending() {
        if let Err(err) = format::approval_keyboard(&record.id) {
            let err = AppError::from(err);
            warn!(%err, record_id = %record.id, "refusing unannounceable record");
            return error_reply(&err);
        }
    }

    let stored = match state
        .with_store_timeout(state.store.insert_record(record))
        .await
    {
        Ok(stored) => stored,
        Err(err) => {
            warn!(%err, "failed to store announced record");
            return error_reply(&err);
        }
    };

    info!(record_id = %stored.id, status = %stored.approval_status, "announcing transaction");
    announce(&state, Notification::Transaction(stored)).await
}

async fn notify_supply(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<SupplyRequest>,
) -> Response {
    if !bearer_matches(&state, &headers) {
        warn!("notify call with missing or wrong bearer token");
        return error_reply(&AppError::Unauthorized("invalid notify token".into()));
    }

    info!(request_id = %request.id, items = request.items.len(), "announcing supply request");
    announce(&state, Notification::Supply(request)).await
}
