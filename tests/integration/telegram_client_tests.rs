//! Integration tests for `TelegramClient` against a local mock Bot API.
//!
//! The mock records each request by method name and answers with canned
//! Bot API envelopes. Method names are compared case-insensitively, as the
//! Bot API itself does.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use ledger_bot::telegram::client::TelegramClient;
use ledger_bot::telegram::ChatPlatform;
use ledger_bot::AppError;
use teloxide::types::{BotCommand, InlineKeyboardButton, InlineKeyboardMarkup};

const TOKEN: &str = "123456-secret-token";

/// One call seen by the mock: lowercased method, JSON body (or `Null` for
/// multipart bodies) and the raw body text.
#[derive(Debug, Clone)]
struct Seen {
    method: String,
    body: Value,
    raw: String,
}

type Requests = Arc<Mutex<Vec<Seen>>>;

fn message_json(chat_id: &Value, message_id: i64) -> Value {
    json!({
        "message_id": message_id,
        "date": 1_700_000_000,
        "chat": { "id": chat_id, "type": "private", "first_name": "Admin" },
        "text": "ok"
    })
}

async fn bot_api(
    State(requests): State<Requests>,
    Path(method): Path<String>,
    raw: Bytes,
) -> Json<Value> {
    let method = method.to_lowercase();
    let body: Value = serde_json::from_slice(&raw).unwrap_or(Value::Null);
    requests.lock().expect("requests lock").push(Seen {
        method: method.clone(),
        body: body.clone(),
        raw: String::from_utf8_lossy(&raw).into_owned(),
    });

    let reply = match method.as_str() {
        "sendmessage" if body["chat_id"] == 403 => json!({
            "ok": false,
            "error_code": 403,
            "description": "Forbidden: bot was blocked by the user"
        }),
        "sendmessage" if body["chat_id"] == 429 => json!({
            "ok": false,
            "error_code": 429,
            "description": "Too Many Requests: retry after 5",
            "parameters": { "retry_after": 5 }
        }),
        "sendmessage" => json!({ "ok": true, "result": message_json(&body["chat_id"], 77) }),
        "editmessagetext" => json!({
            "ok": true,
            "result": message_json(&body["chat_id"], body["message_id"].as_i64().unwrap_or(0))
        }),
        "answercallbackquery" if body["callback_query_id"] == "stale" => json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: query is too old and response timeout expired or query id is invalid"
        }),
        "getwebhookinfo" => json!({
            "ok": true,
            "result": {
                "url": "https://bot.example.com/api/telegram/webhook",
                "has_custom_certificate": false,
                "pending_update_count": 2,
                "last_error_date": 1_700_000_000,
                "last_error_message": "Wrong response from the webhook: 502 Bad Gateway"
            }
        }),
        _ => json!({ "ok": true, "result": true }),
    };
    Json(reply)
}

async fn spawn_mock() -> (TelegramClient, Requests) {
    let requests: Requests = Arc::default();
    let router = Router::new()
        .route(&format!("/bot{TOKEN}/{{method}}"), post(bot_api))
        .with_state(Arc::clone(&requests));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    let client = TelegramClient::new(&format!("http://{addr}"), TOKEN, Duration::from_secs(2))
        .expect("client");
    (client, requests)
}

fn last_request(requests: &Requests) -> Seen {
    requests
        .lock()
        .expect("requests lock")
        .last()
        .cloned()
        .expect("a request was made")
}

#[tokio::test]
async fn send_message_posts_html_with_keyboard() {
    let (client, requests) = spawn_mock().await;
    let keyboard = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Approve",
        "approve:r1",
    )]]);

    let sent = client
        .send_message(100, "<b>hi</b>", Some(&keyboard))
        .await
        .expect("send");

    assert_eq!(sent.message_id, 77);
    let seen = last_request(&requests);
    assert_eq!(seen.method, "sendmessage");
    assert_eq!(seen.body["chat_id"], 100);
    assert_eq!(seen.body["text"], "<b>hi</b>");
    assert_eq!(seen.body["parse_mode"], "HTML");
    assert_eq!(
        seen.body["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
        "approve:r1"
    );
}

#[tokio::test]
async fn send_message_without_keyboard_omits_markup() {
    let (client, requests) = spawn_mock().await;

    client.send_message(100, "plain", None).await.expect("send");

    let seen = last_request(&requests);
    assert!(seen.body.get("reply_markup").is_none());
}

#[tokio::test]
async fn refused_send_surfaces_description() {
    let (client, _requests) = spawn_mock().await;

    let err = client.send_message(403, "hi", None).await.unwrap_err();

    assert!(matches!(err, AppError::Telegram(_)));
    let text = err.to_string();
    assert!(text.contains("sendMessage failed"));
    assert!(text.contains("blocked"));
}

#[tokio::test]
async fn flood_control_is_an_error() {
    let (client, _requests) = spawn_mock().await;

    let err = client.send_message(429, "hi", None).await.unwrap_err();

    assert!(matches!(err, AppError::Telegram(_)));
    assert!(err.to_string().contains("sendMessage failed"));
}

#[tokio::test]
async fn edit_with_empty_keyboard_removes_buttons() {
    let (client, requests) = spawn_mock().await;

    client
        .edit_message_text(100, 42, "done", Some(&InlineKeyboardMarkup::default()))
        .await
        .expect("edit");

    let seen = last_request(&requests);
    assert_eq!(seen.method, "editmessagetext");
    assert_eq!(seen.body["message_id"], 42);
    assert_eq!(seen.body["parse_mode"], "HTML");
    assert_eq!(seen.body["reply_markup"], json!({ "inline_keyboard": [] }));
}

#[tokio::test]
async fn answer_callback_sends_alert_flag() {
    let (client, requests) = spawn_mock().await;

    client
        .answer_callback_query("cbq-9", Some("Invalid button."), true)
        .await
        .expect("answer");

    let seen = last_request(&requests);
    assert_eq!(seen.method, "answercallbackquery");
    assert_eq!(seen.body["callback_query_id"], "cbq-9");
    assert_eq!(seen.body["text"], "Invalid button.");
    assert_eq!(seen.body["show_alert"], true);
}

#[tokio::test]
async fn stale_callback_answer_is_an_error() {
    let (client, _requests) = spawn_mock().await;

    let err = client
        .answer_callback_query("stale", None, false)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Telegram(_)));
    assert!(err.to_string().contains("query is too old"));
}

#[tokio::test]
async fn set_webhook_sends_secret_and_update_kinds() {
    let (client, requests) = spawn_mock().await;

    client
        .set_webhook("https://bot.example.com/hook", Some("s3cret"))
        .await
        .expect("set webhook");

    let seen = last_request(&requests);
    assert_eq!(seen.method, "setwebhook");
    assert!(seen.raw.contains("https://bot.example.com/hook"));
    assert!(seen.raw.contains("s3cret"));
    assert!(seen.raw.contains("callback_query"));
}

#[tokio::test]
async fn set_webhook_without_secret_omits_field() {
    let (client, requests) = spawn_mock().await;

    client
        .set_webhook("https://bot.example.com/hook", None)
        .await
        .expect("set webhook");

    assert!(!last_request(&requests).raw.contains("secret_token"));
}

#[tokio::test]
async fn set_webhook_rejects_unparsable_url_locally() {
    let (client, requests) = spawn_mock().await;

    let err = client.set_webhook("not a url", None).await.unwrap_err();

    assert!(matches!(err, AppError::Config(_)));
    assert!(requests.lock().expect("requests lock").is_empty());
}

#[tokio::test]
async fn webhook_info_is_parsed() {
    let (client, _requests) = spawn_mock().await;

    let info = client.get_webhook_info().await.expect("info");

    assert_eq!(
        info.url.as_deref(),
        Some("https://bot.example.com/api/telegram/webhook")
    );
    assert_eq!(info.pending_update_count, 2);
    assert_eq!(info.last_error_date.map(|at| at.timestamp()), Some(1_700_000_000));
    assert!(info
        .last_error_message
        .as_deref()
        .is_some_and(|m| m.contains("502")));
}

#[tokio::test]
async fn set_commands_and_delete_webhook() {
    let (client, requests) = spawn_mock().await;
    let commands = vec![BotCommand::new("queue", "List records awaiting approval")];

    client.set_my_commands(&commands).await.expect("commands");
    let seen = last_request(&requests);
    assert_eq!(seen.method, "setmycommands");
    assert_eq!(seen.body["commands"][0]["command"], "queue");

    client.delete_webhook().await.expect("delete");
    assert_eq!(last_request(&requests).method, "deletewebhook");
}

#[tokio::test]
async fn transport_error_does_not_leak_token() {
    // Bind and drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = TelegramClient::new(&format!("http://{addr}"), TOKEN, Duration::from_secs(2))
        .expect("client");
    let err = client.send_message(100, "hi", None).await.unwrap_err();

    assert!(matches!(err, AppError::Telegram(_)));
    assert!(!err.to_string().contains("secret-token"));
}

#[test]
fn empty_token_is_rejected() {
    let err = TelegramClient::new("https://api.telegram.org", "  ", Duration::from_secs(1))
        .unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn unparsable_api_url_is_rejected() {
    let err = TelegramClient::new("not a url", TOKEN, Duration::from_secs(1)).unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}
