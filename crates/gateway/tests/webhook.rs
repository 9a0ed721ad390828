//! Integration tests for the webhook endpoints.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use {
    async_trait::async_trait,
    parley_channels::EventOutcome,
    parley_config::ParleyConfig,
    parley_gateway::{
        server::{build_gateway_app, prepare_gateway},
        state::GatewayState,
    },
    parley_whatsapp::{Contact, MessageHandler, WebhookMessage, WebhookRouter},
    secrecy::Secret,
    serde_json::json,
    tokio::net::TcpListener,
};

/// Records the sender of every message the router hands over.
#[derive(Default)]
struct RecordingHandler {
    seen: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl MessageHandler for RecordingHandler {
    async fn handle(&self, message: &WebhookMessage, _contacts: &[Contact]) -> EventOutcome {
        self.seen.lock().unwrap().push(message.from.clone());
        EventOutcome::Delivered
    }
}

async fn serve(state: Arc<GatewayState>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_gateway_app(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn start_recording_server() -> (SocketAddr, Arc<RecordingHandler>) {
    let handler = Arc::new(RecordingHandler::default());
    let router = WebhookRouter::new(handler.clone());
    let state = Arc::new(GatewayState::new(router, Secret::new("verify-me".into())));
    (serve(state).await, handler)
}

fn text_payload(from: &str, body: &str) -> serde_json::Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": {"display_phone_number": "15550000000", "phone_number_id": "1234567890"},
                    "contacts": [{"wa_id": from, "profile": {"name": "Alice"}}],
                    "messages": [{
                        "from": from,
                        "id": "wamid.in",
                        "timestamp": "1700000000",
                        "type": "text",
                        "text": {"body": body}
                    }]
                }
            }]
        }]
    })
}

#[tokio::test]
async fn health_reports_version() {
    let (addr, _) = start_recording_server().await;
    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn handshake_echoes_challenge_for_matching_token() {
    let (addr, _) = start_recording_server().await;
    let resp = reqwest::get(format!(
        "http://{addr}/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=1158201444"
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "1158201444");
}

#[tokio::test]
async fn handshake_rejects_wrong_token_or_mode() {
    let (addr, _) = start_recording_server().await;
    for query in [
        "hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1",
        "hub.mode=unsubscribe&hub.verify_token=verify-me&hub.challenge=1",
        "hub.mode=subscribe&hub.verify_token=verify-me",
        "",
    ] {
        let resp = reqwest::get(format!("http://{addr}/webhook?{query}"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 403, "query: {query}");
    }
}

#[tokio::test]
async fn garbage_body_is_still_acknowledged() {
    let (addr, handler) = start_recording_server().await;
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/webhook"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok"}));
    assert!(handler.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn message_payload_is_routed() {
    let (addr, handler) = start_recording_server().await;
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/webhook"))
        .json(&text_payload("15551234", "Hi"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(*handler.seen.lock().unwrap(), vec![Some(
        "15551234".to_string()
    )]);
}

#[tokio::test]
async fn foreign_object_is_acknowledged_and_ignored() {
    let (addr, handler) = start_recording_server().await;
    let mut payload = text_payload("15551234", "Hi");
    payload["object"] = json!("instagram");

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/webhook"))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert!(handler.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn text_message_round_trip_through_providers() {
    let mut openai = mockito::Server::new_async().await;
    let generate = openai
        .mock("POST", "/responses")
        .match_header("authorization", "Bearer sk-test")
        .match_body(mockito::Matcher::PartialJson(json!({
            "model": "gpt-4o-mini",
            "input": [{"role": "user", "content": "Hi"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "output": [{
                    "type": "message",
                    "role": "assistant",
                    "content": [{"type": "output_text", "text": "Hello! How can I help?"}]
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let mut whatsapp = mockito::Server::new_async().await;
    let send = whatsapp
        .mock("POST", "/1234567890/messages")
        .match_header("authorization", "Bearer wa-token")
        .match_body(mockito::Matcher::Json(json!({
            "messaging_product": "whatsapp",
            "to": "15551234",
            "type": "text",
            "text": {"body": "Hello! How can I help?"}
        })))
        .with_status(200)
        .with_body(r#"{"messages":[{"id":"wamid.out"}]}"#)
        .create_async()
        .await;

    let mut config = ParleyConfig::default();
    config.whatsapp.token = Some(Secret::new("wa-token".into()));
    config.whatsapp.api_url = Some(whatsapp.url());
    config.whatsapp.phone_number_id = Some("1234567890".into());
    config.whatsapp.verify_token = Some(Secret::new("verify-me".into()));
    config.openai.api_key = Some(Secret::new("sk-test".into()));
    config.openai.base_url = openai.url();
    config.openai.vector_store_id = Some("vs_kb".into());
    config.database.url = Some("sqlite::memory:".into());
    config.database.max_connections = 1;

    let state = prepare_gateway(&config).await.unwrap();
    let addr = serve(state).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/webhook"))
        .json(&text_payload("15551234", "Hi"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    generate.assert_async().await;
    send.assert_async().await;
}

#[tokio::test]
async fn provider_failure_is_still_acknowledged() {
    let mut openai = mockito::Server::new_async().await;
    let _generate = openai
        .mock("POST", "/responses")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let mut whatsapp = mockito::Server::new_async().await;
    let send = whatsapp
        .mock("POST", "/1234567890/messages")
        .expect(0)
        .create_async()
        .await;

    let mut config = ParleyConfig::default();
    config.whatsapp.token = Some(Secret::new("wa-token".into()));
    config.whatsapp.api_url = Some(whatsapp.url());
    config.whatsapp.phone_number_id = Some("1234567890".into());
    config.whatsapp.verify_token = Some(Secret::new("verify-me".into()));
    config.openai.api_key = Some(Secret::new("sk-test".into()));
    config.openai.base_url = openai.url();
    config.openai.vector_store_id = Some("vs_kb".into());
    config.database.url = Some("sqlite::memory:".into());
    config.database.max_connections = 1;

    let addr = serve(prepare_gateway(&config).await.unwrap()).await;
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/webhook"))
        .json(&text_payload("15551234", "Hi"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    send.assert_async().await;
}
