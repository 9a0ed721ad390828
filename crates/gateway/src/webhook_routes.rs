use {
    axum::{
        Json, Router,
        body::Bytes,
        extract::{Query, State},
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::get,
    },
    parley_channels::EventOutcome,
    parley_whatsapp::{RouteOutcome, verify_webhook_subscription},
    serde::Deserialize,
    tracing::{debug, info, trace, warn},
};

use crate::server::AppState;

/// `GET /webhook` (subscription handshake) and `POST /webhook` (events).
pub fn webhook_router() -> Router<AppState> {
    Router::new().route("/webhook", get(verify_handler).post(receive_handler))
}

/// Query string Meta sends when (re)subscribing the webhook.
#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

async fn verify_handler(
    State(state): State<AppState>,
    Query(query): Query<SubscriptionQuery>,
) -> Response {
    match verify_webhook_subscription(
        query.mode.as_deref(),
        query.verify_token.as_deref(),
        query.challenge.as_deref(),
        state.gateway.verify_token(),
    ) {
        Some(challenge) => {
            info!("webhook subscription verified");
            (StatusCode::OK, challenge).into_response()
        },
        None => {
            warn!(mode = ?query.mode, "webhook verification failed");
            (StatusCode::FORBIDDEN, "Verification failed").into_response()
        },
    }
}

/// Always acknowledges with `200 {"status":"ok"}`; failures are only logged
/// so the provider never retries on our account.
async fn receive_handler(State(state): State<AppState>, body: Bytes) -> Json<serde_json::Value> {
    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, bytes = body.len(), "webhook body is not valid JSON");
            return ack();
        },
    };
    trace!(%payload, "webhook payload");

    match state.gateway.router.route(payload).await {
        RouteOutcome::Ignored => debug!("webhook ignored"),
        RouteOutcome::Malformed(_) => {},
        RouteOutcome::Processed(events) => {
            let delivered = events
                .iter()
                .filter(|e| **e == EventOutcome::Delivered)
                .count();
            info!(events = events.len(), delivered, "webhook processed");
        },
    }
    ack()
}

fn ack() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
