//! WhatsApp Cloud API channel.
//!
//! Inbound: webhook payload types, the subscription handshake, and the
//! router that splits a payload into per-message events. Outbound: text
//! delivery through `POST /{phone_number_id}/messages`.

pub mod config;
pub mod error;
pub mod outbound;
pub mod types;
pub mod webhook;

pub use {
    config::WhatsAppAccountConfig,
    error::PayloadError,
    outbound::{WhatsAppOutbound, text_payload},
    types::{Contact, WebhookMessage, WebhookPayload},
    webhook::{MessageHandler, RouteOutcome, WebhookRouter, verify_webhook_subscription},
};
