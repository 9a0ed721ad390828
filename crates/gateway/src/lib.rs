//! HTTP surface: the WhatsApp webhook endpoints and a health check.

pub mod server;
pub mod state;
pub mod webhook_routes;
