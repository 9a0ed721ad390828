//! Per-message conversation pipeline: persist the inbound message, produce
//! a reply or acknowledgement, persist it, send it.

pub mod error;
pub mod orchestrator;

pub use {
    error::ChatError,
    orchestrator::{ConversationOrchestrator, acknowledgement},
};
