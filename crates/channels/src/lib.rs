//! Channel-agnostic outbound contract.
//!
//! A channel (WhatsApp today) implements [`ChannelOutbound`] so the chat
//! pipeline can deliver replies without knowing the provider's wire format.

pub mod error;
pub mod event;
pub mod outbound;

pub use {
    error::DeliveryError,
    event::EventOutcome,
    outbound::{ChannelOutbound, DeliveryOutcome},
};
