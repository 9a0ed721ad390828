use async_trait::async_trait;

use crate::DeliveryError;

/// Result of one outbound send attempt.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// The provider accepted the message. Carries its JSON response
    /// (message ids and the like).
    Delivered(serde_json::Value),
    /// The attempt failed; already logged by the sender.
    Failed(DeliveryError),
}

impl DeliveryOutcome {
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }

    #[must_use]
    pub fn error(&self) -> Option<&DeliveryError> {
        match self {
            Self::Delivered(_) => None,
            Self::Failed(e) => Some(e),
        }
    }
}

/// Send messages to a channel.
///
/// Exactly one provider call per invocation, no retries. Failures come back
/// as [`DeliveryOutcome::Failed`], never as a panic or an `Err`.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    async fn send_text(&self, to: &str, text: &str) -> DeliveryOutcome;
}
