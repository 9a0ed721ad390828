/// Why a single outbound send did not reach the provider successfully.
///
/// Delivery errors are never propagated as `Err`: they are logged where the
/// send happens and travel back inside [`crate::DeliveryOutcome::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The provider answered with a non-2xx status. `body` is the raw
    /// response text, usually a JSON error object.
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider answered 2xx with a body that is not JSON.
    #[error("provider returned a non-JSON success body: {source}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// The request never completed (connect failure, timeout, broken body).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl DeliveryError {
    /// The provider's error body, when there is one.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } | Self::Decode { body, .. } => Some(body),
            Self::Transport(_) => None,
        }
    }
}
