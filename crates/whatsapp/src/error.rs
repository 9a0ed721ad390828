/// Inbound payload could not be interpreted.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The payload claims to be a WhatsApp Business webhook but its shape
    /// does not decode.
    #[error("malformed webhook payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A single message inside an otherwise valid payload does not decode.
    #[error("malformed webhook message: {0}")]
    InvalidMessage(#[source] serde_json::Error),

    /// A single message lacks a field the pipeline cannot do without.
    #[error("webhook message is missing `{field}`")]
    MissingField { field: &'static str },
}

impl PayloadError {
    #[must_use]
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }
}
