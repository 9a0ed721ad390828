/// What happened to one inbound message after the pipeline handled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The reply or acknowledgement reached the provider.
    Delivered,
    /// Everything up to the send succeeded; the send itself failed.
    DeliveryFailed,
    /// Processing stopped before anything was sent (storage, reply
    /// generation, or a message missing its sender).
    ProcessingFailed,
}

impl EventOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::DeliveryFailed => "delivery_failed",
            Self::ProcessingFailed => "processing_failed",
        }
    }
}

impl std::fmt::Display for EventOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
