use {parley_agents::GenerationError, parley_store::StoreError, parley_whatsapp::PayloadError};

/// A step of the per-message pipeline failed before anything was sent.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("reply generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

pub type Result<T> = std::result::Result<T, ChatError>;
