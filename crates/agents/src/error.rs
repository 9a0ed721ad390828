/// Reply generation failed; no reply text is available.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("LLM request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LLM API error HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode LLM response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("LLM response contained no output text")]
    EmptyOutput,

    #[error("{setting} is not configured")]
    NotConfigured { setting: &'static str },
}
