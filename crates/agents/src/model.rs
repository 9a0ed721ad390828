use {async_trait::async_trait, parley_common::HistoryTurn};

use crate::GenerationError;

/// Produces the assistant's reply for a conversation.
///
/// `history` is oldest-first and already ends with the user's latest turn.
/// One upstream call per invocation; failures are returned, never retried.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Short identifier for logs (e.g. `"openai-responses"`).
    fn name(&self) -> &str;

    /// Model identifier sent upstream.
    fn id(&self) -> &str;

    async fn generate_reply(&self, history: &[HistoryTurn]) -> Result<String, GenerationError>;
}
