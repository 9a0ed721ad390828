//! Reply generation: turn a conversation history into the assistant's
//! next message.

pub mod error;
pub mod model;
pub mod providers;

pub use {
    error::GenerationError,
    model::ReplyGenerator,
    providers::openai_responses::OpenAiResponsesGenerator,
};
