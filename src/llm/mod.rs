// LLM access layer

pub mod client;
pub mod prompt;

pub use client::{CompletionClient, CompletionReply, CompletionRequest};
pub use prompt::SYSTEM_INSTRUCTION;
