//! LLM provider abstractions and implementations
//!
//! This module provides the interface used to talk to a chat-completion
//! endpoint, the OpenAI-compatible implementation, and its error type.

pub mod errors;
pub mod openai;
pub mod provider;
pub mod types;

pub use errors::*;
pub use provider::*;
pub use types::*;
