//! Conversation session handling
//!
//! This module holds the in-memory turn sequence, builds the outbound prompt
//! from a trailing window of turns, and tracks the single outstanding request.

mod conversation;
mod prompt;
mod turn;

pub use conversation::*;
pub use turn::*;
