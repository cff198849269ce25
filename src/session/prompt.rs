//! Outbound prompt construction
//!
//! Prior turns are flattened into one user message rather than sent as
//! separate structured messages. Changing that would change what context the
//! remote model sees, so the flat form is kept.

use crate::llm::{ChatRequest, Message};
use crate::session::Turn;

/// System instruction sent ahead of every prompt
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant. Format every answer as GitHub-flavored Markdown. \
Put code in fenced code blocks and tag each block with its language, for example ```rust.";

/// Build the prompt for `user_text` from the last `history_window` turns of `prior`.
///
/// `prior` must be the sequence as it was before the new user turn was appended.
pub fn build_prompt(prior: &[Turn], history_window: usize, user_text: &str) -> String {
    if history_window == 0 || prior.is_empty() {
        return user_text.to_string();
    }

    let start = prior.len().saturating_sub(history_window);
    let mut lines: Vec<String> = prior[start..]
        .iter()
        .map(|turn| format!("{}: {}", turn.role(), turn.content()))
        .collect();
    lines.push(format!("user: {}", user_text));
    lines.join("\n")
}

/// Wrap a prompt into the two-message request the endpoint receives
pub fn build_request(prompt: String) -> ChatRequest {
    ChatRequest {
        messages: vec![Message::system(SYSTEM_INSTRUCTION), Message::user(prompt)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MessageRole;

    fn turns(pairs: &[(&str, &str)]) -> Vec<Turn> {
        pairs
            .iter()
            .map(|(role, content)| match *role {
                "user" => Turn::user(*content),
                _ => Turn::assistant(*content),
            })
            .collect()
    }

    #[test]
    fn test_empty_history_is_raw_text() {
        assert_eq!(build_prompt(&[], 6, "hello"), "hello");
    }

    #[test]
    fn test_history_is_flattened_with_roles() {
        let prior = turns(&[("user", "a"), ("assistant", "b")]);
        assert_eq!(build_prompt(&prior, 6, "c"), "user: a\nassistant: b\nuser: c");
    }

    #[test]
    fn test_zero_window_ignores_history() {
        let prior = turns(&[("user", "a"), ("assistant", "b")]);
        assert_eq!(build_prompt(&prior, 0, "c"), "c");
    }

    #[test]
    fn test_window_keeps_trailing_turns_only() {
        let prior = turns(&[
            ("user", "1"),
            ("assistant", "2"),
            ("user", "3"),
            ("assistant", "4"),
        ]);
        assert_eq!(build_prompt(&prior, 2, "5"), "user: 3\nassistant: 4\nuser: 5");
        assert_eq!(build_prompt(&prior, 1, "5"), "assistant: 4\nuser: 5");
    }

    #[test]
    fn test_multiline_content_is_kept_verbatim() {
        let prior = turns(&[("assistant", "```rust\nfn main() {}\n```")]);
        assert_eq!(
            build_prompt(&prior, 6, "explain"),
            "assistant: ```rust\nfn main() {}\n```\nuser: explain"
        );
    }

    #[test]
    fn test_request_has_system_then_user() {
        let request = build_request("user: a\nuser: b".to_string());
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert_eq!(request.messages[0].content, SYSTEM_INSTRUCTION);
        assert_eq!(request.messages[1].role, MessageRole::User);
        assert_eq!(request.messages[1].content, "user: a\nuser: b");
    }
}
