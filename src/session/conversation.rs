//! Conversation state and the submit/resolve cycle

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    llm::{ChatRequest, LlmProvider, LlmResult, ProviderResponse},
    session::{
        prompt::{build_prompt, build_request},
        Turn,
    },
};

/// Whether a request is outstanding for the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    InFlight,
}

/// Result of a submission attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing happened
    Ignored,
    /// A request was already outstanding; nothing happened
    Busy,
    /// The assistant reply was appended
    Replied,
    /// The request failed; the message is also kept as the conversation's last error
    Failed(String),
}

/// Outcome of the synchronous half of a submission
#[derive(Debug)]
pub enum Admission {
    Accepted(PendingRequest),
    Rejected(SubmitOutcome),
}

/// A request built for an accepted submission, waiting to be sent
#[derive(Debug, Clone)]
pub struct PendingRequest {
    prompt: String,
    request: ChatRequest,
}

impl PendingRequest {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn into_request(self) -> ChatRequest {
        self.request
    }
}

/// An in-memory conversation with at most one request in flight
#[derive(Debug)]
pub struct Conversation {
    id: String,
    turns: Vec<Turn>,
    request_state: RequestState,
    last_error: Option<String>,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            turns: Vec::new(),
            request_state: RequestState::Idle,
            last_error: None,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_busy(&self) -> bool {
        self.request_state == RequestState::InFlight
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Accept a submission: append the user turn and build the request.
    ///
    /// On acceptance the conversation is `InFlight` until [`Conversation::resolve`]
    /// is called.
    pub fn begin_submission(&mut self, user_text: &str, history_window: usize) -> Admission {
        if user_text.trim().is_empty() {
            return Admission::Rejected(SubmitOutcome::Ignored);
        }

        if self.is_busy() {
            debug!("Conversation {} busy, submission dropped", self.id);
            return Admission::Rejected(SubmitOutcome::Busy);
        }

        self.last_error = None;

        let prompt = build_prompt(&self.turns, history_window, user_text);
        self.turns.push(Turn::user(user_text));
        self.request_state = RequestState::InFlight;

        debug!(
            "Conversation {} prompt built from {} prior turns (window {})",
            self.id,
            self.turns.len() - 1,
            history_window
        );

        let request = build_request(prompt.clone());
        Admission::Accepted(PendingRequest { prompt, request })
    }

    /// Settle the outstanding request with the provider's result
    pub fn resolve(&mut self, result: LlmResult<ProviderResponse>) -> SubmitOutcome {
        if !self.is_busy() {
            warn!("Conversation {} got a result with no request in flight", self.id);
            return SubmitOutcome::Ignored;
        }

        self.request_state = RequestState::Idle;

        match result {
            Ok(response) => {
                self.turns.push(Turn::assistant(response.content));
                info!("Conversation {} now has {} turns", self.id, self.turns.len());
                SubmitOutcome::Replied
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Conversation {} request failed: {}", self.id, message);
                self.last_error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Submit `user_text` and wait for the reply
    pub async fn submit_turn(
        &mut self,
        user_text: &str,
        provider: &dyn LlmProvider,
        history_window: usize,
    ) -> SubmitOutcome {
        let pending = match self.begin_submission(user_text, history_window) {
            Admission::Accepted(pending) => pending,
            Admission::Rejected(outcome) => return outcome,
        };

        debug!("Sending turn to provider {} ({})", provider.name(), provider.model());
        let result = provider.chat_completion(pending.into_request()).await;
        self.resolve(result)
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MessageRole};
    use crate::session::Role;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that replays queued results and records every request
    struct ScriptedProvider {
        results: Mutex<VecDeque<LlmResult<ProviderResponse>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn new(results: Vec<LlmResult<ProviderResponse>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn reply(text: &str) -> LlmResult<ProviderResponse> {
            Ok(ProviderResponse {
                content: text.to_string(),
            })
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn chat_completion(&self, request: ChatRequest) -> LlmResult<ProviderResponse> {
            self.requests.lock().unwrap().push(request);
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::MalformedResponse("script exhausted".into())))
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-model"
        }

        fn validate_config(&self) -> LlmResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_success_appends_user_and_assistant() {
        let provider = ScriptedProvider::new(vec![ScriptedProvider::reply("hi there")]);
        let mut conversation = Conversation::new();

        let outcome = conversation.submit_turn("hello", &provider, 6).await;

        assert_eq!(outcome, SubmitOutcome::Replied);
        assert_eq!(
            conversation.turns(),
            &[Turn::user("hello"), Turn::assistant("hi there")]
        );
        assert!(!conversation.is_busy());
        assert!(conversation.last_error().is_none());

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[1].role, MessageRole::User);
        assert_eq!(requests[0].messages[1].content, "hello");
    }

    #[tokio::test]
    async fn test_second_turn_carries_history() {
        let provider = ScriptedProvider::new(vec![
            ScriptedProvider::reply("b"),
            ScriptedProvider::reply("d"),
        ]);
        let mut conversation = Conversation::new();

        conversation.submit_turn("a", &provider, 6).await;
        conversation.submit_turn("c", &provider, 6).await;

        let requests = provider.requests();
        assert_eq!(requests[1].messages[1].content, "user: a\nassistant: b\nuser: c");
        assert_eq!(conversation.turns().len(), 4);
    }

    #[tokio::test]
    async fn test_failure_keeps_user_turn_and_records_error() {
        let provider = ScriptedProvider::new(vec![Err(LlmError::StatusError {
            status: 500,
            body: "boom".to_string(),
        })]);
        let mut conversation = Conversation::new();

        let outcome = conversation.submit_turn("hello", &provider, 6).await;

        assert!(matches!(outcome, SubmitOutcome::Failed(ref msg) if msg.contains("500")));
        assert_eq!(conversation.turns(), &[Turn::user("hello")]);
        assert!(conversation.last_error().unwrap().contains("500"));
        assert!(!conversation.is_busy());
    }

    #[tokio::test]
    async fn test_next_submission_clears_error() {
        let provider = ScriptedProvider::new(vec![
            Err(LlmError::MalformedResponse("no choices".into())),
            ScriptedProvider::reply("ok"),
        ]);
        let mut conversation = Conversation::new();

        conversation.submit_turn("first", &provider, 6).await;
        assert!(conversation.last_error().is_some());

        let admission = conversation.begin_submission("second", 6);
        assert!(matches!(admission, Admission::Accepted(_)));
        assert!(conversation.last_error().is_none());
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let provider = ScriptedProvider::new(vec![]);
        let mut conversation = Conversation::new();

        let outcome = conversation.submit_turn("   \n\t", &provider, 6).await;

        assert_eq!(outcome, SubmitOutcome::Ignored);
        assert!(conversation.turns().is_empty());
        assert!(provider.requests().is_empty());
    }

    #[test]
    fn test_submission_while_in_flight_is_dropped() {
        let mut conversation = Conversation::new();

        let first = conversation.begin_submission("one", 6);
        assert!(matches!(first, Admission::Accepted(_)));
        assert!(conversation.is_busy());

        let second = conversation.begin_submission("two", 6);
        assert!(matches!(second, Admission::Rejected(SubmitOutcome::Busy)));
        assert_eq!(conversation.turns(), &[Turn::user("one")]);

        let outcome = conversation.resolve(Ok(ProviderResponse {
            content: "reply".to_string(),
        }));
        assert_eq!(outcome, SubmitOutcome::Replied);
        assert_eq!(conversation.turns().len(), 2);
        assert_eq!(conversation.turns()[1].role(), Role::Assistant);
    }

    #[test]
    fn test_pending_prompt_uses_turns_before_append() {
        let mut conversation = Conversation::new();
        let pending = match conversation.begin_submission("hello", 6) {
            Admission::Accepted(pending) => pending,
            other => panic!("unexpected admission: {:?}", other),
        };
        assert_eq!(pending.prompt(), "hello");
        assert_eq!(pending.into_request().messages.len(), 2);
    }

    #[test]
    fn test_resolve_without_request_is_ignored() {
        let mut conversation = Conversation::new();
        let outcome = conversation.resolve(Ok(ProviderResponse {
            content: "stray".to_string(),
        }));
        assert_eq!(outcome, SubmitOutcome::Ignored);
        assert!(conversation.turns().is_empty());
    }
}
