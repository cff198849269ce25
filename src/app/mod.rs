//! Core application logic and orchestration
//!
//! Ties configuration, the LLM provider and a conversation together for the
//! one-shot `run` mode. Interactive mode lives in [`crate::tui`].

use anyhow::{anyhow, Result};
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    config::Config,
    llm::{LlmProvider, ProviderFactory},
    session::{Conversation, SubmitOutcome},
    tui::{self, utils::text::lines_to_ansi, SyntaxHighlighter, Theme},
};

/// Width used for rendered output when the terminal size is unknown
const FALLBACK_WIDTH: u16 = 100;

/// Main application structure
pub struct App {
    config: Config,
    conversation: Conversation,
    llm_provider: Arc<dyn LlmProvider>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Result<Self> {
        debug!("Creating new App instance");

        config.validate()?;
        let llm_provider = ProviderFactory::create_provider(config.provider_config())?;

        Ok(Self::with_provider(config, Arc::from(llm_provider)))
    }

    /// Create an application around an existing provider
    pub fn with_provider(config: Config, llm_provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            config,
            conversation: Conversation::new(),
            llm_provider,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Start the terminal chat panel
    pub async fn run_interactive(config: Config) -> Result<()> {
        info!("Starting interactive mode");
        tui::run(config).await
    }

    /// Submit one prompt and return the assistant's reply.
    ///
    /// The reply is rendered as ANSI-colored markdown unless `raw` is set or
    /// stdout is not a terminal.
    pub async fn run_non_interactive(&mut self, prompt: &str, raw: bool) -> Result<String> {
        info!("Running non-interactive prompt");

        let outcome = self
            .conversation
            .submit_turn(
                prompt,
                self.llm_provider.as_ref(),
                self.config.history_window as usize,
            )
            .await;

        let reply = match outcome {
            SubmitOutcome::Replied => self
                .conversation
                .turns()
                .last()
                .map(|turn| turn.content().to_string())
                .ok_or_else(|| anyhow!("No reply recorded"))?,
            SubmitOutcome::Failed(message) => return Err(anyhow!(message)),
            SubmitOutcome::Ignored => {
                return Err(anyhow!(
                    "No prompt provided. Use arguments or pipe input via stdin."
                ))
            }
            SubmitOutcome::Busy => return Err(anyhow!("A request is already in flight")),
        };

        if raw || !std::io::stdout().is_terminal() {
            return Ok(reply);
        }

        let width = crossterm::terminal::size()
            .map(|(width, _)| width)
            .unwrap_or(FALLBACK_WIDTH);
        Ok(render_reply(&reply, width))
    }
}

/// Render a reply as markdown with ANSI escapes
pub fn render_reply(reply: &str, width: u16) -> String {
    let highlighter = SyntaxHighlighter::new();
    let text = tui::render_markdown(reply, &Theme::default(), &highlighter, width);
    lines_to_ansi(&text.lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatRequest, LlmError, LlmResult, ProviderResponse};
    use async_trait::async_trait;

    struct FixedProvider {
        result: fn() -> LlmResult<ProviderResponse>,
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        async fn chat_completion(&self, _request: ChatRequest) -> LlmResult<ProviderResponse> {
            (self.result)()
        }

        fn name(&self) -> &str {
            "fixed"
        }

        fn model(&self) -> &str {
            "fixed-1"
        }

        fn validate_config(&self) -> LlmResult<()> {
            Ok(())
        }
    }

    fn app(result: fn() -> LlmResult<ProviderResponse>) -> App {
        App::with_provider(Config::default(), Arc::new(FixedProvider { result }))
    }

    #[tokio::test]
    async fn test_raw_reply_is_returned_verbatim() {
        let mut app = app(|| {
            Ok(ProviderResponse {
                content: "# Hi\n\n`code`".to_string(),
            })
        });

        let reply = app.run_non_interactive("hello", true).await.unwrap();
        assert_eq!(reply, "# Hi\n\n`code`");
        assert_eq!(app.conversation().turns().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_becomes_error() {
        let mut app = app(|| {
            Err(LlmError::StatusError {
                status: 401,
                body: "bad key".to_string(),
            })
        });

        let err = app.run_non_interactive("hello", true).await.unwrap_err();
        assert!(err.to_string().contains("401"));
        assert_eq!(app.conversation().last_error(), Some(err.to_string().as_str()));
    }

    #[tokio::test]
    async fn test_blank_prompt_is_an_error() {
        let mut app = app(|| unreachable!("blank prompts are never sent"));
        assert!(app.run_non_interactive("  \n", true).await.is_err());
        assert!(app.conversation().turns().is_empty());
    }

    #[test]
    fn test_render_reply_uses_ansi() {
        let rendered = render_reply("**bold** text", 80);
        assert!(rendered.contains("bold"));
        assert!(rendered.contains("\u{1b}["));
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let config = Config {
            endpoint: "ftp://example.com".to_string(),
            ..Config::default()
        };
        assert!(App::new(config).is_err());
    }
}
