use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    llm::{LlmError, LlmProvider, ProviderFactory},
    session::{Admission, Conversation, SubmitOutcome},
    tui::{
        components::{
            input::ChatInput, settings::SettingsPanel, transcript::Transcript, Component,
        },
        events::Event,
        keys::KeyMap,
        styles::Theme,
        utils::layout::centered_rect,
        Frame,
    },
};

/// Transient message shown above the input box
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Info(String),
    Error(String),
}

/// Main application state and controller
pub struct App {
    /// Whether the application should quit
    pub should_quit: bool,

    /// Key mappings for the application
    pub key_map: KeyMap,

    /// Current theme for styling
    pub theme: Theme,

    /// Runtime configuration, edited through the settings panel
    config: Config,

    /// Provider built from `config`; `None` while the configuration is unusable
    provider: Option<Arc<dyn LlmProvider>>,

    conversation: Conversation,
    transcript: Transcript,
    input: ChatInput,

    /// Open settings panel, if any
    settings: Option<SettingsPanel>,
    show_help: bool,
    status_message: Option<StatusMessage>,

    /// Event sender for completions of background requests
    event_sender: mpsc::UnboundedSender<Event>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config, event_sender: mpsc::UnboundedSender<Event>) -> Self {
        let mut status_message = None;
        let provider = match Self::build_provider(&config) {
            Ok(provider) => Some(provider),
            Err(e) => {
                warn!("Provider unavailable: {}", e);
                status_message = Some(StatusMessage::Error(format!(
                    "{} (Ctrl+S to open settings)",
                    e
                )));
                None
            }
        };

        if status_message.is_none() && !config.has_api_key() {
            status_message = Some(StatusMessage::Info(
                "No API key set. Ctrl+S to open settings.".to_string(),
            ));
        }

        Self {
            should_quit: false,
            key_map: KeyMap::default(),
            theme: Theme::default(),
            config,
            provider,
            conversation: Conversation::new(),
            transcript: Transcript::new(),
            input: ChatInput::new("Message", "Type a message and press Enter"),
            settings: None,
            show_help: false,
            status_message,
            event_sender,
        }
    }

    fn build_provider(config: &Config) -> Result<Arc<dyn LlmProvider>> {
        config.validate()?;
        let provider = ProviderFactory::create_provider(config.provider_config())?;
        Ok(Arc::from(provider))
    }

    /// Handle incoming events; returns true when the app should exit
    pub fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Key(key_event) => self.handle_key_event(key_event)?,

            Event::Paste(text) => match self.settings.as_mut() {
                Some(settings) => settings.paste(&text),
                None => self.input.insert_str(&text),
            },

            Event::Resize => {}

            Event::Tick => self.transcript.tick(),

            Event::Completion(result) => {
                match self.conversation.resolve(result) {
                    SubmitOutcome::Replied => self.status_message = None,
                    SubmitOutcome::Failed(message) => debug!("Shown to user: {}", message),
                    SubmitOutcome::Ignored | SubmitOutcome::Busy => {}
                }
                self.transcript.scroll_to_bottom();
            }
        }

        Ok(self.should_quit)
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) -> Result<()> {
        if self.key_map.should_quit(&key_event) {
            self.should_quit = true;
            return Ok(());
        }

        if self.key_map.should_show_help(&key_event) {
            self.show_help = !self.show_help;
            return Ok(());
        }

        if self.show_help && key_event.code == KeyCode::Esc {
            self.show_help = false;
            return Ok(());
        }

        if self.settings.is_some() {
            if key_event.code == KeyCode::Esc || self.key_map.should_toggle_settings(&key_event) {
                self.apply_settings();
            } else if let Some(settings) = self.settings.as_mut() {
                settings.handle_key_event(key_event)?;
            }
            return Ok(());
        }

        if self.key_map.should_toggle_settings(&key_event) {
            self.settings = Some(SettingsPanel::from_config(&self.config));
            return Ok(());
        }

        if self.key_map.should_start_new_session(&key_event) {
            self.start_new_session();
            return Ok(());
        }

        if self.key_map.should_submit(&key_event) {
            self.submit();
            return Ok(());
        }

        if self.key_map.should_insert_newline(&key_event) {
            self.input.insert_str("\n");
            return Ok(());
        }

        match (key_event.code, key_event.modifiers) {
            (KeyCode::Up, KeyModifiers::NONE) => self.transcript.scroll_up(1),
            (KeyCode::Down, KeyModifiers::NONE) => self.transcript.scroll_down(1),
            (KeyCode::PageUp, _) => self.transcript.scroll_up(self.transcript.page_size()),
            (KeyCode::PageDown, _) => self.transcript.scroll_down(self.transcript.page_size()),
            _ => self.input.handle_key_event(key_event)?,
        }

        Ok(())
    }

    /// Send the input box contents as a new user turn
    fn submit(&mut self) {
        let text = self.input.content().to_string();
        let window = self.config.history_window as usize;

        let pending = match self.conversation.begin_submission(&text, window) {
            Admission::Accepted(pending) => pending,
            Admission::Rejected(SubmitOutcome::Busy) => {
                // Keep the draft so it can be sent once the reply lands
                self.status_message = Some(StatusMessage::Info(
                    "Still waiting for the previous reply".to_string(),
                ));
                return;
            }
            Admission::Rejected(_) => {
                self.input.clear();
                return;
            }
        };

        self.input.clear();
        self.status_message = None;
        self.transcript.scroll_to_bottom();

        let sender = self.event_sender.clone();
        match self.provider.clone() {
            Some(provider) => {
                debug!(
                    "Submitting turn to {} ({}), prompt of {} bytes",
                    provider.name(),
                    provider.model(),
                    pending.prompt().len()
                );
                tokio::spawn(async move {
                    let result = provider.chat_completion(pending.into_request()).await;
                    if sender.send(Event::Completion(result)).is_err() {
                        debug!("UI closed before the reply arrived");
                    }
                });
            }
            None => {
                let error = LlmError::ConfigError(
                    "no usable provider, fix the settings with Ctrl+S".to_string(),
                );
                if sender.send(Event::Completion(Err(error))).is_err() {
                    debug!("UI closed before the reply arrived");
                }
            }
        }
    }

    fn start_new_session(&mut self) {
        if self.conversation.is_busy() {
            self.status_message = Some(StatusMessage::Info(
                "Wait for the reply before starting a new conversation".to_string(),
            ));
            return;
        }

        info!("Starting new conversation");
        self.conversation = Conversation::new();
        self.transcript.reset();
        self.status_message = Some(StatusMessage::Info("New conversation".to_string()));
    }

    /// Validate the edited settings and rebuild the provider.
    ///
    /// Invalid settings leave the panel open with the error on the status line.
    fn apply_settings(&mut self) {
        let Some(panel) = self.settings.as_ref() else {
            return;
        };

        let mut updated = self.config.clone();
        panel.apply_to(&mut updated);

        match Self::build_provider(&updated) {
            Ok(provider) => {
                info!(
                    "Settings applied: endpoint {}, model {}, history window {}",
                    updated.endpoint, updated.model, updated.history_window
                );
                self.config = updated;
                self.provider = Some(provider);
                self.settings = None;
                self.status_message = Some(StatusMessage::Info("Settings applied".to_string()));
            }
            Err(e) => {
                warn!("Rejected settings: {}", e);
                self.status_message = Some(StatusMessage::Error(e.to_string()));
            }
        }
    }

    /// Render the application UI
    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Transcript
                Constraint::Length(1), // Error / status line
                Constraint::Length(3), // Input
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        self.transcript.render(
            frame,
            chunks[0],
            self.conversation.turns(),
            self.conversation.is_busy(),
            &self.theme,
        );
        self.render_message_line(frame, chunks[1]);

        self.input.set_focus(self.settings.is_none());
        self.input.set_title(if self.conversation.is_busy() {
            "Message (waiting for reply)"
        } else {
            "Message"
        });
        self.input.render(frame, chunks[2], &self.theme);

        self.render_status_bar(frame, chunks[3]);

        if let Some(settings) = self.settings.as_mut() {
            settings.render(frame, area, &self.theme);
        }

        if self.show_help {
            self.render_help_overlay(frame);
        }
    }

    fn render_message_line(&self, frame: &mut Frame, area: Rect) {
        let error = match &self.status_message {
            Some(StatusMessage::Error(message)) => Some(message.as_str()),
            _ => self.conversation.last_error(),
        };

        let line = match (error, &self.status_message) {
            (Some(message), _) => {
                Line::from(Span::styled(format!(" ✗ {}", message), self.theme.error_style()))
            }
            (None, Some(StatusMessage::Info(message))) => {
                Line::from(Span::styled(format!(" {}", message), self.theme.dim_style()))
            }
            _ => Line::default(),
        };

        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let state = if self.conversation.is_busy() {
            "waiting for reply"
        } else {
            "ready"
        };
        let status_text = format!(
            " {} | window {} | {} | {} help | {} quit",
            self.config.model,
            self.config.history_window,
            state,
            self.key_map.help.label(),
            self.key_map.quit.label(),
        );

        let status_paragraph = Paragraph::new(status_text).style(self.theme.status_bar_style());
        frame.render_widget(status_paragraph, area);
    }

    fn render_help_overlay(&self, frame: &mut Frame) {
        let help_lines = self.key_map.help_lines();
        let help_area = centered_rect(60, help_lines.len() as u16 + 2, frame.size());

        let lines: Vec<Line> = help_lines
            .into_iter()
            .map(|(keys, description)| {
                Line::from(vec![
                    Span::styled(format!(" {:<20}", keys), self.theme.focused_border_style()),
                    Span::styled(description, self.theme.text_style()),
                ])
            })
            .collect();

        let help_block = Block::default()
            .borders(Borders::ALL)
            .title("Help")
            .style(self.theme.help_style());

        frame.render_widget(Clear, help_area);
        frame.render_widget(
            Paragraph::new(lines)
                .block(help_block)
                .style(self.theme.base_style()),
            help_area,
        );
    }
}
