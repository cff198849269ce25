//! Settings overlay for endpoint, credential, model and history window

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::{input::ChatInput, Component};
use crate::{
    config::{Config, MAX_HISTORY_WINDOW},
    llm::ModelId,
    tui::{styles::Theme, utils::layout::centered_rect, Frame},
};

const LABEL_WIDTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Endpoint,
    ApiKey,
    Model,
    HistoryWindow,
}

impl SettingsField {
    const ORDER: [SettingsField; 4] = [
        SettingsField::Endpoint,
        SettingsField::ApiKey,
        SettingsField::Model,
        SettingsField::HistoryWindow,
    ];

    fn label(&self) -> &'static str {
        match self {
            SettingsField::Endpoint => "Endpoint",
            SettingsField::ApiKey => "API key",
            SettingsField::Model => "Model",
            SettingsField::HistoryWindow => "History window",
        }
    }

    fn index(&self) -> usize {
        Self::ORDER.iter().position(|f| f == self).unwrap_or(0)
    }

    fn next(&self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    fn previous(&self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// Editable copy of the runtime settings
#[derive(Debug, Clone)]
pub struct SettingsPanel {
    endpoint: ChatInput,
    api_key: ChatInput,
    model: ModelId,
    history_window: u8,
    focused: SettingsField,
}

impl SettingsPanel {
    pub fn from_config(config: &Config) -> Self {
        let mut endpoint = ChatInput::new("Endpoint", "https://…");
        endpoint.set_content(config.endpoint.clone());
        let mut api_key = ChatInput::new("API key", "not set");
        api_key.set_content(config.api_key.clone());

        Self {
            endpoint,
            api_key,
            model: config.model,
            history_window: config.history_window.min(MAX_HISTORY_WINDOW),
            focused: SettingsField::Endpoint,
        }
    }

    /// Copy the edited values onto `config`
    pub fn apply_to(&self, config: &mut Config) {
        config.endpoint = self.endpoint.content().trim().to_string();
        config.api_key = self.api_key.content().trim().to_string();
        config.model = self.model;
        config.history_window = self.history_window;
    }

    fn adjust(&mut self, forward: bool) {
        match self.focused {
            SettingsField::Model => {
                self.model = if forward {
                    self.model.next()
                } else {
                    self.model.previous()
                };
            }
            SettingsField::HistoryWindow => {
                self.history_window = if forward {
                    (self.history_window + 1).min(MAX_HISTORY_WINDOW)
                } else {
                    self.history_window.saturating_sub(1)
                };
            }
            SettingsField::Endpoint | SettingsField::ApiKey => {}
        }
    }

    fn focused_input(&mut self) -> Option<&mut ChatInput> {
        match self.focused {
            SettingsField::Endpoint => Some(&mut self.endpoint),
            SettingsField::ApiKey => Some(&mut self.api_key),
            SettingsField::Model | SettingsField::HistoryWindow => None,
        }
    }

    /// Paste into the focused text field; settings values are single-line
    pub fn paste(&mut self, text: &str) {
        if let Some(input) = self.focused_input() {
            let value: String = text.lines().map(str::trim).collect();
            input.insert_str(&value);
        }
    }

    fn masked_key(&self) -> String {
        "•".repeat(self.api_key.content().chars().count())
    }

    fn value_line(&self, field: SettingsField, theme: &Theme) -> Line<'static> {
        let focused = field == self.focused;
        let value_style = if focused {
            theme.selection_style()
        } else {
            theme.text_style()
        };

        let value = match field {
            SettingsField::Endpoint => self.endpoint.content().to_string(),
            SettingsField::ApiKey if self.api_key.is_empty() => String::new(),
            SettingsField::ApiKey => self.masked_key(),
            SettingsField::Model => format!("‹ {} ›", self.model),
            SettingsField::HistoryWindow => format!("‹ {} ›", self.history_window),
        };

        let mut spans = vec![Span::styled(
            format!("{:<width$}", field.label(), width = LABEL_WIDTH),
            if focused {
                theme.focused_border_style()
            } else {
                theme.dim_style()
            },
        )];

        if value.is_empty() {
            spans.push(Span::styled("not set", theme.placeholder_style()));
        } else {
            spans.push(Span::styled(value, value_style));
        }

        Line::from(spans)
    }
}

impl Component for SettingsPanel {
    fn handle_key_event(&mut self, event: KeyEvent) -> Result<()> {
        match event.code {
            KeyCode::Tab | KeyCode::Down => self.focused = self.focused.next(),
            KeyCode::BackTab | KeyCode::Up => self.focused = self.focused.previous(),
            KeyCode::Left if self.focused_input().is_none() => self.adjust(false),
            KeyCode::Right if self.focused_input().is_none() => self.adjust(true),
            _ => {
                if let Some(input) = self.focused_input() {
                    input.handle_key_event(event)?;
                }
            }
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let popup = centered_rect(72, 11, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.focused_border_style())
            .title(Span::styled(" Settings ", theme.help_style()));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let mut lines: Vec<Line> = Vec::new();
        for field in SettingsField::ORDER {
            lines.push(self.value_line(field, theme));
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(
            "Tab/Shift+Tab move · ←/→ change · Esc apply",
            theme.dim_style(),
        )));

        frame.render_widget(Paragraph::new(lines).style(theme.base_style()), inner);

        let cursor = match self.focused {
            SettingsField::Endpoint => Some(self.endpoint.cursor_column()),
            SettingsField::ApiKey => Some(self.api_key.cursor()),
            SettingsField::Model | SettingsField::HistoryWindow => None,
        };
        if let Some(column) = cursor {
            let x = inner.x + (LABEL_WIDTH + column) as u16;
            let y = inner.y + (self.focused.index() * 2) as u16;
            if x < inner.right() && y < inner.bottom() {
                frame.set_cursor(x, y);
            }
        }
    }

    fn has_focus(&self) -> bool {
        true
    }
}
