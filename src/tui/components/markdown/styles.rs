//! Markdown styling
//!
//! Styles for markdown elements, derived from the application theme.

use ratatui::style::{Modifier, Style};

use crate::tui::styles::Theme;

/// Complete set of styles for markdown rendering
#[derive(Debug, Clone)]
pub struct MarkdownStyles {
    /// Base text style
    pub text: Style,

    /// Headings
    pub heading_1: Style,
    pub heading_2: Style,
    pub heading_3: Style,
    pub heading_other: Style,

    /// Text formatting
    pub emphasis: Style,
    pub strong: Style,
    pub strikethrough: Style,

    /// Code elements
    pub inline_code: Style,
    pub code_gutter: Style,
    pub code_language: Style,

    /// Lists
    pub list_marker: Style,
    pub task_marker: Style,

    /// Quotes
    pub quote_marker: Style,
    pub quote_text: Style,

    /// Links and images
    pub link: Style,
    pub link_target: Style,
    pub image: Style,

    /// Tables
    pub table_header: Style,
    pub table_cell: Style,
    pub table_separator: Style,

    /// Special elements
    pub rule: Style,
    pub footnote: Style,
    pub html: Style,
}

impl MarkdownStyles {
    /// Create markdown styles from a theme
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            text: Style::default().fg(theme.text),

            heading_1: Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            heading_2: Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
            heading_3: Style::default()
                .fg(theme.secondary)
                .add_modifier(Modifier::BOLD),
            heading_other: Style::default()
                .fg(theme.text_dim)
                .add_modifier(Modifier::BOLD),

            emphasis: Style::default().add_modifier(Modifier::ITALIC),
            strong: Style::default().add_modifier(Modifier::BOLD),
            strikethrough: Style::default().add_modifier(Modifier::CROSSED_OUT),

            inline_code: Style::default()
                .fg(theme.warning)
                .bg(theme.code_background),
            code_gutter: Style::default().fg(theme.border),
            code_language: Style::default()
                .fg(theme.text_dim)
                .add_modifier(Modifier::ITALIC),

            list_marker: Style::default().fg(theme.primary),
            task_marker: Style::default().fg(theme.success),

            quote_marker: Style::default().fg(theme.border),
            quote_text: Style::default()
                .fg(theme.text_dim)
                .add_modifier(Modifier::ITALIC),

            link: Style::default()
                .fg(theme.info)
                .add_modifier(Modifier::UNDERLINED),
            link_target: Style::default().fg(theme.text_dim),
            image: Style::default().fg(theme.accent),

            table_header: Style::default()
                .fg(theme.text_bright)
                .add_modifier(Modifier::BOLD),
            table_cell: Style::default().fg(theme.text),
            table_separator: Style::default().fg(theme.border),

            rule: Style::default().fg(theme.border),
            footnote: Style::default()
                .fg(theme.info)
                .add_modifier(Modifier::ITALIC),
            html: Style::default().fg(theme.text_dim),
        }
    }

    /// Style for a heading of the given depth (1-6)
    pub fn heading(&self, level: usize) -> Style {
        match level {
            1 => self.heading_1,
            2 => self.heading_2,
            3 => self.heading_3,
            _ => self.heading_other,
        }
    }
}

impl Default for MarkdownStyles {
    fn default() -> Self {
        Self::from_theme(&Theme::default())
    }
}
