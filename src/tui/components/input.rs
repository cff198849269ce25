//! Text input for composing messages
//!
//! The draft may hold line breaks. It is drawn on one row with each break
//! shown as `⏎`.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::Component;
use crate::tui::{styles::Theme, Frame};

const LINE_BREAK_MARK: &str = "⏎";

/// Text input with a grapheme-aware cursor
#[derive(Debug, Clone)]
pub struct ChatInput {
    content: String,
    /// Cursor position in graphemes
    cursor: usize,
    placeholder: String,
    title: String,
    focused: bool,
}

impl ChatInput {
    pub fn new(title: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            placeholder: placeholder.into(),
            title: title.into(),
            focused: true,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.cursor = self.grapheme_count();
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Insert text at the cursor. `\r\n` and lone `\r` are stored as `\n`.
    pub fn insert_str(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let offset = self.byte_offset(self.cursor);
        self.content.insert_str(offset, &text);
        self.cursor += text.graphemes(true).count();
    }

    fn grapheme_count(&self) -> usize {
        self.content.graphemes(true).count()
    }

    fn byte_offset(&self, grapheme_index: usize) -> usize {
        self.content
            .grapheme_indices(true)
            .nth(grapheme_index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.content.len())
    }

    fn delete_before_cursor(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let start = self.byte_offset(self.cursor - 1);
        let end = self.byte_offset(self.cursor);
        self.content.replace_range(start..end, "");
        self.cursor -= 1;
    }

    fn delete_at_cursor(&mut self) {
        if self.cursor >= self.grapheme_count() {
            return;
        }
        let start = self.byte_offset(self.cursor);
        let end = self.byte_offset(self.cursor + 1);
        self.content.replace_range(start..end, "");
    }

    /// Draft as drawn on its single row
    fn display_text(text: &str) -> String {
        text.replace('\n', LINE_BREAK_MARK)
    }

    /// Display column of the cursor
    pub fn cursor_column(&self) -> usize {
        Self::display_text(&self.content[..self.byte_offset(self.cursor)]).width()
    }
}

impl Component for ChatInput {
    fn handle_key_event(&mut self, event: KeyEvent) -> Result<()> {
        match event.code {
            KeyCode::Char(c)
                if !event.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                let mut buf = [0u8; 4];
                self.insert_str(c.encode_utf8(&mut buf));
            }
            KeyCode::Backspace => self.delete_before_cursor(),
            KeyCode::Delete => self.delete_at_cursor(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.grapheme_count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.grapheme_count(),
            _ => {}
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let border_style = if self.focused {
            theme.focused_border_style()
        } else {
            theme.border_style()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(format!(" {} ", self.title), theme.dim_style()));

        let inner_width = area.width.saturating_sub(2) as usize;
        let cursor_column = self.cursor_column();
        // Keep the cursor inside the visible window
        let scroll = (cursor_column + 1).saturating_sub(inner_width);

        let line = if self.content.is_empty() {
            Line::from(Span::styled(self.placeholder.clone(), theme.placeholder_style()))
        } else {
            Line::from(Span::styled(
                Self::display_text(&self.content),
                theme.text_style(),
            ))
        };

        let paragraph = Paragraph::new(line)
            .block(block)
            .scroll((0, scroll as u16));
        frame.render_widget(paragraph, area);

        if self.focused && area.width > 2 && area.height > 2 {
            let x = area.x + 1 + (cursor_column - scroll) as u16;
            frame.set_cursor(x, area.y + 1);
        }
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn set_focus(&mut self, focus: bool) {
        self.focused = focus;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(input: &mut ChatInput, text: &str) {
        for c in text.chars() {
            input.handle_key_event(key(KeyCode::Char(c))).unwrap();
        }
    }

    #[test]
    fn test_typing_and_cursor_movement() {
        let mut input = ChatInput::new("Message", "");
        type_text(&mut input, "helo");
        input.handle_key_event(key(KeyCode::Left)).unwrap();
        type_text(&mut input, "l");
        assert_eq!(input.content(), "hello");
        assert_eq!(input.cursor(), 4);

        input.handle_key_event(key(KeyCode::Home)).unwrap();
        input.handle_key_event(key(KeyCode::Delete)).unwrap();
        assert_eq!(input.content(), "ello");

        input.handle_key_event(key(KeyCode::End)).unwrap();
        input.handle_key_event(key(KeyCode::Backspace)).unwrap();
        assert_eq!(input.content(), "ell");
        assert_eq!(input.cursor(), 3);
    }

    #[test]
    fn test_multibyte_graphemes() {
        let mut input = ChatInput::new("Message", "");
        input.insert_str("añb");
        input.handle_key_event(key(KeyCode::Left)).unwrap();
        input.handle_key_event(key(KeyCode::Backspace)).unwrap();
        assert_eq!(input.content(), "ab");

        input.set_content("日本");
        assert_eq!(input.cursor(), 2);
        assert_eq!(input.cursor_column(), 4);
    }

    #[test]
    fn test_control_chords_are_not_inserted() {
        let mut input = ChatInput::new("Message", "");
        input
            .handle_key_event(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL))
            .unwrap();
        assert!(input.is_empty());

        input
            .handle_key_event(KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT))
            .unwrap();
        assert_eq!(input.content(), "A");
    }

    #[test]
    fn test_paste_keeps_line_breaks() {
        let mut input = ChatInput::new("Message", "");
        input.insert_str("fn main() {\r\n    run();\r}");
        assert_eq!(input.content(), "fn main() {\n    run();\n}");
        assert_eq!(input.cursor(), 24);

        input.handle_key_event(key(KeyCode::Home)).unwrap();
        for _ in 0..12 {
            input.handle_key_event(key(KeyCode::Right)).unwrap();
        }
        // "fn main() {" plus the break mark
        assert_eq!(input.cursor_column(), 12);

        input.clear();
        assert!(input.is_empty());
        assert_eq!(input.cursor(), 0);
    }
}
