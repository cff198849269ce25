//! Scrollable conversation transcript
//!
//! User turns are shown verbatim; assistant turns are rendered as markdown.
//! Rendered turns are cached per width since markdown and highlighting are
//! not cheap to redo on every frame.

use std::collections::HashMap;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::{highlighting::SyntaxHighlighter, markdown::render_markdown};
use crate::{
    session::{Role, Turn},
    tui::{styles::Theme, utils::text::wrap_line, Frame},
};

const THINKING_FRAMES: [&str; 4] = ["thinking", "thinking.", "thinking..", "thinking..."];

/// Render one turn: a role label followed by its body
pub fn render_turn(
    turn: &Turn,
    theme: &Theme,
    highlighter: &SyntaxHighlighter,
    width: u16,
) -> Vec<Line<'static>> {
    let (label, label_style) = match turn.role() {
        Role::User => ("You", theme.user_label_style()),
        Role::Assistant => ("Assistant", theme.assistant_label_style()),
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(label, label_style),
        Span::styled(
            format!("  {}", turn.timestamp().format("%H:%M")),
            theme.dim_style(),
        ),
    ])];

    match turn.role() {
        Role::User => lines.extend(
            turn.content()
                .split('\n')
                .map(|line| Line::from(Span::styled(line.to_string(), theme.text_style()))),
        ),
        Role::Assistant => {
            lines.extend(render_markdown(turn.content(), theme, highlighter, width).lines)
        }
    }

    lines
        .iter()
        .flat_map(|line| wrap_line(line, width as usize))
        .collect()
}

/// Transcript view state
#[derive(Debug, Default)]
pub struct Transcript {
    highlighter: SyntaxHighlighter,
    /// Rendered lines per turn id, with the width they were rendered at
    cache: HashMap<String, (u16, Vec<Line<'static>>)>,
    /// Lines scrolled up from the bottom
    scroll_from_bottom: usize,
    /// Total lines at the last render
    total_lines: usize,
    viewport_height: usize,
    tick: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll_up(&mut self, lines: usize) {
        let max = self.total_lines.saturating_sub(self.viewport_height);
        self.scroll_from_bottom = (self.scroll_from_bottom + lines).min(max);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    pub fn page_size(&self) -> usize {
        self.viewport_height.saturating_sub(1).max(1)
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_from_bottom = 0;
    }

    /// Forget everything rendered for a previous conversation
    pub fn reset(&mut self) {
        self.cache.clear();
        self.scroll_from_bottom = 0;
        self.total_lines = 0;
    }

    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// All transcript lines for the given turns at `width`
    pub fn lines(
        &mut self,
        turns: &[Turn],
        busy: bool,
        theme: &Theme,
        width: u16,
    ) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        for (index, turn) in turns.iter().enumerate() {
            if index > 0 {
                lines.push(Line::default());
            }

            let cached = match self.cache.get(turn.id()) {
                Some((cached_width, rendered)) if *cached_width == width => rendered.clone(),
                _ => {
                    let rendered = render_turn(turn, theme, &self.highlighter, width);
                    self.cache
                        .insert(turn.id().to_string(), (width, rendered.clone()));
                    rendered
                }
            };
            lines.extend(cached);
        }

        if busy {
            if !lines.is_empty() {
                lines.push(Line::default());
            }
            let frame = THINKING_FRAMES[(self.tick / 3) % THINKING_FRAMES.len()];
            lines.push(Line::from(vec![
                Span::styled("Assistant ", theme.assistant_label_style()),
                Span::styled(frame, theme.placeholder_style()),
            ]));
        }

        lines
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        turns: &[Turn],
        busy: bool,
        theme: &Theme,
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style())
            .title(Span::styled(" Conversation ", theme.dim_style()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if turns.is_empty() && !busy {
            let hint = Paragraph::new(Line::from(Span::styled(
                "Ask anything. Replies are rendered as markdown.",
                theme.placeholder_style(),
            )));
            frame.render_widget(hint, inner);
            return;
        }

        let lines = self.lines(turns, busy, theme, inner.width);
        self.total_lines = lines.len();
        self.viewport_height = inner.height as usize;

        let max_scroll = self.total_lines.saturating_sub(self.viewport_height);
        self.scroll_from_bottom = self.scroll_from_bottom.min(max_scroll);
        let offset = max_scroll - self.scroll_from_bottom;

        let visible: Vec<Line<'static>> = lines
            .into_iter()
            .skip(offset)
            .take(self.viewport_height)
            .collect();
        frame.render_widget(Paragraph::new(visible), inner);
    }
}
