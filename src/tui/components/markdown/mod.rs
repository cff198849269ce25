//! Markdown rendering for assistant turns
//!
//! Assistant replies are parsed with pulldown-cmark and turned into styled
//! ratatui text. Fenced code blocks are highlighted with syntect.

use ratatui::text::{Line, Text};
use tracing::warn;

pub mod renderer;
pub mod styles;

use crate::tui::{components::highlighting::SyntaxHighlighter, styles::Theme};
use renderer::MarkdownRenderer;
use styles::MarkdownStyles;

/// Configuration for markdown display
#[derive(Debug, Clone)]
pub struct MarkdownConfig {
    /// Indent per nested list level
    pub list_indent: u16,

    /// Widest horizontal rule drawn
    pub max_rule_width: usize,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            list_indent: 2,
            max_rule_width: 80,
        }
    }
}

/// Render markdown to styled text, falling back to the raw source if rendering fails
pub fn render_markdown(
    content: &str,
    theme: &Theme,
    highlighter: &SyntaxHighlighter,
    width: u16,
) -> Text<'static> {
    let renderer = MarkdownRenderer::new(
        &MarkdownConfig::default(),
        MarkdownStyles::from_theme(theme),
        highlighter,
    );

    match renderer.render(content, width) {
        Ok(text) => text,
        Err(e) => {
            warn!("Markdown rendering failed: {}", e);
            Text::from(
                content
                    .lines()
                    .map(|line| Line::from(line.to_string()))
                    .collect::<Vec<_>>(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::{Color, Modifier};

    fn render(content: &str) -> Text<'static> {
        let highlighter = SyntaxHighlighter::new();
        render_markdown(content, &Theme::default(), &highlighter, 60)
    }

    fn plain_lines(text: &Text) -> Vec<String> {
        text.lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_paragraphs_and_headings() {
        let text = render("# Title\n\nSome text.\n\n## Sub");
        assert_eq!(plain_lines(&text), vec!["# Title", "", "Some text.", "", "## Sub"]);
    }

    #[test]
    fn test_inline_styles_are_applied() {
        let text = render("plain **bold** and *it*");
        let spans = &text.lines[0].spans;
        let bold = spans.iter().find(|s| s.content == "bold").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
        let italic = spans.iter().find(|s| s.content == "it").unwrap();
        assert!(italic.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_fenced_code_is_highlighted() {
        let text = render("Look:\n\n```rust\nfn main() {}\n```\n");
        let lines = plain_lines(&text);
        assert_eq!(lines, vec!["Look:", "", "┌ rust", "│ fn main() {}"]);

        let code_line = &text.lines[3];
        assert!(code_line.spans[1..]
            .iter()
            .any(|span| matches!(span.style.fg, Some(Color::Rgb(..)))));
    }

    #[test]
    fn test_code_without_language_still_renders() {
        let text = render("```\nplain code\n```");
        assert_eq!(plain_lines(&text), vec!["│ plain code"]);
    }

    #[test]
    fn test_lists() {
        let text = render("- one\n- two\n  - nested\n\n1. first\n2. second");
        assert_eq!(
            plain_lines(&text),
            vec!["• one", "• two", "  ◦ nested", "", "1. first", "2. second"]
        );
    }

    #[test]
    fn test_blockquote_and_rule() {
        let text = render("> quoted\n\n---\n\nafter");
        let lines = plain_lines(&text);
        assert_eq!(lines[0], "│ quoted");
        assert!(lines.iter().any(|line| line.starts_with("───")));
        assert_eq!(lines.last().unwrap(), "after");
    }

    #[test]
    fn test_links_show_target() {
        let text = render("see [docs](https://docs.rs)");
        assert_eq!(plain_lines(&text), vec!["see docs <https://docs.rs>"]);
    }

    #[test]
    fn test_table_columns_are_aligned() {
        let text = render("| a | long header |\n|---|---|\n| xyz | b |");
        let lines = plain_lines(&text);
        assert_eq!(lines[0], "a   │ long header");
        assert_eq!(lines[1], "────┼────────────");
        assert_eq!(lines[2], "xyz │ b          ");
    }

    #[test]
    fn test_task_list_markers() {
        let text = render("- [x] done\n- [ ] todo");
        assert_eq!(plain_lines(&text), vec!["• [x] done", "• [ ] todo"]);
    }
}
