//! Syntax highlighting for fenced code blocks
//!
//! Uses syntect's bundled syntaxes and themes and converts the result into
//! ratatui lines.

use anyhow::Result;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use syntect::{
    easy::HighlightLines,
    highlighting::{FontStyle, Theme as SyntectTheme, ThemeSet},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

/// Syntax highlighter for code content
#[derive(Debug)]
pub struct SyntaxHighlighter {
    /// Syntax set for language detection
    syntax_set: SyntaxSet,

    /// Available highlighting themes
    theme_set: ThemeSet,

    /// Configuration options
    config: HighlightConfig,
}

/// Configuration for syntax highlighting
#[derive(Debug, Clone)]
pub struct HighlightConfig {
    /// Whether to enable syntax highlighting
    pub enabled: bool,

    /// Name of a syntect bundled theme
    pub theme: String,

    /// Whether to show line numbers
    pub show_line_numbers: bool,

    /// Line number width
    pub line_number_width: usize,

    /// Tab width for rendering
    pub tab_width: usize,

    /// Maximum lines to highlight; the rest is emitted plain
    pub max_lines: usize,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            theme: "base16-ocean.dark".to_string(),
            show_line_numbers: false,
            line_number_width: 3,
            tab_width: 4,
            max_lines: 2000,
        }
    }
}

/// Highlighted content with styling information
#[derive(Debug, Clone)]
pub struct HighlightedContent {
    /// Highlighted lines with styling
    pub lines: Vec<Line<'static>>,
}

impl SyntaxHighlighter {
    /// Create a new syntax highlighter
    pub fn new() -> Self {
        Self::with_config(HighlightConfig::default())
    }

    /// Create a new syntax highlighter with custom configuration
    pub fn with_config(config: HighlightConfig) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            config,
        }
    }

    /// Highlight code using a fence tag such as `rust`, `py` or `JavaScript`.
    ///
    /// Unknown or missing tags fall back to first-line detection and then to
    /// plain text.
    pub fn highlight(&self, code: &str, language: Option<&str>) -> Result<HighlightedContent> {
        if !self.config.enabled {
            return Ok(self.create_plain_content(code));
        }

        let syntax = self.resolve_syntax(code, language);
        let theme = self.get_theme()?;
        self.highlight_with_syntax(code, syntax, theme)
    }

    /// Find the syntax for a fence tag
    pub fn resolve_syntax(&self, code: &str, language: Option<&str>) -> &SyntaxReference {
        language
            .map(|tag| tag.split(|c: char| c == ',' || c.is_whitespace()).next().unwrap_or(""))
            .filter(|tag| !tag.is_empty())
            .and_then(|tag| self.syntax_set.find_syntax_by_token(tag))
            .or_else(|| self.syntax_set.find_syntax_by_first_line(code))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    fn highlight_with_syntax(
        &self,
        code: &str,
        syntax: &SyntaxReference,
        theme: &SyntectTheme,
    ) -> Result<HighlightedContent> {
        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();

        for (line_num, line) in LinesWithEndings::from(code).enumerate() {
            if line_num >= self.config.max_lines {
                lines.push(self.plain_line(line.trim_end_matches('\n'), line_num + 1));
                continue;
            }

            let highlighted = highlighter.highlight_line(line, &self.syntax_set)?;
            lines.push(self.render_highlighted_line(&highlighted, line_num + 1));
        }

        Ok(HighlightedContent { lines })
    }

    fn line_number_span(&self, line_number: usize) -> Option<Span<'static>> {
        self.config.show_line_numbers.then(|| {
            Span::styled(
                format!("{:width$} ", line_number, width = self.config.line_number_width),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::DIM),
            )
        })
    }

    fn render_highlighted_line(
        &self,
        highlighted: &[(syntect::highlighting::Style, &str)],
        line_number: usize,
    ) -> Line<'static> {
        let mut spans: Vec<Span<'static>> = self.line_number_span(line_number).into_iter().collect();
        let prefix_len = spans.len();

        for (style, text) in highlighted {
            let expanded_text = text
                .trim_end_matches(['\n', '\r'])
                .replace('\t', &" ".repeat(self.config.tab_width));
            if expanded_text.is_empty() {
                continue;
            }

            let mut span_style = Style::default().fg(Color::Rgb(
                style.foreground.r,
                style.foreground.g,
                style.foreground.b,
            ));

            if style.font_style.contains(FontStyle::BOLD) {
                span_style = span_style.add_modifier(Modifier::BOLD);
            }
            if style.font_style.contains(FontStyle::ITALIC) {
                span_style = span_style.add_modifier(Modifier::ITALIC);
            }
            if style.font_style.contains(FontStyle::UNDERLINE) {
                span_style = span_style.add_modifier(Modifier::UNDERLINED);
            }

            spans.push(Span::styled(expanded_text, span_style));
        }

        // Keep empty lines visible
        if spans.len() == prefix_len {
            spans.push(Span::raw(" "));
        }

        Line::from(spans)
    }

    fn plain_line(&self, line: &str, line_number: usize) -> Line<'static> {
        let mut spans: Vec<Span<'static>> = self.line_number_span(line_number).into_iter().collect();
        spans.push(Span::raw(line.replace('\t', &" ".repeat(self.config.tab_width))));
        Line::from(spans)
    }

    fn create_plain_content(&self, code: &str) -> HighlightedContent {
        let lines = code
            .lines()
            .enumerate()
            .map(|(line_num, line)| self.plain_line(line, line_num + 1))
            .collect();

        HighlightedContent { lines }
    }

    fn get_theme(&self) -> Result<&SyntectTheme> {
        self.theme_set
            .themes
            .get(&self.config.theme)
            .or_else(|| self.theme_set.themes.values().next())
            .ok_or_else(|| anyhow::anyhow!("No themes available"))
    }

}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_fence_tags_resolve() {
        let highlighter = SyntaxHighlighter::new();
        assert_eq!(highlighter.resolve_syntax("", Some("rust")).name, "Rust");
        assert_eq!(highlighter.resolve_syntax("", Some("py")).name, "Python");
        assert_eq!(highlighter.resolve_syntax("", Some("js")).name, "JavaScript");
        assert_eq!(highlighter.resolve_syntax("", Some("rust,ignore")).name, "Rust");
    }

    #[test]
    fn test_unknown_tag_falls_back_to_plain_text() {
        let highlighter = SyntaxHighlighter::new();
        assert_eq!(
            highlighter.resolve_syntax("hello", Some("no-such-lang")).name,
            "Plain Text"
        );
        assert_eq!(highlighter.resolve_syntax("hello", None).name, "Plain Text");
    }

    #[test]
    fn test_shebang_detection_without_tag() {
        let highlighter = SyntaxHighlighter::new();
        let syntax = highlighter.resolve_syntax("#!/bin/bash\necho hi\n", None);
        assert!(syntax.name.to_lowercase().contains("bash"));
    }

    #[test]
    fn test_highlight_keeps_text_and_colors() {
        let highlighter = SyntaxHighlighter::new();
        let code = "fn main() {\n\n    println!(\"hi\");\n}\n";
        let result = highlighter.highlight(code, Some("rust")).unwrap();

        assert_eq!(result.lines.len(), 4);
        assert_eq!(text_of(&result.lines[0]), "fn main() {");
        assert_eq!(text_of(&result.lines[1]), " ");
        assert!(result.lines[0]
            .spans
            .iter()
            .all(|span| matches!(span.style.fg, Some(Color::Rgb(..)))));
    }

    #[test]
    fn test_disabled_highlighting_is_plain() {
        let highlighter = SyntaxHighlighter::with_config(HighlightConfig {
            enabled: false,
            show_line_numbers: true,
            ..Default::default()
        });
        let result = highlighter.highlight("a\tb\nc", Some("rust")).unwrap();
        assert_eq!(text_of(&result.lines[0]), "  1 a    b");
        assert_eq!(result.lines[0].spans[1].style.fg, None);
    }

    #[test]
    fn test_unknown_theme_falls_back_to_a_bundled_one() {
        let highlighter = SyntaxHighlighter::with_config(HighlightConfig {
            theme: "does-not-exist".to_string(),
            ..Default::default()
        });
        let result = highlighter.highlight("let x = 1;", Some("rust")).unwrap();
        assert_eq!(text_of(&result.lines[0]), "let x = 1;");
    }
}
