use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Layout utilities for TUI components
pub mod layout {
    use super::*;

    /// Create a centered rectangle with given width and height
    pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let width = width.min(area.width);
        let height = height.min(area.height);

        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length((area.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Min(0),
            ])
            .split(area);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length((area.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Min(0),
            ])
            .split(popup_layout[1])[1]
    }
}

/// Text utilities for styled lines
pub mod text {
    use ratatui::{
        style::{Modifier, Style},
        text::{Line, Span},
    };
    use unicode_segmentation::UnicodeSegmentation;
    use unicode_width::UnicodeWidthStr;

    /// Display width of a line
    pub fn line_width(line: &Line) -> usize {
        line.spans.iter().map(|span| span.content.width()).sum()
    }

    /// Hard-wrap a styled line into lines no wider than `width` columns.
    ///
    /// Breaks fall on grapheme boundaries and keep each span's style.
    pub fn wrap_line(line: &Line<'static>, width: usize) -> Vec<Line<'static>> {
        if width == 0 || line_width(line) <= width {
            return vec![line.clone()];
        }

        let mut wrapped = Vec::new();
        let mut current: Vec<Span<'static>> = Vec::new();
        let mut current_width = 0;

        for span in &line.spans {
            let mut chunk = String::new();
            for grapheme in span.content.graphemes(true) {
                let grapheme_width = grapheme.width();
                if current_width + grapheme_width > width && current_width > 0 {
                    if !chunk.is_empty() {
                        current.push(Span::styled(std::mem::take(&mut chunk), span.style));
                    }
                    wrapped.push(Line::from(std::mem::take(&mut current)));
                    current_width = 0;
                }
                chunk.push_str(grapheme);
                current_width += grapheme_width;
            }
            if !chunk.is_empty() {
                current.push(Span::styled(chunk, span.style));
            }
        }

        if !current.is_empty() {
            wrapped.push(Line::from(current));
        }

        wrapped
    }

    /// Render styled lines as ANSI-escaped text for a plain terminal
    pub fn lines_to_ansi(lines: &[Line]) -> String {
        use crossterm::style::{Attribute, Attributes, Color as AnsiColor, ContentStyle, StyledContent};

        let mut out = String::new();
        for line in lines {
            for span in &line.spans {
                let style: Style = span.style;
                let mut content_style = ContentStyle::new();
                content_style.foreground_color = style.fg.map(AnsiColor::from);
                content_style.background_color = style.bg.map(AnsiColor::from);

                let mut attributes = Attributes::default();
                if style.add_modifier.contains(Modifier::BOLD) {
                    attributes.set(Attribute::Bold);
                }
                if style.add_modifier.contains(Modifier::ITALIC) {
                    attributes.set(Attribute::Italic);
                }
                if style.add_modifier.contains(Modifier::UNDERLINED) {
                    attributes.set(Attribute::Underlined);
                }
                if style.add_modifier.contains(Modifier::CROSSED_OUT) {
                    attributes.set(Attribute::CrossedOut);
                }
                content_style.attributes = attributes;

                out.push_str(&StyledContent::new(content_style, span.content.as_ref()).to_string());
            }
            out.push('\n');
        }
        out
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use ratatui::style::Color;

        fn plain(line: &Line) -> String {
            line.spans.iter().map(|span| span.content.as_ref()).collect()
        }

        #[test]
        fn test_short_line_is_untouched() {
            let line = Line::from("hello");
            let wrapped = wrap_line(&line, 10);
            assert_eq!(wrapped.len(), 1);
            assert_eq!(plain(&wrapped[0]), "hello");
        }

        #[test]
        fn test_wrap_keeps_styles_across_breaks() {
            let red = Style::default().fg(Color::Red);
            let line = Line::from(vec![Span::raw("abcd"), Span::styled("efgh", red)]);
            let wrapped = wrap_line(&line, 3);

            let texts: Vec<String> = wrapped.iter().map(plain).collect();
            assert_eq!(texts, vec!["abc", "def", "gh"]);
            assert_eq!(wrapped[1].spans[1].style, red);
            assert_eq!(wrapped[2].spans[0].style, red);
        }

        #[test]
        fn test_wide_graphemes_count_double() {
            let line = Line::from("日本語");
            let wrapped = wrap_line(&line, 4);
            let texts: Vec<String> = wrapped.iter().map(plain).collect();
            assert_eq!(texts, vec!["日本", "語"]);
        }

        #[test]
        fn test_ansi_output_contains_text() {
            let lines = vec![Line::from(Span::styled(
                "bold",
                Style::default().add_modifier(Modifier::BOLD),
            ))];
            let ansi = lines_to_ansi(&lines);
            assert!(ansi.contains("bold"));
            assert!(ansi.contains("\u{1b}["));
            assert!(ansi.ends_with('\n'));
        }
    }
}
