//! Core markdown rendering engine
//!
//! Converts markdown into ratatui `Text`, handing fenced code bodies to the
//! syntax highlighter.

use anyhow::Result;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::Style,
    text::{Line, Span, Text},
};
use tracing::debug;
use unicode_width::UnicodeWidthStr;

use super::{styles::MarkdownStyles, MarkdownConfig};
use crate::tui::components::highlighting::SyntaxHighlighter;

/// Markdown rendering context
#[derive(Debug, Default)]
struct RenderContext {
    /// Current line buffer
    current_line: Vec<Span<'static>>,

    /// All rendered lines
    lines: Vec<Line<'static>>,

    /// Active inline styles, innermost last
    inline_styles: Vec<Style>,

    /// One entry per open list; `Some(n)` is the next number of an ordered list
    lists: Vec<Option<u64>>,

    /// Nesting depth of block quotes
    quote_depth: usize,

    /// Open fenced or indented code block
    code_block: Option<CodeBlockState>,

    /// Open table
    table: Option<TableState>,

    /// Targets of open links, innermost last
    links: Vec<String>,
}

#[derive(Debug)]
struct CodeBlockState {
    language: Option<String>,
    content: String,
}

/// Table rendering state
#[derive(Debug, Default)]
struct TableState {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    current_row: Vec<String>,
    current_cell: String,
    in_header: bool,
}

/// Core markdown renderer
pub struct MarkdownRenderer<'a> {
    config: MarkdownConfig,
    styles: MarkdownStyles,
    highlighter: &'a SyntaxHighlighter,
}

impl<'a> MarkdownRenderer<'a> {
    /// Create a new markdown renderer
    pub fn new(config: &MarkdownConfig, styles: MarkdownStyles, highlighter: &'a SyntaxHighlighter) -> Self {
        Self {
            config: config.clone(),
            styles,
            highlighter,
        }
    }

    /// Render markdown content to Text
    pub fn render(&self, content: &str, width: u16) -> Result<Text<'static>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_FOOTNOTES);

        let parser = Parser::new_ext(content, options);
        let mut context = RenderContext::default();

        for event in parser {
            self.handle_event(event, &mut context, width)?;
        }

        // Finalize any remaining content
        self.flush_current_line(&mut context);
        while context.lines.last().map_or(false, is_blank) {
            context.lines.pop();
        }

        Ok(Text::from(context.lines))
    }

    fn handle_event(&self, event: Event, context: &mut RenderContext, width: u16) -> Result<()> {
        match event {
            Event::Start(tag) => self.handle_start_tag(tag, context),
            Event::End(tag_end) => self.handle_end_tag(tag_end, context, width)?,
            Event::Text(text) => self.handle_text(text, context),
            Event::Code(code) => self.handle_inline_code(code, context),
            Event::Html(html) | Event::InlineHtml(html) => self.handle_html(html, context),
            Event::SoftBreak => self.handle_soft_break(context),
            Event::HardBreak => self.flush_current_line(context),
            Event::Rule => self.handle_rule(context, width),
            Event::FootnoteReference(label) => {
                context
                    .current_line
                    .push(Span::styled(format!("[^{}]", label), self.styles.footnote));
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                context
                    .current_line
                    .push(Span::styled(marker, self.styles.task_marker));
            }
            #[allow(unreachable_patterns)]
            _ => {}
        }

        Ok(())
    }

    fn handle_start_tag(&self, tag: Tag, context: &mut RenderContext) {
        match tag {
            Tag::Paragraph => {
                if context.lists.is_empty() && context.table.is_none() {
                    self.flush_current_line(context);
                }
            }
            Tag::Heading { level, .. } => self.start_heading(level, context),
            Tag::BlockQuote => {
                self.flush_current_line(context);
                if context.quote_depth == 0 {
                    self.ensure_blank_line(context);
                }
                context.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => self.start_code_block(kind, context),
            Tag::List(start) => {
                self.flush_current_line(context);
                if context.lists.is_empty() {
                    self.ensure_blank_line(context);
                }
                context.lists.push(start);
            }
            Tag::Item => self.start_list_item(context),
            Tag::Emphasis => self.push_inline_style(self.styles.emphasis, context),
            Tag::Strong => self.push_inline_style(self.styles.strong, context),
            Tag::Strikethrough => self.push_inline_style(self.styles.strikethrough, context),
            Tag::Link { dest_url, .. } => {
                self.push_inline_style(self.styles.link, context);
                context.links.push(dest_url.into_string());
            }
            Tag::Image { dest_url, .. } => {
                context.current_line.push(Span::styled("[image: ", self.styles.image));
                self.push_inline_style(self.styles.image, context);
                context.links.push(dest_url.into_string());
            }
            Tag::Table(_) => {
                self.flush_current_line(context);
                self.ensure_blank_line(context);
                context.table = Some(TableState::default());
            }
            Tag::TableHead => {
                if let Some(table) = context.table.as_mut() {
                    table.in_header = true;
                    table.current_row.clear();
                }
            }
            Tag::TableRow => {
                if let Some(table) = context.table.as_mut() {
                    table.current_row.clear();
                }
            }
            Tag::TableCell => {
                if let Some(table) = context.table.as_mut() {
                    table.current_cell.clear();
                }
            }
            Tag::FootnoteDefinition(label) => {
                self.flush_current_line(context);
                context
                    .current_line
                    .push(Span::styled(format!("[^{}]: ", label), self.styles.footnote));
            }
            _ => {}
        }
    }

    fn handle_end_tag(&self, tag_end: TagEnd, context: &mut RenderContext, width: u16) -> Result<()> {
        match tag_end {
            TagEnd::Paragraph => {
                self.flush_current_line(context);
                if context.lists.is_empty() && context.quote_depth == 0 {
                    context.lines.push(Line::default());
                }
            }
            TagEnd::Heading(_) => {
                context.inline_styles.pop();
                self.flush_current_line(context);
                context.lines.push(Line::default());
            }
            TagEnd::BlockQuote => {
                self.flush_current_line(context);
                context.quote_depth = context.quote_depth.saturating_sub(1);
                if context.quote_depth == 0 {
                    context.lines.push(Line::default());
                }
            }
            TagEnd::CodeBlock => self.end_code_block(context),
            TagEnd::List(_) => {
                self.flush_current_line(context);
                context.lists.pop();
                if context.lists.is_empty() {
                    context.lines.push(Line::default());
                }
            }
            TagEnd::Item => self.flush_current_line(context),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                context.inline_styles.pop();
            }
            TagEnd::Link => {
                context.inline_styles.pop();
                self.end_link(context);
            }
            TagEnd::Image => {
                context.inline_styles.pop();
                if let Some(target) = context.links.pop() {
                    context
                        .current_line
                        .push(Span::styled(format!(" <{}>", target), self.styles.link_target));
                }
                context.current_line.push(Span::styled("]", self.styles.image));
            }
            TagEnd::Table => {
                if let Some(table) = context.table.take() {
                    self.render_table(table, context, width);
                }
                context.lines.push(Line::default());
            }
            TagEnd::TableHead => {
                if let Some(table) = context.table.as_mut() {
                    table.headers = std::mem::take(&mut table.current_row);
                    table.in_header = false;
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = context.table.as_mut() {
                    let row = std::mem::take(&mut table.current_row);
                    table.rows.push(row);
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = context.table.as_mut() {
                    let cell = std::mem::take(&mut table.current_cell);
                    table.current_row.push(cell.trim().to_string());
                }
            }
            TagEnd::FootnoteDefinition => self.flush_current_line(context),
            _ => {}
        }

        Ok(())
    }

    fn handle_text(&self, text: CowStr, context: &mut RenderContext) {
        if let Some(code) = context.code_block.as_mut() {
            code.content.push_str(&text);
            return;
        }

        if let Some(table) = context.table.as_mut() {
            table.current_cell.push_str(&text);
            return;
        }

        let style = self.current_style(context);
        context.current_line.push(Span::styled(text.into_string(), style));
    }

    fn handle_inline_code(&self, code: CowStr, context: &mut RenderContext) {
        if let Some(table) = context.table.as_mut() {
            table.current_cell.push_str(&code);
            return;
        }

        context
            .current_line
            .push(Span::styled(format!(" {} ", code), self.styles.inline_code));
    }

    fn handle_html(&self, html: CowStr, context: &mut RenderContext) {
        for (index, line) in html.lines().enumerate() {
            if index > 0 {
                self.flush_current_line(context);
            }
            context
                .current_line
                .push(Span::styled(line.to_string(), self.styles.html));
        }
    }

    fn handle_soft_break(&self, context: &mut RenderContext) {
        if let Some(table) = context.table.as_mut() {
            table.current_cell.push(' ');
            return;
        }
        context.current_line.push(Span::raw(" "));
    }

    fn handle_rule(&self, context: &mut RenderContext, width: u16) {
        self.flush_current_line(context);
        self.ensure_blank_line(context);

        let rule_width = (width as usize).clamp(3, self.config.max_rule_width);
        context
            .lines
            .push(Line::from(Span::styled("─".repeat(rule_width), self.styles.rule)));
        context.lines.push(Line::default());
    }

    fn start_heading(&self, level: HeadingLevel, context: &mut RenderContext) {
        self.flush_current_line(context);
        self.ensure_blank_line(context);

        let depth = level as usize;
        let style = self.styles.heading(depth);
        context
            .current_line
            .push(Span::styled(format!("{} ", "#".repeat(depth)), style));
        context.inline_styles.push(style);
    }

    fn start_code_block(&self, kind: CodeBlockKind, context: &mut RenderContext) {
        self.flush_current_line(context);
        self.ensure_blank_line(context);

        let language = match kind {
            CodeBlockKind::Fenced(lang) => {
                let lang = lang.trim();
                (!lang.is_empty()).then(|| lang.to_string())
            }
            CodeBlockKind::Indented => None,
        };

        context.code_block = Some(CodeBlockState {
            language,
            content: String::new(),
        });
    }

    fn end_code_block(&self, context: &mut RenderContext) {
        let Some(code) = context.code_block.take() else {
            return;
        };

        let indent = self.indent(context);
        if let Some(language) = &code.language {
            context.lines.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::styled(format!("┌ {}", language), self.styles.code_language),
            ]));
        }

        let highlighted = match self.highlighter.highlight(&code.content, code.language.as_deref()) {
            Ok(content) => content.lines,
            Err(e) => {
                debug!("Highlighting failed, rendering code block plain: {}", e);
                code.content
                    .lines()
                    .map(|line| Line::from(Span::styled(line.to_string(), self.styles.text)))
                    .collect()
            }
        };

        for line in highlighted {
            let mut spans = vec![
                Span::raw(indent.clone()),
                Span::styled("│ ", self.styles.code_gutter),
            ];
            spans.extend(line.spans);
            context.lines.push(Line::from(spans));
        }

        context.lines.push(Line::default());
    }

    fn start_list_item(&self, context: &mut RenderContext) {
        self.flush_current_line(context);

        let depth = context.lists.len();
        let marker = match context.lists.last_mut() {
            Some(Some(number)) => {
                let marker = format!("{}. ", number);
                *number += 1;
                marker
            }
            _ if depth % 2 == 1 => "• ".to_string(),
            _ => "◦ ".to_string(),
        };

        context
            .current_line
            .push(Span::styled(marker, self.styles.list_marker));
    }

    fn end_link(&self, context: &mut RenderContext) {
        let Some(target) = context.links.pop() else {
            return;
        };

        // Autolinks already show their target as the link text
        let shows_target = context
            .current_line
            .last()
            .map_or(false, |span| span.content.as_ref() == target);

        if !target.is_empty() && !shows_target {
            context
                .current_line
                .push(Span::styled(format!(" <{}>", target), self.styles.link_target));
        }
    }

    fn render_table(&self, table: TableState, context: &mut RenderContext, width: u16) {
        let columns = table
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(table.headers.len()))
            .max()
            .unwrap_or(0);
        if columns == 0 {
            return;
        }

        let mut widths = vec![0usize; columns];
        for row in std::iter::once(&table.headers).chain(table.rows.iter()) {
            for (index, cell) in row.iter().enumerate() {
                widths[index] = widths[index].max(cell.width());
            }
        }

        let indent = self.indent(context);
        let separator = Span::styled(" │ ", self.styles.table_separator);
        let render_row = |row: &[String], style: Style| -> Line<'static> {
            let mut spans = vec![Span::raw(indent.clone())];
            for (index, column_width) in widths.iter().enumerate() {
                if index > 0 {
                    spans.push(separator.clone());
                }
                let cell = row.get(index).map(String::as_str).unwrap_or("");
                let padding = column_width.saturating_sub(cell.width());
                spans.push(Span::styled(format!("{}{}", cell, " ".repeat(padding)), style));
            }
            Line::from(spans)
        };

        if !table.headers.is_empty() {
            context.lines.push(render_row(&table.headers, self.styles.table_header));

            let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            let mut rule_line = rule.join("─┼─");
            let limit = width as usize;
            if limit > 0 && rule_line.chars().count() > limit {
                rule_line = rule_line.chars().take(limit).collect();
            }
            context.lines.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::styled(rule_line, self.styles.table_separator),
            ]));
        }

        for row in &table.rows {
            context.lines.push(render_row(row, self.styles.table_cell));
        }
    }

    fn push_inline_style(&self, style: Style, context: &mut RenderContext) {
        let patched = self.current_style(context).patch(style);
        context.inline_styles.push(patched);
    }

    fn current_style(&self, context: &RenderContext) -> Style {
        context.inline_styles.last().copied().unwrap_or(if context.quote_depth > 0 {
            self.styles.quote_text
        } else {
            self.styles.text
        })
    }

    fn indent(&self, context: &RenderContext) -> String {
        let list_depth = context.lists.len().saturating_sub(1);
        " ".repeat(list_depth * self.config.list_indent as usize)
    }

    fn ensure_blank_line(&self, context: &mut RenderContext) {
        if context.lines.last().map_or(false, |line| !is_blank(line)) {
            context.lines.push(Line::default());
        }
    }

    fn flush_current_line(&self, context: &mut RenderContext) {
        if context.current_line.is_empty() {
            return;
        }

        let mut spans = Vec::new();
        let indent = self.indent(context);
        if !indent.is_empty() {
            spans.push(Span::raw(indent));
        }

        for _ in 0..context.quote_depth {
            spans.push(Span::styled("│ ", self.styles.quote_marker));
        }

        spans.append(&mut context.current_line);
        context.lines.push(Line::from(spans));
    }
}

fn is_blank(line: &Line) -> bool {
    line.spans.iter().all(|span| span.content.trim().is_empty())
}
