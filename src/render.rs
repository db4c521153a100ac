use ratatui::style::{Color, Modifier, Style};

use crate::ansi::{RenderedLine, dim, paint};
use crate::highlight::CodeBlockRenderer;
use crate::html;
use crate::inline::{self, Token};
use crate::wrap::wrap_hard;

const RULE_MAX: usize = 40;
const QUOTE_BAR: &str = "  │ ";
const QUOTE_BAR_WIDTH: usize = 4;

/// Turns raw article markup into wrapped, styled display lines.
pub struct ContentFormatter {
    code: CodeBlockRenderer,
}

impl Default for ContentFormatter {
    fn default() -> Self {
        Self::new(CodeBlockRenderer::default())
    }
}

impl ContentFormatter {
    pub fn new(code: CodeBlockRenderer) -> Self {
        Self { code }
    }

    pub fn format(&self, raw: &str, width: usize) -> Vec<RenderedLine> {
        let text = normalize(raw);
        if text.trim().is_empty() {
            return Vec::new();
        }

        // Zero columns cannot hold text; one is the least a line can use.
        let mut renderer = Renderer::new(width.max(1), &self.code);
        for line in text.split('\n') {
            renderer.line(line);
        }
        renderer.finish()
    }
}

/// Entity decoding, HTML conversion and whitespace cleanup: everything before
/// line classification.
pub fn normalize(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    let markdown = if html::looks_like_html(&decoded) {
        html::to_markdown(&decoded)
    } else {
        decoded.into_owned()
    };
    collapse_blank_runs(&collapse_spaces(&markdown))
}

/// Collapses interior runs of spaces and tabs and trims line ends. Leading
/// indentation and fenced code are left alone.
fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_fence = false;

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let line = line.trim_end_matches('\r');
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            out.push_str(line.trim());
            continue;
        }
        if in_fence {
            out.push_str(line);
            continue;
        }

        let body = line.trim_start_matches([' ', '\t']);
        let indent = &line[..line.len() - body.len()];
        out.push_str(&indent.replace('\t', "  "));
        let mut in_space = false;
        for c in body.trim_end().chars() {
            if c == ' ' || c == '\t' {
                if !in_space {
                    out.push(' ');
                }
                in_space = true;
            } else {
                out.push(c);
                in_space = false;
            }
        }
    }
    out
}

fn collapse_blank_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(c);
            }
        } else {
            newlines = 0;
            out.push(c);
        }
    }
    out
}

/// How a single line of normalized text is rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block<'a> {
    Fence { lang: Option<&'a str> },
    Heading { level: usize, text: &'a str },
    Quote(&'a str),
    Rule,
    Bullet { indent: usize, text: &'a str },
    Numbered { indent: usize, number: &'a str, text: &'a str },
    Image(&'a str),
    Embed(&'a str),
    Link { text: &'a str, url: &'a str },
    Blank,
    Paragraph(&'a str),
}

const EMBED_MARKERS: &[&str] = &["[YouTube", "[Vimeo", "[Twitter", "[Embedded"];

pub fn classify(line: &str) -> Block<'_> {
    let trimmed = line.trim();
    let indent = line.len() - line.trim_start().len();

    if let Some(rest) = trimmed.strip_prefix("```") {
        let lang = rest.split_whitespace().next();
        return Block::Fence { lang };
    }

    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if (1..=6).contains(&hashes) {
        let rest = &line[hashes..];
        if rest.is_empty() || rest.starts_with(' ') {
            return Block::Heading { level: hashes, text: rest.trim() };
        }
    }

    if trimmed.starts_with('>') {
        return Block::Quote(trimmed.trim_start_matches(|c: char| c == '>' || c.is_whitespace()));
    }

    if trimmed.len() >= 3 && trimmed.chars().all(|c| matches!(c, '-' | '*' | '_')) {
        return Block::Rule;
    }

    if let Some(text) = trimmed
        .strip_prefix(['-', '*', '+'])
        .and_then(|rest| rest.strip_prefix([' ', '\t']))
    {
        return Block::Bullet { indent, text: text.trim() };
    }

    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0
        && let Some(text) = trimmed[digits..].strip_prefix(". ")
    {
        return Block::Numbered { indent, number: &trimmed[..digits], text: text.trim() };
    }

    if trimmed.contains("[Image:") {
        return Block::Image(trimmed);
    }
    if EMBED_MARKERS.iter().any(|m| trimmed.contains(m)) {
        return Block::Embed(trimmed);
    }

    if let [Token::Link { text, url }] = inline::tokenize(trimmed).as_slice() {
        return Block::Link { text: *text, url: *url };
    }

    if trimmed.is_empty() {
        Block::Blank
    } else {
        Block::Paragraph(trimmed)
    }
}

fn heading_style(level: usize) -> Style {
    let base = Style::default();
    match level {
        1 => base.fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        2 => base.fg(Color::Magenta).add_modifier(Modifier::BOLD),
        3 => base.fg(Color::Yellow).add_modifier(Modifier::BOLD),
        4 => base.fg(Color::Cyan).add_modifier(Modifier::BOLD),
        5 => base.fg(Color::Cyan),
        _ => base.fg(Color::Cyan).add_modifier(Modifier::ITALIC),
    }
}

struct CodeCapture {
    lang: Option<String>,
    lines: Vec<String>,
}

struct Renderer<'a> {
    lines: Vec<RenderedLine>,
    code: Option<CodeCapture>,
    highlighter: &'a CodeBlockRenderer,
    width: usize,
}

impl<'a> Renderer<'a> {
    fn new(width: usize, highlighter: &'a CodeBlockRenderer) -> Self {
        Self {
            lines: Vec::new(),
            code: None,
            highlighter,
            width,
        }
    }

    fn push(&mut self, text: String) {
        self.lines.push(RenderedLine::new(text));
    }

    fn push_blank(&mut self) {
        self.lines.push(RenderedLine::blank());
    }

    fn line(&mut self, line: &str) {
        let block = classify(line);

        if let Some(capture) = self.code.as_mut() {
            if matches!(block, Block::Fence { .. }) {
                self.flush_code();
                self.push_blank();
            } else {
                capture.lines.push(line.to_string());
            }
            return;
        }

        match block {
            Block::Fence { lang } => {
                self.code = Some(CodeCapture {
                    lang: lang.map(str::to_string),
                    lines: Vec::new(),
                });
            }
            Block::Heading { level, text } => {
                self.push_blank();
                let style = heading_style(level);
                for wl in wrap_hard(text, self.width) {
                    self.push(paint(&wl, style));
                }
                self.push_blank();
            }
            Block::Quote(text) => self.quote(text),
            Block::Rule => {
                self.push_blank();
                self.push(dim(&"─".repeat(self.width.min(RULE_MAX))));
                self.push_blank();
            }
            Block::Bullet { indent, text } => self.list_item(indent, "• ", text),
            Block::Numbered { indent, number, text } => {
                self.list_item(indent, &format!("{number}. "), text);
            }
            Block::Image(text) => {
                let style = Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC);
                for wl in wrap_hard(text, self.width) {
                    self.push(paint(&wl, style));
                }
            }
            Block::Embed(text) => {
                let style = Style::default().fg(Color::Blue).add_modifier(Modifier::ITALIC);
                for wl in wrap_hard(text, self.width) {
                    self.push(paint(&wl, style));
                }
            }
            Block::Link { text, url } => self.link(text, url),
            Block::Blank => self.push_blank(),
            Block::Paragraph(text) => {
                for wl in wrap_hard(text, self.width) {
                    self.push(inline::style(&wl));
                }
            }
        }
    }

    fn quote(&mut self, text: &str) {
        let style = Style::default().add_modifier(Modifier::ITALIC);
        // Narrow budgets drop the bar before any text.
        let bar = if self.width > QUOTE_BAR_WIDTH { dim(QUOTE_BAR) } else { String::new() };
        let avail = if bar.is_empty() { self.width } else { self.width - QUOTE_BAR_WIDTH };

        let wrapped = wrap_hard(text, avail);
        if wrapped.is_empty() {
            if bar.is_empty() {
                self.push_blank();
            } else {
                self.push(dim(QUOTE_BAR.trim_end()));
            }
        }
        for wl in wrapped {
            self.push(format!("{bar}{}", paint(&wl, style)));
        }
    }

    fn list_item(&mut self, indent: usize, marker: &str, text: &str) {
        let pad = "  ".repeat(indent / 2);
        let marker_width = marker.chars().count();
        let prefix_width = pad.len() + marker_width;
        if prefix_width >= self.width {
            for wl in wrap_hard(&format!("{marker}{text}"), self.width) {
                self.push(inline::style(&wl));
            }
            return;
        }
        let avail = self.width - prefix_width;
        let continuation = format!("{pad}{}", " ".repeat(marker_width));
        let bullet = paint(marker, Style::default().fg(Color::Green));

        let wrapped = wrap_hard(text, avail);
        if wrapped.is_empty() {
            self.push(format!("{pad}{bullet}"));
        }
        for (i, wl) in wrapped.iter().enumerate() {
            let styled = inline::style(wl);
            if i == 0 {
                self.push(format!("{pad}{bullet}{styled}"));
            } else {
                self.push(format!("{continuation}{styled}"));
            }
        }
    }

    fn link(&mut self, text: &str, url: &str) {
        let link_style = Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED);
        let suffix = format!(" ({url})");
        let text_width = unicode_width::UnicodeWidthStr::width(text);
        let suffix_width = unicode_width::UnicodeWidthStr::width(suffix.as_str());

        if text_width + suffix_width <= self.width {
            self.push(format!("{}{}", paint(text, link_style), dim(&suffix)));
            return;
        }
        for wl in wrap_hard(text, self.width) {
            self.push(paint(&wl, link_style));
        }
        for wl in wrap_hard(&format!("({url})"), self.width) {
            self.push(dim(&wl));
        }
    }

    fn flush_code(&mut self) {
        if let Some(capture) = self.code.take() {
            let code = capture.lines.join("\n");
            let rendered = self
                .highlighter
                .render(&code, capture.lang.as_deref(), self.width);
            self.lines.extend(rendered);
        }
    }

    fn finish(mut self) -> Vec<RenderedLine> {
        if self.code.as_ref().is_some_and(|c| !c.lines.is_empty()) {
            self.flush_code();
        }

        let mut out: Vec<RenderedLine> = Vec::with_capacity(self.lines.len());
        for line in self.lines {
            if line.is_blank() && out.last().is_some_and(RenderedLine::is_blank) {
                continue;
            }
            out.push(line);
        }
        out
    }
}
