use std::sync::LazyLock;

use ratatui::style::{Color, Style};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::as_24_bit_terminal_escaped;
use tracing::warn;

use crate::ansi::{RESET, RenderedLine, dim, fit, paint};

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// Narrowest box that still has both borders.
const MIN_BOXED_WIDTH: usize = 4;
const TAB: &str = "    ";

/// Draws fenced code as a bordered box, highlighted when syntect knows the language.
pub struct CodeBlockRenderer {
    theme: Option<&'static Theme>,
}

impl Default for CodeBlockRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_THEME)
    }
}

impl CodeBlockRenderer {
    pub fn new(theme_name: &str) -> Self {
        let themes = &THEME_SET.themes;
        let theme = themes.get(theme_name).or_else(|| {
            warn!(theme = theme_name, "unknown theme, falling back to {DEFAULT_THEME}");
            themes.get(DEFAULT_THEME)
        });
        Self { theme }
    }

    /// Every returned line is exactly `width` columns. Below the narrowest
    /// box the borders and label are dropped and only code rows remain.
    pub fn render(&self, code: &str, lang: Option<&str>, width: usize) -> Vec<RenderedLine> {
        let lang = lang.map(str::trim).filter(|l| !l.is_empty());
        let source: Vec<String> = code.lines().map(|l| l.replace('\t', TAB)).collect();
        let body = lang
            .and_then(|l| self.highlight(&source, l))
            .unwrap_or(source);

        if width < MIN_BOXED_WIDTH {
            return body
                .iter()
                .map(|line| RenderedLine::new(format!("{}{RESET}", fit(line, width))))
                .collect();
        }

        let inner = width - 4;
        let rule = "─".repeat(width - 2);
        let mut lines = vec![RenderedLine::new(dim(&format!("┌{rule}┐")))];

        if let Some(lang) = lang {
            let label = paint(&lang.to_uppercase(), Style::default().fg(Color::Yellow));
            lines.push(row(&label, inner));
            lines.push(RenderedLine::new(dim(&format!("├{rule}┤"))));
        }

        for line in &body {
            lines.push(row(line, inner));
        }

        lines.push(RenderedLine::new(dim(&format!("└{rule}┘"))));
        lines
    }

    fn highlight(&self, source: &[String], lang: &str) -> Option<Vec<String>> {
        let theme = self.theme?;
        let ss = &*SYNTAX_SET;
        let syntax = ss.find_syntax_by_token(lang)?;
        let mut h = HighlightLines::new(syntax, theme);

        let mut out = Vec::with_capacity(source.len());
        for line in source {
            let with_newline = format!("{line}\n");
            match h.highlight_line(&with_newline, ss) {
                Ok(ranges) => {
                    let escaped = as_24_bit_terminal_escaped(&ranges, false);
                    out.push(escaped.trim_end_matches('\n').to_string());
                }
                Err(err) => {
                    warn!(lang, error = %err, "highlighting failed, rendering plain");
                    return None;
                }
            }
        }
        Some(out)
    }
}

fn row(content: &str, inner: usize) -> RenderedLine {
    RenderedLine::new(format!("{}{}{RESET}{}", dim("│ "), fit(content, inner), dim(" │")))
}
