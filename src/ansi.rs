use std::fmt;

use ratatui::style::{Color, Modifier, Style};
use unicode_width::UnicodeWidthChar;

pub const RESET: &str = "\x1b[0m";

const ESC: char = '\x1b';

/// Scanner state for `ESC [ params final` sequences.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Normal,
    Escape,
    Params,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Visible,
    Pending,
    Complete,
}

impl State {
    fn step(self, c: char) -> (State, Step) {
        match (self, c) {
            (State::Normal, ESC) => (State::Escape, Step::Pending),
            (State::Normal, _) => (State::Normal, Step::Visible),
            (State::Escape, '[') => (State::Params, Step::Pending),
            (State::Escape, ESC) => (State::Escape, Step::Pending),
            // A lone ESC is dropped; what follows it is ordinary text.
            (State::Escape, _) => (State::Normal, Step::Visible),
            (State::Params, '\x40'..='\x7e') => (State::Normal, Step::Complete),
            (State::Params, _) => (State::Params, Step::Pending),
        }
    }
}

fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Number of terminal columns `s` occupies once escape sequences are removed.
pub fn visible_length(s: &str) -> usize {
    let mut state = State::Normal;
    let mut len = 0;
    for c in s.chars() {
        let (next, step) = state.step(c);
        if step == Step::Visible {
            len += char_width(c);
        }
        state = next;
    }
    len
}

/// Cuts `s` down to `max` visible columns, keeping every complete escape
/// sequence seen before the cut and closing with a reset.
pub fn visible_truncate(s: &str, max: usize) -> String {
    if visible_length(s) <= max {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut state = State::Normal;
    let mut seq_start = 0;
    let mut used = 0;

    for (i, c) in s.char_indices() {
        let (next, step) = state.step(c);
        match step {
            Step::Visible => {
                let w = char_width(c);
                if used + w > max {
                    break;
                }
                out.push(c);
                used += w;
            }
            Step::Pending => {
                if state == State::Normal {
                    seq_start = i;
                }
            }
            Step::Complete => {
                out.push_str(&s[seq_start..i + c.len_utf8()]);
            }
        }
        state = next;
    }

    out.push_str(RESET);
    out
}

/// Truncates or right-pads `s` with spaces so it fills exactly `width` columns.
pub fn fit(s: &str, width: usize) -> String {
    let cut = visible_truncate(s, width);
    let len = visible_length(&cut);
    let mut out = cut;
    out.push_str(&" ".repeat(width.saturating_sub(len)));
    out
}

/// Removes all escape sequences.
pub fn strip(s: &str) -> String {
    let mut state = State::Normal;
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        let (next, step) = state.step(c);
        if step == Step::Visible {
            out.push(c);
        }
        state = next;
    }
    out
}

/// Wraps `text` in the SGR sequence for `style`, followed by a reset.
pub fn paint(text: &str, style: Style) -> String {
    let mut params: Vec<String> = Vec::new();

    if let Some(seq) = style.fg.and_then(color_to_ansi_fg) {
        params.push(seq);
    }
    if let Some(seq) = style.bg.and_then(color_to_ansi_bg) {
        params.push(seq);
    }
    for (flag, code) in [
        (Modifier::BOLD, "1"),
        (Modifier::DIM, "2"),
        (Modifier::ITALIC, "3"),
        (Modifier::UNDERLINED, "4"),
        (Modifier::CROSSED_OUT, "9"),
    ] {
        if style.add_modifier.contains(flag) {
            params.push(code.to_string());
        }
    }

    if params.is_empty() || text.is_empty() {
        return text.to_string();
    }
    format!("\x1b[{}m{text}{RESET}", params.join(";"))
}

pub fn dim(text: &str) -> String {
    paint(text, Style::default().add_modifier(Modifier::DIM))
}

fn color_to_ansi_fg(color: Color) -> Option<String> {
    match color {
        Color::Black => Some("30".into()),
        Color::Red => Some("31".into()),
        Color::Green => Some("32".into()),
        Color::Yellow => Some("33".into()),
        Color::Blue => Some("34".into()),
        Color::Magenta => Some("35".into()),
        Color::Cyan => Some("36".into()),
        Color::White | Color::Gray => Some("37".into()),
        Color::DarkGray => Some("90".into()),
        Color::LightRed => Some("91".into()),
        Color::LightGreen => Some("92".into()),
        Color::LightYellow => Some("93".into()),
        Color::LightBlue => Some("94".into()),
        Color::LightMagenta => Some("95".into()),
        Color::LightCyan => Some("96".into()),
        Color::Rgb(r, g, b) => Some(format!("38;2;{r};{g};{b}")),
        Color::Indexed(i) => Some(format!("38;5;{i}")),
        _ => None,
    }
}

fn color_to_ansi_bg(color: Color) -> Option<String> {
    match color {
        Color::Black => Some("40".into()),
        Color::Red => Some("41".into()),
        Color::Green => Some("42".into()),
        Color::Yellow => Some("43".into()),
        Color::Blue => Some("44".into()),
        Color::Magenta => Some("45".into()),
        Color::Cyan => Some("46".into()),
        Color::White | Color::Gray => Some("47".into()),
        Color::DarkGray => Some("100".into()),
        Color::LightRed => Some("101".into()),
        Color::LightGreen => Some("102".into()),
        Color::LightYellow => Some("103".into()),
        Color::LightBlue => Some("104".into()),
        Color::LightMagenta => Some("105".into()),
        Color::LightCyan => Some("106".into()),
        Color::Rgb(r, g, b) => Some(format!("48;2;{r};{g};{b}")),
        Color::Indexed(i) => Some(format!("48;5;{i}")),
        _ => None,
    }
}

/// A styled display line and its width in columns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedLine {
    text: String,
    width: usize,
}

impl RenderedLine {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let width = visible_length(&text);
        Self { text, width }
    }

    pub fn blank() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_blank(&self) -> bool {
        self.width == 0 && strip(&self.text).trim().is_empty()
    }

    pub fn plain(&self) -> String {
        strip(&self.text)
    }
}

impl fmt::Display for RenderedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn styled_strategy() -> impl Strategy<Value = String> {
        let piece = prop_oneof![
            "[a-zA-Z0-9 .,]{0,8}",
            (0u8..108).prop_map(|n| format!("\x1b[{n}m")),
            (0u8..=255, 0u8..=255, 0u8..=255).prop_map(|(r, g, b)| format!("\x1b[38;2;{r};{g};{b}m")),
            Just("\x1b[".to_string()),
        ];
        prop::collection::vec(piece, 0..8).prop_map(|parts| parts.concat())
    }

    proptest! {
        #[test]
        fn truncate_respects_budget(s in styled_strategy(), w in 0usize..40) {
            prop_assert!(visible_length(&visible_truncate(&s, w)) <= w);
        }

        #[test]
        fn truncate_is_identity_when_it_fits(s in "[a-z ]{0,30}", extra in 0usize..10) {
            let w = visible_length(&s) + extra;
            prop_assert_eq!(visible_truncate(&s, w), s);
        }

        #[test]
        fn fit_is_exact(s in styled_strategy(), w in 0usize..40) {
            prop_assert_eq!(visible_length(&fit(&s, w)), w);
        }
    }
}
