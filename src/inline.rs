use ratatui::style::{Color, Modifier, Style};

use crate::ansi::paint;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Code(&'a str),
    Bold(&'a str),
    Italic(&'a str),
    Strike(&'a str),
    Link { text: &'a str, url: &'a str },
}

/// Styles emphasis, inline code, strikethrough and links in one line.
pub fn style(line: &str) -> String {
    tokenize(line).into_iter().map(render_token).collect()
}

fn render_token(token: Token<'_>) -> String {
    match token {
        Token::Text(text) => text.to_string(),
        Token::Code(code) => paint(
            &format!(" {code} "),
            Style::default().fg(Color::Yellow).bg(Color::Black),
        ),
        Token::Bold(text) => paint(text, Style::default().add_modifier(Modifier::BOLD)),
        Token::Italic(text) => paint(text, Style::default().add_modifier(Modifier::ITALIC)),
        Token::Strike(text) => paint(text, Style::default().add_modifier(Modifier::CROSSED_OUT)),
        Token::Link { text, .. } => paint(
            text,
            Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
        ),
    }
}

/// Splits a line into styled tokens, taking the first delimiter pair that
/// closes at each position. Unmatched delimiters stay in the text.
pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;

    while i < line.len() {
        if let Some((token, len)) = match_at(line, i) {
            if plain_start < i {
                tokens.push(Token::Text(&line[plain_start..i]));
            }
            tokens.push(token);
            i += len;
            plain_start = i;
        } else {
            i += line[i..].chars().next().map_or(1, char::len_utf8);
        }
    }

    if plain_start < line.len() {
        tokens.push(Token::Text(&line[plain_start..]));
    }
    tokens
}

fn match_at(line: &str, i: usize) -> Option<(Token<'_>, usize)> {
    let rest = &line[i..];
    match rest.as_bytes().first()? {
        b'`' => delimited(rest, "`", '`').map(|(c, n)| (Token::Code(c), n)),
        b'*' => delimited(rest, "**", '*')
            .map(|(c, n)| (Token::Bold(c), n))
            .or_else(|| delimited(rest, "*", '*').map(|(c, n)| (Token::Italic(c), n))),
        b'_' => {
            if line[..i].chars().next_back().is_some_and(char::is_alphanumeric) {
                return None;
            }
            delimited(rest, "__", '_')
                .map(|(c, n)| (Token::Bold(c), n))
                .or_else(|| delimited(rest, "_", '_').map(|(c, n)| (Token::Italic(c), n)))
                .filter(|(_, n)| !rest[*n..].chars().next().is_some_and(char::is_alphanumeric))
        }
        b'~' => delimited(rest, "~~", '~').map(|(c, n)| (Token::Strike(c), n)),
        b'[' => link(rest),
        _ => None,
    }
}

fn delimited<'a>(rest: &'a str, delim: &str, forbid: char) -> Option<(&'a str, usize)> {
    let body = rest.strip_prefix(delim)?;
    let end = body.find(delim)?;
    let content = &body[..end];
    if content.is_empty() || content.contains(forbid) {
        return None;
    }
    Some((content, delim.len() * 2 + end))
}

fn link(rest: &str) -> Option<(Token<'_>, usize)> {
    let body = rest.strip_prefix('[')?;
    let close = body.find(']')?;
    let text = &body[..close];
    let after = body[close + 1..].strip_prefix('(')?;
    let end = after.find(')')?;
    let url = &after[..end];
    if text.is_empty() || url.is_empty() {
        return None;
    }
    Some((Token::Link { text, url }, close + end + 4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::strip;

    #[test]
    fn test_italic_word() {
        let out = style("Some *text* here.");
        assert_eq!(out, "Some \x1b[3mtext\x1b[0m here.");
    }

    #[test]
    fn test_tokens_in_order() {
        let tokens = tokenize("`a` **b** _c_ ~~d~~ [e](http://x)");
        assert_eq!(
            tokens,
            vec![
                Token::Code("a"),
                Token::Text(" "),
                Token::Bold("b"),
                Token::Text(" "),
                Token::Italic("c"),
                Token::Text(" "),
                Token::Strike("d"),
                Token::Text(" "),
                Token::Link { text: "e", url: "http://x" },
            ]
        );
    }

    #[test]
    fn test_unmatched_delimiters_literal() {
        assert_eq!(style("2 * 3 = 6"), "2 * 3 = 6");
        assert_eq!(style("a `tick"), "a `tick");
        assert_eq!(style("[not a link]"), "[not a link]");
    }

    #[test]
    fn test_code_wins_over_emphasis() {
        let tokens = tokenize("`*x*`");
        assert_eq!(tokens, vec![Token::Code("*x*")]);
    }

    #[test]
    fn test_snake_case_not_italic() {
        assert_eq!(style("call some_func_name now"), "call some_func_name now");
    }

    #[test]
    fn test_link_drops_url() {
        let out = style("see [docs](https://docs.rs) now");
        assert_eq!(strip(&out), "see docs now");
    }

    #[test]
    fn test_styled_never_wider_than_source() {
        let line = "mix `code` and **bold** and [link](u) ok";
        assert!(crate::ansi::visible_length(&style(line)) <= line.len());
    }
}
