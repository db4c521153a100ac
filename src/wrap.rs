use unicode_width::UnicodeWidthStr;

/// Greedy word wrap on whitespace. A word wider than `width` gets a line of
/// its own and is never split; `width == 0` disables wrapping.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return Vec::new();
    };

    if width == 0 {
        let mut line = first.to_string();
        for word in words {
            line.push(' ');
            line.push_str(word);
        }
        return vec![line];
    }

    let mut lines = Vec::new();
    let mut current = first.to_string();
    let mut current_width = first.width();

    for word in words {
        let w = word.width();
        if current_width + 1 + w <= width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + w;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = w;
        }
    }

    lines.push(current);
    lines
}

/// Like [`wrap`], but also splits over-wide words so every line fits.
pub fn wrap_hard(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for line in wrap(text, width) {
        if line.width() <= width {
            out.push(line);
        } else {
            out.extend(split_columns(&line, width));
        }
    }
    out
}

fn split_columns(s: &str, width: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > width && !chunk.is_empty() {
            chunks.push(std::mem::take(&mut chunk));
            used = 0;
        }
        chunk.push(c);
        used += w;
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_at_word_boundary() {
        let lines = wrap("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn test_wrap_empty_input() {
        assert!(wrap("", 10).is_empty());
        assert!(wrap("   \t ", 10).is_empty());
    }

    #[test]
    fn test_wrap_long_word_own_line() {
        let lines = wrap("a supercalifragilistic b", 5);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn test_wrap_zero_width_is_single_line() {
        assert_eq!(wrap("one  two\nthree", 0), vec!["one two three"]);
    }

    #[test]
    fn test_wrap_hard_splits_long_word() {
        let lines = wrap_hard("https://example.com/a/very/long/path", 10);
        assert!(lines.iter().all(|l| l.width() <= 10));
        assert_eq!(lines.concat(), "https://example.com/a/very/long/path");
    }
}
