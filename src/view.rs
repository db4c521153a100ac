use chrono::{DateTime, Local, Utc};
use ratatui::style::{Color, Modifier, Style};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::ansi::{dim, paint, visible_length, visible_truncate};
use crate::feed::{Article, ReadFilter};
use crate::model::{MenuItem, Mode, Prompt, ScreenModel};
use crate::wrap::wrap_hard;

const TITLE: &str = "Feedview";
/// Columns kept free next to an entry title for the author and date.
const META_COLUMNS: usize = 30;
const AUTHOR_COLUMNS: usize = 20;
const MARGIN: &str = "  ";

/// One screen as ANSI-styled lines, split into fixed header and footer around a body.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub header: Vec<String>,
    pub body: Vec<String>,
    pub footer: Vec<String>,
    /// Reader position and furthest scroll, when the content overflows.
    pub scroll: Option<(usize, usize)>,
}

pub struct ViewContext<'a> {
    pub is_read: &'a dyn Fn(&str) -> bool,
    pub loaded: bool,
    pub subscribed: bool,
}

/// Rows left for the body once header and footer are laid out.
pub fn body_height(model: &ScreenModel, width: usize, height: usize) -> usize {
    height.saturating_sub(header(model, width).len() + footer(model, width).len())
}

pub fn render(model: &ScreenModel, ctx: &ViewContext<'_>, width: usize, height: usize) -> Frame {
    let header = header(model, width);
    let footer = footer(model, width);
    let rows = height.saturating_sub(header.len() + footer.len());

    let mut body = match model.prompt() {
        Some(prompt) => prompt_body(prompt, model.categories(), width),
        None => match model.mode() {
            Mode::MainMenu | Mode::CategoryMenu | Mode::Subscriptions => menu_body(model, width),
            Mode::FeedList => feed_body(model, ctx, width),
            Mode::Reader => reader_body(model, rows),
        },
    };
    body.truncate(rows);
    let body = body.iter().map(|l| visible_truncate(l, width)).collect();
    let scroll = match (model.mode(), model.reader(), model.prompt()) {
        (Mode::Reader, Some(reader), None) => {
            let max = reader.lines.len().saturating_sub(rows);
            (max > 0).then_some((reader.scroll, max))
        }
        _ => None,
    };

    Frame {
        header,
        body,
        footer,
        scroll,
    }
}

/// Shown while a refresh or article fetch blocks the loop.
pub fn busy(message: &str, width: usize) -> Frame {
    Frame {
        header: title_bar(TITLE, width),
        body: vec![format!("{MARGIN}{}", paint(message, Style::default().fg(Color::Yellow)))],
        footer: Vec::new(),
        scroll: None,
    }
}

fn title_bar(title: &str, width: usize) -> Vec<String> {
    vec![
        visible_truncate(&paint(title, heading()), width),
        dim(&"─".repeat(width)),
        String::new(),
    ]
}

fn heading() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn header(model: &ScreenModel, width: usize) -> Vec<String> {
    match model.mode() {
        Mode::MainMenu => title_bar(&format!("{TITLE} - Main Menu"), width),
        Mode::CategoryMenu => title_bar("Manage Categories", width),
        Mode::Subscriptions => title_bar("Manage Subscriptions", width),
        Mode::FeedList => {
            let scope = model.category_filter().unwrap_or("All Categories");
            let mut lines = title_bar(&format!("{TITLE} - {scope}"), width);
            let title = format!("{} {}", lines[0], badge(model.read_filter()));
            lines[0] = visible_truncate(&title, width);
            lines
        }
        Mode::Reader => match model.reader() {
            Some(reader) => reader_header(&reader.article, width),
            None => title_bar(TITLE, width),
        },
    }
}

fn badge(filter: ReadFilter) -> String {
    match filter {
        ReadFilter::All => dim("[ALL]"),
        ReadFilter::Unread => paint("[UNREAD ONLY]", Style::default().fg(Color::Yellow)),
        ReadFilter::Read => paint("[READ ONLY]", Style::default().fg(Color::Green)),
    }
}

fn reader_header(article: &Article, width: usize) -> Vec<String> {
    let inner = width.saturating_sub(MARGIN.len() * 2).max(1);
    let mut lines: Vec<String> = wrap_hard(article.title(), inner)
        .iter()
        .map(|l| format!("{MARGIN}{}", paint(l, heading())))
        .collect();
    let date = article
        .published()
        .map(|t| local(t).format("%B %d, %Y %H:%M").to_string())
        .unwrap_or_else(|| "No date".to_string());
    let meta = format!("{} · {date}", article.author());
    lines.push(visible_truncate(&format!("{MARGIN}{}", dim(&meta)), width));
    lines.push(dim(&"─".repeat(width)));
    lines.push(String::new());
    lines
}

fn footer(model: &ScreenModel, width: usize) -> Vec<String> {
    let on_action = matches!(model.selected_item(), Some(MenuItem::Action { .. }));
    let help = if model.prompt().is_some() {
        "Enter:confirm  Esc:cancel".to_string()
    } else {
        match model.mode() {
            Mode::MainMenu => "↑↓:navigate  Enter:select  q:quit".to_string(),
            Mode::CategoryMenu | Mode::Subscriptions if on_action => {
                "↑↓:navigate  Enter:select  Esc:back".to_string()
            }
            Mode::CategoryMenu => {
                "↑↓:navigate  Enter:browse  r:rename  d:delete  Esc:back".to_string()
            }
            Mode::Subscriptions => {
                "↑↓:navigate  Enter:change category  d:delete  Esc:back".to_string()
            }
            Mode::FeedList => format!(
                "Entries: {} | ↑↓:navigate  Enter:read  m:mark  c:category  s:status  r:refresh  Esc:back",
                model.entries().len()
            ),
            Mode::Reader => {
                let mut help = "Esc/q:back  ↑↓:scroll  o:open-url".to_string();
                if let Some(r) = model.reader()
                    && r.lines.len() > model.viewport()
                {
                    help.push_str(&format!(" | Line {}/{}", r.scroll + 1, r.lines.len()));
                }
                help
            }
        }
    };
    let status = model
        .status()
        .map(|s| paint(s, Style::default().fg(Color::Yellow)))
        .unwrap_or_default();
    vec![
        visible_truncate(&status, width),
        dim(&"─".repeat(width)),
        visible_truncate(&dim(&help), width),
    ]
}

fn marker(selected: bool) -> String {
    if selected {
        paint("▶ ", Style::default().fg(Color::Green))
    } else {
        MARGIN.to_string()
    }
}

fn menu_body(model: &ScreenModel, width: usize) -> Vec<String> {
    let range = model.visible_range();
    model.items()[range.clone()]
        .iter()
        .zip(range)
        .map(|(item, i)| menu_row(item, i == model.selected(), width))
        .collect()
}

fn menu_row(item: &MenuItem, selected: bool, width: usize) -> String {
    let mut style = Style::default();
    if selected {
        style = style.add_modifier(Modifier::BOLD);
    }
    let label = match item {
        MenuItem::Category { name, count } => {
            let noun = if *count == 1 { "feed" } else { "feeds" };
            format!("{} {}", paint(name, style), dim(&format!("({count} {noun})")))
        }
        MenuItem::FeedRef { url, category } => {
            let url = ellipsize(url, width.saturating_sub(35).max(10));
            format!("{} {}", paint(&url, style), dim(&format!("[{category}]")))
        }
        MenuItem::Action { label, .. } => paint(label, style.fg(Color::Blue)),
    };
    format!("{}{label}", marker(selected))
}

fn feed_body(model: &ScreenModel, ctx: &ViewContext<'_>, width: usize) -> Vec<String> {
    let warn = Style::default().fg(Color::Yellow);
    if !ctx.loaded {
        return vec![format!("{MARGIN}{}", paint("Loading feeds...", warn))];
    }
    if !ctx.subscribed {
        return vec![
            format!("{MARGIN}{}", paint("No feeds configured", warn)),
            format!("{MARGIN}{}", dim("Add one from Manage Subscriptions or run `feedview add <url>`")),
        ];
    }
    if model.entries().is_empty() {
        return vec![
            format!("{MARGIN}{}", paint("No entries match current filters", warn)),
            format!(
                "{MARGIN}{}",
                dim("Press 'c' to change category or 's' to change status filter")
            ),
        ];
    }

    let range = model.visible_range();
    model.entries()[range.clone()]
        .iter()
        .zip(range)
        .map(|(article, i)| {
            entry_row(article, i == model.selected(), (ctx.is_read)(article.id()), width)
        })
        .collect()
}

fn entry_row(article: &Article, selected: bool, read: bool, width: usize) -> String {
    let dot = if read {
        " ".to_string()
    } else {
        paint("•", Style::default().fg(Color::Yellow))
    };
    let title = ellipsize(article.title(), width.saturating_sub(META_COLUMNS).max(10));
    let title = if selected {
        paint(&title, Style::default().add_modifier(Modifier::BOLD))
    } else if read {
        dim(&title)
    } else {
        title
    };
    let date = article
        .published()
        .map(|t| local(t).format("%m/%d %H:%M").to_string())
        .unwrap_or_else(|| "No date".to_string());
    let meta = format!("{} · {date}", ellipsize(article.author(), AUTHOR_COLUMNS));

    let left = format!("{}{dot} {title}", marker(selected));
    let pad = width
        .saturating_sub(visible_length(&left) + meta.width() + 1)
        .max(1);
    format!("{left}{}{}", " ".repeat(pad), dim(&meta))
}

fn reader_body(model: &ScreenModel, rows: usize) -> Vec<String> {
    let Some(reader) = model.reader() else {
        return Vec::new();
    };
    reader
        .lines
        .iter()
        .skip(reader.scroll)
        .take(rows)
        .map(|l| format!("{MARGIN}{l}"))
        .collect()
}

fn prompt_body(prompt: &Prompt, categories: &[String], width: usize) -> Vec<String> {
    let mut lines = vec![
        paint(&prompt.title(), heading()),
        String::new(),
        format!("{}{}█", prompt.label(), prompt.input),
    ];
    if prompt.wants_categories() && !categories.is_empty() {
        lines.push(String::new());
        lines.push(dim("Available categories:"));
        lines.extend(categories.iter().map(|c| format!("{MARGIN}- {c}")));
    }
    lines
        .into_iter()
        .map(|l| visible_truncate(&format!("{MARGIN}{l}"), width))
        .collect()
}

fn local(time: DateTime<Utc>) -> DateTime<Local> {
    time.with_timezone(&Local)
}

/// Shortens plain text to `max` columns, ending in "..." when cut.
fn ellipsize(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let budget = max.saturating_sub(3);
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::strip;
    use crate::model::Action;

    fn ctx(is_read: &dyn Fn(&str) -> bool) -> ViewContext<'_> {
        ViewContext {
            is_read,
            loaded: true,
            subscribed: true,
        }
    }

    fn plain(lines: &[String]) -> Vec<String> {
        lines.iter().map(|l| strip(l)).collect()
    }

    fn feed_list(entries: Vec<Article>) -> ScreenModel {
        ScreenModel::new()
            .transition(Action::Select)
            .0
            .with_entries(entries)
            .fit_viewport(10)
    }

    #[test]
    fn test_main_menu_frame() {
        let never = |_: &str| false;
        let frame = render(&ScreenModel::new().fit_viewport(10), &ctx(&never), 60, 20);
        let body = plain(&frame.body);
        assert_eq!(body[0], "▶ Browse Feeds");
        assert_eq!(body[3], "  Quit");
        assert!(strip(&frame.header[0]).contains("Main Menu"));
    }

    #[test]
    fn test_every_line_fits_width() {
        let never = |_: &str| false;
        let long = "An extraordinarily long headline that keeps going well past the edge";
        let model = feed_list(vec![Article::new(long, "u", None, "Someone With A Long Name", "", "")]);
        for width in [20, 40, 80] {
            let frame = render(&model, &ctx(&never), width, 12);
            for line in frame.header.iter().chain(&frame.body).chain(&frame.footer) {
                assert!(visible_length(line) <= width, "{width}: {:?}", strip(line));
            }
        }
    }

    #[test]
    fn test_unread_marker_and_no_date() {
        let never = |_: &str| false;
        let model = feed_list(vec![Article::new("Hello", "u", None, "Ann", "", "")]);
        let frame = render(&model, &ctx(&never), 60, 12);
        let row = strip(&frame.body[0]);
        assert!(row.starts_with("▶ • Hello"));
        assert!(row.ends_with("Ann · No date"));

        let always = |_: &str| true;
        let frame = render(&model, &ctx(&always), 60, 12);
        assert!(strip(&frame.body[0]).starts_with("▶   Hello"));
    }

    #[test]
    fn test_empty_filter_hint() {
        let never = |_: &str| false;
        let frame = render(&feed_list(Vec::new()), &ctx(&never), 80, 12);
        let body = plain(&frame.body);
        assert_eq!(body[0].trim(), "No entries match current filters");
        assert!(body[1].contains("Press 'c'"));
    }

    #[test]
    fn test_loading_state() {
        let never = |_: &str| false;
        let view = ViewContext {
            is_read: &never,
            loaded: false,
            subscribed: true,
        };
        let frame = render(&feed_list(Vec::new()), &view, 80, 12);
        assert_eq!(plain(&frame.body)[0].trim(), "Loading feeds...");
    }

    #[test]
    fn test_filter_badge_in_header() {
        let never = |_: &str| false;
        let model = feed_list(Vec::new()).transition(Action::CycleStatus).0;
        let frame = render(&model, &ctx(&never), 80, 12);
        assert_eq!(strip(&frame.header[0]), "Feedview - All Categories [UNREAD ONLY]");
    }

    #[test]
    fn test_body_height_matches_frame() {
        let never = |_: &str| false;
        let model = ScreenModel::new();
        let frame = render(&model, &ctx(&never), 40, 24);
        assert_eq!(body_height(&model, 40, 24), 24 - frame.header.len() - frame.footer.len());
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("short", 10), "short");
        assert_eq!(ellipsize("abcdefghijkl", 8), "abcde...");
    }
}
