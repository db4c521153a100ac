//! HTML → markdown-like text.
//!
//! Article bodies arrive as feed fragments or whole pages. Both are reduced to
//! the small markdown dialect the content formatter understands: ATX headings,
//! `>` quotes, `-`/`N.` lists, fenced code, `---` rules, emphasis and links.
//! Media become one-line placeholders such as `[Image: alt]` or
//! `[YouTube Video]`.

use scraper::{ElementRef, Html, Node, Selector};

/// Below this many non-whitespace characters a content root candidate is
/// considered empty.
const MIN_CONTENT_CHARS: usize = 50;

const BLOCK_TAGS: &[&str] = &[
    "<p>", "<p ", "<div", "<br", "<h1", "<h2", "<h3", "<h4", "<h5", "<h6", "<ul", "<ol",
    "<li", "<blockquote", "<pre", "<figure", "<img", "<iframe", "<table", "<article",
    "<section",
];

const BOILERPLATE_TOKENS: &[&str] = &[
    "nav",
    "navbar",
    "navigation",
    "sidebar",
    "menu",
    "breadcrumb",
    "breadcrumbs",
    "advertisement",
    "ad",
    "ads",
    "social",
    "share",
    "sharing",
    "comment",
    "comments",
    "related",
    "newsletter",
    "subscribe",
    "cookie",
    "banner",
    "popup",
    "modal",
];

pub fn looks_like_html(content: &str) -> bool {
    if content.trim_start().starts_with('<') {
        return true;
    }
    let lower = content.to_ascii_lowercase();
    BLOCK_TAGS.iter().any(|tag| lower.contains(tag))
}

/// Converts HTML to markdown-like text, degrading to plain text extraction when
/// the structured conversion yields nothing. Boilerplate never contributes, so
/// a page made only of scripts and chrome converts to an empty string.
pub fn to_markdown(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let is_document = lower.contains("<html") || lower.contains("<body");

    let (parsed, markdown) = if is_document {
        let document = Html::parse_document(html);
        let markdown = find_content_root(&document)
            .map(convert_root)
            .unwrap_or_default();
        (document, markdown)
    } else {
        let fragment = Html::parse_fragment(html);
        let markdown = convert_root(fragment.root_element());
        (fragment, markdown)
    };

    if markdown.trim().is_empty() {
        text_content(parsed.root_element())
    } else {
        markdown
    }
}

/// Text content outside boilerplate, whitespace collapsed.
fn text_content(root: ElementRef<'_>) -> String {
    let mut text = String::new();
    collect_text(root, &mut text);
    collapse_whitespace(&text)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    if is_boilerplate(element) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    collect_text(el, out);
                }
            }
            _ => {}
        }
    }
}

/// Placeholder for an embedded player, picked by the source URL.
pub fn embed_placeholder(src: &str, tag: &str) -> String {
    if src.contains("youtube") || src.contains("youtu.be") {
        "[YouTube Video]".to_string()
    } else if src.contains("vimeo") {
        "[Vimeo Video]".to_string()
    } else if src.contains("twitter") || src.contains("x.com") {
        "[Twitter/X Embed]".to_string()
    } else {
        let mut chars = tag.chars();
        let name: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        format!("[Embedded {name}]")
    }
}

fn find_content_root(document: &Html) -> Option<ElementRef<'_>> {
    let selectors = [
        "main",
        "article",
        "[role=\"main\"]",
        "#content",
        ".content",
        "body",
    ];

    let mut best: Option<(usize, ElementRef<'_>)> = None;

    for selector_str in selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in document.select(&selector) {
            let len = content_len(element);
            if len >= MIN_CONTENT_CHARS {
                return Some(element);
            }
            if len > 0 && best.as_ref().is_none_or(|(best_len, _)| len > *best_len) {
                best = Some((len, element));
            }
        }
    }

    best.map(|(_, element)| element)
}

fn content_len(element: ElementRef<'_>) -> usize {
    if is_boilerplate(element) {
        return 0;
    }
    element
        .children()
        .map(|child| match child.value() {
            Node::Text(text) => text.chars().filter(|c| !c.is_whitespace()).count(),
            Node::Element(_) => ElementRef::wrap(child).map_or(0, content_len),
            _ => 0,
        })
        .sum()
}

fn is_boilerplate(element: ElementRef<'_>) -> bool {
    let el = element.value();
    if matches!(
        el.name(),
        "script" | "style" | "noscript" | "nav" | "footer" | "header" | "aside" | "form"
            | "button" | "input" | "select" | "textarea" | "svg" | "canvas" | "template"
            | "head" | "audio" | "source" | "track"
    ) {
        return true;
    }
    if el.attr("aria-hidden") == Some("true") || el.attr("hidden").is_some() {
        return true;
    }
    if el.attr("role") == Some("navigation") {
        return true;
    }
    [el.attr("class"), el.attr("id")]
        .into_iter()
        .flatten()
        .any(has_boilerplate_token)
}

fn has_boilerplate_token(attr: &str) -> bool {
    attr.to_ascii_lowercase()
        .split_whitespace()
        .any(|token| BOILERPLATE_TOKENS.contains(&token))
}

struct Converter {
    list_depth: usize,
}

fn convert_root(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    let mut conv = Converter { list_depth: 0 };
    conv.children(&mut out, root);
    out.trim().to_string()
}

impl Converter {
    fn children(&mut self, out: &mut String, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        self.element(out, el);
                    }
                }
                Node::Text(text) => {
                    let collapsed = collapse_inline_whitespace(text);
                    if !(collapsed == " " && (out.is_empty() || out.ends_with(char::is_whitespace))) {
                        out.push_str(&collapsed);
                    }
                }
                _ => {}
            }
        }
    }

    fn inner(&mut self, element: ElementRef<'_>) -> String {
        let mut buf = String::new();
        self.children(&mut buf, element);
        buf
    }

    fn element(&mut self, out: &mut String, element: ElementRef<'_>) {
        let tag = element.value().name();

        match tag {
            "img" => {
                let el = element.value();
                let alt = el
                    .attr("alt")
                    .or_else(|| el.attr("title"))
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .unwrap_or("image");
                block(out, &format!("[Image: {alt}]"));
            }
            "video" | "iframe" | "embed" | "object" => {
                let src = media_source(element);
                block(out, &embed_placeholder(&src, tag));
            }
            _ if is_boilerplate(element) => {}

            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag[1..].parse::<usize>().unwrap_or(1);
                let text = collapse_whitespace(&self.inner(element));
                if !text.is_empty() {
                    block(out, &format!("{} {text}", "#".repeat(level)));
                }
            }
            "p" => {
                let text = self.inner(element);
                block(out, text.trim());
            }
            "figcaption" => {
                let text = collapse_whitespace(&self.inner(element));
                if !text.is_empty() {
                    block(out, &format!("Caption: {text}"));
                }
            }
            "blockquote" => {
                let text = self.inner(element);
                ensure_blank_line(out);
                for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                    out.push_str("> ");
                    out.push_str(line);
                    out.push('\n');
                }
                out.push('\n');
            }
            "ul" | "ol" => self.list(out, element, tag == "ol"),
            "pre" => {
                let lang = code_language(element).unwrap_or_default();
                let code: String = element.text().collect();
                ensure_blank_line(out);
                out.push_str(&format!("```{lang}\n{}\n```\n\n", code.trim_end_matches('\n')));
            }
            "code" => {
                let code: String = element.text().collect();
                if !code.is_empty() {
                    out.push('`');
                    out.push_str(&code);
                    out.push('`');
                }
            }
            "a" => {
                let text = self.inner(element);
                let href = element.value().attr("href").unwrap_or("").trim();
                let linkable = !href.is_empty()
                    && !href.starts_with('#')
                    && !href.starts_with("javascript:");
                if linkable && !text.trim().is_empty() && !text.contains('\n') {
                    out.push_str(&format!("[{}]({href})", text.trim()));
                } else {
                    out.push_str(&text);
                }
            }
            "strong" | "b" => self.emphasis(out, element, "**"),
            "em" | "i" => self.emphasis(out, element, "*"),
            "del" | "s" | "strike" => self.emphasis(out, element, "~~"),
            "br" => out.push('\n'),
            "hr" => block(out, "---"),
            "table" => self.table(out, element),
            "div" | "section" | "article" | "main" | "figure" => {
                ensure_blank_line(out);
                self.children(out, element);
                ensure_blank_line(out);
            }
            _ => self.children(out, element),
        }
    }

    fn emphasis(&mut self, out: &mut String, element: ElementRef<'_>, delim: &str) {
        let text = self.inner(element);
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.contains('\n') {
            out.push_str(&text);
            return;
        }
        if text.starts_with(' ') {
            out.push(' ');
        }
        out.push_str(delim);
        out.push_str(trimmed);
        out.push_str(delim);
        if text.ends_with(' ') {
            out.push(' ');
        }
    }

    fn list(&mut self, out: &mut String, element: ElementRef<'_>, ordered: bool) {
        if self.list_depth == 0 {
            ensure_blank_line(out);
        } else if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }

        self.list_depth += 1;
        let indent = "  ".repeat(self.list_depth - 1);
        let mut number: usize = element
            .value()
            .attr("start")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        for li in element.children().filter_map(ElementRef::wrap) {
            if li.value().name() != "li" {
                continue;
            }
            let marker = if ordered {
                let m = format!("{number}. ");
                number += 1;
                m
            } else {
                "- ".to_string()
            };

            let mut text = String::new();
            let mut nested = String::new();
            for child in li.children() {
                match ElementRef::wrap(child) {
                    Some(el) if matches!(el.value().name(), "ul" | "ol") => {
                        self.element(&mut nested, el);
                    }
                    Some(el) => self.element(&mut text, el),
                    None => {
                        if let Some(t) = child.value().as_text() {
                            text.push_str(&collapse_inline_whitespace(t));
                        }
                    }
                }
            }

            out.push_str(&indent);
            out.push_str(&marker);
            out.push_str(&collapse_whitespace(&text));
            out.push('\n');
            out.push_str(&nested);
        }

        self.list_depth -= 1;
        if self.list_depth == 0 {
            out.push('\n');
        }
    }

    fn table(&mut self, out: &mut String, element: ElementRef<'_>) {
        let Ok(rows) = Selector::parse("tr") else {
            return;
        };
        let Ok(cells) = Selector::parse("th, td") else {
            return;
        };
        ensure_blank_line(out);
        for row in element.select(&rows) {
            let line: Vec<String> = row
                .select(&cells)
                .map(|cell| collapse_whitespace(&self.inner(cell)))
                .collect();
            if !line.is_empty() {
                out.push_str(&line.join(" | "));
                out.push('\n');
            }
        }
        out.push('\n');
    }
}

fn media_source(element: ElementRef<'_>) -> String {
    let el = element.value();
    if let Some(src) = el.attr("src").or_else(|| el.attr("data")) {
        return src.to_string();
    }
    element
        .children()
        .filter_map(ElementRef::wrap)
        .find_map(|child| child.value().attr("src").map(str::to_string))
        .unwrap_or_default()
}

fn code_language(pre: ElementRef<'_>) -> Option<String> {
    let from_classes = |el: ElementRef<'_>| {
        el.value().classes().find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .map(str::to_string)
        })
    };
    from_classes(pre).or_else(|| {
        pre.children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "code")
            .and_then(from_classes)
    })
}

/// Emits `text` as its own paragraph.
fn block(out: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    ensure_blank_line(out);
    out.push_str(text);
    out.push_str("\n\n");
}

fn ensure_blank_line(out: &mut String) {
    if out.is_empty() || out.ends_with("\n\n") {
        return;
    }
    if out.ends_with('\n') {
        out.push('\n');
    } else {
        out.push_str("\n\n");
    }
}

fn collapse_inline_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_html(html: &str) -> String {
        text_content(Html::parse_fragment(html).root_element())
    }

    fn load_fixture(name: &str) -> String {
        let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load fixture {name}: {e}"))
    }

    #[test]
    fn test_detects_html() {
        assert!(looks_like_html("<p>hi</p>"));
        assert!(looks_like_html("intro text <DIV>more</DIV>"));
        assert!(!looks_like_html("# Just markdown\n\nwith *emphasis*"));
    }

    #[test]
    fn test_image_placeholder_uses_alt_then_title() {
        let md = to_markdown(r#"<p>before</p><img src="a.png" alt="A cat"><img src="b.png" title="Dog">"#);
        assert!(md.contains("[Image: A cat]"));
        assert!(md.contains("[Image: Dog]"));
    }

    #[test]
    fn test_embed_placeholders() {
        let md = to_markdown(
            r#"<iframe src="https://www.youtube.com/embed/xyz"></iframe>
               <iframe src="https://player.vimeo.com/video/1"></iframe>
               <iframe src="https://platform.twitter.com/embed"></iframe>
               <video><source src="https://cdn.example.org/clip.mp4"></video>"#,
        );
        assert!(md.contains("[YouTube Video]"));
        assert!(md.contains("[Vimeo Video]"));
        assert!(md.contains("[Twitter/X Embed]"));
        assert!(md.contains("[Embedded Video]"));
    }

    #[test]
    fn test_figcaption_prefixed() {
        let md = to_markdown("<figure><img alt=\"Chart\"><figcaption>Sales by year</figcaption></figure>");
        assert!(md.contains("[Image: Chart]"));
        assert!(md.contains("Caption: Sales by year"));
    }

    #[test]
    fn test_structure_converted() {
        let md = to_markdown(
            "<h2>Intro</h2><p>Some <strong>bold</strong> and <em>soft</em> text with a \
             <a href=\"https://example.com\">link</a>.</p><ul><li>one</li><li>two</li></ul>\
             <blockquote><p>quoted</p></blockquote><pre><code class=\"language-rust\">fn main() {}\n</code></pre>",
        );
        assert!(md.contains("## Intro"));
        assert!(md.contains("Some **bold** and *soft* text with a [link](https://example.com)."));
        assert!(md.contains("- one\n- two"));
        assert!(md.contains("> quoted"));
        assert!(md.contains("```rust\nfn main() {}\n```"));
    }

    #[test]
    fn test_ordered_and_nested_lists() {
        let md = to_markdown("<ol start=\"3\"><li>three<ul><li>inner</li></ul></li><li>four</li></ol>");
        assert!(md.contains("3. three\n  - inner\n4. four"), "got: {md}");
    }

    #[test]
    fn test_document_picks_article_and_skips_boilerplate() {
        let html = load_fixture("article.html");
        let md = to_markdown(&html);
        assert!(md.contains("# Rust in the Terminal"));
        assert!(md.contains("[Image: A ferris crab]"));
        assert!(!md.contains("Subscribe to our newsletter"));
        assert!(!md.contains("Home | About"));
    }

    #[test]
    fn test_entities_decoded_by_parser() {
        let md = to_markdown("<p>Fish &amp; chips &lt;3</p>");
        assert_eq!(md, "Fish & chips <3");
    }

    #[test]
    fn test_strip_html_fallback() {
        assert_eq!(strip_html("<span>a</span>\n\n <b>b</b>"), "a b");
    }

    #[test]
    fn test_strip_html_skips_scripts_and_styles() {
        let text = strip_html("<style>p{color:red}</style><span>kept</span><script>drop()</script>");
        assert_eq!(text, "kept");
    }

    #[test]
    fn test_script_only_page_converts_to_nothing() {
        let page = "<html><head><script>window.__APP__={a:1};function boot(){render()}</script></head>\
                    <body><div id=\"root\"></div><script>boot()</script></body></html>";
        assert_eq!(to_markdown(page), "");
    }

    #[test]
    fn test_short_page_falls_back_to_body_text() {
        let page = "<html><body><nav>Home | About</nav><span>Short note</span></body></html>";
        assert_eq!(to_markdown(page), "Short note");
    }
}
