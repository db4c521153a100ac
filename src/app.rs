use std::mem;
use std::ops::ControlFlow;

use anyhow::Result;
use crossterm::event::KeyEvent;
use tracing::{debug, warn};

use crate::ansi::RenderedLine;
use crate::config::ConfigStore;
use crate::feed::{Article, Library};
use crate::fetch::{ArticleFetcher, FeedSource};
use crate::input;
use crate::model::{
    Action, ActionKind, ConfigChange, Effect, MenuItem, Mode, ScreenModel, main_menu,
};
use crate::render::ContentFormatter;
use crate::view::{self, Frame, ViewContext};

const NO_CONTENT: &str = "No content available for this article.";
/// Columns reserved around reader content.
const READER_MARGIN: usize = 4;

pub trait Browser {
    fn open(&self, url: &str);
}

pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &str) {
        if let Err(err) = webbrowser::open(url) {
            warn!(url, error = %err, "failed to open browser");
        }
    }
}

/// Connects the screen model to storage, the network and the formatter.
pub struct App {
    model: ScreenModel,
    config: ConfigStore,
    library: Library,
    source: Box<dyn FeedSource>,
    fetcher: Box<dyn ArticleFetcher>,
    browser: Box<dyn Browser>,
    formatter: ContentFormatter,
    width: usize,
    height: usize,
}

impl App {
    pub fn new(
        config: ConfigStore,
        source: Box<dyn FeedSource>,
        fetcher: Box<dyn ArticleFetcher>,
        browser: Box<dyn Browser>,
        formatter: ContentFormatter,
    ) -> Self {
        let mut app = Self {
            model: ScreenModel::new(),
            config,
            library: Library::default(),
            source,
            fetcher,
            browser,
            formatter,
            width: 80,
            height: 24,
        };
        app.sync();
        app
    }

    pub fn model(&self) -> &ScreenModel {
        &self.model
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        let width_changed = usize::from(width) != self.width;
        self.width = usize::from(width);
        self.height = usize::from(height);
        if width_changed && self.model.mode() == Mode::Reader {
            self.reformat_reader();
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Lays out the current screen, first fitting the list to the body height.
    pub fn frame(&mut self) -> Frame {
        let rows = view::body_height(&self.model, self.width, self.height);
        self.update(|m| m.fit_viewport(rows));
        let is_read = |id: &str| self.config.is_read(id);
        let ctx = ViewContext {
            is_read: &is_read,
            loaded: self.library.is_loaded(),
            subscribed: !self.config.list_feeds().is_empty(),
        };
        view::render(&self.model, &ctx, self.width, self.height)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Effect> {
        let action = input::route(self.model.mode(), self.model.prompt().is_some(), key)?;
        self.step(action)
    }

    pub fn step(&mut self, action: Action) -> Option<Effect> {
        let model = mem::take(&mut self.model);
        let (model, effect) = model.transition(action);
        self.model = model;
        self.sync();
        effect
    }

    pub fn apply(&mut self, effect: Effect) -> ControlFlow<()> {
        debug!(?effect, "applying effect");
        match effect {
            Effect::Quit => return ControlFlow::Break(()),
            Effect::Refresh => {
                let report = self.library.refresh(self.source.as_ref(), self.config.list_feeds());
                if report.failed > 0 {
                    let noun = if report.failed == 1 { "feed" } else { "feeds" };
                    let status = format!("{} {noun} failed to load", report.failed);
                    self.update(|m| m.with_status(status));
                }
                self.recompute();
            }
            Effect::Recompute => self.recompute(),
            Effect::OpenArticle => self.open_article(),
            Effect::ToggleRead(id) => {
                let was_read = self.config.is_read(&id);
                let saved = if was_read {
                    self.config.mark_unread(&id)
                } else {
                    self.config.mark_read(&id)
                };
                let status = match saved {
                    Ok(()) if was_read => "Marked as unread".to_string(),
                    Ok(()) => "Marked as read".to_string(),
                    Err(err) => save_failed(&err),
                };
                self.update(|m| m.with_status(status));
                self.recompute();
            }
            Effect::OpenUrl(url) => self.browser.open(&url),
            Effect::Apply(change) => {
                let status = self.apply_change(change).unwrap_or_else(|err| save_failed(&err));
                self.update(|m| m.with_status(status));
                self.sync();
            }
        }
        ControlFlow::Continue(())
    }

    fn update(&mut self, f: impl FnOnce(ScreenModel) -> ScreenModel) {
        let model = mem::take(&mut self.model);
        self.model = f(model);
    }

    fn sync(&mut self) {
        let categories = self.config.category_names();
        let items = match self.model.mode() {
            Mode::MainMenu => main_menu(),
            Mode::CategoryMenu => self.category_items(),
            Mode::Subscriptions => self.subscription_items(),
            Mode::FeedList | Mode::Reader => Vec::new(),
        };
        self.update(|m| m.with_categories(categories).with_items(items));
    }

    fn category_items(&self) -> Vec<MenuItem> {
        let grouped = self.config.feeds_by_category();
        let mut items: Vec<MenuItem> = self
            .config
            .category_names()
            .into_iter()
            .map(|name| {
                let count = grouped.get(&name).map_or(0, Vec::len);
                MenuItem::Category { name, count }
            })
            .collect();
        items.push(MenuItem::action("Add New Category", ActionKind::Add));
        items.push(MenuItem::action("Back to Main Menu", ActionKind::Back));
        items
    }

    fn subscription_items(&self) -> Vec<MenuItem> {
        let mut items: Vec<MenuItem> = self
            .config
            .list_feeds()
            .iter()
            .map(|sub| MenuItem::FeedRef {
                url: sub.url.clone(),
                category: sub.category.clone(),
            })
            .collect();
        items.push(MenuItem::action("Add New Feed", ActionKind::Add));
        items.push(MenuItem::action("Back to Main Menu", ActionKind::Back));
        items
    }

    fn recompute(&mut self) {
        let entries = self.library.entries(
            self.model.category_filter(),
            self.model.read_filter(),
            |id| self.config.is_read(id),
        );
        self.update(|m| m.with_entries(entries));
    }

    fn apply_change(&mut self, change: ConfigChange) -> Result<String> {
        let (done, ok, not_ok) = match change {
            ConfigChange::AddCategory(name) => (
                self.config.add_category(&name)?,
                "Category added!",
                "Category already exists",
            ),
            ConfigChange::RenameCategory { from, to } => (
                self.config.rename_category(&from, &to)?,
                "Category renamed!",
                "Category not renamed",
            ),
            ConfigChange::DeleteCategory(name) => (
                self.config.remove_category(&name)?,
                "Category deleted!",
                "Category not found",
            ),
            ConfigChange::AddFeed { url, category } => (
                self.config.add_feed(&url, &category)?,
                "Feed added!",
                "Already subscribed",
            ),
            ConfigChange::ChangeFeedCategory { url, category } => (
                self.config.update_feed_category(&url, &category)?,
                "Category updated!",
                "Feed not found",
            ),
            ConfigChange::DeleteFeed(url) => (
                self.config.remove_feed(&url)?,
                "Feed deleted!",
                "Feed not found",
            ),
        };
        Ok(if done { ok } else { not_ok }.to_string())
    }

    fn reader_width(&self) -> usize {
        self.width.saturating_sub(READER_MARGIN)
    }

    fn open_article(&mut self) {
        let Some(article) = self.model.reader().map(|r| r.article.clone()) else {
            return;
        };
        if let Err(err) = self.config.mark_read(article.id()) {
            warn!(error = %err, "failed to persist read state");
        }
        let (source, lines) = self.format_article(&article);
        self.update(|m| m.with_reader_content(source, lines));
    }

    /// Prefers the fetched page, then the entry content, then its summary.
    fn format_article(&self, article: &Article) -> (String, Vec<RenderedLine>) {
        let fetched = if self.config.settings().fetch_full_article {
            self.fetcher.fetch_body(article.url())
        } else {
            None
        };
        let candidates = fetched
            .into_iter()
            .chain([article.content().to_string(), article.summary().to_string()]);
        for source in candidates {
            let lines = self.formatter.format(&source, self.reader_width());
            if !lines.is_empty() {
                return (source, lines);
            }
        }
        (String::new(), vec![RenderedLine::new(NO_CONTENT)])
    }

    fn reformat_reader(&mut self) {
        let Some(source) = self.model.reader().map(|r| r.source.clone()) else {
            return;
        };
        let mut lines = self.formatter.format(&source, self.reader_width());
        if lines.is_empty() {
            lines.push(RenderedLine::new(NO_CONTENT));
        }
        self.update(|m| m.with_reader_content(source, lines));
    }
}

fn save_failed(err: &anyhow::Error) -> String {
    warn!(error = %err, "failed to save config");
    format!("Could not save: {err}")
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;
    use crate::ansi::strip;
    use crate::feed::{Feed, ReadFilter};
    use crate::fetch::FetchError;

    struct FakeSource(HashMap<String, Vec<Article>>);

    impl FeedSource for FakeSource {
        fn fetch(&self, url: &str) -> Result<Feed, FetchError> {
            let entries = self.0.get(url).cloned().ok_or(FetchError::Status(500))?;
            Ok(Feed {
                url: url.to_string(),
                title: "Fake".into(),
                category: String::new(),
                entries,
            })
        }
    }

    struct FakeFetcher(Option<String>);

    impl ArticleFetcher for FakeFetcher {
        fn fetch_body(&self, _url: &str) -> Option<String> {
            self.0.clone()
        }
    }

    #[derive(Clone, Default)]
    struct RecordingBrowser(Rc<RefCell<Vec<String>>>);

    impl Browser for RecordingBrowser {
        fn open(&self, url: &str) {
            self.0.borrow_mut().push(url.to_string());
        }
    }

    fn post(n: u32, content: &str) -> Article {
        let published = Utc.with_ymd_and_hms(2024, 5, n, 8, 0, 0).single();
        Article::new(format!("Post {n}"), format!("https://f/{n}"), published, "Ann", "", content)
    }

    struct Harness {
        app: App,
        browser: RecordingBrowser,
        _dir: TempDir,
    }

    fn harness(entries: Vec<Article>, page: Option<&str>) -> Harness {
        let dir = TempDir::new().unwrap();
        let mut config =
            ConfigStore::open(dir.path().join("config.toml"), dir.path().join("read.toml")).unwrap();
        config.add_feed("https://f/feed", "Tech").unwrap();
        config.add_feed("https://broken/feed", "Tech").unwrap();
        let source = FakeSource(HashMap::from([("https://f/feed".to_string(), entries)]));
        let browser = RecordingBrowser::default();
        let mut app = App::new(
            config,
            Box::new(source),
            Box::new(FakeFetcher(page.map(str::to_string))),
            Box::new(browser.clone()),
            ContentFormatter::default(),
        );
        app.resize(80, 24);
        app.frame();
        Harness {
            app,
            browser,
            _dir: dir,
        }
    }

    fn press(app: &mut App, action: Action) -> ControlFlow<()> {
        match app.step(action) {
            Some(effect) => app.apply(effect),
            None => ControlFlow::Continue(()),
        }
    }

    fn browse(app: &mut App) {
        press(app, Action::Select);
        app.frame();
        assert_eq!(app.model().mode(), Mode::FeedList);
    }

    #[test]
    fn test_refresh_loads_entries_and_reports_failures() {
        let mut h = harness(vec![post(1, "one"), post(2, "two")], None);
        browse(&mut h.app);
        let titles: Vec<&str> = h.app.model().entries().iter().map(Article::title).collect();
        assert_eq!(titles, vec!["Post 2", "Post 1"]);
        assert_eq!(h.app.model().status(), Some("1 feed failed to load"));
    }

    #[test]
    fn test_toggle_read_round_trip() {
        let mut h = harness(vec![post(1, "one")], None);
        browse(&mut h.app);
        let id = h.app.model().entries()[0].id().to_string();
        assert!(!h.app.config().is_read(&id));

        press(&mut h.app, Action::ToggleRead);
        assert!(h.app.config().is_read(&id));
        assert_eq!(h.app.model().status(), Some("Marked as read"));

        press(&mut h.app, Action::ToggleRead);
        assert!(!h.app.config().is_read(&id));
    }

    #[test]
    fn test_opening_article_marks_read_and_formats_page() {
        let page = "<html><body><article><h1>Full Page</h1><p>The complete article body is long enough to be picked as the main content.</p></article></body></html>";
        let mut h = harness(vec![post(1, "short")], Some(page));
        browse(&mut h.app);
        let id = h.app.model().entries()[0].id().to_string();

        press(&mut h.app, Action::Select);
        assert_eq!(h.app.model().mode(), Mode::Reader);
        assert!(h.app.config().is_read(&id));
        let lines = &h.app.model().reader().map(|r| r.lines.clone()).unwrap_or_default();
        assert_eq!(lines[1].plain(), "Full Page");
    }

    #[test]
    fn test_reader_falls_back_to_feed_content() {
        let mut h = harness(vec![post(1, "Feed **content** only")], None);
        browse(&mut h.app);
        press(&mut h.app, Action::Select);
        let reader = h.app.model().reader().cloned().unwrap();
        assert_eq!(reader.lines[0].plain(), "Feed content only");
    }

    #[test]
    fn test_script_only_page_yields_to_feed_content() {
        let page = "<html><head><script>window.__APP__={a:1};function boot(){render()}</script></head>\
                    <body><div id=\"root\"></div><script>boot()</script></body></html>";
        let mut h = harness(vec![post(1, "The real feed article body")], Some(page));
        browse(&mut h.app);
        press(&mut h.app, Action::Select);
        let reader = h.app.model().reader().cloned().unwrap();
        let text: Vec<String> = reader.lines.iter().map(RenderedLine::plain).collect();
        assert_eq!(text, vec!["The real feed article body"]);
    }

    #[test]
    fn test_reader_without_content() {
        let mut h = harness(vec![post(1, "")], None);
        browse(&mut h.app);
        press(&mut h.app, Action::Select);
        let reader = h.app.model().reader().cloned().unwrap();
        assert_eq!(reader.lines.len(), 1);
        assert_eq!(reader.lines[0].plain(), NO_CONTENT);
    }

    #[test]
    fn test_leaving_reader_applies_unread_filter() {
        let mut h = harness(vec![post(1, "a"), post(2, "b")], None);
        browse(&mut h.app);
        press(&mut h.app, Action::CycleStatus);
        assert_eq!(h.app.model().read_filter(), ReadFilter::Unread);
        assert_eq!(h.app.model().entries().len(), 2);

        press(&mut h.app, Action::Select);
        press(&mut h.app, Action::Back);
        assert_eq!(h.app.model().mode(), Mode::FeedList);
        assert_eq!(h.app.model().entries().len(), 1);
    }

    #[test]
    fn test_open_in_browser() {
        let mut h = harness(vec![post(3, "a")], None);
        browse(&mut h.app);
        press(&mut h.app, Action::Select);
        press(&mut h.app, Action::OpenExternal);
        assert_eq!(h.browser.0.borrow().as_slice(), ["https://f/3".to_string()]);
    }

    #[test]
    fn test_add_category_through_prompt() {
        let mut h = harness(Vec::new(), None);
        press(&mut h.app, Action::Down);
        press(&mut h.app, Action::Select);
        assert_eq!(h.app.model().mode(), Mode::CategoryMenu);
        let labels: Vec<String> = h
            .app
            .model()
            .items()
            .iter()
            .map(|i| match i {
                MenuItem::Category { name, count } => format!("{name}:{count}"),
                MenuItem::Action { label, .. } => label.to_string(),
                MenuItem::FeedRef { url, .. } => url.clone(),
            })
            .collect();
        assert_eq!(labels, vec!["Tech:2", "Add New Category", "Back to Main Menu"]);

        press(&mut h.app, Action::Down);
        press(&mut h.app, Action::Select);
        for c in "Rust".chars() {
            press(&mut h.app, Action::Input(c));
        }
        press(&mut h.app, Action::Select);
        assert_eq!(h.app.model().status(), Some("Category added!"));
        assert_eq!(h.app.config().category_names(), vec!["Rust", "Tech"]);
        assert_eq!(h.app.model().items().len(), 4);
    }

    #[test]
    fn test_resize_reformats_reader() {
        let body = "word ".repeat(400);
        let mut h = harness(vec![post(1, &body)], None);
        browse(&mut h.app);
        press(&mut h.app, Action::Select);
        let wide = h.app.model().reader().map(|r| r.lines.len()).unwrap_or_default();
        h.app.resize(60, 24);
        let narrow = h.app.model().reader().map(|r| r.lines.len()).unwrap_or_default();
        assert!(narrow > wide);
        let frame = h.app.frame();
        assert!(frame.body.iter().all(|l| crate::ansi::visible_length(l) <= 60));
        assert!(strip(&frame.footer[2]).contains("Line 1/"));
    }

    #[test]
    fn test_quit_breaks_loop() {
        let mut h = harness(Vec::new(), None);
        assert_eq!(press(&mut h.app, Action::Quit), ControlFlow::Break(()));
    }
}
