use std::ops::Range;

use crate::ansi::RenderedLine;
use crate::config::DEFAULT_CATEGORY;
use crate::feed::{Article, ReadFilter};

/// Rows moved by PageUp and PageDown in the lists.
pub const PAGE_SIZE: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    MainMenu,
    CategoryMenu,
    FeedList,
    Subscriptions,
    Reader,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Browse,
    Categories,
    Subscriptions,
    Quit,
    Add,
    Back,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuItem {
    Category { name: String, count: usize },
    FeedRef { url: String, category: String },
    Action { label: &'static str, kind: ActionKind },
}

impl MenuItem {
    pub fn action(label: &'static str, kind: ActionKind) -> Self {
        MenuItem::Action { label, kind }
    }
}

pub fn main_menu() -> Vec<MenuItem> {
    vec![
        MenuItem::action("Browse Feeds", ActionKind::Browse),
        MenuItem::action("Manage Categories", ActionKind::Categories),
        MenuItem::action("Manage Subscriptions", ActionKind::Subscriptions),
        MenuItem::action("Quit", ActionKind::Quit),
    ]
}

/// What a key means once routed through the current mode's keymap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
    Select,
    Back,
    Quit,
    Rename,
    Delete,
    ToggleRead,
    CycleCategory,
    CycleStatus,
    Refresh,
    OpenExternal,
    Input(char),
    Erase,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromptKind {
    AddCategory,
    RenameCategory(String),
    DeleteCategory(String),
    AddFeed,
    AddFeedCategory { url: String },
    ChangeFeedCategory(String),
    DeleteFeed(String),
}

/// A one-line text prompt drawn over the current screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

impl Prompt {
    fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            input: String::new(),
        }
    }

    pub fn title(&self) -> String {
        match &self.kind {
            PromptKind::AddCategory => "Add New Category".into(),
            PromptKind::RenameCategory(name) => format!("Rename Category: {name}"),
            PromptKind::DeleteCategory(name) => format!("Delete Category: {name}"),
            PromptKind::AddFeed | PromptKind::AddFeedCategory { .. } => "Add New Feed".into(),
            PromptKind::ChangeFeedCategory(url) => format!("Change Category: {url}"),
            PromptKind::DeleteFeed(url) => format!("Delete Feed: {url}"),
        }
    }

    pub fn label(&self) -> &'static str {
        match self.kind {
            PromptKind::AddCategory => "Category name: ",
            PromptKind::RenameCategory(_) => "New name: ",
            PromptKind::DeleteCategory(_) | PromptKind::DeleteFeed(_) => {
                "Type 'yes' to confirm: "
            }
            PromptKind::AddFeed => "Feed URL: ",
            PromptKind::AddFeedCategory { .. } => "Category (default: Uncategorized): ",
            PromptKind::ChangeFeedCategory(_) => "New category: ",
        }
    }

    /// Whether the prompt should list the existing categories as a hint.
    pub fn wants_categories(&self) -> bool {
        matches!(
            self.kind,
            PromptKind::AddFeedCategory { .. } | PromptKind::ChangeFeedCategory(_)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigChange {
    AddCategory(String),
    RenameCategory { from: String, to: String },
    DeleteCategory(String),
    AddFeed { url: String, category: String },
    ChangeFeedCategory { url: String, category: String },
    DeleteFeed(String),
}

/// Side effects a transition asks the app to perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Quit,
    Refresh,
    Recompute,
    OpenArticle,
    ToggleRead(String),
    OpenUrl(String),
    Apply(ConfigChange),
}

impl Effect {
    /// Notice to draw while a slow effect runs.
    pub fn busy_message(&self) -> Option<&'static str> {
        match self {
            Effect::Refresh => Some("Loading feeds..."),
            Effect::OpenArticle => Some("Loading article..."),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderView {
    pub article: Article,
    pub source: String,
    pub lines: Vec<RenderedLine>,
    pub scroll: usize,
}

impl ReaderView {
    fn max_scroll(&self, height: usize) -> usize {
        self.lines.len().saturating_sub(height)
    }
}

/// Everything the screen shows. Transitions consume the model and return the next one.
#[derive(Clone, Debug, Default)]
pub struct ScreenModel {
    mode: Mode,
    selected: usize,
    scroll: usize,
    viewport: usize,
    items: Vec<MenuItem>,
    entries: Vec<Article>,
    categories: Vec<String>,
    category_filter: Option<String>,
    read_filter: ReadFilter,
    reader: Option<ReaderView>,
    prompt: Option<Prompt>,
    status: Option<String>,
}

impl ScreenModel {
    pub fn new() -> Self {
        Self {
            items: main_menu(),
            viewport: 1,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn entries(&self) -> &[Article] {
        &self.entries
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn category_filter(&self) -> Option<&str> {
        self.category_filter.as_deref()
    }

    pub fn read_filter(&self) -> ReadFilter {
        self.read_filter
    }

    pub fn reader(&self) -> Option<&ReaderView> {
        self.reader.as_ref()
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn selected_item(&self) -> Option<&MenuItem> {
        self.items.get(self.selected)
    }

    /// Rows of the current list that fit in the viewport.
    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.scroll + self.viewport.max(1)).min(self.item_count());
        self.scroll.min(end)..end
    }

    fn item_count(&self) -> usize {
        match self.mode {
            Mode::FeedList | Mode::Reader => self.entries.len(),
            _ => self.items.len(),
        }
    }

    pub fn with_items(mut self, items: Vec<MenuItem>) -> Self {
        self.items = items;
        self.settle()
    }

    pub fn with_entries(mut self, entries: Vec<Article>) -> Self {
        self.entries = entries;
        self.settle()
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        if let Some(filter) = &self.category_filter
            && !categories.contains(filter)
        {
            self.category_filter = None;
        }
        self.categories = categories;
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Installs freshly formatted reader content. The scroll position is kept when
    /// the source is unchanged, so a resize does not jump back to the top.
    pub fn with_reader_content(mut self, source: String, lines: Vec<RenderedLine>) -> Self {
        if let Some(reader) = self.reader.as_mut() {
            if reader.source != source {
                reader.scroll = 0;
            }
            reader.source = source;
            reader.lines = lines;
        }
        self.settle()
    }

    /// Sets the body height and clamps scrolling so the selection stays visible.
    pub fn fit_viewport(mut self, height: usize) -> Self {
        self.viewport = height.max(1);
        self.settle()
    }

    fn settle(mut self) -> Self {
        let count = self.item_count();
        let height = self.viewport.max(1);
        self.selected = self.selected.min(count.saturating_sub(1));
        self.scroll = self.scroll.min(count.saturating_sub(height));
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + height {
            self.scroll = self.selected + 1 - height;
        }
        if let Some(reader) = self.reader.as_mut() {
            reader.scroll = reader.scroll.min(reader.max_scroll(height));
        }
        self
    }

    pub fn transition(mut self, action: Action) -> (Self, Option<Effect>) {
        self.status = None;
        let (model, effect) = if action == Action::Quit {
            (self, Some(Effect::Quit))
        } else if self.prompt.is_some() {
            self.prompt_key(action)
        } else {
            match self.mode {
                Mode::MainMenu => self.main_menu_key(action),
                Mode::CategoryMenu => self.category_key(action),
                Mode::FeedList => self.feed_list_key(action),
                Mode::Subscriptions => self.subscriptions_key(action),
                Mode::Reader => self.reader_key(action),
            }
        };
        (model.settle(), effect)
    }

    fn navigate(&mut self, action: Action) -> bool {
        let last = self.item_count().saturating_sub(1);
        self.selected = match action {
            Action::Up => self.selected.saturating_sub(1),
            Action::Down => (self.selected + 1).min(last),
            Action::PageUp => self.selected.saturating_sub(PAGE_SIZE),
            Action::PageDown => (self.selected + PAGE_SIZE).min(last),
            Action::Top => 0,
            Action::Bottom => last,
            _ => return false,
        };
        true
    }

    fn enter(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self.selected = 0;
        self.scroll = 0;
        self.items = if mode == Mode::MainMenu {
            main_menu()
        } else {
            Vec::new()
        };
        self
    }

    fn open_prompt(mut self, kind: PromptKind) -> (Self, Option<Effect>) {
        self.prompt = Some(Prompt::new(kind));
        (self, None)
    }

    fn main_menu_key(mut self, action: Action) -> (Self, Option<Effect>) {
        if self.navigate(action) || action != Action::Select {
            return (self, None);
        }
        let kind = match self.selected_item() {
            Some(MenuItem::Action { kind, .. }) => *kind,
            _ => return (self, None),
        };
        match kind {
            ActionKind::Browse => {
                self.category_filter = None;
                (self.enter(Mode::FeedList), Some(Effect::Refresh))
            }
            ActionKind::Categories => (self.enter(Mode::CategoryMenu), None),
            ActionKind::Subscriptions => (self.enter(Mode::Subscriptions), None),
            ActionKind::Quit => (self, Some(Effect::Quit)),
            ActionKind::Add | ActionKind::Back => (self, None),
        }
    }

    fn category_key(mut self, action: Action) -> (Self, Option<Effect>) {
        if self.navigate(action) {
            return (self, None);
        }
        let item = self.selected_item().cloned();
        match (action, item) {
            (Action::Back, _) => (self.enter(Mode::MainMenu), None),
            (Action::Select, Some(MenuItem::Category { name, .. })) => {
                self.category_filter = Some(name);
                (self.enter(Mode::FeedList), Some(Effect::Refresh))
            }
            (Action::Select, Some(MenuItem::Action { kind: ActionKind::Add, .. })) => {
                self.open_prompt(PromptKind::AddCategory)
            }
            (Action::Select, Some(MenuItem::Action { kind: ActionKind::Back, .. })) => {
                (self.enter(Mode::MainMenu), None)
            }
            (Action::Rename | Action::Delete, Some(MenuItem::Category { name, .. }))
                if name == DEFAULT_CATEGORY =>
            {
                (self.with_status("The default category cannot be changed"), None)
            }
            (Action::Rename, Some(MenuItem::Category { name, .. })) => {
                self.open_prompt(PromptKind::RenameCategory(name))
            }
            (Action::Delete, Some(MenuItem::Category { name, .. })) => {
                self.open_prompt(PromptKind::DeleteCategory(name))
            }
            _ => (self, None),
        }
    }

    fn feed_list_key(mut self, action: Action) -> (Self, Option<Effect>) {
        if self.navigate(action) {
            return (self, None);
        }
        match action {
            Action::Back => {
                self.category_filter = None;
                (self.enter(Mode::MainMenu), None)
            }
            Action::Select => match self.entries.get(self.selected).cloned() {
                Some(article) => {
                    self.mode = Mode::Reader;
                    self.reader = Some(ReaderView {
                        article,
                        source: String::new(),
                        lines: Vec::new(),
                        scroll: 0,
                    });
                    (self, Some(Effect::OpenArticle))
                }
                None => (self, None),
            },
            Action::ToggleRead => {
                let effect = self
                    .entries
                    .get(self.selected)
                    .map(|a| Effect::ToggleRead(a.id().to_string()));
                (self, effect)
            }
            Action::CycleCategory => {
                let next = next_category(&self.categories, self.category_filter.as_deref());
                self.category_filter = next;
                (self, Some(Effect::Recompute))
            }
            Action::CycleStatus => {
                self.read_filter = self.read_filter.next();
                (self, Some(Effect::Recompute))
            }
            Action::Refresh => (self, Some(Effect::Refresh)),
            _ => (self, None),
        }
    }

    fn subscriptions_key(mut self, action: Action) -> (Self, Option<Effect>) {
        if self.navigate(action) {
            return (self, None);
        }
        let item = self.selected_item().cloned();
        match (action, item) {
            (Action::Back, _) => (self.enter(Mode::MainMenu), None),
            (Action::Select, Some(MenuItem::FeedRef { url, .. })) => {
                self.open_prompt(PromptKind::ChangeFeedCategory(url))
            }
            (Action::Select, Some(MenuItem::Action { kind: ActionKind::Add, .. })) => {
                self.open_prompt(PromptKind::AddFeed)
            }
            (Action::Select, Some(MenuItem::Action { kind: ActionKind::Back, .. })) => {
                (self.enter(Mode::MainMenu), None)
            }
            (Action::Delete, Some(MenuItem::FeedRef { url, .. })) => {
                self.open_prompt(PromptKind::DeleteFeed(url))
            }
            _ => (self, None),
        }
    }

    fn reader_key(mut self, action: Action) -> (Self, Option<Effect>) {
        let height = self.viewport.max(1);
        let Some(reader) = self.reader.as_mut() else {
            self.mode = Mode::FeedList;
            return (self, Some(Effect::Recompute));
        };
        let max = reader.max_scroll(height);
        match action {
            Action::Up => reader.scroll = reader.scroll.saturating_sub(1),
            Action::Down => reader.scroll = (reader.scroll + 1).min(max),
            Action::PageUp => reader.scroll = reader.scroll.saturating_sub(height),
            Action::PageDown => reader.scroll = (reader.scroll + height).min(max),
            Action::Top => reader.scroll = 0,
            Action::Bottom => reader.scroll = max,
            Action::OpenExternal => {
                let url = reader.article.url().to_string();
                return (self, (!url.is_empty()).then_some(Effect::OpenUrl(url)));
            }
            Action::Back => {
                self.reader = None;
                self.mode = Mode::FeedList;
                return (self, Some(Effect::Recompute));
            }
            _ => {}
        }
        (self, None)
    }

    fn prompt_key(mut self, action: Action) -> (Self, Option<Effect>) {
        let Some(prompt) = self.prompt.as_mut() else {
            return (self, None);
        };
        match action {
            Action::Input(c) => prompt.input.push(c),
            Action::Erase => {
                prompt.input.pop();
            }
            Action::Back => {
                self.prompt = None;
                return (self.with_status("Cancelled"), None);
            }
            Action::Select => {
                if let Some(prompt) = self.prompt.take() {
                    return self.submit(prompt);
                }
            }
            _ => {}
        }
        (self, None)
    }

    fn submit(self, prompt: Prompt) -> (Self, Option<Effect>) {
        let value = prompt.input.trim().to_string();
        let confirmed = value == "yes";
        let change = match prompt.kind {
            PromptKind::AddFeed if !value.is_empty() => {
                return self.open_prompt(PromptKind::AddFeedCategory { url: value });
            }
            PromptKind::AddFeedCategory { url } => {
                let category = if value.is_empty() {
                    DEFAULT_CATEGORY.to_string()
                } else {
                    value
                };
                Some(ConfigChange::AddFeed { url, category })
            }
            _ if value.is_empty() => None,
            PromptKind::AddCategory => Some(ConfigChange::AddCategory(value)),
            PromptKind::RenameCategory(from) => Some(ConfigChange::RenameCategory { from, to: value }),
            PromptKind::DeleteCategory(name) => confirmed.then_some(ConfigChange::DeleteCategory(name)),
            PromptKind::ChangeFeedCategory(url) => {
                Some(ConfigChange::ChangeFeedCategory { url, category: value })
            }
            PromptKind::DeleteFeed(url) => confirmed.then_some(ConfigChange::DeleteFeed(url)),
            PromptKind::AddFeed => None,
        };
        match change {
            Some(change) => (self, Some(Effect::Apply(change))),
            None => (self.with_status("Cancelled"), None),
        }
    }
}

/// All categories, then each named category in order, then back to all.
fn next_category(categories: &[String], current: Option<&str>) -> Option<String> {
    let next = match current {
        None => 0,
        Some(name) => match categories.iter().position(|c| c == name) {
            Some(i) => i + 1,
            None => 0,
        },
    };
    categories.get(next).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn articles(n: usize) -> Vec<Article> {
        (0..n)
            .map(|i| Article::new(format!("Post {i}"), format!("https://x/{i}"), None, "a", "", ""))
            .collect()
    }

    fn feed_list(n: usize, height: usize) -> ScreenModel {
        let (model, effect) = ScreenModel::new().fit_viewport(height).transition(Action::Select);
        assert_eq!(effect, Some(Effect::Refresh));
        assert_eq!(model.mode(), Mode::FeedList);
        model.with_entries(articles(n))
    }

    fn press(model: ScreenModel, actions: &[Action]) -> ScreenModel {
        actions.iter().fold(model, |m, a| m.transition(*a).0)
    }

    #[test]
    fn test_main_menu_navigation() {
        let model = press(ScreenModel::new().fit_viewport(10), &[Action::Down, Action::Down]);
        assert_eq!(model.selected(), 2);
        let model = press(model, &[Action::Down, Action::Down, Action::Down]);
        assert_eq!(model.selected(), 3);
        let (_, effect) = model.transition(Action::Select);
        assert_eq!(effect, Some(Effect::Quit));
    }

    #[test]
    fn test_ctrl_c_quits_everywhere() {
        let model = feed_list(3, 5);
        let (_, effect) = model.transition(Action::Quit);
        assert_eq!(effect, Some(Effect::Quit));
    }

    #[test]
    fn test_scroll_follows_selection_down() {
        let model = press(feed_list(20, 5), &[Action::Down; 7]);
        assert_eq!(model.selected(), 7);
        assert_eq!(model.scroll(), 3);
        assert_eq!(model.visible_range(), 3..8);
    }

    #[test]
    fn test_page_down_clamps_at_end() {
        let model = press(feed_list(12, 5), &[Action::PageDown, Action::PageDown]);
        assert_eq!(model.selected(), 11);
        assert_eq!(model.scroll(), 7);
    }

    #[test]
    fn test_shrinking_list_clamps_selection() {
        let model = press(feed_list(20, 5), &[Action::Bottom]);
        let model = model.with_entries(articles(3));
        assert_eq!(model.selected(), 2);
        assert_eq!(model.scroll(), 0);
    }

    #[test]
    fn test_status_filter_cycles() {
        let model = feed_list(1, 5);
        let (model, effect) = model.transition(Action::CycleStatus);
        assert_eq!(effect, Some(Effect::Recompute));
        assert_eq!(model.read_filter(), ReadFilter::Unread);
        let model = press(model, &[Action::CycleStatus, Action::CycleStatus]);
        assert_eq!(model.read_filter(), ReadFilter::All);
    }

    #[test]
    fn test_category_filter_cycles_through_all() {
        let model = feed_list(1, 5).with_categories(vec!["News".into(), "Tech".into()]);
        let model = press(model, &[Action::CycleCategory]);
        assert_eq!(model.category_filter(), Some("News"));
        let model = press(model, &[Action::CycleCategory]);
        assert_eq!(model.category_filter(), Some("Tech"));
        let model = press(model, &[Action::CycleCategory]);
        assert_eq!(model.category_filter(), None);
    }

    #[test]
    fn test_toggle_read_targets_selected_entry() {
        let model = press(feed_list(3, 5), &[Action::Down]);
        let expected = model.entries()[1].id().to_string();
        let (_, effect) = model.transition(Action::ToggleRead);
        assert_eq!(effect, Some(Effect::ToggleRead(expected)));
    }

    #[test]
    fn test_open_and_leave_reader() {
        let model = feed_list(3, 5);
        let (model, effect) = model.transition(Action::Select);
        assert_eq!(effect, Some(Effect::OpenArticle));
        assert_eq!(model.mode(), Mode::Reader);

        let lines = (0..20).map(|i| RenderedLine::new(format!("line {i}"))).collect();
        let model = model.with_reader_content("body".into(), lines);
        let model = press(model, &[Action::Bottom]);
        assert_eq!(model.reader().map(|r| r.scroll), Some(15));
        let model = press(model, &[Action::Down]);
        assert_eq!(model.reader().map(|r| r.scroll), Some(15));

        let (model, effect) = model.transition(Action::Back);
        assert_eq!(effect, Some(Effect::Recompute));
        assert_eq!(model.mode(), Mode::FeedList);
        assert!(model.reader().is_none());
    }

    #[test]
    fn test_reader_pages_by_window_height() {
        let model = press(feed_list(1, 5), &[Action::Select]);
        let lines = (0..12).map(|i| RenderedLine::new(format!("line {i}"))).collect();
        let model = model.with_reader_content("body".into(), lines);

        let model = press(model, &[Action::PageDown]);
        assert_eq!(model.reader().map(|r| r.scroll), Some(5));
        let model = press(model, &[Action::PageDown]);
        assert_eq!(model.reader().map(|r| r.scroll), Some(7));
        let model = press(model, &[Action::PageUp]);
        assert_eq!(model.reader().map(|r| r.scroll), Some(2));
    }

    #[test]
    fn test_reader_open_external() {
        let model = press(feed_list(1, 5), &[Action::Select]);
        let (_, effect) = model.transition(Action::OpenExternal);
        assert_eq!(effect, Some(Effect::OpenUrl("https://x/0".into())));
    }

    #[test]
    fn test_add_category_prompt() {
        let model = press(ScreenModel::new().fit_viewport(10), &[Action::Down, Action::Select]);
        assert_eq!(model.mode(), Mode::CategoryMenu);
        let model = model.with_items(vec![
            MenuItem::action("Add New Category", ActionKind::Add),
            MenuItem::action("Back to Main Menu", ActionKind::Back),
        ]);
        let model = press(model, &[Action::Select]);
        assert_eq!(model.prompt().map(|p| p.kind.clone()), Some(PromptKind::AddCategory));

        let model = press(model, &[Action::Input('G'), Action::Input('o'), Action::Input('x'), Action::Erase]);
        let (model, effect) = model.transition(Action::Select);
        assert_eq!(effect, Some(Effect::Apply(ConfigChange::AddCategory("Go".into()))));
        assert!(model.prompt().is_none());
    }

    #[test]
    fn test_prompt_escape_cancels() {
        let model = ScreenModel::new().fit_viewport(10).open_prompt(PromptKind::AddFeed).0;
        let (model, effect) = model.transition(Action::Back);
        assert!(effect.is_none());
        assert!(model.prompt().is_none());
        assert_eq!(model.status(), Some("Cancelled"));

        let (model, _) = model.transition(Action::Down);
        assert_eq!(model.status(), None);
    }

    #[test]
    fn test_add_feed_two_steps_with_default_category() {
        let model = ScreenModel::new().open_prompt(PromptKind::AddFeed).0;
        let model = "https://f".chars().fold(model, |m, c| m.transition(Action::Input(c)).0);
        let (model, effect) = model.transition(Action::Select);
        assert!(effect.is_none());
        assert!(model.prompt().is_some_and(Prompt::wants_categories));

        let (_, effect) = model.transition(Action::Select);
        assert_eq!(
            effect,
            Some(Effect::Apply(ConfigChange::AddFeed {
                url: "https://f".into(),
                category: DEFAULT_CATEGORY.into(),
            }))
        );
    }

    #[test]
    fn test_delete_requires_yes() {
        let prompt = PromptKind::DeleteFeed("https://f".into());
        let model = ScreenModel::new().open_prompt(prompt.clone()).0;
        let model = press(model, &[Action::Input('y')]);
        let (model, effect) = model.transition(Action::Select);
        assert!(effect.is_none());
        assert_eq!(model.status(), Some("Cancelled"));

        let model = ScreenModel::new().open_prompt(prompt).0;
        let model = press(model, &[Action::Input('y'), Action::Input('e'), Action::Input('s')]);
        let (_, effect) = model.transition(Action::Select);
        assert_eq!(effect, Some(Effect::Apply(ConfigChange::DeleteFeed("https://f".into()))));
    }

    #[test]
    fn test_default_category_cannot_be_renamed() {
        let model = press(ScreenModel::new().fit_viewport(10), &[Action::Down, Action::Select])
            .with_items(vec![MenuItem::Category {
                name: DEFAULT_CATEGORY.into(),
                count: 1,
            }]);
        let (model, effect) = model.transition(Action::Rename);
        assert!(effect.is_none());
        assert!(model.prompt().is_none());
        assert!(model.status().is_some());
    }

    #[test]
    fn test_busy_messages() {
        assert_eq!(Effect::Refresh.busy_message(), Some("Loading feeds..."));
        assert_eq!(Effect::OpenArticle.busy_message(), Some("Loading article..."));
        assert_eq!(Effect::Recompute.busy_message(), None);
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        fn any_action() -> impl Strategy<Value = Action> {
            prop_oneof![
                Just(Action::Up),
                Just(Action::Down),
                Just(Action::PageUp),
                Just(Action::PageDown),
                Just(Action::Top),
                Just(Action::Bottom),
                Just(Action::CycleStatus),
                Just(Action::ToggleRead),
            ]
        }

        proptest! {
            #[test]
            fn selection_always_visible(
                count in 0usize..60,
                height in 1usize..15,
                actions in proptest::collection::vec(any_action(), 0..40),
                shrink_to in proptest::option::of(0usize..60),
            ) {
                let mut model = feed_list(count, height);
                for action in actions {
                    model = model.transition(action).0;
                    let (sel, scroll) = (model.selected(), model.scroll());
                    prop_assert!(scroll <= sel || count == 0);
                    prop_assert!(sel <= scroll + height - 1);
                }
                if let Some(n) = shrink_to {
                    model = model.with_entries(articles(n));
                    prop_assert!(model.selected() <= n.saturating_sub(1));
                    prop_assert!(model.scroll() <= model.selected());
                }
            }
        }
    }
}
