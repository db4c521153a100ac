use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::config::Subscription;
use crate::fetch::FeedSource;

/// Stable identifier for an entry: the first 16 hex digits of
/// `sha256("<url>|<published rfc3339>")`.
pub fn article_id(url: &str, published: Option<DateTime<Utc>>) -> String {
    let stamp = published.map(|t| t.to_rfc3339()).unwrap_or_default();
    let digest = Sha256::digest(format!("{url}|{stamp}").as_bytes());
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Article {
    id: String,
    title: String,
    url: String,
    published: Option<DateTime<Utc>>,
    author: String,
    summary: String,
    content: String,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        published: Option<DateTime<Utc>>,
        author: impl Into<String>,
        summary: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let url = url.into();
        Self {
            id: article_id(&url, published),
            title: title.into(),
            url,
            published,
            author: author.into(),
            summary: summary.into(),
            content: content.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn published(&self) -> Option<DateTime<Utc>> {
        self.published
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feed {
    pub url: String,
    pub title: String,
    pub category: String,
    pub entries: Vec<Article>,
}

impl Feed {
    pub fn in_category(self, category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            ..self
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadFilter {
    #[default]
    All,
    Unread,
    Read,
}

impl ReadFilter {
    pub fn next(self) -> Self {
        match self {
            ReadFilter::All => ReadFilter::Unread,
            ReadFilter::Unread => ReadFilter::Read,
            ReadFilter::Read => ReadFilter::All,
        }
    }

    fn keeps(self, read: bool) -> bool {
        match self {
            ReadFilter::All => true,
            ReadFilter::Unread => !read,
            ReadFilter::Read => read,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub loaded: usize,
    pub failed: usize,
}

/// The feeds fetched by the latest refresh.
#[derive(Debug, Default)]
pub struct Library {
    feeds: Vec<Feed>,
    loaded: bool,
}

impl Library {
    /// Replaces every feed with a fresh fetch. Failed feeds are logged and skipped.
    pub fn refresh(&mut self, source: &dyn FeedSource, subscriptions: &[Subscription]) -> RefreshReport {
        let mut report = RefreshReport::default();
        let mut feeds = Vec::with_capacity(subscriptions.len());

        for sub in subscriptions {
            match source.fetch(&sub.url) {
                Ok(feed) => {
                    report.loaded += 1;
                    feeds.push(feed.in_category(sub.category.clone()));
                }
                Err(err) => {
                    report.failed += 1;
                    warn!(url = %sub.url, error = %err, "feed refresh failed");
                }
            }
        }

        info!(loaded = report.loaded, failed = report.failed, "refreshed feeds");
        self.feeds = feeds;
        self.loaded = true;
        report
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn feeds(&self) -> &[Feed] {
        &self.feeds
    }

    /// Entries matching both filters, newest first. Undated entries sort last.
    pub fn entries(
        &self,
        category: Option<&str>,
        filter: ReadFilter,
        is_read: impl Fn(&str) -> bool,
    ) -> Vec<Article> {
        let mut entries: Vec<Article> = self
            .feeds
            .iter()
            .filter(|feed| category.is_none_or(|c| feed.category == c))
            .flat_map(|feed| feed.entries.iter())
            .filter(|entry| filter.keeps(is_read(entry.id())))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.published.cmp(&a.published));
        entries
    }
}
