use std::time::Duration;

use anyhow::{Context, Result};
use feed_rs::model::{Entry, Feed as RawFeed};
use reqwest::blocking::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::feed::{Article, Feed};

const USER_AGENT: &str = concat!("feedview/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("server returned status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("could not parse feed: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

pub trait FeedSource {
    fn fetch(&self, url: &str) -> Result<Feed, FetchError>;
}

/// Fetches the full page behind an entry. `None` means "use the feed's own content".
pub trait ArticleFetcher {
    fn fetch_body(&self, url: &str) -> Option<String>;
}

fn client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build HTTP client")
}

fn get(client: &Client, url: &str) -> Result<reqwest::blocking::Response, FetchError> {
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(response)
}

pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: client(timeout)?,
        })
    }
}

impl FeedSource for HttpFeedSource {
    fn fetch(&self, url: &str) -> Result<Feed, FetchError> {
        debug!(url, "fetching feed");
        let bytes = get(&self.client, url)?.bytes()?;
        parse_feed(url, &bytes)
    }
}

pub struct HttpArticleFetcher {
    client: Client,
}

impl HttpArticleFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: client(timeout)?,
        })
    }
}

impl ArticleFetcher for HttpArticleFetcher {
    fn fetch_body(&self, url: &str) -> Option<String> {
        if url.is_empty() {
            return None;
        }
        debug!(url, "fetching article");
        let body = get(&self.client, url).and_then(|r| r.text().map_err(FetchError::from));
        match body {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(err) => {
                warn!(url, error = %err, "article fetch failed, using feed content");
                None
            }
        }
    }
}

/// Parses RSS, Atom or JSON Feed bytes into a [`Feed`] with no category.
pub fn parse_feed(url: &str, bytes: &[u8]) -> Result<Feed, FetchError> {
    let raw = feed_rs::parser::parse(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;
    let title = raw
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| url.to_string());
    let entries = raw.entries.iter().map(|e| to_article(&raw, e, &title)).collect();

    Ok(Feed {
        url: url.to_string(),
        title,
        category: String::new(),
        entries,
    })
}

fn to_article(raw: &RawFeed, entry: &Entry, feed_title: &str) -> Article {
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();
    let url = entry_link(entry);
    let author = entry
        .authors
        .iter()
        .chain(raw.authors.iter())
        .map(|p| p.name.trim())
        .find(|n| !n.is_empty())
        .unwrap_or(feed_title)
        .to_string();
    let summary = entry.summary.as_ref().map(|t| t.content.clone());
    let content = entry.content.as_ref().and_then(|c| c.body.clone());

    Article::new(
        title,
        url,
        entry.published.or(entry.updated),
        author,
        summary.clone().or_else(|| content.clone()).unwrap_or_default(),
        content.or(summary).unwrap_or_default(),
    )
}

fn entry_link(entry: &Entry) -> String {
    entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().is_none_or(|r| r == "alternate"))
        .or_else(|| entry.links.first())
        .map(|l| l.href.clone())
        .or_else(|| Some(entry.id.clone()).filter(|id| id.starts_with("http")))
        .unwrap_or_default()
}
