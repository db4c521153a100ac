use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::highlight::DEFAULT_THEME;

pub const DEFAULT_CATEGORY: &str = "Uncategorized";
const APP_DIR: &str = "feedview";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub url: String,
    pub category: String,
}

impl Subscription {
    pub fn new(url: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            category: category.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub feed_timeout_secs: u64,
    pub article_timeout_secs: u64,
    pub theme: String,
    pub fetch_full_article: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feed_timeout_secs: 10,
            article_timeout_secs: 15,
            theme: DEFAULT_THEME.to_string(),
            fetch_full_article: true,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConfigFile {
    categories: BTreeSet<String>,
    settings: Settings,
    feeds: Vec<Subscription>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ReadFile {
    read: BTreeSet<String>,
}

/// Subscriptions, categories, settings and read state, saved after every change.
pub struct ConfigStore {
    config_path: PathBuf,
    read_path: PathBuf,
    file: ConfigFile,
    read: BTreeSet<String>,
}

impl ConfigStore {
    /// Opens `<config>/feedview/config.toml` and `<cache>/feedview/read_articles.toml`.
    pub fn open_default() -> Result<Self> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        let cache_dir = dirs::cache_dir().context("Could not determine cache directory")?;
        Self::open(
            config_dir.join(APP_DIR).join("config.toml"),
            cache_dir.join(APP_DIR).join("read_articles.toml"),
        )
    }

    pub fn open(config_path: impl Into<PathBuf>, read_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();
        let read_path = read_path.into();
        let file: ConfigFile = load(&config_path)?;
        let read: ReadFile = load(&read_path)?;
        debug!(
            path = %config_path.display(),
            feeds = file.feeds.len(),
            read = read.read.len(),
            "loaded config"
        );
        Ok(Self {
            config_path,
            read_path,
            file,
            read: read.read,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.file.settings
    }

    pub fn list_feeds(&self) -> &[Subscription] {
        &self.file.feeds
    }

    /// Returns false if the URL is already subscribed.
    pub fn add_feed(&mut self, url: &str, category: &str) -> Result<bool> {
        let url = url.trim();
        if url.is_empty() || self.file.feeds.iter().any(|f| f.url == url) {
            return Ok(false);
        }
        let category = non_empty_or_default(category);
        self.file.categories.insert(category.clone());
        self.file.feeds.push(Subscription::new(url, category));
        self.save()?;
        Ok(true)
    }

    pub fn remove_feed(&mut self, url: &str) -> Result<bool> {
        let before = self.file.feeds.len();
        self.file.feeds.retain(|f| f.url != url);
        if self.file.feeds.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn update_feed_category(&mut self, url: &str, category: &str) -> Result<bool> {
        let category = non_empty_or_default(category);
        let Some(feed) = self.file.feeds.iter_mut().find(|f| f.url == url) else {
            return Ok(false);
        };
        feed.category = category.clone();
        self.file.categories.insert(category);
        self.save()?;
        Ok(true)
    }

    pub fn feeds_by_category(&self) -> BTreeMap<String, Vec<Subscription>> {
        let mut grouped: BTreeMap<String, Vec<Subscription>> = BTreeMap::new();
        for feed in &self.file.feeds {
            grouped.entry(feed.category.clone()).or_default().push(feed.clone());
        }
        grouped
    }

    /// Every known category, sorted: those added explicitly plus those with feeds.
    pub fn category_names(&self) -> Vec<String> {
        let mut names = self.file.categories.clone();
        names.extend(self.file.feeds.iter().map(|f| f.category.clone()));
        names.into_iter().collect()
    }

    pub fn add_category(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() || !self.file.categories.insert(name.to_string()) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Moves every feed in `from` to `to`. The default category cannot be renamed.
    pub fn rename_category(&mut self, from: &str, to: &str) -> Result<bool> {
        let to = to.trim();
        if from == DEFAULT_CATEGORY || to.is_empty() || from == to {
            return Ok(false);
        }
        let mut known = self.file.categories.remove(from);
        for feed in self.file.feeds.iter_mut().filter(|f| f.category == from) {
            feed.category = to.to_string();
            known = true;
        }
        if !known {
            return Ok(false);
        }
        self.file.categories.insert(to.to_string());
        self.save()?;
        Ok(true)
    }

    /// Deletes a category, moving its feeds to the default category.
    pub fn remove_category(&mut self, name: &str) -> Result<bool> {
        if name == DEFAULT_CATEGORY {
            return Ok(false);
        }
        let mut known = self.file.categories.remove(name);
        for feed in self.file.feeds.iter_mut().filter(|f| f.category == name) {
            feed.category = DEFAULT_CATEGORY.to_string();
            known = true;
        }
        if !known {
            return Ok(false);
        }
        if self.file.feeds.iter().any(|f| f.category == DEFAULT_CATEGORY) {
            self.file.categories.insert(DEFAULT_CATEGORY.to_string());
        }
        self.save()?;
        Ok(true)
    }

    pub fn is_read(&self, id: &str) -> bool {
        self.read.contains(id)
    }

    pub fn mark_read(&mut self, id: &str) -> Result<()> {
        if self.read.insert(id.to_string()) {
            self.save_read()?;
        }
        Ok(())
    }

    pub fn mark_unread(&mut self, id: &str) -> Result<()> {
        if self.read.remove(id) {
            self.save_read()?;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        store(&self.config_path, &self.file)
    }

    fn save_read(&self) -> Result<()> {
        let file = ReadFile {
            read: self.read.clone(),
        };
        store(&self.read_path, &file)
    }
}

fn non_empty_or_default(category: &str) -> String {
    let category = category.trim();
    if category.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        category.to_string()
    }
}

fn load<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn store<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let contents = toml::to_string_pretty(value).context("Failed to serialize as TOML")?;
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
