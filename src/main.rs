mod ansi;
mod app;
mod config;
mod feed;
mod fetch;
mod highlight;
mod html;
mod inline;
mod input;
mod model;
mod render;
mod tui;
mod view;
mod wrap;

use std::fs::{self, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use app::{App, SystemBrowser};
use config::{ConfigStore, DEFAULT_CATEGORY};
use fetch::{HttpArticleFetcher, HttpFeedSource};
use highlight::CodeBlockRenderer;
use render::ContentFormatter;

#[derive(Parser)]
#[command(name = "feedview", version, about = "A terminal feed reader")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Subscribe to a feed
    Add {
        url: String,
        /// Category to file the feed under
        category: Option<String>,
    },
    /// Unsubscribe from a feed
    Remove { url: String },
    /// List subscriptions by category
    List,
    /// Format a file the way the reader would and print it
    Render {
        file: PathBuf,
        #[arg(short, long)]
        width: Option<u16>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        None => run_tui(),
        Some(Command::Add { url, category }) => {
            let mut config = ConfigStore::open_default()?;
            let category = category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
            if config.add_feed(&url, &category)? {
                println!("Added {url} to {category}");
            } else {
                println!("Already subscribed to {url}");
            }
            Ok(())
        }
        Some(Command::Remove { url }) => {
            let mut config = ConfigStore::open_default()?;
            if config.remove_feed(&url)? {
                println!("Removed {url}");
            } else {
                println!("Not subscribed to {url}");
            }
            Ok(())
        }
        Some(Command::List) => list_feeds(),
        Some(Command::Render { file, width }) => dump_text(&file, width),
    }
}

fn run_tui() -> Result<()> {
    let config = ConfigStore::open_default()?;
    let settings = config.settings().clone();
    let source = HttpFeedSource::new(Duration::from_secs(settings.feed_timeout_secs))?;
    let fetcher = HttpArticleFetcher::new(Duration::from_secs(settings.article_timeout_secs))?;
    let formatter = ContentFormatter::new(CodeBlockRenderer::new(&settings.theme));

    let mut app = App::new(
        config,
        Box::new(source),
        Box::new(fetcher),
        Box::new(SystemBrowser),
        formatter,
    );
    tui::run(&mut app)
}

fn list_feeds() -> Result<()> {
    let config = ConfigStore::open_default()?;
    let mut out = io::stdout().lock();
    let grouped = config.feeds_by_category();
    if grouped.is_empty() {
        writeln!(out, "No feeds configured. Add one with `feedview add <url>`.")?;
        return Ok(());
    }
    for (category, feeds) in grouped {
        writeln!(out, "{category}:")?;
        for feed in feeds {
            writeln!(out, "  {}", feed.url)?;
        }
    }
    Ok(())
}

fn dump_text(path: &Path, width_override: Option<u16>) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let width = width_override
        .unwrap_or_else(|| crossterm::terminal::size().map(|(w, _)| w).unwrap_or(80));
    let lines = ContentFormatter::default().format(&content, usize::from(width));

    let mut out = io::stdout().lock();
    for line in &lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some((path, file)) = open_log_file() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();
        tracing::info!(path = %path.display(), "logging initialized");
        return;
    }

    // Nothing goes to stdout or stderr while the TUI owns the terminal.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> Option<(PathBuf, fs::File)> {
    let dir = dirs::cache_dir()?.join("feedview");
    fs::create_dir_all(&dir).ok()?;
    let path = dir.join("feedview.log");
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;
    Some((path, file))
}
