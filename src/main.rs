use anyhow::{Context, Result};
use clap::Parser;
use reqwest::redirect::Policy;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

use scrollfeed::app::{App, AppEvent};
use scrollfeed::config::Config;
use scrollfeed::feed::FeedClient;
use scrollfeed::ui;
use scrollfeed::util::validate_url;

/// Get the config directory path (~/.config/scrollfeed/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("scrollfeed"))
}

/// Log directory: $XDG_STATE_HOME/scrollfeed or ~/.local/state/scrollfeed
fn get_log_dir() -> Result<PathBuf> {
    if let Some(state) = std::env::var_os("XDG_STATE_HOME").filter(|s| !s.is_empty()) {
        return Ok(PathBuf::from(state).join("scrollfeed"));
    }
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".local").join("state").join("scrollfeed"))
}

/// The TUI owns stdout, so logs go to a file, and only when RUST_LOG is set.
fn init_tracing() -> Result<Option<PathBuf>> {
    if std::env::var_os("RUST_LOG").is_none() {
        return Ok(None);
    }

    let dir = get_log_dir()?;
    std::fs::create_dir_all(&dir).context("Failed to create log directory")?;
    let path = dir.join("scrollfeed.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(Some(path))
}

/// Redirects: at most 3 hops, no loops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }
        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }
        tracing::debug!(
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );
        attempt.follow()
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "scrollfeed",
    about = "Terminal news feed with live search and scroll-driven reveal animation"
)]
struct Args {
    /// Config file (default: ~/.config/scrollfeed/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Upstream RSS feed to read
    #[arg(long, value_name = "URL")]
    feed_url: Option<String>,

    /// RSS-to-JSON translation endpoint
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Always use the intersection fallback for reveal animations
    #[arg(long)]
    no_scroll_driver: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_path = init_tracing()?;

    let config_path = match args.config {
        Some(path) => path,
        None => get_config_dir()?.join("config.toml"),
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if let Some(feed_url) = args.feed_url {
        config.feed_url = feed_url;
    }
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if args.no_scroll_driver {
        config.scroll_driver = false;
    }

    validate_url(&config.feed_url)
        .with_context(|| format!("Invalid feed URL: {}", config.feed_url))?;

    let http_client = reqwest::Client::builder()
        .redirect(create_redirect_policy())
        .pool_max_idle_per_host(2)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let client = FeedClient::new(
        http_client,
        &config.endpoint,
        config.feed_url.clone(),
        config.request_timeout(),
    )
    .with_context(|| format!("Invalid endpoint: {}", config.endpoint))?;

    tracing::info!(
        feed_url = %config.feed_url,
        endpoint = %config.endpoint,
        log = ?log_path,
        "Starting scrollfeed"
    );

    let mut app = App::new(&config);
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    // Probe and first load run concurrently with the UI coming up
    ui::spawn_probe(&mut app, config.scroll_driver, &event_tx);
    ui::spawn_fetch(&mut app, &client, true, &event_tx);

    ui::run(&mut app, &client, event_tx, event_rx).await?;
    Ok(())
}
