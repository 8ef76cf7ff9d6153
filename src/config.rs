//! Configuration file parser for ~/.config/scrollfeed/config.toml.
//!
//! The file is optional and every key has a default. Unknown keys are
//! accepted but logged, since they are usually typos.
use crate::feed::{DEFAULT_ENDPOINT, DEFAULT_FEED_URL};
use crate::reveal::RevealConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// RSS-to-JSON translation endpoint. The feed URL is appended as `rss_url`.
    pub endpoint: String,

    /// Upstream RSS feed.
    pub feed_url: String,

    /// Whole-request timeout for a fetch, in seconds.
    pub request_timeout_secs: u64,

    /// Quiet period before a typed search term is applied.
    pub search_debounce_ms: u64,

    /// Drop appended articles whose link is already loaded.
    pub dedupe_appends: bool,

    /// Allow the scroll-linked reveal strategy. When false the intersection
    /// fallback is always used.
    pub scroll_driver: bool,

    pub reveal: RevealConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            feed_url: DEFAULT_FEED_URL.to_string(),
            request_timeout_secs: 30,
            search_debounce_ms: 300,
            dedupe_appends: false,
            scroll_driver: true,
            reveal: RevealConfig::default(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "endpoint",
        "feed_url",
        "request_timeout_secs",
        "search_debounce_ms",
        "dedupe_appends",
        "scroll_driver",
        "reveal",
    ];

    const KNOWN_REVEAL_KEYS: [&'static str; 9] = [
        "duration_secs",
        "stagger_secs",
        "start_ratio",
        "end_ratio",
        "toggle_actions",
        "threshold",
        "bottom_margin_rows",
        "hover_scale",
        "hover_duration_secs",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing or blank file → `Ok(Config::default())`
    /// - Invalid TOML or a bad value → `Err(ConfigError::Parse)`
    /// - Unknown keys → accepted, logged as a warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            warn_unknown_keys(&raw, &Self::KNOWN_KEYS, "");
            if let Some(toml::Value::Table(reveal)) = raw.get("reveal") {
                warn_unknown_keys(reveal, &Self::KNOWN_REVEAL_KEYS, "reveal.");
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            feed_url = %config.feed_url,
            scroll_driver = config.scroll_driver,
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

fn warn_unknown_keys(table: &toml::Table, known: &[&str], prefix: &str) {
    for key in table.keys() {
        if !known.contains(&key.as_str()) {
            tracing::warn!(
                key = %format!("{}{}", prefix, key),
                "Unknown key in config file, ignoring"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reveal::{ToggleAction, ToggleActions};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    /// Write `content` to a fresh config file under the temp dir.
    fn write_config(name: &str, content: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("scrollfeed_config_test_{}", name));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.feed_url, DEFAULT_FEED_URL);
        assert_eq!(config.search_debounce(), Duration::from_millis(300));
        assert!(!config.dedupe_appends);
        assert!(config.scroll_driver);
        assert_eq!(config.reveal, RevealConfig::default());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/scrollfeed_test_nonexistent_config.toml");
        assert_eq!(Config::load(path).unwrap(), Config::default());
    }

    #[test]
    fn test_blank_file_returns_default() {
        let (dir, path) = write_config("blank", "   \n  \n");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let (dir, path) = write_config("partial", "dedupe_appends = true\n");
        let config = Config::load(&path).unwrap();
        assert!(config.dedupe_appends);
        assert_eq!(config.feed_url, DEFAULT_FEED_URL);
        assert_eq!(config.reveal.stagger_secs, 0.1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let content = r#"
endpoint = "https://json.example.com/api"
feed_url = "https://news.example.com/rss"
request_timeout_secs = 10
search_debounce_ms = 150
scroll_driver = false

[reveal]
duration_secs = 0.8
stagger_secs = 0.05
toggle_actions = "play none none none"
threshold = 0.25
bottom_margin_rows = 0
"#;
        let (dir, path) = write_config("full", content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.endpoint, "https://json.example.com/api");
        assert_eq!(config.feed_url, "https://news.example.com/rss");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.search_debounce(), Duration::from_millis(150));
        assert!(!config.scroll_driver);
        assert_eq!(config.reveal.duration_secs, 0.8);
        assert_eq!(config.reveal.threshold, 0.25);
        assert_eq!(config.reveal.bottom_margin_rows, 0);
        assert_eq!(
            config.reveal.toggle_actions,
            ToggleActions {
                on_enter: ToggleAction::Play,
                on_leave: ToggleAction::None,
                on_enter_back: ToggleAction::None,
                on_leave_back: ToggleAction::None,
            }
        );
        // untouched reveal keys keep their defaults
        assert_eq!(config.reveal.hover_scale, 1.02);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let (dir, path) = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_bad_toggle_actions_rejected() {
        let (dir, path) = write_config(
            "bad_actions",
            "[reveal]\ntoggle_actions = \"play sideways\"\n",
        );
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let (dir, path) = write_config("wrong_type", "scroll_driver = \"yes\"\n");
        assert!(Config::load(&path).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let content =
            "feed_url = \"https://a.example/rss\"\ntheme = \"dark\"\n[reveal]\nspeed = 2\n";
        let (dir, path) = write_config("unknown", content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.feed_url, "https://a.example/rss");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_zero_timeout_clamped() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }
}
