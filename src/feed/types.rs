use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

/// A single news article as rendered in the feed.
///
/// Immutable once constructed. Optional provider fields that were missing or
/// empty are `None` rather than empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub description: Option<String>,
    /// Canonical link. Unique within a single fetch batch, not across batches.
    pub url: String,
    pub image_url: Option<String>,
    /// Timestamp exactly as the provider sent it.
    pub published_at: String,
    /// `published_at` parsed into UTC, when it could be parsed.
    pub published: Option<DateTime<Utc>>,
    pub source_name: String,
}

impl Article {
    /// Build an article, deriving `published` from the raw timestamp.
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        url: impl Into<String>,
        image_url: Option<String>,
        published_at: impl Into<String>,
        source_name: impl Into<String>,
    ) -> Self {
        let published_at = published_at.into();
        let published = parse_timestamp(&published_at);
        Self {
            title: title.into(),
            description,
            url: url.into(),
            image_url,
            published_at,
            published,
            source_name: source_name.into(),
        }
    }
}

/// Parse a provider timestamp.
///
/// Accepts RFC 3339, RFC 2822, and the translation endpoint's own
/// `YYYY-MM-DD HH:MM:SS` form, which is always UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

// ============================================================================
// Provider wire format
// ============================================================================

/// Top-level body returned by the translation endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ProviderResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub feed: Option<ProviderFeed>,
    #[serde(default)]
    pub items: Vec<ProviderItem>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProviderFeed {
    #[serde(default)]
    pub title: Option<String>,
}

/// One record in the provider's `items` list.
///
/// Every field is optional on the wire; [`ProviderItem::into_article`]
/// decides which ones are required.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProviderItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, rename = "pubDate")]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == v.len() {
            Some(v)
        } else {
            Some(trimmed.to_string())
        }
    })
}

impl ProviderItem {
    /// Map a provider record into an [`Article`].
    ///
    /// Returns `None` when the record has no title or no link.
    pub fn into_article(self, fallback_source: &str) -> Option<Article> {
        let title = non_empty(self.title)?;
        let url = non_empty(self.link)?;
        let source_name =
            non_empty(self.source).unwrap_or_else(|| fallback_source.to_string());

        Some(Article::new(
            title,
            non_empty(self.description),
            url,
            non_empty(self.thumbnail),
            self.pub_date.unwrap_or_default(),
            source_name,
        ))
    }
}
