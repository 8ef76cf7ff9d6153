use crate::feed::Article;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Stable identity of a rendered article.
///
/// Derived from the article url. When the same url appears more than once in
/// one rendered list (append fetches do not dedupe) later occurrences get a
/// `#n` suffix, so keys never collide within a list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArticleKey(Arc<str>);

impl ArticleKey {
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Binding between a render position and its on-screen element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemHandle {
    pub key: ArticleKey,
    /// Position in the rendered (filtered) list.
    pub index: usize,
}

/// Build handles for a rendered list, in render order.
pub fn assign_handles(articles: &[Article]) -> Vec<ItemHandle> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(articles.len());
    articles
        .iter()
        .enumerate()
        .map(|(index, article)| {
            let count = seen.entry(article.url.as_str()).or_insert(0);
            *count += 1;
            let key = if *count == 1 {
                ArticleKey::new(article.url.as_str())
            } else {
                ArticleKey::new(format!("{}#{}", article.url, count))
            };
            ItemHandle { key, index }
        })
        .collect()
}

/// Vertical extent of an element in document rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub top: u32,
    pub height: u32,
}

impl Bounds {
    pub fn bottom(&self) -> u32 {
        self.top.saturating_add(self.height)
    }
}

/// The visible window onto the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// First visible document row.
    pub scroll_top: u32,
    /// Number of visible rows.
    pub height: u32,
}

impl Viewport {
    pub fn new(scroll_top: u32, height: u32) -> Self {
        Self { scroll_top, height }
    }

    /// Document row at `ratio` of the viewport height, measured from the top.
    pub fn line_at(&self, ratio: f32) -> f32 {
        self.scroll_top as f32 + ratio * self.height as f32
    }
}

/// Layout of every rendered element, keyed by [`ArticleKey`].
///
/// Owned by the view and rebuilt on layout. A key without an entry has no
/// element yet and is skipped by the reveal strategies.
#[derive(Debug, Default, Clone)]
pub struct HandleRegistry {
    bounds: HashMap<ArticleKey, Bounds>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ArticleKey, bounds: Bounds) {
        self.bounds.insert(key, bounds);
    }

    pub fn remove(&mut self, key: &ArticleKey) -> Option<Bounds> {
        self.bounds.remove(key)
    }

    pub fn get(&self, key: &ArticleKey) -> Option<Bounds> {
        self.bounds.get(key).copied()
    }

    pub fn contains(&self, key: &ArticleKey) -> bool {
        self.bounds.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.bounds.clear();
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn article(url: &str) -> Article {
        Article::new("t", None, url, None, "", "s")
    }

    #[test]
    fn test_keys_follow_url_and_index() {
        let handles = assign_handles(&[article("https://e.com/a"), article("https://e.com/b")]);
        assert_eq!(handles[0].key.as_str(), "https://e.com/a");
        assert_eq!(handles[0].index, 0);
        assert_eq!(handles[1].key.as_str(), "https://e.com/b");
        assert_eq!(handles[1].index, 1);
    }

    #[test]
    fn test_duplicate_urls_get_unique_keys() {
        let handles = assign_handles(&[
            article("https://e.com/a"),
            article("https://e.com/b"),
            article("https://e.com/a"),
            article("https://e.com/a"),
        ]);
        let keys: Vec<&str> = handles.iter().map(|h| h.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "https://e.com/a",
                "https://e.com/b",
                "https://e.com/a#2",
                "https://e.com/a#3"
            ]
        );
    }

    #[test]
    fn test_viewport_lines() {
        let vp = Viewport::new(100, 20);
        assert_eq!(vp.line_at(0.0), 100.0);
        assert_eq!(vp.line_at(0.5), 110.0);
    }
}
