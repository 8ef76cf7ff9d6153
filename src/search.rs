//! Client-side search over the article list.
//!
//! [`filter`] is the pure operation. [`SearchFilter`] memoizes it on the
//! identity of the article list and the term, and [`Debounce`] decides when
//! live keyboard input is committed as the new term.

use crate::feed::Article;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Maximum accepted search query length in characters.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 256;

/// Filter `articles` down to those whose title or description contains `term`.
///
/// Matching is a case-insensitive substring test on the term as typed,
/// surrounding spaces included. An empty (or whitespace-only) term returns
/// the input `Arc` itself so callers can skip work by pointer comparison.
/// Articles without a description can only match on their title.
pub fn filter(articles: &Arc<Vec<Article>>, term: &str) -> Arc<Vec<Article>> {
    if term.trim().is_empty() {
        return Arc::clone(articles);
    }
    let needle = term.to_lowercase();

    let matched: Vec<Article> = articles
        .iter()
        .filter(|a| matches(a, &needle))
        .cloned()
        .collect();
    Arc::new(matched)
}

fn matches(article: &Article, needle_lower: &str) -> bool {
    article.title.to_lowercase().contains(needle_lower)
        || article
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle_lower))
}

/// Memoized [`filter`].
///
/// Recomputes only when the article list (by `Arc` identity) or the term
/// changes; otherwise hands back the previous result.
#[derive(Debug, Default)]
pub struct SearchFilter {
    source: Option<Arc<Vec<Article>>>,
    term: String,
    result: Arc<Vec<Article>>,
    recomputes: u64,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filtered view of `articles` for `term`.
    pub fn apply(&mut self, articles: &Arc<Vec<Article>>, term: &str) -> Arc<Vec<Article>> {
        let fresh = match &self.source {
            Some(source) => Arc::ptr_eq(source, articles) && self.term == term,
            None => false,
        };
        if fresh {
            return Arc::clone(&self.result);
        }

        self.result = filter(articles, term);
        self.source = Some(Arc::clone(articles));
        self.term = term.to_string();
        self.recomputes += 1;
        tracing::trace!(
            term = %term,
            matched = self.result.len(),
            total = articles.len(),
            "Search filter recomputed"
        );
        Arc::clone(&self.result)
    }

    /// Number of times the filter actually ran.
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }
}

/// Holds back a pending value until input has been idle for `delay`.
#[derive(Debug)]
pub struct Debounce {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record a new input value, restarting the idle timer.
    pub fn push(&mut self, value: impl Into<String>) {
        self.pending = Some((value.into(), Instant::now()));
    }

    /// Take the pending value if it has been idle long enough.
    pub fn poll(&mut self) -> Option<String> {
        match &self.pending {
            Some((_, at)) if at.elapsed() >= self.delay => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Take the pending value immediately (e.g. on Enter).
    pub fn flush(&mut self) -> Option<String> {
        self.pending.take().map(|(v, _)| v)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
