use crate::feed::client::FetchError;
use crate::feed::types::Article;
use std::collections::HashSet;
use std::sync::Arc;

/// Article list plus the flags the view renders from.
///
/// `articles` sits behind an `Arc` so the search memo can detect "same list"
/// by pointer identity; every successful fetch installs a fresh `Arc`.
#[derive(Debug, Clone)]
pub struct FeedState {
    pub articles: Arc<Vec<Article>>,
    pub loading: bool,
    pub search_term: String,
    /// Drop appended articles whose url is already present.
    pub dedupe_appends: bool,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            articles: Arc::new(Vec::new()),
            loading: false,
            search_term: String::new(),
            dedupe_appends: false,
        }
    }
}

impl FeedState {
    pub fn new(dedupe_appends: bool) -> Self {
        Self {
            dedupe_appends,
            ..Self::default()
        }
    }

    /// Mark a fetch as in flight.
    ///
    /// Returns `false` when one is already running; only one fetch may be in
    /// flight at a time.
    pub fn begin_fetch(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    /// Apply the outcome of a fetch and clear the loading flag.
    ///
    /// `reset` replaces the list, otherwise the batch is appended after the
    /// existing articles. On error the list is left untouched.
    ///
    /// Returns the number of articles added.
    pub fn settle(
        &mut self,
        reset: bool,
        result: Result<Vec<Article>, FetchError>,
    ) -> Result<usize, FetchError> {
        self.loading = false;

        let batch = match result {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(error = %e, reset, "Feed fetch failed, keeping previous articles");
                return Err(e);
            }
        };

        if reset {
            let added = batch.len();
            self.articles = Arc::new(batch);
            tracing::info!(count = added, "Feed replaced");
            return Ok(added);
        }

        let mut merged = Vec::with_capacity(self.articles.len() + batch.len());
        merged.extend(self.articles.iter().cloned());

        let added = if self.dedupe_appends {
            let mut seen: HashSet<String> = self.articles.iter().map(|a| a.url.clone()).collect();
            let before = merged.len();
            merged.extend(batch.into_iter().filter(|a| seen.insert(a.url.clone())));
            merged.len() - before
        } else {
            let added = batch.len();
            merged.extend(batch);
            added
        };

        self.articles = Arc::new(merged);
        tracing::info!(added, total = self.articles.len(), "Feed appended");
        Ok(added)
    }
}
