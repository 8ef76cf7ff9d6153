use crate::config::Config;
use crate::feed::{Article, FeedState, FetchError};
use crate::reveal::{
    assign_handles, ArticleKey, Bounds, CapabilityFlag, CapabilityProbe, CapabilityUnavailable,
    Easing, HandleRegistry, ItemHandle, RevealController, ScrollDriver, Tween, Viewport,
    VisualState,
};
use crate::search::{Debounce, SearchFilter, MAX_SEARCH_QUERY_LENGTH};
use crate::util::{strip_control_chars, strip_html, wrap_to_width};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Blank rows between consecutive cards.
pub const CARD_GAP: u32 = 1;
/// Border plus one column of padding on each side.
const CARD_CHROME_WIDTH: u16 = 4;
const TITLE_MAX_LINES: usize = 2;
const DESCRIPTION_MAX_LINES: usize = 3;
const HEADER_DURATION: Duration = Duration::from_secs(1);
const HEADER_DELAY: Duration = Duration::from_millis(300);
/// Status messages expire after this long.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Number of frames in the loading spinner animation.
pub const SPINNER_FRAMES: usize = 10;

/// Events from background tasks.
#[derive(Debug)]
pub enum AppEvent {
    /// A fetch settled. `reset` mirrors the request.
    FeedLoaded {
        reset: bool,
        result: Result<Vec<Article>, FetchError>,
    },
    /// The scroll-linked driver probe finished.
    CapabilityResolved(Result<ScrollDriver, CapabilityUnavailable>),
    /// A background task panicked.
    TaskPanicked { task: &'static str, error: String },
}

/// Pre-wrapped text and document position of one card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    pub key: ArticleKey,
    pub bounds: Bounds,
    pub title: Vec<String>,
    pub description: Vec<String>,
}

/// Stack cards vertically for a list area `width` columns wide.
///
/// Card height is border (2) + meta line + wrapped title + wrapped
/// description + link line; cards are separated by [`CARD_GAP`] rows.
pub fn layout_cards(articles: &[Article], handles: &[ItemHandle], width: u16) -> Vec<CardLayout> {
    let inner = width.saturating_sub(CARD_CHROME_WIDTH).max(1) as usize;
    let mut top = 0u32;

    articles
        .iter()
        .zip(handles)
        .map(|(article, handle)| {
            let title = wrap_to_width(&strip_control_chars(&article.title), inner, TITLE_MAX_LINES);
            let description = article
                .description
                .as_deref()
                .map(|d| {
                    let plain = strip_html(d);
                    wrap_to_width(&strip_control_chars(&plain), inner, DESCRIPTION_MAX_LINES)
                })
                .unwrap_or_default();

            let height = 2 + 1 + title.len().max(1) as u32 + description.len() as u32 + 1;
            let bounds = Bounds { top, height };
            top += height + CARD_GAP;

            CardLayout {
                key: handle.key.clone(),
                bounds,
                title,
                description,
            }
        })
        .collect()
}

/// Central application state: the feed view.
pub struct App {
    pub feed: FeedState,
    search: SearchFilter,
    pub debounce: Debounce,
    pub search_mode: bool,
    pub search_input: String,

    /// Filtered list currently rendered.
    visible: Arc<Vec<Article>>,
    handles: Vec<ItemHandle>,
    cards: Vec<CardLayout>,
    /// Key → bounds of every laid-out card.
    pub registry: HandleRegistry,

    pub reveal: RevealController,
    pub probe: CapabilityProbe,
    pub header: Tween<VisualState>,

    pub selected: usize,
    pub scroll_top: u32,
    list_width: u16,
    list_height: u16,

    pub feed_url: String,
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub spinner_frame: usize,
    pub needs_redraw: bool,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let mut header = Tween::new(
            VisualState::HEADER_HIDDEN,
            VisualState::SHOWN,
            HEADER_DURATION,
            Easing::Power3Out,
        );
        header.play(HEADER_DELAY);

        Self {
            feed: FeedState::new(config.dedupe_appends),
            search: SearchFilter::new(),
            debounce: Debounce::new(config.search_debounce()),
            search_mode: false,
            search_input: String::new(),
            visible: Arc::new(Vec::new()),
            handles: Vec::new(),
            cards: Vec::new(),
            registry: HandleRegistry::new(),
            reveal: RevealController::new(config.reveal.clone()),
            probe: CapabilityProbe::new(),
            header,
            selected: 0,
            scroll_top: 0,
            list_width: 0,
            list_height: 0,
            feed_url: config.feed_url.clone(),
            status_message: None,
            spinner_frame: 0,
            needs_redraw: true,
        }
    }

    pub fn visible(&self) -> &Arc<Vec<Article>> {
        &self.visible
    }

    pub fn cards(&self) -> &[CardLayout] {
        &self.cards
    }

    pub fn handles(&self) -> &[ItemHandle] {
        &self.handles
    }

    pub fn is_loading(&self) -> bool {
        self.feed.loading
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.scroll_top, self.list_height as u32)
    }

    /// Total document height in rows.
    pub fn document_height(&self) -> u32 {
        self.cards.last().map(|c| c.bounds.bottom()).unwrap_or(0)
    }

    pub fn selected_article(&self) -> Option<&Article> {
        self.visible.get(self.selected)
    }

    pub fn selected_key(&self) -> Option<&ArticleKey> {
        self.handles.get(self.selected).map(|h| &h.key)
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Record the size of the card list area. Re-lays out on width change.
    pub fn set_list_area(&mut self, width: u16, height: u16) {
        let width_changed = width != self.list_width;
        self.list_width = width;
        self.list_height = height;
        if width_changed {
            self.relayout();
            self.reveal.sync(&self.handles, &self.registry);
        }
        self.clamp_scroll();
    }

    fn relayout(&mut self) {
        self.cards = if self.list_width == 0 {
            Vec::new()
        } else {
            layout_cards(&self.visible, &self.handles, self.list_width)
        };
        self.registry.clear();
        for card in &self.cards {
            self.registry.insert(card.key.clone(), card.bounds);
        }
    }

    /// Recompute the filtered list and bring handles, layout and reveal
    /// subscriptions in line with it.
    pub fn refresh_view(&mut self) {
        let visible = self.search.apply(&self.feed.articles, &self.feed.search_term);
        if Arc::ptr_eq(&visible, &self.visible) {
            self.reveal.sync(&self.handles, &self.registry);
        } else {
            // A new list recreates every handle, even with the same urls
            self.visible = visible;
            self.handles = assign_handles(&self.visible);
            self.relayout();
            self.reveal.replace(&self.handles, &self.registry);
        }

        if self.selected >= self.visible.len() {
            self.selected = self.visible.len().saturating_sub(1);
        }
        self.clamp_scroll();
        self.sync_hover();
        self.needs_redraw = true;
    }

    // ------------------------------------------------------------------
    // Feed
    // ------------------------------------------------------------------

    /// Claim the single in-flight fetch slot.
    pub fn begin_fetch(&mut self) -> bool {
        let started = self.feed.begin_fetch();
        if started {
            self.spinner_frame = 0;
            self.needs_redraw = true;
        }
        started
    }

    /// Apply a settled fetch. Failures are logged by the feed state and
    /// otherwise leave the view as it was.
    pub fn apply_fetch(&mut self, reset: bool, result: Result<Vec<Article>, FetchError>) {
        if let Ok(added) = self.feed.settle(reset, result) {
            if reset {
                self.selected = 0;
                self.scroll_top = 0;
            } else if added > 0 {
                self.set_status(format!("Loaded {} more", added));
            }
        }
        self.refresh_view();
    }

    /// Release the in-flight slot after a fetch task died without settling.
    pub fn abandon_fetch(&mut self) {
        self.feed.loading = false;
        self.needs_redraw = true;
    }

    // ------------------------------------------------------------------
    // Reveal
    // ------------------------------------------------------------------

    /// Feed the probe outcome to the controller. Only the first outcome
    /// counts.
    pub fn resolve_capability(&mut self, outcome: Result<ScrollDriver, CapabilityUnavailable>) {
        if let Some(outcome) = self.probe.resolve(outcome) {
            self.reveal.commit(outcome, &self.registry);
            self.needs_redraw = true;
        }
    }

    pub fn capability(&self) -> CapabilityFlag {
        self.probe.flag()
    }

    /// Advance animations by `dt`. Returns true while anything is moving.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let header = self.header.advance(dt);
        let viewport = self.viewport();
        let cards = self.reveal.update(&self.registry, viewport, dt);
        let animating = header || cards;
        if animating {
            self.needs_redraw = true;
        }
        if self.feed.loading {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES;
            self.needs_redraw = true;
        }
        animating
    }

    pub fn card_visual(&self, key: &ArticleKey) -> VisualState {
        self.reveal.visual(key).unwrap_or(VisualState::HIDDEN)
    }

    fn sync_hover(&mut self) {
        let key = self.handles.get(self.selected).map(|h| h.key.clone());
        self.reveal.set_hover(key.as_ref());
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    pub fn enter_search(&mut self) {
        self.search_mode = true;
        self.search_input = self.feed.search_term.clone();
    }

    /// Append a typed character. Returns false when the query is full.
    pub fn search_push(&mut self, c: char) -> bool {
        if self.search_input.chars().count() >= MAX_SEARCH_QUERY_LENGTH {
            self.set_status(format!(
                "Search query at max length ({} chars)",
                MAX_SEARCH_QUERY_LENGTH
            ));
            return false;
        }
        self.search_input.push(c);
        self.debounce.push(self.search_input.clone());
        true
    }

    pub fn search_backspace(&mut self) {
        if self.search_input.pop().is_some() {
            self.debounce.push(self.search_input.clone());
        }
    }

    /// Apply the debounced term once input has been idle long enough.
    pub fn poll_search(&mut self) -> bool {
        match self.debounce.poll() {
            Some(term) => {
                self.apply_search_term(term);
                true
            }
            None => false,
        }
    }

    /// Enter: apply the typed term immediately and leave search mode.
    pub fn commit_search(&mut self) {
        self.debounce.flush();
        self.search_mode = false;
        let term = self.search_input.clone();
        self.apply_search_term(term);
    }

    /// Esc: drop the term, show the full list again, leave search mode.
    pub fn cancel_search(&mut self) {
        self.debounce.flush();
        self.search_mode = false;
        self.search_input.clear();
        self.apply_search_term(String::new());
    }

    fn apply_search_term(&mut self, term: String) {
        if term == self.feed.search_term {
            return;
        }
        tracing::debug!(term = %term, "Search term applied");
        self.feed.search_term = term;
        self.selected = 0;
        self.scroll_top = 0;
        self.refresh_view();
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.visible.len() {
            self.select(self.selected + 1);
        }
    }

    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.select(self.selected - 1);
        }
    }

    pub fn select_first(&mut self) {
        self.select(0);
    }

    pub fn select_last(&mut self) {
        self.select(self.visible.len().saturating_sub(1));
    }

    /// Scroll one viewport down and select the first card starting in view.
    pub fn page_down(&mut self) {
        self.scroll_top = self.scroll_top.saturating_add(self.list_height as u32);
        self.clamp_scroll();
        self.select_first_in_view();
    }

    pub fn page_up(&mut self) {
        self.scroll_top = self.scroll_top.saturating_sub(self.list_height as u32);
        self.select_first_in_view();
    }

    fn select_first_in_view(&mut self) {
        let top = self.scroll_top;
        if let Some(index) = self.cards.iter().position(|c| c.bounds.top >= top) {
            self.selected = index;
            self.sync_hover();
        } else if !self.cards.is_empty() {
            self.selected = self.cards.len() - 1;
            self.sync_hover();
        }
        self.needs_redraw = true;
    }

    fn select(&mut self, index: usize) {
        if index >= self.visible.len() {
            return;
        }
        self.selected = index;
        self.scroll_to_selected();
        self.sync_hover();
        self.needs_redraw = true;
    }

    /// Keep the selected card fully in view where it fits.
    fn scroll_to_selected(&mut self) {
        let Some(card) = self.cards.get(self.selected) else {
            return;
        };
        let height = self.list_height as u32;
        let bottom = card.bounds.bottom();
        if card.bounds.top < self.scroll_top {
            self.scroll_top = card.bounds.top;
        } else if bottom > self.scroll_top + height {
            self.scroll_top = bottom.saturating_sub(height).min(card.bounds.top);
        }
        self.clamp_scroll();
    }

    fn clamp_scroll(&mut self) {
        let max = self.document_height().saturating_sub(self.list_height as u32);
        self.scroll_top = self.scroll_top.min(max);
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Clear the status message if expired. Returns true if one was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}
