use super::handle::{ArticleKey, Bounds, HandleRegistry, Viewport};
use std::collections::{HashMap, HashSet};

/// A change in an observed element's visibility.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub key: ArticleKey,
    /// Visible fraction of the element inside the (margin-adjusted) root.
    pub ratio: f32,
    pub is_intersecting: bool,
}

/// Shared viewport-intersection watcher.
///
/// One instance observes any number of elements. The root is the viewport
/// shrunk by `bottom_margin` rows at the bottom; an element counts as
/// intersecting once at least `threshold` of its height lies inside it.
/// Entries are reported on the first evaluation after `observe` and
/// whenever the intersecting state flips.
#[derive(Debug)]
pub struct IntersectionWatcher {
    threshold: f32,
    bottom_margin: u32,
    /// Observation order; entries are reported in this order. May hold
    /// unobserved keys until the next `take_records` compacts it.
    order: Vec<ArticleKey>,
    observed: HashSet<ArticleKey>,
    last: HashMap<ArticleKey, bool>,
}

impl IntersectionWatcher {
    pub fn new(threshold: f32, bottom_margin: u32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            bottom_margin,
            order: Vec::new(),
            observed: HashSet::new(),
            last: HashMap::new(),
        }
    }

    pub fn observe(&mut self, key: ArticleKey) {
        if self.observed.insert(key.clone()) {
            // A key unobserved since the last compaction is still in `order`
            if self.order.len() >= self.observed.len() {
                self.compact();
            }
            self.order.push(key);
        }
    }

    pub fn unobserve(&mut self, key: &ArticleKey) -> bool {
        self.last.remove(key);
        self.observed.remove(key)
    }

    fn compact(&mut self) {
        let observed = &self.observed;
        self.order.retain(|k| observed.contains(k));
    }

    /// Stop observing everything. Returns how many were observed.
    pub fn disconnect(&mut self) -> usize {
        let count = self.observed.len();
        self.order.clear();
        self.observed.clear();
        self.last.clear();
        count
    }

    pub fn is_observing(&self, key: &ArticleKey) -> bool {
        self.observed.contains(key)
    }

    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// Visible fraction of `bounds` inside the margin-adjusted root.
    fn ratio(&self, bounds: Bounds, viewport: Viewport) -> f32 {
        if bounds.height == 0 {
            return 0.0;
        }
        let root_top = viewport.scroll_top;
        let root_bottom = viewport
            .scroll_top
            .saturating_add(viewport.height.saturating_sub(self.bottom_margin));
        let overlap_top = bounds.top.max(root_top);
        let overlap_bottom = bounds.bottom().min(root_bottom);
        if overlap_bottom <= overlap_top {
            return 0.0;
        }
        (overlap_bottom - overlap_top) as f32 / bounds.height as f32
    }

    /// Collect visibility changes for the current scroll position.
    ///
    /// Observed keys without bounds produce no entry.
    pub fn take_records(
        &mut self,
        registry: &HandleRegistry,
        viewport: Viewport,
    ) -> Vec<IntersectionEntry> {
        if self.order.len() != self.observed.len() {
            self.compact();
        }
        let mut entries = Vec::new();
        for key in &self.order {
            let Some(bounds) = registry.get(key) else {
                continue;
            };
            let ratio = self.ratio(bounds, viewport);
            let is_intersecting = ratio > 0.0 && ratio >= self.threshold;
            let changed = self.last.get(key) != Some(&is_intersecting);
            if changed {
                self.last.insert(key.clone(), is_intersecting);
                entries.push(IntersectionEntry {
                    key: key.clone(),
                    ratio,
                    is_intersecting,
                });
            }
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(s: &str) -> ArticleKey {
        ArticleKey::new(s)
    }

    fn registry(items: &[(&str, u32, u32)]) -> HandleRegistry {
        let mut registry = HandleRegistry::new();
        for (k, top, height) in items {
            registry.insert(
                key(k),
                Bounds {
                    top: *top,
                    height: *height,
                },
            );
        }
        registry
    }

    #[test]
    fn test_first_evaluation_reports_every_observed_element() {
        let mut watcher = IntersectionWatcher::new(0.1, 0);
        watcher.observe(key("a"));
        watcher.observe(key("b"));
        let reg = registry(&[("a", 0, 10), ("b", 100, 10)]);

        let entries = watcher.take_records(&reg, Viewport::new(0, 40));
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_intersecting);
        assert!(!entries[1].is_intersecting);

        // No change, no entries
        assert!(watcher.take_records(&reg, Viewport::new(0, 40)).is_empty());
    }

    #[test]
    fn test_threshold_requires_ten_percent() {
        let mut watcher = IntersectionWatcher::new(0.1, 0);
        watcher.observe(key("a"));
        // 20-row card with its top at the last visible row: 1/20 = 5%
        let reg = registry(&[("a", 39, 20)]);
        let entries = watcher.take_records(&reg, Viewport::new(0, 40));
        assert!(!entries[0].is_intersecting);

        // Scroll 2 rows: 3/20 = 15%
        let entries = watcher.take_records(&reg, Viewport::new(2, 40));
        assert!(entries[0].is_intersecting);
        assert!((entries[0].ratio - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_bottom_margin_shrinks_root() {
        let mut watcher = IntersectionWatcher::new(0.1, 5);
        watcher.observe(key("a"));
        // Visible in the raw viewport (rows 36..40) but inside the margin
        let reg = registry(&[("a", 36, 10)]);
        let entries = watcher.take_records(&reg, Viewport::new(0, 40));
        assert!(!entries[0].is_intersecting);
    }

    #[test]
    fn test_unobserve_and_disconnect() {
        let mut watcher = IntersectionWatcher::new(0.1, 0);
        watcher.observe(key("a"));
        watcher.observe(key("a"));
        watcher.observe(key("b"));
        assert_eq!(watcher.len(), 2);

        assert!(watcher.unobserve(&key("a")));
        assert!(!watcher.unobserve(&key("a")));
        assert!(!watcher.is_observing(&key("a")));

        assert_eq!(watcher.disconnect(), 1);
        assert!(watcher.is_empty());
    }

    #[test]
    fn test_reobserve_keeps_single_entry_in_order() {
        let mut watcher = IntersectionWatcher::new(0.1, 0);
        for k in ["a", "b", "c"] {
            watcher.observe(key(k));
        }
        watcher.unobserve(&key("a"));
        watcher.observe(key("a"));
        assert_eq!(watcher.len(), 3);

        let reg = registry(&[("a", 0, 10), ("b", 10, 10), ("c", 20, 10)]);
        let keys: Vec<String> = watcher
            .take_records(&reg, Viewport::new(0, 40))
            .into_iter()
            .map(|e| e.key.to_string())
            .collect();
        assert_eq!(keys, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_many_observations_stay_consistent() {
        let mut watcher = IntersectionWatcher::new(0.1, 0);
        for i in 0..5_000 {
            watcher.observe(key(&i.to_string()));
        }
        for i in (0..5_000).step_by(2) {
            assert!(watcher.unobserve(&key(&i.to_string())));
        }
        assert_eq!(watcher.len(), 2_500);
        assert!(watcher.is_observing(&key("1")));
        assert!(!watcher.is_observing(&key("0")));
    }

    #[test]
    fn test_missing_bounds_produce_no_entry() {
        let mut watcher = IntersectionWatcher::new(0.1, 0);
        watcher.observe(key("ghost"));
        assert!(watcher
            .take_records(&HandleRegistry::new(), Viewport::new(0, 40))
            .is_empty());
    }
}
