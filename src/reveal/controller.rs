use super::capability::{CapabilityFlag, CapabilityUnavailable};
use super::handle::{ArticleKey, HandleRegistry, ItemHandle, Viewport};
use super::motion::{Easing, Tween, VisualState};
use super::strategy::{Intersection, RevealCommand, RevealStrategy, ScrollLinked};
use super::trigger::{ScrollDriver, ToggleAction, TriggerSpec};
use super::watcher::IntersectionWatcher;
use super::RevealConfig;
use std::collections::HashMap;
use std::time::Duration;

/// Reveal lifecycle of one handle. One-way: handles are recreated, never
/// reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Attached (or buffered), reveal not yet completed.
    Pending,
    /// Reveal tween has completed at least once; hover is live.
    Revealed,
}

#[derive(Debug)]
struct HandleState {
    handle: ItemHandle,
    phase: Phase,
    reveal: Tween<VisualState>,
    hover: Tween<f32>,
    /// Times a reveal has been started by the strategy.
    reveals: u32,
}

impl HandleState {
    fn visual(&self) -> VisualState {
        let mut visual = self.reveal.value();
        visual.scale *= self.hover.value();
        visual
    }
}

/// Drives the progressive reveal of rendered items.
///
/// Until the capability probe settles no strategy exists and handles wait
/// in `Pending` with the hidden visual state. [`RevealController::commit`]
/// picks the strategy once; every later [`RevealController::sync`] tears the
/// old subscriptions down before attaching the new list.
#[derive(Debug)]
pub struct RevealController {
    config: RevealConfig,
    capability: CapabilityFlag,
    strategy: Option<RevealStrategy>,
    order: Vec<ArticleKey>,
    handles: HashMap<ArticleKey, HandleState>,
    hovered: Option<ArticleKey>,
}

impl RevealController {
    pub fn new(config: RevealConfig) -> Self {
        Self {
            config,
            capability: CapabilityFlag::Unknown,
            strategy: None,
            order: Vec::new(),
            handles: HashMap::new(),
            hovered: None,
        }
    }

    pub fn capability(&self) -> CapabilityFlag {
        self.capability
    }

    /// Name of the committed strategy, if any.
    pub fn strategy_name(&self) -> Option<&'static str> {
        self.strategy.as_ref().map(RevealStrategy::name)
    }

    /// Commit to a strategy based on the probe outcome and attach every
    /// buffered handle. Ignored after the first call.
    pub fn commit(
        &mut self,
        outcome: Result<ScrollDriver, CapabilityUnavailable>,
        registry: &HandleRegistry,
    ) -> bool {
        if self.strategy.is_some() {
            tracing::debug!("Reveal strategy already committed");
            return false;
        }

        let stagger = self.config.stagger();
        let strategy = match outcome {
            Ok(driver) => {
                self.capability = CapabilityFlag::Available;
                RevealStrategy::ScrollLinked(ScrollLinked::new(
                    driver,
                    TriggerSpec {
                        start_ratio: self.config.start_ratio,
                        end_ratio: self.config.end_ratio,
                        actions: self.config.toggle_actions,
                    },
                    stagger,
                ))
            }
            Err(_) => {
                self.capability = CapabilityFlag::Unavailable;
                RevealStrategy::Intersection(Intersection::new(
                    IntersectionWatcher::new(self.config.threshold, self.config.bottom_margin_rows),
                    stagger,
                ))
            }
        };

        tracing::info!(
            strategy = strategy.name(),
            buffered = self.order.len(),
            "Reveal strategy committed"
        );
        self.strategy = Some(strategy);
        self.attach_missing(registry);
        true
    }

    /// Bring the handle set in line with the rendered list.
    ///
    /// An unchanged key sequence only retries handles that had no element on
    /// the previous pass. Any other change is a [`RevealController::replace`].
    pub fn sync(&mut self, items: &[ItemHandle], registry: &HandleRegistry) {
        let unchanged = items.len() == self.order.len()
            && items.iter().zip(&self.order).all(|(h, k)| &h.key == k);

        if unchanged {
            self.attach_missing(registry);
        } else {
            self.replace(items, registry);
        }
    }

    /// Destroy every handle and recreate the set from `items`, even when the
    /// keys are the same as before.
    ///
    /// Every subscription of the old set is released before the new handles
    /// are created and attached.
    pub fn replace(&mut self, items: &[ItemHandle], registry: &HandleRegistry) {
        let released = self
            .strategy
            .as_mut()
            .map(RevealStrategy::teardown_all)
            .unwrap_or(0);
        tracing::debug!(
            released,
            previous = self.order.len(),
            next = items.len(),
            "Reveal handles replaced"
        );

        self.handles.clear();
        self.order.clear();
        for handle in items {
            // Hidden state is in place before any trigger can fire
            let state = HandleState {
                handle: handle.clone(),
                phase: Phase::Pending,
                reveal: self.reveal_tween(),
                hover: self.hover_tween(1.0, 1.0),
                reveals: 0,
            };
            self.order.push(handle.key.clone());
            self.handles.insert(handle.key.clone(), state);
        }
        if self
            .hovered
            .as_ref()
            .is_some_and(|k| !self.handles.contains_key(k))
        {
            self.hovered = None;
        }

        self.attach_missing(registry);
    }

    fn attach_missing(&mut self, registry: &HandleRegistry) {
        let Some(strategy) = self.strategy.as_mut() else {
            return;
        };
        let one_shot = strategy.is_one_shot();
        for key in &self.order {
            let Some(state) = self.handles.get(key) else {
                continue;
            };
            if strategy.is_attached(key) {
                continue;
            }
            // Fired one-shot handles stay detached
            if one_shot && state.reveals > 0 {
                continue;
            }
            if !registry.contains(key) {
                tracing::trace!(
                    key = %key,
                    index = state.handle.index,
                    "No element for handle yet, skipping"
                );
                continue;
            }
            strategy.attach(&state.handle);
        }
    }

    /// Release every subscription and drop all handles.
    pub fn dispose(&mut self) {
        let released = self
            .strategy
            .as_mut()
            .map(RevealStrategy::teardown_all)
            .unwrap_or(0);
        self.handles.clear();
        self.order.clear();
        self.hovered = None;
        tracing::debug!(released, "Reveal controller disposed");
    }

    /// Poll the strategy and advance every tween by `dt`.
    ///
    /// Returns true while anything is still moving.
    pub fn update(&mut self, registry: &HandleRegistry, viewport: Viewport, dt: Duration) -> bool {
        if let Some(strategy) = self.strategy.as_mut() {
            let one_shot = strategy.is_one_shot();
            let commands = strategy.poll(registry, viewport);
            for command in commands {
                self.apply(command, one_shot);
            }
        }

        let mut animating = false;
        for (key, state) in self.handles.iter_mut() {
            animating |= state.reveal.advance(dt);
            animating |= state.hover.advance(dt);

            if state.phase == Phase::Pending && state.reveal.is_complete() {
                state.phase = Phase::Revealed;
                tracing::trace!(key = %key, "Handle revealed");
                if self.hovered.as_ref() == Some(key) {
                    state.hover = Tween::new(
                        state.hover.value(),
                        self.config.hover_scale,
                        self.config.hover_duration(),
                        Easing::Power2Out,
                    );
                    state.hover.play(Duration::ZERO);
                    animating = true;
                }
            }
        }
        animating
    }

    fn apply(&mut self, command: RevealCommand, one_shot: bool) {
        let Some(state) = self.handles.get_mut(&command.key) else {
            return;
        };
        let starts = matches!(
            command.action,
            ToggleAction::Play | ToggleAction::Restart | ToggleAction::Resume
        );
        if one_shot && starts && state.reveals > 0 {
            return;
        }

        match command.action {
            ToggleAction::Play => state.reveal.play(command.delay),
            ToggleAction::Resume => state.reveal.resume(),
            ToggleAction::Restart => state.reveal.restart(command.delay),
            ToggleAction::Pause => state.reveal.pause(),
            ToggleAction::Reverse => state.reveal.reverse(),
            ToggleAction::Reset => state.reveal.reset(),
            ToggleAction::Complete => state.reveal.complete(),
            ToggleAction::None => {}
        }
        if starts {
            state.reveals += 1;
        }
        tracing::trace!(key = %command.key, action = %command.action, "Reveal command applied");
    }

    /// Move the hover target. Only revealed handles react.
    pub fn set_hover(&mut self, key: Option<&ArticleKey>) {
        if self.hovered.as_ref() == key {
            return;
        }
        let previous = std::mem::replace(&mut self.hovered, key.cloned());

        if let Some(prev) = previous {
            self.retarget_hover(&prev, 1.0);
        }
        if let Some(next) = key {
            let revealed = self
                .handles
                .get(next)
                .is_some_and(|s| s.phase == Phase::Revealed);
            if revealed {
                self.retarget_hover(next, self.config.hover_scale);
            }
        }
    }

    fn retarget_hover(&mut self, key: &ArticleKey, target: f32) {
        let tween = {
            let Some(state) = self.handles.get(key) else {
                return;
            };
            self.hover_tween(state.hover.value(), target)
        };
        if let Some(state) = self.handles.get_mut(key) {
            state.hover = tween;
            state.hover.play(Duration::ZERO);
        }
    }

    fn reveal_tween(&self) -> Tween<VisualState> {
        Tween::new(
            VisualState::HIDDEN,
            VisualState::SHOWN,
            self.config.duration(),
            Easing::Power3Out,
        )
    }

    fn hover_tween(&self, from: f32, to: f32) -> Tween<f32> {
        Tween::new(from, to, self.config.hover_duration(), Easing::Power2Out)
    }

    /// Current visual state of a handle (reveal composed with hover).
    pub fn visual(&self, key: &ArticleKey) -> Option<VisualState> {
        self.handles.get(key).map(HandleState::visual)
    }

    pub fn phase(&self, key: &ArticleKey) -> Option<Phase> {
        self.handles.get(key).map(|s| s.phase)
    }

    /// Times the strategy has started the reveal of a handle.
    pub fn reveal_count(&self, key: &ArticleKey) -> u32 {
        self.handles.get(key).map(|s| s.reveals).unwrap_or(0)
    }

    pub fn active_subscriptions(&self) -> usize {
        self.strategy
            .as_ref()
            .map(RevealStrategy::active_subscriptions)
            .unwrap_or(0)
    }

    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    pub fn is_animating(&self) -> bool {
        self.handles
            .values()
            .any(|s| s.reveal.is_running() || s.hover.is_running())
    }
}

impl Drop for RevealController {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reveal::handle::Bounds;
    use pretty_assertions::assert_eq;

    const FRAME: Duration = Duration::from_millis(50);

    fn handles(keys: &[&str]) -> Vec<ItemHandle> {
        keys.iter()
            .enumerate()
            .map(|(index, k)| ItemHandle {
                key: ArticleKey::new(*k),
                index,
            })
            .collect()
    }

    fn stacked(keys: &[&str], height: u32) -> HandleRegistry {
        let mut registry = HandleRegistry::new();
        for (i, k) in keys.iter().enumerate() {
            registry.insert(
                ArticleKey::new(*k),
                Bounds {
                    top: i as u32 * height,
                    height,
                },
            );
        }
        registry
    }

    fn key(s: &str) -> ArticleKey {
        ArticleKey::new(s)
    }

    fn run(
        controller: &mut RevealController,
        registry: &HandleRegistry,
        vp: Viewport,
        total: Duration,
    ) {
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            controller.update(registry, vp, FRAME);
            elapsed += FRAME;
        }
    }

    #[test]
    fn test_handles_buffer_hidden_until_commit() {
        let keys = ["a", "b"];
        let registry = stacked(&keys, 10);
        let mut controller = RevealController::new(RevealConfig::default());
        controller.sync(&handles(&keys), &registry);

        assert_eq!(controller.capability(), CapabilityFlag::Unknown);
        assert_eq!(controller.active_subscriptions(), 0);
        run(&mut controller, &registry, Viewport::new(0, 40), Duration::from_secs(3));
        assert_eq!(controller.visual(&key("a")), Some(VisualState::HIDDEN));
        assert_eq!(controller.phase(&key("a")), Some(Phase::Pending));

        assert!(controller.commit(Err(CapabilityUnavailable::new("test")), &registry));
        assert_eq!(controller.active_subscriptions(), 2);
        // Second commit does not switch strategy or double-subscribe
        assert!(!controller.commit(Ok(ScrollDriver::new()), &registry));
        assert_eq!(controller.strategy_name(), Some("intersection"));
        assert_eq!(controller.active_subscriptions(), 2);
    }

    #[test]
    fn test_fallback_reveals_each_handle_once() {
        let keys = ["a", "b", "c"];
        let registry = stacked(&keys, 10);
        let mut controller = RevealController::new(RevealConfig::default());
        controller.commit(Err(CapabilityUnavailable::new("test")), &registry);
        controller.sync(&handles(&keys), &registry);

        // Scroll up and down repeatedly so "a" toggles in and out of view
        for _ in 0..5 {
            run(&mut controller, &registry, Viewport::new(0, 20), Duration::from_millis(500));
            run(&mut controller, &registry, Viewport::new(200, 20), Duration::from_millis(500));
        }
        run(&mut controller, &registry, Viewport::new(200, 20), Duration::from_secs(3));

        assert_eq!(controller.reveal_count(&key("a")), 1);
        assert_eq!(controller.phase(&key("a")), Some(Phase::Revealed));
        // Stays revealed after scrolling away
        assert_eq!(controller.visual(&key("a")), Some(VisualState::SHOWN));
        // "c" (rows 20..30) never entered the 20-row viewport at scroll 0
        assert_eq!(controller.reveal_count(&key("c")), 0);
        assert_eq!(controller.phase(&key("c")), Some(Phase::Pending));
        assert_eq!(controller.active_subscriptions(), 1);
    }

    #[test]
    fn test_scroll_linked_reverses_when_scrolled_back() {
        let keys = ["a"];
        let mut registry = HandleRegistry::new();
        registry.insert(key("a"), Bounds { top: 90, height: 10 });
        let mut controller = RevealController::new(RevealConfig::default());
        controller.commit(Ok(ScrollDriver::new()), &registry);
        controller.sync(&handles(&keys), &registry);

        // Below the 85% line: hidden
        run(&mut controller, &registry, Viewport::new(0, 100), Duration::from_millis(200));
        assert_eq!(controller.reveal_count(&key("a")), 0);

        run(&mut controller, &registry, Viewport::new(20, 100), Duration::from_secs(2));
        assert_eq!(controller.phase(&key("a")), Some(Phase::Revealed));
        assert_eq!(controller.visual(&key("a")), Some(VisualState::SHOWN));

        // Back below the start line: reverses to hidden, phase stays Revealed
        run(&mut controller, &registry, Viewport::new(0, 100), Duration::from_secs(2));
        assert_eq!(controller.visual(&key("a")), Some(VisualState::HIDDEN));
        assert_eq!(controller.phase(&key("a")), Some(Phase::Revealed));

        // And plays again
        run(&mut controller, &registry, Viewport::new(20, 100), Duration::from_secs(2));
        assert_eq!(controller.reveal_count(&key("a")), 2);
        assert_eq!(controller.visual(&key("a")), Some(VisualState::SHOWN));
    }

    #[test]
    fn test_scroll_linked_stagger_delays_later_items() {
        let keys = ["a", "b", "c", "d", "e"];
        let registry = stacked(&keys, 4);
        let mut controller = RevealController::new(RevealConfig::default());
        controller.commit(Ok(ScrollDriver::new()), &registry);
        controller.sync(&handles(&keys), &registry);

        // One frame later "a" has moved but "e" (delay 0.4s) has not
        controller.update(&registry, Viewport::new(0, 100), Duration::from_millis(100));
        let a = controller.visual(&key("a")).unwrap();
        let e = controller.visual(&key("e")).unwrap();
        assert!(a.opacity > 0.0);
        assert_eq!(e, VisualState::HIDDEN);
    }

    #[test]
    fn test_replacing_list_releases_old_subscriptions() {
        let old = ["a", "b", "c", "d"];
        let new = ["x", "y"];
        let mut registry = stacked(&old, 10);
        let mut controller = RevealController::new(RevealConfig::default());
        controller.commit(Ok(ScrollDriver::new()), &registry);
        controller.sync(&handles(&old), &registry);
        assert_eq!(controller.active_subscriptions(), 4);

        registry = stacked(&new, 10);
        controller.sync(&handles(&new), &registry);
        assert_eq!(controller.active_subscriptions(), 2);
        assert_eq!(controller.handle_count(), 2);
        assert!(controller.phase(&key("a")).is_none());

        // Same list again is a no-op
        controller.sync(&handles(&new), &registry);
        assert_eq!(controller.active_subscriptions(), 2);
    }

    #[test]
    fn test_replace_with_same_keys_rehides_and_resubscribes() {
        let keys = ["a", "b", "c"];
        let registry = stacked(&keys, 10);
        let mut controller = RevealController::new(RevealConfig::default());
        controller.commit(Err(CapabilityUnavailable::new("test")), &registry);
        controller.sync(&handles(&keys), &registry);
        run(&mut controller, &registry, Viewport::new(0, 40), Duration::from_secs(3));
        assert_eq!(controller.phase(&key("a")), Some(Phase::Revealed));
        assert_eq!(controller.active_subscriptions(), 0);

        // A plain sync with the same keys keeps the revealed set
        controller.sync(&handles(&keys), &registry);
        assert_eq!(controller.phase(&key("a")), Some(Phase::Revealed));

        controller.replace(&handles(&keys), &registry);
        assert_eq!(controller.active_subscriptions(), 3);
        assert_eq!(controller.phase(&key("a")), Some(Phase::Pending));
        assert_eq!(controller.reveal_count(&key("a")), 0);
        assert_eq!(controller.visual(&key("a")), Some(VisualState::HIDDEN));

        run(&mut controller, &registry, Viewport::new(0, 40), Duration::from_secs(3));
        assert_eq!(controller.reveal_count(&key("a")), 1);
        assert_eq!(controller.phase(&key("a")), Some(Phase::Revealed));
    }

    #[test]
    fn test_replacing_list_under_fallback() {
        let old = ["a", "b", "c"];
        let new = ["a", "b", "c", "d", "e"];
        let registry = stacked(&new, 10);
        let mut controller = RevealController::new(RevealConfig::default());
        controller.commit(Err(CapabilityUnavailable::new("test")), &registry);
        controller.sync(&handles(&old), &registry);
        controller.sync(&handles(&new), &registry);
        assert_eq!(controller.active_subscriptions(), 5);
    }

    #[test]
    fn test_missing_element_skipped_then_attached() {
        let keys = ["a", "b"];
        let mut registry = stacked(&["a"], 10);
        let mut controller = RevealController::new(RevealConfig::default());
        controller.commit(Err(CapabilityUnavailable::new("test")), &registry);
        controller.sync(&handles(&keys), &registry);
        assert_eq!(controller.active_subscriptions(), 1);

        registry.insert(key("b"), Bounds { top: 10, height: 10 });
        controller.sync(&handles(&keys), &registry);
        assert_eq!(controller.active_subscriptions(), 2);
    }

    #[test]
    fn test_hover_scales_revealed_handle() {
        let keys = ["a"];
        let registry = stacked(&keys, 10);
        let mut controller = RevealController::new(RevealConfig::default());
        controller.commit(Ok(ScrollDriver::new()), &registry);
        controller.sync(&handles(&keys), &registry);

        // Hover before reveal has no effect yet
        controller.set_hover(Some(&key("a")));
        run(&mut controller, &registry, Viewport::new(0, 100), Duration::from_secs(2));
        let scale = controller.visual(&key("a")).unwrap().scale;
        assert!((scale - 1.02).abs() < 1e-4, "hover applied once revealed: {}", scale);

        controller.set_hover(None);
        run(&mut controller, &registry, Viewport::new(0, 100), Duration::from_secs(1));
        let scale = controller.visual(&key("a")).unwrap().scale;
        assert!((scale - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_dispose_releases_everything() {
        let keys = ["a", "b"];
        let registry = stacked(&keys, 10);
        let mut controller = RevealController::new(RevealConfig::default());
        controller.commit(Ok(ScrollDriver::new()), &registry);
        controller.sync(&handles(&keys), &registry);
        controller.dispose();
        assert_eq!(controller.active_subscriptions(), 0);
        assert_eq!(controller.handle_count(), 0);
    }
}
