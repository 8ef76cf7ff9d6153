use super::handle::{ArticleKey, HandleRegistry, ItemHandle, Viewport};
use super::trigger::{ScrollDriver, ToggleAction, TriggerId, TriggerSpec};
use super::watcher::IntersectionWatcher;
use std::collections::HashMap;
use std::time::Duration;

/// An instruction for one handle's reveal tween.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealCommand {
    pub key: ArticleKey,
    pub action: ToggleAction,
    /// Start delay; only honoured when the tween starts from the beginning.
    pub delay: Duration,
}

/// Scroll-linked reveal: one trigger per handle in the driver's registry.
#[derive(Debug)]
pub struct ScrollLinked {
    driver: ScrollDriver,
    spec: TriggerSpec,
    stagger: Duration,
    attached: HashMap<ArticleKey, (TriggerId, usize)>,
}

impl ScrollLinked {
    pub fn new(driver: ScrollDriver, spec: TriggerSpec, stagger: Duration) -> Self {
        Self {
            driver,
            spec,
            stagger,
            attached: HashMap::new(),
        }
    }

    pub fn driver(&self) -> &ScrollDriver {
        &self.driver
    }
}

/// Intersection fallback: every pending handle shares one watcher and is
/// dropped from it after its first qualifying intersection.
#[derive(Debug)]
pub struct Intersection {
    watcher: IntersectionWatcher,
    stagger: Duration,
}

impl Intersection {
    pub fn new(watcher: IntersectionWatcher, stagger: Duration) -> Self {
        Self { watcher, stagger }
    }

    pub fn watcher(&self) -> &IntersectionWatcher {
        &self.watcher
    }
}

/// The reveal strategy the controller committed to.
#[derive(Debug)]
pub enum RevealStrategy {
    ScrollLinked(ScrollLinked),
    Intersection(Intersection),
}

impl RevealStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            RevealStrategy::ScrollLinked(_) => "scroll-linked",
            RevealStrategy::Intersection(_) => "intersection",
        }
    }

    /// Whether a handle may only ever play its reveal once.
    pub fn is_one_shot(&self) -> bool {
        matches!(self, RevealStrategy::Intersection(_))
    }

    pub fn attach(&mut self, handle: &ItemHandle) {
        match self {
            RevealStrategy::ScrollLinked(s) => {
                if let Some((old, _)) = s.attached.remove(&handle.key) {
                    s.driver.kill(old);
                }
                let id = s.driver.create(handle.key.clone(), s.spec);
                s.attached.insert(handle.key.clone(), (id, handle.index));
            }
            RevealStrategy::Intersection(s) => s.watcher.observe(handle.key.clone()),
        }
    }

    pub fn detach(&mut self, key: &ArticleKey) -> bool {
        match self {
            RevealStrategy::ScrollLinked(s) => match s.attached.remove(key) {
                Some((id, _)) => s.driver.kill(id),
                None => false,
            },
            RevealStrategy::Intersection(s) => s.watcher.unobserve(key),
        }
    }

    /// Release every subscription. Returns how many were live.
    pub fn teardown_all(&mut self) -> usize {
        match self {
            RevealStrategy::ScrollLinked(s) => {
                s.attached.clear();
                s.driver.kill_all()
            }
            RevealStrategy::Intersection(s) => s.watcher.disconnect(),
        }
    }

    pub fn active_subscriptions(&self) -> usize {
        match self {
            RevealStrategy::ScrollLinked(s) => s.driver.len(),
            RevealStrategy::Intersection(s) => s.watcher.len(),
        }
    }

    pub fn is_attached(&self, key: &ArticleKey) -> bool {
        match self {
            RevealStrategy::ScrollLinked(s) => s.attached.contains_key(key),
            RevealStrategy::Intersection(s) => s.watcher.is_observing(key),
        }
    }

    /// Evaluate subscriptions against the current scroll position.
    pub fn poll(&mut self, registry: &HandleRegistry, viewport: Viewport) -> Vec<RevealCommand> {
        match self {
            RevealStrategy::ScrollLinked(s) => {
                let fires = s.driver.update(registry, viewport);
                fires
                    .into_iter()
                    .map(|fire| {
                        let index = s.attached.get(&fire.target).map(|(_, i)| *i).unwrap_or(0);
                        RevealCommand {
                            delay: s.stagger * index as u32,
                            key: fire.target,
                            action: fire.action,
                        }
                    })
                    .collect()
            }
            RevealStrategy::Intersection(s) => {
                let entries = s.watcher.take_records(registry, viewport);
                entries
                    .into_iter()
                    .enumerate()
                    .filter(|(_, entry)| entry.is_intersecting)
                    .map(|(entry_index, entry)| {
                        s.watcher.unobserve(&entry.key);
                        RevealCommand {
                            key: entry.key,
                            action: ToggleAction::Play,
                            delay: s.stagger * entry_index as u32,
                        }
                    })
                    .collect()
            }
        }
    }
}
