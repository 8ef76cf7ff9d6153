//! Scroll-linked trigger registry.
//!
//! A trigger watches one element against two horizontal lines in the
//! viewport (start and end) and reports which toggle action to run as the
//! element's top edge crosses them in either direction.

use super::handle::{ArticleKey, HandleRegistry, Viewport};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// What to do to the bound tween when a trigger boundary is crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Play,
    Pause,
    Resume,
    Reverse,
    Restart,
    Reset,
    Complete,
    None,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToggleActionsError {
    #[error("Unknown toggle action: {0}")]
    UnknownAction(String),
    #[error("Expected 4 toggle actions, got {0}")]
    WrongCount(usize),
}

impl FromStr for ToggleAction {
    type Err = ToggleActionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "resume" => Ok(Self::Resume),
            "reverse" => Ok(Self::Reverse),
            "restart" => Ok(Self::Restart),
            "reset" => Ok(Self::Reset),
            "complete" => Ok(Self::Complete),
            "none" => Ok(Self::None),
            other => Err(ToggleActionsError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for ToggleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Reverse => "reverse",
            Self::Restart => "restart",
            Self::Reset => "reset",
            Self::Complete => "complete",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// Actions for the four boundary crossings, in the conventional order
/// onEnter, onLeave, onEnterBack, onLeaveBack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct ToggleActions {
    pub on_enter: ToggleAction,
    pub on_leave: ToggleAction,
    pub on_enter_back: ToggleAction,
    pub on_leave_back: ToggleAction,
}

impl Default for ToggleActions {
    /// `play none none reverse`
    fn default() -> Self {
        Self {
            on_enter: ToggleAction::Play,
            on_leave: ToggleAction::None,
            on_enter_back: ToggleAction::None,
            on_leave_back: ToggleAction::Reverse,
        }
    }
}

impl FromStr for ToggleActions {
    type Err = ToggleActionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.len() != 4 {
            return Err(ToggleActionsError::WrongCount(parts.len()));
        }
        Ok(Self {
            on_enter: parts[0].parse()?,
            on_leave: parts[1].parse()?,
            on_enter_back: parts[2].parse()?,
            on_leave_back: parts[3].parse()?,
        })
    }
}

impl TryFrom<String> for ToggleActions {
    type Error = ToggleActionsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ToggleActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.on_enter, self.on_leave, self.on_enter_back, self.on_leave_back
        )
    }
}

/// Trigger placement: the element's top edge against lines at
/// `start_ratio` and `end_ratio` of the viewport height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerSpec {
    pub start_ratio: f32,
    pub end_ratio: f32,
    pub actions: ToggleActions,
}

impl Default for TriggerSpec {
    fn default() -> Self {
        Self {
            start_ratio: 0.85,
            end_ratio: 0.2,
            actions: ToggleActions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriggerId(u64);

/// Where the element's top edge sits relative to the trigger lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    /// Below the start line (not yet scrolled into range).
    Before,
    /// Between start and end lines.
    Active,
    /// Above the end line.
    After,
}

#[derive(Debug, Clone)]
pub struct Trigger {
    pub id: TriggerId,
    pub target: ArticleKey,
    pub spec: TriggerSpec,
    region: Option<Region>,
}

/// A boundary crossing that maps to a non-`None` action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerFire {
    pub id: TriggerId,
    pub target: ArticleKey,
    pub action: ToggleAction,
}

/// The scroll-linked animation driver: every live trigger, enumerable and
/// killable as a set.
#[derive(Debug, Default)]
pub struct ScrollDriver {
    next_id: u64,
    triggers: BTreeMap<TriggerId, Trigger>,
}

impl ScrollDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger bound to `target`.
    pub fn create(&mut self, target: ArticleKey, spec: TriggerSpec) -> TriggerId {
        self.next_id += 1;
        let id = TriggerId(self.next_id);
        self.triggers.insert(
            id,
            Trigger {
                id,
                target,
                spec,
                region: None,
            },
        );
        id
    }

    pub fn kill(&mut self, id: TriggerId) -> bool {
        self.triggers.remove(&id).is_some()
    }

    /// Kill every trigger. Returns how many were live.
    pub fn kill_all(&mut self) -> usize {
        let count = self.triggers.len();
        self.triggers.clear();
        count
    }

    pub fn get_all(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.values()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Evaluate every trigger against the current scroll position.
    ///
    /// The first evaluation of a trigger counts as a crossing from `Before`,
    /// so elements already in range fire `on_enter` immediately. Triggers
    /// whose element has no bounds are left untouched.
    pub fn update(&mut self, registry: &HandleRegistry, viewport: Viewport) -> Vec<TriggerFire> {
        let mut fires = Vec::new();

        for trigger in self.triggers.values_mut() {
            let Some(bounds) = registry.get(&trigger.target) else {
                continue;
            };

            let top = bounds.top as f32;
            let start_line = viewport.line_at(trigger.spec.start_ratio);
            let end_line = viewport.line_at(trigger.spec.end_ratio);
            let region = if top > start_line {
                Region::Before
            } else if top > end_line {
                Region::Active
            } else {
                Region::After
            };

            let previous = trigger.region.unwrap_or(Region::Before);
            trigger.region = Some(region);

            let actions = trigger.spec.actions;
            let crossed: [Option<ToggleAction>; 2] = match (previous, region) {
                (Region::Before, Region::Active) => [Some(actions.on_enter), None],
                (Region::Before, Region::After) => [Some(actions.on_enter), Some(actions.on_leave)],
                (Region::Active, Region::After) => [Some(actions.on_leave), None],
                (Region::After, Region::Active) => [Some(actions.on_enter_back), None],
                (Region::After, Region::Before) => {
                    [Some(actions.on_enter_back), Some(actions.on_leave_back)]
                }
                (Region::Active, Region::Before) => [Some(actions.on_leave_back), None],
                _ => [None, None],
            };

            fires.extend(
                crossed
                    .into_iter()
                    .flatten()
                    .filter(|a| *a != ToggleAction::None)
                    .map(|action| TriggerFire {
                        id: trigger.id,
                        target: trigger.target.clone(),
                        action,
                    }),
            );
        }

        fires
    }
}
