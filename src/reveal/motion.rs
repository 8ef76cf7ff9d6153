//! Property tweens for the reveal and hover animations.
//!
//! A [`Tween`] owns its playhead and is advanced explicitly with elapsed
//! time, so the same code runs under the frame tick and in tests.

use std::time::Duration;

/// Animated properties of a card.
///
/// `y` is a downward offset in pixel-equivalent units and `rotation_x` is a
/// tilt in degrees; the renderer maps both onto terminal cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualState {
    pub opacity: f32,
    pub y: f32,
    pub scale: f32,
    pub rotation_x: f32,
}

impl VisualState {
    /// Pre-reveal state: faded, pushed down, shrunk and tilted back.
    pub const HIDDEN: Self = Self {
        opacity: 0.0,
        y: 60.0,
        scale: 0.9,
        rotation_x: 15.0,
    };

    /// Fully revealed resting state.
    pub const SHOWN: Self = Self {
        opacity: 1.0,
        y: 0.0,
        scale: 1.0,
        rotation_x: 0.0,
    };

    /// Header entrance start state.
    pub const HEADER_HIDDEN: Self = Self {
        opacity: 0.0,
        y: -50.0,
        scale: 1.0,
        rotation_x: 0.0,
    };
}

/// Values a [`Tween`] can interpolate.
pub trait Interpolate: Copy {
    fn lerp(from: Self, to: Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn lerp(from: Self, to: Self, t: f32) -> Self {
        from + (to - from) * t
    }
}

impl Interpolate for VisualState {
    fn lerp(from: Self, to: Self, t: f32) -> Self {
        Self {
            opacity: <f32 as Interpolate>::lerp(from.opacity, to.opacity, t),
            y: <f32 as Interpolate>::lerp(from.y, to.y, t),
            scale: <f32 as Interpolate>::lerp(from.scale, to.scale, t),
            rotation_x: <f32 as Interpolate>::lerp(from.rotation_x, to.rotation_x, t),
        }
    }
}

/// Easing curves. `PowerNOut` follows the usual naming where power2 is cubic
/// and power3 is quartic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    Power2Out,
    Power3Out,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Power2Out => 1.0 - (1.0 - t).powi(3),
            Easing::Power3Out => 1.0 - (1.0 - t).powi(4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// A from→to animation with a movable playhead.
///
/// Created paused at progress 0, so [`Tween::value`] is `from` until the
/// tween is played. Reversing runs the playhead back from wherever it is.
#[derive(Debug, Clone)]
pub struct Tween<T: Interpolate> {
    from: T,
    to: T,
    duration: Duration,
    easing: Easing,
    progress: f32,
    delay_remaining: Duration,
    direction: Direction,
    paused: bool,
}

impl<T: Interpolate> Tween<T> {
    pub fn new(from: T, to: T, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration,
            easing,
            progress: 0.0,
            delay_remaining: Duration::ZERO,
            direction: Direction::Forward,
            paused: true,
        }
    }

    /// Play forward. `delay` only applies when starting from the beginning.
    pub fn play(&mut self, delay: Duration) {
        if self.progress <= 0.0 {
            self.delay_remaining = delay;
        }
        self.direction = Direction::Forward;
        self.paused = false;
    }

    /// Play backward from the current position.
    pub fn reverse(&mut self) {
        self.direction = Direction::Backward;
        self.delay_remaining = Duration::ZERO;
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Continue in the current direction.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Jump to the start and play forward.
    pub fn restart(&mut self, delay: Duration) {
        self.progress = 0.0;
        self.play(delay);
    }

    /// Jump to the start and stop.
    pub fn reset(&mut self) {
        self.progress = 0.0;
        self.delay_remaining = Duration::ZERO;
        self.direction = Direction::Forward;
        self.paused = true;
    }

    /// Jump to the end and stop.
    pub fn complete(&mut self) {
        self.progress = 1.0;
        self.delay_remaining = Duration::ZERO;
        self.direction = Direction::Forward;
        self.paused = true;
    }

    /// Move the playhead by `dt`. Returns true while the tween is running.
    pub fn advance(&mut self, mut dt: Duration) -> bool {
        if self.paused {
            return false;
        }

        if !self.delay_remaining.is_zero() {
            if dt <= self.delay_remaining {
                self.delay_remaining -= dt;
                return true;
            }
            dt -= self.delay_remaining;
            self.delay_remaining = Duration::ZERO;
        }

        let step = if self.duration.is_zero() {
            1.0
        } else {
            dt.as_secs_f32() / self.duration.as_secs_f32()
        };

        match self.direction {
            Direction::Forward => {
                self.progress = (self.progress + step).min(1.0);
                if self.progress >= 1.0 {
                    self.paused = true;
                }
            }
            Direction::Backward => {
                self.progress = (self.progress - step).max(0.0);
                if self.progress <= 0.0 {
                    self.paused = true;
                }
            }
        }
        !self.paused
    }

    pub fn value(&self) -> T {
        if self.progress >= 1.0 {
            return self.to;
        }
        if self.progress <= 0.0 {
            return self.from;
        }
        T::lerp(self.from, self.to, self.easing.apply(self.progress))
    }

    /// Linear time fraction in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_running(&self) -> bool {
        !self.paused
    }

    /// Reached the end while playing forward.
    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0 && self.direction == Direction::Forward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn reveal() -> Tween<VisualState> {
        Tween::new(
            VisualState::HIDDEN,
            VisualState::SHOWN,
            Duration::from_millis(1200),
            Easing::Power3Out,
        )
    }

    #[test]
    fn test_new_tween_holds_start_value() {
        let mut tween = reveal();
        assert_eq!(tween.value(), VisualState::HIDDEN);
        assert!(!tween.advance(Duration::from_secs(5)));
        assert_eq!(tween.value(), VisualState::HIDDEN);
    }

    #[test]
    fn test_play_reaches_end() {
        let mut tween = reveal();
        tween.play(Duration::ZERO);
        assert!(tween.advance(Duration::from_millis(600)));
        let mid = tween.value();
        assert!(mid.opacity > 0.5 && mid.opacity < 1.0);
        assert!(!tween.advance(Duration::from_millis(600)));
        assert!(tween.is_complete());
        assert_eq!(tween.value(), VisualState::SHOWN);
    }

    #[test]
    fn test_delay_consumed_before_motion() {
        let mut tween = reveal();
        tween.play(Duration::from_millis(300));
        tween.advance(Duration::from_millis(200));
        assert_eq!(tween.progress(), 0.0);
        tween.advance(Duration::from_millis(400));
        assert!((tween.progress() - 0.25).abs() < EPS);
    }

    #[test]
    fn test_reverse_runs_back_from_current() {
        let mut tween = reveal();
        tween.play(Duration::ZERO);
        tween.advance(Duration::from_millis(1200));
        tween.reverse();
        tween.advance(Duration::from_millis(600));
        assert!((tween.progress() - 0.5).abs() < EPS);
        assert!(!tween.is_complete());
        tween.advance(Duration::from_millis(600));
        assert_eq!(tween.value(), VisualState::HIDDEN);
        assert!(!tween.is_running());
    }

    #[test]
    fn test_replay_after_reverse_skips_delay() {
        let mut tween = reveal();
        tween.play(Duration::ZERO);
        tween.advance(Duration::from_millis(600));
        tween.reverse();
        tween.advance(Duration::from_millis(300));
        tween.play(Duration::from_secs(10));
        tween.advance(Duration::from_millis(300));
        assert!((tween.progress() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_reset_and_complete() {
        let mut tween = reveal();
        tween.complete();
        assert_eq!(tween.value(), VisualState::SHOWN);
        tween.reset();
        assert_eq!(tween.value(), VisualState::HIDDEN);
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::Power2Out, Easing::Power3Out] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
        }
        assert!(Easing::Power3Out.apply(0.5) > Easing::Power2Out.apply(0.5));
    }

    #[test]
    fn test_scalar_tween() {
        let mut hover = Tween::new(1.0f32, 1.02, Duration::from_millis(300), Easing::Power2Out);
        hover.play(Duration::ZERO);
        hover.advance(Duration::from_millis(300));
        assert!((hover.value() - 1.02).abs() < EPS);
    }
}
