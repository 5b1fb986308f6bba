//! Transition components for cancellable, preemptible interpolation.
//!
//! Every actor carries one slot per animatable property:
//! - [`PositionTransition`] – animates [`MapPosition`](super::mapposition::MapPosition)
//! - [`ScaleTransition`] – animates [`Scale`](super::scale::Scale)
//! - [`RotationTransition`] – animates [`Rotation`](super::rotation::Rotation)
//! - [`OpacityTransition`] – animates [`ActorVisibility`](super::visibility::ActorVisibility) opacity
//!
//! A slot holds at most one running [`Transition`]. Starting another one on
//! the same slot cancels the running one and continues from the value it
//! last applied, so the property never jumps. Each transition is paired with
//! a [`TransitionToken`] the requester can keep to cancel it or to observe
//! that it finished. See [`crate::systems::transition`] for the update
//! systems.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use bevy_ecs::prelude::Component;
use raylib::prelude::Vector2;

/// Easing functions for smooth interpolation.
///
/// These functions transform a linear `t` value (0.0 to 1.0) to create
/// different acceleration/deceleration curves.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    /// Constant speed (no easing).
    #[default]
    Linear,
    /// Starts slow, accelerates (quadratic).
    QuadIn,
    /// Starts fast, decelerates (quadratic).
    QuadOut,
    /// Slow start and end (quadratic).
    QuadInOut,
    /// Starts slow, accelerates (cubic).
    CubicIn,
    /// Starts fast, decelerates (cubic).
    CubicOut,
    /// Slow start and end (cubic).
    CubicInOut,
    /// Slow start and end (sine).
    SineInOut,
}

impl Easing {
    /// Parse the lowercase names used by scripts and config files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "linear" => Some(Easing::Linear),
            "quad_in" => Some(Easing::QuadIn),
            "quad_out" => Some(Easing::QuadOut),
            "quad_in_out" => Some(Easing::QuadInOut),
            "cubic_in" => Some(Easing::CubicIn),
            "cubic_out" => Some(Easing::CubicOut),
            "cubic_in_out" => Some(Easing::CubicInOut),
            "sine_in_out" => Some(Easing::SineInOut),
            _ => None,
        }
    }
}

/// Values that can be interpolated by a transition.
pub trait Interpolate: Copy + Send + Sync + 'static {
    fn interpolate(from: Self, to: Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(from: Self, to: Self, t: f32) -> Self {
        from + (to - from) * t
    }
}

impl Interpolate for Vector2 {
    fn interpolate(from: Self, to: Self, t: f32) -> Self {
        Vector2 {
            x: from.x + (to.x - from.x) * t,
            y: from.y + (to.y - from.y) * t,
        }
    }
}

/// Lifecycle of a transition as seen through its token.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransitionStatus {
    Running,
    Completed,
    Cancelled,
}

const STATUS_RUNNING: u8 = 0;
const STATUS_COMPLETED: u8 = 1;
const STATUS_CANCELLED: u8 = 2;

/// Shared handle to a transition's status.
///
/// Clones observe the same transition. Cancelling is cooperative: the
/// transition systems notice it on their next tick and leave the property at
/// the last applied value.
#[derive(Clone, Debug, Default)]
pub struct TransitionToken(Arc<AtomicU8>);

impl TransitionToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Has no effect once the transition completed.
    pub fn cancel(&self) {
        let _ = self.0.compare_exchange(
            STATUS_RUNNING,
            STATUS_CANCELLED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub fn is_cancelled(&self) -> bool {
        self.status() == TransitionStatus::Cancelled
    }

    pub fn status(&self) -> TransitionStatus {
        match self.0.load(Ordering::Acquire) {
            STATUS_COMPLETED => TransitionStatus::Completed,
            STATUS_CANCELLED => TransitionStatus::Cancelled,
            _ => TransitionStatus::Running,
        }
    }

    pub(crate) fn complete(&self) {
        let _ = self.0.compare_exchange(
            STATUS_RUNNING,
            STATUS_COMPLETED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

/// An in-flight interpolation of one property.
#[derive(Clone, Debug)]
pub struct Transition<T: Interpolate> {
    /// Starting value.
    pub from: T,
    /// Ending value.
    pub to: T,
    /// Duration in seconds.
    pub duration: f32,
    /// Easing function to use.
    pub easing: Easing,
    /// Time spent so far.
    pub elapsed: f32,
    /// Value written to the property on the last step.
    pub last_applied: T,
    pub token: TransitionToken,
}

/// Outcome of advancing a transition by one tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Step<T> {
    /// Still running; write this value.
    Apply(T),
    /// Reached the end; write this (exact `to`) value and drop the transition.
    Finished(T),
    /// Cancelled; leave the property untouched and drop the transition.
    Cancelled,
}

impl<T: Interpolate> Transition<T> {
    pub fn new(from: T, to: T, duration: f32, easing: Easing, token: TransitionToken) -> Self {
        Transition {
            from,
            to,
            duration,
            easing,
            elapsed: 0.0,
            last_applied: from,
            token,
        }
    }

    /// Advance by `dt` seconds.
    pub fn step(&mut self, dt: f32) -> Step<T> {
        if self.token.is_cancelled() {
            return Step::Cancelled;
        }
        self.elapsed += dt.max(0.0);
        if self.duration <= 0.0 || self.elapsed >= self.duration {
            self.last_applied = self.to;
            self.token.complete();
            return Step::Finished(self.to);
        }
        let t = ease(self.easing, self.elapsed / self.duration);
        let value = T::interpolate(self.from, self.to, t);
        self.last_applied = value;
        Step::Apply(value)
    }
}

/// Holds the (at most one) running transition of a property.
#[derive(Clone, Debug)]
pub struct TransitionSlot<T: Interpolate> {
    pub active: Option<Transition<T>>,
}

impl<T: Interpolate> Default for TransitionSlot<T> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<T: Interpolate> TransitionSlot<T> {
    /// Start a transition toward `to`.
    ///
    /// `current` is the property's present value, used only when nothing is
    /// running. A running transition is cancelled and its last applied value
    /// becomes the new start.
    pub fn start(
        &mut self,
        current: T,
        to: T,
        duration: f32,
        easing: Easing,
        token: TransitionToken,
    ) -> TransitionToken {
        let from = match self.active.take() {
            Some(prev) => {
                prev.token.cancel();
                prev.last_applied
            }
            None => current,
        };
        self.active = Some(Transition::new(from, to, duration, easing, token.clone()));
        token
    }

    /// Cancel the running transition, if any. The property keeps its value.
    pub fn cancel(&mut self) {
        if let Some(prev) = self.active.take() {
            prev.token.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Advance the running transition and return the value to write, if any.
    pub fn advance(&mut self, dt: f32) -> Option<T> {
        let step = self.active.as_mut()?.step(dt);
        match step {
            Step::Apply(v) => Some(v),
            Step::Finished(v) => {
                self.active = None;
                Some(v)
            }
            Step::Cancelled => {
                self.active = None;
                None
            }
        }
    }
}

/// Animates an actor's [`MapPosition`](super::mapposition::MapPosition).
#[derive(Component, Clone, Debug, Default)]
pub struct PositionTransition(pub TransitionSlot<Vector2>);

/// Animates an actor's [`Scale`](super::scale::Scale).
#[derive(Component, Clone, Debug, Default)]
pub struct ScaleTransition(pub TransitionSlot<Vector2>);

/// Animates an actor's [`Rotation`](super::rotation::Rotation) in degrees.
#[derive(Component, Clone, Debug, Default)]
pub struct RotationTransition(pub TransitionSlot<f32>);

/// Animates an actor's opacity (0.0 transparent, 1.0 opaque).
#[derive(Component, Clone, Debug, Default)]
pub struct OpacityTransition(pub TransitionSlot<f32>);

/// Apply an easing function to a normalized time value.
///
/// The input `t` is clamped to [0.0, 1.0] and transformed according to the
/// easing curve.
pub fn ease(e: Easing, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match e {
        Easing::Linear => t,
        Easing::QuadIn => t * t,
        Easing::QuadOut => t * (2.0 - t),
        Easing::QuadInOut => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                -1.0 + (4.0 - 2.0 * t) * t
            }
        }
        Easing::CubicIn => t * t * t,
        Easing::CubicOut => {
            let p = t - 1.0;
            p * p * p + 1.0
        }
        Easing::CubicInOut => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                let p = 2.0 * t - 2.0;
                0.5 * p * p * p + 1.0
            }
        }
        Easing::SineInOut => 0.5 * (1.0 - (std::f32::consts::PI * t).cos()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    const ALL: [Easing; 8] = [
        Easing::Linear,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::CubicIn,
        Easing::CubicOut,
        Easing::CubicInOut,
        Easing::SineInOut,
    ];

    // ==================== EASING TESTS ====================

    #[test]
    fn test_ease_endpoints() {
        for easing in ALL {
            assert!(approx_eq(ease(easing, 0.0), 0.0), "{:?} at 0", easing);
            assert!(approx_eq(ease(easing, 1.0), 1.0), "{:?} at 1", easing);
        }
    }

    #[test]
    fn test_ease_clamps_input() {
        for easing in ALL {
            assert!(approx_eq(ease(easing, -0.5), 0.0), "{:?} below 0", easing);
            assert!(approx_eq(ease(easing, 1.5), 1.0), "{:?} above 1", easing);
        }
    }

    #[test]
    fn test_ease_monotonic_spot_check() {
        for easing in ALL {
            let a = ease(easing, 0.25);
            let b = ease(easing, 0.5);
            let c = ease(easing, 0.75);
            assert!(a < b && b < c, "{:?} not increasing", easing);
        }
    }

    #[test]
    fn test_easing_from_name() {
        assert_eq!(Easing::from_name("cubic_out"), Some(Easing::CubicOut));
        assert_eq!(Easing::from_name("bounce"), None);
    }

    // ==================== TRANSITION TESTS ====================

    #[test]
    fn test_transition_pins_exact_end_value() {
        let mut tr = Transition::new(0.0f32, 0.3, 0.3, Easing::QuadInOut, TransitionToken::new());
        // Uneven steps whose float sum lands slightly off the duration.
        for _ in 0..2 {
            assert!(matches!(tr.step(0.1), Step::Apply(_)));
        }
        let mut last = tr.step(0.1);
        if let Step::Apply(_) = last {
            last = tr.step(0.1);
        }
        assert_eq!(last, Step::Finished(0.3));
        assert_eq!(tr.last_applied, 0.3);
        assert_eq!(tr.token.status(), TransitionStatus::Completed);
    }

    #[test]
    fn test_zero_duration_finishes_immediately() {
        let mut tr = Transition::new(1.0f32, 5.0, 0.0, Easing::Linear, TransitionToken::new());
        assert_eq!(tr.step(0.0), Step::Finished(5.0));
    }

    #[test]
    fn test_cancelled_transition_reports_cancelled() {
        let token = TransitionToken::new();
        let mut tr = Transition::new(0.0f32, 1.0, 1.0, Easing::Linear, token.clone());
        assert_eq!(tr.step(0.25), Step::Apply(0.25));
        token.cancel();
        assert_eq!(tr.step(0.25), Step::Cancelled);
        assert_eq!(tr.last_applied, 0.25);
    }

    #[test]
    fn test_cancel_after_completion_is_ignored() {
        let token = TransitionToken::new();
        let mut tr = Transition::new(0.0f32, 1.0, 0.5, Easing::Linear, token.clone());
        tr.step(1.0);
        token.cancel();
        assert_eq!(token.status(), TransitionStatus::Completed);
    }

    // ==================== SLOT TESTS ====================

    #[test]
    fn test_slot_preemption_continues_from_last_applied() {
        let mut slot = TransitionSlot::<f32>::default();
        let first = slot.start(1.0, 0.0, 1.0, Easing::Linear, TransitionToken::new());
        assert_eq!(slot.advance(0.25), Some(0.75));

        // `current` is ignored while something is running.
        slot.start(123.0, 1.0, 0.5, Easing::Linear, TransitionToken::new());
        assert_eq!(first.status(), TransitionStatus::Cancelled);
        let tr = slot.active.as_ref().unwrap();
        assert!(approx_eq(tr.from, 0.75));

        assert_eq!(slot.advance(0.25), Some(0.875));
        assert_eq!(slot.advance(0.25), Some(1.0));
        assert!(!slot.is_running());
    }

    #[test]
    fn test_slot_cancel_freezes_value() {
        let mut slot = TransitionSlot::<f32>::default();
        let token = slot.start(0.0, 10.0, 1.0, Easing::Linear, TransitionToken::new());
        assert_eq!(slot.advance(0.5), Some(5.0));
        token.cancel();
        assert_eq!(slot.advance(0.25), None);
        assert!(!slot.is_running());
    }

    #[test]
    fn test_slot_vector_interpolation() {
        let mut slot = TransitionSlot::<Vector2>::default();
        slot.start(
            Vector2 { x: 0.0, y: 0.0 },
            Vector2 { x: 10.0, y: -4.0 },
            2.0,
            Easing::Linear,
            TransitionToken::new(),
        );
        let v = slot.advance(0.5).unwrap();
        assert!(approx_eq(v.x, 2.5));
        assert!(approx_eq(v.y, -1.0));
    }
}
