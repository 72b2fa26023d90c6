//! Gesture/rotation state machine.
//!
//! The controller never owns the active index: a release or a step request
//! produces a commit, and the host answers with [`Controller::set_index`].
//! Time is passed in explicitly so transitions can be driven by any clock.

use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::math::{interpolate, rotation_for_index, Easing, QUARTER_TURN};
use crate::state::{Direction, Phase, RotationState, SetIndex};

/// Release speed above which a drag commits regardless of distance
pub const FLICK_VELOCITY: f64 = 0.12;

/// Default length of an eased rotation
pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(300);

/// Interpolation from one angle to another over a fixed duration.
///
/// Retargeting replaces the tween with a new one that starts at the current
/// value, so transitions never queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    pub started_at: Instant,
    pub duration: Duration,
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: f64, to: f64, started_at: Instant, duration: Duration, easing: Easing) -> Self {
        Tween {
            from,
            to,
            started_at,
            duration,
            easing,
        }
    }

    /// Interpolated angle at `now`
    pub fn value_at(&self, now: Instant) -> f64 {
        if self.is_finished(now) {
            return self.to;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.from + (self.to - self.from) * self.easing.apply(t)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started_at) >= self.duration
    }
}

/// Outcome of releasing a captured drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseDecision {
    Commit(Direction),
    SnapBack,
}

/// Pure release rule: a flick wins, then half the pane width.
pub fn decide_release(dx: f64, velocity: f64, width: f64) -> ReleaseDecision {
    if velocity.abs() > FLICK_VELOCITY {
        return match Direction::from_drag(dx) {
            Some(direction) => ReleaseDecision::Commit(direction),
            None => ReleaseDecision::SnapBack,
        };
    }
    if dx < -width / 2.0 {
        ReleaseDecision::Commit(Direction::Next)
    } else if dx > width / 2.0 {
        ReleaseDecision::Commit(Direction::Previous)
    } else {
        ReleaseDecision::SnapBack
    }
}

/// How a drag move was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureResponse {
    /// The drag rotates the cube
    Captured,
    /// The drag belongs to someone else, e.g. page scroll
    PassThrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Gesture {
    #[default]
    None,
    Pending,
    Captured,
    PassThrough,
}

/// A request for the host to change the active index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    pub from: i64,
    pub to: i64,
}

#[derive(Debug, Clone)]
pub struct Controller {
    active_index: i64,
    phase: Phase,
    rotation: f64,
    immediate: bool,
    tween: Option<Tween>,
    /// Index committed to the host but not yet re-supplied
    pending: Option<i64>,
    gesture: Gesture,
    width: f64,
    duration: Duration,
    easing: Easing,
    enable_gestures: bool,
}

impl Controller {
    pub fn new(initial_index: i64, width: f64) -> Self {
        Controller {
            active_index: initial_index,
            phase: Phase::Idle,
            rotation: rotation_for_index(initial_index),
            immediate: true,
            tween: None,
            pending: None,
            gesture: Gesture::None,
            width,
            duration: DEFAULT_TRANSITION,
            easing: Easing::default(),
            enable_gestures: true,
        }
    }

    pub fn with_transition(mut self, duration: Duration, easing: Easing) -> Self {
        self.duration = duration;
        self.easing = easing;
        self
    }

    pub fn with_gestures(mut self, enabled: bool) -> Self {
        self.enable_gestures = enabled;
        self
    }

    pub fn active_index(&self) -> i64 {
        self.active_index
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Last sampled rotation in degrees
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn is_animating(&self) -> bool {
        self.phase == Phase::Animating
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == Phase::Dragging
    }

    pub fn pending_commit(&self) -> Option<i64> {
        self.pending
    }

    pub fn rotation_state(&self) -> RotationState {
        RotationState {
            degrees: self.rotation,
            animating: self.is_animating(),
            immediate: self.immediate,
        }
    }

    /// Resting angle of the active index
    pub fn base_rotation(&self) -> f64 {
        rotation_for_index(self.active_index)
    }

    /// Whether an item exists in `direction` from the active index
    pub fn can_reveal(&self, direction: Direction, has_next: &dyn Fn(i64) -> bool) -> bool {
        match direction {
            Direction::Previous => self.active_index > 0,
            Direction::Next => {
                self.active_index.checked_add(1).is_some() && has_next(self.active_index)
            }
        }
    }

    /// Pointer went down; capture is decided on the first move.
    pub fn drag_start(&mut self) {
        self.gesture = if self.enable_gestures {
            Gesture::Pending
        } else {
            Gesture::PassThrough
        };
    }

    /// Applies a drag delta measured from where the gesture started.
    pub fn drag_move(&mut self, dx: f64, dy: f64, has_next: &dyn Fn(i64) -> bool) -> GestureResponse {
        if self.gesture == Gesture::None {
            self.drag_start();
        }
        if self.gesture == Gesture::Pending {
            if self.is_eligible(dx, dy, has_next) {
                debug!("drag captured at index {} (dx={dx}, dy={dy})", self.active_index);
                self.gesture = Gesture::Captured;
                self.phase = Phase::Dragging;
                self.tween = None;
                self.pending = None;
            } else {
                trace!("drag passed through (dx={dx}, dy={dy})");
                self.gesture = Gesture::PassThrough;
            }
        }
        if self.gesture != Gesture::Captured {
            return GestureResponse::PassThrough;
        }

        self.rotation = self.drag_rotation(dx, has_next);
        self.immediate = true;
        GestureResponse::Captured
    }

    /// Releases the gesture. Returns the decision when the drag was captured.
    pub fn drag_end(
        &mut self,
        dx: f64,
        velocity: f64,
        has_next: &dyn Fn(i64) -> bool,
        now: Instant,
    ) -> Option<(ReleaseDecision, Option<Commit>)> {
        let gesture = std::mem::take(&mut self.gesture);
        if gesture != Gesture::Captured {
            return None;
        }

        let mut decision = decide_release(dx, velocity, self.width);
        if let ReleaseDecision::Commit(direction) = decision {
            if !self.can_reveal(direction, has_next) {
                debug!("no item {direction:?} of {}, snapping back", self.active_index);
                decision = ReleaseDecision::SnapBack;
            }
        }
        debug!("drag released (dx={dx}, velocity={velocity}): {decision:?}");

        let commit = match decision {
            ReleaseDecision::Commit(direction) => Some(self.commit(direction, now)),
            ReleaseDecision::SnapBack => {
                self.animate_to(self.base_rotation(), now);
                None
            }
        };
        Some((decision, commit))
    }

    /// Commits a step without a gesture. Ignored mid-drag or at a sequence bound.
    pub fn request_step(
        &mut self,
        direction: Direction,
        has_next: &dyn Fn(i64) -> bool,
        now: Instant,
    ) -> Option<Commit> {
        if self.is_dragging() || !self.can_reveal(direction, has_next) {
            return None;
        }
        Some(self.commit(direction, now))
    }

    /// Host re-supplies the active index. Returns false when nothing changed.
    pub fn set_index(&mut self, update: SetIndex, now: Instant) -> bool {
        if update.index == self.active_index {
            trace!("set_index({}) matches the active index", update.index);
            return false;
        }
        self.sample(now);
        debug!(
            "active index {} -> {} (immediate={})",
            self.active_index, update.index, update.immediate
        );
        self.active_index = update.index;
        self.pending = None;

        if self.is_dragging() {
            // the next move re-bases on the new index
            return true;
        }
        let target = self.base_rotation();
        if update.immediate {
            self.tween = None;
            self.rotation = target;
            self.immediate = true;
            self.phase = Phase::Idle;
        } else {
            self.animate_to(target, now);
        }
        true
    }

    /// Advances the transition to `now`. Returns true when it settled.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(tween) = self.tween.as_ref() else {
            return false;
        };
        if !tween.is_finished(now) {
            self.rotation = tween.value_at(now);
            return false;
        }
        self.rotation = tween.to;
        self.tween = None;

        if let Some(pending) = self.pending.take() {
            debug!(
                "commit to {pending} was not confirmed, settling on {}",
                self.active_index
            );
            self.animate_to(self.base_rotation(), now);
            return false;
        }
        trace!("rotation settled at {}", self.rotation);
        self.phase = Phase::Idle;
        true
    }

    fn commit(&mut self, direction: Direction, now: Instant) -> Commit {
        // callers check `can_reveal`, so the step stays in range
        let to = self.active_index.saturating_add(direction.delta());
        debug!("commit {} -> {to}", self.active_index);
        self.pending = Some(to);
        self.animate_to(rotation_for_index(to), now);
        Commit {
            from: self.active_index,
            to,
        }
    }

    fn animate_to(&mut self, target: f64, now: Instant) {
        self.tween = Some(Tween::new(self.rotation, target, now, self.duration, self.easing));
        self.immediate = false;
        self.phase = Phase::Animating;
    }

    fn sample(&mut self, now: Instant) {
        if let Some(tween) = &self.tween {
            self.rotation = tween.value_at(now);
        }
    }

    fn is_eligible(&self, dx: f64, dy: f64, has_next: &dyn Fn(i64) -> bool) -> bool {
        if dx.abs() <= dy.abs() {
            return false;
        }
        match Direction::from_drag(dx) {
            Some(direction) => self.can_reveal(direction, has_next),
            None => false,
        }
    }

    /// Live mapping: a full pane width is one quarter turn, never more than
    /// one face away from rest and never towards a missing item.
    fn drag_rotation(&self, dx: f64, has_next: &dyn Fn(i64) -> bool) -> f64 {
        let base = self.base_rotation();
        let rotation = interpolate(dx, (0.0, self.width), (base, base + QUARTER_TURN));
        let low = if self.can_reveal(Direction::Next, has_next) {
            base - QUARTER_TURN
        } else {
            base
        };
        let high = if self.can_reveal(Direction::Previous, has_next) {
            base + QUARTER_TURN
        } else {
            base
        };
        rotation.clamp(low, high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always(_: i64) -> bool {
        true
    }

    fn never(_: i64) -> bool {
        false
    }

    fn animated(index: i64) -> SetIndex {
        SetIndex::from(index)
    }

    fn settle(controller: &mut Controller, start: Instant) -> Instant {
        let end = start + DEFAULT_TRANSITION * 3;
        controller.tick(start + DEFAULT_TRANSITION);
        controller.tick(end);
        end
    }

    #[test]
    fn release_rule_prefers_flick() {
        assert_eq!(
            decide_release(10.0, 0.2, 200.0),
            ReleaseDecision::Commit(Direction::Previous)
        );
        assert_eq!(
            decide_release(-10.0, -0.2, 200.0),
            ReleaseDecision::Commit(Direction::Next)
        );
        assert_eq!(decide_release(0.0, 0.5, 200.0), ReleaseDecision::SnapBack);
    }

    #[test]
    fn release_rule_uses_half_width() {
        assert_eq!(decide_release(100.0, 0.05, 200.0), ReleaseDecision::SnapBack);
        assert_eq!(
            decide_release(101.0, 0.05, 200.0),
            ReleaseDecision::Commit(Direction::Previous)
        );
        assert_eq!(
            decide_release(-150.0, 0.0, 200.0),
            ReleaseDecision::Commit(Direction::Next)
        );
    }

    #[test]
    fn vertical_drag_passes_through() {
        let mut controller = Controller::new(2, 200.0);
        controller.drag_start();
        assert_eq!(controller.drag_move(5.0, 30.0, &always), GestureResponse::PassThrough);
        // the gesture stays released even once it turns horizontal
        assert_eq!(controller.drag_move(80.0, 30.0, &always), GestureResponse::PassThrough);
        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(controller.drag_end(80.0, 0.0, &always, Instant::now()), None);
    }

    #[test]
    fn drag_towards_missing_items_is_not_captured() {
        let mut controller = Controller::new(0, 200.0);
        controller.drag_start();
        assert_eq!(controller.drag_move(20.0, 0.0, &always), GestureResponse::PassThrough);

        let mut controller = Controller::new(4, 200.0);
        controller.drag_start();
        assert_eq!(controller.drag_move(-20.0, 0.0, &never), GestureResponse::PassThrough);
    }

    #[test]
    fn last_representable_index_has_no_next() {
        let mut controller = Controller::new(i64::MAX, 200.0);
        assert!(!controller.can_reveal(Direction::Next, &always));
        assert_eq!(controller.request_step(Direction::Next, &always, Instant::now()), None);
        controller.drag_start();
        assert_eq!(controller.drag_move(-20.0, 0.0, &always), GestureResponse::PassThrough);
        assert_eq!(controller.rotation(), controller.base_rotation());
    }

    #[test]
    fn disabled_gestures_never_capture() {
        let mut controller = Controller::new(3, 200.0).with_gestures(false);
        controller.drag_start();
        assert_eq!(controller.drag_move(-50.0, 0.0, &always), GestureResponse::PassThrough);
    }

    #[test]
    fn drag_is_clamped_to_one_face() {
        let mut controller = Controller::new(2, 200.0);
        controller.drag_start();
        controller.drag_move(-50.0, 0.0, &always);
        assert_eq!(controller.rotation(), -180.0 - 22.5);
        controller.drag_move(-1000.0, 0.0, &always);
        assert_eq!(controller.rotation(), -270.0);
        controller.drag_move(1000.0, 0.0, &always);
        assert_eq!(controller.rotation(), -90.0);
        assert!(controller.rotation_state().immediate);
    }

    #[test]
    fn drag_back_over_first_item_is_clamped() {
        let mut controller = Controller::new(0, 200.0);
        controller.drag_start();
        controller.drag_move(-40.0, 0.0, &always);
        controller.drag_move(60.0, 0.0, &always);
        assert_eq!(controller.rotation(), 0.0);
    }

    #[test]
    fn commit_waits_for_host() {
        let start = Instant::now();
        let mut controller = Controller::new(1, 200.0);
        controller.drag_start();
        controller.drag_move(-150.0, 0.0, &always);
        let (decision, commit) = controller.drag_end(-150.0, 0.0, &always, start).unwrap();
        assert_eq!(decision, ReleaseDecision::Commit(Direction::Next));
        assert_eq!(commit, Some(Commit { from: 1, to: 2 }));
        assert_eq!(controller.active_index(), 1);
        assert!(controller.is_animating());

        assert!(controller.set_index(animated(2), start + Duration::from_millis(50)));
        assert_eq!(controller.active_index(), 2);
        settle(&mut controller, start);
        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(controller.rotation(), -180.0);
    }

    #[test]
    fn unconfirmed_commit_settles_on_current_index() {
        let start = Instant::now();
        let mut controller = Controller::new(1, 200.0);
        let commit = controller.request_step(Direction::Next, &always, start);
        assert_eq!(commit, Some(Commit { from: 1, to: 2 }));

        assert!(!controller.tick(start + DEFAULT_TRANSITION));
        assert!(controller.is_animating());
        assert!(controller.tick(start + DEFAULT_TRANSITION * 2));
        assert_eq!(controller.rotation(), -90.0);
        assert_eq!(controller.pending_commit(), None);
    }

    #[test]
    fn request_step_respects_bounds() {
        let now = Instant::now();
        let mut controller = Controller::new(0, 200.0);
        assert_eq!(controller.request_step(Direction::Previous, &always, now), None);
        assert_eq!(controller.request_step(Direction::Next, &never, now), None);
        assert!(!controller.is_animating());
    }

    #[test]
    fn same_index_is_ignored() {
        let mut controller = Controller::new(5, 200.0);
        assert!(!controller.set_index(animated(5), Instant::now()));
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn immediate_jump_skips_easing() {
        let mut controller = Controller::new(0, 200.0);
        assert!(controller.set_index(SetIndex::immediate(12), Instant::now()));
        assert_eq!(controller.rotation(), -1080.0);
        assert_eq!(controller.phase(), Phase::Idle);
        assert!(controller.rotation_state().immediate);
    }

    #[test]
    fn new_index_mid_animation_retargets() {
        let start = Instant::now();
        let mut controller = Controller::new(0, 200.0).with_transition(DEFAULT_TRANSITION, Easing::Linear);
        controller.set_index(animated(1), start);
        let half = start + DEFAULT_TRANSITION / 2;
        controller.tick(half);
        assert!((controller.rotation() + 45.0).abs() < 1e-6);

        controller.set_index(animated(2), half);
        // retargeting starts from where the old transition was
        assert!((controller.rotation() + 45.0).abs() < 1e-6);
        controller.tick(half + DEFAULT_TRANSITION);
        assert_eq!(controller.rotation(), -180.0);
        assert_eq!(controller.phase(), Phase::Idle);
    }
}
