//! Cube handle: ties the index window and the rotation controller together
//! and turns them into four pane descriptors per frame.

use std::time::{Duration, Instant};

use log::debug;

use crate::controller::{Commit, Controller, GestureResponse, ReleaseDecision, DEFAULT_TRANSITION};
use crate::error::{CubeError, Result};
use crate::math::{scale_for_rotation, Easing};
use crate::state::{Direction, Face, Phase, RotationState, SetIndex};
use crate::window::IndexWindow;

/// Renders the content of one logical index: `(index, is_active, rotation)`.
/// Returning `None` leaves the pane empty.
pub type RenderItem<C> = Box<dyn FnMut(i64, bool, f64) -> Option<C>>;

/// Whether an item follows the given index
pub type HasNext = Box<dyn Fn(i64) -> bool>;

/// Receives the index the host is asked to switch to
pub type IndexChange = Box<dyn FnMut(i64)>;

/// Host resource held while the cube moves, e.g. page scrolling.
pub trait ScrollLock {
    fn lock(&mut self);
    fn unlock(&mut self);
}

/// Static configuration of a cube
#[derive(Debug, Clone, PartialEq)]
pub struct CubeConfig {
    pub initial_index: i64,
    /// Pane width; a drag across it turns the cube by one face
    pub width: f64,
    pub height: f64,
    pub perspective: f64,
    /// Scale with a face square-on, and half way between two faces
    pub scale_range: (f64, f64),
    pub lock_scrolling: bool,
    pub enable_gestures: bool,
    pub transition: Duration,
    pub easing: Easing,
}

impl Default for CubeConfig {
    fn default() -> Self {
        CubeConfig {
            initial_index: 0,
            width: 200.0,
            height: 500.0,
            perspective: 600.0,
            scale_range: (1.0, 0.95),
            lock_scrolling: true,
            enable_gestures: true,
            transition: DEFAULT_TRANSITION,
            easing: Easing::default(),
        }
    }
}

impl CubeConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("width", self.width),
            ("height", self.height),
            ("perspective", self.perspective),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CubeError::InvalidDimension { name, value });
            }
        }
        let (rest, turning) = self.scale_range;
        if !(rest.is_finite() && turning.is_finite() && rest > 0.0 && turning > 0.0) {
            return Err(CubeError::InvalidScaleRange(rest, turning));
        }
        Ok(())
    }
}

/// One of the four rendered faces
#[derive(Debug, Clone, PartialEq)]
pub struct Pane<C> {
    pub face: Face,
    /// Logical index on this face, `None` when the face is empty
    pub index: Option<i64>,
    pub active: bool,
    pub content: Option<C>,
}

/// Visual state handed to the rendering layer
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<C> {
    pub panes: [Pane<C>; 4],
    pub rotation: f64,
    pub scale: f64,
    pub phase: Phase,
}

pub struct Cube<C> {
    config: CubeConfig,
    controller: Controller,
    window: IndexWindow,
    render_item: RenderItem<C>,
    has_next: HasNext,
    on_index_change: Option<IndexChange>,
    commits: Vec<Commit>,
    scroll_lock: Option<Box<dyn ScrollLock>>,
    scroll_locked: bool,
}

impl<C> Cube<C> {
    pub fn new<F>(config: CubeConfig, render_item: F) -> Result<Self>
    where
        F: FnMut(i64, bool, f64) -> Option<C> + 'static,
    {
        config.validate()?;
        let controller = Controller::new(config.initial_index, config.width)
            .with_transition(config.transition, config.easing)
            .with_gestures(config.enable_gestures);
        Ok(Cube {
            window: IndexWindow::seed(config.initial_index),
            controller,
            config,
            render_item: Box::new(render_item),
            has_next: Box::new(|_| true),
            on_index_change: None,
            commits: Vec::new(),
            scroll_lock: None,
            scroll_locked: false,
        })
    }

    pub fn with_has_next<F>(mut self, has_next: F) -> Self
    where
        F: Fn(i64) -> bool + 'static,
    {
        self.has_next = Box::new(has_next);
        self
    }

    pub fn on_index_change<F>(mut self, callback: F) -> Self
    where
        F: FnMut(i64) + 'static,
    {
        self.on_index_change = Some(Box::new(callback));
        self
    }

    pub fn with_scroll_lock<L>(mut self, lock: L) -> Self
    where
        L: ScrollLock + 'static,
    {
        self.scroll_lock = Some(Box::new(lock));
        self
    }

    pub fn config(&self) -> &CubeConfig {
        &self.config
    }

    pub fn index(&self) -> i64 {
        self.controller.active_index()
    }

    pub fn window(&self) -> IndexWindow {
        self.window
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    pub fn rotation(&self) -> RotationState {
        self.controller.rotation_state()
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    /// Commits emitted since the last call, oldest first
    pub fn take_commits(&mut self) -> Vec<Commit> {
        std::mem::take(&mut self.commits)
    }

    pub fn set_index(&mut self, update: impl Into<SetIndex>) {
        self.set_index_at(update, Instant::now());
    }

    pub fn set_index_at(&mut self, update: impl Into<SetIndex>, now: Instant) {
        let update = update.into();
        let previous = self.controller.active_index();
        if self.controller.set_index(update, now) {
            self.window = self.window.transition(previous, update.index);
        }
        self.sync_scroll_lock();
    }

    pub fn drag_start(&mut self) {
        self.controller.drag_start();
    }

    pub fn drag_move(&mut self, dx: f64, dy: f64) -> GestureResponse {
        let response = self.controller.drag_move(dx, dy, &*self.has_next);
        self.sync_scroll_lock();
        response
    }

    pub fn drag_end(&mut self, dx: f64, velocity: f64) -> Option<ReleaseDecision> {
        self.drag_end_at(dx, velocity, Instant::now())
    }

    pub fn drag_end_at(&mut self, dx: f64, velocity: f64, now: Instant) -> Option<ReleaseDecision> {
        let (decision, commit) = self.controller.drag_end(dx, velocity, &*self.has_next, now)?;
        if let Some(commit) = commit {
            self.emit(commit);
        }
        self.sync_scroll_lock();
        Some(decision)
    }

    /// Asks the host to show the next item, as if the cube was swiped.
    pub fn request_next(&mut self) -> bool {
        self.request_step_at(Direction::Next, Instant::now())
    }

    /// Asks the host to show the previous item.
    pub fn request_previous(&mut self) -> bool {
        self.request_step_at(Direction::Previous, Instant::now())
    }

    pub fn request_step_at(&mut self, direction: Direction, now: Instant) -> bool {
        let commit = self.controller.request_step(direction, &*self.has_next, now);
        let committed = commit.is_some();
        if let Some(commit) = commit {
            self.emit(commit);
        }
        self.sync_scroll_lock();
        committed
    }

    pub fn on_frame(&mut self) -> Frame<C> {
        self.on_frame_at(Instant::now())
    }

    /// Advances the transition to `now` and renders the four panes.
    pub fn on_frame_at(&mut self, now: Instant) -> Frame<C> {
        self.controller.tick(now);
        self.sync_scroll_lock();

        let rotation = self.controller.rotation();
        let active_index = self.index();
        let active_face = IndexWindow::face_of(active_index);
        let settled = !self.controller.is_animating();
        let window = self.window;
        let has_next = &self.has_next;
        let render_item = &mut self.render_item;
        let panes = Face::ALL.map(|face| {
            let index = window.slot(face).filter(|index| in_sequence(*index, has_next));
            let active = settled && face == active_face && index == Some(active_index);
            let content = index.and_then(|index| render_item(index, active, rotation));
            Pane {
                face,
                index,
                active,
                content,
            }
        });

        Frame {
            panes,
            rotation,
            scale: scale_for_rotation(rotation, self.config.scale_range),
            phase: self.controller.phase(),
        }
    }

    fn emit(&mut self, commit: Commit) {
        self.commits.push(commit);
        if let Some(callback) = self.on_index_change.as_mut() {
            callback(commit.to);
        }
    }

    fn sync_scroll_lock(&mut self) {
        let moving = self.controller.is_dragging() || self.controller.is_animating();
        let wanted = self.config.lock_scrolling && moving;
        if wanted == self.scroll_locked {
            return;
        }
        if let Some(lock) = self.scroll_lock.as_mut() {
            if wanted {
                lock.lock();
            } else {
                lock.unlock();
            }
        }
        debug!("scroll lock {}", if wanted { "acquired" } else { "released" });
        self.scroll_locked = wanted;
    }
}

/// Indices before the start or past the host's last item render empty.
fn in_sequence(index: i64, has_next: &HasNext) -> bool {
    index == 0 || (index > 0 && has_next(index - 1))
}

impl<C> Drop for Cube<C> {
    fn drop(&mut self) {
        if self.scroll_locked {
            if let Some(lock) = self.scroll_lock.as_mut() {
                lock.unlock();
            }
            debug!("scroll lock released on teardown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct RecordingLock(Rc<RefCell<Vec<&'static str>>>);

    impl ScrollLock for RecordingLock {
        fn lock(&mut self) {
            self.0.borrow_mut().push("lock");
        }

        fn unlock(&mut self) {
            self.0.borrow_mut().push("unlock");
        }
    }

    fn label_cube(config: CubeConfig) -> Cube<String> {
        Cube::new(config, |index, _, _| Some(format!("item {index}"))).unwrap()
    }

    #[test]
    fn invalid_dimensions_are_rejected() {
        let config = CubeConfig {
            width: 0.0,
            ..CubeConfig::default()
        };
        let err = Cube::<()>::new(config, |_, _, _| None).err();
        assert_eq!(
            err,
            Some(CubeError::InvalidDimension {
                name: "width",
                value: 0.0
            })
        );

        let config = CubeConfig {
            scale_range: (1.0, f64::NAN),
            ..CubeConfig::default()
        };
        assert!(matches!(config.validate(), Err(CubeError::InvalidScaleRange(..))));
    }

    #[test]
    fn empty_faces_are_not_rendered() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = calls.clone();
        let mut cube = Cube::new(CubeConfig::default(), move |index, _, _| {
            seen.borrow_mut().push(index);
            Some(index)
        })
        .unwrap()
        .with_has_next(|index| index < 1);

        let frame = cube.on_frame_at(Instant::now());
        // items 0 and 1 exist, 2 is past the end and -1 before the start
        assert_eq!(*calls.borrow(), vec![0, 1]);
        assert_eq!(frame.panes[2].index, None);
        assert_eq!(frame.panes[3].index, None);
        assert_eq!(frame.panes[0].content, Some(0));
    }

    #[test]
    fn active_pane_waits_for_rotation_to_settle() {
        let start = Instant::now();
        let mut cube = label_cube(CubeConfig::default());
        let frame = cube.on_frame_at(start);
        assert!(frame.panes[0].active);

        assert!(cube.request_step_at(Direction::Next, start));
        cube.set_index_at(1_i64, start);
        let frame = cube.on_frame_at(start + Duration::from_millis(100));
        assert!(frame.panes.iter().all(|pane| !pane.active));

        let frame = cube.on_frame_at(start + Duration::from_secs(1));
        assert_eq!(frame.phase, Phase::Idle);
        assert!(frame.panes[1].active);
        assert_eq!(frame.rotation, -90.0);
        assert_eq!(frame.scale, 1.0);
    }

    #[test]
    fn commits_reach_callback_and_queue() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = received.clone();
        let mut cube = label_cube(CubeConfig {
            initial_index: 4,
            ..CubeConfig::default()
        })
        .on_index_change(move |index| sink.borrow_mut().push(index));

        cube.drag_start();
        assert_eq!(cube.drag_move(30.0, 2.0), GestureResponse::Captured);
        let decision = cube.drag_end_at(30.0, 0.5, Instant::now());
        assert_eq!(decision, Some(ReleaseDecision::Commit(Direction::Previous)));

        assert_eq!(*received.borrow(), vec![3]);
        assert_eq!(cube.take_commits(), vec![Commit { from: 4, to: 3 }]);
        assert!(cube.take_commits().is_empty());
        assert_eq!(cube.index(), 4);
    }

    #[test]
    fn scroll_lock_is_scoped_to_motion() {
        let lock = RecordingLock::default();
        let log = lock.0.clone();
        let start = Instant::now();
        let mut cube = label_cube(CubeConfig::default()).with_scroll_lock(lock);

        cube.drag_start();
        cube.drag_move(-20.0, 0.0);
        assert!(cube.is_scroll_locked());
        cube.drag_end_at(-20.0, 0.0, start);
        assert!(cube.is_scroll_locked());
        cube.on_frame_at(start + Duration::from_secs(1));
        assert!(!cube.is_scroll_locked());
        assert_eq!(*log.borrow(), vec!["lock", "unlock"]);
    }

    #[test]
    fn teardown_releases_scroll_lock() {
        let lock = RecordingLock::default();
        let log = lock.0.clone();
        let mut cube = label_cube(CubeConfig::default()).with_scroll_lock(lock);
        cube.set_index_at(1_i64, Instant::now());
        assert!(cube.is_scroll_locked());
        drop(cube);
        assert_eq!(*log.borrow(), vec!["lock", "unlock"]);
    }

    #[test]
    fn scroll_lock_can_be_disabled() {
        let lock = RecordingLock::default();
        let log = lock.0.clone();
        let mut cube = label_cube(CubeConfig {
            lock_scrolling: false,
            ..CubeConfig::default()
        })
        .with_scroll_lock(lock);
        cube.set_index_at(1_i64, Instant::now());
        assert!(!cube.is_scroll_locked());
        assert!(log.borrow().is_empty());
    }
}
