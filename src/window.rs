//! Windowed index allocator.
//!
//! Maps an unbounded sequence of logical indices onto the four faces of the
//! cube. Every transition takes the window by value and returns a new one;
//! a single step rewrites at most one slot.

use crate::math::face_for_index;
use crate::state::Face;

/// Logical index assigned to each face; `None` marks an empty face.
///
/// Slots are ordered by face (`Face::slot`), so a populated slot always holds
/// an index congruent to its face modulo 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexWindow {
    slots: [Option<i64>; 4],
}

impl IndexWindow {
    /// Builds the initial window around `active`: one index behind, two ahead.
    ///
    /// Indices below zero stay empty.
    pub fn seed(active: i64) -> Self {
        let mut slots = [None; 4];
        for index in active.saturating_sub(1)..=active.saturating_add(2) {
            if index >= 0 {
                slots[face_for_index(index)] = Some(index);
            }
        }
        IndexWindow { slots }
    }

    /// Moves the window from `previous` to `next`.
    ///
    /// Single steps recycle one slot, any other jump re-seeds the window.
    pub fn transition(self, previous: i64, next: i64) -> Self {
        match next.checked_sub(previous) {
            Some(0) => self,
            Some(1) => self.advance(next),
            Some(-1) => self.retreat(next),
            _ => IndexWindow::seed(next),
        }
    }

    /// Forward step onto `active`: the trailing slot becomes the new
    /// look-ahead `active + 2`.
    ///
    /// The recycled slot is the face of the look-ahead, which in a populated
    /// window is the one holding the minimum (empty slots order first).
    /// Look-ahead indices before the start stay empty, so a walk back from
    /// below zero refills the window one face per step.
    pub fn advance(self, active: i64) -> Self {
        // wrapping keeps the residue modulo 4
        let slot = face_for_index(active.wrapping_add(2));
        let mut slots = self.slots;
        slots[slot] = active.checked_add(2).filter(|index| *index >= 0);
        IndexWindow { slots }
    }

    /// Backward step onto `active`: the leading slot becomes the new
    /// trailing index `active - 1`, or empty once the sequence start is
    /// passed.
    pub fn retreat(self, active: i64) -> Self {
        let slot = face_for_index(active.wrapping_sub(1));
        let mut slots = self.slots;
        slots[slot] = active.checked_sub(1).filter(|index| *index >= 0);
        IndexWindow { slots }
    }

    /// Logical index shown on `face`
    pub fn slot(&self, face: Face) -> Option<i64> {
        self.slots[face.slot()]
    }

    /// Raw slots in face order
    pub fn slots(&self) -> [Option<i64>; 4] {
        self.slots
    }

    /// Face that shows `index`
    pub fn face_of(index: i64) -> Face {
        Face::from_slot(face_for_index(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(a: IndexWindow, b: IndexWindow) -> usize {
        a.slots()
            .iter()
            .zip(b.slots().iter())
            .filter(|(x, y)| x != y)
            .count()
    }

    #[test]
    fn seed_at_start_leaves_previous_face_empty() {
        let window = IndexWindow::seed(0);
        assert_eq!(window.slots(), [Some(0), Some(1), Some(2), None]);
    }

    #[test]
    fn seed_mid_sequence_fills_look_ahead() {
        let window = IndexWindow::seed(3);
        assert_eq!(window.slot(Face::Left), Some(3));
        assert_eq!(window.slot(Face::Back), Some(2));
        assert_eq!(window.slot(Face::Front), Some(4));
        assert_eq!(window.slot(Face::Right), Some(5));
    }

    #[test]
    fn advance_recycles_minimum() {
        let window = IndexWindow::seed(3);
        let next = window.advance(4);
        assert_eq!(changed(window, next), 1);
        assert_eq!(next.slot(Face::Back), Some(6));
    }

    #[test]
    fn advance_from_start_fills_empty_face() {
        let window = IndexWindow::seed(0).advance(1);
        assert_eq!(window.slots(), [Some(0), Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn retreat_recycles_maximum() {
        let window = IndexWindow::seed(5);
        let prev = window.retreat(4);
        assert_eq!(changed(window, prev), 1);
        assert_eq!(prev.slot(Face::Left), Some(3));
        assert_eq!(prev.slot(Face::Front), Some(4));
        assert_eq!(prev.slot(Face::Right), Some(5));
    }

    #[test]
    fn retreat_past_start_empties_slot() {
        let window = IndexWindow::seed(1);
        assert_eq!(window.slots(), [Some(0), Some(1), Some(2), Some(3)]);
        let prev = window.retreat(0);
        assert_eq!(prev.slots(), [Some(0), Some(1), Some(2), None]);
        assert!(prev.slots().iter().flatten().all(|index| *index >= 0));
    }

    #[test]
    fn walk_keeps_active_on_its_face() {
        let mut window = IndexWindow::seed(0);
        let mut active = 0;
        let moves = [1, 1, 1, 1, 1, -1, -1, 1, -1, -1, -1, -1, 1, 1];
        for delta in moves {
            let next = window.transition(active, active + delta);
            assert_eq!(changed(window, next), 1, "step {active} -> {}", active + delta);
            active += delta;
            window = next;
            assert_eq!(window.slot(IndexWindow::face_of(active)), Some(active));
        }
    }

    #[test]
    fn walk_below_start_and_back_matches_seed() {
        let mut window = IndexWindow::seed(0);
        let mut active = 0;
        let moves = [-1, -1, -1, -1, 1, 1, 1, 1, 1, 1, 1];
        for delta in moves {
            window = window.transition(active, active + delta);
            active += delta;
            assert_eq!(window, IndexWindow::seed(active), "at {active}");
        }
        assert_eq!(window.slot(IndexWindow::face_of(active)), Some(active));
    }

    #[test]
    fn empty_window_refills_when_stepping_forward() {
        let window = IndexWindow::seed(-3);
        assert_eq!(window.slots(), [None; 4]);
        let next = window.advance(-2);
        assert_eq!(changed(window, next), 1);
        assert_eq!(next.slot(Face::Front), Some(0));
    }

    #[test]
    fn step_to_last_index_does_not_overflow() {
        let window = IndexWindow::seed(i64::MAX - 1).transition(i64::MAX - 1, i64::MAX);
        assert_eq!(window, IndexWindow::seed(i64::MAX));
        assert_eq!(window.slot(IndexWindow::face_of(i64::MAX)), Some(i64::MAX));
    }

    #[test]
    fn same_index_is_noop() {
        let window = IndexWindow::seed(7);
        assert_eq!(window.transition(7, 7), window);
    }

    #[test]
    fn jump_reseeds() {
        let window = IndexWindow::seed(0).transition(0, 10);
        assert_eq!(window, IndexWindow::seed(10));
    }
}
