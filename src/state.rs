use crate::math::QUARTER_TURN;

/// Physical face of the cube around its vertical axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Front,
    Right,
    Back,
    Left,
}

impl Face {
    /// All faces in slot order
    pub const ALL: [Face; 4] = [Face::Front, Face::Right, Face::Back, Face::Left];

    /// Face occupying a slot (0..4)
    pub fn from_slot(slot: usize) -> Face {
        Face::ALL[slot % Face::ALL.len()]
    }

    /// Slot of this face
    pub fn slot(self) -> usize {
        match self {
            Face::Front => 0,
            Face::Right => 1,
            Face::Back => 2,
            Face::Left => 3,
        }
    }

    /// Fixed rotation of the face relative to the cube, in degrees
    pub fn offset(self) -> f64 {
        match self {
            Face::Front => 0.0,
            Face::Right => QUARTER_TURN,
            Face::Back => 2.0 * QUARTER_TURN,
            Face::Left => -QUARTER_TURN,
        }
    }
}

/// Phase of the gesture/rotation state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Dragging,
    Animating,
}

/// Rotation of the cube around the vertical axis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationState {
    /// Current rotation angle in degrees
    pub degrees: f64,
    /// An eased transition is in flight
    pub animating: bool,
    /// The last update was applied without easing
    pub immediate: bool,
}

/// Index update supplied by the owner of the active index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetIndex {
    pub index: i64,
    /// Jump without easing, e.g. when deep linking
    pub immediate: bool,
}

impl SetIndex {
    /// Non-animated jump to `index`
    pub fn immediate(index: i64) -> Self {
        SetIndex {
            index,
            immediate: true,
        }
    }
}

impl From<i64> for SetIndex {
    fn from(index: i64) -> Self {
        SetIndex {
            index,
            immediate: false,
        }
    }
}

/// Direction of a one-step change of the active index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards higher indices; revealed by dragging left
    Next,
    /// Towards lower indices; revealed by dragging right
    Previous,
}

impl Direction {
    /// Change applied to the active index
    pub fn delta(self) -> i64 {
        match self {
            Direction::Next => 1,
            Direction::Previous => -1,
        }
    }

    /// Direction a horizontal drag reveals, if any
    pub fn from_drag(dx: f64) -> Option<Direction> {
        if dx < 0.0 {
            Some(Direction::Next)
        } else if dx > 0.0 {
            Some(Direction::Previous)
        } else {
            None
        }
    }
}
