//! Infinite story-style carousel on the four side faces of a rotating cube.
//!
//! [`window::IndexWindow`] decides which logical items sit on the faces,
//! [`controller::Controller`] turns drags into rotation and commits, and
//! [`cube::Cube`] combines both into per-frame pane descriptors.

pub mod controller;
pub mod cube;
pub mod error;
pub mod math;
pub mod state;
pub mod window;

pub use controller::{Commit, GestureResponse, ReleaseDecision};
pub use cube::{Cube, CubeConfig, Frame, Pane, ScrollLock};
pub use error::CubeError;
pub use state::{Direction, Face, Phase, RotationState, SetIndex};
pub use window::IndexWindow;
