pub mod camera;
pub mod controller;

mod input_state;

pub use input_state::InputState;

/// Planar movement relative to where the camera is looking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

/// A navigation intent, produced by controllers and consumed by cameras.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    /// One frame worth of movement in the given direction.
    Move(Direction),
    /// Cursor offset in pixels since the previous sample, y pointing up.
    Look { x_offset: f32, y_offset: f32 },
    /// Scroll wheel offset, positive when scrolling away from the user.
    Scroll(f32),
}
