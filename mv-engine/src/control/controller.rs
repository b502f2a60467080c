//! Input sources for the camera.
//!
//! Each controller watches the window events it cares about, accumulates them
//! into its own state, and hands that state over as [`Input`](super::Input)s
//! once per frame. Register controllers with an
//! [`InputState`](super::InputState).

pub mod keyboard;
pub mod mouse;
pub mod scroll;

pub trait Controller {
    /// Updates the controller from a window event. Events it does not care
    /// about are ignored.
    fn handle_event(&mut self, event: &winit::event::Event<()>);

    /// Drains what happened since the previous frame.
    #[must_use]
    fn fetch_input(&mut self) -> Vec<super::Input>;
}
