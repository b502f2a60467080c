use std::time::Instant;

use super::camera::Camera;
use super::controller::{keyboard::Keyboard, mouse::Mouse, scroll::Scroll, Controller};
use super::Input;

/// Everything the driver tracks between frames to steer a camera.
///
/// The driver owns it, forwards every window event to [`InputState::handle_event`]
/// and calls [`InputState::update`] once per frame.
pub struct InputState {
    controllers: Vec<Box<dyn Controller>>,
    last_frame: Option<Instant>,
}

impl InputState {
    #[must_use]
    pub fn new(controllers: Vec<Box<dyn Controller>>) -> Self {
        Self {
            controllers,
            last_frame: None,
        }
    }

    pub fn handle_event(&mut self, event: &winit::event::Event<()>) {
        for controller in &mut self.controllers {
            controller.handle_event(event);
        }
    }

    /// Drains the inputs gathered by every controller since the last frame.
    pub fn fetch_inputs(&mut self) -> Vec<Input> {
        self.controllers
            .iter_mut()
            .flat_map(|controller| controller.fetch_input())
            .collect()
    }

    /// Applies the gathered inputs to `camera`, scaled by the time elapsed
    /// since the previous call. Returns that duration in seconds.
    ///
    /// The first call has no previous frame and moves by nothing.
    pub fn update(&mut self, camera: &mut dyn Camera) -> f32 {
        let now = Instant::now();
        let delta_seconds = self
            .last_frame
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last_frame = Some(now);

        self.update_with_delta(camera, delta_seconds);
        delta_seconds
    }

    /// Same as [`InputState::update`] with an externally measured frame time.
    pub fn update_with_delta(&mut self, camera: &mut dyn Camera, delta_seconds: f32) {
        let inputs = self.fetch_inputs();
        if !inputs.is_empty() {
            tracing::trace!("Applying {} inputs over {delta_seconds:.4}s", inputs.len());
        }
        camera.process_inputs(&inputs, delta_seconds);
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(vec![
            Box::new(Keyboard::default()),
            Box::new(Mouse::default()),
            Box::new(Scroll::default()),
        ])
    }
}
