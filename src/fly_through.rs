use mv_engine::control::controller::Controller;
use mv_engine::control::{Direction, Input};

/// A controller that replays a fixed camera path instead of reading devices.
///
/// The path walks forward, turns right while looking up, zooms in, and walks
/// back, each leg taking a quarter of the frames.
#[derive(Debug, Clone)]
pub struct FlyThrough {
    frame: u32,
    frames: u32,
}

impl FlyThrough {
    pub const fn new(frames: u32) -> Self {
        Self { frame: 0, frames }
    }
}

impl Controller for FlyThrough {
    fn handle_event(&mut self, _event: &winit::event::Event<()>) {}

    fn fetch_input(&mut self) -> Vec<Input> {
        let leg = self.frames.div_ceil(4).max(1);
        let inputs = match self.frame / leg {
            0 => vec![Input::Move(Direction::Forward)],
            1 => vec![Input::Look {
                x_offset: 8.0,
                y_offset: 2.0,
            }],
            2 => vec![Input::Scroll(1.0)],
            3 => vec![Input::Move(Direction::Backward)],
            _ => Vec::new(),
        };
        self.frame += 1;
        inputs
    }
}
