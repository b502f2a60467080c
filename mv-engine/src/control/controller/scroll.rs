use winit::event::{Event, MouseScrollDelta, WindowEvent};

use super::super::Input;

#[derive(Copy, Clone, Debug, Default)]
/// Represents the state of a scroll wheel or touchpad.
pub struct Scroll(f32);

impl Scroll {
    /// Pixels of touchpad scrolling worth one wheel notch.
    pub const PIXELS_PER_LINE: f64 = 40.0;

    pub fn scrolled(&mut self, delta: MouseScrollDelta) {
        #[allow(clippy::cast_possible_truncation)]
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(position) => (position.y / Self::PIXELS_PER_LINE) as f32,
        };
        self.0 += lines;
    }
}

impl super::Controller for Scroll {
    fn handle_event(&mut self, event: &Event<()>) {
        if let Event::WindowEvent {
            event: WindowEvent::MouseWheel { delta, .. },
            ..
        } = event
        {
            self.scrolled(*delta);
        }
    }

    fn fetch_input(&mut self) -> Vec<Input> {
        let y_offset = core::mem::take(&mut self.0);
        if y_offset == 0.0 {
            Vec::new()
        } else {
            vec![Input::Scroll(y_offset)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Controller;
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn test_line_and_pixel_deltas() {
        let mut scroll = Scroll::default();
        scroll.scrolled(MouseScrollDelta::LineDelta(0.0, 2.0));
        scroll.scrolled(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -20.0)));
        assert_eq!(scroll.fetch_input(), vec![Input::Scroll(1.5)]);
        assert!(scroll.fetch_input().is_empty());
    }
}
