use winit::event::{Event, WindowEvent};

use super::super::Input;

#[derive(Copy, Clone, Debug, Default)]
/// Represents the state of a mouse cursor.
///
/// Offsets are measured between consecutive cursor positions. The first
/// position seen after creation, or after the window regains focus, only
/// seeds the tracker so the camera does not jump towards wherever the cursor
/// entered the window.
pub struct Mouse {
    last_position: Option<(f64, f64)>,
    x_offset: f32,
    y_offset: f32,
}

impl Mouse {
    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        if let Some((last_x, last_y)) = self.last_position {
            #[allow(clippy::cast_possible_truncation)]
            {
                self.x_offset += (x - last_x) as f32;
                // Window coordinates grow downwards.
                self.y_offset += (last_y - y) as f32;
            }
        }
        self.last_position = Some((x, y));
    }

    /// Forgets the last cursor position so the next sample is not turned into an offset.
    pub fn reset(&mut self) {
        self.last_position = None;
    }
}

impl super::Controller for Mouse {
    fn handle_event(&mut self, event: &Event<()>) {
        let Event::WindowEvent { event, .. } = event else {
            return;
        };
        match event {
            WindowEvent::CursorMoved { position, .. } => self.cursor_moved(position.x, position.y),
            WindowEvent::CursorLeft { .. } | WindowEvent::Focused(_) => self.reset(),
            _ => {}
        }
    }

    fn fetch_input(&mut self) -> Vec<Input> {
        let x_offset = core::mem::take(&mut self.x_offset);
        let y_offset = core::mem::take(&mut self.y_offset);

        if x_offset == 0.0 && y_offset == 0.0 {
            Vec::new()
        } else {
            vec![Input::Look { x_offset, y_offset }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Controller;
    use super::*;

    #[test]
    fn test_first_sample_is_suppressed() {
        let mut mouse = Mouse::default();
        mouse.cursor_moved(400.0, 300.0);
        assert!(mouse.fetch_input().is_empty());

        mouse.cursor_moved(410.0, 295.0);
        assert_eq!(
            mouse.fetch_input(),
            vec![Input::Look {
                x_offset: 10.0,
                y_offset: 5.0
            }]
        );
    }

    #[test]
    fn test_offsets_accumulate_until_fetched() {
        let mut mouse = Mouse::default();
        mouse.cursor_moved(0.0, 0.0);
        mouse.cursor_moved(3.0, 1.0);
        mouse.cursor_moved(5.0, 4.0);
        assert_eq!(
            mouse.fetch_input(),
            vec![Input::Look {
                x_offset: 5.0,
                y_offset: -4.0
            }]
        );
        assert!(mouse.fetch_input().is_empty());
    }

    #[test]
    fn test_reset_suppresses_the_jump() {
        let mut mouse = Mouse::default();
        mouse.cursor_moved(10.0, 10.0);
        mouse.reset();
        mouse.cursor_moved(900.0, 700.0);
        assert!(mouse.fetch_input().is_empty());
    }
}
