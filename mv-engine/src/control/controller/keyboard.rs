use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::super::{Direction, Input};

#[derive(Copy, Clone, Debug, Default)]
/// Represents the held movement keys of a keyboard.
pub struct Keyboard(u8);

impl Keyboard {
    const FORWARD: u8 = 1 << 0;
    const LEFT: u8 = 1 << 1;
    const RIGHT: u8 = 1 << 2;
    const BACKWARD: u8 = 1 << 3;

    const fn mask(direction: Direction) -> u8 {
        match direction {
            Direction::Forward => Self::FORWARD,
            Direction::Backward => Self::BACKWARD,
            Direction::Left => Self::LEFT,
            Direction::Right => Self::RIGHT,
        }
    }

    /// Maps a physical key to a movement, using the WASD layout.
    #[must_use]
    pub const fn binding(key: KeyCode) -> Option<Direction> {
        match key {
            KeyCode::KeyW => Some(Direction::Forward),
            KeyCode::KeyS => Some(Direction::Backward),
            KeyCode::KeyA => Some(Direction::Left),
            KeyCode::KeyD => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn set_pressed(&mut self, direction: Direction, pressed: bool) {
        let mask = Self::mask(direction);
        self.0 = self.0 & !mask | (mask * u8::from(pressed));
    }

    #[must_use]
    pub const fn is_pressed(self, direction: Direction) -> bool {
        self.0 & Self::mask(direction) != 0
    }

    /// Releases every key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.0 = 0;
    }
}

impl super::Controller for Keyboard {
    fn handle_event(&mut self, event: &Event<()>) {
        let Event::WindowEvent { event, .. } = event else {
            return;
        };
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => {
                if let Some(direction) = Self::binding(*key) {
                    self.set_pressed(direction, *state == ElementState::Pressed);
                }
            }
            WindowEvent::Focused(false) => self.release_all(),
            _ => {}
        }
    }

    fn fetch_input(&mut self) -> Vec<Input> {
        [
            Direction::Forward,
            Direction::Backward,
            Direction::Left,
            Direction::Right,
        ]
        .into_iter()
        .filter(|direction| self.is_pressed(*direction))
        .map(Input::Move)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::Controller;
    use super::*;

    #[test]
    fn test_held_keys_repeat_every_frame() {
        let mut keyboard = Keyboard::default();
        keyboard.set_pressed(Direction::Forward, true);
        keyboard.set_pressed(Direction::Left, true);

        let expected = vec![Input::Move(Direction::Forward), Input::Move(Direction::Left)];
        assert_eq!(keyboard.fetch_input(), expected);
        assert_eq!(keyboard.fetch_input(), expected);

        keyboard.set_pressed(Direction::Forward, false);
        assert_eq!(keyboard.fetch_input(), vec![Input::Move(Direction::Left)]);
    }

    #[test]
    fn test_release_all() {
        let mut keyboard = Keyboard::default();
        keyboard.set_pressed(Direction::Right, true);
        keyboard.set_pressed(Direction::Backward, true);
        keyboard.release_all();
        assert!(keyboard.fetch_input().is_empty());
    }

    #[test]
    fn test_wasd_bindings() {
        assert_eq!(Keyboard::binding(KeyCode::KeyW), Some(Direction::Forward));
        assert_eq!(Keyboard::binding(KeyCode::KeyA), Some(Direction::Left));
        assert_eq!(Keyboard::binding(KeyCode::KeyS), Some(Direction::Backward));
        assert_eq!(Keyboard::binding(KeyCode::KeyD), Some(Direction::Right));
        assert_eq!(Keyboard::binding(KeyCode::Space), None);
    }
}
