use glam::Vec3;

use super::super::{Direction, Input};
use super::CameraConfig;

#[derive(Copy, Clone, Debug)]
/// Represents a first person camera driven by Euler angles.
pub struct FirstPerson {
    position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    movement_speed: f32,
    mouse_sensitivity: f32,
    zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
    constrain_pitch: bool,
}

impl FirstPerson {
    #[must_use]
    pub fn new(config: CameraConfig) -> Self {
        let (min_zoom, max_zoom) = if config.min_zoom <= config.max_zoom {
            (config.min_zoom, config.max_zoom)
        } else {
            tracing::warn!(
                "Zoom range [{}, {}] is reversed, swapping bounds",
                config.min_zoom,
                config.max_zoom
            );
            (config.max_zoom, config.min_zoom)
        };

        let mut camera = Self {
            position: config.position,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: config.world_up.normalize_or(Vec3::Y),
            yaw: config.yaw,
            pitch: config.pitch,
            movement_speed: config.movement_speed,
            mouse_sensitivity: config.mouse_sensitivity,
            zoom: config.zoom.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
            constrain_pitch: config.constrain_pitch,
        };
        if camera.constrain_pitch {
            camera.clamp_pitch();
        }
        camera.update_vectors();
        camera
    }

    #[must_use]
    pub fn with_position(position: Vec3) -> Self {
        Self::new(CameraConfig::default().with_position(position))
    }

    #[must_use]
    pub const fn yaw(&self) -> f32 {
        self.yaw
    }

    #[must_use]
    pub const fn pitch(&self) -> f32 {
        self.pitch
    }

    #[must_use]
    pub const fn zoom_range(&self) -> (f32, f32) {
        (self.min_zoom, self.max_zoom)
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.mouse_sensitivity = sensitivity;
    }

    pub fn set_movement_speed(&mut self, speed: f32) {
        self.movement_speed = speed;
    }

    /// Moves the camera along its front or right vector.
    ///
    /// `delta_seconds` is the duration of the frame and is expected to be
    /// non-negative.
    pub fn process_movement(&mut self, direction: Direction, delta_seconds: f32) {
        let velocity = self.movement_speed * delta_seconds;
        match direction {
            Direction::Forward => self.position += self.front * velocity,
            Direction::Backward => self.position -= self.front * velocity,
            Direction::Left => self.position -= self.right * velocity,
            Direction::Right => self.position += self.right * velocity,
        }
    }

    /// Turns the camera by a cursor offset, in pixels.
    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32, constrain_pitch: bool) {
        self.yaw += x_offset * self.mouse_sensitivity;
        self.pitch += y_offset * self.mouse_sensitivity;

        if constrain_pitch {
            self.clamp_pitch();
        }

        self.update_vectors();
    }

    /// Narrows the field of view when scrolling away from the user.
    pub fn process_mouse_scroll(&mut self, y_offset: f32) {
        self.zoom = (self.zoom - y_offset).clamp(self.min_zoom, self.max_zoom);
    }

    fn clamp_pitch(&mut self) {
        self.pitch = self
            .pitch
            .clamp(-CameraConfig::MAX_PITCH, CameraConfig::MAX_PITCH);
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalize();
        // Looking straight along `world_up` leaves the horizon undefined, keep the last one.
        self.right = self
            .front
            .cross(self.world_up)
            .try_normalize()
            .unwrap_or(self.right);
        self.up = self.right.cross(self.front).normalize();
    }
}

impl Default for FirstPerson {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

impl super::Camera for FirstPerson {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn front(&self) -> Vec3 {
        self.front
    }

    fn up(&self) -> Vec3 {
        self.up
    }

    fn right(&self) -> Vec3 {
        self.right
    }

    fn zoom(&self) -> f32 {
        self.zoom
    }

    fn process_inputs(&mut self, inputs: &[Input], delta_seconds: f32) {
        for input in inputs {
            match *input {
                Input::Move(direction) => self.process_movement(direction, delta_seconds),
                Input::Look { x_offset, y_offset } => {
                    self.process_mouse_movement(x_offset, y_offset, self.constrain_pitch);
                }
                Input::Scroll(y_offset) => self.process_mouse_scroll(y_offset),
            }
        }
    }
}
