use glam::{Mat4, Vec3};

pub mod first_person;

/// Represents a camera.
///
/// It is expected that `front`, `up` and `right` are normalized and mutually
/// orthogonal.
pub trait Camera {
    /// Returns the position of the camera.
    fn position(&self) -> Vec3;
    /// Returns the direction the camera is facing.
    fn front(&self) -> Vec3;
    /// Returns the up vector of the camera.
    fn up(&self) -> Vec3;
    /// Returns the right vector of the camera.
    fn right(&self) -> Vec3;
    /// Returns the vertical field of view, in degrees.
    fn zoom(&self) -> f32;

    /// Returns the world to eye space transform.
    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.position() + self.front(), self.up())
    }

    /// Returns a perspective projection using the current zoom as field of view.
    ///
    /// Depth maps to `[0, 1]`, as Vulkan expects.
    fn projection_matrix(&self, aspect_ratio: f32, z_near: f32, z_far: f32) -> Mat4 {
        Mat4::perspective_rh(self.zoom().to_radians(), aspect_ratio, z_near, z_far)
    }

    /// Processes the inputs and updates the camera.
    fn process_inputs(&mut self, inputs: &[super::Input], delta_seconds: f32);
}

/// Initial state and tuning of a camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub position: Vec3,
    pub world_up: Vec3,
    /// Degrees, measured from +X in the XZ plane. `-90` looks down -Z.
    pub yaw: f32,
    /// Degrees of elevation.
    pub pitch: f32,
    /// World units per second.
    pub movement_speed: f32,
    /// Degrees per pixel of cursor movement.
    pub mouse_sensitivity: f32,
    /// Initial field of view, in degrees.
    pub zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Keep pitch within `[-89, 89]` when looking around.
    pub constrain_pitch: bool,
}

impl CameraConfig {
    pub const MAX_PITCH: f32 = 89.0;

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            world_up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
            movement_speed: 2.5,
            mouse_sensitivity: 0.1,
            zoom: 45.0,
            min_zoom: 1.0,
            max_zoom: 45.0,
            constrain_pitch: true,
        }
    }
}
