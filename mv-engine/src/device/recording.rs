//! A device that keeps everything in host memory and records what was asked
//! of it.
//!
//! Used by the driver's dry-run mode to validate assets without a GPU, and by
//! the tests to observe uploads, releases and draw calls.

use std::cell::RefCell;
use std::rc::Rc;

use super::{GpuDevice, Sampling, ShaderContext};
use crate::scene::Vertex;
use crate::texture::{DecodedImage, PixelFormat};
use crate::DeviceError;

/// One thing that happened on a [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    GeometryUploaded { id: u32, vertices: usize, indices: usize },
    GeometryReleased { id: u32 },
    TextureUploaded { id: u32, width: u32, height: u32, format: PixelFormat },
    TextureReleased { id: u32 },
}

type Log = Rc<RefCell<Vec<Event>>>;

#[derive(Debug)]
pub struct RecordedGeometry {
    id: u32,
    log: Log,
}

impl RecordedGeometry {
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }
}

impl Drop for RecordedGeometry {
    fn drop(&mut self) {
        self.log
            .borrow_mut()
            .push(Event::GeometryReleased { id: self.id });
    }
}

#[derive(Debug)]
struct RecordedTextureInner {
    id: u32,
    sampling: Sampling,
    log: Log,
}

impl Drop for RecordedTextureInner {
    fn drop(&mut self) {
        self.log
            .borrow_mut()
            .push(Event::TextureReleased { id: self.id });
    }
}

/// Shared handle, released once the last clone is dropped.
#[derive(Debug, Clone)]
pub struct RecordedTexture(Rc<RecordedTextureInner>);

impl RecordedTexture {
    #[must_use]
    pub fn id(&self) -> u32 {
        self.0.id
    }

    #[must_use]
    pub fn sampling(&self) -> Sampling {
        self.0.sampling
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    next_id: u32,
    log: Log,
    fail_textures: bool,
}

impl RecordingDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every texture upload fail, to exercise degraded imports.
    #[must_use]
    pub fn failing_textures(mut self) -> Self {
        self.fail_textures = true;
        self
    }

    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    #[must_use]
    pub fn texture_uploads(&self) -> usize {
        self.count(|event| matches!(event, Event::TextureUploaded { .. }))
    }

    #[must_use]
    pub fn geometry_uploads(&self) -> usize {
        self.count(|event| matches!(event, Event::GeometryUploaded { .. }))
    }

    #[must_use]
    pub fn live_resources(&self) -> usize {
        let log = self.log.borrow();
        let uploaded = log
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::GeometryUploaded { .. } | Event::TextureUploaded { .. }
                )
            })
            .count();
        uploaded - (log.len() - uploaded)
    }

    fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.log.borrow().iter().filter(|event| predicate(event)).count()
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl GpuDevice for RecordingDevice {
    type Geometry = RecordedGeometry;
    type Texture = RecordedTexture;

    fn upload_geometry(
        &mut self,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<Self::Geometry, DeviceError> {
        let id = self.next_id();
        self.log.borrow_mut().push(Event::GeometryUploaded {
            id,
            vertices: vertices.len(),
            indices: indices.len(),
        });
        Ok(RecordedGeometry {
            id,
            log: self.log.clone(),
        })
    }

    fn upload_texture(
        &mut self,
        image: &DecodedImage,
        sampling: Sampling,
    ) -> Result<Self::Texture, DeviceError> {
        if self.fail_textures {
            return Err(DeviceError::new("upload texture", "texture uploads disabled"));
        }
        let id = self.next_id();
        self.log.borrow_mut().push(Event::TextureUploaded {
            id,
            width: image.width(),
            height: image.height(),
            format: image.format(),
        });
        Ok(RecordedTexture(Rc::new(RecordedTextureInner {
            id,
            sampling,
            log: self.log.clone(),
        })))
    }
}

/// A draw-time command issued through [`RecordingShader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    BindTexture { unit: u32, uniform: String, texture: u32 },
    DrawIndexed { geometry: u32, index_count: u32 },
}

#[derive(Debug, Default)]
pub struct RecordingShader {
    commands: Vec<Command>,
}

impl RecordingShader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, Command::DrawIndexed { .. }))
            .count()
    }
}

impl ShaderContext<RecordingDevice> for RecordingShader {
    fn bind_texture(&mut self, unit: u32, uniform: &str, texture: &RecordedTexture) {
        self.commands.push(Command::BindTexture {
            unit,
            uniform: uniform.to_owned(),
            texture: texture.id(),
        });
    }

    fn draw_indexed(&mut self, geometry: &RecordedGeometry, index_count: u32) {
        self.commands.push(Command::DrawIndexed {
            geometry: geometry.id(),
            index_count,
        });
    }
}
