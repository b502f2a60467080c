//! The seam between the importer and a GPU API.
//!
//! The importer only ever uploads geometry and textures through a
//! [`GpuDevice`], and meshes only ever draw through a [`ShaderContext`]. Handles
//! returned by a device release their GPU memory when dropped.

use crate::scene::Vertex;
use crate::texture::DecodedImage;
use crate::DeviceError;

pub mod recording;
pub mod vulkan;

/// How a texture is sampled once uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sampling {
    pub wrap: Wrap,
    pub min_filter: Filter,
    pub mag_filter: Filter,
    /// Generate the full mip chain down to 1x1.
    pub mipmaps: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    Repeat,
    ClampToEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
    /// Linear within and between mip levels. Only meaningful as a min filter.
    LinearMipmapLinear,
}

impl Default for Sampling {
    /// Repeat wrapping with trilinear minification, used for every material texture.
    fn default() -> Self {
        Self {
            wrap: Wrap::Repeat,
            min_filter: Filter::LinearMipmapLinear,
            mag_filter: Filter::Linear,
            mipmaps: true,
        }
    }
}

/// Allocates GPU resources for meshes and textures.
pub trait GpuDevice {
    /// Vertex and index buffers of one mesh, owned by that mesh.
    type Geometry;
    /// A texture shared between every mesh that uses it.
    type Texture: Clone;

    fn upload_geometry(
        &mut self,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<Self::Geometry, DeviceError>;

    fn upload_texture(
        &mut self,
        image: &DecodedImage,
        sampling: Sampling,
    ) -> Result<Self::Texture, DeviceError>;
}

/// What a mesh needs from a shader program to draw itself.
pub trait ShaderContext<D: GpuDevice + ?Sized> {
    /// Binds `texture` to texture `unit` and points the sampler uniform named
    /// `uniform` at that unit.
    fn bind_texture(&mut self, unit: u32, uniform: &str, texture: &D::Texture);

    /// Draws the first `index_count` indices of `geometry` as triangles.
    fn draw_indexed(&mut self, geometry: &D::Geometry, index_count: u32);
}
