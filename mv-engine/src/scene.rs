//! Model import: from a parsed scene graph to drawable meshes.

pub mod graph;
pub mod mesh;
pub mod model;
pub mod obj;
pub mod postprocess;

pub use graph::{RawMaterial, RawMesh, RawNode, RawScene, TextureSlot};
pub use mesh::Mesh;
pub use model::{ImportOptions, Model};
pub use obj::{ObjSource, SceneSource};
pub use postprocess::PostProcess;

/// A vertex as uploaded to the GPU, tightly packed.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

/// What a texture is used for when shading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Normal,
    Height,
}

impl TextureKind {
    pub const ALL: [Self; 4] = [Self::Diffuse, Self::Specular, Self::Normal, Self::Height];

    /// Sampler uniforms are named `<prefix><n>`, `n` counting from 1 per kind.
    #[must_use]
    pub const fn uniform_prefix(self) -> &'static str {
        match self {
            Self::Diffuse => "texture_diffuse",
            Self::Specular => "texture_specular",
            Self::Normal => "texture_normal",
            Self::Height => "texture_height",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Diffuse => 0,
            Self::Specular => 1,
            Self::Normal => 2,
            Self::Height => 3,
        }
    }
}

/// A texture bound to a mesh: a shared device handle tagged with its use.
#[derive(Debug, Clone)]
pub struct Texture<T> {
    handle: T,
    kind: TextureKind,
    path: String,
}

impl<T> Texture<T> {
    #[must_use]
    pub const fn new(handle: T, kind: TextureKind, path: String) -> Self {
        Self { handle, kind, path }
    }

    #[must_use]
    pub const fn handle(&self) -> &T {
        &self.handle
    }

    #[must_use]
    pub const fn kind(&self) -> TextureKind {
        self.kind
    }

    /// The path as written in the material, before resolution.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}
