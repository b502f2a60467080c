use crate::device::{GpuDevice, ShaderContext};
use crate::ImportError;

use super::{Texture, TextureKind, Vertex};

/// A single static piece of geometry with its textures.
///
/// The GPU buffers are created with the mesh and released when it is dropped.
/// Textures are shared with the [`Model`](super::Model) that loaded them.
pub struct Mesh<D: GpuDevice> {
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    index_count: u32,
    textures: Vec<Texture<D::Texture>>,
    geometry: D::Geometry,
}

impl<D: GpuDevice> Mesh<D> {
    /// Validates the indices and uploads the geometry.
    pub fn new(
        device: &mut D,
        name: String,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        textures: Vec<Texture<D::Texture>>,
    ) -> Result<Self, ImportError> {
        if let Some(&index) = indices
            .iter()
            .find(|&&index| index as usize >= vertices.len())
        {
            return Err(ImportError::IndexOutOfRange {
                mesh: name,
                index,
                vertex_count: vertices.len(),
            });
        }
        let index_count =
            u32::try_from(indices.len()).map_err(|_| ImportError::TooManyIndices {
                mesh: name.clone(),
                count: indices.len(),
            })?;

        let geometry = device
            .upload_geometry(&vertices, &indices)
            .map_err(|source| ImportError::Upload {
                mesh: name.clone(),
                source,
            })?;

        Ok(Self {
            name,
            vertices,
            indices,
            index_count,
            textures,
            geometry,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[must_use]
    pub fn textures(&self) -> &[Texture<D::Texture>] {
        &self.textures
    }

    #[must_use]
    pub const fn geometry(&self) -> &D::Geometry {
        &self.geometry
    }

    /// Binds every texture to its own unit, then draws all indices.
    ///
    /// Texture `i` goes to unit `i` and to the sampler named after its kind
    /// and its rank among textures of that kind, e.g. the second diffuse
    /// texture binds to `texture_diffuse2`.
    pub fn draw<S>(&self, shader: &mut S)
    where
        S: ShaderContext<D> + ?Sized,
    {
        let mut counters = [0_u32; TextureKind::ALL.len()];
        for (unit, texture) in (0_u32..).zip(&self.textures) {
            let counter = &mut counters[texture.kind().index()];
            *counter += 1;
            let uniform = format!("{}{counter}", texture.kind().uniform_prefix());
            shader.bind_texture(unit, &uniform, texture.handle());
        }

        shader.draw_indexed(&self.geometry, self.index_count);
    }
}

impl<D: GpuDevice> std::fmt::Debug for Mesh<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("name", &self.name)
            .field("vertices", &self.vertices.len())
            .field("indices", &self.indices.len())
            .field("textures", &self.textures.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::recording::{Command, Event, RecordingDevice, RecordingShader};
    use crate::texture::{DecodedImage, PixelFormat};

    fn triangle() -> Vec<Vertex> {
        vec![Vertex::default(); 3]
    }

    fn texture(device: &mut RecordingDevice, kind: TextureKind) -> Texture<<RecordingDevice as GpuDevice>::Texture> {
        let image = DecodedImage::new(1, 1, PixelFormat::Rgba8, vec![255; 4]).unwrap();
        let handle = device.upload_texture(&image, Default::default()).unwrap();
        Texture::new(handle, kind, format!("{kind:?}.png"))
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let mut device = RecordingDevice::new();
        let error = Mesh::new(&mut device, "bad".to_string(), triangle(), vec![0, 1, 3], Vec::new())
            .unwrap_err();
        assert!(matches!(
            error,
            ImportError::IndexOutOfRange {
                index: 3,
                vertex_count: 3,
                ..
            }
        ));
        assert_eq!(device.geometry_uploads(), 0);
    }

    #[test]
    fn test_sampler_names_count_per_kind() {
        let mut device = RecordingDevice::new();
        let textures = vec![
            texture(&mut device, TextureKind::Diffuse),
            texture(&mut device, TextureKind::Specular),
            texture(&mut device, TextureKind::Diffuse),
            texture(&mut device, TextureKind::Normal),
            texture(&mut device, TextureKind::Height),
        ];
        let ids: Vec<u32> = textures.iter().map(|texture| texture.handle().id()).collect();
        let mesh = Mesh::new(&mut device, "m".to_string(), triangle(), vec![0, 1, 2], textures)
            .unwrap();

        let mut shader = RecordingShader::new();
        mesh.draw(&mut shader);

        let bind = |unit: u32, uniform: &str| Command::BindTexture {
            unit,
            uniform: uniform.to_string(),
            texture: ids[unit as usize],
        };
        assert_eq!(
            shader.commands(),
            &[
                bind(0, "texture_diffuse1"),
                bind(1, "texture_specular1"),
                bind(2, "texture_diffuse2"),
                bind(3, "texture_normal1"),
                bind(4, "texture_height1"),
                Command::DrawIndexed {
                    geometry: mesh.geometry().id(),
                    index_count: 3,
                },
            ]
        );
    }

    #[test]
    fn test_counters_restart_per_mesh() {
        let mut device = RecordingDevice::new();
        let diffuse = texture(&mut device, TextureKind::Diffuse);
        let first = Mesh::new(
            &mut device,
            "first".to_string(),
            triangle(),
            vec![0, 1, 2],
            vec![diffuse.clone()],
        )
        .unwrap();
        let second = Mesh::new(
            &mut device,
            "second".to_string(),
            triangle(),
            vec![2, 1, 0],
            vec![diffuse],
        )
        .unwrap();

        let mut shader = RecordingShader::new();
        first.draw(&mut shader);
        second.draw(&mut shader);

        let uniforms: Vec<&str> = shader
            .commands()
            .iter()
            .filter_map(|command| match command {
                Command::BindTexture { uniform, .. } => Some(uniform.as_str()),
                Command::DrawIndexed { .. } => None,
            })
            .collect();
        assert_eq!(uniforms, ["texture_diffuse1", "texture_diffuse1"]);
    }

    #[test]
    fn test_geometry_released_on_drop() {
        let mut device = RecordingDevice::new();
        let mesh = Mesh::new(&mut device, "m".to_string(), triangle(), vec![0, 1, 2], Vec::new())
            .unwrap();
        let id = mesh.geometry().id();
        drop(mesh);
        assert_eq!(
            device.events().last(),
            Some(&Event::GeometryReleased { id })
        );
        assert_eq!(device.live_resources(), 0);
    }
}
