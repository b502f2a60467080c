//! Wavefront OBJ/MTL scenes, parsed by `tobj`.

use std::io::BufRead;
use std::path::Path;

use super::graph::{RawMaterial, RawMesh, RawNode, RawScene, TextureSlot};
use crate::ImportError;

/// Something able to parse a model file into a scene graph.
pub trait SceneSource {
    fn read(&self, path: &Path) -> Result<RawScene, ImportError>;
}

/// Reads `.obj` files and the `.mtl` libraries they reference.
///
/// Polygons are kept as-is and positions, normals and texture coordinates are
/// merged into a single index buffer; the importer's post-processing does the
/// rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjSource;

impl ObjSource {
    const LOAD_OPTIONS: tobj::LoadOptions = tobj::LoadOptions {
        single_index: true,
        triangulate: false,
        ignore_points: true,
        ignore_lines: true,
    };

    /// Parses an OBJ document from memory, resolving `mtllib` statements
    /// through `material_loader`.
    pub fn read_buf<B, ML>(
        name: &str,
        reader: &mut B,
        material_loader: ML,
    ) -> Result<RawScene, ImportError>
    where
        B: BufRead,
        ML: Fn(&Path) -> tobj::MTLLoadResult,
    {
        let (models, materials) = tobj::load_obj_buf(reader, &Self::LOAD_OPTIONS, material_loader)
            .map_err(|error| ImportError::Parse {
                path: name.into(),
                message: error.to_string(),
            })?;
        Ok(Self::convert(name, models, materials))
    }

    fn convert(
        name: &str,
        models: Vec<tobj::Model>,
        materials: Result<Vec<tobj::Material>, tobj::LoadError>,
    ) -> RawScene {
        let materials = materials.unwrap_or_else(|error| {
            tracing::warn!("Failed to load materials of {name}: {error}");
            Vec::new()
        });
        let materials: Vec<RawMaterial> = materials.iter().map(convert_material).collect();

        let mut root = RawNode {
            name: name.to_string(),
            ..RawNode::default()
        };
        let meshes = models
            .into_iter()
            .filter(|model| {
                let empty = model.mesh.positions.is_empty() || model.mesh.indices.is_empty();
                if empty {
                    tracing::debug!("Ignoring object {} without geometry", model.name);
                }
                !empty
            })
            .enumerate()
            .map(|(index, model)| {
                root.children.push(RawNode {
                    name: model.name.clone(),
                    meshes: vec![index],
                    children: Vec::new(),
                });
                convert_mesh(model, materials.len())
            })
            .collect();

        RawScene {
            root: Some(root),
            meshes,
            materials,
        }
    }
}

impl SceneSource for ObjSource {
    fn read(&self, path: &Path) -> Result<RawScene, ImportError> {
        let start = std::time::Instant::now();

        let (models, materials) =
            tobj::load_obj(path, &Self::LOAD_OPTIONS).map_err(|error| ImportError::Parse {
                path: path.to_path_buf(),
                message: error.to_string(),
            })?;
        let scene = Self::convert(&path.display().to_string(), models, materials);

        tracing::trace!(
            "Parsed {} in {:?}: {} meshes, {} materials",
            path.display(),
            start.elapsed(),
            scene.meshes.len(),
            scene.materials.len()
        );
        Ok(scene)
    }
}

fn convert_mesh(model: tobj::Model, material_count: usize) -> RawMesh {
    let tobj::Model { mesh, name, .. } = model;
    let vertex_count = mesh.positions.len() / 3;

    let faces = if mesh.face_arities.is_empty() {
        mesh.indices.chunks_exact(3).map(<[u32]>::to_vec).collect()
    } else {
        let mut next = 0;
        mesh.face_arities
            .iter()
            .filter_map(|&arity| {
                let face = mesh.indices.get(next..next + arity as usize)?.to_vec();
                next += arity as usize;
                Some(face)
            })
            .collect()
    };

    let material = mesh.material_id.filter(|&id| {
        let known = id < material_count;
        if !known {
            tracing::warn!("Mesh {name} uses material {id} which failed to load");
        }
        known
    });

    RawMesh {
        positions: triples(&mesh.positions),
        normals: (mesh.normals.len() == vertex_count * 3 && vertex_count > 0)
            .then(|| triples(&mesh.normals)),
        tex_coords: (mesh.texcoords.len() == vertex_count * 2 && vertex_count > 0).then(|| {
            mesh.texcoords
                .chunks_exact(2)
                .map(|uv| [uv[0], uv[1]])
                .collect()
        }),
        tangents: None,
        bitangents: None,
        faces,
        material,
        name,
    }
}

fn triples(values: &[f32]) -> Vec<[f32; 3]> {
    values
        .chunks_exact(3)
        .map(|xyz| [xyz[0], xyz[1], xyz[2]])
        .collect()
}

fn convert_material(material: &tobj::Material) -> RawMaterial {
    let slots = [
        (TextureSlot::Diffuse, &material.diffuse_texture),
        (TextureSlot::Specular, &material.specular_texture),
        // `bump`/`map_Bump`
        (TextureSlot::Height, &material.normal_texture),
        (TextureSlot::Ambient, &material.ambient_texture),
    ];
    RawMaterial {
        name: material.name.clone(),
        textures: slots
            .into_iter()
            .filter_map(|(slot, path)| {
                let path = path.as_deref()?.trim();
                (!path.is_empty()).then(|| (slot, path.to_string()))
            })
            .collect(),
    }
}
