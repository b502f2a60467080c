//! The parser-independent scene graph the importer walks.

use std::path::Path;

use crate::ImportError;

/// Texture slots a material can fill, named after what the file format
/// calls them rather than how they end up being used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Diffuse,
    Specular,
    /// Bump map slot. Holds normal maps in practice.
    Height,
    /// Ambient map slot. Holds height maps in practice.
    Ambient,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMaterial {
    pub name: String,
    /// Texture paths per slot, in declaration order.
    pub textures: Vec<(TextureSlot, String)>,
}

impl RawMaterial {
    pub fn textures(&self, slot: TextureSlot) -> impl Iterator<Item = &str> {
        self.textures
            .iter()
            .filter(move |(texture_slot, _)| *texture_slot == slot)
            .map(|(_, path)| path.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    /// One per position when present.
    pub normals: Option<Vec<[f32; 3]>>,
    /// First texture coordinate channel, one per position when present.
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub tangents: Option<Vec<[f32; 3]>>,
    pub bitangents: Option<Vec<[f32; 3]>>,
    /// Polygons as indices into `positions`. Triangles after triangulation.
    pub faces: Vec<Vec<u32>>,
    /// Index into the scene's materials.
    pub material: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNode {
    pub name: String,
    /// Indices into the scene's meshes.
    pub meshes: Vec<usize>,
    pub children: Vec<RawNode>,
}

impl RawNode {
    fn for_each(&self, visit: &mut impl FnMut(&Self)) {
        visit(self);
        for child in &self.children {
            child.for_each(visit);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawScene {
    pub root: Option<RawNode>,
    pub meshes: Vec<RawMesh>,
    pub materials: Vec<RawMaterial>,
}

impl RawScene {
    /// Checks that the scene has a root and that every cross reference resolves.
    pub fn validate(&self, path: &Path) -> Result<&RawNode, ImportError> {
        let incomplete = |reason: String| ImportError::Incomplete {
            path: path.to_path_buf(),
            reason,
        };

        let root = self
            .root
            .as_ref()
            .ok_or_else(|| incomplete("no root node".to_string()))?;
        if self.meshes.is_empty() {
            return Err(incomplete("no meshes".to_string()));
        }

        let mut missing_mesh = None;
        root.for_each(&mut |node| {
            if let Some(&index) = node.meshes.iter().find(|&&index| index >= self.meshes.len()) {
                missing_mesh.get_or_insert((node.name.clone(), index));
            }
        });
        if let Some((node, index)) = missing_mesh {
            return Err(incomplete(format!(
                "node `{node}` references mesh {index} of {}",
                self.meshes.len()
            )));
        }

        if let Some(mesh) = self.meshes.iter().find(|mesh| {
            mesh.material
                .is_some_and(|material| material >= self.materials.len())
        }) {
            return Err(incomplete(format!(
                "mesh `{}` references a missing material",
                mesh.name
            )));
        }

        Ok(root)
    }
}
