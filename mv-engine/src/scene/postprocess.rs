//! Normalization passes applied to every mesh before conversion.

use glam::{Vec2, Vec3};

use super::graph::{RawMesh, RawScene};

/// Which normalization passes to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostProcess {
    /// Split polygons into triangle fans, drop points and lines.
    pub triangulate: bool,
    /// Average face normals into vertex normals when the file has none.
    pub gen_smooth_normals: bool,
    /// `v = 1 - v`, since image rows are stored top to bottom.
    pub flip_uvs: bool,
    /// Derive tangents and bitangents from texture coordinates.
    pub calc_tangent_space: bool,
}

impl Default for PostProcess {
    fn default() -> Self {
        Self {
            triangulate: true,
            gen_smooth_normals: true,
            flip_uvs: true,
            calc_tangent_space: true,
        }
    }
}

impl PostProcess {
    pub fn apply(self, scene: &mut RawScene) {
        for mesh in &mut scene.meshes {
            self.apply_mesh(mesh);
        }
    }

    pub fn apply_mesh(self, mesh: &mut RawMesh) {
        if self.triangulate {
            triangulate(mesh);
        }
        if self.gen_smooth_normals && mesh.normals.is_none() {
            mesh.normals = Some(smooth_normals(mesh));
        }
        if self.flip_uvs {
            flip_uvs(mesh);
        }
        if self.calc_tangent_space && mesh.tangents.is_none() {
            if let Some((tangents, bitangents)) = tangent_space(mesh) {
                mesh.tangents = Some(tangents);
                mesh.bitangents = Some(bitangents);
            }
        }
    }
}

fn triangulate(mesh: &mut RawMesh) {
    let faces = std::mem::take(&mut mesh.faces);
    mesh.faces = faces
        .into_iter()
        .flat_map(|face| {
            let first = face.first().copied();
            face.windows(2)
                .skip(1)
                .filter_map(move |pair| first.map(|first| vec![first, pair[0], pair[1]]))
                .collect::<Vec<_>>()
        })
        .collect();
}

fn triangles(mesh: &RawMesh) -> impl Iterator<Item = [usize; 3]> + '_ {
    let vertex_count = mesh.positions.len();
    mesh.faces.iter().filter_map(move |face| match face.as_slice() {
        &[a, b, c] => {
            let triangle = [a as usize, b as usize, c as usize];
            triangle
                .iter()
                .all(|&index| index < vertex_count)
                .then_some(triangle)
        }
        _ => None,
    })
}

fn smooth_normals(mesh: &RawMesh) -> Vec<[f32; 3]> {
    let positions: Vec<Vec3> = mesh.positions.iter().copied().map(Vec3::from).collect();
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for [a, b, c] in triangles(mesh) {
        // Unnormalized, so larger faces weigh more.
        let face_normal = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face_normal;
        normals[b] += face_normal;
        normals[c] += face_normal;
    }

    normals
        .into_iter()
        .map(|normal| normal.normalize_or_zero().into())
        .collect()
}

fn flip_uvs(mesh: &mut RawMesh) {
    if let Some(tex_coords) = &mut mesh.tex_coords {
        for uv in tex_coords {
            uv[1] = 1.0 - uv[1];
        }
    }
}

fn tangent_space(mesh: &RawMesh) -> Option<(Vec<[f32; 3]>, Vec<[f32; 3]>)> {
    let tex_coords = mesh.tex_coords.as_ref()?;
    let positions: Vec<Vec3> = mesh.positions.iter().copied().map(Vec3::from).collect();
    let mut tangents = vec![Vec3::ZERO; positions.len()];
    let mut bitangents = vec![Vec3::ZERO; positions.len()];

    for [a, b, c] in triangles(mesh) {
        let (uv_a, uv_b, uv_c) = (
            Vec2::from(*tex_coords.get(a)?),
            Vec2::from(*tex_coords.get(b)?),
            Vec2::from(*tex_coords.get(c)?),
        );
        let (edge1, edge2) = (positions[b] - positions[a], positions[c] - positions[a]);
        let (duv1, duv2) = (uv_b - uv_a, uv_c - uv_a);

        let determinant = duv1.perp_dot(duv2);
        if determinant.abs() <= f32::EPSILON {
            continue;
        }
        let r = determinant.recip();
        let tangent = (edge1 * duv2.y - edge2 * duv1.y) * r;
        let bitangent = (edge2 * duv1.x - edge1 * duv2.x) * r;

        for index in [a, b, c] {
            tangents[index] += tangent;
            bitangents[index] += bitangent;
        }
    }

    let normals = mesh.normals.as_deref();
    let (tangents, bitangents) = tangents
        .into_iter()
        .zip(bitangents)
        .enumerate()
        .map(|(index, (tangent, bitangent))| {
            let normal = normals
                .and_then(|normals| normals.get(index))
                .map_or(Vec3::ZERO, |&normal| Vec3::from(normal));
            // Gram-Schmidt against the normal, falling back to any perpendicular.
            let tangent = (tangent - normal * normal.dot(tangent))
                .try_normalize()
                .unwrap_or_else(|| normal.any_orthonormal_vector());
            let bitangent = bitangent
                .try_normalize()
                .unwrap_or_else(|| normal.cross(tangent));
            (<[f32; 3]>::from(tangent), <[f32; 3]>::from(bitangent))
        })
        .unzip();

    Some((tangents, bitangents))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> RawMesh {
        RawMesh {
            name: "quad".to_string(),
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            tex_coords: Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
            faces: vec![vec![0, 1, 2, 3]],
            ..RawMesh::default()
        }
    }

    #[test]
    fn test_polygons_become_fans() {
        let mut mesh = quad();
        mesh.faces.push(vec![0, 1]);
        triangulate(&mut mesh);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2], vec![0, 2, 3]]);
    }

    #[test]
    fn test_generated_normals_face_the_winding() {
        let mut mesh = quad();
        PostProcess::default().apply_mesh(&mut mesh);
        let normals = mesh.normals.unwrap();
        assert_eq!(normals.len(), 4);
        for normal in normals {
            assert!(Vec3::from(normal).abs_diff_eq(Vec3::Z, 1e-6), "{normal:?}");
        }
    }

    #[test]
    fn test_existing_normals_are_kept() {
        let mut mesh = quad();
        mesh.normals = Some(vec![[0.0, 1.0, 0.0]; 4]);
        PostProcess::default().apply_mesh(&mut mesh);
        assert_eq!(mesh.normals, Some(vec![[0.0, 1.0, 0.0]; 4]));
    }

    #[test]
    fn test_uvs_are_flipped() {
        let mut mesh = quad();
        PostProcess::default().apply_mesh(&mut mesh);
        assert_eq!(
            mesh.tex_coords,
            Some(vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]])
        );
    }

    #[test]
    fn test_tangent_space_is_unit_and_perpendicular_to_normals() {
        let mut mesh = quad();
        PostProcess::default().apply_mesh(&mut mesh);
        let normals = mesh.normals.unwrap();
        let tangents = mesh.tangents.unwrap();
        let bitangents = mesh.bitangents.unwrap();
        for ((normal, tangent), bitangent) in normals.iter().zip(&tangents).zip(&bitangents) {
            let (normal, tangent) = (Vec3::from(*normal), Vec3::from(*tangent));
            assert!((tangent.length() - 1.0).abs() < 1e-5);
            assert!((Vec3::from(*bitangent).length() - 1.0).abs() < 1e-5);
            assert!(normal.dot(tangent).abs() < 1e-5);
        }
        // U runs along +X on this quad.
        assert!(Vec3::from(tangents[0]).abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn test_no_tangents_without_tex_coords() {
        let mut mesh = quad();
        mesh.tex_coords = None;
        PostProcess::default().apply_mesh(&mut mesh);
        assert!(mesh.tangents.is_none());
        assert!(mesh.bitangents.is_none());
    }

    #[test]
    fn test_disabled_passes_leave_mesh_untouched() {
        let mut mesh = quad();
        let options = PostProcess {
            triangulate: false,
            gen_smooth_normals: false,
            flip_uvs: false,
            calc_tangent_space: false,
        };
        options.apply_mesh(&mut mesh);
        assert_eq!(mesh, quad());
    }
}
