use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::device::{GpuDevice, Sampling, ShaderContext};
use crate::texture::TextureLoader;
use crate::ImportError;

use super::graph::{RawMaterial, RawMesh, RawNode, RawScene, TextureSlot};
use super::obj::{ObjSource, SceneSource};
use super::postprocess::PostProcess;
use super::{Mesh, Texture, TextureKind, Vertex};

/// Material slots read for every mesh, in binding order.
const MATERIAL_TEXTURES: [(TextureSlot, TextureKind); 4] = [
    (TextureSlot::Diffuse, TextureKind::Diffuse),
    (TextureSlot::Specular, TextureKind::Specular),
    (TextureSlot::Height, TextureKind::Normal),
    (TextureSlot::Ambient, TextureKind::Height),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub post_process: PostProcess,
    pub sampling: Sampling,
}

/// A texture uploaded while importing, keyed by the path its material gave.
#[derive(Debug, Clone)]
pub struct LoadedTexture<T> {
    pub path: String,
    pub handle: T,
}

/// Every mesh of one model file and the textures they share.
pub struct Model<D: GpuDevice> {
    meshes: Vec<Mesh<D>>,
    textures_loaded: Vec<LoadedTexture<D::Texture>>,
    directory: PathBuf,
}

impl<D: GpuDevice> Model<D> {
    /// A model with nothing to draw.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            meshes: Vec::new(),
            textures_loaded: Vec::new(),
            directory: PathBuf::new(),
        }
    }

    /// Loads an OBJ model, reporting failures instead of returning them.
    ///
    /// A model that could not be imported at all comes back empty, check
    /// [`Model::is_empty`] to tell.
    pub fn load<L>(path: impl AsRef<Path>, device: &mut D, loader: &mut L) -> Self
    where
        L: TextureLoader + ?Sized,
    {
        let path = path.as_ref();
        Self::try_load(path, device, loader).unwrap_or_else(|error| {
            tracing::error!("Failed to import {}: {error}", path.display());
            Self::empty()
        })
    }

    /// Loads an OBJ model with the default import options.
    pub fn try_load<L>(
        path: impl AsRef<Path>,
        device: &mut D,
        loader: &mut L,
    ) -> Result<Self, ImportError>
    where
        L: TextureLoader + ?Sized,
    {
        Self::import(&ObjSource, path.as_ref(), ImportOptions::default(), device, loader)
    }

    pub fn import<S, L>(
        source: &S,
        path: &Path,
        options: ImportOptions,
        device: &mut D,
        loader: &mut L,
    ) -> Result<Self, ImportError>
    where
        S: SceneSource + ?Sized,
        L: TextureLoader + ?Sized,
    {
        let start = std::time::Instant::now();

        let scene = source.read(path)?;
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let model = Self::from_scene(scene, path, directory, options, device, loader)?;

        tracing::info!(
            "Imported {} in {:?}: {} meshes, {} textures",
            path.display(),
            start.elapsed(),
            model.meshes.len(),
            model.textures_loaded.len()
        );
        Ok(model)
    }

    /// Builds a model from an already parsed scene. Texture paths resolve
    /// against `directory`.
    pub fn from_scene<L>(
        mut scene: RawScene,
        path: &Path,
        directory: PathBuf,
        options: ImportOptions,
        device: &mut D,
        loader: &mut L,
    ) -> Result<Self, ImportError>
    where
        L: TextureLoader + ?Sized,
    {
        scene.validate(path)?;
        options.post_process.apply(&mut scene);

        let mut importer = Importer {
            device,
            loader,
            sampling: options.sampling,
            scene: &scene,
            model: Self {
                directory,
                ..Self::empty()
            },
            cache: HashMap::new(),
            failed: HashSet::new(),
        };
        if let Some(root) = &scene.root {
            importer.process_node(root);
        }
        Ok(importer.model)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    #[must_use]
    pub fn meshes(&self) -> &[Mesh<D>] {
        &self.meshes
    }

    /// Unique textures, in the order they were first uploaded.
    #[must_use]
    pub fn textures_loaded(&self) -> &[LoadedTexture<D::Texture>] {
        &self.textures_loaded
    }

    /// Where relative texture paths were resolved from.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn draw<S>(&self, shader: &mut S)
    where
        S: ShaderContext<D> + ?Sized,
    {
        for mesh in &self.meshes {
            mesh.draw(shader);
        }
    }
}

impl<D: GpuDevice> std::fmt::Debug for Model<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("meshes", &self.meshes)
            .field("textures_loaded", &self.textures_loaded.len())
            .field("directory", &self.directory)
            .finish()
    }
}

/// State of one import: the model being filled and its texture cache.
struct Importer<'a, D: GpuDevice, L: TextureLoader + ?Sized> {
    device: &'a mut D,
    loader: &'a mut L,
    sampling: Sampling,
    scene: &'a RawScene,
    model: Model<D>,
    /// Material path to index in `model.textures_loaded`.
    cache: HashMap<String, usize>,
    /// Material paths that already failed to load once.
    failed: HashSet<String>,
}

impl<D: GpuDevice, L: TextureLoader + ?Sized> Importer<'_, D, L> {
    /// Converts the meshes of `node`, then those of its children, depth first.
    fn process_node(&mut self, node: &RawNode) {
        let scene = self.scene;
        for &index in &node.meshes {
            let raw = &scene.meshes[index];
            match self.convert_mesh(raw) {
                Ok(mesh) => {
                    tracing::trace!(
                        "Mesh {} ready: {} vertices, {} indices, {} textures",
                        mesh.name(),
                        mesh.vertices().len(),
                        mesh.indices().len(),
                        mesh.textures().len()
                    );
                    self.model.meshes.push(mesh);
                }
                Err(error) => tracing::error!("Skipping mesh: {error}"),
            }
        }

        for child in &node.children {
            self.process_node(child);
        }
    }

    fn convert_mesh(&mut self, raw: &RawMesh) -> Result<Mesh<D>, ImportError> {
        let vertices = raw
            .positions
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let mut vertex = Vertex {
                    position,
                    ..Vertex::default()
                };
                if let Some(normal) = raw.normals.as_ref().and_then(|normals| normals.get(i)) {
                    vertex.normal = *normal;
                }
                if let Some(uv) = raw.tex_coords.as_ref().and_then(|uvs| uvs.get(i)) {
                    vertex.tex_coords = *uv;
                    if let Some(tangent) = raw.tangents.as_ref().and_then(|t| t.get(i)) {
                        vertex.tangent = *tangent;
                    }
                    if let Some(bitangent) = raw.bitangents.as_ref().and_then(|b| b.get(i)) {
                        vertex.bitangent = *bitangent;
                    }
                }
                vertex
            })
            .collect();

        let indices = raw.faces.iter().flatten().copied().collect();

        let textures = match raw.material {
            Some(material) => {
                let scene = self.scene;
                let material = &scene.materials[material];
                MATERIAL_TEXTURES
                    .iter()
                    .flat_map(|&(slot, kind)| self.load_material_textures(material, slot, kind))
                    .collect()
            }
            None => {
                tracing::debug!("Mesh {} has no material", raw.name);
                Vec::new()
            }
        };

        Mesh::new(self.device, raw.name.clone(), vertices, indices, textures)
    }

    /// Loads every texture of `slot`, reusing any path already uploaded for
    /// this model. Textures that fail to load are reported and left out.
    fn load_material_textures(
        &mut self,
        material: &RawMaterial,
        slot: TextureSlot,
        kind: TextureKind,
    ) -> Vec<Texture<D::Texture>> {
        let mut textures = Vec::new();
        for path in material.textures(slot) {
            if let Some(&index) = self.cache.get(path) {
                let handle = self.model.textures_loaded[index].handle.clone();
                textures.push(Texture::new(handle, kind, path.to_string()));
                continue;
            }
            if self.failed.contains(path) {
                continue;
            }

            let resolved = self.resolve(path);
            let loaded = self.loader.load(&resolved).and_then(|image| {
                self.device
                    .upload_texture(&image, self.sampling)
                    .map_err(|source| crate::TextureLoadError::Upload {
                        path: resolved.clone(),
                        source,
                    })
            });
            match loaded {
                Ok(handle) => {
                    tracing::trace!("Texture {} loaded as {kind:?}", resolved.display());
                    self.cache
                        .insert(path.to_string(), self.model.textures_loaded.len());
                    self.model.textures_loaded.push(LoadedTexture {
                        path: path.to_string(),
                        handle: handle.clone(),
                    });
                    textures.push(Texture::new(handle, kind, path.to_string()));
                }
                Err(error) => {
                    tracing::warn!("Texture of material {} not loaded: {error}", material.name);
                    self.failed.insert(path.to_string());
                }
            }
        }
        textures
    }

    fn resolve(&self, path: &str) -> PathBuf {
        // Exporters on Windows write backslashes.
        let path = if std::path::MAIN_SEPARATOR == '\\' {
            path.to_string()
        } else {
            path.replace('\\', "/")
        };
        self.model.directory.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::recording::{Command, RecordingDevice, RecordingShader};
    use crate::texture::{DecodedImage, PixelFormat};
    use crate::TextureLoadError;

    /// Serves 1x1 images for every path except the ones listed as broken.
    #[derive(Default)]
    struct StubLoader {
        broken: Vec<&'static str>,
        requests: Vec<PathBuf>,
    }

    impl TextureLoader for StubLoader {
        fn load(&mut self, path: &Path) -> Result<DecodedImage, TextureLoadError> {
            self.requests.push(path.to_path_buf());
            if self.broken.iter().any(|broken| path.ends_with(broken)) {
                return Err(TextureLoadError::UnsupportedChannels {
                    path: path.to_path_buf(),
                    channels: 0,
                });
            }
            Ok(DecodedImage::new(1, 1, PixelFormat::Rgb8, vec![0, 0, 0]).unwrap())
        }
    }

    fn triangle(name: &str, material: Option<usize>) -> RawMesh {
        RawMesh {
            name: name.to_string(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            tex_coords: Some(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]),
            faces: vec![vec![0, 1, 2]],
            material,
            ..RawMesh::default()
        }
    }

    fn material(name: &str, textures: &[(TextureSlot, &str)]) -> RawMaterial {
        RawMaterial {
            name: name.to_string(),
            textures: textures
                .iter()
                .map(|&(slot, path)| (slot, path.to_string()))
                .collect(),
        }
    }

    fn node(name: &str, meshes: Vec<usize>, children: Vec<RawNode>) -> RawNode {
        RawNode {
            name: name.to_string(),
            meshes,
            children,
        }
    }

    fn build(
        scene: RawScene,
        device: &mut RecordingDevice,
        loader: &mut StubLoader,
    ) -> Result<Model<RecordingDevice>, ImportError> {
        Model::from_scene(
            scene,
            Path::new("assets/test.obj"),
            PathBuf::from("assets"),
            ImportOptions::default(),
            device,
            loader,
        )
    }

    #[test]
    fn test_shared_texture_is_uploaded_once() {
        let scene = RawScene {
            root: Some(node("root", vec![0, 1], Vec::new())),
            meshes: vec![triangle("a", Some(0)), triangle("b", Some(1))],
            materials: vec![
                material("first", &[(TextureSlot::Diffuse, "wood.png")]),
                material("second", &[(TextureSlot::Diffuse, "wood.png")]),
            ],
        };
        let (mut device, mut loader) = (RecordingDevice::new(), StubLoader::default());

        let model = build(scene, &mut device, &mut loader).unwrap();

        assert_eq!(model.meshes().len(), 2);
        assert_eq!(model.textures_loaded().len(), 1);
        assert_eq!(device.texture_uploads(), 1);
        assert_eq!(loader.requests, [PathBuf::from("assets/wood.png")]);
        let a = &model.meshes()[0].textures()[0];
        let b = &model.meshes()[1].textures()[0];
        assert!(a.handle().ptr_eq(b.handle()));
    }

    #[test]
    fn test_traversal_is_depth_first_parent_first() {
        let scene = RawScene {
            root: Some(node(
                "root",
                vec![2],
                vec![
                    node("left", vec![0], vec![node("leaf", vec![3], Vec::new())]),
                    node("right", vec![1], Vec::new()),
                ],
            )),
            meshes: ["m0", "m1", "m2", "m3"]
                .into_iter()
                .map(|name| triangle(name, None))
                .collect(),
            materials: Vec::new(),
        };
        let model = build(scene, &mut RecordingDevice::new(), &mut StubLoader::default()).unwrap();
        let names: Vec<&str> = model.meshes().iter().map(Mesh::name).collect();
        assert_eq!(names, ["m2", "m0", "m3", "m1"]);
    }

    #[test]
    fn test_material_slots_load_in_binding_order() {
        let scene = RawScene {
            root: Some(node("root", vec![0], Vec::new())),
            meshes: vec![triangle("a", Some(0))],
            materials: vec![material(
                "all",
                &[
                    (TextureSlot::Ambient, "height.png"),
                    (TextureSlot::Height, "normal.png"),
                    (TextureSlot::Specular, "spec.png"),
                    (TextureSlot::Diffuse, "diffuse.png"),
                ],
            )],
        };
        let model = build(scene, &mut RecordingDevice::new(), &mut StubLoader::default()).unwrap();
        let kinds: Vec<(TextureKind, &str)> = model.meshes()[0]
            .textures()
            .iter()
            .map(|texture| (texture.kind(), texture.path()))
            .collect();
        assert_eq!(
            kinds,
            [
                (TextureKind::Diffuse, "diffuse.png"),
                (TextureKind::Specular, "spec.png"),
                (TextureKind::Normal, "normal.png"),
                (TextureKind::Height, "height.png"),
            ]
        );
    }

    #[test]
    fn test_mesh_without_material_is_kept() {
        let scene = RawScene {
            root: Some(node("root", vec![0], Vec::new())),
            meshes: vec![triangle("bare", None)],
            materials: Vec::new(),
        };
        let mut device = RecordingDevice::new();
        let model = build(scene, &mut device, &mut StubLoader::default()).unwrap();

        assert_eq!(model.meshes().len(), 1);
        assert!(model.meshes()[0].textures().is_empty());

        let mut shader = RecordingShader::new();
        model.draw(&mut shader);
        assert!(matches!(
            shader.commands(),
            [Command::DrawIndexed { index_count: 3, .. }]
        ));
    }

    #[test]
    fn test_broken_texture_is_skipped() {
        let scene = RawScene {
            root: Some(node("root", vec![0], Vec::new())),
            meshes: vec![triangle("a", Some(0))],
            materials: vec![material(
                "m",
                &[
                    (TextureSlot::Diffuse, "broken.png"),
                    (TextureSlot::Specular, "fine.png"),
                ],
            )],
        };
        let mut loader = StubLoader {
            broken: vec!["broken.png"],
            ..StubLoader::default()
        };
        let model = build(scene, &mut RecordingDevice::new(), &mut loader).unwrap();

        let textures = model.meshes()[0].textures();
        assert_eq!(textures.len(), 1);
        assert_eq!(textures[0].kind(), TextureKind::Specular);
    }

    #[test]
    fn test_broken_texture_is_only_tried_once() {
        let scene = RawScene {
            root: Some(node("root", vec![0, 1], Vec::new())),
            meshes: vec![triangle("a", Some(0)), triangle("b", Some(0))],
            materials: vec![material("m", &[(TextureSlot::Diffuse, "gone.png")])],
        };
        let mut loader = StubLoader {
            broken: vec!["gone.png"],
            ..StubLoader::default()
        };
        let model = build(scene, &mut RecordingDevice::new(), &mut loader).unwrap();

        assert_eq!(model.meshes().len(), 2);
        assert!(model.meshes().iter().all(|mesh| mesh.textures().is_empty()));
        assert_eq!(loader.requests, [PathBuf::from("assets/gone.png")]);
    }

    #[test]
    fn test_failed_upload_degrades_to_untextured_mesh() {
        let scene = RawScene {
            root: Some(node("root", vec![0], Vec::new())),
            meshes: vec![triangle("a", Some(0))],
            materials: vec![material("m", &[(TextureSlot::Diffuse, "wood.png")])],
        };
        let mut device = RecordingDevice::new().failing_textures();
        let model = build(scene, &mut device, &mut StubLoader::default()).unwrap();
        assert_eq!(model.meshes().len(), 1);
        assert!(model.textures_loaded().is_empty());
    }

    #[test]
    fn test_invalid_mesh_is_skipped() {
        let mut bad = triangle("bad", None);
        bad.faces = vec![vec![0, 1, 7]];
        let scene = RawScene {
            root: Some(node("root", vec![0, 1], Vec::new())),
            meshes: vec![bad, triangle("good", None)],
            materials: Vec::new(),
        };
        let model = build(scene, &mut RecordingDevice::new(), &mut StubLoader::default()).unwrap();
        let names: Vec<&str> = model.meshes().iter().map(Mesh::name).collect();
        assert_eq!(names, ["good"]);
    }

    #[test]
    fn test_incomplete_scene_is_an_error() {
        let scene = RawScene::default();
        let result = build(scene, &mut RecordingDevice::new(), &mut StubLoader::default());
        assert!(matches!(result, Err(ImportError::Incomplete { .. })));
    }

    #[test]
    fn test_vertices_take_first_uv_channel_or_zero() {
        let mut untextured = triangle("plain", None);
        untextured.tex_coords = None;
        let scene = RawScene {
            root: Some(node("root", vec![0, 1], Vec::new())),
            meshes: vec![triangle("uv", None), untextured],
            materials: Vec::new(),
        };
        let model = build(scene, &mut RecordingDevice::new(), &mut StubLoader::default()).unwrap();

        let uv = model.meshes()[0].vertices();
        // V is flipped by post-processing.
        assert_eq!(uv[1].tex_coords, [1.0, 1.0]);
        assert_eq!(uv[2].tex_coords, [0.0, 0.0]);
        assert_ne!(uv[0].tangent, [0.0; 3]);

        let plain = model.meshes()[1].vertices();
        assert!(plain.iter().all(|vertex| vertex.tex_coords == [0.0, 0.0]));
        assert!(plain.iter().all(|vertex| vertex.tangent == [0.0; 3]));
        assert!(plain.iter().all(|vertex| vertex.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_dropping_the_model_releases_everything() {
        let scene = RawScene {
            root: Some(node("root", vec![0, 1], Vec::new())),
            meshes: vec![triangle("a", Some(0)), triangle("b", Some(0))],
            materials: vec![material("m", &[(TextureSlot::Diffuse, "wood.png")])],
        };
        let mut device = RecordingDevice::new();
        let model = build(scene, &mut device, &mut StubLoader::default()).unwrap();
        assert_eq!(device.live_resources(), 3);

        drop(model);
        assert_eq!(device.live_resources(), 0);
    }
}
