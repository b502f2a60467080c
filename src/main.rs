//! Model viewer
//!
//! Loads a model headlessly, then steers a camera around it for a few frames.

mod config;
mod fly_through;

use anyhow::Context;
use mv_engine::control::camera::{first_person::FirstPerson, Camera, CameraConfig};
use mv_engine::control::InputState;
use mv_engine::device::recording::{RecordingDevice, RecordingShader};
use mv_engine::device::vulkan::{DrawList, VulkanDevice};
use mv_engine::device::{GpuDevice, ShaderContext};
use mv_engine::scene::Model;
use mv_engine::texture::FileTextureLoader;

use config::ViewerConfig;
use fly_through::FlyThrough;

/// Simulated frame time of the fly-through.
const FRAME_SECONDS: f32 = 1.0 / 60.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(if cfg!(debug_assertions) {
            tracing::Level::TRACE
        } else {
            tracing::Level::INFO
        })
        .init();

    let config = ViewerConfig::from_args(std::env::args().skip(1))?;

    let draws = if config.dry_run {
        let mut device = RecordingDevice::new();
        let draws = view(&config, &mut device, &mut RecordingShader::new())?;
        tracing::info!(
            "Dry run: {} geometry and {} texture uploads",
            device.geometry_uploads(),
            device.texture_uploads()
        );
        draws
    } else {
        let mut device = VulkanDevice::new().context("no usable Vulkan device")?;
        let mut draw_list = DrawList::new();
        let draws = view(&config, &mut device, &mut draw_list)?;
        tracing::debug!("Recorded {} draw calls", draw_list.calls().len());
        draws
    };

    tracing::info!("Done after {draws} mesh draws");
    Ok(())
}

/// Imports the model and flies the camera around it, drawing every frame.
/// Returns the number of meshes drawn in total.
fn view<D, S>(config: &ViewerConfig, device: &mut D, shader: &mut S) -> anyhow::Result<usize>
where
    D: GpuDevice,
    S: ShaderContext<D>,
{
    let model = Model::try_load(&config.model, device, &mut FileTextureLoader)
        .with_context(|| format!("failed to load {}", config.model.display()))?;
    anyhow::ensure!(
        !model.is_empty(),
        "{} has no mesh to draw",
        config.model.display()
    );

    let vertex_count: usize = model.meshes().iter().map(|mesh| mesh.vertices().len()).sum();
    tracing::info!(
        "{}: {} meshes, {vertex_count} vertices, {} textures",
        config.model.display(),
        model.meshes().len(),
        model.textures_loaded().len()
    );

    let mut camera =
        FirstPerson::new(CameraConfig::default().with_position(glam::vec3(0.0, 0.0, 3.0)));
    let mut input_state = InputState::new(vec![Box::new(FlyThrough::new(config.frames))]);

    let mut draws = 0;
    for frame in 0..config.frames {
        input_state.update_with_delta(&mut camera, FRAME_SECONDS);

        let view_projection = camera.projection_matrix(config.aspect_ratio(), Z_NEAR, Z_FAR)
            * camera.view_matrix();
        tracing::trace!(
            "Frame {frame}: camera at {} looking {}, origin projects to {}",
            camera.position(),
            camera.front(),
            view_projection.project_point3(glam::Vec3::ZERO)
        );

        model.draw(shader);
        draws += model.meshes().len();
    }

    tracing::info!(
        "Camera ended at {} with yaw {:.1}, pitch {:.1}, zoom {:.1}",
        camera.position(),
        camera.yaw(),
        camera.pitch(),
        camera.zoom()
    );
    Ok(draws)
}
