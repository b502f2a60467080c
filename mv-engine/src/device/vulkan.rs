//! A headless vulkano backend.
//!
//! Geometry and textures are uploaded through staging buffers and waited on,
//! so a handle is usable as soon as it is returned. Drawing is left to the
//! caller's pipeline: [`DrawList`] collects what meshes ask for and records it
//! into a command buffer once the pipeline is bound.

use std::collections::HashMap;
use std::sync::Arc;

use vulkano::{
    buffer::{BufferUsage, Subbuffer},
    command_buffer::{
        allocator::{
            CommandBufferAllocator, StandardCommandBufferAllocator,
            StandardCommandBufferAllocatorCreateInfo,
        },
        AutoCommandBufferBuilder, BlitImageInfo, CopyBufferToImageInfo, ImageBlit,
    },
    descriptor_set::{
        allocator::{StandardDescriptorSetAllocator, StandardDescriptorSetAllocatorCreateInfo},
        PersistentDescriptorSet, WriteDescriptorSet,
    },
    device::{
        physical::{PhysicalDevice, PhysicalDeviceType},
        Device, DeviceCreateInfo, DeviceExtensions, Features, Queue, QueueCreateInfo, QueueFlags,
    },
    format::Format,
    image::{
        sampler::{
            Filter as VkFilter, Sampler, SamplerAddressMode, SamplerCreateInfo, SamplerMipmapMode,
            LOD_CLAMP_NONE,
        },
        view::ImageView,
        Image, ImageAspects, ImageCreateInfo, ImageLayout, ImageSubresourceLayers, ImageType,
        ImageUsage,
    },
    instance::{Instance, InstanceCreateInfo},
    memory::allocator::{AllocationCreateInfo, StandardMemoryAllocator},
    pipeline::{PipelineBindPoint, PipelineLayout},
    Version, VulkanLibrary,
};

use super::{Filter, GpuDevice, Sampling, ShaderContext, Wrap};
use crate::buffer;
use crate::scene::Vertex;
use crate::texture::{DecodedImage, PixelFormat};
use crate::DeviceError;

#[derive(Debug)]
pub struct VulkanDevice {
    device: Arc<Device>,
    queue: Arc<Queue>,
    memory_allocator: Arc<StandardMemoryAllocator>,
    command_buffer_allocator: Arc<StandardCommandBufferAllocator>,
    descriptor_set_allocator: Arc<StandardDescriptorSetAllocator>,
}

impl VulkanDevice {
    /// Picks the best graphics capable device, without any surface.
    pub fn new() -> Result<Self, DeviceError> {
        let library = VulkanLibrary::new().map_err(DeviceError::backend("load Vulkan"))?;

        tracing::debug!("Vulkan library loaded");

        let instance = Instance::new(
            library,
            InstanceCreateInfo {
                application_version: Version::major_minor(0, 1),
                ..Default::default()
            },
        )
        .map_err(DeviceError::backend("create instance"))?;

        let physical_device = instance
            .enumerate_physical_devices()
            .map_err(DeviceError::backend("enumerate devices"))?
            .filter(|p| graphics_queue_family(p).is_some())
            .min_by_key(|p| match p.properties().device_type {
                PhysicalDeviceType::DiscreteGpu => 1,
                PhysicalDeviceType::IntegratedGpu => 2,
                PhysicalDeviceType::VirtualGpu => 3,
                PhysicalDeviceType::Cpu => 4,
                PhysicalDeviceType::Other => 5,
                _ => 6,
            })
            .ok_or_else(|| DeviceError::new("select device", "no graphics capable device"))?;

        tracing::info!("Using device {}", physical_device.properties().device_name);

        let (device, queue) = Self::create_device(physical_device)?;

        tracing::debug!("Vulkan device created");

        Ok(Self {
            memory_allocator: Arc::new(StandardMemoryAllocator::new_default(device.clone())),
            command_buffer_allocator: Arc::new(StandardCommandBufferAllocator::new(
                device.clone(),
                StandardCommandBufferAllocatorCreateInfo::default(),
            )),
            descriptor_set_allocator: Arc::new(StandardDescriptorSetAllocator::new(
                device.clone(),
                StandardDescriptorSetAllocatorCreateInfo::default(),
            )),
            device,
            queue,
        })
    }

    fn create_device(
        physical_device: Arc<PhysicalDevice>,
    ) -> Result<(Arc<Device>, Arc<Queue>), DeviceError> {
        let queue_family_index = graphics_queue_family(&physical_device)
            .ok_or_else(|| DeviceError::new("create device", "no graphics queue"))?;

        let (device, mut queues) = Device::new(
            physical_device,
            DeviceCreateInfo {
                queue_create_infos: vec![QueueCreateInfo {
                    queue_family_index,
                    ..Default::default()
                }],
                enabled_extensions: DeviceExtensions::empty(),
                enabled_features: Features::empty(),
                ..Default::default()
            },
        )
        .map_err(DeviceError::backend("create device"))?;

        let queue = queues
            .next()
            .ok_or_else(|| DeviceError::new("create device", "no queue returned"))?;

        Ok((device, queue))
    }

    #[must_use]
    pub const fn device(&self) -> &Arc<Device> {
        &self.device
    }

    #[must_use]
    pub const fn queue(&self) -> &Arc<Queue> {
        &self.queue
    }

    #[must_use]
    pub const fn memory_allocator(&self) -> &Arc<StandardMemoryAllocator> {
        &self.memory_allocator
    }

    #[must_use]
    pub const fn command_buffer_allocator(&self) -> &Arc<StandardCommandBufferAllocator> {
        &self.command_buffer_allocator
    }

    #[must_use]
    pub const fn descriptor_set_allocator(&self) -> &Arc<StandardDescriptorSetAllocator> {
        &self.descriptor_set_allocator
    }

    fn create_image(&self, image: &DecodedImage, mip_levels: u32) -> Result<Arc<Image>, DeviceError> {
        let format = match image.format() {
            PixelFormat::R8 => Format::R8_UNORM,
            PixelFormat::Rg8 => Format::R8G8_UNORM,
            // Three channel formats are rarely sampleable, they are expanded.
            PixelFormat::Rgb8 | PixelFormat::Rgba8 => Format::R8G8B8A8_UNORM,
        };

        Image::new(
            self.memory_allocator.clone(),
            ImageCreateInfo {
                image_type: ImageType::Dim2d,
                format,
                extent: [image.width(), image.height(), 1],
                mip_levels,
                usage: ImageUsage::TRANSFER_SRC | ImageUsage::TRANSFER_DST | ImageUsage::SAMPLED,
                ..Default::default()
            },
            AllocationCreateInfo::default(),
        )
        .map_err(DeviceError::backend("create image"))
    }

    fn create_sampler(&self, sampling: Sampling, mipmaps: bool) -> Result<Arc<Sampler>, DeviceError> {
        let address_mode = match sampling.wrap {
            Wrap::Repeat => SamplerAddressMode::Repeat,
            Wrap::ClampToEdge => SamplerAddressMode::ClampToEdge,
        };
        let (min_filter, mipmap_mode) = match sampling.min_filter {
            Filter::Nearest => (VkFilter::Nearest, SamplerMipmapMode::Nearest),
            Filter::Linear => (VkFilter::Linear, SamplerMipmapMode::Nearest),
            Filter::LinearMipmapLinear => (VkFilter::Linear, SamplerMipmapMode::Linear),
        };
        let mag_filter = match sampling.mag_filter {
            Filter::Nearest => VkFilter::Nearest,
            Filter::Linear | Filter::LinearMipmapLinear => VkFilter::Linear,
        };

        Sampler::new(
            self.device.clone(),
            SamplerCreateInfo {
                mag_filter,
                min_filter,
                mipmap_mode,
                address_mode: [address_mode; 3],
                lod: if mipmaps { 0.0..=LOD_CLAMP_NONE } else { 0.0..=0.0 },
                ..Default::default()
            },
        )
        .map_err(DeviceError::backend("create sampler"))
    }
}

fn graphics_queue_family(physical_device: &PhysicalDevice) -> Option<u32> {
    physical_device
        .queue_family_properties()
        .iter()
        .position(|q| q.queue_flags.intersects(QueueFlags::GRAPHICS))
        .and_then(|i| u32::try_from(i).ok())
}

/// Records blits that fill every mip level of `image` from the one above it.
fn blit_mip_chain<L, A>(
    builder: &mut AutoCommandBufferBuilder<L, A>,
    image: &Arc<Image>,
) -> Result<(), DeviceError>
where
    A: CommandBufferAllocator,
{
    let [width, height, _] = image.extent();
    let level = |mip_level| ImageSubresourceLayers {
        aspects: ImageAspects::COLOR,
        mip_level,
        array_layers: 0..1,
    };
    let extent_at = |mip_level: u32| [(width >> mip_level).max(1), (height >> mip_level).max(1), 1];

    for mip_level in 1..image.mip_levels() {
        builder
            .blit_image(BlitImageInfo {
                src_image_layout: ImageLayout::General,
                dst_image_layout: ImageLayout::General,
                regions: [ImageBlit {
                    src_subresource: level(mip_level - 1),
                    src_offsets: [[0; 3], extent_at(mip_level - 1)],
                    dst_subresource: level(mip_level),
                    dst_offsets: [[0; 3], extent_at(mip_level)],
                    ..Default::default()
                }]
                .into(),
                filter: VkFilter::Linear,
                ..BlitImageInfo::images(image.clone(), image.clone())
            })
            .map_err(DeviceError::backend("blit mip level"))?;
    }
    Ok(())
}

/// Device local vertex and index buffers of one mesh.
#[derive(Debug)]
pub struct VulkanGeometry {
    /// `None` for meshes without any triangle.
    buffers: Option<(Subbuffer<[u8]>, Subbuffer<[u32]>)>,
}

/// A sampled image, shared between the meshes that use it.
#[derive(Debug, Clone)]
pub struct VulkanTexture {
    pub view: Arc<ImageView>,
    pub sampler: Arc<Sampler>,
}

impl GpuDevice for VulkanDevice {
    type Geometry = VulkanGeometry;
    type Texture = VulkanTexture;

    fn upload_geometry(
        &mut self,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<Self::Geometry, DeviceError> {
        if vertices.is_empty() || indices.is_empty() {
            return Ok(VulkanGeometry { buffers: None });
        }

        let vertex_buffer = buffer::send_to_device(
            &self.memory_allocator,
            &self.command_buffer_allocator,
            &self.queue,
            bytemuck::cast_slice::<Vertex, u8>(vertices),
            BufferUsage::VERTEX_BUFFER,
        )?;
        let index_buffer = buffer::send_to_device(
            &self.memory_allocator,
            &self.command_buffer_allocator,
            &self.queue,
            indices,
            BufferUsage::INDEX_BUFFER,
        )?;

        Ok(VulkanGeometry {
            buffers: Some((vertex_buffer, index_buffer)),
        })
    }

    fn upload_texture(
        &mut self,
        image: &DecodedImage,
        sampling: Sampling,
    ) -> Result<Self::Texture, DeviceError> {
        let mip_levels = if sampling.mipmaps { image.mip_levels() } else { 1 };
        let pixels = match image.format() {
            PixelFormat::Rgb8 => image.to_rgba8(),
            _ => image.pixels().into(),
        };

        let staging_buffer = buffer::new_staging_buffer(&self.memory_allocator, &*pixels)?;
        let gpu_image = self.create_image(image, mip_levels)?;

        let mut builder = buffer::begin_upload(&self.command_buffer_allocator, &self.queue)?;
        builder
            .copy_buffer_to_image(CopyBufferToImageInfo::buffer_image(
                staging_buffer,
                gpu_image.clone(),
            ))
            .map_err(DeviceError::backend("copy image"))?;
        blit_mip_chain(&mut builder, &gpu_image)?;
        buffer::submit_and_wait(builder, &self.queue)?;

        tracing::trace!(
            "Uploaded {}x{} {:?} texture with {mip_levels} mip levels",
            image.width(),
            image.height(),
            image.format()
        );

        Ok(VulkanTexture {
            view: ImageView::new_default(gpu_image).map_err(DeviceError::backend("create view"))?,
            sampler: self.create_sampler(sampling, mip_levels > 1)?,
        })
    }
}

#[derive(Debug, Clone)]
struct TextureBinding {
    unit: u32,
    uniform: String,
    texture: VulkanTexture,
}

/// One indexed draw with the textures bound just before it.
#[derive(Debug, Clone)]
pub struct DrawCall {
    vertices: Subbuffer<[u8]>,
    indices: Subbuffer<[u32]>,
    index_count: u32,
    textures: Vec<TextureBinding>,
}

impl DrawCall {
    #[must_use]
    pub const fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Sampler uniforms this draw expects, with their texture unit.
    pub fn uniforms(&self) -> impl Iterator<Item = (u32, &str)> {
        self.textures
            .iter()
            .map(|binding| (binding.unit, binding.uniform.as_str()))
    }

    /// Descriptor writes for every texture whose uniform `binding_of` knows.
    pub fn descriptor_writes(
        &self,
        binding_of: impl Fn(&str) -> Option<u32>,
    ) -> Vec<WriteDescriptorSet> {
        self.textures
            .iter()
            .filter_map(|binding| {
                let Some(index) = binding_of(&binding.uniform) else {
                    tracing::trace!("Shader has no sampler named {}", binding.uniform);
                    return None;
                };
                Some(WriteDescriptorSet::image_view_sampler(
                    index,
                    binding.texture.view.clone(),
                    binding.texture.sampler.clone(),
                ))
            })
            .collect()
    }
}

/// Collects the draws of one frame, to be recorded against a graphics
/// pipeline whose first descriptor set holds the material samplers.
#[derive(Debug, Default)]
pub struct DrawList {
    pending: Vec<TextureBinding>,
    calls: Vec<DrawCall>,
}

impl DrawList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.calls.clear();
    }

    /// Records every draw into `builder`. The pipeline using `layout` must
    /// already be bound, and `bindings` maps sampler names to their binding
    /// in set 0.
    pub fn record<L, A>(
        &self,
        builder: &mut AutoCommandBufferBuilder<L, A>,
        device: &VulkanDevice,
        layout: &Arc<PipelineLayout>,
        bindings: &HashMap<String, u32>,
    ) -> Result<(), DeviceError>
    where
        A: CommandBufferAllocator,
    {
        let set_layout = layout
            .set_layouts()
            .first()
            .ok_or_else(|| DeviceError::new("record draws", "pipeline has no descriptor set"))?;

        for call in &self.calls {
            let descriptor_set = PersistentDescriptorSet::new(
                device.descriptor_set_allocator(),
                set_layout.clone(),
                call.descriptor_writes(|uniform| bindings.get(uniform).copied()),
                [],
            )
            .map_err(DeviceError::backend("create descriptor set"))?;

            builder
                .bind_descriptor_sets(
                    PipelineBindPoint::Graphics,
                    layout.clone(),
                    0,
                    vec![descriptor_set],
                )
                .map_err(DeviceError::backend("bind textures"))?
                .bind_vertex_buffers(0, call.vertices.clone())
                .map_err(DeviceError::backend("bind vertices"))?
                .bind_index_buffer(call.indices.clone())
                .map_err(DeviceError::backend("bind indices"))?
                .draw_indexed(call.index_count, 1, 0, 0, 0)
                .map_err(DeviceError::backend("draw"))?;
        }
        Ok(())
    }
}

impl ShaderContext<VulkanDevice> for DrawList {
    fn bind_texture(&mut self, unit: u32, uniform: &str, texture: &VulkanTexture) {
        self.pending.retain(|binding| binding.unit != unit);
        self.pending.push(TextureBinding {
            unit,
            uniform: uniform.to_owned(),
            texture: texture.clone(),
        });
    }

    fn draw_indexed(&mut self, geometry: &VulkanGeometry, index_count: u32) {
        let textures = std::mem::take(&mut self.pending);
        if let Some((vertices, indices)) = &geometry.buffers {
            self.calls.push(DrawCall {
                vertices: vertices.clone(),
                indices: indices.clone(),
                index_count,
                textures,
            });
        }
    }
}
