use std::sync::Arc;

use vulkano::{
    buffer::{Buffer, BufferContents, BufferCreateInfo, BufferUsage, Subbuffer},
    command_buffer::{
        allocator::StandardCommandBufferAllocator, AutoCommandBufferBuilder, CommandBufferUsage,
        CopyBufferInfo, PrimaryAutoCommandBuffer,
    },
    device::Queue,
    memory::allocator::{AllocationCreateInfo, MemoryTypeFilter, StandardMemoryAllocator},
    sync::{self, GpuFuture},
};

use crate::DeviceError;

pub type UploadCommandBuffer = AutoCommandBufferBuilder<
    PrimaryAutoCommandBuffer<Arc<StandardCommandBufferAllocator>>,
    Arc<StandardCommandBufferAllocator>,
>;

/// Creates a host visible buffer holding `data`, to copy from.
pub fn new_staging_buffer<T>(
    memory_allocator: &Arc<StandardMemoryAllocator>,
    data: &[T],
) -> Result<Subbuffer<[T]>, DeviceError>
where
    T: BufferContents + Copy,
{
    Buffer::from_iter(
        memory_allocator.clone(),
        BufferCreateInfo {
            usage: BufferUsage::TRANSFER_SRC,
            ..Default::default()
        },
        AllocationCreateInfo {
            memory_type_filter: MemoryTypeFilter::PREFER_HOST
                | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
            ..Default::default()
        },
        data.iter().copied(),
    )
    .map_err(DeviceError::backend("allocate staging buffer"))
}

/// Starts a one-time command buffer on `queue`.
pub fn begin_upload(
    command_buffer_allocator: &Arc<StandardCommandBufferAllocator>,
    queue: &Arc<Queue>,
) -> Result<UploadCommandBuffer, DeviceError> {
    AutoCommandBufferBuilder::primary(
        command_buffer_allocator,
        queue.queue_family_index(),
        CommandBufferUsage::OneTimeSubmit,
    )
    .map_err(DeviceError::backend("begin upload"))
}

/// Submits `builder` and blocks until the device is done with it.
pub fn submit_and_wait(builder: UploadCommandBuffer, queue: &Arc<Queue>) -> Result<(), DeviceError> {
    let command_buffer = builder
        .build()
        .map_err(DeviceError::backend("build upload"))?;

    sync::now(queue.device().clone())
        .then_execute(queue.clone(), command_buffer)
        .map_err(DeviceError::backend("submit upload"))?
        .then_signal_fence_and_flush()
        .map_err(DeviceError::backend("flush upload"))?
        .wait(None)
        .map_err(DeviceError::backend("wait for upload"))
}

/// Copies `data` into a new device local buffer, waiting for the copy to
/// finish before returning.
pub fn send_to_device<T>(
    memory_allocator: &Arc<StandardMemoryAllocator>,
    command_buffer_allocator: &Arc<StandardCommandBufferAllocator>,
    queue: &Arc<Queue>,
    data: &[T],
    usage: BufferUsage,
) -> Result<Subbuffer<[T]>, DeviceError>
where
    T: BufferContents + Copy,
{
    let staging_buffer = new_staging_buffer(memory_allocator, data)?;

    let destination_buffer = Buffer::new_slice::<T>(
        memory_allocator.clone(),
        BufferCreateInfo {
            usage: usage | BufferUsage::TRANSFER_DST,
            ..Default::default()
        },
        AllocationCreateInfo {
            memory_type_filter: MemoryTypeFilter::PREFER_DEVICE,
            ..Default::default()
        },
        data.len() as u64,
    )
    .map_err(DeviceError::backend("allocate device buffer"))?;

    let mut builder = begin_upload(command_buffer_allocator, queue)?;
    builder
        .copy_buffer(CopyBufferInfo::buffers(
            staging_buffer,
            destination_buffer.clone(),
        ))
        .map_err(DeviceError::backend("copy buffer"))?;
    submit_and_wait(builder, queue)?;

    Ok(destination_buffer)
}
