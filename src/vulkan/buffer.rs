//! Transient Vulkan buffers.

use std::ffi::c_void;
use std::ptr::NonNull;

use anyhow::Result;
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};

use crate::graph::physical_resource::Realize;
use crate::graph::resource::Resource;
use crate::vulkan::VulkanDevice;

/// Where the memory of a realized resource should live.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MemoryType {
    /// Device local memory. This is where most transient resources should live.
    #[default]
    GpuOnly,
    /// Host visible memory, for uploads.
    CpuToGpu,
    /// Host visible and cached memory, for readbacks.
    GpuToCpu,
}

impl From<MemoryType> for gpu_allocator::MemoryLocation {
    fn from(value: MemoryType) -> Self {
        match value {
            MemoryType::GpuOnly => gpu_allocator::MemoryLocation::GpuOnly,
            MemoryType::CpuToGpu => gpu_allocator::MemoryLocation::CpuToGpu,
            MemoryType::GpuToCpu => gpu_allocator::MemoryLocation::GpuToCpu,
        }
    }
}

/// Resource kind for a [`VkBuffer`](vk::Buffer).
#[derive(Debug)]
pub struct Buffer;

/// Describes how a transient buffer is created.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferDescription {
    /// Size of the buffer in bytes.
    pub size: vk::DeviceSize,
    /// All usage flags the buffer is used with.
    pub usage: vk::BufferUsageFlags,
    /// Memory the buffer is bound to.
    pub memory: MemoryType,
}

/// A realized buffer. Must be returned to the [`VulkanDevice`] that created it, dropping it leaks the buffer.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct PhysicalBuffer {
    handle: vk::Buffer,
    size: vk::DeviceSize,
    #[derivative(Debug = "ignore")]
    allocation: Allocation,
}

impl PhysicalBuffer {
    /// Get the raw buffer handle.
    pub fn handle(&self) -> vk::Buffer {
        self.handle
    }

    /// Size of the buffer in bytes.
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// Pointer to the mapped memory, for buffers in host visible memory.
    pub fn mapped_ptr(&self) -> Option<NonNull<c_void>> {
        self.allocation.mapped_ptr()
    }
}

impl Resource for Buffer {
    type Description = BufferDescription;
    type Actual = PhysicalBuffer;
}

impl Realize<Buffer> for VulkanDevice {
    fn realize(&mut self, name: &str, description: &BufferDescription) -> Result<PhysicalBuffer> {
        let handle = unsafe {
            self.device.create_buffer(
                &vk::BufferCreateInfo {
                    s_type: vk::StructureType::BUFFER_CREATE_INFO,
                    p_next: std::ptr::null(),
                    flags: vk::BufferCreateFlags::empty(),
                    size: description.size,
                    usage: description.usage,
                    sharing_mode: vk::SharingMode::EXCLUSIVE,
                    queue_family_index_count: 0,
                    p_queue_family_indices: std::ptr::null(),
                },
                None,
            )?
        };
        #[cfg(feature = "log-objects")]
        trace!("Created new VkBuffer {handle:p} for `{name}` (size = {} bytes)", description.size);

        let requirements = unsafe { self.device.get_buffer_memory_requirements(handle) };
        let allocation = match self.allocator.allocate(&AllocationCreateDesc {
            name,
            requirements,
            location: description.memory.into(),
            linear: true,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        }) {
            Ok(allocation) => allocation,
            Err(error) => {
                unsafe { self.device.destroy_buffer(handle, None) };
                return Err(error.into());
            }
        };

        if let Err(error) = unsafe {
            self.device
                .bind_buffer_memory(handle, allocation.memory(), allocation.offset())
        } {
            unsafe { self.device.destroy_buffer(handle, None) };
            self.allocator.free(allocation)?;
            return Err(error.into());
        }

        Ok(PhysicalBuffer {
            handle,
            size: description.size,
            allocation,
        })
    }

    #[allow(unused_variables)]
    fn derealize(&mut self, name: &str, actual: PhysicalBuffer) -> Result<()> {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkBuffer {:p} of `{name}`", actual.handle);
        unsafe { self.device.destroy_buffer(actual.handle, None) };
        self.allocator.free(actual.allocation)?;
        Ok(())
    }
}
