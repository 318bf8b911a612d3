//! A Vulkan device collaborator, built on [`ash`] and [`gpu_allocator`]. Only available with the `vulkan` feature.
//!
//! [`VulkanDevice`] realizes [`Buffer`] and [`Image`] resources by creating the Vulkan objects and binding memory
//! from a `gpu-allocator` allocator. Task executors receive the [`vk::CommandBuffer`] that the graph is executed with.
//!
//! # Example
//! ```no_run
//! # use framegraph::*;
//! # use anyhow::Result;
//! # fn record(device: ash::Device, allocator: gpu_allocator::vulkan::Allocator, cmd: vk::CommandBuffer) -> Result<()> {
//! let mut device = VulkanDevice::new(device, allocator);
//! let mut graph = Framegraph::<VulkanDevice>::new();
//! let image = *graph
//!     .add_render_task(
//!         "offscreen",
//!         |builder| builder.create::<Image>("offscreen", ImageDescription::color(1920, 1080, vk::Format::R8G8B8A8_SRGB)),
//!         |_, _, _| Ok(()),
//!     )
//!     .data();
//! graph.add_render_task(
//!     "blit",
//!     |builder| builder.read(image),
//!     |image, resources, _cmd| {
//!         let _view = resources.get(*image)?.view();
//!         // Record commands into `_cmd` here.
//!         Ok(())
//!     },
//! );
//! graph.compile()?;
//! let mut cmd = cmd;
//! graph.execute(&mut device, &mut cmd)?;
//! # Ok(())
//! # }
//! ```

use std::ffi::CString;

use ash::extensions::ext::DebugUtils;
use gpu_allocator::vulkan::Allocator;

use crate::graph::physical_resource::Device;

pub use ash::vk;

pub use buffer::{Buffer, BufferDescription, MemoryType, PhysicalBuffer};
pub use image::{Image, ImageDescription, PhysicalImage};

pub mod buffer;
pub mod image;

/// Realizes framegraph resources as Vulkan objects.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct VulkanDevice {
    #[derivative(Debug = "ignore")]
    pub(crate) device: ash::Device,
    #[derivative(Debug = "ignore")]
    pub(crate) allocator: Allocator,
    #[derivative(Debug = "ignore")]
    debug_utils: Option<DebugUtils>,
}

impl VulkanDevice {
    /// Create a new device collaborator. The allocator must have been created for `device`.
    pub fn new(device: ash::Device, allocator: Allocator) -> Self {
        Self {
            device,
            allocator,
            debug_utils: None,
        }
    }

    /// Insert a debug label around every task, which shows up in graphics debuggers like
    /// [*RenderDoc*](https://renderdoc.org/). Requires the `debug-markers` feature.
    pub fn with_debug_utils(mut self, debug_utils: DebugUtils) -> Self {
        self.debug_utils = Some(debug_utils);
        self
    }

    /// Get the wrapped logical device.
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    /// Get the allocator used for resource memory.
    pub fn allocator(&mut self) -> &mut Allocator {
        &mut self.allocator
    }
}

impl Device for VulkanDevice {
    type Context = vk::CommandBuffer;

    fn begin_task(&mut self, context: &mut vk::CommandBuffer, name: &str) {
        let Some(debug_utils) = &self.debug_utils else {
            return;
        };
        let Ok(name) = CString::new(name) else {
            return;
        };
        let label = vk::DebugUtilsLabelEXT {
            s_type: vk::StructureType::DEBUG_UTILS_LABEL_EXT,
            p_next: std::ptr::null(),
            p_label_name: name.as_ptr(),
            color: [1.0, 1.0, 1.0, 1.0],
        };
        // SAFETY: The label name outlives this call, and `context` is a command buffer in the recording state.
        unsafe {
            debug_utils.cmd_begin_debug_utils_label(*context, &label);
        }
    }

    fn end_task(&mut self, context: &mut vk::CommandBuffer, name: &str) {
        let Some(debug_utils) = &self.debug_utils else {
            return;
        };
        // No label was opened for names that are not valid C strings.
        if name.contains('\0') {
            return;
        }
        // SAFETY: A label was opened on this command buffer in `begin_task()`.
        unsafe {
            debug_utils.cmd_end_debug_utils_label(*context);
        }
    }
}
