//! Transient Vulkan images. Every realized image comes with a view over the whole image.

use anyhow::{bail, Result};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};

use crate::graph::physical_resource::Realize;
use crate::graph::resource::Resource;
use crate::vulkan::buffer::MemoryType;
use crate::vulkan::VulkanDevice;

/// Resource kind for a [`VkImage`](vk::Image).
#[derive(Debug)]
pub struct Image;

/// Describes how a transient image is created.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ImageDescription {
    /// Width in pixels of the image
    pub width: u32,
    /// Height in pixels of the image
    pub height: u32,
    /// Depth in pixels of the image, set to 1 for 2D images.
    pub depth: u32,
    /// Pixel format of the image
    pub format: vk::Format,
    /// Image usage flags
    pub usage: vk::ImageUsageFlags,
    /// MSAA samples
    pub samples: vk::SampleCountFlags,
    /// Number of mip levels. Set to 1 if not using mipmapping
    pub mip_levels: u32,
    /// Number of array layers. Set to 1 for non-array textures.
    pub layers: u32,
    /// Aspect of the view created for the image.
    pub aspect: vk::ImageAspectFlags,
}

impl ImageDescription {
    /// A single sampled 2D color attachment.
    pub fn color(width: u32, height: u32, format: vk::Format) -> Self {
        Self {
            width,
            height,
            depth: 1,
            format,
            usage: vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
            samples: vk::SampleCountFlags::TYPE_1,
            mip_levels: 1,
            layers: 1,
            aspect: vk::ImageAspectFlags::COLOR,
        }
    }

    /// A single sampled 2D depth attachment.
    pub fn depth(width: u32, height: u32, format: vk::Format) -> Self {
        Self {
            usage: vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
            aspect: vk::ImageAspectFlags::DEPTH,
            ..Self::color(width, height, format)
        }
    }

    /// The extent of the image.
    pub fn extent(&self) -> vk::Extent3D {
        vk::Extent3D {
            width: self.width,
            height: self.height,
            depth: self.depth,
        }
    }

    /// Derive the image type from the extent.
    /// # Errors
    /// - Fails if any dimension is zero.
    pub fn image_type(&self) -> Result<vk::ImageType> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            bail!("Image extents invalid");
        }
        Ok(if self.depth > 1 {
            vk::ImageType::TYPE_3D
        } else if self.height > 1 {
            vk::ImageType::TYPE_2D
        } else {
            vk::ImageType::TYPE_1D
        })
    }

    /// Derive the type of a view over the whole image.
    pub fn view_type(&self) -> Result<vk::ImageViewType> {
        Ok(match (self.image_type()?, self.layers > 1) {
            (vk::ImageType::TYPE_3D, _) => vk::ImageViewType::TYPE_3D,
            (vk::ImageType::TYPE_2D, false) => vk::ImageViewType::TYPE_2D,
            (vk::ImageType::TYPE_2D, true) => vk::ImageViewType::TYPE_2D_ARRAY,
            (_, false) => vk::ImageViewType::TYPE_1D,
            (_, true) => vk::ImageViewType::TYPE_1D_ARRAY,
        })
    }
}

/// A realized image with a view over all of its subresources. Must be returned to the [`VulkanDevice`] that
/// created it, dropping it leaks the image.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct PhysicalImage {
    handle: vk::Image,
    view: vk::ImageView,
    format: vk::Format,
    extent: vk::Extent3D,
    #[derivative(Debug = "ignore")]
    allocation: Allocation,
}

impl PhysicalImage {
    /// Get the raw image handle.
    pub fn handle(&self) -> vk::Image {
        self.handle
    }

    /// Get the view over the whole image.
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    /// Pixel format of the image.
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Size of the image.
    pub fn extent(&self) -> vk::Extent3D {
        self.extent
    }
}

impl Resource for Image {
    type Description = ImageDescription;
    type Actual = PhysicalImage;
}

impl Realize<Image> for VulkanDevice {
    fn realize(&mut self, name: &str, description: &ImageDescription) -> Result<PhysicalImage> {
        let image_type = description.image_type()?;
        let view_type = description.view_type()?;
        let extent = description.extent();

        let handle = unsafe {
            self.device.create_image(
                &vk::ImageCreateInfo {
                    s_type: vk::StructureType::IMAGE_CREATE_INFO,
                    p_next: std::ptr::null(),
                    flags: Default::default(),
                    image_type,
                    format: description.format,
                    extent,
                    mip_levels: description.mip_levels,
                    array_layers: description.layers,
                    samples: description.samples,
                    tiling: vk::ImageTiling::OPTIMAL,
                    usage: description.usage,
                    sharing_mode: vk::SharingMode::EXCLUSIVE,
                    queue_family_index_count: 0,
                    p_queue_family_indices: std::ptr::null(),
                    initial_layout: vk::ImageLayout::UNDEFINED,
                },
                None,
            )?
        };
        #[cfg(feature = "log-objects")]
        trace!("Created new VkImage {handle:p} for `{name}`");

        let requirements = unsafe { self.device.get_image_memory_requirements(handle) };
        let allocation = match self.allocator.allocate(&AllocationCreateDesc {
            name,
            requirements,
            location: MemoryType::GpuOnly.into(),
            linear: false,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        }) {
            Ok(allocation) => allocation,
            Err(error) => {
                unsafe { self.device.destroy_image(handle, None) };
                return Err(error.into());
            }
        };

        let view = unsafe {
            self.device
                .bind_image_memory(handle, allocation.memory(), allocation.offset())
                .and_then(|_| {
                    self.device.create_image_view(
                        &vk::ImageViewCreateInfo {
                            s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
                            p_next: std::ptr::null(),
                            flags: Default::default(),
                            image: handle,
                            view_type,
                            format: description.format,
                            components: vk::ComponentMapping::default(),
                            subresource_range: vk::ImageSubresourceRange {
                                aspect_mask: description.aspect,
                                base_mip_level: 0,
                                level_count: description.mip_levels,
                                base_array_layer: 0,
                                layer_count: description.layers,
                            },
                        },
                        None,
                    )
                })
        };
        let view = match view {
            Ok(view) => view,
            Err(error) => {
                unsafe { self.device.destroy_image(handle, None) };
                self.allocator.free(allocation)?;
                return Err(error.into());
            }
        };
        #[cfg(feature = "log-objects")]
        trace!("Created new VkImageView {view:p} for `{name}`");

        Ok(PhysicalImage {
            handle,
            view,
            format: description.format,
            extent,
            allocation,
        })
    }

    #[allow(unused_variables)]
    fn derealize(&mut self, name: &str, actual: PhysicalImage) -> Result<()> {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkImageView {:p} of `{name}`", actual.view);
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkImage {:p} of `{name}`", actual.handle);
        unsafe {
            self.device.destroy_image_view(actual.view, None);
            self.device.destroy_image(actual.handle, None);
        }
        self.allocator.free(actual.allocation)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_type_follows_extent() -> Result<()> {
        let mut description = ImageDescription::color(256, 1, vk::Format::R8_UNORM);
        assert_eq!(description.image_type()?, vk::ImageType::TYPE_1D);
        description.height = 256;
        assert_eq!(description.image_type()?, vk::ImageType::TYPE_2D);
        description.depth = 4;
        assert_eq!(description.image_type()?, vk::ImageType::TYPE_3D);
        assert_eq!(description.view_type()?, vk::ImageViewType::TYPE_3D);
        Ok(())
    }

    #[test]
    fn layered_images_get_array_views() -> Result<()> {
        let mut description = ImageDescription::depth(1024, 1024, vk::Format::D32_SFLOAT);
        description.layers = 6;
        assert_eq!(description.aspect, vk::ImageAspectFlags::DEPTH);
        assert_eq!(description.view_type()?, vk::ImageViewType::TYPE_2D_ARRAY);
        Ok(())
    }

    #[test]
    fn empty_extent_is_rejected() {
        let description = ImageDescription::color(0, 16, vk::Format::R8_UNORM);
        assert!(description.image_type().is_err());
    }
}
