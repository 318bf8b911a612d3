pub use crate::core::error::Error;
pub use crate::core::settings::{FramegraphSettings, SettingsBuilder};

pub use crate::graph::builder::RenderTaskBuilder;
pub use crate::graph::compile::{Lifetime, Timeline, TimelineStep};
pub use crate::graph::framegraph::Framegraph;
pub use crate::graph::graphviz::GraphViz;
pub use crate::graph::physical_resource::{Device, PhysicalResources, Realize};
pub use crate::graph::resource::{Resource, ResourceArena, ResourceId, ResourceNode};
pub use crate::graph::task::{EmptyTaskExecutor, RenderTask, RenderTaskBase, TaskExecutor, TaskId};
pub use crate::graph::virtual_resource::VirtualResource;

#[cfg(feature = "vulkan")]
pub use crate::vulkan::*;
