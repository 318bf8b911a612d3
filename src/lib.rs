//! Render task graph compiler
//!
//! This crate lets a renderer declare, every frame, the render and compute tasks it wants to run together with the
//! transient GPU resources those tasks produce and consume. The declaration is compiled into a timeline that orders
//! the tasks, removes work that does not contribute to any output, and computes when each resource must be
//! allocated ("realized") and when it can be released again ("derealized"). Executing the graph replays this
//! timeline against a device.
//!
//! To get started, simply import everything
//! ```
//! use framegraph::*;
//! ```
//!
//! # Devices
//!
//! The graph does not know about any graphics API. Resources are allocated through a device collaborator that
//! implements [`Device`] and [`Realize`] for every resource kind it supports. Enabling the `vulkan` feature
//! provides a device over [`ash`](https://docs.rs/ash) and [`gpu-allocator`](https://docs.rs/gpu-allocator)
//! that realizes buffers and images.
//!
//! # Building a graph
//!
//! ```
//! use framegraph::*;
//! use anyhow::Result;
//!
//! #[derive(Debug, Clone)]
//! struct TextureInfo {
//!     width: u32,
//!     height: u32,
//! }
//!
//! struct Texture;
//!
//! impl Resource for Texture {
//!     type Description = TextureInfo;
//!     type Actual = u64;
//! }
//!
//! struct Gpu {
//!     next: u64,
//! }
//!
//! impl Device for Gpu {
//!     type Context = ();
//! }
//!
//! impl Realize<Texture> for Gpu {
//!     fn realize(&mut self, _name: &str, _description: &TextureInfo) -> Result<u64> {
//!         self.next += 1;
//!         Ok(self.next)
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let settings = SettingsBuilder::new().name("main").build();
//! let mut graph = Framegraph::<Gpu>::with_settings(settings);
//! let swapchain = graph.add_retained_resource::<Texture>("swapchain", None, Some(0));
//! let hdr = *graph
//!     .add_render_task(
//!         "scene",
//!         |builder| builder.create::<Texture>("hdr", TextureInfo { width: 1920, height: 1080 }),
//!         |_, _, _| Ok(()),
//!     )
//!     .data();
//! graph.add_render_task(
//!     "tonemap",
//!     |builder| {
//!         builder.read(hdr);
//!         builder.write(swapchain);
//!     },
//!     |_, _, _| Ok(()),
//! );
//! // Nobody consumes this, so it will be culled.
//! graph.add_render_task(
//!     "unused",
//!     |builder| builder.create::<Texture>("scratch", TextureInfo { width: 1, height: 1 }),
//!     |_, _, _| Ok(()),
//! );
//!
//! assert_eq!(graph.compile()?.len(), 2);
//! graph.execute(&mut Gpu { next: 0 }, &mut ())?;
//! # Ok(())
//! # }
//! ```
//!
//! For more details, see the [`graph`] module documentation.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod core;
pub mod graph;
#[cfg(feature = "vulkan")]
pub mod vulkan;
