//! The framegraph compiles a set of render tasks and the transient resources they produce and consume into an ordered
//! timeline, and then replays that timeline against a device. Resources are only described while the graph is built.
//! They are realized right before the first task that needs them and derealized right after the last one, so
//! memory is only held while it is in use.
//!
//! Each task declares its dependencies in a setup closure through a [`RenderTaskBuilder`]. Compiling the graph
//! culls every task that does not contribute to an observable output, such as a task with a side effect or a task
//! writing a retained resource. Through the [`GraphViz`] trait, it's possible to export a graphviz-compatible dot
//! file to display the graph.
//!
//! # Example
//!
//! ```
//! use framegraph::*;
//! use anyhow::Result;
//!
//! #[derive(Debug, Clone)]
//! struct BufferInfo {
//!     size: usize,
//! }
//!
//! struct Buffer;
//!
//! impl Resource for Buffer {
//!     type Description = BufferInfo;
//!     type Actual = Vec<u8>;
//! }
//!
//! // A device that allocates buffers in host memory, and records commands as strings.
//! struct HostDevice;
//!
//! impl Device for HostDevice {
//!     type Context = Vec<String>;
//! }
//!
//! impl Realize<Buffer> for HostDevice {
//!     fn realize(&mut self, _name: &str, description: &BufferInfo) -> Result<Vec<u8>> {
//!         Ok(vec![0; description.size])
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let mut graph = Framegraph::<HostDevice>::new();
//! let gbuffer = *graph
//!     .add_render_task(
//!         "gbuffer",
//!         |builder| builder.create::<Buffer>("gbuffer", BufferInfo { size: 64 }),
//!         |_, _, commands| {
//!             commands.push(String::from("draw scene"));
//!             Ok(())
//!         },
//!     )
//!     .data();
//! graph.add_render_task(
//!     "lighting",
//!     |builder| builder.read(gbuffer),
//!     |gbuffer, resources, commands| {
//!         let buffer = resources.get(*gbuffer)?;
//!         commands.push(format!("shade {} bytes", buffer.len()));
//!         Ok(())
//!     },
//! );
//!
//! let timeline = graph.compile()?;
//! assert_eq!(timeline.len(), 2);
//!
//! let mut commands = Vec::new();
//! graph.execute(&mut HostDevice, &mut commands)?;
//! assert_eq!(commands, vec!["draw scene", "shade 64 bytes"]);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod compile;
pub mod execute;
pub mod framegraph;
pub mod graphviz;
pub mod physical_resource;
pub mod resource;
pub mod task;
pub mod virtual_resource;
