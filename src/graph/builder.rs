//! Exposes the [`RenderTaskBuilder`], the only way to declare the dependencies of a render task.
//!
//! A builder is handed to the setup closure of [`Framegraph::add_render_task()`](crate::Framegraph::add_render_task)
//! and is bound to that single task. It cannot outlive the setup call, so dependencies can only be added while
//! the task is being registered.
//!
//! # Example
//! ```
//! # use framegraph::*;
//! # use anyhow::Result;
//! # #[derive(Debug, Clone)]
//! # struct Info;
//! # struct Buffer;
//! # impl Resource for Buffer {
//! #     type Description = Info;
//! #     type Actual = ();
//! # }
//! # struct Host;
//! # impl Device for Host { type Context = (); }
//! # impl Realize<Buffer> for Host {
//! #     fn realize(&mut self, _: &str, _: &Info) -> Result<()> { Ok(()) }
//! # }
//! let mut graph = Framegraph::<Host>::new();
//! let depth = *graph
//!     .add_render_task("depth prepass", |builder| builder.create::<Buffer>("depth", Info), |_, _, _| Ok(()))
//!     .data();
//! graph.add_render_task_with(
//!     "lighting",
//!     |builder| {
//!         builder.read(depth);
//!         builder.side_effect();
//!     },
//!     EmptyTaskExecutor::new(),
//! );
//! ```

use slotmap::SecondaryMap;

use crate::graph::physical_resource::{Device, Realize, Realizer};
use crate::graph::resource::{Resource, ResourceArena, ResourceKey, ResourceNode};
use crate::graph::task::{RenderTaskBase, TaskId};
use crate::graph::virtual_resource::VirtualResource;

/// Declares the resources a render task creates, reads and writes.
pub struct RenderTaskBuilder<'a, D: Device> {
    task: &'a mut RenderTaskBase,
    resources: &'a mut ResourceArena,
    realizers: &'a mut SecondaryMap<ResourceKey, Realizer<D>>,
}

impl<'a, D: Device> RenderTaskBuilder<'a, D> {
    pub(crate) fn new(
        task: &'a mut RenderTaskBase,
        resources: &'a mut ResourceArena,
        realizers: &'a mut SecondaryMap<ResourceKey, Realizer<D>>,
    ) -> Self {
        Self {
            task,
            resources,
            realizers,
        }
    }

    /// Id of the task being built.
    pub fn id(&self) -> TaskId {
        self.task.id
    }

    /// Name of the task being built.
    pub fn name(&self) -> &str {
        &self.task.name
    }

    /// Create a new transient resource owned by this task. The resource is realized right before this task
    /// executes, and derealized after the last task that uses it.
    pub fn create<R: Resource>(&mut self, name: impl Into<String>, description: R::Description) -> VirtualResource<R>
    where
        D: Realize<R>, {
        let id = self
            .resources
            .insert(ResourceNode::transient::<R>(name.into(), self.task.id, description));
        self.realizers.insert(id.key(), Realizer::new::<R>());
        self.task.creates.push(id);
        VirtualResource::new(id)
    }

    /// Declare that this task reads a resource. Returns the handle so calls can be chained.
    pub fn read<R: Resource>(&mut self, resource: VirtualResource<R>) -> VirtualResource<R> {
        let id = resource.id();
        if self.task.creates.contains(&id) || self.task.reads.contains(&id) {
            return resource;
        }
        self.task.reads.push(id);
        // Ids this graph did not issue are kept on the task so compilation can report them as dangling.
        if let Some(node) = self.resources.get_mut(id) {
            node.readers.push(self.task.id);
        }
        resource
    }

    /// Declare that this task writes a resource. Returns the handle so calls can be chained.
    pub fn write<R: Resource>(&mut self, resource: VirtualResource<R>) -> VirtualResource<R> {
        let id = resource.id();
        if self.task.creates.contains(&id) || self.task.writes.contains(&id) {
            return resource;
        }
        self.task.writes.push(id);
        if let Some(node) = self.resources.get_mut(id) {
            node.writers.push(self.task.id);
        }
        resource
    }

    /// Mark this task as having an effect outside the graph. Such a task is never culled.
    pub fn side_effect(&mut self) -> &mut Self {
        self.task.side_effect = true;
        self
    }
}
