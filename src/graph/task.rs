//! Render tasks and their executors.
//!
//! A render task is a unit of work with a setup phase and an execute phase. The setup phase runs once, immediately
//! when the task is added with [`Framegraph::add_render_task()`](crate::Framegraph::add_render_task). It declares
//! the resources the task creates, reads and writes through a [`RenderTaskBuilder`](crate::RenderTaskBuilder), and
//! returns the task payload. The execute phase runs every time the compiled graph is executed, and receives the
//! payload, the realized resources and the command recording context of the device.

use std::any::Any;
use std::fmt;
use std::ops::Deref;

use anyhow::Result;

use crate::graph::physical_resource::PhysicalResources;
use crate::graph::resource::{ResourceArena, ResourceId};

/// Identifies a task inside a framegraph. This is the index of the task in registration order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u32);

impl TaskId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Registration index of this task.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The type independent part of a render task: its name and its dependencies.
#[derive(Debug, Clone)]
pub struct RenderTaskBase {
    pub(crate) id: TaskId,
    pub(crate) name: String,
    pub(crate) creates: Vec<ResourceId>,
    pub(crate) reads: Vec<ResourceId>,
    pub(crate) writes: Vec<ResourceId>,
    pub(crate) side_effect: bool,
}

impl RenderTaskBase {
    pub(crate) fn new(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            creates: vec![],
            reads: vec![],
            writes: vec![],
            side_effect: false,
        }
    }

    /// Get the task id
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Get the task name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resources created by this task, in declaration order.
    pub fn creates(&self) -> &[ResourceId] {
        &self.creates
    }

    /// Resources read by this task, in declaration order.
    pub fn reads(&self) -> &[ResourceId] {
        &self.reads
    }

    /// Resources written by this task, in declaration order. Never contains a resource the task created.
    pub fn writes(&self) -> &[ResourceId] {
        &self.writes
    }

    /// Whether this task has an effect outside of the graph, and can therefore never be culled.
    pub fn has_side_effect(&self) -> bool {
        self.side_effect
    }

    /// Whether this task declared the resource in any way.
    pub fn uses(&self, resource: ResourceId) -> bool {
        self.creates.contains(&resource) || self.reads.contains(&resource) || self.writes.contains(&resource)
    }

    /// All resources this task produces, created ones first.
    pub fn outputs(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.creates.iter().chain(self.writes.iter()).copied()
    }

    /// All resources this task touches. A resource may be yielded more than once if it is both read and written.
    pub(crate) fn resources(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.creates
            .iter()
            .chain(self.reads.iter())
            .chain(self.writes.iter())
            .copied()
    }
}

/// A render task with its payload. Dereferences to its [`RenderTaskBase`].
#[derive(Debug)]
pub struct RenderTask<T> {
    pub(crate) base: RenderTaskBase,
    pub(crate) data: T,
}

impl<T> RenderTask<T> {
    /// Get the payload returned by the setup closure.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Get the type independent part of this task.
    pub fn base(&self) -> &RenderTaskBase {
        &self.base
    }
}

impl<T> Deref for RenderTask<T> {
    type Target = RenderTaskBase;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

/// Defines a task executor that is called when the compiled framegraph executes.
pub trait TaskExecutor<T, C> {
    /// Record the work of this task.
    fn execute(&mut self, data: &T, resources: &PhysicalResources<'_>, context: &mut C) -> Result<()>;
}

impl<T, C, F> TaskExecutor<T, C> for F
where
    F: FnMut(&T, &PhysicalResources<'_>, &mut C) -> Result<()>,
{
    /// Record this task by calling the given function.
    fn execute(&mut self, data: &T, resources: &PhysicalResources<'_>, context: &mut C) -> Result<()> {
        self(data, resources, context)
    }
}

/// An empty task executor that does nothing
#[derive(Debug, Default, Copy, Clone)]
pub struct EmptyTaskExecutor;

impl EmptyTaskExecutor {
    /// Creates an empty task executor
    pub fn new() -> Self {
        Self {}
    }

    /// Create a new empty task executor in a [`Box`]
    pub fn new_boxed() -> Box<Self> {
        Box::new(Self::new())
    }
}

impl<T, C> TaskExecutor<T, C> for EmptyTaskExecutor {
    fn execute(&mut self, _data: &T, _resources: &PhysicalResources<'_>, _context: &mut C) -> Result<()> {
        Ok(())
    }
}

pub(crate) type BoxedTaskExecutor<T, C> = Box<dyn TaskExecutor<T, C>>;

/// Tasks of different payload types stored in one container.
pub(crate) trait ErasedTask<C> {
    fn base(&self) -> &RenderTaskBase;

    /// The typed [`RenderTask`], for downcasting.
    fn as_any(&self) -> &dyn Any;

    fn execute(&mut self, resources: &ResourceArena, check_access: bool, context: &mut C) -> Result<()>;
}

#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct TaskNode<T, C> {
    pub(crate) task: RenderTask<T>,
    #[derivative(Debug = "ignore")]
    pub(crate) executor: BoxedTaskExecutor<T, C>,
}

impl<T: 'static, C> ErasedTask<C> for TaskNode<T, C> {
    fn base(&self) -> &RenderTaskBase {
        &self.task.base
    }

    fn as_any(&self) -> &dyn Any {
        &self.task
    }

    fn execute(&mut self, resources: &ResourceArena, check_access: bool, context: &mut C) -> Result<()> {
        let physical = PhysicalResources::new(resources, &self.task.base, check_access);
        self.executor.execute(&self.task.data, &physical, context)
    }
}
