//! Exposes the [`Framegraph`], the container owning all tasks and resources of one build.

use anyhow::Result;
use slotmap::SecondaryMap;

use crate::core::settings::FramegraphSettings;
use crate::graph::builder::RenderTaskBuilder;
use crate::graph::compile::{self, Timeline};
use crate::graph::physical_resource::{Device, PhysicalResources, Realize, Realizer};
use crate::graph::resource::{Resource, ResourceArena, ResourceId, ResourceKey, ResourceNode};
use crate::graph::task::{ErasedTask, RenderTask, RenderTaskBase, TaskExecutor, TaskId, TaskNode};
use crate::graph::virtual_resource::VirtualResource;

/// A graph of render tasks and the resources they create, read and write. The graph is built by registering
/// tasks, compiled into a [`Timeline`] and then executed against a device.
///
/// For a full example, see the [`graph`](crate::graph) module level documentation.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Framegraph<D: Device> {
    pub(crate) settings: FramegraphSettings,
    #[derivative(Debug = "ignore")]
    pub(crate) tasks: Vec<Box<dyn ErasedTask<D::Context>>>,
    pub(crate) resources: ResourceArena,
    #[derivative(Debug = "ignore")]
    pub(crate) realizers: SecondaryMap<ResourceKey, Realizer<D>>,
    pub(crate) timeline: Option<Timeline>,
}

impl<D: Device> Default for Framegraph<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Device> Framegraph<D> {
    /// Create an empty framegraph with default settings.
    pub fn new() -> Self {
        Self::with_settings(FramegraphSettings::default())
    }

    /// Create an empty framegraph.
    pub fn with_settings(settings: FramegraphSettings) -> Self {
        Self {
            settings,
            tasks: vec![],
            resources: ResourceArena::new(),
            realizers: SecondaryMap::new(),
            timeline: None,
        }
    }

    /// Get the settings this graph was created with.
    pub fn settings(&self) -> &FramegraphSettings {
        &self.settings
    }

    /// Add a render task to the graph. `setup` is called immediately with a builder bound to the new task, and
    /// its return value becomes the task payload. `execute` is called with that payload every time the compiled
    /// graph executes.
    pub fn add_render_task<T, S, E>(&mut self, name: impl Into<String>, setup: S, execute: E) -> &RenderTask<T>
    where
        T: 'static,
        S: FnOnce(&mut RenderTaskBuilder<'_, D>) -> T,
        E: FnMut(&T, &PhysicalResources<'_>, &mut D::Context) -> Result<()> + 'static, {
        self.add_render_task_with(name, setup, execute)
    }

    /// Add a render task with any [`TaskExecutor`]. See [`Framegraph::add_render_task()`].
    pub fn add_render_task_with<T, S, E>(&mut self, name: impl Into<String>, setup: S, executor: E) -> &RenderTask<T>
    where
        T: 'static,
        S: FnOnce(&mut RenderTaskBuilder<'_, D>) -> T,
        E: TaskExecutor<T, D::Context> + 'static, {
        let mut base = RenderTaskBase::new(TaskId::new(self.tasks.len()), name);
        let data = setup(&mut RenderTaskBuilder::new(&mut base, &mut self.resources, &mut self.realizers));
        self.timeline = None;
        self.tasks.push(Box::new(TaskNode {
            task: RenderTask {
                base,
                data,
            },
            executor: Box::new(executor),
        }));
        match self
            .tasks
            .last()
            .and_then(|task| task.as_any().downcast_ref::<RenderTask<T>>())
        {
            Some(task) => task,
            None => unreachable!("last task must be the one just added"),
        }
    }

    /// Register a resource whose storage is owned outside the graph, such as a swapchain image.
    ///
    /// If `actual` is given, the graph never realizes nor derealizes the resource. If only a description is given,
    /// the graph realizes it before its first user and leaves it alive, so it can be retrieved with
    /// [`Framegraph::take_actual()`]. Registering neither is an error reported by [`Framegraph::compile()`].
    pub fn add_retained_resource<R: Resource>(
        &mut self,
        name: impl Into<String>,
        description: Option<R::Description>,
        actual: Option<R::Actual>,
    ) -> VirtualResource<R>
    where
        D: Realize<R>, {
        let id = self
            .resources
            .insert(ResourceNode::retained::<R>(name.into(), description, actual));
        self.realizers.insert(id.key(), Realizer::new::<R>());
        self.timeline = None;
        VirtualResource::new(id)
    }

    /// Compile the graph into a timeline. The timeline is stored and used by every following
    /// [`Framegraph::execute()`](Framegraph::execute) until the graph changes.
    /// # Errors
    /// - Fails with the first validation error found, see [`Error`](crate::Error).
    pub fn compile(&mut self) -> Result<&Timeline> {
        let tasks: Vec<&RenderTaskBase> = self.tasks.iter().map(|task| task.base()).collect();
        let timeline = compile::compile(&tasks, &self.resources, self.settings.culling)?;
        debug!(
            "Compiled framegraph `{}`: {} of {} tasks scheduled, {} resources culled",
            self.settings.name,
            timeline.len(),
            self.tasks.len(),
            timeline.culled_resources().len()
        );
        Ok(self.timeline.insert(timeline))
    }

    /// Drop all tasks and resources, preparing the graph for the next build. Handles from the previous build
    /// never resolve again.
    ///
    /// Retained resources realized by the graph are dropped without the device seeing them. Use
    /// [`Framegraph::clear_with()`] when the device has to free them.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.resources.clear();
        self.realizers.clear();
        self.timeline = None;
    }

    /// The last compiled timeline, if the graph did not change since.
    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    /// Amount of registered tasks.
    pub fn num_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Get a registered task.
    pub fn task(&self, id: TaskId) -> Option<&RenderTaskBase> {
        self.tasks.get(id.index()).map(|task| task.base())
    }

    /// Iterate over all tasks in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &RenderTaskBase> {
        self.tasks.iter().map(|task| task.base())
    }

    /// Get a registered task with its payload. Returns `None` if `T` is not the payload type of the task.
    pub fn render_task<T: 'static>(&self, id: TaskId) -> Option<&RenderTask<T>> {
        self.tasks.get(id.index())?.as_any().downcast_ref()
    }

    /// Get a registered resource.
    pub fn resource(&self, id: impl Into<ResourceId>) -> Option<&ResourceNode> {
        self.resources.get(id.into())
    }

    /// All registered resources.
    pub fn resources(&self) -> &ResourceArena {
        &self.resources
    }

    /// Get the actual resource currently held by a resource.
    pub fn actual<R: Resource>(&self, resource: VirtualResource<R>) -> Option<&R::Actual> {
        self.resources.get(resource.id())?.actual::<R>()
    }

    /// Take the actual resource out of a resource, such as a retained resource realized by the graph.
    pub fn take_actual<R: Resource>(&mut self, resource: VirtualResource<R>) -> Option<R::Actual> {
        let node = self.resources.get_mut(resource.id())?;
        if !node.is::<R>() {
            return None;
        }
        let actual = node.actual.take()?;
        match actual.downcast::<R::Actual>() {
            Ok(actual) => Some(*actual),
            Err(actual) => {
                node.actual = Some(actual);
                None
            }
        }
    }
}
