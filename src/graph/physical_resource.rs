//! The interface between the framegraph and the device that owns the actual GPU objects.
//!
//! The graph only decides *when* a resource must exist. Allocating it from a description and releasing
//! it again is done by a device collaborator implementing [`Realize`] for each resource kind it supports.
//! Whether derealizing frees memory or returns it to a pool is entirely up to the device.
//!
//! # Example
//! ```
//! # use framegraph::*;
//! # use anyhow::Result;
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
//! ```

use std::any::Any;

use anyhow::Result;

use crate::Error;
use crate::graph::resource::{Resource, ResourceArena, ResourceId, ResourceNode};
use crate::graph::task::RenderTaskBase;
use crate::graph::virtual_resource::VirtualResource;

/// A device that can execute a framegraph.
pub trait Device {
    /// Command recording context that is handed to every task executor.
    type Context: 'static;

    /// Called right before a task executes. Only called with the `debug-markers` feature.
    #[allow(unused_variables)]
    fn begin_task(&mut self, context: &mut Self::Context, name: &str) {}

    /// Called right after a task executed. Only called with the `debug-markers` feature.
    #[allow(unused_variables)]
    fn end_task(&mut self, context: &mut Self::Context, name: &str) {}
}

/// Implemented by devices that can allocate resources of kind `R`.
pub trait Realize<R: Resource>: Device {
    /// Allocate an actual resource for the given description.
    fn realize(&mut self, name: &str, description: &R::Description) -> Result<R::Actual>;

    /// Release an actual resource after its last use. The default implementation drops it.
    #[allow(unused_variables)]
    fn derealize(&mut self, name: &str, actual: R::Actual) -> Result<()> {
        drop(actual);
        Ok(())
    }
}

type RealizeFn<D> = fn(&mut D, &str, &dyn Any) -> Result<Box<dyn Any>>;
type DerealizeFn<D> = fn(&mut D, &str, Box<dyn Any>) -> Result<()>;

/// Type erased realize/derealize pair, captured when a resource is registered so the execution
/// engine can replay resources of any kind.
pub(crate) struct Realizer<D> {
    realize: RealizeFn<D>,
    derealize: DerealizeFn<D>,
}

impl<D> Clone for Realizer<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for Realizer<D> {}

impl<D: Device> Realizer<D> {
    pub(crate) fn new<R: Resource>() -> Self
    where
        D: Realize<R>, {
        Self {
            realize: realize_erased::<D, R>,
            derealize: derealize_erased::<D, R>,
        }
    }

    pub(crate) fn realize(&self, device: &mut D, name: &str, description: &dyn Any) -> Result<Box<dyn Any>> {
        (self.realize)(device, name, description)
    }

    pub(crate) fn derealize(&self, device: &mut D, name: &str, actual: Box<dyn Any>) -> Result<()> {
        (self.derealize)(device, name, actual)
    }
}

fn realize_erased<D: Realize<R>, R: Resource>(device: &mut D, name: &str, description: &dyn Any) -> Result<Box<dyn Any>> {
    let description = description
        .downcast_ref::<R::Description>()
        .ok_or_else(|| Error::ResourceTypeMismatch(name.to_owned()))?;
    Ok(Box::new(device.realize(name, description)?))
}

fn derealize_erased<D: Realize<R>, R: Resource>(device: &mut D, name: &str, actual: Box<dyn Any>) -> Result<()> {
    let actual = actual
        .downcast::<R::Actual>()
        .map_err(|_| Error::ResourceTypeMismatch(name.to_owned()))?;
    device.derealize(name, *actual)
}

/// Resolves virtual resources to the actual resources realized for them. One of these is handed to every
/// task executor, scoped to that task.
#[derive(Debug)]
pub struct PhysicalResources<'a> {
    resources: &'a ResourceArena,
    task: &'a RenderTaskBase,
    check_access: bool,
}

impl<'a> PhysicalResources<'a> {
    pub(crate) fn new(resources: &'a ResourceArena, task: &'a RenderTaskBase, check_access: bool) -> Self {
        Self {
            resources,
            task,
            check_access,
        }
    }

    /// The task this view was created for.
    pub fn task(&self) -> &'a RenderTaskBase {
        self.task
    }

    /// Resolve a virtual resource to its actual resource.
    /// # Errors
    /// - Fails if the task did not declare the resource (when access checking is enabled).
    /// - Fails if the resource is not realized.
    pub fn get<R: Resource>(&self, resource: VirtualResource<R>) -> Result<&'a R::Actual> {
        let node = self.node::<R>(resource.id())?;
        let actual = node
            .actual
            .as_ref()
            .ok_or_else(|| Error::UnrealizedResource(node.name.clone()))?;
        Ok(actual
            .downcast_ref::<R::Actual>()
            .ok_or_else(|| Error::ResourceTypeMismatch(node.name.clone()))?)
    }

    /// Get the description of a virtual resource.
    /// # Errors
    /// - Fails if the task did not declare the resource (when access checking is enabled).
    /// - Fails if the resource is retained and was registered without a description.
    pub fn description<R: Resource>(&self, resource: VirtualResource<R>) -> Result<&'a R::Description> {
        let node = self.node::<R>(resource.id())?;
        Ok(node
            .description::<R>()
            .ok_or_else(|| Error::UnboundResource(node.name.clone()))?)
    }

    /// Get the name of a virtual resource.
    pub fn name<R: Resource>(&self, resource: VirtualResource<R>) -> Result<&'a str> {
        Ok(self.node::<R>(resource.id())?.name())
    }

    fn node<R: Resource>(&self, id: ResourceId) -> Result<&'a ResourceNode> {
        let node = self.resources.get(id).ok_or_else(|| Error::DanglingResource {
            task: self.task.name().to_owned(),
            resource: id,
        })?;
        if self.check_access && !self.task.uses(id) {
            return Err(Error::UndeclaredAccess {
                task: self.task.name().to_owned(),
                resource: node.name.clone(),
            }
            .into());
        }
        if !node.is::<R>() {
            return Err(Error::ResourceTypeMismatch(node.name.clone()).into());
        }
        Ok(node)
    }
}
