use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::graph::resource::ResourceId;

/// Typed handle to a resource in a framegraph. Handles are obtained from
/// [`RenderTaskBuilder::create()`](crate::RenderTaskBuilder::create) or
/// [`Framegraph::add_retained_resource()`](crate::Framegraph::add_retained_resource), and are only valid
/// for the build of the graph that handed them out.
pub struct VirtualResource<R> {
    id: ResourceId,
    _marker: PhantomData<fn() -> R>,
}

impl<R> VirtualResource<R> {
    pub(crate) fn new(id: ResourceId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Get the untyped id of this resource.
    pub fn id(&self) -> ResourceId {
        self.id
    }
}

impl<R> Clone for VirtualResource<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for VirtualResource<R> {}

impl<R> PartialEq for VirtualResource<R> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<R> Eq for VirtualResource<R> {}

impl<R> Hash for VirtualResource<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl<R> fmt::Debug for VirtualResource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtualResource({:?})", self.id)
    }
}

impl<R> From<VirtualResource<R>> for ResourceId {
    fn from(value: VirtualResource<R>) -> Self {
        value.id
    }
}
