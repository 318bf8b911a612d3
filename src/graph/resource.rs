//! Resource kinds and the arena the framegraph stores its resources in.
//!
//! Every resource in a graph lives in a [`ResourceArena`], addressed by a generational [`ResourceId`].
//! Tasks and resources refer to each other through these ids and [`TaskId`]s only, so growing the
//! arena never invalidates a reference. An id from a cleared build, or from the arena of another graph,
//! never resolves.

use std::any::{Any, TypeId};
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::{new_key_type, SlotMap};
use static_assertions::assert_impl_all;

use crate::graph::task::TaskId;

new_key_type! {
    pub(crate) struct ResourceKey;
}

/// Identifies the arena that issued a [`ResourceId`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct GraphId(u64);

impl GraphId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Key of a resource inside a framegraph. The key remembers the graph that issued it, and is generational
/// inside that graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId {
    graph: GraphId,
    key: ResourceKey,
}

impl ResourceId {
    pub(crate) fn key(&self) -> ResourceKey {
        self.key
    }
}

assert_impl_all!(ResourceId: Send, Sync, Copy, Ord);

/// A kind of resource that can be scheduled by the framegraph, such as a buffer or an image.
/// Resource kinds are usually zero-sized marker types.
///
/// # Example
/// ```
/// # use framegraph::*;
/// #[derive(Debug, Clone)]
/// struct BufferInfo {
///     size: u64,
/// }
///
/// struct Buffer;
///
/// impl Resource for Buffer {
///     type Description = BufferInfo;
///     type Actual = Vec<u8>;
/// }
/// ```
pub trait Resource: 'static {
    /// Backend independent description of how to allocate the resource.
    type Description: Debug + Clone + 'static;
    /// The allocated resource, as handed out by the device.
    type Actual: 'static;

    /// Human readable name of this resource kind, used in logs and graph exports.
    fn kind() -> &'static str {
        let name = std::any::type_name::<Self>();
        name.rsplit("::").next().unwrap_or(name)
    }
}

/// A resource stored in the framegraph.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ResourceNode {
    pub(crate) name: String,
    pub(crate) kind: &'static str,
    #[derivative(Debug = "ignore")]
    pub(crate) type_id: TypeId,
    pub(crate) creator: Option<TaskId>,
    pub(crate) readers: Vec<TaskId>,
    pub(crate) writers: Vec<TaskId>,
    pub(crate) retained: bool,
    /// The actual resource was handed in at registration, so the graph never realizes nor derealizes it.
    pub(crate) external: bool,
    pub(crate) summary: Option<String>,
    #[derivative(Debug = "ignore")]
    pub(crate) description: Option<Box<dyn Any>>,
    #[derivative(Debug = "ignore")]
    pub(crate) actual: Option<Box<dyn Any>>,
}

impl ResourceNode {
    /// A resource created by a task, realized and derealized by the graph.
    pub(crate) fn transient<R: Resource>(name: String, creator: TaskId, description: R::Description) -> Self {
        Self {
            name,
            kind: R::kind(),
            type_id: TypeId::of::<R>(),
            creator: Some(creator),
            readers: Vec::new(),
            writers: Vec::new(),
            retained: false,
            external: false,
            summary: Some(format!("{description:?}")),
            description: Some(Box::new(description)),
            actual: None,
        }
    }

    /// A resource whose storage is owned outside the graph.
    pub(crate) fn retained<R: Resource>(
        name: String,
        description: Option<R::Description>,
        actual: Option<R::Actual>,
    ) -> Self {
        Self {
            name,
            kind: R::kind(),
            type_id: TypeId::of::<R>(),
            creator: None,
            readers: Vec::new(),
            writers: Vec::new(),
            retained: true,
            external: actual.is_some(),
            summary: description.as_ref().map(|description| format!("{description:?}")),
            description: description.map(|description| Box::new(description) as Box<dyn Any>),
            actual: actual.map(|actual| Box::new(actual) as Box<dyn Any>),
        }
    }

    /// Name of the resource.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the resource kind.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// The task that creates this resource. `None` for retained resources.
    pub fn creator(&self) -> Option<TaskId> {
        self.creator
    }

    /// Tasks that read this resource, in registration order.
    pub fn readers(&self) -> &[TaskId] {
        &self.readers
    }

    /// Tasks that write this resource (excluding its creator), in registration order.
    pub fn writers(&self) -> &[TaskId] {
        &self.writers
    }

    /// Whether the storage of this resource is owned outside the graph.
    pub fn is_retained(&self) -> bool {
        self.retained
    }

    /// Whether the actual resource was supplied at registration, rather than realized by the graph.
    pub fn is_external(&self) -> bool {
        self.external
    }

    /// Whether this resource is created by a task inside the graph.
    pub fn is_transient(&self) -> bool {
        !self.retained
    }

    /// Whether this resource currently holds an actual resource.
    pub fn is_realized(&self) -> bool {
        self.actual.is_some()
    }

    /// Whether this resource has a description to realize it from.
    pub fn has_description(&self) -> bool {
        self.description.is_some()
    }

    /// Debug representation of the description, if there is one.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Whether this resource is of kind `R`.
    pub fn is<R: Resource>(&self) -> bool {
        self.type_id == TypeId::of::<R>()
    }

    /// Get the description of this resource. Returns `None` if there is no description or `R` is the wrong kind.
    pub fn description<R: Resource>(&self) -> Option<&R::Description> {
        self.description.as_ref()?.downcast_ref::<R::Description>()
    }

    /// Get the actual resource. Returns `None` if it is not realized or `R` is the wrong kind.
    pub fn actual<R: Resource>(&self) -> Option<&R::Actual> {
        self.actual.as_ref()?.downcast_ref::<R::Actual>()
    }
}

/// Arena of all resources in one framegraph build. Iteration follows registration order.
#[derive(Debug)]
pub struct ResourceArena {
    graph: GraphId,
    nodes: SlotMap<ResourceKey, ResourceNode>,
    order: Vec<ResourceId>,
}

impl Default for ResourceArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceArena {
    /// Create an empty arena. Every arena issues ids that only resolve in itself.
    pub fn new() -> Self {
        Self {
            graph: GraphId::next(),
            nodes: SlotMap::with_key(),
            order: vec![],
        }
    }

    pub(crate) fn insert(&mut self, node: ResourceNode) -> ResourceId {
        let id = ResourceId {
            graph: self.graph,
            key: self.nodes.insert(node),
        };
        self.order.push(id);
        id
    }

    /// Look up a resource.
    pub fn get(&self, id: ResourceId) -> Option<&ResourceNode> {
        if id.graph != self.graph {
            return None;
        }
        self.nodes.get(id.key)
    }

    pub(crate) fn get_mut(&mut self, id: ResourceId) -> Option<&mut ResourceNode> {
        if id.graph != self.graph {
            return None;
        }
        self.nodes.get_mut(id.key)
    }

    /// Whether `id` refers to a resource in this arena.
    pub fn contains(&self, id: ResourceId) -> bool {
        self.get(id).is_some()
    }

    /// Iterate over all resources in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &ResourceNode)> + '_ {
        self.order
            .iter()
            .filter_map(|&id| self.nodes.get(id.key).map(|node| (id, node)))
    }

    /// All resource ids in registration order.
    pub fn ids(&self) -> &[ResourceId] {
        &self.order
    }

    /// Amount of resources in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no resources.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop all resources. Ids handed out before this call never resolve again.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
    }
}
