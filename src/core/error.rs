//! Exposes the framegraph error type

use thiserror::Error;

use crate::graph::resource::ResourceId;

/// Error type that the framegraph can return. All variants except [`Error::UnrealizedResource`],
/// [`Error::UndeclaredAccess`] and [`Error::ResourceTypeMismatch`] are raised while compiling, and
/// indicate a bug in the code that registered the render tasks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A task reads or writes a resource that does not exist in this graph. This happens when a handle
    /// outlives the build it was created in, or is used with a different framegraph.
    #[error("Task `{task}` uses resource {resource:?}, which was never created in this graph.")]
    DanglingResource {
        /// Name of the task holding the dangling reference.
        task: String,
        /// The key that failed to resolve.
        resource: ResourceId,
    },
    /// The task dependency graph contains a cycle, so no execution order exists.
    #[error("Task graph contains a cycle through task `{task}`.")]
    CyclicDependency {
        /// Name of a task on the cycle.
        task: String,
    },
    /// A retained resource was registered without a description and without an actual resource.
    #[error("Resource `{0}` has neither a description nor an actual resource bound.")]
    UnboundResource(String),
    /// Two resources in the same build share a name.
    #[error("Resource `{resource}` is created more than once (again by `{task}`).")]
    DuplicateCreation {
        /// Name of the resource.
        resource: String,
        /// Name of the second creating task, or `<retained>` for a retained resource.
        task: String,
    },
    /// A task uses a resource whose creating task was registered after it.
    #[error("Task `{task}` uses resource `{resource}` before the task that creates it.")]
    ResourceUsedBeforeCreation {
        /// Name of the offending task.
        task: String,
        /// Name of the resource.
        resource: String,
    },
    /// A task tried to access the actual resource of a virtual resource that is not realized.
    #[error("Resource `{0}` is not realized at this point in the timeline.")]
    UnrealizedResource(String),
    /// A task tried to access a resource it did not declare in its setup.
    #[error("Task `{task}` accesses resource `{resource}` without declaring it.")]
    UndeclaredAccess {
        /// Name of the offending task.
        task: String,
        /// Name of the resource.
        resource: String,
    },
    /// The resource kind of a handle does not match the stored resource.
    #[error("Resource `{0}` was accessed as the wrong resource kind.")]
    ResourceTypeMismatch(String),
    /// [`Framegraph::execute()`](crate::Framegraph::execute) was called without a compiled timeline.
    #[error("Framegraph must be compiled before it can be executed.")]
    NotCompiled,
    /// Rendering the graphviz output failed.
    #[error("Graphviz rendering failed: `{0}`")]
    GraphViz(String),
}
