//! Compiles the registered tasks and resources into a [`Timeline`].
//!
//! Compilation validates the graph, culls tasks that do not contribute to any observable output, orders the
//! surviving tasks and computes for every resource the step at which it must be realized and the step after which
//! it can be derealized.

use std::collections::BTreeMap;

use anyhow::Result;
use multimap::MultiMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use static_assertions::assert_impl_all;

use crate::Error;
use crate::graph::resource::{ResourceArena, ResourceId, ResourceNode};
use crate::graph::task::{RenderTaskBase, TaskId};

/// Step range in which a resource holds an actual resource. Both bounds are step indices into the timeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Lifetime {
    /// Step before which the resource is realized. `None` if the graph never realizes it.
    pub realize: Option<usize>,
    /// Step after which the resource is derealized. `None` if the graph never derealizes it.
    pub derealize: Option<usize>,
}

/// One step of a compiled timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineStep {
    /// The task executed in this step.
    pub task: TaskId,
    /// Resources realized right before the task executes.
    pub realized_resources: Vec<ResourceId>,
    /// Resources derealized right after the task executed.
    pub derealized_resources: Vec<ResourceId>,
}

/// The output of compiling a framegraph: an ordered list of steps, one per surviving task.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Timeline {
    steps: Vec<TimelineStep>,
    lifetimes: BTreeMap<ResourceId, Lifetime>,
    culled_tasks: Vec<TaskId>,
    culled_resources: Vec<ResourceId>,
}

assert_impl_all!(Timeline: Send, Sync);

impl Timeline {
    /// All steps in execution order.
    pub fn steps(&self) -> &[TimelineStep] {
        &self.steps
    }

    /// The scheduled tasks in execution order.
    pub fn order(&self) -> Vec<TaskId> {
        self.steps.iter().map(|step| step.task).collect()
    }

    /// Step index of a task, or `None` if the task was culled.
    pub fn step_of(&self, task: TaskId) -> Option<usize> {
        self.steps.iter().position(|step| step.task == task)
    }

    /// Lifetime of a surviving resource. Returns `None` for culled or unknown resources.
    pub fn lifetime(&self, resource: ResourceId) -> Option<Lifetime> {
        self.lifetimes.get(&resource).copied()
    }

    /// Tasks removed by culling, in registration order.
    pub fn culled_tasks(&self) -> &[TaskId] {
        &self.culled_tasks
    }

    /// Transient resources removed by culling, in registration order.
    pub fn culled_resources(&self) -> &[ResourceId] {
        &self.culled_resources
    }

    /// Amount of steps in the timeline.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no task survived compilation.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Compile a set of tasks, given in registration order, into a timeline.
pub(crate) fn compile(tasks: &[&RenderTaskBase], resources: &ResourceArena, culling: bool) -> Result<Timeline> {
    validate(tasks, resources)?;

    let live = if culling {
        live_tasks(tasks, resources)
    } else {
        vec![true; tasks.len()]
    };

    let mut steps = Vec::new();
    let mut step_of = vec![None; tasks.len()];
    let mut culled_tasks = Vec::new();
    for task in tasks {
        if live[task.id.index()] {
            step_of[task.id.index()] = Some(steps.len());
            steps.push(TimelineStep {
                task: task.id,
                realized_resources: vec![],
                derealized_resources: vec![],
            });
        } else {
            trace!("Culling task `{}`", task.name);
            culled_tasks.push(task.id);
        }
    }

    let mut lifetimes = BTreeMap::new();
    let mut culled_resources = Vec::new();
    for (id, node) in resources.iter() {
        let users = live_users(node, &step_of);
        let lifetime = if let Some(creator) = node.creator {
            match step_of[creator.index()] {
                Some(realize) => Lifetime {
                    realize: Some(realize),
                    derealize: Some(users.max().map_or(realize, |last| last.max(realize))),
                },
                None => {
                    trace!("Culling resource `{}`", node.name);
                    culled_resources.push(id);
                    continue;
                }
            }
        } else if node.external {
            Lifetime {
                realize: None,
                derealize: None,
            }
        } else {
            // Retained without an actual: the graph allocates it for the first user and hands it back to the host.
            Lifetime {
                realize: users.min(),
                derealize: None,
            }
        };

        if let Some(step) = lifetime.realize {
            steps[step].realized_resources.push(id);
        }
        if let Some(step) = lifetime.derealize {
            steps[step].derealized_resources.push(id);
        }
        lifetimes.insert(id, lifetime);
    }

    Ok(Timeline {
        steps,
        lifetimes,
        culled_tasks,
        culled_resources,
    })
}

/// Steps of all surviving readers and writers of a resource.
fn live_users<'a>(node: &'a ResourceNode, step_of: &'a [Option<usize>]) -> impl Iterator<Item = usize> + Clone + 'a {
    node.readers
        .iter()
        .chain(node.writers.iter())
        .filter_map(move |task| step_of.get(task.index()).copied().flatten())
}

fn validate(tasks: &[&RenderTaskBase], resources: &ResourceArena) -> Result<()> {
    for (_, node) in resources.iter() {
        if node.retained && node.description.is_none() && !node.external {
            return Err(Error::UnboundResource(node.name.clone()).into());
        }
    }

    for task in tasks {
        if let Some(resource) = task.resources().find(|&id| !resources.contains(id)) {
            return Err(Error::DanglingResource {
                task: task.name.clone(),
                resource,
            }
            .into());
        }
    }

    let names: MultiMap<&str, ResourceId> = resources
        .iter()
        .map(|(id, node)| (node.name.as_str(), id))
        .collect();
    for (id, node) in resources.iter() {
        let first = names.get(node.name.as_str()).copied();
        if first != Some(id) {
            let task = match node.creator {
                Some(creator) => tasks
                    .get(creator.index())
                    .map_or_else(|| creator.to_string(), |task| task.name.clone()),
                None => String::from("<retained>"),
            };
            return Err(Error::DuplicateCreation {
                resource: node.name.clone(),
                task,
            }
            .into());
        }
    }

    let graph = dependency_graph(tasks, resources);
    if let Err(cycle) = toposort(&graph, None) {
        let task = graph[cycle.node_id()];
        return Err(Error::CyclicDependency {
            task: name_of(tasks, task),
        }
        .into());
    }

    for task in tasks {
        for id in task.resources() {
            let Some(node) = resources.get(id) else {
                continue;
            };
            if node.creator.map_or(false, |creator| creator > task.id) {
                return Err(Error::ResourceUsedBeforeCreation {
                    task: task.name.clone(),
                    resource: node.name.clone(),
                }
                .into());
            }
        }
    }

    Ok(())
}

/// Task dependency graph: an edge from the creator of a resource to each of its users, and from every writer of a
/// resource to each of its later readers.
fn dependency_graph(tasks: &[&RenderTaskBase], resources: &ResourceArena) -> DiGraph<TaskId, ResourceId> {
    let mut graph = DiGraph::new();
    let nodes: Vec<NodeIndex> = tasks.iter().map(|task| graph.add_node(task.id)).collect();
    let node = |task: TaskId| nodes.get(task.index()).copied();

    for task in tasks {
        let Some(to) = node(task.id) else {
            continue;
        };
        for id in task.resources() {
            let Some(resource) = resources.get(id) else {
                continue;
            };
            if let Some(from) = resource.creator.filter(|&creator| creator != task.id).and_then(node) {
                graph.add_edge(from, to, id);
            }
        }
        for &id in &task.reads {
            let Some(resource) = resources.get(id) else {
                continue;
            };
            for &writer in resource.writers.iter().filter(|&&writer| writer < task.id) {
                if let Some(from) = node(writer) {
                    graph.add_edge(from, to, id);
                }
            }
        }
    }
    graph
}

/// Mark and sweep from the tasks with an observable effect.
fn live_tasks(tasks: &[&RenderTaskBase], resources: &ResourceArena) -> Vec<bool> {
    let mut live = vec![false; tasks.len()];
    let mut stack: Vec<TaskId> = tasks
        .iter()
        .filter(|task| is_root(task, resources))
        .map(|task| task.id)
        .collect();

    while let Some(id) = stack.pop() {
        let Some(task) = tasks.get(id.index()) else {
            continue;
        };
        if live[id.index()] {
            continue;
        }
        live[id.index()] = true;

        for resource in task.resources() {
            let Some(node) = resources.get(resource) else {
                continue;
            };
            if let Some(creator) = node.creator {
                stack.push(creator);
            }
        }
        for &resource in &task.reads {
            let Some(node) = resources.get(resource) else {
                continue;
            };
            stack.extend(node.writers.iter().copied().filter(|&writer| writer < id));
        }
    }
    live
}

fn is_root(task: &RenderTaskBase, resources: &ResourceArena) -> bool {
    if task.side_effect {
        return true;
    }
    let mut outputs = task.outputs().peekable();
    if outputs.peek().is_none() {
        return true;
    }
    outputs.any(|id| resources.get(id).map_or(false, |node| node.retained))
}

fn name_of(tasks: &[&RenderTaskBase], task: TaskId) -> String {
    tasks
        .get(task.index())
        .map_or_else(|| task.to_string(), |task| task.name.clone())
}
