//! Graphviz export of a framegraph, for debugging.
//!
//! The exported graph is bipartite: task nodes are connected to the resources they create, read and write. Once
//! the graph is compiled, task nodes show their step in the timeline and resource nodes show their lifetime. Culled
//! nodes are drawn dashed.

use std::fmt::{Display, Formatter};
use std::path::Path;

use anyhow::Result;
use layout::backends::svg::SVGWriter;
use layout::gv::{DotParser, GraphBuilder};
use petgraph::dot::Dot;
use petgraph::graph::{EdgeReference, Graph, NodeIndex};

use crate::Error;
use crate::graph::compile::Lifetime;
use crate::graph::framegraph::Framegraph;
use crate::graph::physical_resource::Device;

/// Implemented for graphs that can be exported to the `dot` format.
pub trait GraphViz {
    /// Get the string representation of this graph in `dot` format.
    fn dot(&self) -> Result<String>;
}

#[derive(Debug)]
enum GraphNode {
    Task {
        name: String,
        step: Option<usize>,
        culled: bool,
    },
    Resource {
        name: String,
        kind: &'static str,
        lifetime: Option<Lifetime>,
        retained: bool,
        culled: bool,
    },
}

#[derive(Debug, Copy, Clone)]
enum GraphEdge {
    Create,
    Read,
    Write,
}

impl Display for GraphNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphNode::Task {
                name,
                step,
                ..
            } => match step {
                Some(step) => write!(f, "{name}\nstep {step}"),
                None => write!(f, "{name}"),
            },
            GraphNode::Resource {
                name,
                kind,
                lifetime,
                ..
            } => {
                write!(f, "{kind}: {name}")?;
                if let Some(lifetime) = lifetime {
                    let bound = |step: Option<usize>| step.map_or_else(|| String::from("-"), |step| step.to_string());
                    write!(f, "\n[{} .. {}]", bound(lifetime.realize), bound(lifetime.derealize))?;
                }
                Ok(())
            }
        }
    }
}

impl Display for GraphEdge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphEdge::Create => write!(f, "create"),
            GraphEdge::Read => write!(f, "read"),
            GraphEdge::Write => write!(f, "write"),
        }
    }
}

fn edge_attributes(_: &Graph<GraphNode, GraphEdge>, edge: EdgeReference<GraphEdge>) -> String {
    match edge.weight() {
        GraphEdge::Create => String::from("style = bold"),
        GraphEdge::Read => String::from(""),
        GraphEdge::Write => String::from("color = \"#f75e70\""),
    }
}

fn node_attributes(_: &Graph<GraphNode, GraphEdge>, node: (NodeIndex, &GraphNode)) -> String {
    match node.1 {
        GraphNode::Task {
            culled, ..
        } => format!(
            "shape = box style = \"{}\" fillcolor = \"#5e6df7\"",
            if *culled { "filled,dashed" } else { "filled" }
        ),
        GraphNode::Resource {
            retained,
            culled,
            ..
        } => format!(
            "style = \"{}\" fillcolor = \"{}\"",
            if *culled { "filled,dashed" } else { "filled" },
            if *retained { "#f7c45e" } else { "#5ef78f" }
        ),
    }
}

impl<D: Device> Framegraph<D> {
    fn as_graph(&self) -> Graph<GraphNode, GraphEdge> {
        let timeline = self.timeline.as_ref();
        let mut graph = Graph::new();

        let tasks: Vec<NodeIndex> = self
            .tasks()
            .map(|task| {
                let step = timeline.and_then(|timeline| timeline.step_of(task.id()));
                graph.add_node(GraphNode::Task {
                    name: task.name().to_owned(),
                    step,
                    culled: timeline.is_some() && step.is_none(),
                })
            })
            .collect();

        for (id, node) in self.resources.iter() {
            let lifetime = timeline.and_then(|timeline| timeline.lifetime(id));
            let resource = graph.add_node(GraphNode::Resource {
                name: node.name().to_owned(),
                kind: node.kind(),
                lifetime,
                retained: node.is_retained(),
                culled: timeline.is_some() && lifetime.is_none(),
            });
            if let Some(&creator) = node.creator().and_then(|creator| tasks.get(creator.index())) {
                graph.add_edge(creator, resource, GraphEdge::Create);
            }
            for &reader in node.readers().iter().filter_map(|reader| tasks.get(reader.index())) {
                graph.add_edge(resource, reader, GraphEdge::Read);
            }
            for &writer in node.writers().iter().filter_map(|writer| tasks.get(writer.index())) {
                graph.add_edge(writer, resource, GraphEdge::Write);
            }
        }
        graph
    }

    /// Write the `dot` representation of this graph to a file.
    pub fn export_graphviz(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.dot()?)?;
        Ok(())
    }

    /// Render this graph to an SVG file.
    /// # Errors
    /// - Fails with [`Error::GraphViz`] if the generated `dot` text could not be laid out.
    pub fn export_svg(&self, path: impl AsRef<Path>) -> Result<()> {
        let dot = self.dot()?;
        let mut parser = DotParser::new(&dot);
        let graph = parser.process().map_err(Error::GraphViz)?;
        let mut builder = GraphBuilder::new();
        builder.visit_graph(&graph);
        let mut visual = builder.get();
        let mut svg = SVGWriter::new();
        visual.do_it(false, false, false, &mut svg);
        std::fs::write(path, svg.finalize())?;
        Ok(())
    }
}

impl<D: Device> GraphViz for Framegraph<D> {
    fn dot(&self) -> Result<String> {
        let graph = self.as_graph();
        Ok(format!(
            "{}",
            Dot::with_attr_getters(&graph, &[], &edge_attributes, &node_attributes)
        ))
    }
}
