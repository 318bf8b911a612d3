#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use anyhow::{bail, Result};

use framegraph::*;

/// Something that happened while executing a graph against the [`MockDevice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Realize(String),
    Execute(String),
    Derealize(String),
    Begin(String),
    End(String),
}

/// Event log shared between the mock device and the task executors. This is the context type of the mock device.
#[derive(Debug, Clone, Default)]
pub struct Log(Rc<RefCell<Vec<Event>>>);

impl Log {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn executed(&self, task: &str) {
        self.push(Event::Execute(task.to_owned()));
    }

    /// All events except debug markers.
    pub fn events(&self) -> Vec<Event> {
        self.0
            .borrow()
            .iter()
            .filter(|event| !matches!(event, Event::Begin(_) | Event::End(_)))
            .cloned()
            .collect()
    }

    /// All events, including debug markers.
    pub fn all_events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    /// Names of the executed tasks, in order.
    pub fn executions(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Execute(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferInfo {
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

/// Handle to a fake allocation. Deliberately not `Clone`, so the graph has to move it back into the device.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    pub id: u64,
    pub name: String,
}

pub struct MockBuffer;

impl Resource for MockBuffer {
    type Description = BufferInfo;
    type Actual = Handle;
}

pub struct MockImage;

impl Resource for MockImage {
    type Description = ImageInfo;
    type Actual = Handle;
}

/// Device that hands out fake handles and records everything into a [`Log`].
#[derive(Debug, Default)]
pub struct MockDevice {
    pub log: Log,
    next: u64,
    live: HashSet<u64>,
    /// Fail realizing the resource with this name.
    pub fail_realize: Option<String>,
}

impl MockDevice {
    /// Create a device and the context to execute graphs with.
    pub fn new() -> (Self, Log) {
        let device = Self::default();
        let log = device.log.clone();
        (device, log)
    }

    /// Amount of handles that were realized and not derealized yet.
    pub fn live_handles(&self) -> usize {
        self.live.len()
    }

    /// A handle that was not allocated by the graph, for retained resources.
    pub fn external(&mut self, name: &str) -> Handle {
        self.next += 1;
        Handle {
            id: self.next,
            name: name.to_owned(),
        }
    }

    fn allocate(&mut self, name: &str) -> Result<Handle> {
        if self.fail_realize.as_deref() == Some(name) {
            bail!("out of memory while realizing `{name}`");
        }
        self.next += 1;
        self.live.insert(self.next);
        self.log.push(Event::Realize(name.to_owned()));
        Ok(Handle {
            id: self.next,
            name: name.to_owned(),
        })
    }

    fn free(&mut self, name: &str, handle: Handle) -> Result<()> {
        if handle.name != name {
            bail!("handle `{}` returned under the name `{name}`", handle.name);
        }
        if !self.live.remove(&handle.id) {
            bail!("handle of `{name}` freed twice");
        }
        self.log.push(Event::Derealize(name.to_owned()));
        Ok(())
    }
}

impl Device for MockDevice {
    type Context = Log;

    fn begin_task(&mut self, context: &mut Log, name: &str) {
        context.push(Event::Begin(name.to_owned()));
    }

    fn end_task(&mut self, context: &mut Log, name: &str) {
        context.push(Event::End(name.to_owned()));
    }
}

impl Realize<MockBuffer> for MockDevice {
    fn realize(&mut self, name: &str, _description: &BufferInfo) -> Result<Handle> {
        self.allocate(name)
    }

    fn derealize(&mut self, name: &str, actual: Handle) -> Result<()> {
        self.free(name, actual)
    }
}

impl Realize<MockImage> for MockDevice {
    fn realize(&mut self, name: &str, description: &ImageInfo) -> Result<Handle> {
        if description.width == 0 || description.height == 0 {
            bail!("image `{name}` has an empty extent");
        }
        self.allocate(name)
    }

    fn derealize(&mut self, name: &str, actual: Handle) -> Result<()> {
        self.free(name, actual)
    }
}

pub type MockGraph = Framegraph<MockDevice>;

pub fn buffer(size: u64) -> BufferInfo {
    BufferInfo {
        size,
    }
}

/// Install a logger so `RUST_LOG=trace` shows what the graph does.
pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

/// Extract the framegraph error from a failed call.
pub fn graph_error<T: std::fmt::Debug>(result: Result<T>) -> Error {
    let error = result.expect_err("call should fail");
    error
        .downcast_ref::<Error>()
        .cloned()
        .unwrap_or_else(|| panic!("expected a framegraph error, got `{error}`"))
}

/// Builds the graph `a` (creates `x`), `b` (reads `x`, creates `y`), `c` (reads `y`).
pub fn chain(graph: &mut MockGraph) -> (VirtualResource<MockBuffer>, VirtualResource<MockBuffer>) {
    let x = *graph
        .add_render_task(
            "a",
            |builder| builder.create::<MockBuffer>("x", buffer(16)),
            |_, _, log| {
                log.executed("a");
                Ok(())
            },
        )
        .data();
    let y = *graph
        .add_render_task(
            "b",
            |builder| {
                builder.read(x);
                builder.create::<MockBuffer>("y", buffer(32))
            },
            move |_, resources, log| {
                assert_eq!(resources.get(x)?.name, "x");
                log.executed("b");
                Ok(())
            },
        )
        .data();
    graph.add_render_task(
        "c",
        |builder| builder.read(y),
        |y, resources, log| {
            assert_eq!(resources.get(*y)?.name, "y");
            log.executed("c");
            Ok(())
        },
    );
    (x, y)
}
