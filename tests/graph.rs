use anyhow::Result;

use framegraph::*;
use framework::*;

mod framework;

fn noop<T>(_: &T, _: &PhysicalResources<'_>, _: &mut Log) -> Result<()> {
    Ok(())
}

#[test]
fn chain_is_ordered() -> Result<()> {
    init_logging();
    let mut graph = MockGraph::new();
    let (x, y) = chain(&mut graph);

    let timeline = graph.compile()?;
    let order: Vec<TaskId> = timeline.order();
    assert_eq!(order.len(), 3);
    let names: Vec<&str> = order
        .iter()
        .filter_map(|&id| graph.task(id))
        .map(|task| task.name())
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    let timeline = graph.timeline().expect("graph is compiled");
    assert_eq!(
        timeline.lifetime(x.id()),
        Some(Lifetime {
            realize: Some(0),
            derealize: Some(1),
        })
    );
    assert_eq!(
        timeline.lifetime(y.id()),
        Some(Lifetime {
            realize: Some(1),
            derealize: Some(2),
        })
    );
    assert_eq!(timeline.steps()[0].realized_resources, vec![x.id()]);
    assert!(timeline.steps()[0].derealized_resources.is_empty());
    assert_eq!(timeline.steps()[1].realized_resources, vec![y.id()]);
    assert_eq!(timeline.steps()[1].derealized_resources, vec![x.id()]);
    assert!(timeline.steps()[2].realized_resources.is_empty());
    assert_eq!(timeline.steps()[2].derealized_resources, vec![y.id()]);
    Ok(())
}

#[test]
fn creator_precedes_users() -> Result<()> {
    let mut graph = MockGraph::new();
    let (x, _) = chain(&mut graph);
    graph.add_render_task(
        "d",
        |builder| {
            builder.write(x);
            builder.side_effect();
        },
        noop,
    );

    let timeline = graph.compile()?.clone();
    for (id, resource) in graph.resources().iter() {
        let Some(creator) = resource.creator() else {
            continue;
        };
        let created = timeline.step_of(creator).expect("creator is scheduled");
        for user in resource.readers().iter().chain(resource.writers()) {
            if let Some(step) = timeline.step_of(*user) {
                assert!(created < step, "{} used before creation", resource.name());
            }
        }
        let lifetime = timeline.lifetime(id).expect("resource survives");
        assert!(lifetime.realize <= lifetime.derealize);
    }
    Ok(())
}

#[test]
fn unconsumed_task_is_culled() -> Result<()> {
    let mut graph = MockGraph::new();
    let (x, y) = chain(&mut graph);
    let d = graph.add_render_task("d", |builder| builder.create::<MockBuffer>("z", buffer(8)), noop);
    let (d, z) = (d.id(), *d.data());

    let timeline = graph.compile()?;
    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline.step_of(d), None);
    assert_eq!(timeline.culled_tasks(), &[d]);
    assert_eq!(timeline.culled_resources(), &[z.id()]);
    assert_eq!(timeline.lifetime(z.id()), None);
    for step in timeline.steps() {
        assert!(!step.realized_resources.contains(&z.id()));
        assert!(!step.derealized_resources.contains(&z.id()));
    }
    assert!(timeline.lifetime(x.id()).is_some());
    assert!(timeline.lifetime(y.id()).is_some());
    Ok(())
}

#[test]
fn side_effect_task_is_kept() -> Result<()> {
    let mut graph = MockGraph::new();
    let readback = graph.add_render_task(
        "readback",
        |builder| {
            builder.side_effect();
            builder.create::<MockBuffer>("staging", buffer(4))
        },
        noop,
    );
    let readback = readback.id();
    assert!(graph.task(readback).map_or(false, |task| task.has_side_effect()));

    let timeline = graph.compile()?;
    assert_eq!(timeline.order(), vec![readback]);
    Ok(())
}

#[test]
fn culling_can_be_disabled() -> Result<()> {
    let settings = SettingsBuilder::new().culling(false).build();
    let mut graph = MockGraph::with_settings(settings);
    chain(&mut graph);
    graph.add_render_task("d", |builder| builder.create::<MockBuffer>("z", buffer(8)), noop);

    let timeline = graph.compile()?;
    assert_eq!(timeline.len(), 4);
    assert!(timeline.culled_tasks().is_empty());
    assert!(timeline.culled_resources().is_empty());
    assert_eq!(timeline.steps()[3].realized_resources, timeline.steps()[3].derealized_resources);
    Ok(())
}

#[test]
fn dangling_resource_is_reported() -> Result<()> {
    let mut graph = MockGraph::new();
    let w = *graph
        .add_render_task("old", |builder| builder.create::<MockBuffer>("w", buffer(8)), noop)
        .data();
    graph.clear();
    assert_eq!(graph.num_tasks(), 0);
    assert!(graph.resource(w).is_none());

    graph.add_render_task(
        "e",
        |builder| {
            builder.read(w);
        },
        noop,
    );
    assert_eq!(
        graph_error(graph.compile()),
        Error::DanglingResource {
            task: String::from("e"),
            resource: w.id(),
        }
    );
    Ok(())
}

#[test]
fn handle_from_other_graph_is_dangling() {
    let mut other = MockGraph::new();
    let foreign = *other
        .add_render_task("other", |builder| builder.create::<MockBuffer>("foreign", buffer(1)), noop)
        .data();

    // The first resource of this graph occupies the same arena slot as `foreign`.
    let mut graph = MockGraph::new();
    let local = *graph
        .add_render_task("local", |builder| builder.create::<MockBuffer>("local", buffer(1)), noop)
        .data();
    graph.add_render_task(
        "e",
        |builder| {
            builder.read(local);
            builder.write(foreign);
        },
        noop,
    );

    assert!(graph.resource(foreign).is_none());
    assert!(graph.actual(foreign).is_none());
    assert!(graph.resource(local).map_or(false, |node| node.readers().len() == 1));
    assert_eq!(
        graph_error(graph.compile()),
        Error::DanglingResource {
            task: String::from("e"),
            resource: foreign.id(),
        }
    );
}

#[test]
fn duplicate_creation_is_reported() {
    let mut graph = MockGraph::new();
    graph.add_render_task("first", |builder| builder.create::<MockBuffer>("gbuffer", buffer(8)), noop);
    graph.add_render_task("second", |builder| builder.create::<MockImage>("gbuffer", ImageInfo {
        width: 4,
        height: 4,
    }), noop);

    assert_eq!(
        graph_error(graph.compile()),
        Error::DuplicateCreation {
            resource: String::from("gbuffer"),
            task: String::from("second"),
        }
    );
}

#[test]
fn retained_name_clash_is_reported() {
    let mut graph = MockGraph::new();
    graph.add_render_task("first", |builder| builder.create::<MockBuffer>("swapchain", buffer(8)), noop);
    graph.add_retained_resource::<MockImage>("swapchain", Some(ImageInfo {
        width: 4,
        height: 4,
    }), None);

    assert_eq!(
        graph_error(graph.compile()),
        Error::DuplicateCreation {
            resource: String::from("swapchain"),
            task: String::from("<retained>"),
        }
    );
}

#[test]
fn unbound_retained_resource_is_reported() {
    let mut graph = MockGraph::new();
    let swapchain = graph.add_retained_resource::<MockImage>("swapchain", None, None);
    graph.add_render_task(
        "present",
        |builder| {
            builder.write(swapchain);
        },
        noop,
    );

    assert_eq!(graph_error(graph.compile()), Error::UnboundResource(String::from("swapchain")));
}

#[test]
fn compile_is_idempotent() -> Result<()> {
    let mut graph = MockGraph::new();
    chain(&mut graph);
    graph.add_render_task("d", |builder| builder.create::<MockBuffer>("z", buffer(8)), noop);

    let first = graph.compile()?.clone();
    let second = graph.compile()?.clone();
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn retained_resource_is_never_realized() -> Result<()> {
    let (mut device, _log) = MockDevice::new();
    let mut graph = MockGraph::new();
    let swapchain = graph.add_retained_resource::<MockImage>("swapchain", None, Some(device.external("swapchain")));
    let (_, y) = chain(&mut graph);
    let present = graph.add_render_task(
        "present",
        |builder| {
            builder.read(y);
            builder.write(swapchain);
        },
        noop,
    );
    let present = present.id();
    let history = graph.add_retained_resource::<MockImage>("history", None, Some(device.external("history")));
    graph.add_render_task(
        "sample history",
        |builder| {
            builder.read(history);
        },
        noop,
    );

    let timeline = graph.compile()?;
    assert!(timeline.step_of(present).is_some());
    assert_eq!(
        timeline.lifetime(swapchain.id()),
        Some(Lifetime {
            realize: None,
            derealize: None,
        })
    );
    for step in timeline.steps() {
        for id in [swapchain.id(), history.id()] {
            assert!(!step.realized_resources.contains(&id));
            assert!(!step.derealized_resources.contains(&id));
        }
    }
    Ok(())
}

#[test]
fn writing_retained_resource_keeps_task() -> Result<()> {
    let (mut device, _log) = MockDevice::new();
    let mut graph = MockGraph::new();
    let target = graph.add_retained_resource::<MockImage>("target", None, Some(device.external("target")));
    let blit = graph.add_render_task(
        "blit",
        |builder| {
            builder.write(target);
        },
        noop,
    );
    let blit = blit.id();

    let timeline = graph.compile()?;
    assert_eq!(timeline.order(), vec![blit]);
    Ok(())
}

#[test]
fn described_retained_resource_is_realized_at_first_use() -> Result<()> {
    let mut graph = MockGraph::new();
    let history = graph.add_retained_resource::<MockBuffer>("history", Some(buffer(64)), None);
    chain(&mut graph);
    graph.add_render_task(
        "accumulate",
        |builder| {
            builder.write(history);
        },
        noop,
    );

    let timeline = graph.compile()?;
    assert_eq!(
        timeline.lifetime(history.id()),
        Some(Lifetime {
            realize: Some(3),
            derealize: None,
        })
    );
    Ok(())
}

#[test]
fn builder_records_each_dependency_once() -> Result<()> {
    let mut graph = MockGraph::new();
    let (x, _) = chain(&mut graph);
    let task = graph.add_render_task(
        "f",
        |builder| {
            let own = builder.create::<MockBuffer>("own", buffer(2));
            builder.write(own);
            builder.read(own);
            builder.read(x);
            builder.read(x);
            builder.write(x);
            builder.write(x);
            builder.side_effect();
            own
        },
        noop,
    );

    assert_eq!(task.creates(), &[task.data().id()]);
    assert_eq!(task.reads(), &[x.id()]);
    assert_eq!(task.writes(), &[x.id()]);
    assert!(task.uses(x.id()));
    let own = *task.data();
    let id = task.id();

    let resource = graph.resource(own).expect("resource exists");
    assert_eq!(resource.creator(), Some(id));
    assert!(resource.readers().is_empty());
    assert!(resource.writers().is_empty());
    assert_eq!(graph.resource(x).map(|x| x.readers().len()), Some(2));
    Ok(())
}

#[test]
fn registration_invalidates_timeline() -> Result<()> {
    let mut graph = MockGraph::new();
    chain(&mut graph);
    graph.compile()?;
    assert!(graph.timeline().is_some());

    graph.add_render_task("late", |builder| builder.create::<MockBuffer>("late", buffer(1)), noop);
    assert!(graph.timeline().is_none());

    graph.compile()?;
    graph.add_retained_resource::<MockBuffer>("external", Some(buffer(1)), None);
    assert!(graph.timeline().is_none());

    graph.compile()?;
    graph.clear();
    assert!(graph.timeline().is_none());
    assert!(graph.resources().is_empty());
    Ok(())
}

#[test]
fn render_task_payload_is_typed() -> Result<()> {
    let mut graph = MockGraph::new();
    let (x, _) = chain(&mut graph);
    let first = graph.tasks().next().map(|task| task.id()).expect("task exists");

    let task = graph
        .render_task::<VirtualResource<MockBuffer>>(first)
        .expect("payload type matches");
    assert_eq!(*task.data(), x);
    assert!(graph.render_task::<u32>(first).is_none());
    Ok(())
}

#[test]
fn graphviz_shows_schedule() -> Result<()> {
    let mut graph = MockGraph::new();
    chain(&mut graph);
    graph.add_render_task("d", |builder| builder.create::<MockBuffer>("z", buffer(8)), noop);

    let dot = graph.dot()?;
    assert!(dot.contains("digraph"));
    assert!(!dot.contains("dashed"));

    graph.compile()?;
    let dot = graph.dot()?;
    assert!(dot.contains("MockBuffer: x"));
    assert!(dot.contains("#5e6df7"));
    assert!(dot.contains("dashed"));

    let path = std::env::temp_dir().join("framegraph_graphviz_shows_schedule.dot");
    graph.export_graphviz(&path)?;
    assert_eq!(std::fs::read_to_string(&path)?, dot);
    std::fs::remove_file(&path)?;
    Ok(())
}
