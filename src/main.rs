//! Patchcanvas - headless walkthrough of the node graph and editor
//!
//! Builds a small patch, pushes a value through it, then drives the editor
//! with a scripted gesture sequence the way a canvas front end would.

use egui::{Key, Pos2, Vec2};
use env_logger::Env;
use log::{error, info, warn};

use patchcanvas::nodes::{LoggingObserver, NodeData, NodeGraph, NodeId, PortRef};
use patchcanvas::{EditorConfig, EditorEvent, GraphError, NodeEditor};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = EditorConfig::load_or_default();
    let mut graph = NodeGraph::new();
    graph.add_observer(LoggingObserver);
    info!("{} behavior classes registered", graph.registry().len());

    let source = match build_arithmetic_chain(&mut graph) {
        Ok(source) => source,
        Err(err) => {
            error!("Failed to build the arithmetic chain: {}", err);
            return;
        }
    };
    if let Err(err) = rewire_generic_boxes(&mut graph) {
        warn!("Generic box demo failed: {}", err);
    }

    let mut editor = NodeEditor::new(graph, &config);
    run_gestures(&mut editor, source);

    info!(
        "Finished with {} nodes and {} connections",
        editor.graph().node_count(),
        editor.graph().connection_count()
    );
}

/// source -> add 5 -> tostring 1 -> sink, then push 10 through it
fn build_arithmetic_chain(graph: &mut NodeGraph) -> Result<NodeId, GraphError> {
    let source = graph.create_node(Pos2::new(20.0, 20.0), "source", 0, 0);
    let add = graph.create_node(Pos2::new(20.0, 80.0), "add 5", 0, 0);
    let format = graph.create_node(Pos2::new(20.0, 140.0), "tostring 1", 0, 0);
    let sink = graph.create_node(Pos2::new(20.0, 200.0), "sink result", 0, 0);

    graph.connect(source, 0, add, 0)?;
    graph.connect(add, 0, format, 0)?;
    graph.connect(format, 0, sink, 0)?;

    graph.push_value(source, NodeData::Float(10.0))?;
    info!("sink shows {}", graph.display(sink).unwrap_or_default());
    Ok(source)
}

/// Shrinking a generic box's outlets drops the connection on the removed one
fn rewire_generic_boxes(graph: &mut NodeGraph) -> Result<(), GraphError> {
    let first = graph.create_node(Pos2::new(200.0, 20.0), "node 1 2", 0, 0);
    let second = graph.create_node(Pos2::new(200.0, 100.0), "node 1 1", 0, 0);
    graph.create_node(Pos2::new(300.0, 20.0), "node 3 2", 0, 0);

    graph.connect(first, 1, second, 0)?;
    info!("{} connections before rebinding node {}", graph.connection_count(), first);

    let outcome = graph.set_node_text(first, "node 1 1")?;
    info!(
        "node {} rebound (bound: {}), {} connections remain",
        first,
        outcome.is_bound(),
        graph.connection_count()
    );
    Ok(())
}

fn run_gestures(editor: &mut NodeEditor, source: NodeId) {
    let spot = Pos2::new(400.0, 20.0);
    editor.handle_event(EditorEvent::PointerPressed { pos: spot });
    editor.handle_event(EditorEvent::PointerReleased { pos: spot });
    editor.handle_event(EditorEvent::DoubleClicked { pos: spot });
    editor.handle_event(EditorEvent::TextInput("mul 2".into()));
    editor.handle_event(EditorEvent::KeyPressed(Key::Enter));

    let created = match editor.selection() {
        Some(patchcanvas::SceneItem::Node(id)) => id,
        other => {
            warn!("Expected the new node to be selected, found {:?}", other);
            return;
        }
    };

    let from = editor.port_anchor(PortRef::output(source, 0));
    let to = editor.port_anchor(PortRef::input(created, 0));
    if let (Some(from), Some(to)) = (from, to) {
        let inside = Vec2::new(0.0, 1.0);
        editor.handle_event(EditorEvent::PointerPressed { pos: from - inside });
        editor.handle_event(EditorEvent::PointerMoved { pos: to + inside });
        if let Some((_, _, will_connect)) = editor.drag_line() {
            info!("Drag line over inlet, will connect: {}", will_connect);
        }
        editor.handle_event(EditorEvent::PointerReleased { pos: to + inside });
    }

    if let Err(err) = editor.graph_mut().push_value(source, NodeData::Float(4.0)) {
        warn!("Push failed: {}", err);
    }
    info!(
        "node {} '{}' now shows {}",
        created,
        editor.graph().node(created).map(|node| node.text()).unwrap_or_default(),
        editor.graph().display(created).unwrap_or_default()
    );
    info!("{} items need repainting", editor.take_repaint_requests().len());
}
