//! Node editor implementation
//!
//! [`NodeEditor`] turns pointer and keyboard gestures into graph mutations,
//! keeps the stacking order and edit/completion state in step with the graph,
//! and tells the renderer which items need repainting.

// Module declarations
pub mod completion;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod scene;

// Re-exports
pub use completion::{CompletionOverlay, CompletionProvider, CycleDirection, NoCompletion, VocabularyCompletion};
pub use geometry::{Geometry, MonospaceMetrics, NodeLayout, TextMetrics};
pub use input::EditorEvent;
pub use interaction::{ConnectionDrag, DragTarget, EditSession, InteractionManager, NodeDrag, NodeMode};
pub use scene::{Scene, SceneItem};

use std::collections::{BTreeSet, HashMap};

use egui::{Key, Pos2, Rect};
use log::{debug, info, warn};

use crate::config::EditorConfig;
use crate::constants;
use crate::nodes::{ConnectionId, EventRecorder, GraphEvent, NodeGraph, NodeId, PortRef};

/// What lies under the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Inlet(PortRef),
    Outlet(PortRef),
    Node(NodeId),
    Connection(ConnectionId),
}

impl HitTarget {
    /// Node owning the hit port or body
    pub fn node(&self) -> Option<NodeId> {
        match self {
            HitTarget::Inlet(port) | HitTarget::Outlet(port) => Some(port.node),
            HitTarget::Node(node) => Some(*node),
            HitTarget::Connection(_) => None,
        }
    }
}

/// Interactive editing layer over a [`NodeGraph`]
pub struct NodeEditor {
    graph: NodeGraph,
    interaction: InteractionManager,
    scene: Scene,
    geometry: Geometry,
    completion: Box<dyn CompletionProvider>,
    inbox: EventRecorder,
    repaint: BTreeSet<SceneItem>,
}

impl NodeEditor {
    /// Wrap `graph`. With no vocabulary configured, completion offers every
    /// registered class name.
    pub fn new(mut graph: NodeGraph, config: &EditorConfig) -> Self {
        let vocabulary = if config.vocabulary.is_empty() {
            graph.registry().class_names()
        } else {
            config.vocabulary.clone()
        };

        let inbox = EventRecorder::new();
        graph.add_observer(inbox.clone());

        let mut scene = Scene::new();
        let mut repaint = BTreeSet::new();
        for node in graph.nodes() {
            scene.insert(SceneItem::Node(node.id()));
            repaint.insert(SceneItem::Node(node.id()));
        }
        for connection in graph.connections() {
            scene.insert(SceneItem::Connection(connection.id));
            repaint.insert(SceneItem::Connection(connection.id));
        }

        Self {
            graph,
            interaction: InteractionManager::new(),
            scene,
            geometry: Geometry::new(config),
            completion: Box::new(VocabularyCompletion::new(vocabulary)),
            inbox,
            repaint,
        }
    }

    pub fn with_completion(mut self, provider: impl CompletionProvider + 'static) -> Self {
        self.completion = Box::new(provider);
        self
    }

    pub fn with_text_metrics(mut self, metrics: impl TextMetrics + 'static) -> Self {
        self.geometry = self.geometry.with_metrics(metrics);
        self
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    /// Programmatic access; the editor catches up on the next call
    pub fn graph_mut(&mut self) -> &mut NodeGraph {
        &mut self.graph
    }

    pub fn interaction(&self) -> &InteractionManager {
        &self.interaction
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    // ---- rendering collaborator ----

    /// Node boxes, laid out from the edit buffer while the node is edited
    pub fn node_layout(&self, id: NodeId) -> Option<NodeLayout> {
        let node = self.graph.node(id)?;
        let text = match &self.interaction.edit {
            Some(edit) if edit.node == id => edit.buffer.as_str(),
            _ => node.text(),
        };
        Some(
            self.geometry
                .layout(node.position(), text, node.inlet_count(), node.outlet_count(), node.is_valid()),
        )
    }

    pub fn port_anchor(&self, port: PortRef) -> Option<Pos2> {
        self.node_layout(port.node)?.anchor(port.port_type, port.index)
    }

    /// Outlet anchor and inlet anchor of a connection
    pub fn connection_endpoints(&self, id: ConnectionId) -> Option<(Pos2, Pos2)> {
        let connection = self.graph.connection(id)?;
        Some((self.port_anchor(connection.source)?, self.port_anchor(connection.dest)?))
    }

    /// Provisional line of a connection drag: start, end, and whether it
    /// would connect if released now
    pub fn drag_line(&self) -> Option<(Pos2, Pos2, bool)> {
        let drag = self.interaction.connection_drag?;
        let start = self.port_anchor(drag.source)?;
        let end = match drag.target {
            Some(target) if target.compatible => self.port_anchor(target.inlet).unwrap_or(drag.cursor),
            _ => drag.cursor,
        };
        Some((start, end, drag.will_connect()))
    }

    pub fn completion_overlay(&self) -> Option<&CompletionOverlay> {
        self.interaction.edit.as_ref()?.completion.as_ref()
    }

    pub fn edit_buffer(&self) -> Option<&str> {
        self.interaction.edit.as_ref().map(|edit| edit.buffer.as_str())
    }

    pub fn node_mode(&self, id: NodeId) -> NodeMode {
        self.interaction.node_mode(id)
    }

    pub fn selection(&self) -> Option<SceneItem> {
        self.interaction.selection
    }

    pub fn z_value(&self, item: SceneItem) -> f32 {
        self.scene.z(item)
    }

    /// Items whose appearance changed since the last call
    pub fn take_repaint_requests(&mut self) -> Vec<SceneItem> {
        self.sync_scene();
        std::mem::take(&mut self.repaint).into_iter().collect()
    }

    // ---- hit testing ----

    /// Topmost item under `pos`. Visible ports take precedence over node
    /// bodies and connections at any depth, so a connected outlet can still
    /// start another drag.
    pub fn hit_test(&self, pos: Pos2) -> Option<HitTarget> {
        let mut best_port: Option<(f32, HitTarget)> = None;
        let mut best: Option<(f32, u8, HitTarget)> = None;
        let mut consider = |z: f32, priority: u8, target: HitTarget| {
            let better = match best {
                Some((best_z, best_priority, _)) => z > best_z || (z == best_z && priority >= best_priority),
                None => true,
            };
            if better {
                best = Some((z, priority, target));
            }
        };

        for node in self.graph.nodes() {
            let id = node.id();
            let layout = match self.node_layout(id) {
                Some(layout) => layout,
                None => continue,
            };
            let z = self.scene.z(SceneItem::Node(id));

            if layout.ports_visible {
                let slop = constants::interaction::PORT_HIT_SLOP;
                let outlet = layout.outlets.iter().position(|rect| rect.expand(slop).contains(pos));
                let inlet = layout.inlets.iter().position(|rect| rect.expand(slop).contains(pos));
                let port = match (outlet, inlet) {
                    (Some(index), _) => Some(HitTarget::Outlet(PortRef::output(id, index))),
                    (None, Some(index)) => Some(HitTarget::Inlet(PortRef::input(id, index))),
                    (None, None) => None,
                };
                if let Some(port) = port {
                    if best_port.map_or(true, |(best_z, _)| z >= best_z) {
                        best_port = Some((z, port));
                    }
                    continue;
                }
            }

            if layout.rect.contains(pos) {
                consider(z, 1, HitTarget::Node(id));
            }
        }

        if let Some((_, port)) = best_port {
            return Some(port);
        }

        for connection in self.graph.connections() {
            if let Some((start, end)) = self.connection_endpoints(connection.id) {
                if geometry::distance_to_line_segment(pos, start, end) <= self.geometry.hit_tolerance {
                    consider(
                        self.scene.z(SceneItem::Connection(connection.id)),
                        0,
                        HitTarget::Connection(connection.id),
                    );
                }
            }
        }

        best.map(|(_, _, target)| target)
    }

    // ---- event handling ----

    /// Feed one gesture through the state machine. Returns whether it was
    /// consumed.
    pub fn handle_event(&mut self, event: EditorEvent) -> bool {
        self.sync_scene();
        let consumed = match event {
            EditorEvent::PointerPressed { pos } => self.pointer_pressed(pos),
            EditorEvent::PointerMoved { pos } => self.pointer_moved(pos),
            EditorEvent::PointerReleased { pos } => self.pointer_released(pos),
            EditorEvent::DoubleClicked { pos } => self.double_clicked(pos),
            EditorEvent::KeyPressed(key) => self.key_pressed(key),
            EditorEvent::TextInput(text) => self.text_input(&text),
        };
        self.sync_scene();
        consumed
    }

    fn pointer_pressed(&mut self, pos: Pos2) -> bool {
        match self.hit_test(pos) {
            Some(HitTarget::Outlet(port)) => {
                debug!("Starting connection drag from {}", port);
                self.interaction.connection_drag = Some(ConnectionDrag {
                    source: port,
                    cursor: pos,
                    target: None,
                });
                self.raise(SceneItem::Node(port.node));
                self.repaint.insert(SceneItem::DragLine);
                true
            }
            Some(HitTarget::Inlet(port)) => self.press_node(port.node, pos),
            Some(HitTarget::Node(id)) => self.press_node(id, pos),
            Some(HitTarget::Connection(id)) => {
                self.select_connection(id);
                true
            }
            None => {
                self.clear_selection();
                false
            }
        }
    }

    fn press_node(&mut self, id: NodeId, pos: Pos2) -> bool {
        // Clicks inside the edited node belong to the text caret
        if self.interaction.editing_node() == Some(id) {
            return true;
        }
        self.select_node(id);
        if let Some(node) = self.graph.node(id) {
            self.interaction.node_drag = Some(NodeDrag {
                node: id,
                grab_offset: pos - node.position(),
            });
        }
        true
    }

    fn pointer_moved(&mut self, pos: Pos2) -> bool {
        if let Some(mut drag) = self.interaction.connection_drag {
            drag.cursor = pos;
            drag.target = match self.hit_test(pos) {
                Some(HitTarget::Inlet(inlet)) => Some(DragTarget {
                    inlet,
                    compatible: self.can_connect(drag.source, inlet),
                }),
                _ => None,
            };
            self.interaction.connection_drag = Some(drag);
            self.repaint.insert(SceneItem::DragLine);
            return true;
        }

        if let Some(drag) = self.interaction.node_drag {
            if let Err(err) = self.graph.set_node_position(drag.node, pos - drag.grab_offset) {
                warn!("Stopping node drag: {}", err);
                self.interaction.node_drag = None;
            }
            return true;
        }
        false
    }

    fn can_connect(&self, source: PortRef, inlet: PortRef) -> bool {
        match (self.graph.port(source), self.graph.port(inlet)) {
            (Some(outlet), Some(input)) => {
                outlet.data_type.can_connect_to(&input.data_type)
                    && self
                        .graph
                        .find_connections_between(source.node, source.index, inlet.node, inlet.index)
                        .is_empty()
            }
            _ => false,
        }
    }

    fn pointer_released(&mut self, pos: Pos2) -> bool {
        let was_dragging_node = self.interaction.node_drag.take().is_some();

        let drag = match self.interaction.connection_drag.take() {
            Some(drag) => drag,
            None => return was_dragging_node,
        };
        self.repaint.insert(SceneItem::DragLine);

        let inlet = match self.hit_test(pos) {
            Some(HitTarget::Inlet(inlet)) => inlet,
            _ => {
                debug!("Discarding provisional connection from {}", drag.source);
                return true;
            }
        };

        match self
            .graph
            .connect(drag.source.node, drag.source.index, inlet.node, inlet.index)
        {
            Ok(id) => {
                self.sync_scene();
                self.raise(SceneItem::Connection(id));
            }
            Err(err) => debug!("Discarding provisional connection: {}", err),
        }
        true
    }

    fn double_clicked(&mut self, pos: Pos2) -> bool {
        match self.hit_test(pos) {
            None => {
                self.clear_selection();
                let id = self.graph.create_node(pos, "", 0, 0);
                self.sync_scene();
                debug!("Created node {} from canvas activation", id);
                self.enter_edit_mode(id)
            }
            Some(HitTarget::Connection(_)) => false,
            Some(target) => match target.node() {
                Some(id) => self.enter_edit_mode(id),
                None => false,
            },
        }
    }

    fn key_pressed(&mut self, key: Key) -> bool {
        if !self.interaction.is_editing() {
            return match key {
                Key::Backspace | Key::Delete => self.delete_selection(),
                _ => false,
            };
        }

        match key {
            Key::Enter => self.exit_edit_mode(false),
            Key::Escape => {
                if !self.dismiss_completion() {
                    self.exit_edit_mode(true);
                }
            }
            Key::ArrowDown => self.cycle_completion(CycleDirection::Forward),
            Key::ArrowUp => self.cycle_completion(CycleDirection::Backward),
            Key::Tab => {}
            Key::Backspace => {
                if let Some(edit) = self.interaction.edit.as_mut() {
                    edit.buffer.pop();
                }
                self.buffer_changed();
            }
            _ => return false,
        }
        true
    }

    fn text_input(&mut self, text: &str) -> bool {
        let edit = match self.interaction.edit.as_mut() {
            Some(edit) => edit,
            None => return false,
        };
        let printable: String = text.chars().filter(|c| !c.is_control()).collect();
        if !printable.is_empty() {
            edit.buffer.push_str(&printable);
            self.buffer_changed();
        }
        true
    }

    fn buffer_changed(&mut self) {
        self.refresh_completion();
        if let Some(node) = self.interaction.editing_node() {
            self.request_node_repaint(node);
        }
    }

    fn refresh_completion(&mut self) {
        if let Some(edit) = self.interaction.edit.as_mut() {
            let candidates = self.completion.complete(edit.completion_prefix());
            edit.completion = (!candidates.is_empty()).then(|| CompletionOverlay::new(candidates));
        }
    }

    // ---- programmatic transitions ----

    /// Select a node and raise it with its connections, committing any edit
    /// on another node first
    pub fn select_node(&mut self, id: NodeId) {
        self.sync_scene();
        if self.interaction.editing_node().is_some_and(|editing| editing != id) {
            self.exit_edit_mode(false);
        }
        if !self.graph.contains_node(id) {
            return;
        }
        self.repaint_selection();
        self.interaction.select_node(id);
        self.raise(SceneItem::Node(id));
    }

    pub fn select_connection(&mut self, id: ConnectionId) {
        self.sync_scene();
        if self.interaction.is_editing() {
            self.exit_edit_mode(false);
        }
        if self.graph.connection(id).is_none() {
            return;
        }
        self.repaint_selection();
        self.interaction.select_connection(id);
        self.raise(SceneItem::Connection(id));
    }

    /// Deselect, committing an edit in progress
    pub fn clear_selection(&mut self) {
        self.sync_scene();
        if self.interaction.is_editing() {
            self.exit_edit_mode(false);
        }
        self.repaint_selection();
        self.interaction.clear_selection();
    }

    /// Remove the selected node or connection. Ignored while editing.
    pub fn delete_selection(&mut self) -> bool {
        self.sync_scene();
        if self.interaction.is_editing() {
            return false;
        }
        let deleted = match self.interaction.selection.take() {
            Some(SceneItem::Node(id)) => self.graph.remove_node(id),
            Some(SceneItem::Connection(id)) => self.graph.disconnect(id),
            _ => return false,
        };
        if let Err(err) = &deleted {
            warn!("Nothing deleted: {}", err);
        }
        self.sync_scene();
        deleted.is_ok()
    }

    /// Start editing a node's text; completion is queried immediately
    pub fn enter_edit_mode(&mut self, id: NodeId) -> bool {
        self.sync_scene();
        if self.interaction.editing_node() == Some(id) {
            return true;
        }
        self.select_node(id);

        let text = match self.graph.node(id) {
            Some(node) => node.text().to_string(),
            None => return false,
        };
        self.interaction.edit = Some(EditSession::new(id, &text));
        self.refresh_completion();
        self.request_node_repaint(id);
        debug!("Editing node {} '{}'", id, text);
        true
    }

    /// Leave edit mode. A commit accepts the highlighted candidate and
    /// rebinds the node only when its text actually changed; a revert
    /// discards the buffer.
    pub fn exit_edit_mode(&mut self, revert: bool) {
        self.sync_scene();
        let mut edit = match self.interaction.edit.take() {
            Some(edit) => edit,
            None => return,
        };
        let node = edit.node;

        if revert {
            debug!("Reverted edit on node {}", node);
        } else {
            let accepted = edit
                .completion
                .as_ref()
                .and_then(|overlay| overlay.highlighted_candidate())
                .map(str::to_string);
            if let Some(candidate) = accepted {
                edit.replace_first_token(&candidate);
            }

            if edit.buffer == edit.original_text {
                debug!("Edit on node {} left text unchanged", node);
            } else {
                match self.graph.set_node_text(node, edit.buffer.as_str()) {
                    Ok(outcome) => match outcome.error() {
                        Some(err) => info!("Node {} is invalid: {}", node, err),
                        None => debug!("Node {} committed '{}'", node, edit.buffer),
                    },
                    Err(err) => warn!("Could not commit edit: {}", err),
                }
            }
        }

        self.request_node_repaint(node);
        self.sync_scene();
    }

    /// Hide the completion overlay, keeping the text. Returns whether one was
    /// showing.
    pub fn dismiss_completion(&mut self) -> bool {
        self.sync_scene();
        let dismissed = self
            .interaction
            .edit
            .as_mut()
            .and_then(|edit| edit.completion.take())
            .is_some();
        if dismissed {
            if let Some(node) = self.interaction.editing_node() {
                self.repaint.insert(SceneItem::Node(node));
            }
        }
        dismissed
    }

    pub fn cycle_completion(&mut self, direction: CycleDirection) {
        self.sync_scene();
        if let Some(edit) = self.interaction.edit.as_mut() {
            if let Some(overlay) = edit.completion.as_mut() {
                overlay.cycle(direction);
                self.repaint.insert(SceneItem::Node(edit.node));
            }
        }
    }

    // ---- scene bookkeeping ----

    fn raise(&mut self, item: SceneItem) {
        let bounds = self.item_bounds();
        let lookup = |item: SceneItem| bounds.get(&item).copied();

        self.scene.raise(item, lookup);
        self.repaint.insert(item);
        if let SceneItem::Node(id) = item {
            let connections = self.graph.node(id).map(|node| node.connection_ids()).unwrap_or_default();
            for connection in connections {
                self.scene.raise(SceneItem::Connection(connection), lookup);
                self.repaint.insert(SceneItem::Connection(connection));
            }
        }
    }

    fn item_bounds(&self) -> HashMap<SceneItem, Rect> {
        let mut bounds = HashMap::new();
        for node in self.graph.nodes() {
            if let Some(layout) = self.node_layout(node.id()) {
                bounds.insert(SceneItem::Node(node.id()), layout.rect);
            }
        }
        for connection in self.graph.connections() {
            if let Some((start, end)) = self.connection_endpoints(connection.id) {
                bounds.insert(
                    SceneItem::Connection(connection.id),
                    geometry::segment_bounds(start, end, constants::interaction::CONNECTION_HALF_WIDTH),
                );
            }
        }
        bounds
    }

    fn repaint_selection(&mut self) {
        if let Some(item) = self.interaction.selection {
            self.repaint.insert(item);
        }
    }

    /// A node's box changed: repaint it and re-route its connections
    fn request_node_repaint(&mut self, id: NodeId) {
        self.repaint.insert(SceneItem::Node(id));
        if let Some(node) = self.graph.node(id) {
            for connection in node.connection_ids() {
                self.repaint.insert(SceneItem::Connection(connection));
            }
        }
    }

    /// Apply graph notifications received since the last sync
    fn sync_scene(&mut self) {
        for event in self.inbox.take() {
            match event {
                GraphEvent::NodeAdded(id) => {
                    self.scene.insert(SceneItem::Node(id));
                    self.repaint.insert(SceneItem::Node(id));
                }
                GraphEvent::NodeRemoved(id) => {
                    if self.interaction.connection_drag.is_some_and(|drag| drag.source.node == id) {
                        self.repaint.insert(SceneItem::DragLine);
                    }
                    self.scene.remove(SceneItem::Node(id));
                    self.interaction.forget_node(id);
                    self.repaint.insert(SceneItem::Node(id));
                }
                GraphEvent::ConnectionAdded(id) => {
                    self.scene.insert(SceneItem::Connection(id));
                    self.repaint.insert(SceneItem::Connection(id));
                }
                GraphEvent::ConnectionRemoved(id) => {
                    self.scene.remove(SceneItem::Connection(id));
                    self.interaction.forget_connection(id);
                    self.repaint.insert(SceneItem::Connection(id));
                }
                other => {
                    if let Some(node) = other.node() {
                        self.request_node_repaint(node);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{DataType, NodeData};

    fn editor() -> NodeEditor {
        NodeEditor::new(NodeGraph::new(), &EditorConfig::default())
    }

    fn type_text(editor: &mut NodeEditor, text: &str) {
        editor.handle_event(EditorEvent::TextInput(text.to_string()));
    }

    fn key(editor: &mut NodeEditor, key: Key) -> bool {
        editor.handle_event(EditorEvent::KeyPressed(key))
    }

    fn recorder(editor: &mut NodeEditor) -> EventRecorder {
        let recorder = EventRecorder::new();
        editor.graph_mut().add_observer(recorder.clone());
        recorder
    }

    fn press_and_release(editor: &mut NodeEditor, pos: Pos2) {
        editor.handle_event(EditorEvent::PointerPressed { pos });
        editor.handle_event(EditorEvent::PointerReleased { pos });
    }

    #[test]
    fn test_double_click_on_canvas_creates_editing_node() {
        let mut editor = editor();
        let pos = Pos2::new(40.0, 30.0);
        assert!(editor.handle_event(EditorEvent::DoubleClicked { pos }));

        let id = editor.graph().node_ids()[0];
        let node = editor.graph().node(id).unwrap();
        assert_eq!(node.position(), pos);
        assert!(!node.is_valid());
        assert_eq!((node.inlet_count(), node.outlet_count()), (0, 0));

        // empty buffer offers the whole vocabulary
        assert_eq!(editor.node_mode(id), NodeMode::Suggesting);
        let registry_size = editor.graph().registry().len();
        assert_eq!(editor.completion_overlay().unwrap().candidates().len(), registry_size);
    }

    #[test]
    fn test_typing_and_commit_binds_node() {
        let mut editor = editor();
        editor.handle_event(EditorEvent::DoubleClicked { pos: Pos2::ZERO });
        let id = editor.graph().node_ids()[0];

        type_text(&mut editor, "ad");
        assert_eq!(editor.completion_overlay().unwrap().candidates(), &["add".to_string()]);
        type_text(&mut editor, "d 5");
        // arguments do not stop the first token from being completed
        assert_eq!(editor.node_mode(id), NodeMode::Suggesting);
        assert_eq!(editor.completion_overlay().unwrap().candidates(), &["add".to_string()]);
        // the graph still holds the old text until commit
        assert_eq!(editor.graph().node(id).unwrap().text(), "");

        assert!(key(&mut editor, Key::Enter));
        let node = editor.graph().node(id).unwrap();
        assert_eq!(node.text(), "add 5");
        assert!(node.is_valid());
        assert_eq!(node.inlet_count(), 2);
        assert_eq!(editor.node_mode(id), NodeMode::Selected);
    }

    #[test]
    fn test_unchanged_commit_does_not_rebind() {
        let mut editor = editor();
        let id = editor.graph_mut().create_node(Pos2::ZERO, "add 5", 0, 0);
        let events = recorder(&mut editor);

        assert!(editor.enter_edit_mode(id));
        key(&mut editor, Key::Enter);
        assert!(events
            .take()
            .iter()
            .all(|event| !matches!(event, GraphEvent::NodeTextChanged { .. })));

        editor.enter_edit_mode(id);
        key(&mut editor, Key::Backspace);
        type_text(&mut editor, "7");
        key(&mut editor, Key::Enter);
        assert!(events
            .take()
            .contains(&GraphEvent::NodeTextChanged { node: id, text: "add 7".into() }));
    }

    #[test]
    fn test_escape_dismisses_then_reverts() {
        let mut editor = editor();
        let id = editor.graph_mut().create_node(Pos2::ZERO, "sink", 0, 0);
        let events = recorder(&mut editor);

        editor.enter_edit_mode(id);
        assert_eq!(editor.node_mode(id), NodeMode::Suggesting);

        key(&mut editor, Key::Escape);
        assert_eq!(editor.node_mode(id), NodeMode::Editing);
        assert_eq!(editor.edit_buffer(), Some("sink"));

        type_text(&mut editor, "x");
        key(&mut editor, Key::Escape);
        assert_eq!(editor.node_mode(id), NodeMode::Selected);
        assert_eq!(editor.graph().node(id).unwrap().text(), "sink");
        assert!(events.is_empty());
    }

    #[test]
    fn test_arrow_keys_cycle_and_enter_accepts() {
        let mut editor = NodeEditor::new(NodeGraph::new(), &EditorConfig::default())
            .with_completion(VocabularyCompletion::new(["add", "sink", "source"]));
        editor.handle_event(EditorEvent::DoubleClicked { pos: Pos2::ZERO });
        let id = editor.graph().node_ids()[0];

        key(&mut editor, Key::ArrowUp);
        assert_eq!(editor.completion_overlay().unwrap().highlighted_candidate(), Some("source"));
        key(&mut editor, Key::ArrowDown);
        assert_eq!(editor.completion_overlay().unwrap().highlighted_candidate(), Some("add"));
        assert!(key(&mut editor, Key::Tab));

        key(&mut editor, Key::Enter);
        assert_eq!(editor.graph().node(id).unwrap().text(), "add");
        assert!(editor.graph().node(id).unwrap().is_valid());
    }

    #[test]
    fn test_drag_from_outlet_to_inlet_connects() {
        let mut editor = editor();
        let source = editor.graph_mut().create_node(Pos2::ZERO, "source", 0, 0);
        let sink = editor.graph_mut().create_node(Pos2::new(0.0, 100.0), "sink", 0, 0);

        let outlet = editor.port_anchor(PortRef::output(source, 0)).unwrap();
        let inlet = editor.port_anchor(PortRef::input(sink, 0)).unwrap();
        assert_eq!(outlet, Pos2::new(5.0, 20.0));
        assert_eq!(inlet, Pos2::new(5.0, 100.0));

        editor.handle_event(EditorEvent::PointerPressed { pos: Pos2::new(5.0, 18.5) });
        editor.handle_event(EditorEvent::PointerMoved { pos: Pos2::new(60.0, 60.0) });
        assert_eq!(editor.drag_line(), Some((outlet, Pos2::new(60.0, 60.0), false)));

        editor.handle_event(EditorEvent::PointerMoved { pos: Pos2::new(5.0, 101.5) });
        assert_eq!(editor.drag_line(), Some((outlet, inlet, true)));

        editor.handle_event(EditorEvent::PointerReleased { pos: Pos2::new(5.0, 101.5) });
        assert!(editor.drag_line().is_none());
        let connections = editor.graph().find_connections_between(source, 0, sink, 0);
        assert_eq!(connections.len(), 1);

        let connection = SceneItem::Connection(connections[0]);
        assert!(editor.z_value(connection) > editor.z_value(SceneItem::Node(sink)));
        assert!(editor.take_repaint_requests().contains(&connection));

        editor.graph_mut().push_value(source, NodeData::Float(3.0)).unwrap();
        assert_eq!(editor.graph().display(sink).as_deref(), Some("3"));
    }

    #[test]
    fn test_release_over_incompatible_inlet_discards() {
        let mut editor = editor();
        let text = editor.graph_mut().create_node(Pos2::ZERO, "tostring", 0, 0);
        let add = editor.graph_mut().create_node(Pos2::new(0.0, 100.0), "add", 0, 0);
        assert_eq!(
            editor.graph().port(PortRef::output(text, 0)).map(|p| p.data_type),
            Some(DataType::Text)
        );

        editor.handle_event(EditorEvent::PointerPressed { pos: Pos2::new(5.0, 18.5) });
        editor.handle_event(EditorEvent::PointerMoved { pos: Pos2::new(5.0, 101.5) });
        let drag = editor.interaction().connection_drag.unwrap();
        assert_eq!(
            drag.target,
            Some(DragTarget {
                inlet: PortRef::input(add, 0),
                compatible: false,
            })
        );

        editor.handle_event(EditorEvent::PointerReleased { pos: Pos2::new(5.0, 101.5) });
        assert_eq!(editor.graph().connection_count(), 0);

        // released over empty canvas
        editor.handle_event(EditorEvent::PointerPressed { pos: Pos2::new(5.0, 18.5) });
        editor.handle_event(EditorEvent::PointerReleased { pos: Pos2::new(300.0, 300.0) });
        assert_eq!(editor.graph().connection_count(), 0);
        assert!(editor.interaction().connection_drag.is_none());
    }

    #[test]
    fn test_backspace_deletes_selected_node_with_connections() {
        let mut editor = editor();
        let source = editor.graph_mut().create_node(Pos2::ZERO, "source", 0, 0);
        let sink = editor.graph_mut().create_node(Pos2::new(0.0, 100.0), "sink", 0, 0);
        editor.graph_mut().connect(source, 0, sink, 0).unwrap();

        press_and_release(&mut editor, Pos2::new(20.0, 110.0));
        assert_eq!(editor.node_mode(sink), NodeMode::Selected);

        assert!(key(&mut editor, Key::Backspace));
        assert!(!editor.graph().contains_node(sink));
        assert_eq!(editor.graph().connection_count(), 0);
        assert!(editor.selection().is_none());
        assert!(!editor.scene().contains(SceneItem::Node(sink)));
    }

    #[test]
    fn test_backspace_while_editing_edits_text() {
        let mut editor = editor();
        let id = editor.graph_mut().create_node(Pos2::ZERO, "add 5", 0, 0);
        editor.enter_edit_mode(id);

        key(&mut editor, Key::Backspace);
        assert!(editor.graph().contains_node(id));
        assert_eq!(editor.edit_buffer(), Some("add "));
    }

    #[test]
    fn test_select_and_delete_connection() {
        let mut editor = editor();
        let source = editor.graph_mut().create_node(Pos2::ZERO, "source", 0, 0);
        let sink = editor.graph_mut().create_node(Pos2::new(0.0, 100.0), "sink", 0, 0);
        let id = editor.graph_mut().connect(source, 0, sink, 0).unwrap();

        assert_eq!(editor.hit_test(Pos2::new(6.0, 60.0)), Some(HitTarget::Connection(id)));
        press_and_release(&mut editor, Pos2::new(6.0, 60.0));
        assert_eq!(editor.selection(), Some(SceneItem::Connection(id)));

        assert!(key(&mut editor, Key::Delete));
        assert!(editor.graph().connection(id).is_none());
        assert!(editor.graph().contains_node(source));
        assert!(editor.graph().contains_node(sink));
    }

    #[test]
    fn test_dragging_node_moves_it() {
        let mut editor = editor();
        let source = editor.graph_mut().create_node(Pos2::ZERO, "source", 0, 0);
        let sink = editor.graph_mut().create_node(Pos2::new(0.0, 100.0), "sink", 0, 0);
        let id = editor.graph_mut().connect(source, 0, sink, 0).unwrap();
        editor.take_repaint_requests();

        editor.handle_event(EditorEvent::PointerPressed { pos: Pos2::new(20.0, 10.0) });
        editor.handle_event(EditorEvent::PointerMoved { pos: Pos2::new(70.0, 60.0) });
        editor.handle_event(EditorEvent::PointerReleased { pos: Pos2::new(70.0, 60.0) });

        assert_eq!(editor.graph().node(source).unwrap().position(), Pos2::new(50.0, 50.0));
        assert_eq!(editor.connection_endpoints(id).map(|(start, _)| start), Some(Pos2::new(55.0, 70.0)));
        let repaint = editor.take_repaint_requests();
        assert!(repaint.contains(&SceneItem::Node(source)));
        assert!(repaint.contains(&SceneItem::Connection(id)));
    }

    #[test]
    fn test_click_on_canvas_commits_edit() {
        let mut editor = editor();
        editor.handle_event(EditorEvent::DoubleClicked { pos: Pos2::ZERO });
        let id = editor.graph().node_ids()[0];
        type_text(&mut editor, "sink");

        press_and_release(&mut editor, Pos2::new(400.0, 400.0));
        assert_eq!(editor.node_mode(id), NodeMode::Idle);
        assert_eq!(editor.graph().node(id).unwrap().text(), "sink");
        assert!(editor.graph().node(id).unwrap().is_valid());
    }

    #[test]
    fn test_selecting_raises_over_overlapping_node() {
        let mut editor = editor();
        let lower = editor.graph_mut().create_node(Pos2::ZERO, "source", 0, 0);
        let upper = editor.graph_mut().create_node(Pos2::new(10.0, 5.0), "sink", 0, 0);

        editor.select_node(upper);
        editor.select_node(lower);
        assert!(editor.z_value(SceneItem::Node(lower)) > editor.z_value(SceneItem::Node(upper)));
        assert_eq!(editor.hit_test(Pos2::new(30.0, 12.0)), Some(HitTarget::Node(lower)));
    }

    #[test]
    fn test_external_removal_ends_edit() {
        let mut editor = editor();
        let id = editor.graph_mut().create_node(Pos2::ZERO, "add", 0, 0);
        editor.enter_edit_mode(id);

        editor.graph_mut().remove_node(id).unwrap();
        let repaint = editor.take_repaint_requests();
        assert!(repaint.contains(&SceneItem::Node(id)));
        assert!(!editor.interaction().is_editing());
        assert!(editor.selection().is_none());
    }

    #[test]
    fn test_live_layout_follows_buffer() {
        let mut editor = editor();
        let id = editor.graph_mut().create_node(Pos2::ZERO, "sink", 0, 0);
        let committed = editor.node_layout(id).unwrap().rect.width();

        editor.enter_edit_mode(id);
        type_text(&mut editor, " with a long label");
        assert!(editor.node_layout(id).unwrap().rect.width() > committed);

        // first escape hides the "sink" suggestion, the second reverts
        key(&mut editor, Key::Escape);
        assert_eq!(editor.node_mode(id), NodeMode::Editing);
        key(&mut editor, Key::Escape);
        assert_eq!(editor.node_layout(id).unwrap().rect.width(), committed);
    }

    #[test]
    fn test_accepting_candidate_keeps_arguments() {
        let mut editor = editor();
        editor.handle_event(EditorEvent::DoubleClicked { pos: Pos2::ZERO });
        let id = editor.graph().node_ids()[0];

        type_text(&mut editor, "mu 3");
        assert_eq!(editor.completion_overlay().unwrap().candidates(), &["mul".to_string()]);
        key(&mut editor, Key::ArrowDown);
        key(&mut editor, Key::Enter);

        let node = editor.graph().node(id).unwrap();
        assert_eq!(node.text(), "mul 3");
        assert!(node.is_valid());
    }

    #[test]
    fn test_fan_out_from_connected_outlet() {
        let mut editor = editor();
        let source = editor.graph_mut().create_node(Pos2::ZERO, "source", 0, 0);
        let first = editor.graph_mut().create_node(Pos2::new(0.0, 100.0), "sink", 0, 0);
        let second = editor.graph_mut().create_node(Pos2::new(100.0, 100.0), "sink", 0, 0);

        let outlet = Pos2::new(5.0, 18.5);
        editor.handle_event(EditorEvent::PointerPressed { pos: outlet });
        editor.handle_event(EditorEvent::PointerMoved { pos: Pos2::new(5.0, 101.5) });
        editor.handle_event(EditorEvent::PointerReleased { pos: Pos2::new(5.0, 101.5) });
        assert_eq!(editor.graph().connection_count(), 1);

        // the new connection sits above the outlet but must not shadow it
        assert_eq!(editor.hit_test(outlet), Some(HitTarget::Outlet(PortRef::output(source, 0))));
        editor.handle_event(EditorEvent::PointerPressed { pos: outlet });
        assert!(editor.interaction().connection_drag.is_some());
        editor.handle_event(EditorEvent::PointerMoved { pos: Pos2::new(105.0, 101.5) });
        editor.handle_event(EditorEvent::PointerReleased { pos: Pos2::new(105.0, 101.5) });

        assert_eq!(editor.graph().connection_count(), 2);
        assert_eq!(editor.graph().find_connections_between(source, 0, first, 0).len(), 1);
        assert_eq!(editor.graph().find_connections_between(source, 0, second, 0).len(), 1);

        editor.graph_mut().push_value(source, NodeData::Float(2.0)).unwrap();
        assert_eq!(editor.graph().display(first).as_deref(), Some("2"));
        assert_eq!(editor.graph().display(second).as_deref(), Some("2"));
    }

    #[test]
    fn test_programmatic_select_sees_external_nodes() {
        let mut editor = editor();
        let lower = editor.graph_mut().create_node(Pos2::ZERO, "source", 0, 0);
        let upper = editor.graph_mut().create_node(Pos2::new(10.0, 5.0), "sink", 0, 0);

        editor.select_node(upper);
        assert!(editor.z_value(SceneItem::Node(upper)) > editor.z_value(SceneItem::Node(lower)));
        editor.select_node(lower);
        assert!(editor.z_value(SceneItem::Node(lower)) > editor.z_value(SceneItem::Node(upper)));
        assert_eq!(editor.hit_test(Pos2::new(30.0, 12.0)), Some(HitTarget::Node(lower)));
    }

    #[test]
    fn test_raise_carries_connections_along() {
        let mut editor = editor();
        let source = editor.graph_mut().create_node(Pos2::ZERO, "source", 0, 0);
        let sibling = editor.graph_mut().create_node(Pos2::new(10.0, 5.0), "sink", 0, 0);
        let sink = editor.graph_mut().create_node(Pos2::new(0.0, 100.0), "sink", 0, 0);
        let id = editor.graph_mut().connect(source, 0, sink, 0).unwrap();

        editor.select_node(sibling);
        editor.select_node(source);

        let connection = editor.z_value(SceneItem::Connection(id));
        let node = editor.z_value(SceneItem::Node(source));
        assert!(node > editor.z_value(SceneItem::Node(sibling)));
        assert!(connection > node);
        assert!(connection > editor.z_value(SceneItem::Node(sibling)));
    }
}
