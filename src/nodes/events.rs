//! Change notifications emitted by the node graph

use std::cell::RefCell;
use std::rc::Rc;

use egui::Pos2;
use log::debug;

use super::graph::{ConnectionId, NodeGraph};
use super::node::NodeId;

/// Identifier returned when registering an observer
pub type ObserverId = usize;

/// A settled change to the graph
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
    NodeTextChanged { node: NodeId, text: String },
    NodeValidChanged { node: NodeId, valid: bool },
    NodePosChanged { node: NodeId, position: Pos2 },
    NodeInletCountChanged { node: NodeId, count: usize },
    NodeOutletCountChanged { node: NodeId, count: usize },
    ConnectionAdded(ConnectionId),
    ConnectionRemoved(ConnectionId),
}

impl GraphEvent {
    /// Node the event is about, if it concerns a single node
    pub fn node(&self) -> Option<NodeId> {
        match self {
            GraphEvent::NodeAdded(node) | GraphEvent::NodeRemoved(node) => Some(*node),
            GraphEvent::NodeTextChanged { node, .. }
            | GraphEvent::NodeValidChanged { node, .. }
            | GraphEvent::NodePosChanged { node, .. }
            | GraphEvent::NodeInletCountChanged { node, .. }
            | GraphEvent::NodeOutletCountChanged { node, .. } => Some(*node),
            GraphEvent::ConnectionAdded(_) | GraphEvent::ConnectionRemoved(_) => None,
        }
    }

    /// Whether the event adds or removes a node or connection
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            GraphEvent::NodeAdded(_)
                | GraphEvent::NodeRemoved(_)
                | GraphEvent::ConnectionAdded(_)
                | GraphEvent::ConnectionRemoved(_)
        )
    }
}

/// Receives graph notifications after each mutation has been fully applied.
///
/// Handlers may mutate the graph they are given; any resulting events are
/// queued and delivered after the current one.
pub trait GraphObserver {
    fn on_graph_event(&mut self, event: &GraphEvent, graph: &mut NodeGraph);
}

impl<F> GraphObserver for F
where
    F: FnMut(&GraphEvent, &mut NodeGraph),
{
    fn on_graph_event(&mut self, event: &GraphEvent, graph: &mut NodeGraph) {
        self(event, graph)
    }
}

/// Logs every notification at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl GraphObserver for LoggingObserver {
    fn on_graph_event(&mut self, event: &GraphEvent, graph: &mut NodeGraph) {
        match event {
            GraphEvent::NodeAdded(id) => {
                let text = graph.node(*id).map(|node| node.text().to_string()).unwrap_or_default();
                debug!("node added: {} '{}'", id, text);
            }
            GraphEvent::NodeRemoved(id) => debug!("node removed: {}", id),
            GraphEvent::NodeTextChanged { node, text } => debug!("node {} text changed: '{}'", node, text),
            GraphEvent::NodeValidChanged { node, valid } => debug!("node {} valid: {}", node, valid),
            GraphEvent::NodePosChanged { node, position } => {
                debug!("node {} moved to ({}, {})", node, position.x, position.y)
            }
            GraphEvent::NodeInletCountChanged { node, count } => debug!("node {} inlets: {}", node, count),
            GraphEvent::NodeOutletCountChanged { node, count } => debug!("node {} outlets: {}", node, count),
            GraphEvent::ConnectionAdded(id) | GraphEvent::ConnectionRemoved(id) => {
                let connection = graph.connection(*id).or_else(|| graph.removed_connection(*id));
                match connection {
                    Some(connection) => debug!("{:?}: {} -> {}", event, connection.source, connection.dest),
                    None => debug!("{:?}", event),
                }
            }
        }
    }
}

/// Collects events into a shared buffer that outlives the registration
#[derive(Debug, Default, Clone)]
pub struct EventRecorder {
    events: Rc<RefCell<Vec<GraphEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything recorded so far
    pub fn take(&self) -> Vec<GraphEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn snapshot(&self) -> Vec<GraphEvent> {
        self.events.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl GraphObserver for EventRecorder {
    fn on_graph_event(&mut self, event: &GraphEvent, _graph: &mut NodeGraph) {
        self.events.borrow_mut().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_node_accessor() {
        assert_eq!(GraphEvent::NodeAdded(3).node(), Some(3));
        assert_eq!(GraphEvent::NodeValidChanged { node: 2, valid: true }.node(), Some(2));
        assert_eq!(GraphEvent::ConnectionAdded(1).node(), None);
        assert!(GraphEvent::ConnectionRemoved(1).is_structural());
        assert!(!GraphEvent::NodeTextChanged { node: 0, text: String::new() }.is_structural());
    }

    #[test]
    fn test_recorder_clones_share_buffer() {
        let recorder = EventRecorder::new();
        let mut observer = recorder.clone();
        let mut graph = NodeGraph::new();
        observer.on_graph_event(&GraphEvent::NodeAdded(0), &mut graph);
        assert_eq!(recorder.snapshot(), vec![GraphEvent::NodeAdded(0)]);
        assert_eq!(recorder.take().len(), 1);
        assert!(recorder.is_empty());
    }
}
