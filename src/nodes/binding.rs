//! Behavior binding: parse node text and (re)attach the matching behavior

use log::{debug, warn};
use thiserror::Error;

use super::graph::NodeGraph;
use super::interface::BehaviorError;
use super::node::NodeId;
use super::port::PortType;

/// Why a node's text failed to produce a working behavior
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error("unrecognized class '{0}'")]
    UnrecognizedClass(String),

    #[error("'{class}' failed to initialise: {reason}")]
    BehaviorInitFailed { class: String, reason: BehaviorError },
}

/// Result of rebinding a node. Failures only flip the node's validity; this
/// is for hosts that want to report why.
#[derive(Debug, Clone, PartialEq)]
pub enum BindOutcome {
    Bound { class: String },
    Invalid(BindError),
}

impl BindOutcome {
    pub fn is_bound(&self) -> bool {
        matches!(self, BindOutcome::Bound { .. })
    }

    pub fn error(&self) -> Option<&BindError> {
        match self {
            BindOutcome::Bound { .. } => None,
            BindOutcome::Invalid(error) => Some(error),
        }
    }
}

/// Node text split on whitespace into a class name and its arguments
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedText {
    pub class_name: String,
    pub args: Vec<String>,
}

impl ParsedText {
    /// `None` for blank text
    pub fn parse(text: &str) -> Option<Self> {
        let mut tokens = text.split_whitespace();
        let class_name = tokens.next()?.to_string();
        Some(Self {
            class_name,
            args: tokens.map(str::to_string).collect(),
        })
    }
}

impl NodeGraph {
    /// Replace the node's behavior from its current text.
    ///
    /// Runs unconditionally: the old behavior is discarded even when the text
    /// resolves to the same class and arguments. Events are queued, not
    /// dispatched.
    pub(crate) fn bind_node(&mut self, id: NodeId) -> BindOutcome {
        let (text, epoch) = match self.node_mut(id) {
            Some(node) => {
                node.binding_epoch += 1;
                node.behavior = None;
                (node.text.clone(), node.binding_epoch)
            }
            None => return BindOutcome::Invalid(BindError::UnrecognizedClass(String::new())),
        };

        let parsed = ParsedText::parse(&text).unwrap_or_default();
        let mut behavior = match self.registry().create(&parsed.class_name) {
            Some(behavior) => behavior,
            None => return self.fail_binding(id, BindError::UnrecognizedClass(parsed.class_name)),
        };

        if let Some(layout) = behavior.port_layout() {
            self.apply_port_types(id, PortType::Input, layout.inlets);
            self.apply_port_types(id, PortType::Output, layout.outlets);
        }

        let result = self.run_behavior(id, behavior.as_mut(), |behavior, context| {
            behavior.init(&parsed.args, context)
        });
        if let Err(reason) = result {
            return self.fail_binding(
                id,
                BindError::BehaviorInitFailed {
                    class: parsed.class_name,
                    reason,
                },
            );
        }

        let class = behavior.class_name().to_string();
        if let Some(node) = self.node_mut(id) {
            if node.binding_epoch == epoch {
                node.behavior = Some(behavior);
                node.bind_error = None;
            }
        }
        self.set_valid(id, true);
        debug!("Node {} bound to '{}' with {:?}", id, class, parsed.args);
        BindOutcome::Bound { class }
    }

    fn fail_binding(&mut self, id: NodeId, error: BindError) -> BindOutcome {
        match &error {
            BindError::UnrecognizedClass(class) if class.is_empty() => debug!("Node {} has no text to bind", id),
            BindError::UnrecognizedClass(_) => debug!("Node {}: {}", id, error),
            BindError::BehaviorInitFailed { .. } => warn!("Node {}: {}", id, error),
        }
        if let Some(node) = self.node_mut(id) {
            node.bind_error = Some(error.clone());
        }
        self.set_valid(id, false);
        BindOutcome::Invalid(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::events::{EventRecorder, GraphEvent};
    use crate::nodes::factory::DataType;
    use crate::nodes::interface::NodeData;
    use egui::Pos2;

    fn text_node(graph: &mut NodeGraph, text: &str) -> NodeId {
        graph.create_node(Pos2::ZERO, text, 0, 0)
    }

    #[test]
    fn test_parse_splits_on_whitespace() {
        let parsed = ParsedText::parse("  add \t 5  ").unwrap();
        assert_eq!(parsed.class_name, "add");
        assert_eq!(parsed.args, vec!["5".to_string()]);
        assert!(ParsedText::parse("   ").is_none());
    }

    #[test]
    fn test_add_five_plus_three() {
        let mut graph = NodeGraph::new();
        let add = text_node(&mut graph, "add 5");
        let sink = text_node(&mut graph, "sink");

        let node = graph.node(add).unwrap();
        assert!(node.is_valid());
        assert_eq!((node.inlet_count(), node.outlet_count()), (2, 1));
        assert_eq!(node.class_name(), Some("add"));
        assert_eq!(node.inlets()[0].data_type, DataType::Float);

        graph.connect(add, 0, sink, 0).unwrap();
        graph.deliver(add, 0, NodeData::Float(3.0)).unwrap();
        assert_eq!(graph.display(sink).as_deref(), Some("8"));
    }

    #[test]
    fn test_bogus_text_invalidates_regardless_of_prior_state() {
        let mut graph = NodeGraph::new();
        let id = text_node(&mut graph, "add 5");
        assert!(graph.node(id).unwrap().is_valid());

        let outcome = graph.set_node_text(id, "bogus").unwrap();
        assert_eq!(outcome, BindOutcome::Invalid(BindError::UnrecognizedClass("bogus".into())));

        let node = graph.node(id).unwrap();
        assert!(!node.is_valid());
        assert!(node.behavior().is_none());
        // ports keep their last configuration
        assert_eq!((node.inlet_count(), node.outlet_count()), (2, 1));
        assert!(matches!(node.bind_error(), Some(BindError::UnrecognizedClass(_))));

        let fresh = text_node(&mut graph, "bogus");
        assert!(!graph.node(fresh).unwrap().is_valid());
    }

    #[test]
    fn test_init_failure_discards_behavior() {
        let mut graph = NodeGraph::new();
        for text in ["math", "math frobnicate", "add five", "node x"] {
            let id = text_node(&mut graph, text);
            let node = graph.node(id).unwrap();
            assert!(!node.is_valid(), "{} should be invalid", text);
            assert!(node.behavior().is_none());
            assert!(
                matches!(node.bind_error(), Some(BindError::BehaviorInitFailed { .. })),
                "{}",
                text
            );
        }

        let id = text_node(&mut graph, "math frobnicate");
        let outcome = graph.rebind_node(id).unwrap();
        assert!(matches!(
            outcome.error(),
            Some(BindError::BehaviorInitFailed {
                reason: BehaviorError::UnknownOperator(_),
                ..
            })
        ));
    }

    #[test]
    fn test_text_change_events_are_ordered() {
        let mut graph = NodeGraph::new();
        let id = text_node(&mut graph, "");
        let recorder = EventRecorder::new();
        graph.add_observer(recorder.clone());

        graph.set_node_text(id, "add 5").unwrap();
        assert_eq!(
            recorder.take(),
            vec![
                GraphEvent::NodeTextChanged { node: id, text: "add 5".into() },
                GraphEvent::NodeInletCountChanged { node: id, count: 2 },
                GraphEvent::NodeOutletCountChanged { node: id, count: 1 },
                GraphEvent::NodeValidChanged { node: id, valid: true },
            ]
        );
    }

    #[test]
    fn test_rebinding_drops_connections_on_removed_ports() {
        let mut graph = NodeGraph::new();
        let a = text_node(&mut graph, "node 1 2");
        let b = text_node(&mut graph, "node 2 0");
        let low = graph.connect(a, 0, b, 0).unwrap();
        let high = graph.connect(a, 1, b, 1).unwrap();

        graph.set_node_text(a, "node 1 1").unwrap();
        assert!(graph.connection(low).is_some());
        assert!(graph.connection(high).is_none());
        assert_eq!(graph.node(a).unwrap().outlet_count(), 1);
    }

    #[test]
    fn test_source_add_sink_chain_is_idempotent() {
        let mut graph = NodeGraph::new();
        let source = text_node(&mut graph, "source");
        let add = text_node(&mut graph, "add 5");
        let sink = text_node(&mut graph, "sink");
        graph.connect(source, 0, add, 0).unwrap();
        graph.connect(add, 0, sink, 0).unwrap();

        graph.push_value(source, NodeData::Float(10.0)).unwrap();
        assert_eq!(graph.display(sink).as_deref(), Some("15"));
        graph.push_value(source, NodeData::Float(10.0)).unwrap();
        assert_eq!(graph.display(sink).as_deref(), Some("15"));
    }

    #[test]
    fn test_chain_through_tostring() {
        let mut graph = NodeGraph::new();
        let source = text_node(&mut graph, "source");
        let add = text_node(&mut graph, "add 5");
        let convert = text_node(&mut graph, "tostring");
        let sink = text_node(&mut graph, "sink");
        graph.connect(source, 0, add, 0).unwrap();
        graph.connect(add, 0, convert, 0).unwrap();
        graph.connect(convert, 0, sink, 0).unwrap();

        // text outlet cannot feed a float inlet
        assert!(graph.connect(convert, 0, add, 0).is_err());

        graph.push_value(source, NodeData::Float(10.0)).unwrap();
        assert_eq!(graph.display(sink).as_deref(), Some("15"));
    }

    #[test]
    fn test_feedback_loop_terminates() {
        let mut graph = NodeGraph::new();
        let relay = text_node(&mut graph, "node 1 1");
        let sink = text_node(&mut graph, "sink");
        graph.connect(relay, 0, relay, 0).unwrap();
        graph.connect(relay, 0, sink, 0).unwrap();

        graph.deliver(relay, 0, NodeData::Float(1.0)).unwrap();
        assert_eq!(graph.display(sink).as_deref(), Some("1"));
        // behavior is restored after the dropped re-entrant delivery
        assert!(graph.node(relay).unwrap().behavior().is_some());
    }
}
