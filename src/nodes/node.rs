//! Node types and core node functionality

use std::fmt;

use egui::Pos2;

use super::binding::BindError;
use super::factory::DataType;
use super::graph::ConnectionId;
use super::interface::Behavior;
use super::port::{Port, PortId, PortType};

/// Unique identifier for a node
pub type NodeId = usize;

/// A box in the graph: free-form text, ordered inlets and outlets, and the
/// behavior its text resolved to.
///
/// Nodes are only mutated through [`NodeGraph`](super::graph::NodeGraph), which
/// keeps the port lists consistent with live connections.
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) position: Pos2,
    pub(crate) text: String,
    pub(crate) inlets: Vec<Port>,
    pub(crate) outlets: Vec<Port>,
    pub(crate) valid: bool,
    pub(crate) behavior: Option<Box<dyn Behavior>>,
    pub(crate) bind_error: Option<BindError>,
    /// Bumped on every rebind so an in-flight behavior knows it was replaced
    pub(crate) binding_epoch: u64,
}

impl Node {
    /// Creates an unbound, invalid node with untyped ports
    pub(crate) fn new(id: NodeId, position: Pos2, text: impl Into<String>, inlets: usize, outlets: usize) -> Self {
        Self {
            id,
            position,
            text: text.into(),
            inlets: (0..inlets)
                .map(|index| Port::new(index, PortType::Input, DataType::Any))
                .collect(),
            outlets: (0..outlets)
                .map(|index| Port::new(index, PortType::Output, DataType::Any))
                .collect(),
            valid: false,
            behavior: None,
            bind_error: None,
            binding_epoch: 0,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Pos2 {
        self.position
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the text resolved to a successfully initialised behavior
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn inlets(&self) -> &[Port] {
        &self.inlets
    }

    pub fn outlets(&self) -> &[Port] {
        &self.outlets
    }

    pub fn inlet(&self, index: PortId) -> Option<&Port> {
        self.inlets.get(index)
    }

    pub fn outlet(&self, index: PortId) -> Option<&Port> {
        self.outlets.get(index)
    }

    pub fn inlet_count(&self) -> usize {
        self.inlets.len()
    }

    pub fn outlet_count(&self) -> usize {
        self.outlets.len()
    }

    /// Ports of the given direction
    pub fn ports(&self, port_type: PortType) -> &[Port] {
        match port_type {
            PortType::Input => &self.inlets,
            PortType::Output => &self.outlets,
        }
    }

    pub(crate) fn ports_mut(&mut self, port_type: PortType) -> &mut Vec<Port> {
        match port_type {
            PortType::Input => &mut self.inlets,
            PortType::Output => &mut self.outlets,
        }
    }

    pub fn behavior(&self) -> Option<&dyn Behavior> {
        self.behavior.as_deref()
    }

    /// Class name of the bound behavior, if any
    pub fn class_name(&self) -> Option<&str> {
        self.behavior.as_ref().map(|behavior| behavior.class_name())
    }

    /// Why the last rebind left this node invalid
    pub fn bind_error(&self) -> Option<&BindError> {
        self.bind_error.as_ref()
    }

    /// Snapshot of every incident connection, inlets first
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.inlets
            .iter()
            .chain(self.outlets.iter())
            .flat_map(|port| port.connections().iter().copied())
            .collect()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("text", &self.text)
            .field("inlets", &self.inlets)
            .field("outlets", &self.outlets)
            .field("valid", &self.valid)
            .field("class", &self.class_name())
            .finish()
    }
}
