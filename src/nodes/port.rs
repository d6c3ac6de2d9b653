//! Port types and functionality for node connections

use std::fmt;

use super::factory::DataType;
use super::graph::ConnectionId;
use super::node::NodeId;

/// Index of a port within its node's inlet or outlet list
pub type PortId = usize;

/// Type of port (input or output)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PortType {
    Input,
    Output,
}

impl PortType {
    pub fn name(&self) -> &'static str {
        match self {
            PortType::Input => "inlet",
            PortType::Output => "outlet",
        }
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle addressing a port by owning node, direction and index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    pub node: NodeId,
    pub port_type: PortType,
    pub index: PortId,
}

impl PortRef {
    pub fn input(node: NodeId, index: PortId) -> Self {
        Self {
            node,
            port_type: PortType::Input,
            index,
        }
    }

    pub fn output(node: NodeId, index: PortId) -> Self {
        Self {
            node,
            port_type: PortType::Output,
            index,
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.node, self.port_type.name(), self.index)
    }
}

/// Represents a connection point on a node
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub id: PortId,
    pub port_type: PortType,
    pub data_type: DataType,
    connections: Vec<ConnectionId>,
}

impl Port {
    /// Creates a new port with no connections
    pub fn new(id: PortId, port_type: PortType, data_type: DataType) -> Self {
        Self {
            id,
            port_type,
            data_type,
            connections: Vec::new(),
        }
    }

    /// Checks if this port is an input
    pub fn is_input(&self) -> bool {
        matches!(self.port_type, PortType::Input)
    }

    /// Checks if this port is an output
    pub fn is_output(&self) -> bool {
        matches!(self.port_type, PortType::Output)
    }

    /// Incident connections in insertion order
    pub fn connections(&self) -> &[ConnectionId] {
        &self.connections
    }

    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    pub(crate) fn attach(&mut self, connection: ConnectionId) {
        if !self.connections.contains(&connection) {
            self.connections.push(connection);
        }
    }

    pub(crate) fn detach(&mut self, connection: ConnectionId) {
        self.connections.retain(|id| *id != connection);
    }
}
