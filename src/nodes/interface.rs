//! Behavior interface: the values flowing between nodes and the computation
//! objects bound to node text.

use std::fmt;

use thiserror::Error;

use super::factory::DataType;
use super::graph::{GraphError, NodeGraph};
use super::node::NodeId;
use super::port::PortId;

/// Values that flow between nodes
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodeData {
    Float(f64),
    Text(String),
    Boolean(bool),
    #[default]
    None,
}

impl NodeData {
    /// Parse a text argument: numbers become floats, `true`/`false` booleans,
    /// everything else text
    pub fn parse(token: &str) -> Self {
        if let Ok(value) = token.parse::<f64>() {
            return NodeData::Float(value);
        }
        match token {
            "true" => NodeData::Boolean(true),
            "false" => NodeData::Boolean(false),
            _ => NodeData::Text(token.to_string()),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            NodeData::Float(_) => DataType::Float,
            NodeData::Text(_) => DataType::Text,
            NodeData::Boolean(_) => DataType::Boolean,
            NodeData::None => DataType::Any,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            NodeData::Float(value) => Some(*value),
            NodeData::Boolean(value) => Some(if *value { 1.0 } else { 0.0 }),
            NodeData::Text(text) => text.trim().parse().ok(),
            NodeData::None => None,
        }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // f64's Display already prints 15.0 as "15"
            NodeData::Float(value) => write!(f, "{}", value),
            NodeData::Text(text) => f.write_str(text),
            NodeData::Boolean(value) => write!(f, "{}", value),
            NodeData::None => f.write_str("none"),
        }
    }
}

/// Errors a behavior reports from `init` or while handling data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BehaviorError {
    #[error("missing required argument '{0}'")]
    MissingArgument(&'static str),

    #[error("invalid value '{value}' for argument '{argument}'")]
    InvalidArgument { argument: &'static str, value: String },

    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Port types a behavior class requires on its node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortLayout {
    pub inlets: Vec<DataType>,
    pub outlets: Vec<DataType>,
}

impl PortLayout {
    pub fn new(inlets: Vec<DataType>, outlets: Vec<DataType>) -> Self {
        Self { inlets, outlets }
    }
}

/// Computation object bound to a node by parsing its text
pub trait Behavior {
    /// Class name this behavior was registered under
    fn class_name(&self) -> &str;

    /// Ports to install before `init` runs. `None` keeps the node's current layout.
    fn port_layout(&self) -> Option<PortLayout>;

    /// Configure from the argument tokens following the class name
    fn init(&mut self, _args: &[String], _node: &mut NodeContext<'_>) -> Result<(), BehaviorError> {
        Ok(())
    }

    /// Handle a value arriving on an inlet
    fn on_data(&mut self, inlet: PortId, data: NodeData, node: &mut NodeContext<'_>) -> Result<(), BehaviorError>;

    /// Handle a value injected by the host rather than a connection
    fn on_push(&mut self, data: NodeData, node: &mut NodeContext<'_>) -> Result<(), BehaviorError> {
        self.on_data(0, data, node)
    }

    /// Latest value to show on the node, for classes that display one
    fn display(&self) -> Option<String> {
        None
    }
}

/// Handle a behavior uses to reach back into its own node
pub struct NodeContext<'a> {
    graph: &'a mut NodeGraph,
    node: NodeId,
}

impl<'a> NodeContext<'a> {
    pub(crate) fn new(graph: &'a mut NodeGraph, node: NodeId) -> Self {
        Self { graph, node }
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn inlet_count(&self) -> usize {
        self.graph.node(self.node).map_or(0, |node| node.inlet_count())
    }

    pub fn outlet_count(&self) -> usize {
        self.graph.node(self.node).map_or(0, |node| node.outlet_count())
    }

    pub fn set_inlet_count(&mut self, count: usize) -> Result<(), GraphError> {
        self.graph.set_inlet_count(self.node, count)
    }

    pub fn set_outlet_count(&mut self, count: usize) -> Result<(), GraphError> {
        self.graph.set_outlet_count(self.node, count)
    }

    pub fn set_inlet_types(&mut self, types: Vec<DataType>) -> Result<(), GraphError> {
        self.graph.set_inlet_types(self.node, types)
    }

    pub fn set_outlet_types(&mut self, types: Vec<DataType>) -> Result<(), GraphError> {
        self.graph.set_outlet_types(self.node, types)
    }

    /// Send a value out of one of this node's outlets
    pub fn send(&mut self, outlet: PortId, data: NodeData) -> Result<(), GraphError> {
        self.graph.send(self.node, outlet, data)
    }
}
