//! Node graph data structures and operations
//!
//! [`NodeGraph`] is the single source of truth for nodes and connections. Every
//! structural mutation goes through it; notifications are queued while a
//! mutation runs and dispatched once it has fully settled.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;

use egui::Pos2;
use log::{debug, warn};
use thiserror::Error;

use super::binding::BindOutcome;
use super::events::{GraphEvent, GraphObserver, ObserverId};
use super::factory::{BehaviorRegistry, DataType};
use super::interface::{Behavior, BehaviorError, NodeContext, NodeData};
use super::node::{Node, NodeId};
use super::port::{Port, PortId, PortRef, PortType};

/// Unique identifier for a connection
pub type ConnectionId = usize;

/// Errors returned by graph operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("connection {0} does not exist")]
    UnknownConnection(ConnectionId),

    #[error("node {node} has no {direction} {index} ({count} available)")]
    InvalidPortIndex {
        node: NodeId,
        direction: PortType,
        index: PortId,
        count: usize,
    },

    #[error("cannot connect {outlet} to {inlet}: incompatible port types")]
    IncompatiblePortType { outlet: PortRef, inlet: PortRef },

    #[error("{outlet} is already connected to {inlet}")]
    DuplicateConnection { outlet: PortRef, inlet: PortRef },
}

/// Directed edge from an outlet to an inlet
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: PortRef,
    pub dest: PortRef,
}

impl Connection {
    /// Whether either endpoint belongs to the node
    pub fn involves(&self, node: NodeId) -> bool {
        self.source.node == node || self.dest.node == node
    }

    /// The endpoint on the given side
    pub fn endpoint(&self, port_type: PortType) -> PortRef {
        match port_type {
            PortType::Output => self.source,
            PortType::Input => self.dest,
        }
    }
}

/// A graph containing nodes and their connections
pub struct NodeGraph {
    nodes: BTreeMap<NodeId, Node>,
    connections: BTreeMap<ConnectionId, Connection>,
    next_node_id: NodeId,
    next_connection_id: ConnectionId,
    registry: BehaviorRegistry,

    observers: Vec<(ObserverId, Box<dyn GraphObserver>)>,
    next_observer_id: ObserverId,
    retired_observers: Vec<ObserverId>,
    /// Observers detached for the event being delivered
    in_flight: Vec<ObserverId>,
    pending: VecDeque<GraphEvent>,
    dispatching: bool,
    /// Depth of behavior calls currently on the stack
    busy: usize,
    computing: HashSet<NodeId>,

    // Removed items stay readable until the current dispatch drains
    disposed_nodes: BTreeMap<NodeId, Node>,
    disposed_connections: BTreeMap<ConnectionId, Connection>,
}

impl NodeGraph {
    /// Creates a new empty node graph with the built-in behavior classes
    pub fn new() -> Self {
        Self::with_registry(BehaviorRegistry::default())
    }

    /// Creates a new empty node graph resolving text against `registry`
    pub fn with_registry(registry: BehaviorRegistry) -> Self {
        Self {
            nodes: BTreeMap::new(),
            connections: BTreeMap::new(),
            next_node_id: 0,
            next_connection_id: 0,
            registry,
            observers: Vec::new(),
            next_observer_id: 0,
            retired_observers: Vec::new(),
            in_flight: Vec::new(),
            pending: VecDeque::new(),
            dispatching: false,
            busy: 0,
            computing: HashSet::new(),
            disposed_nodes: BTreeMap::new(),
            disposed_connections: BTreeMap::new(),
        }
    }

    pub fn registry(&self) -> &BehaviorRegistry {
        &self.registry
    }

    /// Registry access for adding classes; existing nodes are not rebound
    pub fn registry_mut(&mut self) -> &mut BehaviorRegistry {
        &mut self.registry
    }

    // ---- observers ----

    /// Register an observer; it receives every event dispatched from now on
    pub fn add_observer(&mut self, observer: impl GraphObserver + 'static) -> ObserverId {
        let id = self.next_observer_id;
        self.next_observer_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        if let Some(index) = self.observers.iter().position(|(observer, _)| *observer == id) {
            self.observers.remove(index);
            return true;
        }
        // Observers are detached while their events are being delivered
        if self.in_flight.contains(&id) && !self.retired_observers.contains(&id) {
            self.retired_observers.push(id);
            return true;
        }
        false
    }

    // ---- queries ----

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Connections in creation order
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// A node removed during the dispatch currently in progress
    pub fn removed_node(&self, id: NodeId) -> Option<&Node> {
        self.disposed_nodes.get(&id)
    }

    /// A connection removed during the dispatch currently in progress
    pub fn removed_connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.disposed_connections.get(&id)
    }

    pub fn port(&self, port: PortRef) -> Option<&Port> {
        self.nodes.get(&port.node)?.ports(port.port_type).get(port.index)
    }

    /// Ids of every connection matching `predicate`
    pub fn find_connections<P>(&self, predicate: P) -> Vec<ConnectionId>
    where
        P: Fn(&Connection) -> bool,
    {
        self.connections
            .values()
            .filter(|connection| predicate(connection))
            .map(|connection| connection.id)
            .collect()
    }

    pub fn find_connections_between(
        &self,
        source: NodeId,
        outlet: PortId,
        dest: NodeId,
        inlet: PortId,
    ) -> Vec<ConnectionId> {
        let from = PortRef::output(source, outlet);
        let to = PortRef::input(dest, inlet);
        self.find_connections(|connection| connection.source == from && connection.dest == to)
    }

    /// Text shown by the node's behavior, if its class displays a value
    pub fn display(&self, id: NodeId) -> Option<String> {
        self.nodes.get(&id)?.behavior()?.display()
    }

    // ---- structural mutation ----

    /// Create a node and bind its text. Port counts apply until a behavior
    /// class installs its own layout.
    pub fn create_node(&mut self, position: Pos2, text: impl Into<String>, inlets: usize, outlets: usize) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;

        let node = Node::new(id, position, text, inlets, outlets);
        debug!("Creating node {} '{}' at ({}, {})", id, node.text, position.x, position.y);
        self.nodes.insert(id, node);
        self.queue(GraphEvent::NodeAdded(id));

        self.bind_node(id);
        self.flush_events();
        id
    }

    /// Remove a node after severing every connection on its ports
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        let connections = self.nodes.get(&id).ok_or(GraphError::UnknownNode(id))?.connection_ids();
        for connection in connections {
            self.remove_connection_inner(connection);
        }

        if let Some(node) = self.nodes.remove(&id) {
            debug!("Removed node {} '{}'", id, node.text);
            self.disposed_nodes.insert(id, node);
        }
        self.queue(GraphEvent::NodeRemoved(id));
        self.flush_events();
        Ok(())
    }

    /// Connect an outlet to an inlet
    pub fn connect(
        &mut self,
        source: NodeId,
        outlet: PortId,
        dest: NodeId,
        inlet: PortId,
    ) -> Result<ConnectionId, GraphError> {
        let from = PortRef::output(source, outlet);
        let to = PortRef::input(dest, inlet);

        let source_type = self.checked_port(from)?.data_type;
        let dest_type = self.checked_port(to)?.data_type;
        if !source_type.can_connect_to(&dest_type) {
            warn!("Rejected connection {} -> {}: {} does not fit {}", from, to, source_type, dest_type);
            return Err(GraphError::IncompatiblePortType { outlet: from, inlet: to });
        }
        if !self.find_connections_between(source, outlet, dest, inlet).is_empty() {
            return Err(GraphError::DuplicateConnection { outlet: from, inlet: to });
        }

        let id = self.next_connection_id;
        self.next_connection_id += 1;
        self.connections.insert(id, Connection { id, source: from, dest: to });
        for endpoint in [from, to] {
            if let Some(port) = self.port_mut(endpoint) {
                port.attach(id);
            }
        }
        debug!("Connected {} -> {} as connection {}", from, to, id);

        self.queue(GraphEvent::ConnectionAdded(id));
        self.flush_events();
        Ok(id)
    }

    pub fn disconnect(&mut self, id: ConnectionId) -> Result<(), GraphError> {
        if !self.connections.contains_key(&id) {
            return Err(GraphError::UnknownConnection(id));
        }
        self.remove_connection_inner(id);
        self.flush_events();
        Ok(())
    }

    /// Remove every connection between two ports, returning how many went
    pub fn disconnect_ports(
        &mut self,
        source: NodeId,
        outlet: PortId,
        dest: NodeId,
        inlet: PortId,
    ) -> Result<usize, GraphError> {
        self.checked_port(PortRef::output(source, outlet))?;
        self.checked_port(PortRef::input(dest, inlet))?;

        let connections = self.find_connections_between(source, outlet, dest, inlet);
        for connection in &connections {
            self.remove_connection_inner(*connection);
        }
        self.flush_events();
        Ok(connections.len())
    }

    /// Replace a node's text and rebind it
    pub fn set_node_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<BindOutcome, GraphError> {
        let text = text.into();
        let node = self.nodes.get_mut(&id).ok_or(GraphError::UnknownNode(id))?;
        node.text = text.clone();
        self.queue(GraphEvent::NodeTextChanged { node: id, text });

        let outcome = self.bind_node(id);
        self.flush_events();
        Ok(outcome)
    }

    /// Rebind a node from its current text
    pub fn rebind_node(&mut self, id: NodeId) -> Result<BindOutcome, GraphError> {
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::UnknownNode(id));
        }
        let outcome = self.bind_node(id);
        self.flush_events();
        Ok(outcome)
    }

    pub fn set_node_position(&mut self, id: NodeId, position: Pos2) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::UnknownNode(id))?;
        if node.position != position {
            node.position = position;
            self.queue(GraphEvent::NodePosChanged { node: id, position });
        }
        self.flush_events();
        Ok(())
    }

    // ---- port mutation ----

    pub fn set_inlet_count(&mut self, id: NodeId, count: usize) -> Result<(), GraphError> {
        self.resize_ports(id, PortType::Input, count)
    }

    pub fn set_outlet_count(&mut self, id: NodeId, count: usize) -> Result<(), GraphError> {
        self.resize_ports(id, PortType::Output, count)
    }

    pub fn add_inlet(&mut self, id: NodeId) -> Result<(), GraphError> {
        let count = self.port_count(id, PortType::Input)?;
        self.resize_ports(id, PortType::Input, count + 1)
    }

    pub fn remove_last_inlet(&mut self, id: NodeId) -> Result<(), GraphError> {
        let count = self.port_count(id, PortType::Input)?;
        self.resize_ports(id, PortType::Input, count.saturating_sub(1))
    }

    pub fn add_outlet(&mut self, id: NodeId) -> Result<(), GraphError> {
        let count = self.port_count(id, PortType::Output)?;
        self.resize_ports(id, PortType::Output, count + 1)
    }

    pub fn remove_last_outlet(&mut self, id: NodeId) -> Result<(), GraphError> {
        let count = self.port_count(id, PortType::Output)?;
        self.resize_ports(id, PortType::Output, count.saturating_sub(1))
    }

    /// Set inlet count and types in one step; connections the new types
    /// reject are removed
    pub fn set_inlet_types(&mut self, id: NodeId, types: Vec<DataType>) -> Result<(), GraphError> {
        self.port_count(id, PortType::Input)?;
        self.apply_port_types(id, PortType::Input, types);
        self.flush_events();
        Ok(())
    }

    pub fn set_outlet_types(&mut self, id: NodeId, types: Vec<DataType>) -> Result<(), GraphError> {
        self.port_count(id, PortType::Output)?;
        self.apply_port_types(id, PortType::Output, types);
        self.flush_events();
        Ok(())
    }

    fn port_count(&self, id: NodeId, port_type: PortType) -> Result<usize, GraphError> {
        self.nodes
            .get(&id)
            .map(|node| node.ports(port_type).len())
            .ok_or(GraphError::UnknownNode(id))
    }

    fn resize_ports(&mut self, id: NodeId, port_type: PortType, count: usize) -> Result<(), GraphError> {
        let node = self.nodes.get(&id).ok_or(GraphError::UnknownNode(id))?;
        let mut types: Vec<DataType> = node.ports(port_type).iter().map(|port| port.data_type).collect();
        types.resize(count, DataType::Any);
        self.apply_port_types(id, port_type, types);
        self.flush_events();
        Ok(())
    }

    /// Reshape one side of a node to `types` without dispatching
    pub(crate) fn apply_port_types(&mut self, id: NodeId, port_type: PortType, types: Vec<DataType>) {
        let (current, dropped) = match self.nodes.get(&id) {
            Some(node) => {
                let ports = node.ports(port_type);
                let keep = types.len().min(ports.len());
                let dropped: Vec<ConnectionId> = ports[keep..]
                    .iter()
                    .rev()
                    .flat_map(|port| port.connections().iter().copied())
                    .collect();
                (ports.len(), dropped)
            }
            None => return,
        };

        // Disconnect before the ports disappear
        for connection in dropped {
            self.remove_connection_inner(connection);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.ports_mut(port_type).truncate(types.len());
        }

        for (index, data_type) in types.iter().enumerate().take(current) {
            let port_ref = PortRef { node: id, port_type, index };
            let retyped = match self.port_mut(port_ref) {
                Some(port) if port.data_type != *data_type => {
                    port.data_type = *data_type;
                    true
                }
                _ => false,
            };
            if retyped {
                self.prune_incompatible(port_ref);
            }
        }

        if let Some(node) = self.nodes.get_mut(&id) {
            let ports = node.ports_mut(port_type);
            for (index, data_type) in types.iter().enumerate().skip(current) {
                ports.push(Port::new(index, port_type, *data_type));
            }
        }

        if current != types.len() {
            let count = types.len();
            debug!("Node {} now has {} {}s", id, count, port_type);
            self.queue(match port_type {
                PortType::Input => GraphEvent::NodeInletCountChanged { node: id, count },
                PortType::Output => GraphEvent::NodeOutletCountChanged { node: id, count },
            });
        }
    }

    fn prune_incompatible(&mut self, port: PortRef) {
        let (data_type, connections) = match self.port(port) {
            Some(found) => (found.data_type, found.connections().to_vec()),
            None => return,
        };

        for id in connections {
            let other = match self.connections.get(&id) {
                Some(connection) => match port.port_type {
                    PortType::Output => connection.dest,
                    PortType::Input => connection.source,
                },
                None => continue,
            };
            let compatible = self
                .port(other)
                .is_some_and(|other| data_type.can_connect_to(&other.data_type));
            if !compatible {
                debug!("Pruning connection {} after {} became {}", id, port, data_type);
                self.remove_connection_inner(id);
            }
        }
    }

    // ---- data propagation ----

    /// Hand a value to the behavior bound to `node` as if it arrived on `inlet`
    pub fn deliver(&mut self, node: NodeId, inlet: PortId, data: NodeData) -> Result<(), GraphError> {
        self.checked_port(PortRef::input(node, inlet))?;
        self.invoke(node, |behavior, context| behavior.on_data(inlet, data, context));
        self.flush_events();
        Ok(())
    }

    /// Inject a value into a node from outside the graph (e.g. a source)
    pub fn push_value(&mut self, node: NodeId, data: NodeData) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&node) {
            return Err(GraphError::UnknownNode(node));
        }
        self.invoke(node, |behavior, context| behavior.on_push(data, context));
        self.flush_events();
        Ok(())
    }

    /// Fan a value out over every connection currently on an outlet
    pub fn send(&mut self, node: NodeId, outlet: PortId, data: NodeData) -> Result<(), GraphError> {
        let connections = self.checked_port(PortRef::output(node, outlet))?.connections().to_vec();
        for id in connections {
            // A downstream behavior may have reshaped the graph meanwhile
            let dest = match self.connections.get(&id) {
                Some(connection) => connection.dest,
                None => continue,
            };
            let value = data.clone();
            self.invoke(dest.node, move |behavior, context| behavior.on_data(dest.index, value, context));
        }
        self.flush_events();
        Ok(())
    }

    fn invoke<F>(&mut self, id: NodeId, call: F)
    where
        F: FnOnce(&mut dyn Behavior, &mut NodeContext<'_>) -> Result<(), BehaviorError>,
    {
        let (mut behavior, epoch) = match self.nodes.get_mut(&id) {
            Some(node) => match node.behavior.take() {
                Some(behavior) => (behavior, node.binding_epoch),
                None => {
                    if self.computing.contains(&id) {
                        warn!("Node {} is still computing, dropping re-entrant value", id);
                    } else {
                        debug!("Node {} has no bound behavior, value ignored", id);
                    }
                    return;
                }
            },
            None => return,
        };

        self.computing.insert(id);
        let result = self.run_behavior(id, behavior.as_mut(), call);
        self.computing.remove(&id);

        if let Err(err) = result {
            warn!("Node {} ({}): {}", id, behavior.class_name(), err);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            if node.binding_epoch == epoch && node.behavior.is_none() {
                node.behavior = Some(behavior);
            }
        }
    }

    /// Run a behavior callback with dispatch held until it returns
    pub(crate) fn run_behavior<R>(
        &mut self,
        id: NodeId,
        behavior: &mut dyn Behavior,
        call: impl FnOnce(&mut dyn Behavior, &mut NodeContext<'_>) -> R,
    ) -> R {
        self.busy += 1;
        let result = {
            let mut context = NodeContext::new(self, id);
            call(behavior, &mut context)
        };
        self.busy -= 1;
        result
    }

    // ---- internals ----

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    fn port_mut(&mut self, port: PortRef) -> Option<&mut Port> {
        self.nodes.get_mut(&port.node)?.ports_mut(port.port_type).get_mut(port.index)
    }

    fn checked_port(&self, port: PortRef) -> Result<&Port, GraphError> {
        let node = self.nodes.get(&port.node).ok_or(GraphError::UnknownNode(port.node))?;
        let ports = node.ports(port.port_type);
        ports.get(port.index).ok_or(GraphError::InvalidPortIndex {
            node: port.node,
            direction: port.port_type,
            index: port.index,
            count: ports.len(),
        })
    }

    fn remove_connection_inner(&mut self, id: ConnectionId) {
        if let Some(connection) = self.connections.remove(&id) {
            for endpoint in [connection.source, connection.dest] {
                if let Some(port) = self.port_mut(endpoint) {
                    port.detach(id);
                }
            }
            debug!("Disconnected {} -> {} (connection {})", connection.source, connection.dest, id);
            self.disposed_connections.insert(id, connection);
            self.queue(GraphEvent::ConnectionRemoved(id));
        }
    }

    pub(crate) fn set_valid(&mut self, id: NodeId, valid: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            if node.valid != valid {
                node.valid = valid;
                self.queue(GraphEvent::NodeValidChanged { node: id, valid });
            }
        }
    }

    fn queue(&mut self, event: GraphEvent) {
        self.pending.push_back(event);
    }

    /// Deliver queued events unless a dispatch or behavior call is already
    /// on the stack; that outer frame picks them up instead.
    fn flush_events(&mut self) {
        if self.dispatching || self.busy > 0 {
            return;
        }

        self.dispatching = true;
        while let Some(event) = self.pending.pop_front() {
            let mut observers = std::mem::take(&mut self.observers);
            self.in_flight = observers.iter().map(|(id, _)| *id).collect();
            for (id, observer) in observers.iter_mut() {
                if self.retired_observers.contains(id) {
                    continue;
                }
                observer.on_graph_event(&event, self);
            }
            // Keep anything registered by a handler
            observers.append(&mut self.observers);
            if !self.retired_observers.is_empty() {
                let retired = std::mem::take(&mut self.retired_observers);
                observers.retain(|(id, _)| !retired.contains(id));
            }
            self.observers = observers;
            self.in_flight.clear();
        }
        self.dispatching = false;

        self.disposed_nodes.clear();
        self.disposed_connections.clear();
    }
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeGraph")
            .field("nodes", &self.nodes)
            .field("connections", &self.connections)
            .field("observers", &self.observers.len())
            .finish()
    }
}
