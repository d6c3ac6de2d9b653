//! Node system - graph data model, behavior binding and built-in classes

// Core node system modules
pub mod binding;
pub mod events;
pub mod factory;
pub mod graph;
pub mod interface;
pub mod node;
pub mod port;

// Built-in behavior classes
pub mod data;
pub mod math;
pub mod output;
pub mod utility;

// Re-export core types
pub use binding::{BindError, BindOutcome, ParsedText};
pub use events::{EventRecorder, GraphEvent, GraphObserver, LoggingObserver, ObserverId};
pub use factory::{BehaviorFactory, BehaviorMetadata, BehaviorRegistry, DataType};
pub use graph::{Connection, ConnectionId, GraphError, NodeGraph};
pub use interface::{Behavior, BehaviorError, NodeContext, NodeData, PortLayout};
pub use node::{Node, NodeId};
pub use port::{Port, PortId, PortRef, PortType};

/// Register every built-in behavior class
pub fn register_builtin_behaviors(registry: &mut BehaviorRegistry) {
    registry.register::<data::SourceBehavior>();
    math::binary_op::register(registry);
    registry.register::<utility::ToStringBehavior>();
    registry.register::<utility::GenericBoxBehavior>();
    registry.register::<output::SinkBehavior>();
}
