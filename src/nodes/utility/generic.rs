//! Generic box: `node <inlets> <outlets>` with untyped pass-through ports

use crate::nodes::factory::{BehaviorFactory, BehaviorMetadata, DataType};
use crate::nodes::interface::{Behavior, BehaviorError, NodeContext, NodeData, PortLayout};
use crate::nodes::port::PortId;

/// Port counts come from the arguments; a missing argument keeps the count
/// the node already has. A value on inlet k goes out of outlet k.
#[derive(Debug, Default)]
pub struct GenericBoxBehavior;

fn parse_count(arg: &str, argument: &'static str) -> Result<usize, BehaviorError> {
    arg.parse().map_err(|_| BehaviorError::InvalidArgument {
        argument,
        value: arg.to_string(),
    })
}

impl BehaviorFactory for GenericBoxBehavior {
    fn metadata() -> BehaviorMetadata {
        BehaviorMetadata::new("node", "utility", "Box with a configurable number of inlets and outlets")
    }

    fn create() -> Box<dyn Behavior> {
        Box::new(GenericBoxBehavior)
    }
}

impl Behavior for GenericBoxBehavior {
    fn class_name(&self) -> &str {
        "node"
    }

    fn port_layout(&self) -> Option<PortLayout> {
        None
    }

    fn init(&mut self, args: &[String], node: &mut NodeContext<'_>) -> Result<(), BehaviorError> {
        let inlets = match args.first() {
            Some(arg) => parse_count(arg, "inlets")?,
            None => node.inlet_count(),
        };
        let outlets = match args.get(1) {
            Some(arg) => parse_count(arg, "outlets")?,
            None => node.outlet_count(),
        };

        node.set_inlet_types(vec![DataType::Any; inlets])?;
        node.set_outlet_types(vec![DataType::Any; outlets])?;
        Ok(())
    }

    fn on_data(&mut self, inlet: PortId, data: NodeData, node: &mut NodeContext<'_>) -> Result<(), BehaviorError> {
        if inlet < node.outlet_count() {
            node.send(inlet, data)?;
        }
        Ok(())
    }
}
