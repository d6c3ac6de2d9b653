//! Source node: emits host-pushed values out of its single outlet

use crate::nodes::factory::{BehaviorFactory, BehaviorMetadata, DataType};
use crate::nodes::interface::{Behavior, BehaviorError, NodeContext, NodeData, PortLayout};
use crate::nodes::port::PortId;

/// `source [value...]`: no inlets, one untyped outlet.
///
/// Pushing a value stores and sends it. Pushing `NodeData::None` re-sends the
/// stored value, which starts out as the text arguments.
#[derive(Debug, Default)]
pub struct SourceBehavior {
    value: NodeData,
}

impl SourceBehavior {
    pub fn value(&self) -> &NodeData {
        &self.value
    }
}

impl BehaviorFactory for SourceBehavior {
    fn metadata() -> BehaviorMetadata {
        BehaviorMetadata::new("source", "data", "Sends values pushed by the host")
    }

    fn create() -> Box<dyn Behavior> {
        Box::new(SourceBehavior::default())
    }
}

impl Behavior for SourceBehavior {
    fn class_name(&self) -> &str {
        "source"
    }

    fn port_layout(&self) -> Option<PortLayout> {
        Some(PortLayout::new(vec![], vec![DataType::Any]))
    }

    fn init(&mut self, args: &[String], _node: &mut NodeContext<'_>) -> Result<(), BehaviorError> {
        self.value = match args {
            [] => NodeData::None,
            [single] => NodeData::parse(single),
            many => NodeData::Text(many.join(" ")),
        };
        Ok(())
    }

    fn on_data(&mut self, _inlet: PortId, _data: NodeData, _node: &mut NodeContext<'_>) -> Result<(), BehaviorError> {
        Ok(())
    }

    fn on_push(&mut self, data: NodeData, node: &mut NodeContext<'_>) -> Result<(), BehaviorError> {
        if data != NodeData::None {
            self.value = data;
        }
        if self.value != NodeData::None {
            node.send(0, self.value.clone())?;
        }
        Ok(())
    }

    fn display(&self) -> Option<String> {
        match self.value {
            NodeData::None => None,
            ref value => Some(value.to_string()),
        }
    }
}
