//! Numeric-to-text converter node

use crate::nodes::factory::{BehaviorFactory, BehaviorMetadata, DataType};
use crate::nodes::interface::{Behavior, BehaviorError, NodeContext, NodeData, PortLayout};
use crate::nodes::port::PortId;

/// `tostring [precision]`: float in, text out
#[derive(Debug, Default)]
pub struct ToStringBehavior {
    precision: Option<usize>,
}

impl ToStringBehavior {
    pub fn format(&self, value: f64) -> String {
        match self.precision {
            Some(precision) => format!("{:.*}", precision, value),
            None => NodeData::Float(value).to_string(),
        }
    }
}

impl BehaviorFactory for ToStringBehavior {
    fn metadata() -> BehaviorMetadata {
        BehaviorMetadata::new("tostring", "utility", "Formats numbers as text")
    }

    fn create() -> Box<dyn Behavior> {
        Box::new(ToStringBehavior::default())
    }
}

impl Behavior for ToStringBehavior {
    fn class_name(&self) -> &str {
        "tostring"
    }

    fn port_layout(&self) -> Option<PortLayout> {
        Some(PortLayout::new(vec![DataType::Float], vec![DataType::Text]))
    }

    fn init(&mut self, args: &[String], _node: &mut NodeContext<'_>) -> Result<(), BehaviorError> {
        if let Some(arg) = args.first() {
            let precision = arg.parse().map_err(|_| BehaviorError::InvalidArgument {
                argument: "precision",
                value: arg.clone(),
            })?;
            self.precision = Some(precision);
        }
        Ok(())
    }

    fn on_data(&mut self, _inlet: PortId, data: NodeData, node: &mut NodeContext<'_>) -> Result<(), BehaviorError> {
        let text = match data.as_float() {
            Some(value) => self.format(value),
            None => data.to_string(),
        };
        node.send(0, NodeData::Text(text))?;
        Ok(())
    }
}
