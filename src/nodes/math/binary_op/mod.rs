//! Binary arithmetic node implementation
//!
//! - mod.rs: behavior, factory registration
//! - functions.rs: operators and argument parsing
//!
//! Inlet 0 is hot: a value there computes and sends. Inlet 1 is cold: it only
//! replaces the stored right operand.

mod functions;

pub use functions::*;

use log::debug;

use crate::nodes::factory::{BehaviorMetadata, BehaviorRegistry, DataType};
use crate::nodes::interface::{Behavior, BehaviorError, NodeContext, NodeData, PortLayout};
use crate::nodes::port::PortId;

/// Class name of the operator-as-argument form, e.g. `math mul 2`
pub const GENERIC_CLASS: &str = "math";

pub struct BinaryOpBehavior {
    class_name: String,
    operator: Option<BinaryOperator>,
    left: f64,
    right: f64,
}

impl BinaryOpBehavior {
    /// Behavior for a class named after its operator (`add`, `pow`, ...)
    pub fn with_operator(operator: BinaryOperator) -> Self {
        Self {
            class_name: operator.token().to_string(),
            operator: Some(operator),
            left: 0.0,
            right: 0.0,
        }
    }

    /// Behavior that reads its operator from the first argument
    pub fn generic() -> Self {
        Self {
            class_name: GENERIC_CLASS.to_string(),
            operator: None,
            left: 0.0,
            right: 0.0,
        }
    }

    pub fn operator(&self) -> Option<BinaryOperator> {
        self.operator
    }

    pub fn operand(&self) -> f64 {
        self.right
    }

    fn value_of(data: &NodeData, inlet: PortId) -> Result<f64, BehaviorError> {
        data.as_float().ok_or_else(|| BehaviorError::InvalidArgument {
            argument: if inlet == 0 { "left" } else { "right" },
            value: data.to_string(),
        })
    }
}

impl Behavior for BinaryOpBehavior {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn port_layout(&self) -> Option<PortLayout> {
        Some(PortLayout::new(
            vec![DataType::Float, DataType::Float],
            vec![DataType::Float],
        ))
    }

    fn init(&mut self, args: &[String], _node: &mut NodeContext<'_>) -> Result<(), BehaviorError> {
        let mut args = args.iter();
        if self.operator.is_none() {
            let token = args.next().ok_or(BehaviorError::MissingArgument("operator"))?;
            self.operator = Some(token.parse()?);
        }
        if let Some(operand) = args.next() {
            self.right = parse_operand(operand)?;
        }
        Ok(())
    }

    fn on_data(&mut self, inlet: PortId, data: NodeData, node: &mut NodeContext<'_>) -> Result<(), BehaviorError> {
        let value = Self::value_of(&data, inlet)?;
        match inlet {
            0 => {
                self.left = value;
                let operator = self.operator.ok_or(BehaviorError::MissingArgument("operator"))?;
                let result = operator.apply(self.left, self.right);
                debug!("{} {} {} = {}", self.left, operator, self.right, result);
                node.send(0, NodeData::Float(result))?;
            }
            _ => self.right = value,
        }
        Ok(())
    }

    fn display(&self) -> Option<String> {
        self.operator.map(|op| format!("{} {}", op, NodeData::Float(self.right)))
    }
}

/// Register `add`, `sub`, `mul`, `div`, `pow` and `math`
pub fn register(registry: &mut BehaviorRegistry) {
    for operator in BinaryOperator::ALL {
        registry.register_creator(
            BehaviorMetadata::new(operator.token(), "math", operator.description()),
            move || -> Box<dyn Behavior> { Box::new(BinaryOpBehavior::with_operator(operator)) },
        );
    }
    registry.register_creator(
        BehaviorMetadata::new(GENERIC_CLASS, "math", "Applies the operator named by its first argument"),
        || -> Box<dyn Behavior> { Box::new(BinaryOpBehavior::generic()) },
    );
}
