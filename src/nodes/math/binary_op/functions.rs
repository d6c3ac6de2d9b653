//! Core computation logic for binary arithmetic nodes

use std::fmt;
use std::str::FromStr;

use crate::nodes::interface::BehaviorError;

/// Arithmetic operators selectable by token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOperator {
    pub const ALL: [BinaryOperator; 5] = [
        BinaryOperator::Add,
        BinaryOperator::Sub,
        BinaryOperator::Mul,
        BinaryOperator::Div,
        BinaryOperator::Pow,
    ];

    /// Token used in node text
    pub fn token(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "add",
            BinaryOperator::Sub => "sub",
            BinaryOperator::Mul => "mul",
            BinaryOperator::Div => "div",
            BinaryOperator::Pow => "pow",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "Adds the right operand to the left",
            BinaryOperator::Sub => "Subtracts the right operand from the left",
            BinaryOperator::Mul => "Multiplies both operands",
            BinaryOperator::Div => "Divides the left operand by the right",
            BinaryOperator::Pow => "Raises the left operand to the right",
        }
    }

    pub fn apply(&self, left: f64, right: f64) -> f64 {
        match self {
            BinaryOperator::Add => left + right,
            BinaryOperator::Sub => left - right,
            BinaryOperator::Mul => left * right,
            BinaryOperator::Div => left / right,
            BinaryOperator::Pow => left.powf(right),
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for BinaryOperator {
    type Err = BehaviorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BinaryOperator::ALL
            .into_iter()
            .find(|op| op.token() == s)
            .ok_or_else(|| BehaviorError::UnknownOperator(s.to_string()))
    }
}

/// Parse an immediate operand argument
pub fn parse_operand(token: &str) -> Result<f64, BehaviorError> {
    token.parse::<f64>().map_err(|_| BehaviorError::InvalidArgument {
        argument: "operand",
        value: token.to_string(),
    })
}
