//! Math operation nodes

pub mod binary_op;

pub use binary_op::{BinaryOpBehavior, BinaryOperator};
