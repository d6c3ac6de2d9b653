//! Output nodes

pub mod sink;

pub use sink::SinkBehavior;
