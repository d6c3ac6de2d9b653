//! Data source nodes

pub mod source;

pub use source::SourceBehavior;
