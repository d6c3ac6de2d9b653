//! Patchcanvas core library
//!
//! A patcher-style node graph whose nodes are configured by text, plus the
//! editing state machine that drives it from pointer and keyboard gestures.

// Public modules
pub mod config;
pub mod constants;
pub mod editor;
pub mod nodes;

// Re-export commonly used types
pub use config::{ConfigError, EditorConfig};
pub use editor::{EditorEvent, HitTarget, NodeEditor, NodeMode, SceneItem};
pub use nodes::{
    Behavior, BehaviorError, BehaviorRegistry, BindOutcome, DataType, GraphError, GraphEvent, GraphObserver,
    NodeData, NodeGraph, NodeId, PortRef,
};
