//! Node interaction state (selection, text editing, dragging, connections)

use egui::{Pos2, Vec2};

use super::completion::CompletionOverlay;
use super::scene::SceneItem;
use crate::nodes::{ConnectionId, NodeId, PortRef};

/// Per-node interaction mode; exactly one applies at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMode {
    Idle,
    Selected,
    Editing,
    /// Editing with the completion overlay showing
    Suggesting,
}

/// Text edit in progress on one node
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub node: NodeId,
    /// Text before editing started, restored on revert
    pub original_text: String,
    pub buffer: String,
    pub completion: Option<CompletionOverlay>,
}

impl EditSession {
    pub fn new(node: NodeId, text: &str) -> Self {
        Self {
            node,
            original_text: text.to_string(),
            buffer: text.to_string(),
            completion: None,
        }
    }

    pub fn is_suggesting(&self) -> bool {
        self.completion.is_some()
    }

    /// First token of the buffer, empty while the buffer is blank
    pub fn completion_prefix(&self) -> &str {
        self.buffer.split_whitespace().next().unwrap_or("")
    }

    /// Swap the first token for `candidate`, keeping any argument tail
    pub fn replace_first_token(&mut self, candidate: &str) {
        let trimmed = self.buffer.trim_start();
        let tail = match trimmed.find(char::is_whitespace) {
            Some(index) => &trimmed[index..],
            None => "",
        };
        self.buffer = format!("{}{}", candidate, tail);
    }
}

/// Inlet currently under a connection drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragTarget {
    pub inlet: PortRef,
    pub compatible: bool,
}

/// Provisional connection line following the pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionDrag {
    pub source: PortRef,
    pub cursor: Pos2,
    pub target: Option<DragTarget>,
}

impl ConnectionDrag {
    /// Whether releasing now would create a connection
    pub fn will_connect(&self) -> bool {
        self.target.is_some_and(|target| target.compatible)
    }
}

/// Node following the pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeDrag {
    pub node: NodeId,
    pub grab_offset: Vec2,
}

/// Manages selection and the gestures in progress
#[derive(Debug, Clone, Default)]
pub struct InteractionManager {
    pub selection: Option<SceneItem>,
    pub edit: Option<EditSession>,
    pub connection_drag: Option<ConnectionDrag>,
    pub node_drag: Option<NodeDrag>,
}

impl InteractionManager {
    /// Creates a new interaction manager
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_node(&mut self, node: NodeId) {
        self.selection = Some(SceneItem::Node(node));
    }

    pub fn select_connection(&mut self, connection: ConnectionId) {
        self.selection = Some(SceneItem::Connection(connection));
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        match self.selection {
            Some(SceneItem::Node(node)) => Some(node),
            _ => None,
        }
    }

    pub fn selected_connection(&self) -> Option<ConnectionId> {
        match self.selection {
            Some(SceneItem::Connection(connection)) => Some(connection),
            _ => None,
        }
    }

    pub fn editing_node(&self) -> Option<NodeId> {
        self.edit.as_ref().map(|edit| edit.node)
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    pub fn node_mode(&self, node: NodeId) -> NodeMode {
        match &self.edit {
            Some(edit) if edit.node == node => {
                if edit.is_suggesting() {
                    NodeMode::Suggesting
                } else {
                    NodeMode::Editing
                }
            }
            _ if self.selected_node() == Some(node) => NodeMode::Selected,
            _ => NodeMode::Idle,
        }
    }

    /// Drop every reference to a node that left the graph
    pub fn forget_node(&mut self, node: NodeId) {
        if self.selected_node() == Some(node) {
            self.selection = None;
        }
        if self.editing_node() == Some(node) {
            self.edit = None;
        }
        if self.node_drag.is_some_and(|drag| drag.node == node) {
            self.node_drag = None;
        }
        if let Some(drag) = self.connection_drag {
            if drag.source.node == node {
                self.connection_drag = None;
            } else if drag.target.is_some_and(|target| target.inlet.node == node) {
                self.connection_drag = Some(ConnectionDrag { target: None, ..drag });
            }
        }
    }

    pub fn forget_connection(&mut self, connection: ConnectionId) {
        if self.selected_connection() == Some(connection) {
            self.selection = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_prefix_is_first_token() {
        let mut edit = EditSession::new(0, "ad");
        assert_eq!(edit.completion_prefix(), "ad");
        edit.buffer = "add 5".into();
        assert_eq!(edit.completion_prefix(), "add");
        edit.buffer = "  ad ".into();
        assert_eq!(edit.completion_prefix(), "ad");
        edit.buffer = String::new();
        assert_eq!(edit.completion_prefix(), "");
    }

    #[test]
    fn test_replace_first_token_keeps_arguments() {
        let mut edit = EditSession::new(0, "ma 2");
        edit.replace_first_token("math");
        assert_eq!(edit.buffer, "math 2");

        edit.buffer = "mu".into();
        edit.replace_first_token("mul");
        assert_eq!(edit.buffer, "mul");
    }

    #[test]
    fn test_node_modes() {
        let mut interaction = InteractionManager::new();
        assert_eq!(interaction.node_mode(1), NodeMode::Idle);

        interaction.select_node(1);
        assert_eq!(interaction.node_mode(1), NodeMode::Selected);

        interaction.edit = Some(EditSession::new(1, ""));
        assert_eq!(interaction.node_mode(1), NodeMode::Editing);

        if let Some(edit) = interaction.edit.as_mut() {
            edit.completion = Some(CompletionOverlay::new(vec!["add".into()]));
        }
        assert_eq!(interaction.node_mode(1), NodeMode::Suggesting);

        interaction.forget_node(1);
        assert_eq!(interaction.node_mode(1), NodeMode::Idle);
        assert!(!interaction.is_editing());
    }
}
