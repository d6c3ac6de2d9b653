//! Stacking order of nodes and connections on the canvas

use std::collections::HashMap;

use egui::Rect;

use crate::constants;
use crate::nodes::{ConnectionId, NodeId};

/// Anything the renderer draws and may need to repaint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SceneItem {
    Node(NodeId),
    Connection(ConnectionId),
    /// Provisional line shown while dragging from an outlet
    DragLine,
}

/// Z values for every live scene item
#[derive(Debug, Clone, Default)]
pub struct Scene {
    z_values: HashMap<SceneItem, f32>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new item at the bottom of the stack
    pub fn insert(&mut self, item: SceneItem) {
        self.z_values.entry(item).or_insert(0.0);
    }

    pub fn remove(&mut self, item: SceneItem) {
        self.z_values.remove(&item);
    }

    pub fn contains(&self, item: SceneItem) -> bool {
        self.z_values.contains_key(&item)
    }

    pub fn z(&self, item: SceneItem) -> f32 {
        match item {
            SceneItem::DragLine => constants::interaction::DRAG_LINE_Z,
            _ => self.z_values.get(&item).copied().unwrap_or(0.0),
        }
    }

    /// Put `item` just above everything its bounds overlap.
    ///
    /// `bounds` resolves the current rectangle of any tracked item; items it
    /// cannot resolve are ignored.
    pub fn raise<F>(&mut self, item: SceneItem, bounds: F) -> bool
    where
        F: Fn(SceneItem) -> Option<Rect>,
    {
        let rect = match bounds(item) {
            Some(rect) => rect,
            None => return false,
        };

        let top = self
            .z_values
            .iter()
            .filter(|(other, _)| **other != item)
            .filter(|(other, _)| bounds(**other).is_some_and(|other| other.intersects(rect)))
            .map(|(_, z)| *z)
            .fold(None, |top: Option<f32>, z| Some(top.map_or(z, |top| top.max(z))));

        let z = top.map_or(0.0, |top| top + 1.0);
        self.z_values.insert(item, z);
        true
    }

    /// Items ordered from topmost to bottommost
    pub fn stacking_order(&self) -> Vec<SceneItem> {
        let mut items: Vec<_> = self.z_values.iter().map(|(item, z)| (*item, *z)).collect();
        items.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        items.into_iter().map(|(item, _)| item).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Pos2;

    fn square(x: f32) -> Rect {
        Rect::from_min_max(Pos2::new(x, 0.0), Pos2::new(x + 10.0, 10.0))
    }

    #[test]
    fn test_raise_above_colliding_items() {
        let mut scene = Scene::new();
        let a = SceneItem::Node(0);
        let b = SceneItem::Node(1);
        let far = SceneItem::Node(2);
        for item in [a, b, far] {
            scene.insert(item);
        }
        let bounds = |item: SceneItem| match item {
            SceneItem::Node(0) => Some(square(0.0)),
            SceneItem::Node(1) => Some(square(5.0)),
            SceneItem::Node(2) => Some(square(100.0)),
            _ => None,
        };

        assert!(scene.raise(a, bounds));
        assert_eq!(scene.z(a), 1.0);
        assert!(scene.raise(b, bounds));
        assert_eq!(scene.z(b), 2.0);
        assert!(scene.raise(far, bounds));
        assert_eq!(scene.z(far), 0.0);

        assert_eq!(scene.stacking_order()[0], b);
    }

    #[test]
    fn test_drag_line_sits_on_top() {
        let mut scene = Scene::new();
        scene.insert(SceneItem::Node(0));
        assert!(scene.z(SceneItem::DragLine) > scene.z(SceneItem::Node(0)));
        assert!(!scene.raise(SceneItem::Node(0), |_| None));
    }
}
