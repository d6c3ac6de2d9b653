//! Input events consumed by the editor state machine

use egui::{Key, Pos2};

/// Low-level gesture in canvas coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    PointerPressed { pos: Pos2 },
    PointerMoved { pos: Pos2 },
    PointerReleased { pos: Pos2 },
    /// Activation gesture; hosts usually forward `Response::double_clicked`
    DoubleClicked { pos: Pos2 },
    KeyPressed(Key),
    TextInput(String),
}

impl EditorEvent {
    /// Translate a raw egui event. Pointer positions are shifted by
    /// `canvas_origin` so they land in canvas coordinates.
    pub fn from_egui(event: &egui::Event, canvas_origin: Pos2) -> Option<Self> {
        let to_canvas = |pos: Pos2| Pos2::new(pos.x - canvas_origin.x, pos.y - canvas_origin.y);
        match event {
            egui::Event::Key { key, pressed: true, .. } => Some(EditorEvent::KeyPressed(*key)),
            egui::Event::Text(text) if !text.is_empty() => Some(EditorEvent::TextInput(text.clone())),
            egui::Event::PointerMoved(pos) => Some(EditorEvent::PointerMoved { pos: to_canvas(*pos) }),
            egui::Event::PointerButton {
                pos,
                button: egui::PointerButton::Primary,
                pressed,
                ..
            } => {
                let pos = to_canvas(*pos);
                Some(if *pressed {
                    EditorEvent::PointerPressed { pos }
                } else {
                    EditorEvent::PointerReleased { pos }
                })
            }
            _ => None,
        }
    }

    pub fn pos(&self) -> Option<Pos2> {
        match self {
            EditorEvent::PointerPressed { pos }
            | EditorEvent::PointerMoved { pos }
            | EditorEvent::PointerReleased { pos }
            | EditorEvent::DoubleClicked { pos } => Some(*pos),
            EditorEvent::KeyPressed(_) | EditorEvent::TextInput(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_pointer_events() {
        let origin = Pos2::new(100.0, 50.0);
        let moved = egui::Event::PointerMoved(Pos2::new(110.0, 70.0));
        assert_eq!(
            EditorEvent::from_egui(&moved, origin),
            Some(EditorEvent::PointerMoved { pos: Pos2::new(10.0, 20.0) })
        );

        let text = egui::Event::Text("a".into());
        assert_eq!(EditorEvent::from_egui(&text, origin), Some(EditorEvent::TextInput("a".into())));
        assert_eq!(EditorEvent::from_egui(&egui::Event::Copy, origin), None);
    }

    #[test]
    fn test_pos_accessor() {
        assert_eq!(EditorEvent::KeyPressed(Key::Enter).pos(), None);
        assert_eq!(
            EditorEvent::DoubleClicked { pos: Pos2::new(1.0, 2.0) }.pos(),
            Some(Pos2::new(1.0, 2.0))
        );
    }
}
