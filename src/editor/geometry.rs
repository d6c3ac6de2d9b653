//! Node geometry for renderers and hit testing
//!
//! A node is three stacked strips: the inlet header, the text body and the
//! outlet header. Ports sit left to right in their header, `iolet_width` wide
//! and `iolet_spacing` apart.

use egui::{Pos2, Rect, Vec2};

use crate::config::EditorConfig;
use crate::nodes::PortType;

/// Measures the rendered extent of node text
pub trait TextMetrics {
    fn measure(&self, text: &str) -> Vec2;
}

/// Fixed-advance measurer; blank text still occupies one character cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMetrics {
    pub char_width: f32,
    pub line_height: f32,
}

impl TextMetrics for MonospaceMetrics {
    fn measure(&self, text: &str) -> Vec2 {
        let lines = text.lines().count().max(1);
        let columns = text.lines().map(|line| line.chars().count()).max().unwrap_or(0).max(1);
        Vec2::new(columns as f32 * self.char_width, lines as f32 * self.line_height)
    }
}

/// Laid-out boxes of one node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub rect: Rect,
    pub input_header: Rect,
    pub body: Rect,
    pub output_header: Rect,
    pub inlets: Vec<Rect>,
    pub outlets: Vec<Rect>,
    /// Invalid nodes hide their port headers
    pub ports_visible: bool,
}

impl NodeLayout {
    pub fn port_rect(&self, port_type: PortType, index: usize) -> Option<Rect> {
        match port_type {
            PortType::Input => self.inlets.get(index).copied(),
            PortType::Output => self.outlets.get(index).copied(),
        }
    }

    /// Where a connection attaches: the outer edge of the port box
    pub fn anchor(&self, port_type: PortType, index: usize) -> Option<Pos2> {
        let rect = self.port_rect(port_type, index)?;
        Some(match port_type {
            PortType::Input => rect.center_top(),
            PortType::Output => rect.center_bottom(),
        })
    }
}

pub struct Geometry {
    pub iolet_width: f32,
    pub iolet_height: f32,
    pub iolet_spacing: f32,
    pub hit_tolerance: f32,
    metrics: Box<dyn TextMetrics>,
}

impl Geometry {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            iolet_width: config.iolet_width,
            iolet_height: config.iolet_height,
            iolet_spacing: config.iolet_spacing,
            hit_tolerance: config.hit_tolerance,
            metrics: Box::new(MonospaceMetrics {
                char_width: config.char_width,
                line_height: config.line_height,
            }),
        }
    }

    /// Swap in the renderer's own text measurer
    pub fn with_metrics(mut self, metrics: impl TextMetrics + 'static) -> Self {
        self.metrics = Box::new(metrics);
        self
    }

    /// Width of a header holding `count` ports
    pub fn ports_width(&self, count: usize) -> f32 {
        if count == 0 {
            0.0
        } else {
            count as f32 * (self.iolet_width + self.iolet_spacing) - self.iolet_spacing
        }
    }

    pub fn layout(&self, position: Pos2, text: &str, inlets: usize, outlets: usize, valid: bool) -> NodeLayout {
        let text_size = self.metrics.measure(text);
        let width = text_size
            .x
            .max(self.ports_width(inlets))
            .max(self.ports_width(outlets));

        let input_header = Rect::from_min_size(position, Vec2::new(width, self.iolet_height));
        let body = Rect::from_min_size(
            Pos2::new(position.x, input_header.bottom()),
            Vec2::new(width, text_size.y),
        );
        let output_header = Rect::from_min_size(
            Pos2::new(position.x, body.bottom()),
            Vec2::new(width, self.iolet_height),
        );

        NodeLayout {
            rect: input_header.union(output_header),
            inlets: self.port_rects(input_header, inlets),
            outlets: self.port_rects(output_header, outlets),
            input_header,
            body,
            output_header,
            ports_visible: valid,
        }
    }

    fn port_rects(&self, header: Rect, count: usize) -> Vec<Rect> {
        (0..count)
            .map(|index| {
                let x = header.left() + index as f32 * (self.iolet_width + self.iolet_spacing);
                Rect::from_min_size(Pos2::new(x, header.top()), Vec2::new(self.iolet_width, self.iolet_height))
            })
            .collect()
    }
}

/// Shortest distance from `point` to the segment `a`-`b`
pub fn distance_to_line_segment(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let ap = point - a;
    let ab_len_sq = ab.x * ab.x + ab.y * ab.y;

    if ab_len_sq == 0.0 {
        return (point - a).length();
    }

    let t = ((ap.x * ab.x + ap.y * ab.y) / ab_len_sq).clamp(0.0, 1.0);
    let projection = a + ab * t;
    (point - projection).length()
}

/// Bounding box of a straight connection drawn with the given half width
pub fn segment_bounds(a: Pos2, b: Pos2, half_width: f32) -> Rect {
    Rect::from_two_pos(a, b).expand(half_width)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> Geometry {
        Geometry::new(&EditorConfig::default())
    }

    #[test]
    fn test_ports_width() {
        let geometry = geometry();
        assert_eq!(geometry.ports_width(0), 0.0);
        assert_eq!(geometry.ports_width(1), 10.0);
        assert_eq!(geometry.ports_width(3), 56.0);
    }

    #[test]
    fn test_layout_stacks_headers_around_text() {
        let geometry = geometry();
        // "add 5" is 5 chars at 7px = 35px, wider than two inlets (33px)
        let layout = geometry.layout(Pos2::new(100.0, 50.0), "add 5", 2, 1, true);

        assert_eq!(layout.rect.min, Pos2::new(100.0, 50.0));
        assert_eq!(layout.rect.width(), 35.0);
        assert_eq!(layout.rect.height(), 3.0 + 14.0 + 3.0);
        assert_eq!(layout.body.top(), 53.0);
        assert_eq!(layout.output_header.top(), 67.0);
        assert_eq!(layout.inlets[1].left(), 123.0);
    }

    #[test]
    fn test_ports_widen_short_text() {
        let geometry = geometry();
        let layout = geometry.layout(Pos2::ZERO, "node", 0, 3, false);
        assert_eq!(layout.rect.width(), 56.0);
        assert!(!layout.ports_visible);
    }

    #[test]
    fn test_anchors_sit_on_outer_edges() {
        let geometry = geometry();
        let layout = geometry.layout(Pos2::ZERO, "node", 1, 1, true);
        assert_eq!(layout.anchor(PortType::Input, 0), Some(Pos2::new(5.0, 0.0)));
        assert_eq!(layout.anchor(PortType::Output, 0), Some(Pos2::new(5.0, 20.0)));
        assert_eq!(layout.anchor(PortType::Output, 1), None);
    }

    #[test]
    fn test_distance_to_line_segment() {
        let a = Pos2::new(0.0, 0.0);
        let b = Pos2::new(10.0, 0.0);
        assert_eq!(distance_to_line_segment(Pos2::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_line_segment(Pos2::new(-4.0, 3.0), a, b), 5.0);
        assert_eq!(distance_to_line_segment(Pos2::new(1.0, 1.0), a, a), 2f32.sqrt());
    }
}
