//! Shape types and port geometry.
//!
//! ShapeType is the closed set of flowchart symbols; the port resolver and the
//! connection rules both match exhaustively on it, so adding a symbol forces
//! every table to be revisited.

use serde::{Deserialize, Serialize};

use crate::diagram::ShapeId;
use crate::geometry::Point;

/// Minimum width a shape can be resized to
pub const MIN_WIDTH: f64 = 60.0;

/// Minimum height a shape can be resized to
pub const MIN_HEIGHT: f64 = 40.0;

/// The flowchart symbol set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Start,
    Process,
    Decision,
    Input,
    Document,
    Comment,
}

impl ShapeType {
    /// Default size when a shape of this type is dropped on the canvas
    pub fn default_size(self) -> (f64, f64) {
        match self {
            ShapeType::Start => (100.0, 60.0),
            ShapeType::Process => (100.0, 80.0),
            ShapeType::Decision => (120.0, 120.0),
            ShapeType::Input => (100.0, 60.0),
            ShapeType::Document => (100.0, 70.0),
            ShapeType::Comment => (100.0, 80.0),
        }
    }

    /// Default label text
    pub fn default_text(self) -> &'static str {
        match self {
            ShapeType::Start => "Inicio/Fin",
            ShapeType::Process => "Proceso",
            ShapeType::Decision => "Condición",
            ShapeType::Input => "Entrada/Salida",
            ShapeType::Document => "Documento",
            ShapeType::Comment => "Comentario",
        }
    }

    /// Fill color as a CSS color string, for renderers
    pub fn fill_color(self) -> &'static str {
        match self {
            ShapeType::Start => "#91e69f",
            ShapeType::Process => "#5ac56c",
            ShapeType::Decision => "#4cd4e6",
            ShapeType::Input => "#5ac56c",
            ShapeType::Document => "#5ac56c",
            ShapeType::Comment => "#bfc9d1",
        }
    }

    /// Whether shapes of this type can be a connection endpoint
    pub fn connectable(self) -> bool {
        !matches!(self, ShapeType::Comment)
    }

    /// Number of connection ports (fixed per type)
    pub fn port_count(self) -> usize {
        match self {
            ShapeType::Comment => 0,
            ShapeType::Decision => 3,
            ShapeType::Start | ShapeType::Process | ShapeType::Input | ShapeType::Document => 4,
        }
    }
}

/// A shape on the canvas. `kind` is fixed at creation; everything else mutates
/// through the diagram operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    #[serde(rename = "type")]
    pub kind: ShapeType,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
}

impl Shape {
    /// Connection ports relative to the shape origin, in their fixed order.
    ///
    /// The ordering is load-bearing: port indices are stored in connections
    /// and carry branch semantics (a decision's port 1 is the "yes" branch),
    /// so reordering breaks saved diagrams.
    pub fn ports(&self) -> Vec<Point> {
        let w = self.width;
        let h = self.height;
        match self.kind {
            ShapeType::Comment => Vec::new(),
            // top, right, left - a decision has no bottom port
            ShapeType::Decision => vec![
                Point::new(w / 2.0, 0.0),
                Point::new(w, h / 2.0),
                Point::new(0.0, h / 2.0),
            ],
            // top, right, bottom, left
            ShapeType::Start | ShapeType::Process | ShapeType::Input | ShapeType::Document => vec![
                Point::new(w / 2.0, 0.0),
                Point::new(w, h / 2.0),
                Point::new(w / 2.0, h),
                Point::new(0.0, h / 2.0),
            ],
        }
    }

    /// Absolute position of the port at `index`, if the index is valid
    pub fn port(&self, index: usize) -> Option<Point> {
        self.ports()
            .get(index)
            .map(|p| Point::new(self.x + p.x, self.y + p.y))
    }

    /// Center of the shape's bounding box
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn shape(kind: ShapeType, width: f64, height: f64) -> Shape {
        Shape {
            id: ShapeId::from_index(0),
            kind,
            x: 10.0,
            y: 20.0,
            width,
            height,
            text: kind.default_text().to_string(),
        }
    }

    #[test]
    fn decision_has_three_ports_without_bottom() {
        let s = shape(ShapeType::Decision, 120.0, 120.0);
        let ports = s.ports();
        assert_eq!(ports.len(), 3);
        assert_eq!(ports[0], Point::new(60.0, 0.0)); // top
        assert_eq!(ports[1], Point::new(120.0, 60.0)); // right
        assert_eq!(ports[2], Point::new(0.0, 60.0)); // left
    }

    #[test]
    fn connectable_types_have_four_ordered_ports() {
        for kind in [
            ShapeType::Start,
            ShapeType::Process,
            ShapeType::Input,
            ShapeType::Document,
        ] {
            let s = shape(kind, 100.0, 80.0);
            let ports = s.ports();
            assert_eq!(ports.len(), 4, "{kind:?}");
            assert_eq!(ports[0], Point::new(50.0, 0.0)); // top
            assert_eq!(ports[1], Point::new(100.0, 40.0)); // right
            assert_eq!(ports[2], Point::new(50.0, 80.0)); // bottom
            assert_eq!(ports[3], Point::new(0.0, 40.0)); // left
        }
    }

    #[test]
    fn comment_has_no_ports() {
        let s = shape(ShapeType::Comment, 100.0, 80.0);
        assert!(s.ports().is_empty());
        assert!(s.port(0).is_none());
    }

    #[test]
    fn port_positions_are_absolute() {
        let s = shape(ShapeType::Start, 100.0, 60.0);
        assert_eq!(s.port(1), Some(Point::new(110.0, 50.0)));
        assert_eq!(s.port(4), None);
    }

    proptest! {
        #[test]
        fn ports_scale_with_size(w in 60.0f64..400.0, h in 40.0f64..400.0) {
            for kind in [
                ShapeType::Start,
                ShapeType::Process,
                ShapeType::Decision,
                ShapeType::Input,
                ShapeType::Document,
            ] {
                let s = shape(kind, w, h);
                let ports = s.ports();
                prop_assert_eq!(ports.len(), kind.port_count());
                // top port is always the midpoint of the top edge
                prop_assert_eq!(ports[0], Point::new(w / 2.0, 0.0));
                // right port is always the midpoint of the right edge
                prop_assert_eq!(ports[1], Point::new(w, h / 2.0));
            }
        }
    }
}
