//! Port constraint rules: which shapes may gain another connection, in which
//! direction, given the document's current connection set.
//!
//! The answer changes as connections come and go, so callers must re-evaluate
//! immediately before every attempt rather than caching verdicts.

use serde::{Deserialize, Serialize};

use crate::diagram::{Diagram, ShapeId};
use crate::shapes::ShapeType;

/// Which end of a connection a shape would take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// Whether `id` may accept one more connection in `direction`, evaluated
/// against the diagram's current connections. Unknown ids are never
/// connectable.
pub fn can_connect(diagram: &Diagram, id: &ShapeId, direction: Direction) -> bool {
    let Some(shape) = diagram.shape(id) else {
        return false;
    };

    let outgoing = diagram
        .connections()
        .iter()
        .filter(|c| &c.from_id == id)
        .count();
    let incoming = diagram
        .connections()
        .iter()
        .filter(|c| &c.to_id == id)
        .count();

    match (shape.kind, direction) {
        // start doubles as the terminator symbol: one flow in, one flow out
        (ShapeType::Start, Direction::Outgoing) => outgoing == 0,
        (ShapeType::Start, Direction::Incoming) => incoming == 0,

        (ShapeType::Process, Direction::Outgoing) => outgoing == 0,
        (ShapeType::Process, Direction::Incoming) => true,

        (ShapeType::Input, Direction::Outgoing) => outgoing == 0,
        (ShapeType::Input, Direction::Incoming) => incoming == 0,

        // the only type allowed two outgoing edges: the yes/no branch
        (ShapeType::Decision, Direction::Outgoing) => outgoing < 2,
        (ShapeType::Decision, Direction::Incoming) => incoming == 0,

        // sink only
        (ShapeType::Document, Direction::Outgoing) => false,
        (ShapeType::Document, Direction::Incoming) => incoming == 0,

        (ShapeType::Comment, _) => false,
    }
}
