//! The diagram graph - THE source of truth for one document's shapes and
//! connections.
//!
//! Every edit goes through these operations. Each one either applies fully or
//! not at all: removing a shape also removes every connection touching it in
//! the same call, and a rejected connection attempt leaves the graph
//! untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rules::{self, Direction};
use crate::shapes::{MIN_HEIGHT, MIN_WIDTH, Shape, ShapeType};

/// Shape identifier, unique within its document (`"shape-<n>"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    pub(crate) fn from_index(n: u64) -> Self {
        Self(format!("shape-{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection identifier, unique within its document (`"conn-<n>"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub(crate) fn from_index(n: u64) -> Self {
        Self(format!("conn-{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed connection between two shape ports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub from_id: ShapeId,
    pub from_point: usize,
    pub to_id: ShapeId,
    pub to_point: usize,
}

/// One document's shape/connection graph with its id counters.
///
/// The counters only ever grow within a document's lifetime - deleting a shape
/// never frees its id for reuse. They are reset solely by [`Diagram::clear`],
/// which starts a fresh lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    shapes: Vec<Shape>,
    connections: Vec<Connection>,
    shape_id_counter: u64,
    connection_id_counter: u64,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Accessors ---

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn shape(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| &s.id == id)
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| &c.id == id)
    }

    /// Ids of every connection with `id` as either endpoint
    pub fn connections_touching(&self, id: &ShapeId) -> Vec<ConnectionId> {
        self.connections
            .iter()
            .filter(|c| &c.from_id == id || &c.to_id == id)
            .map(|c| c.id.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.connections.is_empty()
    }

    // --- Mutations ---

    /// Add a shape with per-type defaults; an empty `text` falls back to the
    /// type's default label. Returns the created shape.
    pub fn add_shape(&mut self, kind: ShapeType, x: f64, y: f64, text: Option<&str>) -> Shape {
        let id = ShapeId::from_index(self.shape_id_counter);
        self.shape_id_counter += 1;

        let (width, height) = kind.default_size();
        let text = text
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| kind.default_text().to_string());

        let shape = Shape {
            id,
            kind,
            x,
            y,
            width,
            height,
            text,
        };
        self.shapes.push(shape.clone());
        shape
    }

    /// Move a shape. Returns false (no-op) if the id is unknown.
    pub fn move_shape(&mut self, id: &ShapeId, x: f64, y: f64) -> bool {
        match self.shapes.iter_mut().find(|s| &s.id == id) {
            Some(shape) => {
                shape.x = x;
                shape.y = y;
                true
            }
            None => false,
        }
    }

    /// Resize a shape, floor-clamped to the minimum size. Returns false if the
    /// id is unknown.
    pub fn resize_shape(&mut self, id: &ShapeId, width: f64, height: f64) -> bool {
        match self.shapes.iter_mut().find(|s| &s.id == id) {
            Some(shape) => {
                shape.width = width.max(MIN_WIDTH);
                shape.height = height.max(MIN_HEIGHT);
                true
            }
            None => false,
        }
    }

    /// Replace a shape's text. Returns false if the id is unknown.
    pub fn set_shape_text(&mut self, id: &ShapeId, text: &str) -> bool {
        match self.shapes.iter_mut().find(|s| &s.id == id) {
            Some(shape) => {
                shape.text = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove a shape and, atomically, every connection referencing it.
    /// Returns the ids of the removed connections, or None if the shape id is
    /// unknown.
    pub fn remove_shape(&mut self, id: &ShapeId) -> Option<Vec<ConnectionId>> {
        let index = self.shapes.iter().position(|s| &s.id == id)?;
        self.shapes.remove(index);

        let mut removed = Vec::new();
        self.connections.retain(|c| {
            if &c.from_id == id || &c.to_id == id {
                removed.push(c.id.clone());
                false
            } else {
                true
            }
        });
        Some(removed)
    }

    /// Create a connection if both endpoints accept it. Returns None (and
    /// leaves the graph untouched) when the attempt is illegal: self-loop,
    /// unknown shape, out-of-range port index, or a constraint violation at
    /// either end.
    pub fn add_connection(
        &mut self,
        from_id: &ShapeId,
        from_point: usize,
        to_id: &ShapeId,
        to_point: usize,
    ) -> Option<Connection> {
        if from_id == to_id {
            return None;
        }
        let from = self.shape(from_id)?;
        let to = self.shape(to_id)?;
        if from_point >= from.kind.port_count() || to_point >= to.kind.port_count() {
            return None;
        }
        if !rules::can_connect(self, from_id, Direction::Outgoing)
            || !rules::can_connect(self, to_id, Direction::Incoming)
        {
            return None;
        }

        let id = ConnectionId::from_index(self.connection_id_counter);
        self.connection_id_counter += 1;

        let connection = Connection {
            id,
            from_id: from_id.clone(),
            from_point,
            to_id: to_id.clone(),
            to_point,
        };
        self.connections.push(connection.clone());
        Some(connection)
    }

    /// Remove a connection. Returns false (no-op) if the id is unknown.
    pub fn remove_connection(&mut self, id: &ConnectionId) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| &c.id != id);
        self.connections.len() != before
    }

    /// Bulk-replace the graph contents, used by history restoration and
    /// document load. Input is deep-copied so the caller's snapshot never
    /// aliases live state. Id counters are left untouched: restores never
    /// rewind them, so ids stay unique across the document's lifetime.
    pub fn replace_all(&mut self, shapes: &[Shape], connections: &[Connection]) {
        self.shapes = shapes.to_vec();
        self.connections = connections.to_vec();
    }

    /// Empty the diagram and reset both id counters, starting a fresh
    /// document lifetime. Used when the last remaining tab is closed.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.connections.clear();
        self.shape_id_counter = 0;
        self.connection_id_counter = 0;
    }
}
