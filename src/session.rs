//! The editing session: tab registry, active tab, selection, clipboard and
//! undo history, threaded explicitly instead of living in a global.
//!
//! Every mutation goes through the active diagram, records exactly one
//! history snapshot after applying, and returns a [`Change`] telling the
//! caller what to repaint. Side effects (rendering, autosave scheduling) are
//! the caller's job, driven by those change values.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diagram::{Connection, ConnectionId, Diagram, ShapeId};
use crate::routing::{self, Route};
use crate::shapes::{Shape, ShapeType};
use crate::undo::{History, Snapshot};

/// Offset applied to pasted shapes, in document units
pub const PASTE_OFFSET: f64 = 20.0;

/// Tab identifier. Tab 1 exists from the start; ids grow monotonically and
/// are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(u32);

impl TabId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transient selection state; cleared on every tab switch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub shapes: Vec<ShapeId>,
    pub connection: Option<ConnectionId>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.connection.is_none()
    }
}

/// What a mutation changed - the exact set of things a renderer must repaint
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    ShapeAdded {
        id: ShapeId,
    },
    /// The shape moved; the listed connections need re-routing
    ShapeMoved {
        id: ShapeId,
        rerouted: Vec<ConnectionId>,
    },
    /// The shape resized; the listed connections need re-routing
    ShapeResized {
        id: ShapeId,
        rerouted: Vec<ConnectionId>,
    },
    TextEdited {
        id: ShapeId,
    },
    /// The shape and every connection touching it went away together
    ShapeRemoved {
        id: ShapeId,
        removed_connections: Vec<ConnectionId>,
    },
    ConnectionAdded {
        id: ConnectionId,
    },
    ConnectionRemoved {
        id: ConnectionId,
    },
    ShapesPasted {
        ids: Vec<ShapeId>,
    },
    /// Everything changed: tab switch/close, load, undo, redo
    Redraw,
}

/// One editing session - the owning state for tabs, selection and history
pub struct Session {
    tabs: BTreeMap<TabId, Diagram>,
    current_tab: TabId,
    next_tab_id: u32,
    selection: Selection,
    clipboard: Vec<Shape>,
    history: History,
}

impl Session {
    /// A fresh session: a single empty tab with id 1
    pub fn new() -> Self {
        let first = TabId(1);
        let mut tabs = BTreeMap::new();
        tabs.insert(first, Diagram::new());
        Self {
            tabs,
            current_tab: first,
            next_tab_id: 2,
            selection: Selection::default(),
            clipboard: Vec::new(),
            history: History::default(),
        }
    }

    /// Rebuild a session from loaded parts. Guarantees at least one tab,
    /// an active tab that actually exists (lowest id wins otherwise), and a
    /// tab counter past every existing id. History starts at the loaded
    /// baseline.
    pub fn from_tabs(tabs: BTreeMap<TabId, Diagram>, current: TabId, next_tab_id: u32) -> Self {
        let mut tabs = tabs;
        if tabs.is_empty() {
            tabs.insert(TabId(1), Diagram::new());
        }
        let current = if tabs.contains_key(&current) {
            current
        } else {
            *tabs.keys().next().expect("tabs is non-empty")
        };
        let max_id = tabs.keys().map(|t| t.0).max().expect("tabs is non-empty");
        let next_tab_id = next_tab_id.max(max_id + 1);

        let baseline = Snapshot::capture(&tabs[&current]);
        Self {
            tabs,
            current_tab: current,
            next_tab_id,
            selection: Selection::default(),
            clipboard: Vec::new(),
            history: History::new(100, baseline),
        }
    }

    // --- Accessors ---

    pub fn current_tab(&self) -> TabId {
        self.current_tab
    }

    pub fn tab_ids(&self) -> Vec<TabId> {
        self.tabs.keys().copied().collect()
    }

    pub fn next_tab_id(&self) -> u32 {
        self.next_tab_id
    }

    /// The active tab's diagram
    pub fn diagram(&self) -> &Diagram {
        &self.tabs[&self.current_tab]
    }

    pub fn diagram_for(&self, tab: TabId) -> Option<&Diagram> {
        self.tabs.get(&tab)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn active_mut(&mut self) -> &mut Diagram {
        self.tabs
            .get_mut(&self.current_tab)
            .expect("active tab is always present")
    }

    fn record(&mut self) {
        self.history.record(Snapshot::capture(self.diagram()));
    }

    // --- Tabs ---

    /// Create an empty tab and switch to it
    pub fn create_tab(&mut self) -> TabId {
        let id = TabId(self.next_tab_id);
        self.next_tab_id += 1;
        self.tabs.insert(id, Diagram::new());
        self.current_tab = id;
        self.selection = Selection::default();
        self.history.reset(Snapshot::capture(self.diagram()));
        id
    }

    /// Switch the active tab. Clears the selection and re-seeds history with
    /// the new tab's state as baseline. Returns None if the tab is unknown.
    pub fn switch_tab(&mut self, tab: TabId) -> Option<Change> {
        if !self.tabs.contains_key(&tab) {
            return None;
        }
        self.current_tab = tab;
        self.selection = Selection::default();
        self.history.reset(Snapshot::capture(self.diagram()));
        Some(Change::Redraw)
    }

    /// Close a tab. The registry never goes empty: closing the only remaining
    /// tab clears its diagram in place (id counters included) instead of
    /// removing it. Closing the active tab activates the lowest remaining id.
    pub fn close_tab(&mut self, tab: TabId) -> Option<Change> {
        if !self.tabs.contains_key(&tab) {
            return None;
        }

        if self.tabs.len() == 1 {
            self.active_mut().clear();
        } else {
            self.tabs.remove(&tab);
            if self.current_tab == tab {
                self.current_tab = *self.tabs.keys().next().expect("tabs remain after close");
            }
        }

        self.selection = Selection::default();
        self.history.reset(Snapshot::capture(self.diagram()));
        Some(Change::Redraw)
    }

    // --- Selection ---

    pub fn select_shapes(&mut self, ids: Vec<ShapeId>) {
        self.selection.shapes = ids
            .into_iter()
            .filter(|id| self.tabs[&self.current_tab].shape(id).is_some())
            .collect();
        self.selection.connection = None;
    }

    pub fn select_connection(&mut self, id: ConnectionId) {
        if self.diagram().connection(&id).is_some() {
            self.selection = Selection {
                shapes: Vec::new(),
                connection: Some(id),
            };
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::default();
    }

    // --- Mutations (each records one history snapshot after applying) ---

    /// Drop a new shape on the active tab
    pub fn add_shape(
        &mut self,
        kind: ShapeType,
        x: f64,
        y: f64,
        text: Option<&str>,
    ) -> (Shape, Change) {
        let shape = self.active_mut().add_shape(kind, x, y, text);
        self.record();
        let change = Change::ShapeAdded {
            id: shape.id.clone(),
        };
        (shape, change)
    }

    pub fn move_shape(&mut self, id: &ShapeId, x: f64, y: f64) -> Option<Change> {
        if !self.active_mut().move_shape(id, x, y) {
            return None;
        }
        let rerouted = self.diagram().connections_touching(id);
        self.record();
        Some(Change::ShapeMoved {
            id: id.clone(),
            rerouted,
        })
    }

    pub fn resize_shape(&mut self, id: &ShapeId, width: f64, height: f64) -> Option<Change> {
        if !self.active_mut().resize_shape(id, width, height) {
            return None;
        }
        let rerouted = self.diagram().connections_touching(id);
        self.record();
        Some(Change::ShapeResized {
            id: id.clone(),
            rerouted,
        })
    }

    pub fn set_shape_text(&mut self, id: &ShapeId, text: &str) -> Option<Change> {
        if !self.active_mut().set_shape_text(id, text) {
            return None;
        }
        self.record();
        Some(Change::TextEdited { id: id.clone() })
    }

    /// Remove a shape and its connections as one undoable step
    pub fn remove_shape(&mut self, id: &ShapeId) -> Option<Change> {
        let removed_connections = self.active_mut().remove_shape(id)?;
        self.selection.shapes.retain(|s| s != id);
        if let Some(conn) = &self.selection.connection {
            if removed_connections.contains(conn) {
                self.selection.connection = None;
            }
        }
        self.record();
        Some(Change::ShapeRemoved {
            id: id.clone(),
            removed_connections,
        })
    }

    /// Attempt a connection; None means the attempt was rejected and nothing
    /// changed (no history entry either)
    pub fn connect(
        &mut self,
        from: &ShapeId,
        from_point: usize,
        to: &ShapeId,
        to_point: usize,
    ) -> Option<(Connection, Change)> {
        let connection = self
            .active_mut()
            .add_connection(from, from_point, to, to_point)?;
        self.record();
        let change = Change::ConnectionAdded {
            id: connection.id.clone(),
        };
        Some((connection, change))
    }

    pub fn remove_connection(&mut self, id: &ConnectionId) -> Option<Change> {
        if !self.active_mut().remove_connection(id) {
            return None;
        }
        if self.selection.connection.as_ref() == Some(id) {
            self.selection.connection = None;
        }
        self.record();
        Some(Change::ConnectionRemoved { id: id.clone() })
    }

    // --- Clipboard ---

    /// Copy the selected shapes to the clipboard; returns how many were copied.
    /// Connections are not copied.
    pub fn copy_selection(&mut self) -> usize {
        self.clipboard = self
            .selection
            .shapes
            .iter()
            .filter_map(|id| self.tabs[&self.current_tab].shape(id).cloned())
            .collect();
        self.clipboard.len()
    }

    /// Paste clipboard shapes at a fixed offset, with fresh ids, as one
    /// undoable step. The pasted shapes become the selection.
    pub fn paste(&mut self) -> Option<Change> {
        if self.clipboard.is_empty() {
            return None;
        }
        let clips = self.clipboard.clone();
        let mut ids = Vec::with_capacity(clips.len());
        for shape in &clips {
            let diagram = self.active_mut();
            let created = diagram.add_shape(
                shape.kind,
                shape.x + PASTE_OFFSET,
                shape.y + PASTE_OFFSET,
                Some(&shape.text),
            );
            diagram.resize_shape(&created.id, shape.width, shape.height);
            ids.push(created.id);
        }
        self.record();
        self.selection = Selection {
            shapes: ids.clone(),
            connection: None,
        };
        Some(Change::ShapesPasted { ids })
    }

    // --- History ---

    /// Undo the last mutation on the active tab. No-op at the baseline.
    pub fn undo(&mut self) -> Option<Change> {
        let snapshot = self.history.undo()?;
        snapshot.restore(self.active_mut());
        self.selection = Selection::default();
        Some(Change::Redraw)
    }

    /// Redo the last undone mutation. No-op when nothing is queued.
    pub fn redo(&mut self) -> Option<Change> {
        let snapshot = self.history.redo()?;
        snapshot.restore(self.active_mut());
        self.selection = Selection::default();
        Some(Change::Redraw)
    }

    // --- Rendering facade ---

    /// Route one connection of the active tab against current geometry
    pub fn route_connection(&self, id: &ConnectionId) -> Option<Route> {
        let diagram = self.diagram();
        let connection = diagram.connection(id)?;
        let from = diagram.shape(&connection.from_id)?;
        let to = diagram.shape(&connection.to_id)?;
        Some(routing::route(connection, from, to))
    }

    /// Route every connection of the active tab (full redraw)
    pub fn routes(&self) -> Vec<(ConnectionId, Route)> {
        self.diagram()
            .connections()
            .iter()
            .filter_map(|c| self.route_connection(&c.id).map(|r| (c.id.clone(), r)))
            .collect()
    }

    // --- Persistence hooks ---

    pub(crate) fn tabs(&self) -> &BTreeMap<TabId, Diagram> {
        &self.tabs
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
