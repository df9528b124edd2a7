//! Undo/redo history built on whole-document snapshots.
//!
//! The stacks hold deep copies of `{shapes, connections}`; restoring one
//! replaces the live graph wholesale. Simple and correct at this document
//! scale; an invertible-command history would use less memory but is not
//! worth it here.

use serde::{Deserialize, Serialize};

use crate::diagram::{Connection, Diagram};
use crate::shapes::Shape;

/// An immutable deep copy of a document's contents at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub shapes: Vec<Shape>,
    pub connections: Vec<Connection>,
}

impl Snapshot {
    /// Capture the current contents of a diagram
    pub fn capture(diagram: &Diagram) -> Self {
        Self {
            shapes: diagram.shapes().to_vec(),
            connections: diagram.connections().to_vec(),
        }
    }

    /// Restore this snapshot into a diagram (deep copy, no aliasing)
    pub fn restore(&self, diagram: &mut Diagram) {
        diagram.replace_all(&self.shapes, &self.connections);
    }
}

/// Manages undo/redo with document snapshots.
///
/// The bottom of the undo stack is the baseline state seeded on load or tab
/// switch; undo never pops past it, so undoing everything leaves the baseline
/// on screen rather than an empty canvas.
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_history: usize,
}

impl History {
    /// Create a history seeded with a baseline snapshot
    pub fn new(max_history: usize, baseline: Snapshot) -> Self {
        Self {
            undo_stack: vec![baseline],
            redo_stack: Vec::new(),
            max_history,
        }
    }

    /// Record the state after a mutation. Any new action forecloses the old
    /// future, so the redo stack is cleared.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();

        // Limit history size
        while self.undo_stack.len() > self.max_history {
            self.undo_stack.remove(0);
        }
    }

    /// Undo to the previous state, returning the snapshot to restore.
    /// No-op (None) when only the baseline remains.
    pub fn undo(&mut self) -> Option<Snapshot> {
        if self.undo_stack.len() <= 1 {
            return None;
        }
        let current = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        self.undo_stack.last().cloned()
    }

    /// Redo the last undone state, returning the snapshot to restore.
    /// No-op (None) when nothing is queued.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(next.clone());
        Some(next)
    }

    /// Drop everything and re-seed with a new baseline (tab switch, load)
    pub fn reset(&mut self, baseline: Snapshot) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.undo_stack.push(baseline);
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(100, Snapshot::capture(&Diagram::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeType;

    fn snap_with_shapes(n: usize) -> Snapshot {
        let mut diagram = Diagram::new();
        for i in 0..n {
            diagram.add_shape(ShapeType::Process, i as f64 * 10.0, 0.0, None);
        }
        Snapshot::capture(&diagram)
    }

    #[test]
    fn undo_never_pops_past_the_baseline() {
        let mut history = History::default();
        assert!(!history.can_undo());
        assert!(history.undo().is_none());

        history.record(snap_with_shapes(1));
        assert!(history.can_undo());
        let restored = history.undo().unwrap();
        assert!(restored.shapes.is_empty()); // back to the empty baseline
        assert!(history.undo().is_none());
    }

    #[test]
    fn redo_is_a_noop_when_empty() {
        let mut history = History::default();
        assert!(history.redo().is_none());
    }

    #[test]
    fn record_clears_redo() {
        let mut history = History::default();
        history.record(snap_with_shapes(1));
        history.undo().unwrap();
        assert!(history.can_redo());

        history.record(snap_with_shapes(2));
        assert!(!history.can_redo());
        assert!(history.redo().is_none());
    }

    #[test]
    fn undo_then_redo_round_trips() {
        // the inverse law: n mutations, n-1 undos, n-1 redos lands back on
        // the state before the first undo
        let mut history = History::default();
        let states: Vec<_> = (1..=4).map(snap_with_shapes).collect();
        for s in &states {
            history.record(s.clone());
        }

        let mut restored = None;
        for _ in 0..3 {
            restored = history.undo();
        }
        assert_eq!(restored.unwrap().shapes.len(), 1);

        let mut last = None;
        for _ in 0..3 {
            last = history.redo();
        }
        assert_eq!(last.unwrap(), states[3]);
        assert!(!history.can_redo());
    }

    #[test]
    fn history_is_capped() {
        let mut history = History::new(3, snap_with_shapes(0));
        for i in 1..=5 {
            history.record(snap_with_shapes(i));
        }
        // baseline was trimmed away; only the newest 3 remain
        assert_eq!(history.undo().unwrap().shapes.len(), 4);
        assert_eq!(history.undo().unwrap().shapes.len(), 3);
        assert!(history.undo().is_none());
    }

    #[test]
    fn reset_reseeds_the_baseline() {
        let mut history = History::default();
        history.record(snap_with_shapes(1));
        history.undo().unwrap();

        history.reset(snap_with_shapes(2));
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn snapshot_restore_is_idempotent() {
        let mut diagram = Diagram::new();
        let a = diagram.add_shape(ShapeType::Start, 0.0, 0.0, None);
        let b = diagram.add_shape(ShapeType::Process, 200.0, 0.0, None);
        diagram.add_connection(&a.id, 1, &b.id, 3).unwrap();

        let snap = Snapshot::capture(&diagram);
        snap.restore(&mut diagram);
        snap.restore(&mut diagram);
        assert_eq!(Snapshot::capture(&diagram), snap);
    }
}
