//! Undo/redo over bounded snapshot stacks.
//!
//! Standard linear history: recording a new state clears the redo stack.
//! The stacks hold deep snapshots; restore is exact. The adapter layer
//! reconciles itself from whatever state a restore settles the model into.

use std::collections::VecDeque;

use crate::model::{GraphSnapshot, GraphStore};

/// Default maximum number of undo entries.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Bounded undo/redo snapshot stacks.
#[derive(Debug)]
pub struct History {
    undo: VecDeque<GraphSnapshot>,
    redo: Vec<GraphSnapshot>,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl History {
    /// Creates a history bounded to `max_depth` undo entries; the oldest
    /// entries are dropped first when the bound is hit.
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Records a pre-mutation snapshot and clears the redo stack.
    pub fn record(&mut self, snapshot: GraphSnapshot) {
        if self.undo.len() == self.max_depth {
            self.undo.pop_front();
        }
        self.undo.push_back(snapshot);
        self.redo.clear();
    }

    /// Restores the most recent undo snapshot into the store.
    ///
    /// Pushes the current state onto the redo stack first. Returns `false`
    /// (store and stacks unchanged) when the undo stack is empty.
    pub fn undo(&mut self, store: &mut GraphStore) -> bool {
        let Some(snapshot) = self.undo.pop_back() else {
            return false;
        };
        self.redo.push(store.snapshot());
        store.restore(&snapshot);
        true
    }

    /// Restores the most recent redo snapshot into the store.
    ///
    /// Symmetric to [`undo`](Self::undo). Returns `false` when the redo
    /// stack is empty.
    pub fn redo(&mut self, store: &mut GraphStore) -> bool {
        let Some(snapshot) = self.redo.pop() else {
            return false;
        };
        self.undo.push_back(store.snapshot());
        store.restore(&snapshot);
        true
    }

    /// Clears both stacks. Used by direct state replacement (bulk project
    /// load), which must not be undoable into a state that predates it.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// True if an undo entry exists.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// True if a redo entry exists.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;
    use patchbay_catalog::Catalog;

    #[test]
    fn undo_on_empty_history_is_a_noop() {
        let catalog = Catalog::new();
        let mut store = GraphStore::new();
        store.add_node(&catalog, "oscillator", Position::default()).unwrap();
        let before = store.snapshot();

        let mut history = History::default();
        assert!(!history.undo(&mut store));
        assert_eq!(store.snapshot(), before);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_restores_exactly_and_redo_reverses() {
        let catalog = Catalog::new();
        let mut store = GraphStore::new();
        let mut history = History::default();

        history.record(store.snapshot());
        let osc = store.add_node(&catalog, "oscillator", Position::new(3.0, 4.0)).unwrap();
        let after_add = store.snapshot();

        assert!(history.undo(&mut store));
        assert_eq!(store.node_count(), 0);
        assert!(store.node(osc).is_none());

        assert!(history.redo(&mut store));
        assert_eq!(store.snapshot(), after_add);
    }

    #[test]
    fn recording_clears_redo() {
        let catalog = Catalog::new();
        let mut store = GraphStore::new();
        let mut history = History::default();

        history.record(store.snapshot());
        store.add_node(&catalog, "oscillator", Position::default()).unwrap();
        history.undo(&mut store);
        assert!(history.can_redo());

        history.record(store.snapshot());
        store.add_node(&catalog, "gain", Position::default()).unwrap();
        assert!(!history.can_redo());
        assert!(!history.redo(&mut store));
    }

    #[test]
    fn depth_bound_drops_oldest_first() {
        let catalog = Catalog::new();
        let mut store = GraphStore::new();
        let mut history = History::new(2);

        for _ in 0..3 {
            history.record(store.snapshot());
            store.add_node(&catalog, "oscillator", Position::default()).unwrap();
        }

        // Only two undos available; the first snapshot (empty graph) was
        // dropped, so the deepest restorable state has one node.
        assert!(history.undo(&mut store));
        assert!(history.undo(&mut store));
        assert!(!history.undo(&mut store));
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn clear_empties_both_stacks() {
        let catalog = Catalog::new();
        let mut store = GraphStore::new();
        let mut history = History::default();

        history.record(store.snapshot());
        store.add_node(&catalog, "oscillator", Position::default()).unwrap();
        history.undo(&mut store);

        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
