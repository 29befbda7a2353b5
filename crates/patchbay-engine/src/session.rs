//! The session facade: one editor session over one model and one backend.
//!
//! A [`Session`] owns the catalog, composite library, graph store, history,
//! clipboard, and adapter layer, and exposes the operations the UI and the
//! assistant collaborator call. It is an explicitly constructed context
//! object; nothing here is process-wide.
//!
//! Every mutator is one undoable step: snapshot before applying, record
//! only on success, reconcile after. Failed operations leave the model,
//! history, and live layer untouched.

use std::path::Path;

use serde::{Deserialize, Serialize};

use patchbay_catalog::{
    Catalog, CatalogError, CompositeDefinition, CompositeLibrary, PropertyValue,
    composite_type_name,
};
use patchbay_graph::{
    Clipboard, EdgeId, GraphEdge, GraphNode, GraphStore, History, NodeId, Position,
};
use patchbay_project::ProjectFile;

use crate::adapter::AdapterLayer;
use crate::backend::AudioBackend;
use crate::error::EngineError;

/// One step of an assistant-driven batch mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BatchOp {
    /// Add a node of a catalog type.
    AddNode {
        /// Catalog type name.
        node_type: String,
        /// Canvas position.
        position: Position,
    },
    /// Remove a node, cascading to its edges.
    RemoveNode {
        /// The node to remove.
        node: NodeId,
    },
    /// Connect two nodes.
    Connect {
        /// Source node.
        source: NodeId,
        /// Target node.
        target: NodeId,
        /// Source port, defaulting to the type's primary output.
        #[serde(default)]
        source_handle: Option<String>,
        /// Target port, defaulting to the type's primary input.
        #[serde(default)]
        target_handle: Option<String>,
    },
    /// Remove an edge.
    Disconnect {
        /// The edge to remove.
        edge: EdgeId,
    },
    /// Move a node on the canvas.
    Move {
        /// The node to move.
        node: NodeId,
        /// New position.
        position: Position,
    },
    /// Set a node property.
    SetProperty {
        /// The node to update.
        node: NodeId,
        /// Property name.
        name: String,
        /// New value.
        value: PropertyValue,
    },
}

/// What a successful batch step produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// A node was created.
    Node(NodeId),
    /// An edge was created.
    Edge(EdgeId),
    /// The step succeeded with nothing to hand back.
    Done,
}

/// Per-step results of [`Session::apply_batch`].
///
/// Steps already applied are never rolled back by a later failure; the
/// whole batch is still a single undoable step.
#[derive(Debug)]
pub struct BatchReport {
    /// One result per submitted op, in order.
    pub results: Vec<Result<BatchOutcome, EngineError>>,
}

impl BatchReport {
    /// Number of steps that succeeded.
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    /// Number of steps that failed.
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// True if every step succeeded.
    pub fn is_all_ok(&self) -> bool {
        self.failed() == 0
    }
}

/// One editor session.
pub struct Session<B: AudioBackend> {
    catalog: Catalog,
    library: CompositeLibrary,
    store: GraphStore,
    history: History,
    clipboard: Clipboard,
    adapter: AdapterLayer<B>,
    selected: Option<NodeId>,
}

impl<B: AudioBackend> Session<B> {
    /// Creates a session, registering the library's definitions as
    /// catalog types.
    ///
    /// # Errors
    ///
    /// [`CatalogError`] if a definition cannot be registered.
    pub fn new(
        mut catalog: Catalog,
        library: CompositeLibrary,
        backend: B,
    ) -> Result<Self, EngineError> {
        for def in library.all() {
            if catalog.get(&composite_type_name(&def.id)).is_none() {
                catalog.register_composite(def)?;
            }
        }
        Ok(Self {
            catalog,
            library,
            store: GraphStore::new(),
            history: History::default(),
            clipboard: Clipboard::new(),
            adapter: AdapterLayer::new(backend),
            selected: None,
        })
    }

    // --- Reads ---

    /// The node type catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The composite definition library.
    pub fn library(&self) -> &CompositeLibrary {
        &self.library
    }

    /// The graph model.
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// The adapter layer, for binding inspection.
    pub fn adapter(&self) -> &AdapterLayer<B> {
        &self.adapter
    }

    /// All nodes, in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.store.nodes()
    }

    /// All edges, in id order.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.store.edges()
    }

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.store.node(id)
    }

    /// The model revision counter; bumped on every observable mutation.
    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    /// The currently selected node, if any.
    pub fn selected_node(&self) -> Option<NodeId> {
        self.selected
    }

    /// True if an undo step exists.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// True if a redo step exists.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// True if the clipboard holds a payload.
    pub fn can_paste(&self) -> bool {
        self.clipboard.can_paste()
    }

    /// The live-binding failure reason for a node, if its binding failed.
    pub fn binding_error(&self, id: NodeId) -> Option<&str> {
        self.adapter.binding_error(id)
    }

    // --- Mutators (one undoable step each) ---

    /// Adds a node and reconciles its live binding.
    ///
    /// # Errors
    ///
    /// Model invariant violations; live-binding failures flag the node
    /// instead.
    pub fn add_node(&mut self, node_type: &str, position: Position) -> Result<NodeId, EngineError> {
        let snapshot = self.store.snapshot();
        let id = self.store.add_node(&self.catalog, node_type, position)?;
        self.history.record(snapshot);
        self.reconcile();
        Ok(id)
    }

    /// Removes a node, cascading to its edges, and tears down its binding.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), EngineError> {
        let snapshot = self.store.snapshot();
        self.store.remove_node(id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.history.record(snapshot);
        self.reconcile();
        Ok(())
    }

    /// Connects two nodes and reconciles the live wiring.
    pub fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        source_handle: Option<&str>,
        target_handle: Option<&str>,
    ) -> Result<EdgeId, EngineError> {
        let snapshot = self.store.snapshot();
        let id = self
            .store
            .add_edge(&self.catalog, source, target, source_handle, target_handle)?;
        self.history.record(snapshot);
        self.reconcile();
        Ok(id)
    }

    /// Removes an edge and reconciles the live wiring.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<(), EngineError> {
        let snapshot = self.store.snapshot();
        self.store.remove_edge(id)?;
        self.history.record(snapshot);
        self.reconcile();
        Ok(())
    }

    /// Moves a node on the canvas.
    pub fn update_node_position(
        &mut self,
        id: NodeId,
        position: Position,
    ) -> Result<(), EngineError> {
        let snapshot = self.store.snapshot();
        self.store.set_position(id, position)?;
        self.history.record(snapshot);
        Ok(())
    }

    /// Sets a node property and writes it through to the live side.
    ///
    /// For logic nodes this recomputes the unit and bridges its outputs
    /// in the same step.
    pub fn set_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), EngineError> {
        let snapshot = self.store.snapshot();
        self.store
            .set_property(&self.catalog, id, name, value.clone())?;
        self.history.record(snapshot);
        self.adapter
            .apply_property(&mut self.store, &self.catalog, id, name, &value);
        Ok(())
    }

    /// Selects a node (or clears the selection). Not undoable.
    pub fn select_node(&mut self, id: Option<NodeId>) {
        self.selected = id.filter(|id| self.store.contains_node(*id));
    }

    /// Copies nodes (and the edges among them) to the clipboard. Not
    /// undoable.
    pub fn copy(&mut self, ids: &[NodeId]) {
        self.clipboard.copy(&self.store, ids);
    }

    /// Copies then removes nodes, as one undoable step.
    pub fn cut(&mut self, ids: &[NodeId]) -> Result<(), EngineError> {
        self.clipboard.copy(&self.store, ids);
        let snapshot = self.store.snapshot();
        let mut removed = false;
        for &id in ids {
            if self.store.contains_node(id) {
                self.store.remove_node(id)?;
                if self.selected == Some(id) {
                    self.selected = None;
                }
                removed = true;
            }
        }
        if removed {
            self.history.record(snapshot);
            self.reconcile();
        }
        Ok(())
    }

    /// Pastes the clipboard payload under fresh ids, as one undoable step.
    /// Returns the new node ids; empty when the clipboard is empty.
    pub fn paste(&mut self) -> Vec<NodeId> {
        if !self.clipboard.can_paste() {
            return Vec::new();
        }
        let snapshot = self.store.snapshot();
        let pasted = self.clipboard.paste(&mut self.store);
        if pasted.is_empty() {
            return pasted;
        }
        self.history.record(snapshot);
        self.reconcile();
        pasted
    }

    /// Restores the previous undo snapshot and reconciles the live layer
    /// toward it. Returns `false` (a no-op) when the history is empty.
    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.store);
        if changed {
            if let Some(id) = self.selected
                && !self.store.contains_node(id)
            {
                self.selected = None;
            }
            self.reconcile();
        }
        changed
    }

    /// Re-applies the most recently undone step.
    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo(&mut self.store);
        if changed {
            self.reconcile();
        }
        changed
    }

    /// Applies a batch of ops as one undoable step with per-step results.
    ///
    /// Steps apply in order; a failing step is reported and skipped, and
    /// earlier steps are not rolled back. Reconciliation runs once after
    /// the whole batch.
    pub fn apply_batch(&mut self, ops: Vec<BatchOp>) -> BatchReport {
        let snapshot = self.store.snapshot();
        let mut results = Vec::with_capacity(ops.len());
        let mut writes: Vec<(NodeId, String, PropertyValue)> = Vec::new();
        for op in ops {
            let result = self.apply_batch_op(op, &mut writes);
            results.push(result);
        }
        let changed = results.iter().any(Result::is_ok);
        if changed {
            self.history.record(snapshot);
            self.reconcile();
            for (node, name, value) in writes {
                self.adapter
                    .apply_property(&mut self.store, &self.catalog, node, &name, &value);
            }
        }
        BatchReport { results }
    }

    fn apply_batch_op(
        &mut self,
        op: BatchOp,
        writes: &mut Vec<(NodeId, String, PropertyValue)>,
    ) -> Result<BatchOutcome, EngineError> {
        match op {
            BatchOp::AddNode {
                node_type,
                position,
            } => {
                let id = self.store.add_node(&self.catalog, &node_type, position)?;
                Ok(BatchOutcome::Node(id))
            }
            BatchOp::RemoveNode { node } => {
                self.store.remove_node(node)?;
                if self.selected == Some(node) {
                    self.selected = None;
                }
                Ok(BatchOutcome::Done)
            }
            BatchOp::Connect {
                source,
                target,
                source_handle,
                target_handle,
            } => {
                let id = self.store.add_edge(
                    &self.catalog,
                    source,
                    target,
                    source_handle.as_deref(),
                    target_handle.as_deref(),
                )?;
                Ok(BatchOutcome::Edge(id))
            }
            BatchOp::Disconnect { edge } => {
                self.store.remove_edge(edge)?;
                Ok(BatchOutcome::Done)
            }
            BatchOp::Move { node, position } => {
                self.store.set_position(node, position)?;
                Ok(BatchOutcome::Done)
            }
            BatchOp::SetProperty { node, name, value } => {
                self.store
                    .set_property(&self.catalog, node, &name, value.clone())?;
                writes.push((node, name, value));
                Ok(BatchOutcome::Done)
            }
        }
    }

    // --- Logic drive-through (transient, not undoable) ---

    /// Advances a timer or random node and bridges what it produced.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotLogic`] when the node has no logic binding.
    pub fn fire_timer(&mut self, id: NodeId) -> Result<(), EngineError> {
        let produced = self.adapter.fire(id).ok_or(EngineError::NotLogic(id))?;
        self.bridge(id, produced);
        Ok(())
    }

    /// Feeds a MIDI note-on into a midi-input node and bridges it.
    pub fn midi_note_on(&mut self, id: NodeId, note: u8, velocity: u8) -> Result<(), EngineError> {
        let produced = self
            .adapter
            .note_on(id, note, velocity)
            .ok_or(EngineError::NotLogic(id))?;
        self.bridge(id, produced);
        Ok(())
    }

    /// Feeds a MIDI note-off into a midi-input node and bridges it.
    pub fn midi_note_off(&mut self, id: NodeId, note: u8) -> Result<(), EngineError> {
        let produced = self
            .adapter
            .note_off(id, note)
            .ok_or(EngineError::NotLogic(id))?;
        self.bridge(id, produced);
        Ok(())
    }

    fn bridge(&mut self, source: NodeId, produced: Vec<(String, f64)>) {
        for (output, value) in produced {
            self.adapter
                .push_output(&mut self.store, &self.catalog, source, &output, value);
        }
    }

    // --- Composite definitions ---

    /// Inserts or replaces a user definition and (re)registers its type.
    ///
    /// Placed instances of a replaced definition keep their old expansion
    /// until [`resync_composite`](Self::resync_composite).
    pub fn register_composite(&mut self, def: CompositeDefinition) -> Result<(), EngineError> {
        self.library.upsert(def.clone())?;
        if self.catalog.get(&composite_type_name(&def.id)).is_some() {
            self.catalog.unregister_composite(&def.id)?;
        }
        self.catalog.register_composite(&def)?;
        Ok(())
    }

    /// Copies a definition (prebuilt included) into a fresh, independent,
    /// mutable one and registers its type. Returns the new definition id.
    pub fn save_definition_as(
        &mut self,
        source_id: &str,
        name: &str,
    ) -> Result<String, EngineError> {
        let id = self.library.save_as(source_id, name)?;
        let def = self
            .library
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownDefinition(id.clone()))?;
        self.catalog.register_composite(&def)?;
        Ok(id)
    }

    /// Removes a user definition and unregisters its type.
    ///
    /// # Errors
    ///
    /// Prebuilt definitions are rejected with no mutation.
    pub fn remove_definition(&mut self, id: &str) -> Result<(), EngineError> {
        self.library.remove(id)?;
        if self.catalog.get(&composite_type_name(id)).is_some() {
            self.catalog.unregister_composite(id)?;
        }
        Ok(())
    }

    /// Tears down one composite instance's expansion and rebuilds it from
    /// the current definition.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotComposite`] when the node is not a composite
    /// instance.
    pub fn resync_composite(&mut self, id: NodeId) -> Result<(), EngineError> {
        let is_composite = self
            .store
            .node(id)
            .and_then(|n| self.catalog.get(&n.node_type))
            .is_some_and(patchbay_catalog::NodeTypeSpec::is_composite);
        if !is_composite {
            return Err(EngineError::NotComposite(id));
        }
        self.adapter.teardown(id);
        self.reconcile();
        Ok(())
    }

    // --- Persistence ---

    /// Saves the model and user definitions to a JSON project file.
    pub fn save_project(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        ProjectFile::from_store(&self.store, &self.library).save(path)?;
        Ok(())
    }

    /// Replaces the session's model with a project file's contents.
    ///
    /// Registers the file's composites, rebuilds the store, clears both
    /// history stacks (a load is not undoable into the prior session),
    /// and reconciles the live layer from scratch.
    pub fn load_project(&mut self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let project = ProjectFile::load(path)?;
        for def in &project.composites {
            if self.library.get(&def.id).is_none() {
                self.library.upsert(def.clone())?;
                self.catalog.register_composite(def)?;
            }
        }
        self.store = project.to_store(&self.catalog)?;
        self.history.clear();
        self.selected = None;
        self.reconcile();
        Ok(())
    }

    /// Releases every live binding. Also runs on drop.
    pub fn close(&mut self) {
        self.adapter.close();
    }

    fn reconcile(&mut self) {
        self.adapter
            .reconcile(&mut self.store, &self.catalog, &self.library);
    }
}
