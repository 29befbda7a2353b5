//! Clipboard with identity remapping.
//!
//! `copy` detaches a subset of the graph: the named nodes plus only the
//! edges whose both endpoints are in the copied set. `paste` re-inserts the
//! payload under fresh ids, remapping every copied edge through the
//! old-id → new-id map and offsetting positions by a fixed delta so pasted
//! nodes land visibly beside their originals.

use std::collections::BTreeMap;

use crate::model::{GraphStore, NodeId, Position, PropertyMap};

/// Fixed position delta applied to every pasted node.
pub const PASTE_OFFSET: (f32, f32) = (40.0, 40.0);

/// A detached copy of a node/edge subset.
#[derive(Debug, Clone)]
pub struct ClipboardPayload {
    nodes: Vec<CopiedNode>,
    edges: Vec<CopiedEdge>,
}

#[derive(Debug, Clone)]
struct CopiedNode {
    old_id: NodeId,
    node_type: String,
    position: Position,
    properties: PropertyMap,
}

#[derive(Debug, Clone)]
struct CopiedEdge {
    source: NodeId,
    target: NodeId,
    source_handle: String,
    target_handle: String,
}

impl ClipboardPayload {
    /// Number of copied nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of copied edges (both endpoints always in the node set).
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Session clipboard.
#[derive(Debug, Default)]
pub struct Clipboard {
    payload: Option<ClipboardPayload>,
}

impl Clipboard {
    /// Creates an empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if a payload is available to paste.
    pub fn can_paste(&self) -> bool {
        self.payload.is_some()
    }

    /// Snapshots the named nodes and the edges internal to that set.
    ///
    /// Unknown ids are skipped; copying an empty or fully-unknown set
    /// leaves the clipboard unchanged.
    pub fn copy(&mut self, store: &GraphStore, ids: &[NodeId]) {
        let nodes: Vec<CopiedNode> = ids
            .iter()
            .filter_map(|&id| store.node(id))
            .map(|n| CopiedNode {
                old_id: n.id,
                node_type: n.node_type.clone(),
                position: n.position,
                properties: n.properties.clone(),
            })
            .collect();
        if nodes.is_empty() {
            return;
        }

        let in_set = |id: NodeId| nodes.iter().any(|n| n.old_id == id);
        let edges = store
            .edges()
            .filter(|e| in_set(e.source) && in_set(e.target))
            .map(|e| CopiedEdge {
                source: e.source,
                target: e.target,
                source_handle: e.source_handle.clone(),
                target_handle: e.target_handle.clone(),
            })
            .collect();

        self.payload = Some(ClipboardPayload { nodes, edges });
    }

    /// Inserts the payload under fresh ids and returns the new node ids.
    ///
    /// Positions are offset by [`PASTE_OFFSET`]. The payload stays on the
    /// clipboard, so repeated pastes produce further copies. Returns an
    /// empty vec if the clipboard is empty.
    pub fn paste(&self, store: &mut GraphStore) -> Vec<NodeId> {
        let Some(payload) = &self.payload else {
            return Vec::new();
        };

        let mut id_map: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        let mut pasted = Vec::with_capacity(payload.nodes.len());
        for node in &payload.nodes {
            let new_id = store.import_node(
                node.node_type.clone(),
                node.position.offset(PASTE_OFFSET.0, PASTE_OFFSET.1),
                node.properties.clone(),
            );
            id_map.insert(node.old_id, new_id);
            pasted.push(new_id);
        }

        for edge in &payload.edges {
            // Both endpoints were copied, so both remap; anything else was
            // dropped at copy time.
            if let (Some(&source), Some(&target)) =
                (id_map.get(&edge.source), id_map.get(&edge.target))
            {
                store.import_edge(
                    source,
                    target,
                    edge.source_handle.clone(),
                    edge.target_handle.clone(),
                );
            }
        }

        pasted
    }
}
