//! The graph store: nodes, edges, properties, and their mutators.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use patchbay_catalog::{Catalog, PropertyValue};

use crate::error::GraphError;
use crate::validate::resolve_connection;

/// Unique identifier for a node in the graph.
///
/// Node ids are assigned sequentially and never reused within a store's
/// lifetime. They remain stable across mutations, snapshots, and restores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Unique identifier for an edge in the graph.
///
/// Edge ids are assigned sequentially and never reused within a store's
/// lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub(crate) u32);

impl EdgeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Canvas position of a node.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Position {
    /// Creates a position.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns this position shifted by a delta.
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Ordered name → value property map.
///
/// Preserves catalog declaration order so the inspector UI renders
/// properties in a stable, meaningful sequence.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyMap {
    entries: Vec<(String, PropertyValue)>,
}

impl PropertyMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a property value by name.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Returns true if a property with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Sets a property value, replacing an existing entry in place or
    /// appending a new one.
    pub fn set(&mut self, name: &str, value: PropertyValue) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name.to_string(), value));
        }
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, PropertyValue)> for PropertyMap {
    fn from_iter<T: IntoIterator<Item = (String, PropertyValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A placed node in the graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Stable id, unique for the node's lifetime.
    pub id: NodeId,
    /// Key into the node type catalog.
    pub node_type: String,
    /// Canvas position.
    pub position: Position,
    /// Current property values, in catalog declaration order.
    pub properties: PropertyMap,
}

/// A directed connection between two node ports.
///
/// Handles are stored resolved: port defaulting is applied at connect time,
/// so serialized edges always name concrete ports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Stable id, unique for the edge's lifetime.
    pub id: EdgeId,
    /// Source node id.
    pub source: NodeId,
    /// Target node id.
    pub target: NodeId,
    /// Source output port name.
    pub source_handle: String,
    /// Target input port name.
    pub target_handle: String,
}

/// An immutable deep copy of the model, used by undo/redo.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphSnapshot {
    /// Nodes at snapshot time.
    pub nodes: Vec<GraphNode>,
    /// Edges at snapshot time.
    pub edges: Vec<GraphEdge>,
}

/// Receipt from a cascading node removal.
#[derive(Clone, Debug)]
pub struct RemovedNode {
    /// The removed node.
    pub node: GraphNode,
    /// Every edge that touched it, removed alongside.
    pub edges: Vec<GraphEdge>,
}

/// The authoritative, serializable node/edge/property store.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: BTreeMap<NodeId, GraphNode>,
    edges: BTreeMap<EdgeId, GraphEdge>,
    next_node: u32,
    next_edge: u32,
    revision: u64,
}

impl GraphStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted parts, recovering the id counters
    /// as `max(id) + 1`.
    pub fn from_parts(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let next_node = nodes.iter().map(|n| n.id.0 + 1).max().unwrap_or(0);
        let next_edge = edges.iter().map(|e| e.id.0 + 1).max().unwrap_or(0);
        Self {
            nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
            edges: edges.into_iter().map(|e| (e.id, e)).collect(),
            next_node,
            next_edge,
            revision: 0,
        }
    }

    /// The revision counter, bumped on every observable mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    // --- Read views ---

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    /// Looks up an edge by id.
    pub fn edge(&self, id: EdgeId) -> Option<&GraphEdge> {
        self.edges.get(&id)
    }

    /// True if the node exists.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Iterates all nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Iterates all edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.values()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Ids of every edge touching a node, as source or target.
    pub fn edges_touching(&self, id: NodeId) -> Vec<EdgeId> {
        self.edges
            .values()
            .filter(|e| e.source == id || e.target == id)
            .map(|e| e.id)
            .collect()
    }

    /// Edges leaving a node through a specific output port.
    pub fn edges_from(&self, source: NodeId, source_handle: &str) -> Vec<&GraphEdge> {
        self.edges
            .values()
            .filter(|e| e.source == source && e.source_handle == source_handle)
            .collect()
    }

    /// The edge driving a specific input port, if any.
    pub fn incoming_edge(&self, target: NodeId, target_handle: &str) -> Option<&GraphEdge> {
        self.edges
            .values()
            .find(|e| e.target == target && e.target_handle == target_handle)
    }

    // --- Mutators ---

    /// Adds a node of the given type with a fresh id and the type's
    /// default properties.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNodeType`] if the catalog has no entry
    /// for `node_type`.
    pub fn add_node(
        &mut self,
        catalog: &Catalog,
        node_type: &str,
        position: Position,
    ) -> Result<NodeId, GraphError> {
        let spec = catalog
            .get(node_type)
            .ok_or_else(|| GraphError::UnknownNodeType(node_type.to_string()))?;

        let properties = spec.default_properties().into_iter().collect();
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(
            id,
            GraphNode {
                id,
                node_type: node_type.to_string(),
                position,
                properties,
            },
        );
        self.bump();
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: {node_type} node {id}");
        Ok(id)
    }

    /// Removes a node, cascading to every edge that touches it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if the node does not exist; the
    /// store is unchanged in that case.
    pub fn remove_node(&mut self, id: NodeId) -> Result<RemovedNode, GraphError> {
        let node = self.nodes.remove(&id).ok_or(GraphError::UnknownNode(id))?;
        let touching = self.edges_touching(id);
        let mut edges = Vec::with_capacity(touching.len());
        for edge_id in touching {
            if let Some(edge) = self.edges.remove(&edge_id) {
                edges.push(edge);
            }
        }
        self.bump();
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_remove: node {id}, {} cascaded edges", edges.len());
        Ok(RemovedNode { node, edges })
    }

    /// Connects two nodes after full validation.
    ///
    /// Omitted handles default to the node type's primary port. On any
    /// validation failure the store is unchanged.
    ///
    /// # Errors
    ///
    /// See [`resolve_connection`] for the rejection rules.
    pub fn add_edge(
        &mut self,
        catalog: &Catalog,
        source: NodeId,
        target: NodeId,
        source_handle: Option<&str>,
        target_handle: Option<&str>,
    ) -> Result<EdgeId, GraphError> {
        let resolved = resolve_connection(self, catalog, source, target, source_handle, target_handle)?;

        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.edges.insert(
            id,
            GraphEdge {
                id,
                source,
                target,
                source_handle: resolved.source_port.name,
                target_handle: resolved.target_port.name,
            },
        );
        self.bump();
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_connect: {source} → {target} ({id})");
        Ok(id)
    }

    /// Removes an edge.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownEdge`] if the edge does not exist.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<GraphEdge, GraphError> {
        let edge = self.edges.remove(&id).ok_or(GraphError::UnknownEdge(id))?;
        self.bump();
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_disconnect: edge {id}");
        Ok(edge)
    }

    /// Moves a node on the canvas.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if the node does not exist.
    pub fn set_position(&mut self, id: NodeId, position: Position) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(GraphError::UnknownNode(id))?;
        node.position = position;
        self.bump();
        Ok(())
    }

    /// Sets a property after validating it against the node type's spec.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`], [`GraphError::UnknownNodeType`]
    /// (node type no longer in the catalog), [`GraphError::UnknownProperty`],
    /// or [`GraphError::PropertyTypeMismatch`]. The store is unchanged on
    /// any failure.
    pub fn set_property(
        &mut self,
        catalog: &Catalog,
        id: NodeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), GraphError> {
        let node = self.nodes.get(&id).ok_or(GraphError::UnknownNode(id))?;
        let spec = catalog
            .get(&node.node_type)
            .ok_or_else(|| GraphError::UnknownNodeType(node.node_type.clone()))?;
        let prop = spec
            .property(name)
            .ok_or_else(|| GraphError::UnknownProperty {
                node_type: node.node_type.clone(),
                property: name.to_string(),
            })?;
        if !prop.kind.accepts(&value) {
            return Err(GraphError::PropertyTypeMismatch {
                node_type: node.node_type.clone(),
                property: name.to_string(),
            });
        }

        // Re-borrow mutably only after all checks pass.
        if let Some(node) = self.nodes.get_mut(&id) {
            node.properties.set(name, value);
        }
        self.bump();
        Ok(())
    }

    /// Bridge-initiated property write: mirrors a live value into the
    /// model so the UI reflects it, without catalog validation.
    ///
    /// Returns `false` (and changes nothing) if the node or property does
    /// not exist — the bridge treats that as an expected transient state,
    /// never an error.
    pub fn mirror_property(&mut self, id: NodeId, name: &str, value: PropertyValue) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        if !node.properties.contains(name) {
            return false;
        }
        node.properties.set(name, value);
        self.bump();
        true
    }

    // --- Snapshots ---

    /// Deep-copies the current `{nodes, edges}` pair.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
        }
    }

    /// Restores a snapshot exactly.
    ///
    /// Id counters are never lowered, so ids from states discarded by the
    /// history are still never reused.
    pub fn restore(&mut self, snapshot: &GraphSnapshot) {
        self.nodes = snapshot.nodes.iter().map(|n| (n.id, n.clone())).collect();
        self.edges = snapshot.edges.iter().map(|e| (e.id, e.clone())).collect();
        let max_node = snapshot.nodes.iter().map(|n| n.id.0 + 1).max().unwrap_or(0);
        let max_edge = snapshot.edges.iter().map(|e| e.id.0 + 1).max().unwrap_or(0);
        self.next_node = self.next_node.max(max_node);
        self.next_edge = self.next_edge.max(max_edge);
        self.bump();
    }

    // --- Raw imports (clipboard paste, project load) ---

    /// Inserts a detached node copy under a fresh id. No catalog checks;
    /// used by paste, which copies nodes that were valid when copied.
    pub fn import_node(
        &mut self,
        node_type: String,
        position: Position,
        properties: PropertyMap,
    ) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(
            id,
            GraphNode {
                id,
                node_type,
                position,
                properties,
            },
        );
        self.bump();
        id
    }

    /// Inserts a detached edge copy under a fresh id. No validation; used
    /// by paste, where both endpoints are freshly imported nodes.
    pub fn import_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        source_handle: String,
        target_handle: String,
    ) -> EdgeId {
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.edges.insert(
            id,
            GraphEdge {
                id,
                source,
                target,
                source_handle,
                target_handle,
            },
        );
        self.bump();
        id
    }
}
