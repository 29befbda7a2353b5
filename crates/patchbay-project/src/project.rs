//! Project file format and operations.
//!
//! Projects are stored as JSON files containing the persisted graph (nodes,
//! edges) plus any user-defined composite definitions. A file is sufficient
//! to fully reconstruct the model; the live layer is then rebuilt from the
//! model by reconciliation, so nothing about live objects is persisted.
//!
//! # JSON format
//!
//! ```json
//! {
//!   "nodes": [
//!     { "id": 0, "node_type": "oscillator", "position": { "x": 0.0, "y": 0.0 },
//!       "properties": [["frequency", 440.0], ["detune", 0.0], ["waveform", "sine"]] }
//!   ],
//!   "edges": [
//!     { "id": 0, "source": 0, "target": 1,
//!       "source_handle": "output", "target_handle": "input" }
//!   ],
//!   "composites": []
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use patchbay_catalog::{Catalog, CompositeDefinition, CompositeLibrary};
use patchbay_graph::{GraphEdge, GraphNode, GraphStore};

use crate::error::ProjectError;

/// Persisted form of an editor session.
///
/// Prebuilt factory composites ship with every library, so only
/// user-defined definitions are stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Persisted nodes, ids included.
    #[serde(default)]
    pub nodes: Vec<GraphNode>,

    /// Persisted edges, ids and resolved handles included.
    #[serde(default)]
    pub edges: Vec<GraphEdge>,

    /// User-defined composite definitions referenced by the graph.
    #[serde(default)]
    pub composites: Vec<CompositeDefinition>,
}

impl ProjectFile {
    /// Captures the current model and the library's user-defined
    /// definitions.
    pub fn from_store(store: &GraphStore, library: &CompositeLibrary) -> Self {
        let snapshot = store.snapshot();
        Self {
            nodes: snapshot.nodes,
            edges: snapshot.edges,
            composites: library.all().filter(|d| !d.prebuilt).cloned().collect(),
        }
    }

    /// Rebuilds a store from the persisted graph.
    ///
    /// Callers must register this file's [`composites`](Self::composites)
    /// with the catalog first; every node type in the file is validated
    /// against the catalog here. Id counters recover as `max(id) + 1`.
    ///
    /// # Errors
    ///
    /// [`ProjectError::UnknownNodeType`] for the first unresolvable type.
    pub fn to_store(&self, catalog: &Catalog) -> Result<GraphStore, ProjectError> {
        for node in &self.nodes {
            if catalog.get(&node.node_type).is_none() {
                return Err(ProjectError::UnknownNodeType(node.node_type.clone()));
            }
        }
        Ok(GraphStore::from_parts(
            self.nodes.clone(),
            self.edges.clone(),
        ))
    }

    /// Load a project from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ProjectError::read_file(path, e))?;
        Self::from_json(&content)
    }

    /// Load a project from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save the project to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ProjectError::write_file(path, e))?;
        }

        let content = self.to_json()?;
        std::fs::write(path, content).map_err(|e| ProjectError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the project to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// True if the project holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
