//! Authoritative graph model for the patchbay editor.
//!
//! This crate owns the persisted side of the system: nodes, edges, and
//! properties, plus the operations the UI and the assistant collaborator
//! call. It knows nothing about live audio objects — the adapter layer in
//! `patchbay-engine` rebuilds itself from whatever state this model settles
//! into.
//!
//! # Architecture
//!
//! The model uses id-based indirection throughout: edges reference nodes by
//! [`NodeId`], nodes are unaware of their edges, and nothing stores a direct
//! object reference to anything else. Ids are assigned sequentially and
//! never reused within a store's lifetime, so they stay stable across
//! mutations, snapshots, and restores.
//!
//! Every observable mutation bumps a monotonically increasing revision
//! counter. Observers poll the revision and read `nodes()`/`edges()`; since
//! all mutation runs to completion within one logical turn, a consistent
//! pair is always observed.
//!
//! # Example
//!
//! ```rust
//! use patchbay_catalog::Catalog;
//! use patchbay_graph::{GraphStore, Position};
//!
//! let catalog = Catalog::new();
//! let mut store = GraphStore::new();
//!
//! let osc = store.add_node(&catalog, "oscillator", Position::new(0.0, 0.0))?;
//! let out = store.add_node(&catalog, "destination", Position::new(200.0, 0.0))?;
//! let edge = store.add_edge(&catalog, osc, out, None, None)?;
//!
//! assert_eq!(store.edges().count(), 1);
//! store.remove_node(osc)?; // cascades to the edge
//! assert_eq!(store.edges().count(), 0);
//! # assert!(store.edge(edge).is_none());
//! # Ok::<(), patchbay_graph::GraphError>(())
//! ```

pub mod clipboard;
pub mod error;
pub mod history;
pub mod model;
pub mod validate;

pub use clipboard::{Clipboard, ClipboardPayload, PASTE_OFFSET};
pub use error::GraphError;
pub use history::History;
pub use model::{
    EdgeId, GraphEdge, GraphNode, GraphSnapshot, GraphStore, NodeId, Position, PropertyMap,
    RemovedNode,
};
pub use validate::{ResolvedConnection, is_valid_connection, resolve_connection};
