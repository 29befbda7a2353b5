//! Project persistence for the patchbay editor.
//!
//! A [`ProjectFile`] is the complete persisted form of a session: the graph
//! model plus any user-defined composite definitions, stored as JSON. Live
//! audio state is deliberately absent; loading a project rebuilds the model
//! and the adapter layer reconciles the live side from it.
//!
//! # Example
//!
//! ```rust
//! use patchbay_catalog::{Catalog, CompositeLibrary};
//! use patchbay_graph::{GraphStore, Position};
//! use patchbay_project::ProjectFile;
//!
//! let catalog = Catalog::new();
//! let mut store = GraphStore::new();
//! store.add_node(&catalog, "oscillator", Position::new(0.0, 0.0))?;
//!
//! let project = ProjectFile::from_store(&store, &CompositeLibrary::new());
//! let json = project.to_json()?;
//! let reloaded = ProjectFile::from_json(&json)?;
//! assert_eq!(reloaded.to_store(&catalog)?.node_count(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod project;

pub use error::ProjectError;
pub use project::ProjectFile;
