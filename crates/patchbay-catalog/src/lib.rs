//! Node type catalog and composite definition library for patchbay.
//!
//! This crate is the static side of the editor: it describes what kinds of
//! nodes exist (their ports, properties, and categories) without knowing
//! anything about a placed graph or the live audio objects behind it.
//!
//! # Features
//!
//! - **Type Discovery**: list all node types with metadata for UI pickers
//! - **Port/Property Specs**: declared ports (audio/control, in/out) and
//!   typed default properties per node type
//! - **Capability Flags**: native audio types vs. in-process logic types
//! - **Composite Registration**: sub-graph definitions registered as
//!   first-class node types at runtime
//!
//! # Example
//!
//! ```rust
//! use patchbay_catalog::{Catalog, NodeCategory};
//!
//! let catalog = Catalog::new();
//!
//! // List all node types
//! for spec in catalog.all() {
//!     println!("{}: {}", spec.name, spec.label);
//! }
//!
//! // Inspect a type
//! let osc = catalog.get("oscillator").unwrap();
//! assert!(osc.is_audio());
//! assert_eq!(osc.default_output().unwrap().name, "output");
//!
//! // Filter by category
//! for spec in catalog.in_category(NodeCategory::Logic) {
//!     println!("logic node: {}", spec.name);
//! }
//! ```

pub mod composite;
pub mod error;
pub mod spec;

mod builtin;
mod catalog;

pub use catalog::{Catalog, composite_type_name};
pub use composite::{CompositeDefinition, CompositeLibrary, InternalEdge, InternalGraph, InternalNode};
pub use error::CatalogError;
pub use spec::{
    NodeCategory, NodeTypeSpec, PortDirection, PortSpec, PropertyKind, PropertySpec, PropertyValue,
    SignalKind,
};

/// Node type name of the composite-input placeholder inside a definition's
/// internal graph.
pub const EXTERNAL_INPUT: &str = "external-input";

/// Node type name of the composite-output placeholder inside a definition's
/// internal graph.
pub const EXTERNAL_OUTPUT: &str = "external-output";
