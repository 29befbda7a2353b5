//! Composite definitions: reusable sub-graphs registered as node types.
//!
//! A [`CompositeDefinition`] declares external ports and an internal graph.
//! The internal graph meets the declared ports through placeholder nodes of
//! type [`EXTERNAL_INPUT`](crate::EXTERNAL_INPUT) /
//! [`EXTERNAL_OUTPUT`](crate::EXTERNAL_OUTPUT), where the placeholder's
//! `key` is the declared port name it stands in for.
//!
//! Definitions are data: expanding one into live objects is the adapter
//! layer's job. Editing a definition never touches already-expanded
//! instances until they are explicitly re-synced.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::spec::{PortSpec, PropertyValue};
use crate::{EXTERNAL_INPUT, EXTERNAL_OUTPUT};

/// A node inside a composite definition's internal graph.
///
/// `key` is a definition-local identifier; it doubles as the declared port
/// name for `external-input` / `external-output` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalNode {
    /// Definition-local identifier.
    pub key: String,
    /// Node type name (catalog entry or placeholder type).
    pub node_type: String,
    /// Property overrides applied on top of the type's defaults.
    #[serde(default)]
    pub properties: Vec<(String, PropertyValue)>,
}

/// An edge inside a composite definition's internal graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalEdge {
    /// Source node key.
    pub source: String,
    /// Target node key.
    pub target: String,
    /// Source port name (ignored on `external-input` placeholders).
    pub source_handle: String,
    /// Target port name (ignored on `external-output` placeholders).
    pub target_handle: String,
}

/// The internal graph of a composite definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InternalGraph {
    /// Internal nodes, including placeholder seams.
    pub nodes: Vec<InternalNode>,
    /// Internal edges.
    pub edges: Vec<InternalEdge>,
}

impl InternalGraph {
    /// Looks up an internal node by key.
    pub fn node(&self, key: &str) -> Option<&InternalNode> {
        self.nodes.iter().find(|n| n.key == key)
    }

    /// True if `key` names an `external-input` placeholder.
    pub fn is_input_seam(&self, key: &str) -> bool {
        self.node(key).is_some_and(|n| n.node_type == EXTERNAL_INPUT)
    }

    /// True if `key` names an `external-output` placeholder.
    pub fn is_output_seam(&self, key: &str) -> bool {
        self.node(key).is_some_and(|n| n.node_type == EXTERNAL_OUTPUT)
    }
}

/// A reusable sub-graph definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeDefinition {
    /// Unique definition id (also the suffix of the registered type name).
    pub id: String,
    /// Human-readable name shown on instances.
    pub name: String,
    /// Declared external input ports.
    pub inputs: Vec<PortSpec>,
    /// Declared external output ports.
    pub outputs: Vec<PortSpec>,
    /// The sub-graph expanded per instance.
    pub internal: InternalGraph,
    /// True for factory definitions, which are read-only.
    #[serde(default)]
    pub prebuilt: bool,
}

/// Store of composite definitions for one editor session.
///
/// Prebuilt definitions ship with the library and can be copied via
/// [`save_as`](Self::save_as) but never edited or removed.
#[derive(Debug, Default)]
pub struct CompositeLibrary {
    defs: BTreeMap<String, CompositeDefinition>,
}

impl CompositeLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a library with the factory definitions registered.
    pub fn with_factory_defaults() -> Self {
        let mut library = Self::new();
        library
            .defs
            .insert("mono-bus".to_string(), mono_bus_definition());
        library
    }

    /// Looks up a definition by id.
    pub fn get(&self, id: &str) -> Option<&CompositeDefinition> {
        self.defs.get(id)
    }

    /// Returns all definitions, ordered by id.
    pub fn all(&self) -> impl Iterator<Item = &CompositeDefinition> {
        self.defs.values()
    }

    /// Returns the number of definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Returns true if the library holds no definitions.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Inserts or replaces a user definition.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::PrebuiltReadOnly`] when the id belongs to a
    /// prebuilt definition, or when attempting to insert one flagged
    /// prebuilt over an existing entry.
    pub fn upsert(&mut self, def: CompositeDefinition) -> Result<(), CatalogError> {
        if let Some(existing) = self.defs.get(&def.id)
            && existing.prebuilt
        {
            return Err(CatalogError::PrebuiltReadOnly(def.id));
        }
        self.defs.insert(def.id.clone(), def);
        Ok(())
    }

    /// Copies an existing definition into a new, independent, mutable one.
    ///
    /// The copy gets a fresh id derived from the source id and is never
    /// flagged prebuilt, regardless of the source.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownDefinition`] if the source id does
    /// not exist.
    pub fn save_as(&mut self, source_id: &str, name: &str) -> Result<String, CatalogError> {
        let source = self
            .defs
            .get(source_id)
            .ok_or_else(|| CatalogError::UnknownDefinition(source_id.to_string()))?;

        let mut copy = source.clone();
        copy.prebuilt = false;
        copy.name = name.to_string();

        let mut n = 1;
        let mut id = format!("{source_id}-copy");
        while self.defs.contains_key(&id) {
            n += 1;
            id = format!("{source_id}-copy{n}");
        }
        copy.id = id.clone();
        self.defs.insert(id.clone(), copy);
        Ok(id)
    }

    /// Removes a user definition.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::PrebuiltReadOnly`] for prebuilt definitions
    /// (which stay registered) and [`CatalogError::UnknownDefinition`] for
    /// unknown ids. No mutation occurs on error.
    pub fn remove(&mut self, id: &str) -> Result<CompositeDefinition, CatalogError> {
        match self.defs.get(id) {
            None => Err(CatalogError::UnknownDefinition(id.to_string())),
            Some(def) if def.prebuilt => Err(CatalogError::PrebuiltReadOnly(id.to_string())),
            Some(_) => self
                .defs
                .remove(id)
                .ok_or_else(|| CatalogError::UnknownDefinition(id.to_string())),
        }
    }
}

/// Factory definition: a gain stage with an external level control.
///
/// input ──► gain ──► output, with the declared `level` port seamed onto
/// the gain node's parameter input.
fn mono_bus_definition() -> CompositeDefinition {
    CompositeDefinition {
        id: "mono-bus".to_string(),
        name: "Mono Bus".to_string(),
        inputs: vec![PortSpec::audio_in("input"), PortSpec::param_in("level")],
        outputs: vec![PortSpec::audio_out("output")],
        internal: InternalGraph {
            nodes: vec![
                InternalNode {
                    key: "input".to_string(),
                    node_type: EXTERNAL_INPUT.to_string(),
                    properties: vec![],
                },
                InternalNode {
                    key: "level".to_string(),
                    node_type: EXTERNAL_INPUT.to_string(),
                    properties: vec![],
                },
                InternalNode {
                    key: "bus".to_string(),
                    node_type: "gain".to_string(),
                    properties: vec![("gain".to_string(), PropertyValue::Number(1.0))],
                },
                InternalNode {
                    key: "output".to_string(),
                    node_type: EXTERNAL_OUTPUT.to_string(),
                    properties: vec![],
                },
            ],
            edges: vec![
                InternalEdge {
                    source: "input".to_string(),
                    target: "bus".to_string(),
                    source_handle: "input".to_string(),
                    target_handle: "input".to_string(),
                },
                InternalEdge {
                    source: "level".to_string(),
                    target: "bus".to_string(),
                    source_handle: "level".to_string(),
                    target_handle: "gain".to_string(),
                },
                InternalEdge {
                    source: "bus".to_string(),
                    target: "output".to_string(),
                    source_handle: "output".to_string(),
                    target_handle: "output".to_string(),
                },
            ],
        },
        prebuilt: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_library_ships_mono_bus() {
        let library = CompositeLibrary::with_factory_defaults();
        let def = library.get("mono-bus").unwrap();
        assert!(def.prebuilt);
        assert_eq!(def.inputs.len(), 2);
        assert_eq!(def.outputs.len(), 1);
        assert!(def.internal.is_input_seam("input"));
        assert!(def.internal.is_output_seam("output"));
        assert!(!def.internal.is_input_seam("bus"));
    }

    #[test]
    fn remove_prebuilt_fails_and_mutates_nothing() {
        let mut library = CompositeLibrary::with_factory_defaults();
        let before = library.len();

        let err = library.remove("mono-bus").unwrap_err();
        assert!(matches!(err, CatalogError::PrebuiltReadOnly(_)));
        assert_eq!(library.len(), before);
        assert!(library.get("mono-bus").is_some());
    }

    #[test]
    fn remove_unknown_fails() {
        let mut library = CompositeLibrary::with_factory_defaults();
        let err = library.remove("ghost").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownDefinition(_)));
    }

    #[test]
    fn save_as_produces_independent_mutable_copy() {
        let mut library = CompositeLibrary::with_factory_defaults();
        let id = library.save_as("mono-bus", "My Bus").unwrap();

        let copy = library.get(&id).unwrap();
        assert!(!copy.prebuilt);
        assert_eq!(copy.name, "My Bus");
        assert_ne!(copy.id, "mono-bus");

        // The copy is removable; the original still is not.
        library.remove(&id).unwrap();
        assert!(library.remove("mono-bus").is_err());
    }

    #[test]
    fn save_as_generates_fresh_ids() {
        let mut library = CompositeLibrary::with_factory_defaults();
        let a = library.save_as("mono-bus", "A").unwrap();
        let b = library.save_as("mono-bus", "B").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn upsert_rejects_overwriting_prebuilt() {
        let mut library = CompositeLibrary::with_factory_defaults();
        let mut def = library.get("mono-bus").unwrap().clone();
        def.name = "Hijacked".to_string();
        def.prebuilt = false;

        let err = library.upsert(def).unwrap_err();
        assert!(matches!(err, CatalogError::PrebuiltReadOnly(_)));
        assert_eq!(library.get("mono-bus").unwrap().name, "Mono Bus");
    }

    #[test]
    fn upsert_replaces_user_definition() {
        let mut library = CompositeLibrary::with_factory_defaults();
        let id = library.save_as("mono-bus", "Mine").unwrap();

        let mut def = library.get(&id).unwrap().clone();
        def.name = "Mine v2".to_string();
        library.upsert(def).unwrap();
        assert_eq!(library.get(&id).unwrap().name, "Mine v2");
    }
}
