//! The node type catalog.
//!
//! Read-only at runtime except for composite type registration. The catalog
//! is an explicitly constructed object, not a process-wide singleton: one
//! editor session owns one catalog.

use crate::builtin;
use crate::composite::CompositeDefinition;
use crate::error::CatalogError;
use crate::spec::{NodeCategory, NodeTypeSpec};

/// Returns the node type name under which a composite definition is
/// registered.
pub fn composite_type_name(definition_id: &str) -> String {
    format!("composite:{definition_id}")
}

/// Catalog of all known node types.
///
/// Built-in types are registered at construction and can never be removed
/// or shadowed. Composite definitions are registered and unregistered
/// dynamically under `composite:<definition id>` names.
pub struct Catalog {
    entries: Vec<NodeTypeSpec>,
    builtin_count: usize,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Creates a catalog with all built-in node types registered.
    pub fn new() -> Self {
        let entries = builtin::all();
        let builtin_count = entries.len();
        Self {
            entries,
            builtin_count,
        }
    }

    /// Looks up a node type by name.
    pub fn get(&self, name: &str) -> Option<&NodeTypeSpec> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Looks up a node type by name, or returns [`CatalogError::UnknownType`].
    pub fn require(&self, name: &str) -> Result<&NodeTypeSpec, CatalogError> {
        self.get(name)
            .ok_or_else(|| CatalogError::UnknownType(name.to_string()))
    }

    /// Returns all registered node types.
    pub fn all(&self) -> impl Iterator<Item = &NodeTypeSpec> {
        self.entries.iter()
    }

    /// Returns the node types in a specific category.
    pub fn in_category(&self, category: NodeCategory) -> Vec<&NodeTypeSpec> {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .collect()
    }

    /// Registers a composite definition as a node type.
    ///
    /// The new type's ports are exactly the definition's declared
    /// inputs and outputs; it carries no properties of its own.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateComposite`] if a type for this
    /// definition id is already registered.
    pub fn register_composite(&mut self, def: &CompositeDefinition) -> Result<(), CatalogError> {
        let name = composite_type_name(&def.id);
        if self.get(&name).is_some() {
            return Err(CatalogError::DuplicateComposite(def.id.clone()));
        }

        let mut ports = def.inputs.clone();
        ports.extend(def.outputs.iter().cloned());
        self.entries.push(NodeTypeSpec {
            name,
            label: def.name.clone(),
            category: NodeCategory::Composite,
            ports,
            properties: vec![],
        });
        Ok(())
    }

    /// Unregisters the node type for a composite definition.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownDefinition`] if no type is registered
    /// for this definition id.
    pub fn unregister_composite(&mut self, definition_id: &str) -> Result<(), CatalogError> {
        let name = composite_type_name(definition_id);
        let pos = self
            .entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| CatalogError::UnknownDefinition(definition_id.to_string()))?;
        // Built-ins are never composite-named, but guard anyway.
        if pos < self.builtin_count {
            return Err(CatalogError::UnknownDefinition(definition_id.to_string()));
        }
        self.entries.remove(pos);
        Ok(())
    }

    /// Returns the number of registered node types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no node types are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::CompositeLibrary;
    use crate::spec::{PortDirection, SignalKind};

    #[test]
    fn builtins_registered() {
        let catalog = Catalog::new();
        assert_eq!(catalog.len(), 11);
        assert!(catalog.get("oscillator").is_some());
        assert!(catalog.get("destination").is_some());
        assert!(catalog.get("midi-input").is_some());
        assert!(catalog.get("nonexistent").is_none());
    }

    #[test]
    fn categories_partition_builtins() {
        let catalog = Catalog::new();
        assert_eq!(catalog.in_category(NodeCategory::Source).len(), 1);
        assert_eq!(catalog.in_category(NodeCategory::Processing).len(), 3);
        assert_eq!(catalog.in_category(NodeCategory::Output).len(), 1);
        assert_eq!(catalog.in_category(NodeCategory::Logic).len(), 6);
        assert!(catalog.in_category(NodeCategory::Composite).is_empty());
    }

    #[test]
    fn oscillator_ports_and_defaults() {
        let catalog = Catalog::new();
        let osc = catalog.get("oscillator").unwrap();

        let out = osc.default_output().unwrap();
        assert_eq!(out.kind, SignalKind::Audio);
        assert_eq!(out.direction, PortDirection::Output);

        let freq = osc.port("frequency").unwrap();
        assert!(freq.param);
        assert_eq!(freq.kind, SignalKind::Control);

        let defaults = osc.default_properties();
        assert_eq!(defaults[0].0, "frequency");
        assert_eq!(defaults[0].1.as_number(), Some(440.0));
    }

    #[test]
    fn require_reports_unknown_type() {
        let catalog = Catalog::new();
        let err = catalog.require("warbler").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownType(name) if name == "warbler"));
    }

    #[test]
    fn register_composite_exposes_declared_ports() {
        let mut catalog = Catalog::new();
        let library = CompositeLibrary::with_factory_defaults();
        let def = library.get("mono-bus").unwrap();

        catalog.register_composite(def).unwrap();
        let spec = catalog.get(&composite_type_name("mono-bus")).unwrap();
        assert!(spec.is_composite());
        assert_eq!(spec.ports.len(), def.inputs.len() + def.outputs.len());
        assert!(spec.properties.is_empty());
    }

    #[test]
    fn register_composite_rejects_duplicate() {
        let mut catalog = Catalog::new();
        let library = CompositeLibrary::with_factory_defaults();
        let def = library.get("mono-bus").unwrap();

        catalog.register_composite(def).unwrap();
        let err = catalog.register_composite(def).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateComposite(_)));
    }

    #[test]
    fn unregister_composite_removes_type() {
        let mut catalog = Catalog::new();
        let library = CompositeLibrary::with_factory_defaults();
        let def = library.get("mono-bus").unwrap();

        catalog.register_composite(def).unwrap();
        catalog.unregister_composite("mono-bus").unwrap();
        assert!(catalog.get(&composite_type_name("mono-bus")).is_none());

        let err = catalog.unregister_composite("mono-bus").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownDefinition(_)));
    }
}
