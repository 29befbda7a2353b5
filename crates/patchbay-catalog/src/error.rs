//! Error types for catalog and composite definition operations.

use thiserror::Error;

/// Errors that can occur when querying or mutating the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Node type name not present in the catalog
    #[error("unknown node type: {0}")]
    UnknownType(String),

    /// A composite type with this definition id is already registered
    #[error("composite type already registered: {0}")]
    DuplicateComposite(String),

    /// Composite definition id not present in the library
    #[error("unknown composite definition: {0}")]
    UnknownDefinition(String),

    /// Attempted to mutate or delete a prebuilt (factory) definition
    #[error("prebuilt definition is read-only: {0}")]
    PrebuiltReadOnly(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_display() {
        let err = CatalogError::UnknownType("warbler".to_string());
        assert_eq!(err.to_string(), "unknown node type: warbler");
    }

    #[test]
    fn prebuilt_read_only_display() {
        let err = CatalogError::PrebuiltReadOnly("mono-bus".to_string());
        assert_eq!(err.to_string(), "prebuilt definition is read-only: mono-bus");
    }
}
