//! Error type for session-level operations.

use thiserror::Error;

use patchbay_catalog::CatalogError;
use patchbay_graph::{GraphError, NodeId};
use patchbay_project::ProjectError;

/// Errors surfaced by the session facade.
///
/// Model invariant violations and definition errors reject synchronously
/// with no partial state change. Live-binding failures are deliberately
/// absent: they flag the node instead of failing the operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A graph model invariant was violated
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A catalog or composite definition operation was rejected
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Project persistence failed
    #[error(transparent)]
    Project(#[from] ProjectError),

    /// The operation needs a logic node
    #[error("node {0} is not a logic node")]
    NotLogic(NodeId),

    /// The operation needs a composite instance
    #[error("node {0} is not a composite instance")]
    NotComposite(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchbay_catalog::Catalog;
    use patchbay_graph::{GraphStore, Position};

    #[test]
    fn graph_errors_pass_through_display() {
        let catalog = Catalog::new();
        let mut store = GraphStore::new();
        let id = store
            .add_node(&catalog, "oscillator", Position::default())
            .unwrap();
        let err = EngineError::from(GraphError::SelfLoop(id));
        assert_eq!(err.to_string(), "self-loop rejected on node n0");
    }
}
