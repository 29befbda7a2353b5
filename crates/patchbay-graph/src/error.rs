//! Error types for graph model operations.

use thiserror::Error;

use patchbay_catalog::SignalKind;

use crate::model::{EdgeId, NodeId};

/// Errors that can occur when mutating or validating the graph model.
///
/// Every variant is a model invariant violation: the operation is rejected
/// synchronously and no partial state change occurs.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Node type name not present in the catalog
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    /// Node id not present in the store
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// Edge id not present in the store
    #[error("unknown edge: {0}")]
    UnknownEdge(EdgeId),

    /// Port name not declared by the node's type
    #[error("node type '{node_type}' has no {expected} port '{port}'")]
    UnknownPort {
        /// The node type consulted.
        node_type: String,
        /// The missing port name (or a hint that no default exists).
        port: String,
        /// "input" or "output".
        expected: &'static str,
    },

    /// Source and target are the same node
    #[error("self-loop rejected on node {0}")]
    SelfLoop(NodeId),

    /// Illegal signal-kind pairing (control may not drive audio)
    #[error("cannot connect {source_kind} output to {target_kind} input")]
    KindMismatch {
        /// Source port kind.
        source_kind: SignalKind,
        /// Target port kind.
        target_kind: SignalKind,
    },

    /// The target input already has an incoming edge
    #[error("input '{port}' on node {node} is already driven")]
    InputAlreadyDriven {
        /// The target node.
        node: NodeId,
        /// The already-driven input port.
        port: String,
    },

    /// Property name not declared by the node's type
    #[error("node type '{node_type}' has no property '{property}'")]
    UnknownProperty {
        /// The node type consulted.
        node_type: String,
        /// The missing property name.
        property: String,
    },

    /// Property value does not match the declared kind or range
    #[error("value rejected for property '{property}' on node type '{node_type}'")]
    PropertyTypeMismatch {
        /// The node type consulted.
        node_type: String,
        /// The property name.
        property: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_mismatch_display() {
        let err = GraphError::KindMismatch {
            source_kind: SignalKind::Control,
            target_kind: SignalKind::Audio,
        };
        assert_eq!(err.to_string(), "cannot connect control output to audio input");
    }

    // The kind fields are plain enums, not wrapped errors; nothing in this
    // type may land in a `source` slot (field names included).
    #[test]
    fn variants_carry_no_error_source() {
        let err = GraphError::KindMismatch {
            source_kind: SignalKind::Control,
            target_kind: SignalKind::Audio,
        };
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn unknown_port_display() {
        let err = GraphError::UnknownPort {
            node_type: "gain".to_string(),
            port: "sidechain".to_string(),
            expected: "input",
        };
        assert_eq!(err.to_string(), "node type 'gain' has no input port 'sidechain'");
    }
}
