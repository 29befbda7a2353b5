//! Connection validation.
//!
//! Pure functions over the store and catalog: callable at any time, from
//! the UI's drag preview or the assistant's preflight, without mutating
//! anything. [`GraphStore::add_edge`](crate::GraphStore::add_edge) runs the
//! same resolution before inserting, so an edge that validates here is an
//! edge that connects.

use patchbay_catalog::{Catalog, PortDirection, PortSpec, SignalKind};

use crate::error::GraphError;
use crate::model::{GraphStore, NodeId};

/// A fully resolved prospective connection: both ports exist on their node
/// types and the pairing is legal.
#[derive(Debug, Clone)]
pub struct ResolvedConnection {
    /// The source node's output port.
    pub source_port: PortSpec,
    /// The target node's input port.
    pub target_port: PortSpec,
}

/// Resolves and validates a prospective connection.
///
/// Rules, in order:
///
/// 1. both nodes must exist;
/// 2. self-loops are rejected;
/// 3. the output port on the source and the input port on the target must
///    resolve (omitted handles default to the primary port);
/// 4. signal kinds must be compatible: audio→audio and audio→control are
///    legal (an audio-rate output may drive a control input as "latest
///    value"), control→control is legal, control→audio is not;
/// 5. the target input must not already be driven — a second edge into an
///    occupied input is rejected, never silently replaced.
///
/// # Errors
///
/// One [`GraphError`] variant per rule above.
pub fn resolve_connection(
    store: &GraphStore,
    catalog: &Catalog,
    source: NodeId,
    target: NodeId,
    source_handle: Option<&str>,
    target_handle: Option<&str>,
) -> Result<ResolvedConnection, GraphError> {
    let source_node = store.node(source).ok_or(GraphError::UnknownNode(source))?;
    let target_node = store.node(target).ok_or(GraphError::UnknownNode(target))?;

    if source == target {
        return Err(GraphError::SelfLoop(source));
    }

    let source_spec = catalog
        .get(&source_node.node_type)
        .ok_or_else(|| GraphError::UnknownNodeType(source_node.node_type.clone()))?;
    let target_spec = catalog
        .get(&target_node.node_type)
        .ok_or_else(|| GraphError::UnknownNodeType(target_node.node_type.clone()))?;

    let source_port = match source_handle {
        Some(name) => source_spec
            .port(name)
            .filter(|p| p.direction == PortDirection::Output),
        None => source_spec.default_output(),
    }
    .ok_or_else(|| GraphError::UnknownPort {
        node_type: source_node.node_type.clone(),
        port: source_handle.unwrap_or("<default>").to_string(),
        expected: "output",
    })?;

    let target_port = match target_handle {
        Some(name) => target_spec
            .port(name)
            .filter(|p| p.direction == PortDirection::Input),
        None => target_spec.default_input(),
    }
    .ok_or_else(|| GraphError::UnknownPort {
        node_type: target_node.node_type.clone(),
        port: target_handle.unwrap_or("<default>").to_string(),
        expected: "input",
    })?;

    // Kind matrix: the only illegal pairing is control driving audio.
    if source_port.kind == SignalKind::Control && target_port.kind == SignalKind::Audio {
        return Err(GraphError::KindMismatch {
            source_kind: source_port.kind,
            target_kind: target_port.kind,
        });
    }

    if store.incoming_edge(target, &target_port.name).is_some() {
        return Err(GraphError::InputAlreadyDriven {
            node: target,
            port: target_port.name.clone(),
        });
    }

    Ok(ResolvedConnection {
        source_port: source_port.clone(),
        target_port: target_port.clone(),
    })
}

/// Preflight check used by the UI and the assistant before attempting a
/// connect. Side-effect-free.
pub fn is_valid_connection(
    store: &GraphStore,
    catalog: &Catalog,
    source: NodeId,
    target: NodeId,
    source_handle: Option<&str>,
    target_handle: Option<&str>,
) -> bool {
    resolve_connection(store, catalog, source, target, source_handle, target_handle).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;
    use patchbay_catalog::Catalog;

    struct Fixture {
        catalog: Catalog,
        store: GraphStore,
        osc: NodeId,
        gain: NodeId,
        slider: NodeId,
    }

    fn fixture() -> Fixture {
        let catalog = Catalog::new();
        let mut store = GraphStore::new();
        let osc = store.add_node(&catalog, "oscillator", Position::default()).unwrap();
        let gain = store.add_node(&catalog, "gain", Position::default()).unwrap();
        let slider = store.add_node(&catalog, "slider", Position::default()).unwrap();
        Fixture {
            catalog,
            store,
            osc,
            gain,
            slider,
        }
    }

    #[test]
    fn audio_to_audio_is_legal() {
        let f = fixture();
        assert!(is_valid_connection(&f.store, &f.catalog, f.osc, f.gain, None, None));
    }

    #[test]
    fn audio_to_control_is_legal() {
        let f = fixture();
        // Oscillator audio output driving the gain parameter input.
        assert!(is_valid_connection(
            &f.store,
            &f.catalog,
            f.osc,
            f.gain,
            Some("output"),
            Some("gain")
        ));
    }

    #[test]
    fn control_to_audio_is_rejected() {
        let f = fixture();
        let err = resolve_connection(&f.store, &f.catalog, f.slider, f.gain, None, Some("input"))
            .unwrap_err();
        assert!(matches!(err, GraphError::KindMismatch { .. }));
    }

    #[test]
    fn control_to_control_is_legal() {
        let f = fixture();
        assert!(is_valid_connection(
            &f.store,
            &f.catalog,
            f.slider,
            f.gain,
            None,
            Some("gain")
        ));
    }

    #[test]
    fn self_loop_is_rejected() {
        let f = fixture();
        let err =
            resolve_connection(&f.store, &f.catalog, f.gain, f.gain, None, None).unwrap_err();
        assert!(matches!(err, GraphError::SelfLoop(_)));
    }

    #[test]
    fn missing_nodes_are_rejected() {
        let f = fixture();
        assert!(!is_valid_connection(
            &f.store,
            &f.catalog,
            NodeId(999),
            f.gain,
            None,
            None
        ));
    }

    #[test]
    fn unknown_handles_are_rejected() {
        let f = fixture();
        let err = resolve_connection(
            &f.store,
            &f.catalog,
            f.osc,
            f.gain,
            Some("sidechain"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::UnknownPort { expected: "output", .. }));
    }

    #[test]
    fn second_edge_into_driven_input_is_rejected_not_replaced() {
        let mut f = fixture();
        let first = f
            .store
            .add_edge(&f.catalog, f.osc, f.gain, None, None)
            .unwrap();

        let osc2 = f
            .store
            .add_node(&f.catalog, "oscillator", Position::default())
            .unwrap();
        let err = f
            .store
            .add_edge(&f.catalog, osc2, f.gain, None, None)
            .unwrap_err();
        assert!(matches!(err, GraphError::InputAlreadyDriven { .. }));

        // The original edge is untouched.
        assert!(f.store.edge(first).is_some());
        assert_eq!(f.store.edge_count(), 1);
    }

    #[test]
    fn destination_has_no_output_to_default_to() {
        let f = fixture();
        let mut store = f.store;
        let dest = store.add_node(&f.catalog, "destination", Position::default()).unwrap();
        let err = resolve_connection(&store, &f.catalog, dest, f.gain, None, None).unwrap_err();
        assert!(matches!(err, GraphError::UnknownPort { expected: "output", .. }));
    }
}
