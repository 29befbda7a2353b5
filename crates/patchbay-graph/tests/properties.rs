//! Property-based tests for the graph model.
//!
//! Tests id freshness, undo exactness, and connection validation under
//! randomized operation sequences using proptest.

use proptest::prelude::*;

use patchbay_catalog::{Catalog, PropertyValue, SignalKind};
use patchbay_graph::{
    Clipboard, GraphStore, History, NodeId, PASTE_OFFSET, Position, resolve_connection,
};

/// Node types with a single audio output, usable as generic edge sources.
const AUDIO_SOURCES: &[&str] = &["oscillator", "gain", "filter", "delay"];

/// Randomized mutations applied against a store in `undo_is_exact`.
#[derive(Debug, Clone)]
enum Op {
    AddNode(usize, f32, f32),
    RemoveNode(usize),
    Connect(usize, usize),
    Disconnect(usize),
    Move(usize, f32, f32),
    SetFrequency(usize, f64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4, -500.0f32..500.0, -500.0f32..500.0)
            .prop_map(|(t, x, y)| Op::AddNode(t, x, y)),
        (0usize..16).prop_map(Op::RemoveNode),
        (0usize..16, 0usize..16).prop_map(|(a, b)| Op::Connect(a, b)),
        (0usize..16).prop_map(Op::Disconnect),
        (0usize..16, -500.0f32..500.0, -500.0f32..500.0)
            .prop_map(|(n, x, y)| Op::Move(n, x, y)),
        (0usize..16, 0.0f64..20000.0).prop_map(|(n, v)| Op::SetFrequency(n, v)),
    ]
}

/// Applies an op, tolerating rejections (unknown ids, occupied inputs).
/// Returns true if the store actually changed.
fn apply(catalog: &Catalog, store: &mut GraphStore, op: &Op) -> bool {
    let nth_node = |store: &GraphStore, i: usize| store.nodes().nth(i).map(|n| n.id);
    let nth_edge = |store: &GraphStore, i: usize| store.edges().nth(i).map(|e| e.id);
    match *op {
        Op::AddNode(t, x, y) => store
            .add_node(catalog, AUDIO_SOURCES[t], Position::new(x, y))
            .is_ok(),
        Op::RemoveNode(i) => nth_node(store, i)
            .is_some_and(|id| store.remove_node(id).is_ok()),
        Op::Connect(a, b) => match (nth_node(store, a), nth_node(store, b)) {
            (Some(source), Some(target)) => {
                store.add_edge(catalog, source, target, None, None).is_ok()
            }
            _ => false,
        },
        Op::Disconnect(i) => nth_edge(store, i)
            .is_some_and(|id| store.remove_edge(id).is_ok()),
        Op::Move(i, x, y) => nth_node(store, i)
            .is_some_and(|id| store.set_position(id, Position::new(x, y)).is_ok()),
        Op::SetFrequency(i, value) => {
            let Some(id) = nth_node(store, i) else {
                return false;
            };
            let is_osc = store
                .node(id)
                .is_some_and(|n| n.node_type == "oscillator");
            is_osc
                && store
                    .set_property(catalog, id, "frequency", PropertyValue::Number(value))
                    .is_ok()
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Node ids handed out across any operation sequence are never reused,
    /// even when nodes are removed in between.
    #[test]
    fn node_ids_are_never_reused(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let catalog = Catalog::new();
        let mut store = GraphStore::new();
        let mut seen: Vec<NodeId> = Vec::new();

        for op in &ops {
            if let Op::AddNode(t, x, y) = *op {
                let id = store
                    .add_node(&catalog, AUDIO_SOURCES[t], Position::new(x, y))
                    .unwrap();
                prop_assert!(!seen.contains(&id), "id {id} handed out twice");
                seen.push(id);
            } else {
                apply(&catalog, &mut store, op);
            }
        }
    }

    /// A single undo after any mutating operation restores the store to an
    /// exactly equal snapshot, and redo restores the mutated one.
    #[test]
    fn undo_is_exact(
        setup in prop::collection::vec(op_strategy(), 0..20),
        op in op_strategy(),
    ) {
        let catalog = Catalog::new();
        let mut store = GraphStore::new();
        for s in &setup {
            apply(&catalog, &mut store, s);
        }

        let before = store.snapshot();
        let mut history = History::default();
        history.record(store.snapshot());
        let changed = apply(&catalog, &mut store, &op);
        let after = store.snapshot();

        prop_assert!(history.undo(&mut store));
        prop_assert_eq!(store.snapshot(), before.clone());

        prop_assert!(history.redo(&mut store));
        prop_assert_eq!(store.snapshot(), after.clone());

        if !changed {
            prop_assert_eq!(before, after);
        }
    }

    /// Pasting never reuses a live node id, remaps every payload edge to the
    /// fresh ids, and offsets every pasted position by the fixed delta.
    #[test]
    fn paste_yields_fresh_remapped_ids(
        setup in prop::collection::vec(op_strategy(), 1..20),
        pastes in 1usize..4,
    ) {
        let catalog = Catalog::new();
        let mut store = GraphStore::new();
        for s in &setup {
            apply(&catalog, &mut store, s);
        }
        prop_assume!(store.node_count() > 0);

        let copied: Vec<NodeId> = store.nodes().map(|n| n.id).collect();
        let originals: Vec<(NodeId, Position)> =
            store.nodes().map(|n| (n.id, n.position)).collect();
        let copied_edges = store.edge_count();

        let mut clipboard = Clipboard::new();
        clipboard.copy(&store, &copied);

        for _ in 0..pastes {
            let existing: Vec<NodeId> = store.nodes().map(|n| n.id).collect();
            let pasted = clipboard.paste(&mut store);
            prop_assert_eq!(pasted.len(), copied.len());
            for id in &pasted {
                prop_assert!(!existing.contains(id), "paste reused live id {id}");
            }
            // Every payload edge lands between pasted ids only.
            for edge in store.edges() {
                if pasted.contains(&edge.source) || pasted.contains(&edge.target) {
                    prop_assert!(pasted.contains(&edge.source));
                    prop_assert!(pasted.contains(&edge.target));
                }
            }
            for (new_id, (_, original_pos)) in pasted.iter().zip(&originals) {
                let node = store.node(*new_id).unwrap();
                prop_assert_eq!(
                    node.position,
                    original_pos.offset(PASTE_OFFSET.0, PASTE_OFFSET.1)
                );
            }
        }

        prop_assert_eq!(store.node_count(), copied.len() * (pastes + 1));
        prop_assert_eq!(store.edge_count(), copied_edges * (pastes + 1));
    }

    /// The full signal-kind matrix: control may never drive audio, every
    /// other pairing resolves.
    #[test]
    fn kind_matrix_rejects_exactly_control_to_audio(
        source_kind in prop::bool::ANY,
        target_kind in prop::bool::ANY,
    ) {
        let catalog = Catalog::new();
        let mut store = GraphStore::new();

        // oscillator "output" is audio, slider "output" is control;
        // gain "input" is audio, gain "gain" is control.
        let source_type = if source_kind { "oscillator" } else { "slider" };
        let target_handle = if target_kind { "input" } else { "gain" };

        let source = store.add_node(&catalog, source_type, Position::default()).unwrap();
        let target = store.add_node(&catalog, "gain", Position::default()).unwrap();

        let result = resolve_connection(
            &store,
            &catalog,
            source,
            target,
            Some("output"),
            Some(target_handle),
        );

        let illegal = !source_kind && target_kind;
        prop_assert_eq!(result.is_ok(), !illegal);
        if let Ok(resolved) = result {
            prop_assert_eq!(
                resolved.source_port.kind,
                if source_kind { SignalKind::Audio } else { SignalKind::Control }
            );
        }
    }
}
