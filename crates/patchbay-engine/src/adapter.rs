//! Node adapter layer: keeps live backend state consistent with the model.
//!
//! The model is authoritative; this layer maintains a 1:1 map from model
//! nodes to live bindings and reconciles the live wiring toward whatever
//! the model says. Reconciliation is idempotent and order-independent: it
//! computes the desired wire set, diffs against the established set, and
//! issues only the delta, so re-running against an unchanged model issues
//! zero backend calls.
//!
//! Binding failures never propagate: a node whose live object cannot be
//! built keeps its model entry and carries a [`Binding::Failed`] flag until
//! a later reconcile pass retries it.

use std::collections::{BTreeMap, BTreeSet};

use patchbay_catalog::{
    Catalog, CompositeDefinition, CompositeLibrary, PropertyValue, composite_type_name,
};
use patchbay_graph::{EdgeId, GraphEdge, GraphStore, NodeId};

use crate::backend::{AudioBackend, BackendError, ObjectId};
use crate::logic::LogicUnit;

/// Live counterpart of one model node.
#[derive(Debug)]
pub enum Binding {
    /// A native platform audio object.
    Audio(ObjectId),
    /// An in-process logic computation unit.
    Logic(LogicUnit),
    /// An expanded composite instance.
    Expanded(Expansion),
    /// Construction failed; the model node survives and the reason is
    /// surfaced to the UI. Retried on the next reconcile pass.
    Failed(String),
}

/// A live endpoint inside an expansion, reachable through a declared port.
#[derive(Debug, Clone)]
struct InternalEndpoint {
    object: ObjectId,
    port: String,
    param: bool,
}

/// One composite instance's private live objects and seam maps.
///
/// Built from the definition's internal graph at binding time. The seam
/// maps resolve the instance's declared ports to internal endpoints, so
/// external edges wire straight through during reconciliation. Definition
/// edits never touch an existing expansion until it is explicitly re-synced.
#[derive(Debug)]
pub struct Expansion {
    objects: BTreeMap<String, ObjectId>,
    input_map: BTreeMap<String, Vec<InternalEndpoint>>,
    output_map: BTreeMap<String, ObjectId>,
}

impl Expansion {
    fn build<B: AudioBackend>(
        backend: &mut B,
        catalog: &Catalog,
        def: &CompositeDefinition,
    ) -> Result<Self, BackendError> {
        let mut objects: BTreeMap<String, ObjectId> = BTreeMap::new();

        // Partial expansions are released before the error surfaces, so a
        // failed composite leaks nothing.
        fn bail<B: AudioBackend>(
            backend: &mut B,
            objects: &BTreeMap<String, ObjectId>,
            err: BackendError,
        ) -> Result<Expansion, BackendError> {
            for &obj in objects.values() {
                backend.release(obj);
            }
            Err(err)
        }

        for node in &def.internal.nodes {
            if def.internal.is_input_seam(&node.key) || def.internal.is_output_seam(&node.key) {
                continue;
            }
            let Some(spec) = catalog.get(&node.node_type) else {
                return bail(
                    backend,
                    &objects,
                    BackendError::UnsupportedType(node.node_type.clone()),
                );
            };
            if !spec.is_audio() {
                return bail(
                    backend,
                    &objects,
                    BackendError::UnsupportedType(node.node_type.clone()),
                );
            }
            let obj = match backend.create_object(&node.node_type) {
                Ok(obj) => obj,
                Err(err) => return bail(backend, &objects, err),
            };
            let mut properties = spec.default_properties();
            for (name, value) in &node.properties {
                if let Some(slot) = properties.iter_mut().find(|(n, _)| n == name) {
                    slot.1 = value.clone();
                }
            }
            for (name, value) in &properties {
                if spec.port(name).is_some_and(|p| p.param)
                    && let Some(v) = value.as_number()
                {
                    backend.set_param(obj, name, v);
                }
            }
            objects.insert(node.key.clone(), obj);
        }

        let port_is_param = |key: &str, port: &str| {
            def.internal
                .node(key)
                .and_then(|n| catalog.get(&n.node_type))
                .and_then(|s| s.port(port))
                .is_some_and(|p| p.param)
        };

        let mut input_map: BTreeMap<String, Vec<InternalEndpoint>> = BTreeMap::new();
        let mut output_map: BTreeMap<String, ObjectId> = BTreeMap::new();
        for edge in &def.internal.edges {
            if def.internal.is_input_seam(&edge.source) {
                let Some(&object) = objects.get(&edge.target) else {
                    continue;
                };
                input_map
                    .entry(edge.source.clone())
                    .or_default()
                    .push(InternalEndpoint {
                        object,
                        port: edge.target_handle.clone(),
                        param: port_is_param(&edge.target, &edge.target_handle),
                    });
            } else if def.internal.is_output_seam(&edge.target) {
                if let Some(&object) = objects.get(&edge.source) {
                    output_map.insert(edge.target.clone(), object);
                }
            } else if let (Some(&source), Some(&target)) =
                (objects.get(&edge.source), objects.get(&edge.target))
            {
                if port_is_param(&edge.target, &edge.target_handle) {
                    backend.connect_to_param(source, target, &edge.target_handle);
                } else {
                    backend.connect(source, target, &edge.target_handle);
                }
            }
        }

        Ok(Self {
            objects,
            input_map,
            output_map,
        })
    }

    fn input_endpoints(&self, port: &str) -> &[InternalEndpoint] {
        self.input_map.get(port).map_or(&[], Vec::as_slice)
    }

    fn output_object(&self, port: &str) -> Option<ObjectId> {
        self.output_map.get(port).copied()
    }

    /// Live objects owned by this expansion.
    pub fn objects(&self) -> impl Iterator<Item = ObjectId> {
        self.objects.values().copied()
    }
}

/// One desired or established backend wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum LiveWire {
    Audio {
        source: ObjectId,
        target: ObjectId,
        port: String,
    },
    Param {
        source: ObjectId,
        target: ObjectId,
        param: String,
    },
}

/// Where a bridged value lands on one edge.
enum Route {
    AudioParam(ObjectId),
    Expansion(Vec<InternalEndpoint>),
    Logic,
    Skip,
}

/// The adapter layer for one session.
#[derive(Debug)]
pub struct AdapterLayer<B: AudioBackend> {
    backend: B,
    bindings: BTreeMap<NodeId, Binding>,
    established: BTreeSet<LiveWire>,
    /// Model edges whose cached logic output has already been pushed.
    bridged: BTreeSet<EdgeId>,
    /// Param values last written per audio binding. Restores replace model
    /// state wholesale, so reconcile diffs values against this too.
    synced_params: BTreeMap<NodeId, BTreeMap<String, f64>>,
    syncing: bool,
    deferred: bool,
}

impl<B: AudioBackend> AdapterLayer<B> {
    /// Creates an adapter over a backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            bindings: BTreeMap::new(),
            established: BTreeSet::new(),
            bridged: BTreeSet::new(),
            synced_params: BTreeMap::new(),
            syncing: false,
            deferred: false,
        }
    }

    /// The backend, for call assertions in tests.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable backend access, for fault injection in tests.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The binding for a node, if one exists.
    pub fn binding(&self, id: NodeId) -> Option<&Binding> {
        self.bindings.get(&id)
    }

    /// The failure reason for a node whose binding could not be built.
    pub fn binding_error(&self, id: NodeId) -> Option<&str> {
        match self.bindings.get(&id) {
            Some(Binding::Failed(reason)) => Some(reason),
            _ => None,
        }
    }

    /// The logic unit bound to a node, if it is a logic node.
    pub fn logic_unit(&self, id: NodeId) -> Option<&LogicUnit> {
        match self.bindings.get(&id) {
            Some(Binding::Logic(unit)) => Some(unit),
            _ => None,
        }
    }

    /// Builds the binding for a node if it has none, retrying `Failed`
    /// bindings. Nodes absent from the store are ignored.
    pub fn ensure_binding(
        &mut self,
        store: &GraphStore,
        catalog: &Catalog,
        library: &CompositeLibrary,
        id: NodeId,
    ) {
        let settled = matches!(
            self.bindings.get(&id),
            Some(Binding::Audio(_) | Binding::Logic(_) | Binding::Expanded(_))
        );
        if settled {
            return;
        }
        let Some(node) = store.node(id) else {
            return;
        };
        let node_type = node.node_type.clone();
        let binding = self.build_binding(catalog, library, id, store);
        match &binding {
            Binding::Failed(reason) => {
                tracing::debug!(node = %id, %node_type, %reason, "binding failed");
            }
            _ => tracing::debug!(node = %id, %node_type, "binding established"),
        }
        self.bindings.insert(id, binding);
    }

    fn build_binding(
        &mut self,
        catalog: &Catalog,
        library: &CompositeLibrary,
        id: NodeId,
        store: &GraphStore,
    ) -> Binding {
        let Some(node) = store.node(id) else {
            return Binding::Failed(format!("node {id} vanished during binding"));
        };
        let Some(spec) = catalog.get(&node.node_type) else {
            return Binding::Failed(format!("unknown node type '{}'", node.node_type));
        };

        if spec.is_logic() {
            return match LogicUnit::new(&node.node_type, &node.properties) {
                Some(unit) => Binding::Logic(unit),
                None => Binding::Failed(format!("no logic unit for '{}'", node.node_type)),
            };
        }

        if spec.is_composite() {
            let def = library
                .all()
                .find(|d| composite_type_name(&d.id) == node.node_type);
            let Some(def) = def else {
                return Binding::Failed(format!("no definition for '{}'", node.node_type));
            };
            return match Expansion::build(&mut self.backend, catalog, def) {
                Ok(expansion) => Binding::Expanded(expansion),
                Err(err) => Binding::Failed(err.to_string()),
            };
        }

        match self.backend.create_object(&node.node_type) {
            Ok(obj) => {
                for (name, value) in node.properties.iter() {
                    if spec.port(name).is_some_and(|p| p.param)
                        && let Some(v) = value.as_number()
                    {
                        self.backend.set_param(obj, name, v);
                        self.note_param(id, name, v);
                    }
                }
                Binding::Audio(obj)
            }
            Err(err) => Binding::Failed(err.to_string()),
        }
    }

    fn note_param(&mut self, id: NodeId, name: &str, value: f64) {
        self.synced_params
            .entry(id)
            .or_default()
            .insert(name.to_string(), value);
    }

    /// Drives the live layer to match the model.
    ///
    /// Idempotent and order-independent. Re-entrant calls (a bridge push
    /// triggering another request mid-pass) are deferred and run once the
    /// active pass finishes.
    pub fn reconcile(
        &mut self,
        store: &mut GraphStore,
        catalog: &Catalog,
        library: &CompositeLibrary,
    ) {
        if self.syncing {
            self.deferred = true;
            return;
        }
        self.syncing = true;
        loop {
            self.sync_pass(store, catalog, library);
            if !std::mem::take(&mut self.deferred) {
                break;
            }
        }
        self.syncing = false;
    }

    fn sync_pass(&mut self, store: &mut GraphStore, catalog: &Catalog, library: &CompositeLibrary) {
        let stale: Vec<NodeId> = self
            .bindings
            .keys()
            .filter(|id| !store.contains_node(**id))
            .copied()
            .collect();
        for id in stale {
            self.teardown(id);
        }

        let ids: Vec<NodeId> = store.nodes().map(|n| n.id).collect();
        for id in ids {
            self.ensure_binding(store, catalog, library, id);
        }

        let desired = self.desired_wires(store, catalog);
        let to_remove: Vec<LiveWire> = self.established.difference(&desired).cloned().collect();
        let to_add: Vec<LiveWire> = desired.difference(&self.established).cloned().collect();
        if !to_remove.is_empty() || !to_add.is_empty() {
            tracing::debug!(
                removed = to_remove.len(),
                added = to_add.len(),
                "reconcile wire delta"
            );
        }
        for wire in to_remove {
            self.apply_wire(&wire, false);
            self.established.remove(&wire);
        }
        for wire in to_add {
            self.apply_wire(&wire, true);
            self.established.insert(wire);
        }

        self.refresh_values(store, catalog);

        self.bridged.retain(|id| store.edge(*id).is_some());

        // Cached logic outputs flow into connections formed since the last
        // pass; edges already bridged are left alone so an unchanged model
        // costs nothing.
        let pending: Vec<(EdgeId, NodeId, String)> = store
            .edges()
            .filter(|e| !self.bridged.contains(&e.id))
            .filter(|e| matches!(self.bindings.get(&e.source), Some(Binding::Logic(_))))
            .map(|e| (e.id, e.source, e.source_handle.clone()))
            .collect();
        for (edge_id, source, handle) in pending {
            self.bridged.insert(edge_id);
            let cached = self.logic_unit(source).and_then(|u| u.output(&handle));
            if let Some(value) = cached {
                self.push_output(store, catalog, source, &handle, value);
            }
        }
    }

    /// Re-applies model property values that drifted from the live side.
    ///
    /// Undo, redo and project loads replace model state wholesale, so the
    /// wiring diff alone is not enough: backend params and logic property
    /// caches have to follow the model values too. A recomputed logic unit
    /// bridges its fresh outputs so stale cached values never reach a
    /// connection formed later.
    fn refresh_values(&mut self, store: &mut GraphStore, catalog: &Catalog) {
        enum Refresh {
            Params(ObjectId, Vec<(String, f64)>),
            Logic(Vec<(String, PropertyValue)>),
        }
        let mut drifted: Vec<(NodeId, Refresh)> = Vec::new();
        for node in store.nodes() {
            match self.bindings.get(&node.id) {
                Some(Binding::Audio(obj)) => {
                    let Some(spec) = catalog.get(&node.node_type) else {
                        continue;
                    };
                    let synced = self.synced_params.get(&node.id);
                    let writes: Vec<(String, f64)> = node
                        .properties
                        .iter()
                        .filter(|(name, _)| spec.port(name).is_some_and(|p| p.param))
                        .filter_map(|(name, value)| value.as_number().map(|v| (name, v)))
                        .filter(|(name, v)| synced.and_then(|m| m.get(*name)).copied() != Some(*v))
                        .map(|(name, v)| (name.to_string(), v))
                        .collect();
                    if !writes.is_empty() {
                        drifted.push((node.id, Refresh::Params(*obj, writes)));
                    }
                }
                Some(Binding::Logic(unit)) => {
                    let changed: Vec<(String, PropertyValue)> = node
                        .properties
                        .iter()
                        .filter(|(name, value)| unit.property(name) != Some(*value))
                        .map(|(name, value)| (name.to_string(), value.clone()))
                        .collect();
                    if !changed.is_empty() {
                        drifted.push((node.id, Refresh::Logic(changed)));
                    }
                }
                _ => {}
            }
        }
        if !drifted.is_empty() {
            tracing::debug!(nodes = drifted.len(), "reconcile value refresh");
        }
        for (id, refresh) in drifted {
            match refresh {
                Refresh::Params(obj, writes) => {
                    for (name, v) in writes {
                        self.backend.set_param(obj, &name, v);
                        self.note_param(id, &name, v);
                    }
                }
                Refresh::Logic(changed) => {
                    let produced = match self.bindings.get_mut(&id) {
                        Some(Binding::Logic(unit)) => {
                            for (name, value) in &changed {
                                unit.set_property(name, value);
                            }
                            unit.compute()
                        }
                        _ => Vec::new(),
                    };
                    for (out, v) in produced {
                        self.push_output(store, catalog, id, &out, v);
                    }
                }
            }
        }
    }

    fn desired_wires(&self, store: &GraphStore, catalog: &Catalog) -> BTreeSet<LiveWire> {
        let mut desired = BTreeSet::new();
        for edge in store.edges() {
            let Some(source) = self.source_object(edge) else {
                continue;
            };
            for ep in self.target_endpoints(store, catalog, edge) {
                desired.insert(if ep.param {
                    LiveWire::Param {
                        source,
                        target: ep.object,
                        param: ep.port,
                    }
                } else {
                    LiveWire::Audio {
                        source,
                        target: ep.object,
                        port: ep.port,
                    }
                });
            }
        }
        desired
    }

    fn source_object(&self, edge: &GraphEdge) -> Option<ObjectId> {
        match self.bindings.get(&edge.source) {
            Some(Binding::Audio(obj)) => Some(*obj),
            Some(Binding::Expanded(exp)) => exp.output_object(&edge.source_handle),
            _ => None,
        }
    }

    fn target_endpoints(
        &self,
        store: &GraphStore,
        catalog: &Catalog,
        edge: &GraphEdge,
    ) -> Vec<InternalEndpoint> {
        match self.bindings.get(&edge.target) {
            Some(Binding::Audio(obj)) => store
                .node(edge.target)
                .and_then(|n| catalog.get(&n.node_type))
                .and_then(|s| s.port(&edge.target_handle))
                .map(|p| {
                    vec![InternalEndpoint {
                        object: *obj,
                        port: p.name.clone(),
                        param: p.param,
                    }]
                })
                .unwrap_or_default(),
            Some(Binding::Expanded(exp)) => exp.input_endpoints(&edge.target_handle).to_vec(),
            _ => Vec::new(),
        }
    }

    fn apply_wire(&mut self, wire: &LiveWire, connect: bool) {
        match wire {
            LiveWire::Audio {
                source,
                target,
                port,
            } => {
                if connect {
                    self.backend.connect(*source, *target, port);
                } else {
                    self.backend.disconnect(*source, *target, port);
                }
            }
            LiveWire::Param {
                source,
                target,
                param,
            } => {
                if connect {
                    self.backend.connect_to_param(*source, *target, param);
                } else {
                    self.backend.disconnect_from_param(*source, *target, param);
                }
            }
        }
    }

    /// Custom node bridge: pushes one logic output value into every model
    /// edge leaving `(source, output)`.
    ///
    /// Param-backed audio targets get an immediate `set_param` plus a
    /// model mirror so the inspector shows the live value; logic targets
    /// get the value fed into their input cache, recomputed, and
    /// propagated onward with a cycle guard. Anything else is silently
    /// ignored.
    pub fn push_output(
        &mut self,
        store: &mut GraphStore,
        catalog: &Catalog,
        source: NodeId,
        output: &str,
        value: f64,
    ) {
        let mut visited = BTreeSet::new();
        self.push_inner(store, catalog, source, output, value, &mut visited);
    }

    fn push_inner(
        &mut self,
        store: &mut GraphStore,
        catalog: &Catalog,
        source: NodeId,
        output: &str,
        value: f64,
        visited: &mut BTreeSet<NodeId>,
    ) {
        if !visited.insert(source) {
            return;
        }
        let targets: Vec<(EdgeId, NodeId, String)> = store
            .edges_from(source, output)
            .iter()
            .map(|e| (e.id, e.target, e.target_handle.clone()))
            .collect();
        for (edge_id, target, port) in targets {
            self.bridged.insert(edge_id);
            let route = match self.bindings.get(&target) {
                Some(Binding::Audio(obj)) => {
                    let is_param = store
                        .node(target)
                        .and_then(|n| catalog.get(&n.node_type))
                        .and_then(|s| s.port(&port))
                        .is_some_and(|p| p.param);
                    if is_param {
                        Route::AudioParam(*obj)
                    } else {
                        Route::Skip
                    }
                }
                Some(Binding::Expanded(exp)) => {
                    Route::Expansion(exp.input_endpoints(&port).to_vec())
                }
                Some(Binding::Logic(_)) => Route::Logic,
                _ => Route::Skip,
            };
            match route {
                Route::AudioParam(obj) => {
                    self.backend.set_param(obj, &port, value);
                    self.note_param(target, &port, value);
                    store.mirror_property(target, &port, PropertyValue::Number(value));
                }
                Route::Expansion(endpoints) => {
                    for ep in endpoints {
                        if ep.param {
                            self.backend.set_param(ep.object, &ep.port, value);
                        }
                    }
                }
                Route::Logic => {
                    let produced = match self.bindings.get_mut(&target) {
                        Some(Binding::Logic(unit)) => {
                            unit.set_input(&port, value);
                            unit.compute()
                        }
                        _ => Vec::new(),
                    };
                    for (out, v) in produced {
                        self.push_inner(store, catalog, target, &out, v, visited);
                    }
                }
                Route::Skip => {}
            }
        }
    }

    /// Writes a property through to the live side.
    ///
    /// Audio nodes get a `set_param` for param-backed numbers; logic nodes
    /// recompute and bridge their outputs. `Failed` bindings and
    /// non-param properties are no-ops.
    pub fn apply_property(
        &mut self,
        store: &mut GraphStore,
        catalog: &Catalog,
        id: NodeId,
        name: &str,
        value: &PropertyValue,
    ) {
        enum Write {
            Param(ObjectId, f64),
            Logic,
            Skip,
        }
        let write = match self.bindings.get(&id) {
            Some(Binding::Audio(obj)) => {
                let is_param = store
                    .node(id)
                    .and_then(|n| catalog.get(&n.node_type))
                    .and_then(|s| s.port(name))
                    .is_some_and(|p| p.param);
                match value.as_number() {
                    Some(v) if is_param => Write::Param(*obj, v),
                    _ => Write::Skip,
                }
            }
            Some(Binding::Logic(_)) => Write::Logic,
            _ => Write::Skip,
        };
        match write {
            Write::Param(obj, v) => {
                self.backend.set_param(obj, name, v);
                self.note_param(id, name, v);
            }
            Write::Logic => {
                let produced = match self.bindings.get_mut(&id) {
                    Some(Binding::Logic(unit)) => {
                        unit.set_property(name, value);
                        unit.compute()
                    }
                    _ => Vec::new(),
                };
                for (out, v) in produced {
                    self.push_output(store, catalog, id, &out, v);
                }
            }
            Write::Skip => {}
        }
    }

    /// Host-timer entry for a logic node. Returns the produced outputs,
    /// or `None` if the node has no logic binding.
    pub fn fire(&mut self, id: NodeId) -> Option<Vec<(String, f64)>> {
        match self.bindings.get_mut(&id) {
            Some(Binding::Logic(unit)) => Some(unit.fire()),
            _ => None,
        }
    }

    /// Host MIDI note-on entry for a logic node.
    pub fn note_on(&mut self, id: NodeId, note: u8, velocity: u8) -> Option<Vec<(String, f64)>> {
        match self.bindings.get_mut(&id) {
            Some(Binding::Logic(unit)) => Some(unit.note_on(note, velocity)),
            _ => None,
        }
    }

    /// Host MIDI note-off entry for a logic node.
    pub fn note_off(&mut self, id: NodeId, note: u8) -> Option<Vec<(String, f64)>> {
        match self.bindings.get_mut(&id) {
            Some(Binding::Logic(unit)) => Some(unit.note_off(note)),
            _ => None,
        }
    }

    /// Releases a node's live state. At most once: a second call for the
    /// same node is a no-op.
    pub fn teardown(&mut self, id: NodeId) {
        let Some(binding) = self.bindings.remove(&id) else {
            return;
        };
        self.synced_params.remove(&id);
        tracing::debug!(node = %id, "binding teardown");
        match binding {
            Binding::Audio(obj) => self.release_object(obj),
            Binding::Expanded(exp) => {
                for obj in exp.objects() {
                    self.release_object(obj);
                }
            }
            Binding::Logic(_) | Binding::Failed(_) => {}
        }
    }

    fn release_object(&mut self, obj: ObjectId) {
        let stale: Vec<LiveWire> = self
            .established
            .iter()
            .filter(|w| match w {
                LiveWire::Audio { source, target, .. }
                | LiveWire::Param { source, target, .. } => *source == obj || *target == obj,
            })
            .cloned()
            .collect();
        for wire in stale {
            self.apply_wire(&wire, false);
            self.established.remove(&wire);
        }
        self.backend.release(obj);
    }

    /// Releases every binding. Safe to call more than once.
    pub fn close(&mut self) {
        let ids: Vec<NodeId> = self.bindings.keys().copied().collect();
        for id in ids {
            self.teardown(id);
        }
        self.bridged.clear();
    }
}

impl<B: AudioBackend> Drop for AdapterLayer<B> {
    fn drop(&mut self) {
        self.close();
    }
}
