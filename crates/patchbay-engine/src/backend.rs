//! The platform audio engine boundary.
//!
//! [`AudioBackend`] is the only seam through which the engine touches live
//! audio objects. Calls are synchronous and never block; wiring calls are
//! infallible because the backend owns both endpoints by the time they are
//! issued, while object creation can fail and is reported per node.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

/// Opaque handle to a live backend object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj{}", self.0)
    }
}

/// Errors the platform can raise while constructing live objects.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The platform has no factory for this node type
    #[error("backend does not support node type: {0}")]
    UnsupportedType(String),

    /// The platform refused to allocate another object
    #[error("backend resources exhausted")]
    ResourceExhausted,

    /// The platform is not in a usable state
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Platform audio engine seam.
///
/// `connect`/`disconnect` wire an object's audio output into a named input
/// port on another object; the `param` variants modulate a named parameter
/// at audio rate instead. `set_param` is an immediate value write with no
/// ramping.
pub trait AudioBackend {
    /// Creates a live object for a node type.
    ///
    /// # Errors
    ///
    /// [`BackendError`] when the platform cannot build the object; the
    /// caller keeps the model node and flags the binding instead.
    fn create_object(&mut self, node_type: &str) -> Result<ObjectId, BackendError>;

    /// Wires `source`'s audio output into `target_port` on `target`.
    fn connect(&mut self, source: ObjectId, target: ObjectId, target_port: &str);

    /// Removes the wire made by [`connect`](Self::connect).
    fn disconnect(&mut self, source: ObjectId, target: ObjectId, target_port: &str);

    /// Wires `source`'s audio output into the parameter `param` on `target`.
    fn connect_to_param(&mut self, source: ObjectId, target: ObjectId, param: &str);

    /// Removes the wire made by [`connect_to_param`](Self::connect_to_param).
    fn disconnect_from_param(&mut self, source: ObjectId, target: ObjectId, param: &str);

    /// Sets a parameter value immediately.
    fn set_param(&mut self, object: ObjectId, name: &str, value: f64);

    /// Releases a live object. Ids are never reissued.
    fn release(&mut self, object: ObjectId);
}

/// Headless backend: every operation succeeds and does nothing.
#[derive(Debug, Default)]
pub struct NullBackend {
    next: u64,
}

impl NullBackend {
    /// Creates a headless backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioBackend for NullBackend {
    fn create_object(&mut self, _node_type: &str) -> Result<ObjectId, BackendError> {
        let id = ObjectId(self.next);
        self.next += 1;
        Ok(id)
    }

    fn connect(&mut self, _source: ObjectId, _target: ObjectId, _target_port: &str) {}
    fn disconnect(&mut self, _source: ObjectId, _target: ObjectId, _target_port: &str) {}
    fn connect_to_param(&mut self, _source: ObjectId, _target: ObjectId, _param: &str) {}
    fn disconnect_from_param(&mut self, _source: ObjectId, _target: ObjectId, _param: &str) {}
    fn set_param(&mut self, _object: ObjectId, _name: &str, _value: f64) {}
    fn release(&mut self, _object: ObjectId) {}
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    /// `create_object(node_type)` succeeded with the given id.
    Create(String, ObjectId),
    /// `connect(source, target, target_port)`.
    Connect(ObjectId, ObjectId, String),
    /// `disconnect(source, target, target_port)`.
    Disconnect(ObjectId, ObjectId, String),
    /// `connect_to_param(source, target, param)`.
    ConnectToParam(ObjectId, ObjectId, String),
    /// `disconnect_from_param(source, target, param)`.
    DisconnectFromParam(ObjectId, ObjectId, String),
    /// `set_param(object, name, value)`.
    SetParam(ObjectId, String, f64),
    /// `release(object)`.
    Release(ObjectId),
}

/// Backend that records every call, for call-for-call assertions in tests.
///
/// `fail_on` marks node types whose creation is refused, simulating a
/// platform that cannot build them.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next: u64,
    calls: Vec<BackendCall>,
    fail_types: BTreeSet<String>,
}

impl RecordingBackend {
    /// Creates a recording backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `create_object` fail for a node type from now on.
    pub fn fail_on(&mut self, node_type: &str) {
        self.fail_types.insert(node_type.to_string());
    }

    /// Lets a previously failing node type succeed again.
    pub fn recover(&mut self, node_type: &str) {
        self.fail_types.remove(node_type);
    }

    /// All calls recorded so far, in order.
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Number of calls recorded so far.
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    /// Drains the call log, returning everything recorded so far.
    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }
}

impl AudioBackend for RecordingBackend {
    fn create_object(&mut self, node_type: &str) -> Result<ObjectId, BackendError> {
        if self.fail_types.contains(node_type) {
            return Err(BackendError::UnsupportedType(node_type.to_string()));
        }
        let id = ObjectId(self.next);
        self.next += 1;
        self.calls
            .push(BackendCall::Create(node_type.to_string(), id));
        Ok(id)
    }

    fn connect(&mut self, source: ObjectId, target: ObjectId, target_port: &str) {
        self.calls
            .push(BackendCall::Connect(source, target, target_port.to_string()));
    }

    fn disconnect(&mut self, source: ObjectId, target: ObjectId, target_port: &str) {
        self.calls
            .push(BackendCall::Disconnect(source, target, target_port.to_string()));
    }

    fn connect_to_param(&mut self, source: ObjectId, target: ObjectId, param: &str) {
        self.calls
            .push(BackendCall::ConnectToParam(source, target, param.to_string()));
    }

    fn disconnect_from_param(&mut self, source: ObjectId, target: ObjectId, param: &str) {
        self.calls.push(BackendCall::DisconnectFromParam(
            source,
            target,
            param.to_string(),
        ));
    }

    fn set_param(&mut self, object: ObjectId, name: &str, value: f64) {
        self.calls
            .push(BackendCall::SetParam(object, name.to_string(), value));
    }

    fn release(&mut self, object: ObjectId) {
        self.calls.push(BackendCall::Release(object));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_backend_issues_distinct_ids() {
        let mut backend = NullBackend::new();
        let a = backend.create_object("oscillator").unwrap();
        let b = backend.create_object("gain").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn recording_backend_logs_in_order() {
        let mut backend = RecordingBackend::new();
        let a = backend.create_object("oscillator").unwrap();
        let b = backend.create_object("gain").unwrap();
        backend.connect(a, b, "input");
        backend.set_param(b, "gain", 0.5);
        backend.release(a);

        assert_eq!(
            backend.calls(),
            &[
                BackendCall::Create("oscillator".to_string(), a),
                BackendCall::Create("gain".to_string(), b),
                BackendCall::Connect(a, b, "input".to_string()),
                BackendCall::SetParam(b, "gain".to_string(), 0.5),
                BackendCall::Release(a),
            ]
        );
    }

    #[test]
    fn fail_on_refuses_creation_until_recover() {
        let mut backend = RecordingBackend::new();
        backend.fail_on("delay");

        let err = backend.create_object("delay").unwrap_err();
        assert!(matches!(err, BackendError::UnsupportedType(t) if t == "delay"));
        assert_eq!(backend.call_count(), 0);

        backend.recover("delay");
        assert!(backend.create_object("delay").is_ok());
    }
}
