//! Live-binding engine for the patchbay editor.
//!
//! This crate keeps a live audio layer consistent with the authoritative
//! model in `patchbay-graph`. The model never references live objects;
//! instead the [`AdapterLayer`] maintains a 1:1 node-to-binding map and
//! reconciles the live wiring after every model change. Logic nodes run as
//! in-process [`LogicUnit`]s whose outputs are bridged into live parameters
//! and mirrored back into the model.
//!
//! [`Session`] is the external interface: one context object owning the
//! catalog, model, history, clipboard, and adapter for one editor session.
//!
//! # Example
//!
//! ```rust
//! use patchbay_catalog::{Catalog, CompositeLibrary, PropertyValue};
//! use patchbay_engine::{NullBackend, Session};
//! use patchbay_graph::Position;
//!
//! let mut session = Session::new(
//!     Catalog::new(),
//!     CompositeLibrary::with_factory_defaults(),
//!     NullBackend::new(),
//! )?;
//!
//! let osc = session.add_node("oscillator", Position::new(0.0, 0.0))?;
//! let out = session.add_node("destination", Position::new(200.0, 0.0))?;
//! session.add_edge(osc, out, None, None)?;
//! session.set_property(osc, "frequency", PropertyValue::Number(880.0))?;
//!
//! assert!(session.can_undo());
//! session.undo();
//! let frequency = session
//!     .node(osc)
//!     .and_then(|n| n.properties.get("frequency"))
//!     .and_then(PropertyValue::as_number);
//! assert_eq!(frequency, Some(440.0));
//! assert_eq!(session.edges().count(), 1);
//! # Ok::<(), patchbay_engine::EngineError>(())
//! ```

pub mod adapter;
pub mod backend;
pub mod error;
pub mod logic;
pub mod session;

pub use adapter::{AdapterLayer, Binding, Expansion};
pub use backend::{AudioBackend, BackendCall, BackendError, NullBackend, ObjectId, RecordingBackend};
pub use error::EngineError;
pub use logic::{LogicKind, LogicUnit};
pub use session::{BatchOp, BatchOutcome, BatchReport, Session};
