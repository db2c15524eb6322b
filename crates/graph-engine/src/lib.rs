//! Graph Engine - typed dataflow-graph execution
//!
//! A small, embeddable runtime that lets a host assemble typed,
//! node-based programs at run time, validate them, execute them
//! repeatedly with fresh state, and persist them as a compact binary
//! encoding. Graphs are interpreted node by node on each invocation;
//! there is no compilation step.
//!
//! # Architecture
//!
//! - [`Registry`]: catalogue of node types, program factory, owner of
//!   save/load
//! - [`Program`]: an arena of [`Node`]s wrapped into a callable unit with
//!   parameters, an optional return value, validation and tags
//! - [`Behavior`]: per-instance logic bound to one node, driving control
//!   flow through exit tokens and trigger slots
//! - [`Value`]/[`TypeTag`]: closed tagged value model; bond validity is a
//!   discriminant check performed once at bond time
//! - [`Environment`]: per-run named-variable store for the variable
//!   get/set nodes
//!
//! Execution is single-threaded and synchronous: data inputs are pulled
//! (memoized per run), control flow is pushed along trigger edges.
//! Recursion depth follows the longest dependency and trigger chains, so
//! pathologically deep graphs can exhaust the call stack; a behavior
//! that loops forever hangs the calling thread by design.
//!
//! # Example
//!
//! ```ignore
//! use graph_engine::{Registry, TypeTag, Value, ENTRY_NODE};
//!
//! let registry = Registry::new();
//! let mut program = registry.new_program(Some(TypeTag::I32), vec![TypeTag::I32]);
//! let ret = program.new_return_node().unwrap();
//! program.bond_data(ENTRY_NODE, 0, ret, 0);
//! program.set_entry_point(ret);
//!
//! let outcome = program.execute(vec![Value::I32(7)]);
//! assert_eq!(outcome.value, Some(Value::I32(7)));
//! ```

pub mod codec;
pub mod environment;
pub mod error;
pub mod node;
pub mod node_type;
pub mod program;
pub mod registry;
pub mod store;
pub mod value;

// Re-export key types
pub use codec::{Reader, ValueDecoder, Writer};
pub use environment::Environment;
pub use error::{EngineError, Result};
pub use node::{Node, NodeId};
pub use node_type::{Behavior, BehaviorFactory, NodeSpec, PortSpec};
pub use program::{Program, RunOutcome, Scope, ENTRY_NODE};
pub use registry::Registry;
pub use store::ProgramStore;
pub use value::{CustomValue, TypeTag, Value};
