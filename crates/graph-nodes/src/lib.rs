//! Built-in node behaviors for the graph execution engine
//!
//! Each node type is an ordinary implementation of the engine's
//! [`Behavior`](graph_engine::Behavior) contract, packaged with its
//! [`NodeSpec`](graph_engine::NodeSpec) template:
//!
//! - `"=="`: equality test over any two values
//! - `"If"`: conditional branch
//! - `"While"`: condition-gated loop
//! - `"Print"`: write a value to stdout
//!
//! Call [`setup::register_builtins`] to make them available on a
//! [`Registry`](graph_engine::Registry). The structural node kinds
//! (literals, return sinks, variable get/set, the implicit entry) live
//! in the engine itself and are created through `Program` factories.

pub mod compare;
pub mod control;
pub mod output;
pub mod setup;

pub use compare::Equals;
pub use control::{If, While};
pub use output::Print;
pub use setup::register_builtins;
