//! Registry setup for the built-in node types
//!
//! Hosts call [`register_builtins`] on a fresh registry before building
//! or loading programs that use the built-in node names.

use std::sync::Arc;

use graph_engine::Registry;

use crate::compare::Equals;
use crate::control::{If, While};
use crate::output::Print;

/// Register every built-in node type (`==`, `If`, `While`, `Print`).
pub fn register_builtins(registry: &mut Registry) {
    registry.register(Equals::spec(), Arc::new(Equals));
    registry.register(If::spec(), Arc::new(If));
    registry.register(While::spec(), Arc::new(While));
    registry.register(Print::spec(), Arc::new(Print));
    log::debug!("registered built-in node types");
}
