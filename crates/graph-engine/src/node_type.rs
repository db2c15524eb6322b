//! Node type templates and the per-instance behavior contract
//!
//! A [`NodeSpec`] is the immutable template for one kind of node: whether
//! it may be wired as a control-flow target, its trigger exits, and its
//! ordered, named, typed data ports. The spec is pure metadata (and
//! serializable, so hosts can list a palette); the executable side lives
//! in [`Behavior`], created fresh for every node instance by a
//! [`BehaviorFactory`].

use serde::{Deserialize, Serialize};

use crate::program::Scope;
use crate::value::TypeTag;

/// A named, typed data port declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortSpec {
    pub name: String,
    pub ty: TypeTag,
}

impl PortSpec {
    pub fn new(name: impl Into<String>, ty: TypeTag) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Immutable template describing one kind of node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Unique type name within a registry (e.g. `"=="`, `"If"`)
    pub name: String,
    /// Whether nodes of this type accept being wired as a trigger target
    pub can_be_entry: bool,
    /// Ordered control-flow exit names
    pub triggers: Vec<String>,
    /// Ordered input port declarations
    pub inputs: Vec<PortSpec>,
    /// Ordered output port declarations
    pub outputs: Vec<PortSpec>,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>, can_be_entry: bool) -> Self {
        Self {
            name: name.into(),
            can_be_entry,
            triggers: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Append a trigger exit. Fails (no-op) on a duplicate name.
    pub fn add_trigger(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.triggers.iter().any(|t| *t == name) {
            return false;
        }
        self.triggers.push(name);
        true
    }

    /// Append an input port. Fails (no-op) on a duplicate name.
    pub fn add_input(&mut self, name: impl Into<String>, ty: TypeTag) -> bool {
        let name = name.into();
        if self.inputs.iter().any(|p| p.name == name) {
            return false;
        }
        self.inputs.push(PortSpec::new(name, ty));
        true
    }

    /// Append an output port. Fails (no-op) on a duplicate name.
    pub fn add_output(&mut self, name: impl Into<String>, ty: TypeTag) -> bool {
        let name = name.into();
        if self.outputs.iter().any(|p| p.name == name) {
            return false;
        }
        self.outputs.push(PortSpec::new(name, ty));
        true
    }
}

/// Per-instance executable logic bound to exactly one node.
///
/// `execute` reads the node's evaluated inputs, writes its outputs, and
/// returns which control-flow exit to follow, or `None` (distinct from
/// exit 0) when control does not advance past this node.
pub trait Behavior: Send {
    fn execute(&mut self, scope: &mut Scope<'_>) -> Option<u8>;
}

/// Creates one fresh [`Behavior`] per node instantiation.
///
/// `create` may return `None` for node types with no computation of their
/// own (pure data sinks); such nodes are static and their outputs are
/// never recomputed.
pub trait BehaviorFactory: Send + Sync {
    fn create(&self) -> Option<Box<dyn Behavior>>;
}
