//! Live graph vertices: ports, bonding state, execution flags
//!
//! Nodes live in an arena owned by their [`Program`](crate::Program) and
//! reference each other exclusively through `(node id, port index)`
//! pairs, never through direct ownership. Two overlapping edge kinds
//! exist: trigger edges (control flow, one target per slot) and port
//! bonds (data flow, at most one upstream bond per input, arbitrary
//! fan-out per output).

use crate::node_type::Behavior;
use crate::value::{TypeTag, Value};

/// Node identifier, stable only within one owning program.
pub type NodeId = u32;

/// Reserved type ids for the structural node kinds; registered node types
/// are assigned ids starting at [`FIRST_USER_KIND`].
pub(crate) const KIND_VALUE: u32 = 0;
pub(crate) const KIND_ENTRY: u32 = 1;
pub(crate) const KIND_RETURN: u32 = 2;
pub(crate) const KIND_GET_VARIABLE: u32 = 3;
pub(crate) const KIND_SET_VARIABLE: u32 = 4;
pub(crate) const FIRST_USER_KIND: u32 = 10;

/// An input port: declared type, memoized value, at most one upstream bond.
#[derive(Debug)]
pub(crate) struct InputPort {
    ty: TypeTag,
    value: Option<Value>,
    bond: Option<(NodeId, u8)>,
}

impl InputPort {
    fn new(ty: TypeTag) -> Self {
        Self {
            ty,
            value: None,
            bond: None,
        }
    }

    pub(crate) fn is_bonded(&self) -> bool {
        self.bond.is_some()
    }

    pub(crate) fn bond(&self) -> Option<(NodeId, u8)> {
        self.bond
    }

    /// Store a value if its type satisfies the declared type.
    pub(crate) fn set_value(&mut self, value: Value) -> bool {
        if self.ty.accepts(&value.type_tag()) {
            self.value = Some(value);
            return true;
        }
        false
    }
}

/// An output port: declared type, cached value, fan-out bond set.
#[derive(Debug)]
pub(crate) struct OutputPort {
    ty: TypeTag,
    value: Option<Value>,
    targets: Vec<(NodeId, u8)>,
}

impl OutputPort {
    fn new(ty: TypeTag) -> Self {
        Self {
            ty,
            value: None,
            targets: Vec::new(),
        }
    }

    pub(crate) fn set_value(&mut self, value: Value) -> bool {
        if self.ty.accepts(&value.type_tag()) {
            self.value = Some(value);
            return true;
        }
        false
    }
}

/// A live vertex: concrete ports, trigger slots, and the bound behavior.
pub struct Node {
    id: NodeId,
    type_id: u32,
    can_be_entry: bool,
    resettable: bool,
    was_executed: bool,
    callers: Vec<NodeId>,
    triggers: Vec<Option<NodeId>>,
    inputs: Vec<InputPort>,
    outputs: Vec<OutputPort>,
    behavior: Option<Box<dyn Behavior>>,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        type_id: u32,
        can_be_entry: bool,
        trigger_count: usize,
        input_types: Vec<TypeTag>,
        output_types: Vec<TypeTag>,
        behavior: Option<Box<dyn Behavior>>,
    ) -> Self {
        Self {
            id,
            type_id,
            can_be_entry,
            resettable: true,
            was_executed: false,
            callers: Vec::new(),
            triggers: vec![None; trigger_count],
            inputs: input_types.into_iter().map(InputPort::new).collect(),
            outputs: output_types.into_iter().map(OutputPort::new).collect(),
            behavior,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn was_executed(&self) -> bool {
        self.was_executed
    }

    pub fn can_be_entry(&self) -> bool {
        self.can_be_entry
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    /// The currently cached value of an input port.
    pub fn input_value(&self, idx: u8) -> Option<&Value> {
        self.inputs.get(idx as usize).and_then(|p| p.value.as_ref())
    }

    /// The currently cached value of an output port.
    pub fn output_value(&self, idx: u8) -> Option<&Value> {
        self.outputs.get(idx as usize).and_then(|p| p.value.as_ref())
    }

    /// Set an output port value, checking the declared type.
    pub fn set_output(&mut self, idx: u8, value: Value) -> bool {
        match self.outputs.get_mut(idx as usize) {
            Some(port) => port.set_value(value),
            None => false,
        }
    }

    /// Clear all cached port values and the executed flag.
    ///
    /// Non-resettable nodes (literals) keep their preset outputs across
    /// any number of resets.
    pub fn reset(&mut self) {
        if !self.resettable {
            return;
        }
        self.was_executed = false;
        for input in &mut self.inputs {
            input.value = None;
        }
        for output in &mut self.outputs {
            output.value = None;
        }
    }

    pub(crate) fn set_resettable(&mut self, resettable: bool) {
        self.resettable = resettable;
    }

    pub(crate) fn set_was_executed(&mut self, executed: bool) {
        self.was_executed = executed;
    }

    pub(crate) fn type_id(&self) -> u32 {
        self.type_id
    }

    /// A node is static when pull-evaluation must not force-execute it:
    /// it participates in control flow (entry-capable or has trigger
    /// slots) or has no behavior at all. Static outputs are only ever
    /// read, either preset (literals) or filled by control flow.
    pub(crate) fn is_static(&self) -> bool {
        self.can_be_entry || !self.triggers.is_empty() || self.behavior.is_none()
    }

    pub(crate) fn take_behavior(&mut self) -> Option<Box<dyn Behavior>> {
        self.behavior.take()
    }

    pub(crate) fn put_behavior(&mut self, behavior: Box<dyn Behavior>) {
        self.behavior = Some(behavior);
    }

    pub(crate) fn has_callers(&self) -> bool {
        !self.callers.is_empty()
    }

    pub(crate) fn add_caller(&mut self, caller: NodeId) {
        self.callers.push(caller);
    }

    pub(crate) fn trigger_target(&self, slot: u8) -> Option<NodeId> {
        self.triggers.get(slot as usize).copied().flatten()
    }

    pub(crate) fn set_trigger(&mut self, slot: u8, target: NodeId) -> bool {
        match self.triggers.get_mut(slot as usize) {
            Some(entry) => {
                *entry = Some(target);
                true
            }
            None => false,
        }
    }

    pub(crate) fn input_type(&self, idx: u8) -> Option<&TypeTag> {
        self.inputs.get(idx as usize).map(|p| &p.ty)
    }

    pub(crate) fn output_type(&self, idx: u8) -> Option<&TypeTag> {
        self.outputs.get(idx as usize).map(|p| &p.ty)
    }

    pub(crate) fn input(&self, idx: u8) -> Option<&InputPort> {
        self.inputs.get(idx as usize)
    }

    /// Record the upstream side of a data bond on an input.
    pub(crate) fn set_input_bond(&mut self, idx: u8, source: NodeId, output: u8) {
        if let Some(port) = self.inputs.get_mut(idx as usize) {
            port.bond = Some((source, output));
        }
    }

    /// Store an evaluated value on an input, checking the declared type.
    pub(crate) fn set_input_value(&mut self, idx: u8, value: Value) -> bool {
        match self.inputs.get_mut(idx as usize) {
            Some(port) => port.set_value(value),
            None => false,
        }
    }

    /// Record the downstream side of a data bond on an output.
    pub(crate) fn add_output_target(&mut self, idx: u8, target: NodeId, input: u8) {
        if let Some(port) = self.outputs.get_mut(idx as usize) {
            port.targets.push((target, input));
        }
    }

    pub(crate) fn any_output_unset(&self) -> bool {
        self.outputs.iter().any(|p| p.value.is_none())
    }

    /// All wired trigger edges as `(from, slot, to)` triples.
    pub(crate) fn trigger_bonds(&self) -> Vec<(NodeId, u8, NodeId)> {
        self.triggers
            .iter()
            .enumerate()
            .filter_map(|(slot, target)| target.map(|to| (self.id, slot as u8, to)))
            .collect()
    }

    /// All data bonds leaving this node as `(from, output, to, input)`.
    pub(crate) fn data_bonds(&self) -> Vec<(NodeId, u8, NodeId, u8)> {
        let mut bonds = Vec::new();
        for (idx, output) in self.outputs.iter().enumerate() {
            for &(target, input) in &output.targets {
                bonds.push((self.id, idx as u8, target, input));
            }
        }
        bonds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_node() -> Node {
        Node::new(
            7,
            FIRST_USER_KIND,
            false,
            0,
            vec![TypeTag::I32],
            vec![TypeTag::Bool],
            None,
        )
    }

    #[test]
    fn test_set_output_type_gated() {
        let mut node = data_node();
        assert!(!node.set_output(0, Value::I32(1)));
        assert!(node.output_value(0).is_none());
        assert!(node.set_output(0, Value::Bool(true)));
        assert_eq!(node.output_value(0), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_out_of_range_ports() {
        let mut node = data_node();
        assert!(!node.set_output(3, Value::Bool(true)));
        assert!(node.input_value(3).is_none());
    }

    #[test]
    fn test_reset_idempotent() {
        let mut node = data_node();
        node.set_output(0, Value::Bool(true));
        node.set_input_value(0, Value::I32(9));
        node.set_was_executed(true);

        node.reset();
        assert!(node.output_value(0).is_none());
        assert!(node.input_value(0).is_none());
        assert!(!node.was_executed());

        // A second reset leaves the same empty state.
        node.reset();
        assert!(node.output_value(0).is_none());
        assert!(!node.was_executed());
    }

    #[test]
    fn test_non_resettable_keeps_preset_output() {
        let mut node = Node::new(0, KIND_VALUE, false, 0, vec![], vec![TypeTag::I32], None);
        node.set_output(0, Value::I32(42));
        node.set_resettable(false);

        node.reset();
        node.reset();
        assert_eq!(node.output_value(0), Some(&Value::I32(42)));
    }

    #[test]
    fn test_static_classification() {
        // No behavior at all: static.
        assert!(data_node().is_static());
        // Trigger slots: static even with a behavior.
        let node = Node::new(1, FIRST_USER_KIND, true, 1, vec![], vec![], None);
        assert!(node.is_static());
    }
}
