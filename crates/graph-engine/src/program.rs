//! Program container: node arena, validation, repeatable execution
//!
//! A program wraps one assembled graph into a callable unit. Nodes live
//! in an arena indexed by [`NodeId`]; node id 0 is always the implicit
//! parameter-entry node, created at construction with one output per
//! declared parameter and a single trigger slot that `set_entry_point`
//! wires to the first real node.
//!
//! Execution is a hybrid pull/push evaluator. Input resolution *pulls*:
//! an input asks its bonded upstream output for a value, force-executing
//! the producer if it is not static, and memoizes the result for the
//! rest of the run. Control flow *pushes*: a behavior returns an exit
//! token and the engine recursively executes the node bonded to that
//! trigger slot. Keeping the two apart lets branching behaviors stay
//! ignorant of data resolution and data-only nodes stay ignorant of
//! control flow.

use std::collections::HashSet;

use crate::environment::Environment;
use crate::node::{
    Node, NodeId, KIND_ENTRY, KIND_GET_VARIABLE, KIND_RETURN, KIND_SET_VARIABLE, KIND_VALUE,
};
use crate::node_type::Behavior;
use crate::registry::Registry;
use crate::value::{TypeTag, Value};

/// Id of the implicit parameter-entry node of every program.
pub const ENTRY_NODE: NodeId = 0;

/// Type name under which return nodes are grouped in the persisted form.
pub(crate) const RETURN_TYPE_NAME: &str = "Return";

/// Result of one `Program::execute` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Whether the entry node's trigger chain ran to completion
    pub success: bool,
    /// The value captured by an executed return node, if any
    pub value: Option<Value>,
}

impl RunOutcome {
    fn failed() -> Self {
        Self {
            success: false,
            value: None,
        }
    }
}

/// An assembled, validated, repeatably executable graph.
pub struct Program {
    return_type: Option<TypeTag>,
    parameter_types: Vec<TypeTag>,
    nodes: Vec<Node>,
    returns: Vec<NodeId>,
    tags: HashSet<i32>,
    validated: Option<bool>,
}

impl Program {
    pub(crate) fn new(return_type: Option<TypeTag>, parameter_types: Vec<TypeTag>) -> Self {
        let entry = Node::new(
            ENTRY_NODE,
            KIND_ENTRY,
            false,
            1,
            Vec::new(),
            parameter_types.clone(),
            Some(Box::new(EntryBehavior)),
        );
        Self {
            return_type,
            parameter_types,
            nodes: vec![entry],
            returns: Vec::new(),
            tags: HashSet::new(),
            validated: None,
        }
    }

    pub fn return_type(&self) -> Option<&TypeTag> {
        self.return_type.as_ref()
    }

    pub fn parameter_types(&self) -> &[TypeTag] {
        &self.parameter_types
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn nodes_iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Whether a node ran to completion during the last execution.
    pub fn was_executed(&self, id: NodeId) -> bool {
        self.node(id).map(Node::was_executed).unwrap_or(false)
    }

    fn push_node(&mut self, build: impl FnOnce(NodeId) -> Node) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(build(id));
        id
    }

    /// Instantiate a registered node type into this program.
    ///
    /// The name `"Return"` maps to [`Program::new_return_node`], matching
    /// the grouping used by the persisted form.
    pub fn new_node(&mut self, registry: &Registry, name: &str) -> Option<NodeId> {
        if name == RETURN_TYPE_NAME {
            return self.new_return_node();
        }
        let id = self.nodes.len() as NodeId;
        let node = registry.new_node(name, id)?;
        self.nodes.push(node);
        Some(id)
    }

    /// Create a literal node holding a preset, reset-proof output.
    pub fn new_value_node(&mut self, value: Value) -> NodeId {
        let ty = value.type_tag();
        self.push_node(|id| {
            let mut node = Node::new(id, KIND_VALUE, false, 0, Vec::new(), vec![ty], None);
            node.set_output(0, value);
            node.set_resettable(false);
            node
        })
    }

    /// Create a return sink for the program's declared return type.
    ///
    /// Returns `None` when the program declares no return type.
    pub fn new_return_node(&mut self) -> Option<NodeId> {
        let ty = self.return_type.clone()?;
        let id = self.push_node(|id| {
            Node::new(id, KIND_RETURN, true, 0, vec![ty], Vec::new(), None)
        });
        self.returns.push(id);
        Some(id)
    }

    /// Create a node reading a named variable of the given type from the
    /// run's environment.
    pub fn new_get_variable_node(&mut self, ty: TypeTag) -> NodeId {
        self.push_node(|id| {
            Node::new(
                id,
                KIND_GET_VARIABLE,
                false,
                0,
                vec![TypeTag::Str],
                vec![ty],
                Some(Box::new(GetVariableBehavior)),
            )
        })
    }

    /// Create a node writing a named variable of the given type into the
    /// run's environment.
    pub fn new_set_variable_node(&mut self, ty: TypeTag) -> NodeId {
        self.push_node(|id| {
            Node::new(
                id,
                KIND_SET_VARIABLE,
                true,
                1,
                vec![ty, TypeTag::Str],
                Vec::new(),
                Some(Box::new(SetVariableBehavior)),
            )
        })
    }

    /// Wire the implicit entry node's trigger to the first real node.
    pub fn set_entry_point(&mut self, node: NodeId) -> bool {
        self.bond(ENTRY_NODE, 0, node)
    }

    /// Wire a control-flow trigger slot to a downstream node.
    ///
    /// Fails when the target does not accept being a trigger target, or
    /// the slot does not exist.
    pub fn bond(&mut self, from: NodeId, slot: u8, to: NodeId) -> bool {
        let (from_idx, to_idx) = (from as usize, to as usize);
        if from_idx >= self.nodes.len() || to_idx >= self.nodes.len() {
            return false;
        }
        if !self.nodes[to_idx].can_be_entry() {
            return false;
        }
        if slot as usize >= self.nodes[from_idx].trigger_count() {
            return false;
        }
        self.nodes[to_idx].add_caller(from);
        self.nodes[from_idx].set_trigger(slot, to)
    }

    /// Wire a data bond from an output port to an input port.
    ///
    /// Fails when the input is already bonded or the output's type is not
    /// assignable to the input's declared type; neither port is mutated on
    /// failure. If the output already holds a value it is propagated to
    /// the new input immediately.
    pub fn bond_data(&mut self, from: NodeId, output: u8, to: NodeId, input: u8) -> bool {
        let (from_idx, to_idx) = (from as usize, to as usize);
        if from_idx >= self.nodes.len() || to_idx >= self.nodes.len() {
            return false;
        }
        let out_ty = match self.nodes[from_idx].output_type(output) {
            Some(ty) => ty.clone(),
            None => return false,
        };
        match self.nodes[to_idx].input(input) {
            Some(port) if !port.is_bonded() => {}
            _ => return false,
        }
        let accepts = self.nodes[to_idx]
            .input_type(input)
            .map(|ty| ty.accepts(&out_ty))
            .unwrap_or(false);
        if !accepts {
            return false;
        }
        self.nodes[to_idx].set_input_bond(input, from, output);
        if let Some(value) = self.nodes[from_idx].output_value(output).cloned() {
            self.nodes[to_idx].set_input_value(input, value);
        }
        self.nodes[from_idx].add_output_target(output, to, input);
        true
    }

    pub fn add_tag(&mut self, tag: i32) {
        self.tags.insert(tag);
    }

    pub fn remove_tag(&mut self, tag: i32) {
        self.tags.remove(&tag);
    }

    pub fn has_tag(&self, tag: i32) -> bool {
        self.tags.contains(&tag)
    }

    /// Exact-set-membership: every required tag must be present.
    pub fn has_tags(&self, required: &HashSet<i32>) -> bool {
        required.iter().all(|tag| self.tags.contains(tag))
    }

    pub fn tags(&self) -> &HashSet<i32> {
        &self.tags
    }

    /// Structural validation, computed once and cached.
    ///
    /// Walks the trigger tree from the entry node. Revisiting a node that
    /// is still on the control-flow stack is a cycle; every input chain
    /// must terminate in bonded producers (checked with its own on-stack
    /// set, so data cycles are caught as well); an entry-capable node
    /// with no recorded caller can never run and fails the check.
    pub fn validate(&mut self) -> bool {
        if let Some(valid) = self.validated {
            return valid;
        }
        let mut stack = HashSet::new();
        let valid = self.check_node(ENTRY_NODE, &mut stack);
        self.validated = Some(valid);
        valid
    }

    fn check_node(&self, id: NodeId, trigger_stack: &mut HashSet<NodeId>) -> bool {
        if !trigger_stack.insert(id) {
            log::debug!("validation failed: control-flow cycle through node {id}");
            return false;
        }
        let mut input_stack = HashSet::new();
        let mut ok = self.check_input_chain(id, &mut input_stack);
        if ok {
            if let Some(node) = self.node(id) {
                for (_, _, target) in node.trigger_bonds() {
                    if !self.check_node(target, trigger_stack) {
                        ok = false;
                        break;
                    }
                }
            }
        }
        trigger_stack.remove(&id);
        ok
    }

    fn check_input_chain(&self, id: NodeId, stack: &mut HashSet<NodeId>) -> bool {
        if !stack.insert(id) {
            log::debug!("validation failed: data cycle through node {id}");
            return false;
        }
        let Some(node) = self.node(id) else {
            return false;
        };
        if node.can_be_entry() && !node.has_callers() {
            log::debug!("validation failed: entry-capable node {id} has no caller");
            return false;
        }
        for idx in 0..node.input_count() {
            match node.input(idx as u8).and_then(|p| p.bond()) {
                Some((source, _)) => {
                    if !self.check_input_chain(source, stack) {
                        return false;
                    }
                }
                None => {
                    log::debug!("validation failed: input {idx} of node {id} is unbonded");
                    return false;
                }
            }
        }
        stack.remove(&id);
        true
    }

    /// Run the program with the given parameters.
    ///
    /// Rejects mismatched parameter arity immediately; validates lazily on
    /// the first call and caches the verdict. Every node is reset, the
    /// entry node's outputs are seeded from the parameters, and the entry
    /// node is executed. The returned value is the input of the first
    /// return node whose executed flag is set.
    pub fn execute(&mut self, params: Vec<Value>) -> RunOutcome {
        if params.len() != self.parameter_types.len() {
            log::debug!(
                "execute rejected: {} parameters given, {} declared",
                params.len(),
                self.parameter_types.len()
            );
            return RunOutcome::failed();
        }
        if !self.validate() {
            return RunOutcome::failed();
        }
        for node in &mut self.nodes {
            node.reset();
        }
        for (idx, value) in params.into_iter().enumerate() {
            if !self.nodes[ENTRY_NODE as usize].set_output(idx as u8, value) {
                log::debug!("execute rejected: parameter {idx} has the wrong type");
                return RunOutcome::failed();
            }
        }
        let mut env = Environment::new();
        let success = self.execute_node(ENTRY_NODE, &mut env);
        let value = if self.return_type.is_some() {
            self.returns
                .iter()
                .copied()
                .find(|&id| self.was_executed(id))
                .and_then(|id| self.nodes[id as usize].input_value(0).cloned())
        } else {
            None
        };
        RunOutcome { success, value }
    }

    /// Execute one node: resolve every input in declared order, run the
    /// behavior, require every output to hold a value, then follow the
    /// returned exit token.
    ///
    /// An exit token pointing at an unbound slot fails the node (its
    /// chosen branch leads nowhere); no exit token makes it terminal.
    pub(crate) fn execute_node(&mut self, id: NodeId, env: &mut Environment) -> bool {
        let input_count = match self.node(id) {
            Some(node) => node.input_count(),
            None => return false,
        };
        for idx in 0..input_count {
            if !self.evaluate_input(id, idx as u8, env) {
                log::debug!("node {id}: input {idx} could not be evaluated");
                return false;
            }
        }
        let exit = match self.nodes[id as usize].take_behavior() {
            Some(mut behavior) => {
                let exit = {
                    let mut scope = Scope {
                        program: self,
                        node: id,
                        env,
                    };
                    behavior.execute(&mut scope)
                };
                self.nodes[id as usize].put_behavior(behavior);
                exit
            }
            None => None,
        };
        if self.nodes[id as usize].any_output_unset() {
            log::debug!("node {id}: an output was left unset");
            return false;
        }
        match exit {
            Some(slot) => {
                let ok = self.fire_trigger(id, slot, env);
                self.nodes[id as usize].set_was_executed(ok);
                ok
            }
            None => {
                self.nodes[id as usize].set_was_executed(true);
                true
            }
        }
    }

    /// Resolve one input, memoized per run.
    ///
    /// A cached value short-circuits. Otherwise the bonded upstream
    /// output is asked: a non-static producer is force-executed first,
    /// then whatever value its output holds is copied over.
    fn evaluate_input(&mut self, id: NodeId, idx: u8, env: &mut Environment) -> bool {
        if self.nodes[id as usize].input_value(idx).is_some() {
            return true;
        }
        let Some((source, out_idx)) = self.nodes[id as usize].input(idx).and_then(|p| p.bond())
        else {
            return false;
        };
        let source_static = match self.node(source) {
            Some(node) => node.is_static(),
            None => return false,
        };
        if !source_static {
            // Failure surfaces as a still-missing output value below.
            self.execute_node(source, env);
        }
        match self.nodes[source as usize].output_value(out_idx).cloned() {
            Some(value) => self.nodes[id as usize].set_input_value(idx, value),
            None => false,
        }
    }

    fn fire_trigger(&mut self, id: NodeId, slot: u8, env: &mut Environment) -> bool {
        match self.node(id).and_then(|n| n.trigger_target(slot)) {
            Some(target) => self.execute_node(target, env),
            None => false,
        }
    }
}

/// The window a [`Behavior`] gets onto its own node during execution.
///
/// Behaviors read their node's evaluated inputs, write its outputs, fire
/// its trigger slots, and access the run's variable environment. Nothing
/// else of the program is reachable from here.
pub struct Scope<'a> {
    program: &'a mut Program,
    node: NodeId,
    env: &'a mut Environment,
}

impl Scope<'_> {
    /// The evaluated value of the node's own input port.
    pub fn input(&self, idx: u8) -> Option<&Value> {
        self.program.node(self.node)?.input_value(idx)
    }

    /// Set one of the node's own output ports, checking the declared type.
    pub fn set_output(&mut self, idx: u8, value: Value) -> bool {
        match self.program.nodes.get_mut(self.node as usize) {
            Some(node) => node.set_output(idx, value),
            None => false,
        }
    }

    /// Fire a trigger slot immediately, executing the bonded node.
    ///
    /// Returns false when the slot is unbound or the downstream chain
    /// fails.
    pub fn trigger(&mut self, idx: u8) -> bool {
        self.program.fire_trigger(self.node, idx, self.env)
    }

    /// Read a variable from the run's environment.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.env.get_variable(name)
    }

    /// Write a variable into the run's environment.
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.env.set_variable(name, value);
    }
}

/// Behavior of the implicit entry node: advance through its only trigger.
struct EntryBehavior;

impl Behavior for EntryBehavior {
    fn execute(&mut self, _scope: &mut Scope<'_>) -> Option<u8> {
        Some(0)
    }
}

/// Reads `Name` from the environment into the `Value` output.
///
/// A missing variable leaves the output unset, which fails the node's
/// execution and propagates as an unresolvable input downstream.
struct GetVariableBehavior;

impl Behavior for GetVariableBehavior {
    fn execute(&mut self, scope: &mut Scope<'_>) -> Option<u8> {
        let name = scope.input(0).and_then(Value::as_str).map(str::to_owned);
        if let Some(name) = name {
            let value = scope.variable(&name).cloned();
            if let Some(value) = value {
                scope.set_output(0, value);
            }
        }
        None
    }
}

/// Writes the `Value` input into the environment under the `Name` input.
///
/// The continuation slot is fired inline so a chain-terminal setter still
/// counts as executed.
struct SetVariableBehavior;

impl Behavior for SetVariableBehavior {
    fn execute(&mut self, scope: &mut Scope<'_>) -> Option<u8> {
        let value = scope.input(0).cloned();
        let name = scope.input(1).and_then(Value::as_str).map(str::to_owned);
        if let (Some(name), Some(value)) = (name, value) {
            scope.set_variable(name, value);
        }
        scope.trigger(0);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_type::NodeSpec;
    use crate::registry::Registry;

    /// Doubles its `i32` input; pure data node, pull-executed.
    struct DoubleBehavior;

    impl Behavior for DoubleBehavior {
        fn execute(&mut self, scope: &mut Scope<'_>) -> Option<u8> {
            if let Some(v) = scope.input(0).and_then(Value::as_i32) {
                scope.set_output(0, Value::I32(v * 2));
            }
            None
        }
    }

    /// Entry-capable node producing a constant and advancing through its
    /// single trigger slot.
    struct EmitBehavior;

    impl Behavior for EmitBehavior {
        fn execute(&mut self, scope: &mut Scope<'_>) -> Option<u8> {
            scope.set_output(0, Value::I32(99));
            Some(0)
        }
    }

    fn test_registry() -> Registry {
        let mut registry = Registry::new();

        let mut double = NodeSpec::new("Double", false);
        double.add_input("In", TypeTag::I32);
        double.add_output("Out", TypeTag::I32);
        registry.register_fn(double, || Some(Box::new(DoubleBehavior)));

        let mut emit = NodeSpec::new("Emit", true);
        emit.add_trigger("Next");
        emit.add_output("Out", TypeTag::I32);
        registry.register_fn(emit, || Some(Box::new(EmitBehavior)));

        registry
    }

    #[test]
    fn test_bond_exclusivity() {
        let registry = test_registry();
        let mut program = registry.new_program(None, vec![]);
        let v1 = program.new_value_node(Value::I32(1));
        let v2 = program.new_value_node(Value::I32(2));
        let double = program.new_node(&registry, "Double").unwrap();

        assert!(program.bond_data(v1, 0, double, 0));
        // A second bond on the same input always fails and leaves the
        // first bond intact.
        assert!(!program.bond_data(v2, 0, double, 0));
        assert_eq!(
            program.node(double).unwrap().input_value(0),
            Some(&Value::I32(1))
        );
    }

    #[test]
    fn test_bond_type_gating() {
        let registry = test_registry();
        let mut program = registry.new_program(None, vec![]);
        let text = program.new_value_node(Value::Str("nope".into()));
        let double = program.new_node(&registry, "Double").unwrap();

        assert!(!program.bond_data(text, 0, double, 0));
        // Failure mutates neither port: the input can still be bonded.
        let number = program.new_value_node(Value::I32(4));
        assert!(program.bond_data(number, 0, double, 0));
    }

    #[test]
    fn test_bond_propagates_existing_value() {
        let registry = test_registry();
        let mut program = registry.new_program(None, vec![]);
        let value = program.new_value_node(Value::I32(7));
        let double = program.new_node(&registry, "Double").unwrap();

        assert!(program.bond_data(value, 0, double, 0));
        assert_eq!(
            program.node(double).unwrap().input_value(0),
            Some(&Value::I32(7))
        );
    }

    #[test]
    fn test_trigger_bond_requires_entry_capable() {
        let registry = test_registry();
        let mut program = registry.new_program(None, vec![]);
        let double = program.new_node(&registry, "Double").unwrap();
        // Double is not entry-capable, so it cannot be a trigger target.
        assert!(!program.set_entry_point(double));

        let emit = program.new_node(&registry, "Emit").unwrap();
        assert!(program.set_entry_point(emit));
        // Invalid slot index fails.
        assert!(!program.bond(emit, 5, emit));
    }

    fn param_double_program(registry: &Registry) -> Program {
        let mut program = registry.new_program(Some(TypeTag::I32), vec![TypeTag::I32]);
        let double = program.new_node(registry, "Double").unwrap();
        let ret = program.new_return_node().unwrap();
        assert!(program.bond_data(ENTRY_NODE, 0, double, 0));
        assert!(program.bond_data(double, 0, ret, 0));
        assert!(program.set_entry_point(ret));
        program
    }

    #[test]
    fn test_execute_with_parameter() {
        let registry = test_registry();
        let mut program = param_double_program(&registry);

        let outcome = program.execute(vec![Value::I32(5)]);
        assert!(outcome.success);
        assert_eq!(outcome.value, Some(Value::I32(10)));
    }

    #[test]
    fn test_deterministic_re_execution() {
        let registry = test_registry();
        let mut program = param_double_program(&registry);

        let first = program.execute(vec![Value::I32(21)]);
        let flags: Vec<bool> = (0..program.node_count() as NodeId)
            .map(|id| program.was_executed(id))
            .collect();
        let second = program.execute(vec![Value::I32(21)]);
        let flags_again: Vec<bool> = (0..program.node_count() as NodeId)
            .map(|id| program.was_executed(id))
            .collect();

        assert_eq!(first, second);
        assert_eq!(flags, flags_again);
        assert_eq!(second.value, Some(Value::I32(42)));
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let registry = test_registry();
        let mut program = param_double_program(&registry);
        assert!(!program.execute(vec![]).success);
        assert!(!program.execute(vec![Value::I32(1), Value::I32(2)]).success);
    }

    #[test]
    fn test_parameter_type_mismatch_rejected() {
        let registry = test_registry();
        let mut program = param_double_program(&registry);
        assert!(!program.execute(vec![Value::Str("five".into())]).success);
    }

    #[test]
    fn test_data_cycle_fails_validation() {
        let registry = test_registry();
        let mut program = registry.new_program(Some(TypeTag::I32), vec![]);
        let a = program.new_node(&registry, "Double").unwrap();
        let b = program.new_node(&registry, "Double").unwrap();
        let ret = program.new_return_node().unwrap();

        assert!(program.bond_data(a, 0, b, 0));
        assert!(program.bond_data(b, 0, a, 0));
        assert!(program.bond_data(a, 0, ret, 0));
        assert!(program.set_entry_point(ret));

        assert!(!program.validate());
        assert!(!program.execute(vec![]).success);
    }

    #[test]
    fn test_trigger_cycle_fails_validation() {
        let registry = test_registry();
        let mut program = registry.new_program(None, vec![]);
        let a = program.new_node(&registry, "Emit").unwrap();
        let b = program.new_node(&registry, "Emit").unwrap();

        assert!(program.set_entry_point(a));
        assert!(program.bond(a, 0, b));
        assert!(program.bond(b, 0, a));

        assert!(!program.validate());
    }

    #[test]
    fn test_unbonded_input_fails_validation() {
        let registry = test_registry();
        let mut program = registry.new_program(Some(TypeTag::I32), vec![]);
        let double = program.new_node(&registry, "Double").unwrap();
        let ret = program.new_return_node().unwrap();

        // Double's input is left unbonded.
        assert!(program.bond_data(double, 0, ret, 0));
        assert!(program.set_entry_point(ret));

        assert!(!program.validate());
    }

    #[test]
    fn test_unreachable_entry_capable_node_fails_validation() {
        let registry = test_registry();
        let mut program = registry.new_program(Some(TypeTag::I32), vec![]);
        let emit = program.new_node(&registry, "Emit").unwrap();
        let ret = program.new_return_node().unwrap();

        // Emit feeds the return value but nothing ever triggers it.
        assert!(program.bond_data(emit, 0, ret, 0));
        assert!(program.set_entry_point(ret));
        assert!(!program.validate());
    }

    #[test]
    fn test_triggered_producer_feeds_downstream() {
        let registry = test_registry();
        let mut program = registry.new_program(Some(TypeTag::I32), vec![]);
        let emit = program.new_node(&registry, "Emit").unwrap();
        let ret = program.new_return_node().unwrap();

        assert!(program.set_entry_point(emit));
        assert!(program.bond(emit, 0, ret));
        assert!(program.bond_data(emit, 0, ret, 0));

        assert!(program.validate());
        let outcome = program.execute(vec![]);
        assert!(outcome.success);
        assert_eq!(outcome.value, Some(Value::I32(99)));
        assert!(program.was_executed(emit));
        assert!(program.was_executed(ret));
    }

    #[test]
    fn test_entry_with_unbound_trigger_fails_execution() {
        let registry = test_registry();
        let mut program = registry.new_program(None, vec![]);
        // Valid (nothing to check) but the entry's exit leads nowhere.
        assert!(program.validate());
        assert!(!program.execute(vec![]).success);
    }

    #[test]
    fn test_literal_survives_repeated_runs() {
        let registry = test_registry();
        let mut program = registry.new_program(Some(TypeTag::I32), vec![]);
        let value = program.new_value_node(Value::I32(3));
        let double = program.new_node(&registry, "Double").unwrap();
        let ret = program.new_return_node().unwrap();

        assert!(program.bond_data(value, 0, double, 0));
        assert!(program.bond_data(double, 0, ret, 0));
        assert!(program.set_entry_point(ret));

        for _ in 0..3 {
            let outcome = program.execute(vec![]);
            assert!(outcome.success);
            assert_eq!(outcome.value, Some(Value::I32(6)));
        }
    }

    #[test]
    fn test_return_node_requires_return_type() {
        let registry = test_registry();
        let mut program = registry.new_program(None, vec![]);
        assert!(program.new_return_node().is_none());
    }

    #[test]
    fn test_variable_set_then_get() {
        let registry = test_registry();
        let mut program = registry.new_program(Some(TypeTag::I32), vec![TypeTag::I32]);

        let set_var = program.new_set_variable_node(TypeTag::I32);
        let get_var = program.new_get_variable_node(TypeTag::I32);
        let name_for_set = program.new_value_node(Value::Str("x".into()));
        let name_for_get = program.new_value_node(Value::Str("x".into()));
        let ret = program.new_return_node().unwrap();

        assert!(program.bond_data(ENTRY_NODE, 0, set_var, 0));
        assert!(program.bond_data(name_for_set, 0, set_var, 1));
        assert!(program.bond_data(name_for_get, 0, get_var, 0));
        assert!(program.bond_data(get_var, 0, ret, 0));
        assert!(program.set_entry_point(set_var));
        assert!(program.bond(set_var, 0, ret));

        let outcome = program.execute(vec![Value::I32(123)]);
        assert!(outcome.success);
        assert_eq!(outcome.value, Some(Value::I32(123)));
    }

    #[test]
    fn test_tags() {
        let registry = test_registry();
        let mut program = registry.new_program(None, vec![]);
        program.add_tag(1);
        program.add_tag(7);

        assert!(program.has_tag(1));
        assert!(!program.has_tag(2));
        assert!(program.has_tags(&HashSet::from([1, 7])));
        assert!(!program.has_tags(&HashSet::from([1, 2])));

        program.remove_tag(7);
        assert!(!program.has_tag(7));
        assert!(program.has_tags(&HashSet::new()));
    }
}
