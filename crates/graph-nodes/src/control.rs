//! Control-flow nodes
//!
//! Branching and looping are plain behaviors: they pick which trigger
//! exit to follow (or fire a slot mid-execution) and never touch data
//! resolution.

use graph_engine::{Behavior, BehaviorFactory, NodeSpec, Scope, TypeTag, Value};

/// The `"If"` node type: route control by a boolean condition.
///
/// Exits through `True` (slot 0) or `False` (slot 1); an absent
/// condition yields no exit, leaving the node terminal but unexecuted
/// downstream.
pub struct If;

impl If {
    pub const TYPE_NAME: &'static str = "If";
    pub const INPUT_CONDITION: u8 = 0;
    pub const EXIT_TRUE: u8 = 0;
    pub const EXIT_FALSE: u8 = 1;

    pub fn spec() -> NodeSpec {
        let mut spec = NodeSpec::new(Self::TYPE_NAME, true);
        spec.add_trigger("True");
        spec.add_trigger("False");
        spec.add_input("Condition", TypeTag::Bool);
        spec
    }
}

impl BehaviorFactory for If {
    fn create(&self) -> Option<Box<dyn Behavior>> {
        Some(Box::new(IfBehavior))
    }
}

struct IfBehavior;

impl Behavior for IfBehavior {
    fn execute(&mut self, scope: &mut Scope<'_>) -> Option<u8> {
        match scope.input(If::INPUT_CONDITION).and_then(Value::as_bool) {
            Some(true) => Some(If::EXIT_TRUE),
            Some(false) => Some(If::EXIT_FALSE),
            None => None,
        }
    }
}

/// The `"While"` node type: fire the body while the condition reads true.
///
/// The condition is the value memoized when this node's inputs were
/// resolved; a body that cannot change it either never runs or spins
/// forever, which is the engine's accepted infinite-loop semantics.
/// Control leaves through `Done` (slot 1) once the condition is false.
pub struct While;

impl While {
    pub const TYPE_NAME: &'static str = "While";
    pub const INPUT_CONDITION: u8 = 0;
    pub const TRIGGER_BODY: u8 = 0;
    pub const EXIT_DONE: u8 = 1;

    pub fn spec() -> NodeSpec {
        let mut spec = NodeSpec::new(Self::TYPE_NAME, true);
        spec.add_trigger("Body");
        spec.add_trigger("Done");
        spec.add_input("Condition", TypeTag::Bool);
        spec
    }
}

impl BehaviorFactory for While {
    fn create(&self) -> Option<Box<dyn Behavior>> {
        Some(Box::new(WhileBehavior))
    }
}

struct WhileBehavior;

impl Behavior for WhileBehavior {
    fn execute(&mut self, scope: &mut Scope<'_>) -> Option<u8> {
        loop {
            match scope.input(While::INPUT_CONDITION).and_then(Value::as_bool) {
                Some(true) => {
                    scope.trigger(While::TRIGGER_BODY);
                }
                Some(false) => return Some(While::EXIT_DONE),
                None => return None,
            }
        }
    }
}
