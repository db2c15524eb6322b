//! Equality test node
//!
//! Compares two values of any type and produces a boolean. Pure data
//! node: it has no trigger exits and is pull-executed on demand by
//! whoever reads its output.

use graph_engine::{Behavior, BehaviorFactory, NodeSpec, Scope, TypeTag, Value};

/// The `"=="` node type.
///
/// Two values compare equal when their payloads are equal; two *absent*
/// values also compare equal (absent ≡ absent), while an absent value
/// never equals a present one.
pub struct Equals;

impl Equals {
    pub const TYPE_NAME: &'static str = "==";
    pub const INPUT_A: u8 = 0;
    pub const INPUT_B: u8 = 1;
    pub const OUTPUT_VALUE: u8 = 0;

    pub fn spec() -> NodeSpec {
        let mut spec = NodeSpec::new(Self::TYPE_NAME, false);
        spec.add_input("A", TypeTag::Any);
        spec.add_input("B", TypeTag::Any);
        spec.add_output("Value", TypeTag::Bool);
        spec
    }
}

impl BehaviorFactory for Equals {
    fn create(&self) -> Option<Box<dyn Behavior>> {
        Some(Box::new(EqualsBehavior))
    }
}

struct EqualsBehavior;

impl Behavior for EqualsBehavior {
    fn execute(&mut self, scope: &mut Scope<'_>) -> Option<u8> {
        let equal = match (scope.input(Equals::INPUT_A), scope.input(Equals::INPUT_B)) {
            (Some(a), Some(b)) => a == b,
            (None, None) => true,
            _ => false,
        };
        scope.set_output(Equals::OUTPUT_VALUE, Value::Bool(equal));
        None
    }
}
