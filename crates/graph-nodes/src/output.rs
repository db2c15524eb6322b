//! Output nodes

use graph_engine::{Behavior, BehaviorFactory, NodeSpec, Scope, TypeTag};

/// The `"Print"` node type: write a value to stdout.
///
/// The continuation slot is fired inline, so a print at the end of a
/// chain still counts as executed while a wired successor runs as usual.
pub struct Print;

impl Print {
    pub const TYPE_NAME: &'static str = "Print";
    pub const INPUT_VALUE: u8 = 0;
    pub const TRIGGER_NEXT: u8 = 0;

    pub fn spec() -> NodeSpec {
        let mut spec = NodeSpec::new(Self::TYPE_NAME, true);
        spec.add_trigger("Next");
        spec.add_input("Value", TypeTag::Any);
        spec
    }
}

impl BehaviorFactory for Print {
    fn create(&self) -> Option<Box<dyn Behavior>> {
        Some(Box::new(PrintBehavior))
    }
}

struct PrintBehavior;

impl Behavior for PrintBehavior {
    fn execute(&mut self, scope: &mut Scope<'_>) -> Option<u8> {
        if let Some(value) = scope.input(Print::INPUT_VALUE) {
            println!("{value}");
        }
        scope.trigger(Print::TRIGGER_NEXT);
        None
    }
}
