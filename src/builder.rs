use std::{cell::RefCell, sync::Arc};

use crate::{
    circuit::{CircuitManager, ComponentId},
    components::{Component, Gate, Kind, Position},
    pin::{PinAllocator, PinId, PinState},
    wire::Wire,
};

pub trait BuilderHooks: Default {
    fn create_component_hook(&mut self, _id: ComponentId, _component: &Component) {}
    fn connect_hook(&mut self, _wire: Wire) {}

    type MarkPinArgs;
    fn mark_pin(&mut self, _pin: PinId, _args: Self::MarkPinArgs) {}
}

#[derive(Default)]
pub struct NoHooks;
impl BuilderHooks for NoHooks {
    type MarkPinArgs = ();
}

pub type CircuitBuilder = CircuitBuilderWithHooks<NoHooks>;

/// Builds circuits in code. Components are laid out on a grid in creation
/// order, and nothing is propagated until [`CircuitBuilderWithHooks::build`].
#[derive(Default)]
pub struct CircuitBuilderWithHooks<T: BuilderHooks> {
    pub circuit: CircuitManager,
    pub pins: PinAllocator,
    hooks: T,
    placed: i32,
}

impl<T: BuilderHooks> CircuitBuilderWithHooks<T> {
    const COLUMNS: i32 = 16;
    const CELL_WIDTH: i32 = 100;
    const CELL_HEIGHT: i32 = 120;

    fn next_position(&mut self) -> Position {
        let cell = self.placed;
        self.placed += 1;
        Position::new(
            (cell % Self::COLUMNS) * Self::CELL_WIDTH,
            (cell / Self::COLUMNS) * Self::CELL_HEIGHT,
        )
    }

    fn create(&mut self, component: Component) -> ComponentId {
        let id = self.circuit.add_component_directly(component);
        if let Some(component) = self.circuit.component(id) {
            self.hooks.create_component_hook(id, component);
        }
        id
    }

    fn create_gate(&mut self, gate: Gate, inputs: usize) -> (ComponentId, Vec<PinId>, PinId) {
        let position = self.next_position();
        let label = Kind::from(gate).name();
        let component = if gate.pin_counts().0 == inputs {
            Component::gate(gate, label, position, &mut self.pins)
        } else {
            Component::wide_gate(gate, inputs, label, position, &mut self.pins)
        };
        let (ins, out) = (component.inputs().to_vec(), component.outputs()[0]);
        (self.create(component), ins, out)
    }

    fn create_switch(&mut self) -> (ComponentId, PinId) {
        let position = self.next_position();
        let label = format!("S{}", self.circuit.switches().count() + 1);
        let component = Component::switch(&label, position, &mut self.pins);
        let output = component.outputs()[0];
        (self.create(component), output)
    }

    fn create_led(&mut self) -> (ComponentId, PinId) {
        let position = self.next_position();
        let label = format!("L{}", self.circuit.leds().count() + 1);
        let component = Component::led(&label, position, &mut self.pins);
        let input = component.inputs()[0];
        (self.create(component), input)
    }

    fn connect(&mut self, source: PinId, dest: PinId) {
        let wire = Wire::new(source, dest);
        self.circuit
            .add_wire_directly(wire)
            .unwrap_or_else(|err| panic!("Cannot wire {source} -> {dest}: {err}"));
        self.hooks.connect_hook(wire);
    }

    fn mark_pin(&mut self, pin: PinId, args: T::MarkPinArgs) {
        self.hooks.mark_pin(pin, args);
    }

    /// Settles the circuit and hands it out.
    pub fn build(&mut self) -> (&mut CircuitManager, &mut T) {
        self.circuit.propagate();
        (&mut self.circuit, &mut self.hooks)
    }
}

/// An output pin of a circuit under construction.
pub struct Connector<T: BuilderHooks> {
    builder: Arc<RefCell<CircuitBuilderWithHooks<T>>>,
    pub output: PinId,
}

impl<T: BuilderHooks> Connector<T> {
    fn from_output(builder: Arc<RefCell<CircuitBuilderWithHooks<T>>>, output: PinId) -> Self {
        Connector { builder, output }
    }

    /// A Switch left off: constant LOW.
    pub fn new(builder: Arc<RefCell<CircuitBuilderWithHooks<T>>>) -> Self {
        Self::input_ignore(builder)
    }

    /// A fresh Switch, with its id for driving it later.
    pub fn input(builder: Arc<RefCell<CircuitBuilderWithHooks<T>>>) -> (Self, ComponentId) {
        let (id, output) = builder.borrow_mut().create_switch();
        (Self::from_output(builder, output), id)
    }

    pub fn input_ignore(builder: Arc<RefCell<CircuitBuilderWithHooks<T>>>) -> Self {
        let (connector, _id) = Self::input(builder);
        connector
    }

    fn gate_gen(gate: Gate, inputs: &[&Self]) -> Self {
        let builder = inputs[0].builder.clone();
        let mut builder_mut = builder.borrow_mut();
        let (_, gate_inputs, output) = builder_mut.create_gate(gate, inputs.len());
        for (input, dest) in inputs.iter().zip(gate_inputs) {
            assert!(Arc::ptr_eq(&builder, &input.builder));
            builder_mut.connect(input.output, dest);
        }
        drop(builder_mut);
        Self::from_output(builder, output)
    }

    pub fn mark(&self, args: T::MarkPinArgs) -> &Self {
        self.builder.borrow_mut().mark_pin(self.output, args);
        self
    }

    pub fn invert(&self) -> Self {
        Self::gate_gen(Gate::Not, &[self])
    }

    /// Hangs an LED on this output, returning the LED's input pin.
    pub fn led(&self) -> PinId {
        let mut builder_mut = self.builder.borrow_mut();
        let (_, input) = builder_mut.create_led();
        builder_mut.connect(self.output, input);
        input
    }

    /// Drives this output if it belongs to a Switch. Takes effect on the
    /// next propagation.
    pub fn set(&self, val: bool) {
        let mut builder_mut = self.builder.borrow_mut();
        if let Some(id) = builder_mut.circuit.owner_of(self.output) {
            builder_mut.circuit.set_switch_directly(id, val);
        }
    }

    pub fn get_output(&self) -> PinState {
        self.builder.borrow().circuit.pin_state(self.output)
    }
}

pub mod ops {
    use crate::components::Gate;

    use super::{BuilderHooks, Connector};

    pub use crate::{and, nand, nor, or, xnor, xor};

    macro_rules! gate_fn_gen {
        ( $gate_lowercase:ident, $gate_uppercase:ident ) => {
            pub fn $gate_lowercase<T: BuilderHooks>(inputs: Vec<&Connector<T>>) -> Connector<T> {
                Connector::gate_gen(Gate::$gate_uppercase, &inputs)
            }
        };
    }

    gate_fn_gen!(or, Or);
    gate_fn_gen!(nor, Nor);
    gate_fn_gen!(and, And);
    gate_fn_gen!(nand, Nand);
    gate_fn_gen!(xor, Xor);
    gate_fn_gen!(xnor, Xnor);

    #[macro_export]
    macro_rules! or {
        ( $( $inputs:expr ),+ ) => {
            or(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! nor {
        ( $( $inputs:expr ),+ ) => {
            nor(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! and {
        ( $( $inputs:expr ),+ ) => {
            and(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! nand {
        ( $( $inputs:expr ),+ ) => {
            nand(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! xor {
        ( $( $inputs:expr ),+ ) => {
            xor(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! xnor {
        ( $( $inputs:expr ),+ ) => {
            xnor(vec!($(&$inputs),+))
        };
    }
}
