//! Circuits packaged as components.
//!
//! A [`SubCircuit`] owns a complete nested [`CircuitManager`]. Its external
//! inputs drive the internal Switches and its external outputs read the
//! internal LEDs, so from the outside it behaves like any primitive.

pub mod extract;

use log::warn;

use crate::{
    circuit::CircuitManager,
    components::{Component, Kind, Position, Rect, Size},
    pin::{PinAllocator, PinId, PinState},
    propagation::PropagationEngine,
    wire::Wire,
};

pub use extract::create_subcircuit;

#[derive(Clone, Debug)]
pub struct SubCircuit {
    circuit: CircuitManager,
    // Internal Switch output per external input, in external pin order.
    input_map: Vec<PinId>,
    // Internal LED input per external output, in external pin order.
    output_map: Vec<PinId>,
    output_states: Vec<PinState>,
}

impl SubCircuit {
    pub const WIDTH: i32 = 120;
    pub const MIN_HEIGHT: i32 = 60;
    pub const PIN_SPACING: i32 = 25;

    /// Footprint of a block with the given pin counts.
    pub fn size_for(inputs: usize, outputs: usize) -> Size {
        let pins = inputs.max(outputs) as i32;
        Size {
            width: Self::WIDTH,
            height: Self::MIN_HEIGHT.max(pins * Self::PIN_SPACING),
        }
    }

    pub(crate) fn new(
        circuit: CircuitManager,
        input_map: Vec<PinId>,
        output_map: Vec<PinId>,
    ) -> Self {
        let output_states = vec![PinState::Floating; output_map.len()];
        SubCircuit {
            circuit,
            input_map,
            output_map,
            output_states,
        }
    }

    /// Packs `components` and the `wires` between them into one block.
    ///
    /// Every Switch becomes an external input and every LED an external
    /// output, in the order given. The block is centred on the area the
    /// components used to cover. The inner circuit runs on `engine`.
    pub fn encapsulate(
        label: &str,
        components: Vec<Component>,
        wires: &[Wire],
        pins: &mut PinAllocator,
        engine: PropagationEngine,
    ) -> Component {
        let mut bounds: Option<Rect> = None;
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        let mut input_map = Vec::new();
        let mut output_map = Vec::new();
        let mut circuit = CircuitManager::with_engine(engine);

        for component in components {
            let rect = component.bounds();
            bounds = Some(match bounds {
                Some(bounds) if !bounds.is_empty() => bounds.union(&rect),
                _ => rect,
            });
            match component.kind() {
                Kind::Switch => {
                    inputs.push(pins.next());
                    input_map.extend(component.outputs().first());
                }
                Kind::Led => {
                    outputs.push(pins.next());
                    output_map.extend(component.inputs().first());
                }
                _ => (),
            }
            circuit.add_component_directly(component);
        }
        for wire in wires {
            if let Err(err) = circuit.add_wire_directly(*wire) {
                warn!("Dropped wire {} -> {} while encapsulating: {err}", wire.source, wire.dest);
            }
        }
        circuit.propagate();

        let size = Self::size_for(inputs.len(), outputs.len());
        let center = bounds.map(|b| b.center()).unwrap_or_default();
        let position = Position::new(center.x - size.width / 2, center.y - size.height / 2);
        let subcircuit = SubCircuit::new(circuit, input_map, output_map);
        Component::from_subcircuit(label, position, inputs, outputs, subcircuit)
    }

    pub fn circuit(&self) -> &CircuitManager {
        &self.circuit
    }

    pub fn input_map(&self) -> &[PinId] {
        &self.input_map
    }

    pub fn output_map(&self) -> &[PinId] {
        &self.output_map
    }

    pub fn output_state(&self, index: usize) -> PinState {
        self.output_states.get(index).copied().unwrap_or_default()
    }

    /// Labels of the internal Switches, one per external input.
    pub fn input_labels(&self) -> Vec<&str> {
        self.labels(&self.input_map)
    }

    /// Labels of the internal LEDs, one per external output.
    pub fn output_labels(&self) -> Vec<&str> {
        self.labels(&self.output_map)
    }

    fn labels<'a>(&'a self, internal: &[PinId]) -> Vec<&'a str> {
        internal
            .iter()
            .map(|pin| {
                self.circuit
                    .owner_of(*pin)
                    .and_then(|id| self.circuit.component(id))
                    .map_or("", |component| component.label())
            })
            .collect()
    }

    /// Drives the internal Switches from `inputs`, settles the inner circuit
    /// and latches what the internal LEDs see.
    ///
    /// A Switch cannot float, so a FLOATING input arrives as LOW.
    pub(crate) fn update(&mut self, inputs: &[PinState]) -> bool {
        for (internal, state) in self.input_map.iter().zip(inputs) {
            if let Some(id) = self.circuit.owner_of(*internal) {
                self.circuit.set_switch_directly(id, state.is_high());
            }
        }
        self.circuit.propagate();

        let mut changed = false;
        for (state, internal) in self.output_states.iter_mut().zip(&self.output_map) {
            let next = self.circuit.pin_state(*internal);
            changed |= *state != next;
            *state = next;
        }
        changed
    }
}
