pub mod adder;
pub mod gate;
pub mod mux;

use serde::{Deserialize, Serialize};

use crate::{
    error::LoadError,
    pin::{PinAllocator, PinId, PinState},
    subcircuit::SubCircuit,
};

pub use gate::Gate;

/// Type tag of a component, as written to saved circuits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Kind {
    And,
    Or,
    Not,
    Nand,
    Nor,
    Xor,
    Xnor,
    Mux,
    Demux,
    Decoder,
    Encoder,
    Switch,
    Led,
    #[serde(rename = "SEVEN_SEGMENT")]
    SevenSegment,
    SubCircuit,
}

impl Kind {
    pub fn gate(self) -> Option<Gate> {
        Some(match self {
            Kind::And => Gate::And,
            Kind::Or => Gate::Or,
            Kind::Not => Gate::Not,
            Kind::Nand => Gate::Nand,
            Kind::Nor => Gate::Nor,
            Kind::Xor => Gate::Xor,
            Kind::Xnor => Gate::Xnor,
            Kind::Mux => Gate::Mux,
            Kind::Demux => Gate::Demux,
            Kind::Decoder => Gate::Decoder,
            Kind::Encoder => Gate::Encoder,
            Kind::Switch | Kind::Led | Kind::SevenSegment | Kind::SubCircuit => return None,
        })
    }

    /// Fixed (input, output) pin counts. Sub-circuits have none.
    pub fn pin_counts(self) -> Option<(usize, usize)> {
        match self {
            Kind::Switch => Some((0, 1)),
            Kind::Led => Some((1, 0)),
            Kind::SevenSegment => Some((7, 0)),
            Kind::SubCircuit => None,
            _ => self.gate().map(Gate::pin_counts),
        }
    }

    /// Footprint on the canvas. Sub-circuits size themselves from their pins.
    pub fn size(self) -> Size {
        let (width, height) = match self {
            Kind::And => (60, 60),
            Kind::Or => (70, 60),
            Kind::Not => (50, 40),
            Kind::Nand => (70, 60),
            Kind::Nor => (80, 60),
            Kind::Xor => (70, 60),
            Kind::Xnor => (80, 60),
            Kind::Mux | Kind::Demux => (60, 80),
            Kind::Decoder | Kind::Encoder => (60, 100),
            Kind::Switch | Kind::Led => (30, 30),
            Kind::SevenSegment => (52, 86),
            Kind::SubCircuit => return SubCircuit::size_for(0, 0),
        };
        Size { width, height }
    }

    /// Tag name, used as the default label of gates.
    pub fn name(self) -> &'static str {
        match self {
            Kind::And => "AND",
            Kind::Or => "OR",
            Kind::Not => "NOT",
            Kind::Nand => "NAND",
            Kind::Nor => "NOR",
            Kind::Xor => "XOR",
            Kind::Xnor => "XNOR",
            Kind::Mux => "MUX",
            Kind::Demux => "DEMUX",
            Kind::Decoder => "DECODER",
            Kind::Encoder => "ENCODER",
            Kind::Switch => "SWITCH",
            Kind::Led => "LED",
            Kind::SevenSegment => "SEVEN_SEGMENT",
            Kind::SubCircuit => "SUB_CIRCUIT",
        }
    }
}

impl From<Gate> for Kind {
    fn from(gate: Gate) -> Self {
        match gate {
            Gate::And => Kind::And,
            Gate::Or => Kind::Or,
            Gate::Not => Kind::Not,
            Gate::Nand => Kind::Nand,
            Gate::Nor => Kind::Nor,
            Gate::Xor => Kind::Xor,
            Gate::Xnor => Kind::Xnor,
            Gate::Mux => Kind::Mux,
            Gate::Demux => Kind::Demux,
            Gate::Decoder => Kind::Decoder,
            Gate::Encoder => Kind::Encoder,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(position: Position, size: Size) -> Self {
        Rect {
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// True when the interiors overlap. Rectangles sharing only an edge do
    /// not intersect, and empty rectangles intersect nothing.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Rect {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }

    pub fn center(&self) -> Position {
        Position::new(self.x + self.width / 2, self.y + self.height / 2)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Clone, Debug)]
pub(crate) enum Body {
    Gate { gate: Gate, outputs: Vec<PinState> },
    Switch { on: bool },
    Led { state: PinState },
    SevenSegment { segments: [PinState; 7] },
    SubCircuit(Box<SubCircuit>),
}

/// One placed part: a primitive or a sub-circuit.
///
/// The pin lists are ordered and the order carries meaning (a MUX is
/// `[A, B, Select]`). A component keeps its pins, and their directions,
/// for its whole lifetime.
#[derive(Clone, Debug)]
pub struct Component {
    label: String,
    position: Position,
    size: Size,
    inputs: Vec<PinId>,
    outputs: Vec<PinId>,
    body: Body,
}

impl Component {
    fn with_pins(
        kind: Kind,
        label: &str,
        position: Position,
        inputs: Vec<PinId>,
        outputs: Vec<PinId>,
        body: Body,
    ) -> Self {
        Component {
            label: label.to_string(),
            position,
            size: kind.size(),
            inputs,
            outputs,
            body,
        }
    }

    fn fresh_pins(count: usize, pins: &mut PinAllocator) -> Vec<PinId> {
        (0..count).map(|_| pins.next()).collect()
    }

    pub fn gate(gate: Gate, label: &str, position: Position, pins: &mut PinAllocator) -> Self {
        let (n_in, n_out) = gate.pin_counts();
        let inputs = Self::fresh_pins(n_in, pins);
        let outputs = Self::fresh_pins(n_out, pins);
        Self::gate_with_pins(gate, label, position, inputs, outputs)
    }

    /// An AND/OR/XOR-family gate with `inputs` inputs instead of the
    /// standard two.
    pub fn wide_gate(
        gate: Gate,
        inputs: usize,
        label: &str,
        position: Position,
        pins: &mut PinAllocator,
    ) -> Self {
        assert!(gate.is_variadic() && inputs > 0, "{gate:?} cannot take {inputs} inputs");
        let inputs = Self::fresh_pins(inputs, pins);
        let outputs = vec![pins.next()];
        Self::gate_with_pins(gate, label, position, inputs, outputs)
    }

    fn gate_with_pins(
        gate: Gate,
        label: &str,
        position: Position,
        inputs: Vec<PinId>,
        outputs: Vec<PinId>,
    ) -> Self {
        let body = Body::Gate {
            gate,
            outputs: vec![PinState::Floating; outputs.len()],
        };
        Self::with_pins(gate.into(), label, position, inputs, outputs, body)
    }

    /// A switch starts off (LOW).
    pub fn switch(label: &str, position: Position, pins: &mut PinAllocator) -> Self {
        let outputs = vec![pins.next()];
        let body = Body::Switch { on: false };
        Self::with_pins(Kind::Switch, label, position, Vec::new(), outputs, body)
    }

    pub fn led(label: &str, position: Position, pins: &mut PinAllocator) -> Self {
        let inputs = vec![pins.next()];
        let body = Body::Led {
            state: PinState::Floating,
        };
        Self::with_pins(Kind::Led, label, position, inputs, Vec::new(), body)
    }

    pub fn seven_segment(label: &str, position: Position, pins: &mut PinAllocator) -> Self {
        let inputs = Self::fresh_pins(7, pins);
        let body = Body::SevenSegment {
            segments: [PinState::Low; 7],
        };
        Self::with_pins(Kind::SevenSegment, label, position, inputs, Vec::new(), body)
    }

    /// Places a fresh primitive of `kind`. Sub-circuits are never created
    /// this way, they come from a selection or a saved definition.
    pub fn primitive(
        kind: Kind,
        label: &str,
        position: Position,
        pins: &mut PinAllocator,
    ) -> Option<Self> {
        match kind {
            Kind::Switch => Some(Self::switch(label, position, pins)),
            Kind::Led => Some(Self::led(label, position, pins)),
            Kind::SevenSegment => Some(Self::seven_segment(label, position, pins)),
            Kind::SubCircuit => None,
            _ => kind.gate().map(|gate| Self::gate(gate, label, position, pins)),
        }
    }

    /// Rebuilds a saved primitive around its original pin ids.
    pub fn restore(
        kind: Kind,
        label: &str,
        position: Position,
        inputs: Vec<PinId>,
        outputs: Vec<PinId>,
    ) -> Result<Self, LoadError> {
        let expected = kind
            .pin_counts()
            .ok_or_else(|| LoadError::MissingDefinition(label.to_string()))?;
        let found = (inputs.len(), outputs.len());
        let variadic = kind.gate().is_some_and(Gate::is_variadic);
        let fits = if variadic {
            found.0 > 0 && found.1 == expected.1
        } else {
            found == expected
        };
        if !fits {
            return Err(LoadError::PinCount { kind, expected, found });
        }
        let body = match kind {
            Kind::Switch => Body::Switch { on: false },
            Kind::Led => Body::Led {
                state: PinState::Floating,
            },
            Kind::SevenSegment => Body::SevenSegment {
                segments: [PinState::Low; 7],
            },
            _ => match kind.gate() {
                Some(gate) => {
                    return Ok(Self::gate_with_pins(gate, label, position, inputs, outputs))
                }
                None => return Err(LoadError::MissingDefinition(label.to_string())),
            },
        };
        Ok(Self::with_pins(kind, label, position, inputs, outputs, body))
    }

    pub(crate) fn from_subcircuit(
        label: &str,
        position: Position,
        inputs: Vec<PinId>,
        outputs: Vec<PinId>,
        subcircuit: SubCircuit,
    ) -> Self {
        Component {
            label: label.to_string(),
            position,
            size: SubCircuit::size_for(inputs.len(), outputs.len()),
            inputs,
            outputs,
            body: Body::SubCircuit(Box::new(subcircuit)),
        }
    }

    pub fn kind(&self) -> Kind {
        match &self.body {
            Body::Gate { gate, .. } => (*gate).into(),
            Body::Switch { .. } => Kind::Switch,
            Body::Led { .. } => Kind::Led,
            Body::SevenSegment { .. } => Kind::SevenSegment,
            Body::SubCircuit(_) => Kind::SubCircuit,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.position, self.size)
    }

    pub fn inputs(&self) -> &[PinId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[PinId] {
        &self.outputs
    }

    pub fn pins(&self) -> impl Iterator<Item = PinId> + '_ {
        self.inputs.iter().chain(self.outputs.iter()).copied()
    }

    /// Direction and list index of `pin`, if this component owns it.
    pub fn pin_slot(&self, pin: PinId) -> Option<(Direction, usize)> {
        if let Some(index) = self.inputs.iter().position(|p| *p == pin) {
            return Some((Direction::Input, index));
        }
        self.outputs
            .iter()
            .position(|p| *p == pin)
            .map(|index| (Direction::Output, index))
    }

    /// Current state of output `index`. Sinks and out-of-range indices
    /// float.
    pub fn output_state(&self, index: usize) -> PinState {
        match &self.body {
            Body::Gate { outputs, .. } => outputs.get(index).copied().unwrap_or_default(),
            Body::Switch { on } => PinState::from_bool(*on),
            Body::Led { .. } | Body::SevenSegment { .. } => PinState::Floating,
            Body::SubCircuit(subcircuit) => subcircuit.output_state(index),
        }
    }

    /// Recomputes outputs (or displayed state, for sinks) from the current
    /// input states, given in input pin order. Returns whether anything
    /// visible changed.
    pub fn update(&mut self, inputs: &[PinState]) -> bool {
        match &mut self.body {
            Body::Gate { gate, outputs } => {
                let mut next = vec![PinState::Floating; outputs.len()];
                gate.eval(inputs, &mut next);
                let changed = *outputs != next;
                *outputs = next;
                changed
            }
            // Only set_switch moves a switch.
            Body::Switch { .. } => false,
            Body::Led { state } => {
                let Some(next) = inputs.first().copied() else {
                    return false;
                };
                let changed = *state != next;
                *state = next;
                changed
            }
            Body::SevenSegment { segments } => {
                let mut changed = false;
                for (segment, next) in segments.iter_mut().zip(inputs) {
                    changed |= *segment != *next;
                    *segment = *next;
                }
                changed
            }
            Body::SubCircuit(subcircuit) => subcircuit.update(inputs),
        }
    }

    pub fn switch_state(&self) -> Option<bool> {
        match self.body {
            Body::Switch { on } => Some(on),
            _ => None,
        }
    }

    /// Sets a switch, returning its previous state. `None` if this is not a
    /// switch.
    pub(crate) fn set_switch(&mut self, on: bool) -> Option<bool> {
        match &mut self.body {
            Body::Switch { on: current } => Some(std::mem::replace(current, on)),
            _ => None,
        }
    }

    /// What an LED currently shows.
    pub fn led_state(&self) -> Option<PinState> {
        match self.body {
            Body::Led { state } => Some(state),
            _ => None,
        }
    }

    /// Segments a..g of a seven-segment display.
    pub fn segments(&self) -> Option<[PinState; 7]> {
        match self.body {
            Body::SevenSegment { segments } => Some(segments),
            _ => None,
        }
    }

    pub fn as_subcircuit(&self) -> Option<&SubCircuit> {
        match &self.body {
            Body::SubCircuit(subcircuit) => Some(subcircuit),
            _ => None,
        }
    }

    /// External pin of a sub-circuit standing in for the internal switch
    /// output or LED input `internal`.
    pub fn external_pin_for(&self, internal: PinId) -> Option<PinId> {
        let subcircuit = self.as_subcircuit()?;
        if let Some(index) = subcircuit.input_map().iter().position(|p| *p == internal) {
            return self.inputs.get(index).copied();
        }
        subcircuit
            .output_map()
            .iter()
            .position(|p| *p == internal)
            .and_then(|index| self.outputs.get(index).copied())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fresh_components_take_fresh_pins() {
        let mut pins = PinAllocator::new();
        let mux = Component::gate(Gate::Mux, "MUX", Position::default(), &mut pins);
        let led = Component::led("L1", Position::new(100, 0), &mut pins);
        assert_eq!(mux.inputs().len(), 3);
        assert_eq!(mux.outputs().len(), 1);
        assert_eq!(led.inputs().len(), 1);
        assert!(led.outputs().is_empty());
        let mut all: Vec<PinId> = mux.pins().chain(led.pins()).collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 5);
        assert_eq!(mux.pin_slot(mux.inputs()[2]), Some((Direction::Input, 2)));
        assert_eq!(led.pin_slot(mux.inputs()[2]), None);
    }

    #[test]
    fn restore_checks_pin_counts() {
        let origin = Position::default();
        let err = Component::restore(Kind::Decoder, "DECODER", origin, vec![PinId(1)], vec![]);
        assert!(matches!(err, Err(LoadError::PinCount { kind: Kind::Decoder, .. })));
        let ok = Component::restore(Kind::Not, "NOT", origin, vec![PinId(1)], vec![PinId(2)]);
        assert_eq!(ok.map(|c| c.kind()).ok(), Some(Kind::Not));
    }

    #[test]
    fn switch_ignores_update() {
        let mut pins = PinAllocator::new();
        let mut switch = Component::switch("S1", Position::default(), &mut pins);
        assert_eq!(switch.output_state(0), PinState::Low);
        assert_eq!(switch.set_switch(true), Some(false));
        assert!(!switch.update(&[]));
        assert_eq!(switch.output_state(0), PinState::High);
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let size = Size { width: 30, height: 30 };
        let a = Rect::new(Position::new(0, 0), size);
        let b = Rect::new(Position::new(30, 0), size);
        let c = Rect::new(Position::new(29, 29), size);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert_eq!(a.union(&b).width, 60);
    }
}
