//! Tri-state value logic of the combinational primitives.
//!
//! Every function here follows the same rule: an output is driven only
//! when the driven inputs already imply it, whatever the floating inputs
//! might turn out to be. Otherwise the output floats.

use serde::{Deserialize, Serialize};

use crate::pin::PinState::{self, *};

use super::mux;

/// The stateless, purely combinational component kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gate {
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
}

impl Gate {
    pub const ALL: [Gate; 11] = [
        Gate::And,
        Gate::Or,
        Gate::Not,
        Gate::Nand,
        Gate::Nor,
        Gate::Xor,
        Gate::Xnor,
        Gate::Mux,
        Gate::Demux,
        Gate::Decoder,
        Gate::Encoder,
    ];

    /// Number of (input, output) pins of the standard part.
    pub fn pin_counts(self) -> (usize, usize) {
        match self {
            Gate::And | Gate::Or | Gate::Nand | Gate::Nor | Gate::Xor | Gate::Xnor => (2, 1),
            Gate::Not => (1, 1),
            Gate::Mux => (3, 1),
            Gate::Demux => (2, 2),
            Gate::Decoder => (2, 4),
            Gate::Encoder => (4, 3),
        }
    }

    /// Gates that take any number (at least one) of inputs.
    pub fn is_variadic(self) -> bool {
        matches!(
            self,
            Gate::And | Gate::Or | Gate::Nand | Gate::Nor | Gate::Xor | Gate::Xnor
        )
    }

    /// Computes every output from `inputs`, writing into `outputs`.
    ///
    /// `inputs` is in pin order (MUX is `[A, B, Select]`, DEMUX is
    /// `[In, Select]`, Decoder is `[bit0, bit1]`, Encoder is `[I0..I3]`).
    pub fn eval(self, inputs: &[PinState], outputs: &mut [PinState]) {
        match self {
            Gate::And => outputs[0] = and(inputs),
            Gate::Or => outputs[0] = or(inputs),
            Gate::Not => outputs[0] = not(inputs[0]),
            Gate::Nand => outputs[0] = and(inputs).invert(),
            Gate::Nor => outputs[0] = or(inputs).invert(),
            Gate::Xor => outputs[0] = xor(inputs),
            Gate::Xnor => outputs[0] = xor(inputs).invert(),
            Gate::Mux => outputs[0] = mux::mux(inputs[0], inputs[1], inputs[2]),
            Gate::Demux => {
                let (y0, y1) = mux::demux(inputs[0], inputs[1]);
                outputs[0] = y0;
                outputs[1] = y1;
            }
            Gate::Decoder => outputs.copy_from_slice(&mux::decode(inputs[0], inputs[1])),
            Gate::Encoder => {
                let encoded = mux::encode([inputs[0], inputs[1], inputs[2], inputs[3]]);
                outputs.copy_from_slice(&encoded);
            }
        }
    }
}

/// A single LOW forces LOW; otherwise any FLOATING floats.
pub fn and(inputs: &[PinState]) -> PinState {
    if inputs.iter().any(|input| *input == Low) {
        Low
    } else if inputs.iter().any(|input| input.is_floating()) {
        Floating
    } else {
        High
    }
}

/// A single HIGH forces HIGH; otherwise any FLOATING floats.
pub fn or(inputs: &[PinState]) -> PinState {
    if inputs.iter().any(|input| *input == High) {
        High
    } else if inputs.iter().any(|input| input.is_floating()) {
        Floating
    } else {
        Low
    }
}

pub fn not(input: PinState) -> PinState {
    input.invert()
}

/// Odd parity. Parity depends on every input, so one FLOATING floats.
pub fn xor(inputs: &[PinState]) -> PinState {
    let mut parity = false;
    for input in inputs {
        match input {
            High => parity = !parity,
            Low => (),
            Floating => return Floating,
        }
    }
    PinState::from_bool(parity)
}
