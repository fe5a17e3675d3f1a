use crate::pin::PinState::{self, *};

/// 2-to-1 multiplexer. The selected input passes through verbatim, even
/// when it floats.
pub fn mux(a: PinState, b: PinState, select: PinState) -> PinState {
    match select {
        Low => a,
        High => b,
        Floating => Floating,
    }
}

/// 1-to-2 demultiplexer, returns `(Y0, Y1)`. The unselected output is
/// driven LOW.
pub fn demux(input: PinState, select: PinState) -> (PinState, PinState) {
    if input.is_floating() || select.is_floating() {
        return (Floating, Floating);
    }
    match select {
        Low => (input, Low),
        _ => (Low, input),
    }
}

/// 2-to-4 one-hot decoder. `bit0` is the least significant select bit.
pub fn decode(bit0: PinState, bit1: PinState) -> [PinState; 4] {
    let (Some(b0), Some(b1)) = (bit0.to_bool(), bit1.to_bool()) else {
        return [Floating; 4];
    };
    let selected = (b1 as usize) << 1 | b0 as usize;
    let mut outputs = [Low; 4];
    outputs[selected] = High;
    outputs
}

/// 4-to-2 priority encoder, returns `[Y0, Y1, Valid]`. Input 3 wins.
///
/// With no input HIGH the code floats; `Valid` is LOW only when every
/// input is known to be LOW.
pub fn encode(inputs: [PinState; 4]) -> [PinState; 3] {
    if let Some(index) = (0..4).rev().find(|i| inputs[*i] == High) {
        return [
            PinState::from_bool(index & 1 != 0),
            PinState::from_bool(index & 2 != 0),
            High,
        ];
    }
    if inputs.iter().any(|input| input.is_floating()) {
        [Floating; 3]
    } else {
        [Floating, Floating, Low]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const ALL: [PinState; 3] = [High, Low, Floating];

    #[test]
    fn mux_selects_verbatim() {
        for a in ALL {
            for b in ALL {
                assert_eq!(mux(a, b, Low), a);
                assert_eq!(mux(a, b, High), b);
                assert_eq!(mux(a, b, Floating), Floating);
            }
        }
    }

    #[test]
    fn demux_routes_input() {
        assert_eq!(demux(High, Low), (High, Low));
        assert_eq!(demux(Low, Low), (Low, Low));
        assert_eq!(demux(High, High), (Low, High));
        assert_eq!(demux(Low, High), (Low, Low));
        assert_eq!(demux(Floating, Low), (Floating, Floating));
        assert_eq!(demux(High, Floating), (Floating, Floating));
    }

    #[test]
    fn decoder_is_one_hot() {
        assert_eq!(decode(Low, Low), [High, Low, Low, Low]);
        assert_eq!(decode(High, Low), [Low, High, Low, Low]);
        assert_eq!(decode(Low, High), [Low, Low, High, Low]);
        assert_eq!(decode(High, High), [Low, Low, Low, High]);
        assert_eq!(decode(Floating, High), [Floating; 4]);
        assert_eq!(decode(Low, Floating), [Floating; 4]);
    }

    #[test]
    fn encoder_priority() {
        assert_eq!(encode([High, Low, Low, Low]), [Low, Low, High]);
        assert_eq!(encode([Low, High, Low, Low]), [High, Low, High]);
        assert_eq!(encode([Low, Low, High, Low]), [Low, High, High]);
        assert_eq!(encode([High, High, High, High]), [High, High, High]);
        // A HIGH higher up decides regardless of floating inputs below.
        assert_eq!(encode([Floating, Floating, High, Low]), [Low, High, High]);
        assert_eq!(encode([Low, Floating, Low, Low]), [Floating; 3]);
        assert_eq!(encode([Low; 4]), [Floating, Floating, Low]);
    }
}
