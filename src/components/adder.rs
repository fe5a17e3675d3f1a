use std::{cell::RefCell, sync::Arc};

use crate::{
    builder::{self, ops::*, CircuitBuilder, NoHooks},
    bus::{LedBus, SwitchBus},
    circuit::ComponentId,
    pin::PinId,
};

type Connector = builder::Connector<NoHooks>;

struct Adder {
    sum: Connector,
    cout: Connector,
}

fn adder(a: Connector, b: Connector, cin: Connector) -> Adder {
    let sum = xor!(a, b, cin);
    let cout = or!(and!(a, b), and!(a, cin), and!(b, cin));
    Adder { sum, cout }
}

/// A ripple-carry adder of Switches, gates and LEDs. Every bit of `sum`
/// and `cout` is shown on an LED, so the whole adder can be packed into a
/// sub-circuit.
pub struct RippleCarryAdder<const BITS: usize> {
    pub input_a: SwitchBus<BITS>,
    pub input_b: SwitchBus<BITS>,
    pub cin: ComponentId,
    pub sum: LedBus<BITS>,
    pub cout: PinId,
}

impl<const BITS: usize> RippleCarryAdder<BITS> {
    pub fn new(builder: Arc<RefCell<CircuitBuilder>>) -> RippleCarryAdder<BITS> {
        assert!(BITS > 0);

        let (mut carry, cin) = Connector::input(builder.clone());
        let mut input_a = Vec::with_capacity(BITS);
        let mut input_b = Vec::with_capacity(BITS);
        let mut sum = Vec::with_capacity(BITS);
        for _ in 0..BITS {
            let (a, a_id) = Connector::input(builder.clone());
            let (b, b_id) = Connector::input(builder.clone());
            input_a.push(a_id);
            input_b.push(b_id);
            let Adder { sum: bit, cout } = adder(a, b, carry);
            sum.push(bit.led());
            carry = cout;
        }
        RippleCarryAdder {
            input_a: SwitchBus(std::array::from_fn(|i| input_a[i])),
            input_b: SwitchBus(std::array::from_fn(|i| input_b[i])),
            cin,
            sum: LedBus(std::array::from_fn(|i| sum[i])),
            cout: carry.led(),
        }
    }
}

#[cfg(test)]
mod test {
    use rand::RngCore;

    use crate::{
        builder::{CircuitBuilder, Connector},
        circuit::CircuitManager,
        pin::PinState::{self, *},
        subcircuit::create_subcircuit,
    };
    use std::{cell::RefCell, sync::Arc};

    use super::{adder, RippleCarryAdder};

    fn test_adder(a: bool, b: bool, cin: bool) {
        let builder = Arc::new(RefCell::new(CircuitBuilder::default()));
        let (ca, ia) = Connector::input(builder.clone());
        let (cb, ib) = Connector::input(builder.clone());
        let (ccin, icin) = Connector::input(builder.clone());
        let adder = adder(ca, cb, ccin);
        {
            let mut borrow = builder.borrow_mut();
            let (circuit, _) = borrow.build();
            circuit.set_switch(ia, a);
            circuit.set_switch(ib, b);
            circuit.set_switch(icin, cin);
        }
        assert_eq!(adder.sum.get_output(), PinState::from_bool(a ^ b ^ cin));
        assert_eq!(
            adder.cout.get_output(),
            PinState::from_bool((a && b) || (a && cin) || (b && cin))
        )
    }

    #[test]
    fn adder_tests() {
        test_adder(false, false, false);
        test_adder(true, false, false);
        test_adder(false, true, false);
        test_adder(true, true, false);
        test_adder(false, false, true);
        test_adder(true, false, true);
        test_adder(false, true, true);
        test_adder(true, true, true);
    }

    fn test_rca_add<const BITS: usize>(
        circuit: &mut CircuitManager,
        rca: &RippleCarryAdder<BITS>,
        a: u64,
        b: u64,
    ) {
        let overflow = 1 << BITS;
        assert!(a < overflow && b < overflow);

        rca.input_a.set(circuit, a);
        assert!(rca.input_b.set(circuit, b).converged());

        let expected_sum = a + b;
        let (expected_sum, expected_cout) = if expected_sum < overflow {
            (expected_sum, false)
        } else {
            (expected_sum - overflow, true)
        };

        let sum = rca.sum.read::<u64>(circuit);
        let cout = circuit.pin_state(rca.cout);

        assert_eq!(sum, Some(expected_sum), "{a} + {b} = {expected_sum}");
        assert_eq!(
            cout,
            PinState::from_bool(expected_cout),
            "{a} + {b} with {BITS} bits has cout: {expected_cout}"
        );
    }

    #[test]
    fn rca_tests() {
        let builder = Arc::new(RefCell::new(CircuitBuilder::default()));
        let rca = RippleCarryAdder::<16>::new(builder.clone());
        let mut borrow = builder.borrow_mut();
        let (circuit, _) = borrow.build();
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let a = rng.next_u32() as u16;
            let b = rng.next_u32() as u16;
            test_rca_add(circuit, &rca, a as u64, b as u64);
        }
    }

    #[test]
    fn packed_adder_adds() {
        let builder = Arc::new(RefCell::new(CircuitBuilder::default()));
        RippleCarryAdder::<4>::new(builder.clone());
        let mut borrow = builder.borrow_mut();
        let parts = &mut *borrow;
        let all: Vec<_> = parts.circuit.components().map(|(id, _)| id).collect();
        let block = create_subcircuit(&mut parts.circuit, &mut parts.pins, &all, "ADD4");
        let mut component = parts.circuit.component(block.unwrap()).unwrap().clone();
        // cin, then a/b interleaved per bit; sum bits then cout.
        assert_eq!(component.inputs().len(), 9);
        assert_eq!(component.outputs().len(), 5);

        let mut inputs = vec![PinState::Low; 9];
        inputs[1] = PinState::High; // a0
        inputs[3] = PinState::High; // a1
        inputs[2] = PinState::High; // b0
        component.update(&inputs);
        // 3 + 1 = 4
        let outputs: Vec<_> = (0..5).map(|i| component.output_state(i)).collect();
        assert_eq!(outputs, vec![Low, Low, High, Low, Low]);
    }
}
