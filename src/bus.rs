//! Groups of Switches and pins read and written as integers, bit 0 first.

use std::ops::{BitAnd, Shl};

use num_traits::Unsigned;

use crate::{
    circuit::{CircuitManager, ComponentId},
    pin::{PinId, PinState},
    propagation::Propagation,
};

/// `BITS` Switches driven together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwitchBus<const BITS: usize>(pub [ComponentId; BITS]);

impl<const BITS: usize> SwitchBus<BITS> {
    /// Sets every Switch from the bits of `val`, then settles once.
    pub fn set<T>(&self, circuit: &mut CircuitManager, val: T) -> Propagation
    where
        T: Unsigned + Copy + BitAnd<T, Output = T> + Shl<usize, Output = T>,
    {
        for (bit, id) in self.0.iter().copied().enumerate() {
            let bit_val = !(val & (T::one() << bit)).is_zero();
            circuit.set_switch_directly(id, bit_val);
        }
        circuit.propagate()
    }

    /// What the Switches are set to.
    pub fn get<T>(&self, circuit: &CircuitManager) -> T
    where
        T: Unsigned + Shl<usize, Output = T>,
    {
        let mut sum = T::zero();
        for (bit, id) in self.0.iter().copied().enumerate() {
            let on = circuit.component(id).and_then(|c| c.switch_state());
            if on == Some(true) {
                sum = sum + (T::one() << bit);
            }
        }
        sum
    }
}

/// `BITS` pins read together, typically LED inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedBus<const BITS: usize>(pub [PinId; BITS]);

impl<const BITS: usize> LedBus<BITS> {
    /// `None` if any bit floats.
    pub fn read<T>(&self, circuit: &CircuitManager) -> Option<T>
    where
        T: Unsigned + Shl<usize, Output = T>,
    {
        let mut sum = T::zero();
        for (bit, pin) in self.0.iter().copied().enumerate() {
            match circuit.pin_state(pin) {
                PinState::High => sum = sum + (T::one() << bit),
                PinState::Low => (),
                PinState::Floating => return None,
            }
        }
        Some(sum)
    }
}

pub trait Signed<T> {
    fn read_signed(&self, circuit: &CircuitManager) -> Option<T>;
}

macro_rules! read_signed {
    ( $bits:expr, $i:ty, $u:ty ) => {
        impl Signed<$i> for LedBus<$bits> {
            fn read_signed(&self, circuit: &CircuitManager) -> Option<$i> {
                self.read::<$u>(circuit).map(|val| val as $i)
            }
        }
    };
}

read_signed!(8, i8, u8);
read_signed!(16, i16, u16);
read_signed!(32, i32, u32);
read_signed!(64, i64, u64);
