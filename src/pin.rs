use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one connection point on one component.
///
/// Ids come from a [`PinAllocator`] and are never reused. Within one circuit
/// level every pin id is unique.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinId(pub u32);

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tri-valued logic level carried by a pin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinState {
    High,
    Low,
    /// Undriven or unknown.
    #[default]
    Floating,
}

impl PinState {
    pub fn from_bool(val: bool) -> Self {
        if val {
            PinState::High
        } else {
            PinState::Low
        }
    }

    /// `None` for [`PinState::Floating`].
    pub fn to_bool(self) -> Option<bool> {
        match self {
            PinState::High => Some(true),
            PinState::Low => Some(false),
            PinState::Floating => None,
        }
    }

    pub fn is_high(self) -> bool {
        self == PinState::High
    }

    pub fn is_floating(self) -> bool {
        self == PinState::Floating
    }

    /// HIGH and LOW swap, FLOATING stays FLOATING.
    pub fn invert(self) -> Self {
        match self {
            PinState::High => PinState::Low,
            PinState::Low => PinState::High,
            PinState::Floating => PinState::Floating,
        }
    }

    /// Truth-table cell: `'1'`, `'0'` or `'Z'`.
    pub fn symbol(self) -> char {
        match self {
            PinState::High => '1',
            PinState::Low => '0',
            PinState::Floating => 'Z',
        }
    }
}

impl From<bool> for PinState {
    fn from(val: bool) -> Self {
        PinState::from_bool(val)
    }
}

impl fmt::Display for PinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PinState::High => "HIGH",
            PinState::Low => "LOW",
            PinState::Floating => "FLOATING",
        };
        f.write_str(name)
    }
}

/// Hands out fresh pin ids. Owned by the session, only ever moves forward.
#[derive(Debug, Clone)]
pub struct PinAllocator {
    next: u32,
}

impl Default for PinAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PinAllocator {
    pub fn new() -> Self {
        PinAllocator { next: 1 }
    }

    pub fn next(&mut self) -> PinId {
        let pin = PinId(self.next);
        self.next = self
            .next
            .checked_add(1)
            .unwrap_or_else(|| panic!("Ran out of pin ids"));
        pin
    }

    /// Makes sure no later allocation returns `pin` or anything below it.
    pub fn advance_past(&mut self, pin: PinId) {
        if pin.0 >= self.next {
            self.next = pin.0.saturating_add(1);
        }
    }

    /// The id the next call to [`PinAllocator::next`] will return.
    pub fn peek(&self) -> PinId {
        PinId(self.next)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn allocator_is_monotonic() {
        let mut pins = PinAllocator::new();
        let a = pins.next();
        let b = pins.next();
        assert!(b > a);

        pins.advance_past(PinId(40));
        assert_eq!(pins.next(), PinId(41));

        // Advancing backwards is a no-op.
        pins.advance_past(PinId(3));
        assert_eq!(pins.next(), PinId(42));
    }

    #[test]
    fn state_helpers() {
        assert_eq!(PinState::High.invert(), PinState::Low);
        assert_eq!(PinState::Floating.invert(), PinState::Floating);
        assert_eq!(PinState::from(true), PinState::High);
        assert_eq!(PinState::Floating.to_bool(), None);
        assert_eq!(PinState::default(), PinState::Floating);
        let cells: String = [PinState::High, PinState::Low, PinState::Floating]
            .iter()
            .map(|s| s.symbol())
            .collect();
        assert_eq!(cells, "10Z");
    }
}
