use serde::{Deserialize, Serialize};

use crate::pin::PinId;

/// Directed connection from an output pin to an input pin.
///
/// A wire has no state of its own: whatever it shows is read off its
/// source pin through [`crate::CircuitManager::pin_state`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wire {
    #[serde(rename = "src")]
    pub source: PinId,
    #[serde(rename = "dest")]
    pub dest: PinId,
}

impl Wire {
    pub fn new(source: PinId, dest: PinId) -> Self {
        Wire { source, dest }
    }

    pub fn touches(&self, pin: PinId) -> bool {
        self.source == pin || self.dest == pin
    }
}
