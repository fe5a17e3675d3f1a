pub mod builder;
pub mod bus;
pub mod command;
pub mod components;
pub mod error;
pub mod persist;
pub mod pin;
pub mod propagation;
pub mod session;
pub mod subcircuit;
pub mod truth_table;
pub mod wire;

mod circuit;
pub use circuit::{CircuitManager, ComponentId, Origin, Removed};
pub use components::{Component, Kind, Position};
pub use pin::{PinAllocator, PinId, PinState};
pub use propagation::{Propagation, PropagationEngine};
pub use session::Simulator;
pub use subcircuit::SubCircuit;
pub use wire::Wire;
