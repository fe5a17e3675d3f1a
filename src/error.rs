use thiserror::Error;

use crate::{components::Kind, pin::PinId, wire::Wire};

/// Reasons a wire between two pins is refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    #[error("Invalid pins")]
    InvalidPins,
    #[error("Cannot connect a component to itself")]
    SelfConnection,
    #[error("Connection must be between an output and an input")]
    DirectionMismatch,
    #[error("Input is already driven")]
    InputAlreadyDriven,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    #[error("Space occupied")]
    SpaceOccupied,
    #[error("No such component")]
    UnknownComponent,
    #[error("{0:?} cannot be placed from the palette")]
    NotPlaceable(Kind),
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Malformed circuit data: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Could not encode circuit: {0}")]
    Serialize(#[from] ron::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{kind:?} expects {expected:?} pins, found {found:?}")]
    PinCount {
        kind: Kind,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("Pin {0} is used more than once")]
    DuplicatePin(PinId),
    #[error("Sub-circuit {0:?} has no internal definition")]
    MissingDefinition(String),
    #[error("Component {0:?} carries a nested definition but is not a sub-circuit")]
    UnexpectedDefinition(String),
    #[error("Sub-circuit {0:?} has pins that do not match its internal switches and LEDs")]
    BoundaryMismatch(String),
    #[error("Sub-circuits nested deeper than {0} levels")]
    NestingTooDeep(usize),
    #[error("Wire {} -> {} rejected: {source}", .wire.source, .wire.dest)]
    Wire { wire: Wire, source: WireError },
}

/// Reasons an edit could not be applied or undone.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error("No such component")]
    UnknownComponent,
    #[error("No such wire")]
    UnknownWire,
}
