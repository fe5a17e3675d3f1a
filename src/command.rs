//! Undoable edits.
//!
//! A [`Command`] is plain data. Applying it to a circuit returns the command
//! that reverses it, so undo and redo are just more applications.

use log::debug;

use crate::{
    circuit::{CircuitManager, ComponentId, Origin},
    components::{Component, Position},
    error::CommandError,
    wire::Wire,
};

#[derive(Clone, Debug)]
pub enum Command {
    /// `origin` puts a removed component back where it was, wires included.
    AddComponent {
        component: Component,
        origin: Option<Origin>,
    },
    RemoveComponent {
        id: ComponentId,
    },
    AddWire {
        wire: Wire,
    },
    RemoveWire {
        wire: Wire,
    },
    Move {
        id: ComponentId,
        to: Position,
    },
    SetSwitch {
        id: ComponentId,
        on: bool,
    },
}

impl Command {
    pub fn add(component: Component) -> Self {
        Command::AddComponent {
            component,
            origin: None,
        }
    }

    /// Performs the edit and returns its inverse.
    pub fn apply(self, circuit: &mut CircuitManager) -> Result<Command, CommandError> {
        let inverse = match self {
            Command::AddComponent { component, origin } => {
                let id = match origin {
                    Some(origin) => circuit.restore_component_directly(component, origin)?,
                    None => circuit.add_component_directly(component),
                };
                circuit.propagate();
                Command::RemoveComponent { id }
            }
            Command::RemoveComponent { id } => {
                let removed = circuit
                    .remove_component(id)
                    .ok_or(CommandError::UnknownComponent)?;
                Command::AddComponent {
                    component: removed.component,
                    origin: Some(removed.origin),
                }
            }
            Command::AddWire { wire } => {
                let wire = circuit.add_wire(wire.source, wire.dest)?;
                Command::RemoveWire { wire }
            }
            Command::RemoveWire { wire } => {
                if !circuit.remove_wire(wire) {
                    return Err(CommandError::UnknownWire);
                }
                Command::AddWire { wire }
            }
            Command::Move { id, to } => {
                let from = circuit.move_component(id, to)?;
                Command::Move { id, to: from }
            }
            Command::SetSwitch { id, on } => {
                let previous = circuit
                    .set_switch(id, on)
                    .ok_or(CommandError::UnknownComponent)?;
                Command::SetSwitch { id, on: previous }
            }
        };
        Ok(inverse)
    }
}

/// Undo and redo stacks over one circuit.
#[derive(Clone, Debug, Default)]
pub struct History {
    undo: Vec<Command>,
    redo: Vec<Command>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `command` as a new edit. Clears the redo stack.
    pub fn execute(
        &mut self,
        command: Command,
        circuit: &mut CircuitManager,
    ) -> Result<(), CommandError> {
        let inverse = command.apply(circuit)?;
        self.undo.push(inverse);
        self.redo.clear();
        Ok(())
    }

    /// Reverts the latest edit. `Ok(false)` if there is nothing to undo. A
    /// command that fails to apply stays on its stack.
    pub fn undo(&mut self, circuit: &mut CircuitManager) -> Result<bool, CommandError> {
        let Some(command) = self.undo.last().cloned() else {
            return Ok(false);
        };
        debug!("Undo {command:?}");
        let inverse = command.apply(circuit)?;
        self.undo.pop();
        self.redo.push(inverse);
        Ok(true)
    }

    pub fn redo(&mut self, circuit: &mut CircuitManager) -> Result<bool, CommandError> {
        let Some(command) = self.redo.last().cloned() else {
            return Ok(false);
        };
        debug!("Redo {command:?}");
        let inverse = command.apply(circuit)?;
        self.redo.pop();
        self.undo.push(inverse);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
