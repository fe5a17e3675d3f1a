use std::{fs, path::Path};

use log::debug;

use crate::{
    circuit::{CircuitManager, ComponentId},
    command::{Command, History},
    components::{Component, Kind, Position, Rect},
    error::{CommandError, LoadError, PlacementError},
    persist,
    pin::{PinAllocator, PinId},
    subcircuit,
    truth_table::{self, TruthTable},
    wire::Wire,
};

/// One editing session: the top-level circuit, the pin allocator every new
/// component draws from, and the undo history.
#[derive(Debug, Default)]
pub struct Simulator {
    circuit: CircuitManager,
    pins: PinAllocator,
    history: History,
}

impl Simulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn circuit(&self) -> &CircuitManager {
        &self.circuit
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Label a freshly placed `kind` gets: `S<n>` for Switches, `L<n>` for
    /// LEDs, the type name otherwise.
    fn next_label(&self, kind: Kind) -> String {
        let count = self.circuit.components_of(kind).count();
        match kind {
            Kind::Switch => format!("S{}", count + 1),
            Kind::Led => format!("L{}", count + 1),
            _ => kind.name().to_string(),
        }
    }

    /// Places a new primitive at `position` if the spot is free.
    pub fn place(&mut self, kind: Kind, position: Position) -> Result<ComponentId, CommandError> {
        let label = self.next_label(kind);
        let rect = Rect::new(position, kind.size());
        if self.circuit.is_space_occupied(rect, None) {
            return Err(PlacementError::SpaceOccupied.into());
        }
        let component = Component::primitive(kind, &label, position, &mut self.pins)
            .ok_or(PlacementError::NotPlaceable(kind))?;
        self.add(component)
    }

    /// Places an existing component, e.g. an imported sub-circuit.
    pub fn place_component(
        &mut self,
        mut component: Component,
        position: Position,
    ) -> Result<ComponentId, CommandError> {
        component.set_position(position);
        if self.circuit.is_space_occupied(component.bounds(), None) {
            return Err(PlacementError::SpaceOccupied.into());
        }
        self.add(component)
    }

    fn add(&mut self, component: Component) -> Result<ComponentId, CommandError> {
        self.history.execute(Command::add(component), &mut self.circuit)?;
        self.circuit
            .components()
            .last()
            .map(|(id, _)| id)
            .ok_or(CommandError::UnknownComponent)
    }

    pub fn remove(&mut self, id: ComponentId) -> Result<(), CommandError> {
        self.history.execute(Command::RemoveComponent { id }, &mut self.circuit)
    }

    /// Wires two pins given in either order.
    pub fn connect(&mut self, a: PinId, b: PinId) -> Result<Wire, CommandError> {
        let wire = self.circuit.validate_wire(a, b)?;
        self.history.execute(Command::AddWire { wire }, &mut self.circuit)?;
        Ok(wire)
    }

    pub fn disconnect(&mut self, wire: Wire) -> Result<(), CommandError> {
        self.history.execute(Command::RemoveWire { wire }, &mut self.circuit)
    }

    pub fn move_to(&mut self, id: ComponentId, to: Position) -> Result<(), CommandError> {
        self.history.execute(Command::Move { id, to }, &mut self.circuit)
    }

    /// The click on a Switch. Returns the new state.
    pub fn toggle(&mut self, id: ComponentId) -> Result<bool, CommandError> {
        let on = !self
            .circuit
            .component(id)
            .and_then(Component::switch_state)
            .ok_or(CommandError::UnknownComponent)?;
        self.history.execute(Command::SetSwitch { id, on }, &mut self.circuit)?;
        Ok(on)
    }

    pub fn undo(&mut self) -> Result<bool, CommandError> {
        self.history.undo(&mut self.circuit)
    }

    pub fn redo(&mut self) -> Result<bool, CommandError> {
        self.history.redo(&mut self.circuit)
    }

    /// Packs `selection` into a sub-circuit. Extraction cannot be undone and
    /// clears the history.
    pub fn create_subcircuit(
        &mut self,
        selection: &[ComponentId],
        label: &str,
    ) -> Option<ComponentId> {
        let id =
            subcircuit::create_subcircuit(&mut self.circuit, &mut self.pins, selection, label)?;
        self.history.clear();
        Some(id)
    }

    pub fn truth_table(&mut self) -> TruthTable {
        truth_table::generate(&mut self.circuit)
    }

    pub fn save(&self) -> Result<String, LoadError> {
        persist::save(&self.circuit)
    }

    /// Replaces the circuit. On error nothing changes.
    pub fn load(&mut self, text: &str) -> Result<(), LoadError> {
        persist::load(text, &mut self.circuit, &mut self.pins)?;
        self.history.clear();
        Ok(())
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        fs::write(path.as_ref(), self.save()?)?;
        debug!("Saved circuit to {}", path.as_ref().display());
        Ok(())
    }

    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let text = fs::read_to_string(path.as_ref())?;
        self.load(&text)
    }

    pub fn export(&self, id: ComponentId) -> Result<String, LoadError> {
        match self.circuit.component(id) {
            Some(component) => persist::export_subcircuit(component),
            None => Err(LoadError::MissingDefinition(format!("{id:?}"))),
        }
    }

    /// Reads an exported sub-circuit with fresh external pins. Place it with
    /// [`Simulator::place_component`].
    pub fn import(&mut self, text: &str) -> Result<Component, LoadError> {
        persist::import_subcircuit(text, &mut self.pins, self.circuit.engine())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pin::PinState;

    #[test]
    fn labels_count_up() {
        let mut sim = Simulator::new();
        let s1 = sim.place(Kind::Switch, Position::new(0, 0)).unwrap();
        let s2 = sim.place(Kind::Switch, Position::new(0, 40)).unwrap();
        let l1 = sim.place(Kind::Led, Position::new(200, 0)).unwrap();
        let and = sim.place(Kind::And, Position::new(100, 0)).unwrap();
        let label = |id| sim.circuit().component(id).map(|c| c.label().to_string());
        assert_eq!(label(s1).as_deref(), Some("S1"));
        assert_eq!(label(s2).as_deref(), Some("S2"));
        assert_eq!(label(l1).as_deref(), Some("L1"));
        assert_eq!(label(and).as_deref(), Some("AND"));
    }

    #[test]
    fn placement_is_checked() {
        let mut sim = Simulator::new();
        sim.place(Kind::And, Position::new(0, 0)).unwrap();
        let err = sim.place(Kind::Or, Position::new(30, 30));
        assert_eq!(err, Err(CommandError::Placement(PlacementError::SpaceOccupied)));
        let err = sim.place(Kind::SubCircuit, Position::new(500, 500));
        let expected = PlacementError::NotPlaceable(Kind::SubCircuit);
        assert_eq!(err, Err(CommandError::Placement(expected)));
        assert!(sim.place(Kind::Or, Position::new(60, 0)).is_ok());
    }

    #[test]
    fn toggle_and_undo() {
        let mut sim = Simulator::new();
        let s = sim.place(Kind::Switch, Position::new(0, 0)).unwrap();
        let l = sim.place(Kind::Led, Position::new(100, 0)).unwrap();
        let out = sim.circuit().component(s).unwrap().outputs()[0];
        let led_in = sim.circuit().component(l).unwrap().inputs()[0];
        sim.connect(led_in, out).unwrap();

        assert_eq!(sim.toggle(s), Ok(true));
        assert_eq!(sim.circuit().pin_state(led_in), PinState::High);
        assert_eq!(sim.undo(), Ok(true));
        assert_eq!(sim.circuit().pin_state(led_in), PinState::Low);
        assert_eq!(sim.redo(), Ok(true));
        assert_eq!(sim.circuit().pin_state(led_in), PinState::High);
    }

    #[test]
    fn load_resets_history_and_allocator() {
        let mut sim = Simulator::new();
        sim.place(Kind::Not, Position::new(0, 0)).unwrap();
        let text = sim.save().unwrap();

        let mut other = Simulator::new();
        other.load(&text).unwrap();
        assert!(!other.history().can_undo());
        let fresh = other.place(Kind::Switch, Position::new(100, 0)).unwrap();
        let pin = other.circuit().component(fresh).unwrap().outputs()[0];
        assert_eq!(pin, PinId(3));
    }
}
