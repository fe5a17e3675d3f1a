use std::collections::HashMap;

use log::debug;

use crate::{
    components::{Component, Direction, Kind, Position, Rect},
    error::{PlacementError, WireError},
    pin::{PinId, PinState},
    propagation::{Propagation, PropagationEngine, PropagationHooks},
    wire::Wire,
};

/// Handle to a component inside one [`CircuitManager`]. Not meaningful
/// across managers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(u32);

#[derive(Clone, Copy, Debug)]
struct PinSlot {
    owner: ComponentId,
    direction: Direction,
    index: usize,
}

/// A component taken out of a circuit together with the wires that went
/// with it.
#[derive(Clone, Debug)]
pub struct Removed {
    pub component: Component,
    pub origin: Origin,
}

/// Where a removed component sat: its id, its place in the update order and
/// its wires, each with its index in the wire list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Origin {
    pub id: ComponentId,
    pub slot: usize,
    pub wires: Vec<(usize, Wire)>,
}

/// Owns the components and wires of one circuit level.
///
/// Every wire's endpoints belong to components owned here, and an input
/// pin is driven by at most one validated wire. Mutations through the
/// non-`directly` methods run a full propagation before returning.
#[derive(Clone, Debug, Default)]
pub struct CircuitManager {
    components: Vec<(ComponentId, Component)>,
    slots: HashMap<ComponentId, usize>,
    pins: HashMap<PinId, PinSlot>,
    wires: Vec<Wire>,
    // Input pin -> the output pin driving it.
    drivers: HashMap<PinId, PinId>,
    next_id: u32,
    engine: PropagationEngine,
}

impl CircuitManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(engine: PropagationEngine) -> Self {
        CircuitManager {
            engine,
            ..Self::default()
        }
    }

    pub fn engine(&self) -> PropagationEngine {
        self.engine
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Components in insertion order, which is also the update order.
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &Component)> + '_ {
        self.components.iter().map(|(id, component)| (*id, component))
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        let slot = *self.slots.get(&id)?;
        Some(&self.components[slot].1)
    }

    fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        let slot = *self.slots.get(&id)?;
        Some(&mut self.components[slot].1)
    }

    /// Components of one kind, in insertion order.
    pub fn components_of(
        &self,
        kind: Kind,
    ) -> impl Iterator<Item = (ComponentId, &Component)> + '_ {
        self.components().filter(move |(_, component)| component.kind() == kind)
    }

    pub fn switches(&self) -> impl Iterator<Item = (ComponentId, &Component)> + '_ {
        self.components_of(Kind::Switch)
    }

    pub fn leds(&self) -> impl Iterator<Item = (ComponentId, &Component)> + '_ {
        self.components_of(Kind::Led)
    }

    pub fn owner_of(&self, pin: PinId) -> Option<ComponentId> {
        self.pins.get(&pin).map(|slot| slot.owner)
    }

    pub fn direction_of(&self, pin: PinId) -> Option<Direction> {
        self.pins.get(&pin).map(|slot| slot.direction)
    }

    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// The wire driving input pin `pin`, if any.
    pub fn wire_into(&self, pin: PinId) -> Option<Wire> {
        self.drivers.get(&pin).map(|source| Wire::new(*source, pin))
    }

    /// Resolved level of any pin. Outputs report their component's state,
    /// inputs report whatever drives them. Undriven and unknown pins float.
    pub fn pin_state(&self, pin: PinId) -> PinState {
        match self.pins.get(&pin) {
            Some(slot) if slot.direction == Direction::Output => self.output_state(*slot),
            _ => match self.drivers.get(&pin).and_then(|source| self.pins.get(source)) {
                Some(slot) if slot.direction == Direction::Output => self.output_state(*slot),
                _ => PinState::Floating,
            },
        }
    }

    fn output_state(&self, slot: PinSlot) -> PinState {
        self.component(slot.owner)
            .map(|component| component.output_state(slot.index))
            .unwrap_or_default()
    }

    /// Every pin's resolved level, in component order.
    pub fn snapshot(&self) -> Vec<(PinId, PinState)> {
        self.components
            .iter()
            .flat_map(|(_, component)| component.pins())
            .map(|pin| (pin, self.pin_state(pin)))
            .collect()
    }

    pub fn add_component(&mut self, component: Component) -> ComponentId {
        let id = self.add_component_directly(component);
        self.propagate();
        id
    }

    /// Adds without propagating.
    pub fn add_component_directly(&mut self, component: Component) -> ComponentId {
        let id = ComponentId(self.next_id);
        self.insert(id, component);
        id
    }

    /// Puts a removed component back at its old slot with its wires at their
    /// old indices, without propagating. Falls back to a fresh id if the old
    /// one is taken.
    ///
    /// Every wire is checked before anything changes, so on error the
    /// circuit is left as it was.
    pub fn restore_component_directly(
        &mut self,
        component: Component,
        origin: Origin,
    ) -> Result<ComponentId, WireError> {
        let direction = |pin: PinId| {
            self.direction_of(pin)
                .or_else(|| component.pin_slot(pin).map(|(direction, _)| direction))
        };
        for (_, wire) in &origin.wires {
            match (direction(wire.source), direction(wire.dest)) {
                (Some(Direction::Output), Some(Direction::Input)) => (),
                (Some(_), Some(_)) => return Err(WireError::DirectionMismatch),
                _ => return Err(WireError::InvalidPins),
            }
        }

        let id = if self.slots.contains_key(&origin.id) {
            ComponentId(self.next_id)
        } else {
            origin.id
        };
        self.insert_at(id, component, origin.slot);
        let mut wires = origin.wires;
        wires.sort_by_key(|(index, _)| *index);
        for (index, wire) in &wires {
            self.wires.insert((*index).min(self.wires.len()), *wire);
        }
        for (_, wire) in &wires {
            if let Some(last) = self.wires.iter().rev().find(|w| w.dest == wire.dest) {
                self.drivers.insert(last.dest, last.source);
            }
        }
        Ok(id)
    }

    fn insert(&mut self, id: ComponentId, component: Component) {
        self.insert_at(id, component, self.components.len());
    }

    fn insert_at(&mut self, id: ComponentId, component: Component, slot: usize) {
        self.next_id = self.next_id.max(id.0 + 1);
        for (index, pin) in component.inputs().iter().enumerate() {
            let slot = PinSlot {
                owner: id,
                direction: Direction::Input,
                index,
            };
            self.pins.insert(*pin, slot);
        }
        for (index, pin) in component.outputs().iter().enumerate() {
            let slot = PinSlot {
                owner: id,
                direction: Direction::Output,
                index,
            };
            self.pins.insert(*pin, slot);
        }
        debug!("Added {} {:?} as {id:?}", component.kind().name(), component.label());
        let slot = slot.min(self.components.len());
        self.components.insert(slot, (id, component));
        for (index, (id, _)) in self.components.iter().enumerate().skip(slot) {
            self.slots.insert(*id, index);
        }
    }

    pub fn remove_component(&mut self, id: ComponentId) -> Option<Removed> {
        let removed = self.remove_component_directly(id)?;
        self.propagate();
        Some(removed)
    }

    /// Removes the component and every wire touching one of its pins,
    /// without propagating.
    pub fn remove_component_directly(&mut self, id: ComponentId) -> Option<Removed> {
        let slot = self.slots.remove(&id)?;
        let (_, component) = self.components.remove(slot);
        for (index, (id, _)) in self.components.iter().enumerate().skip(slot) {
            self.slots.insert(*id, index);
        }
        for pin in component.pins() {
            self.pins.remove(&pin);
        }

        let (wires, kept): (Vec<_>, Vec<_>) = self
            .wires
            .drain(..)
            .enumerate()
            .partition(|(_, wire)| component.pins().any(|pin| wire.touches(pin)));
        self.wires = kept.into_iter().map(|(_, wire)| wire).collect();
        for (_, wire) in &wires {
            self.forget_driver(*wire);
        }
        debug!(
            "Removed {} {:?}, pruning {} wires",
            component.kind().name(),
            component.label(),
            wires.len()
        );
        let origin = Origin { id, slot, wires };
        Some(Removed { component, origin })
    }

    /// Checks whether `a` and `b` may be joined, in either order. On success
    /// returns the wire oriented from the output to the input.
    pub fn validate_wire(&self, a: PinId, b: PinId) -> Result<Wire, WireError> {
        let (Some(slot_a), Some(slot_b)) = (self.pins.get(&a), self.pins.get(&b)) else {
            return Err(WireError::InvalidPins);
        };
        if slot_a.owner == slot_b.owner {
            return Err(WireError::SelfConnection);
        }
        let wire = match (slot_a.direction, slot_b.direction) {
            (Direction::Output, Direction::Input) => Wire::new(a, b),
            (Direction::Input, Direction::Output) => Wire::new(b, a),
            _ => return Err(WireError::DirectionMismatch),
        };
        if self.drivers.contains_key(&wire.dest) {
            return Err(WireError::InputAlreadyDriven);
        }
        Ok(wire)
    }

    pub fn add_wire(&mut self, a: PinId, b: PinId) -> Result<Wire, WireError> {
        let wire = self.validate_wire(a, b)?;
        self.add_wire_directly(wire)?;
        self.propagate();
        Ok(wire)
    }

    /// Stores `wire` as given, without propagating. Only ownership and
    /// direction are checked; callers replaying trusted data may connect a
    /// component to itself. A later wire into an already driven input takes
    /// over as its driver.
    pub fn add_wire_directly(&mut self, wire: Wire) -> Result<(), WireError> {
        match (self.direction_of(wire.source), self.direction_of(wire.dest)) {
            (Some(Direction::Output), Some(Direction::Input)) => (),
            (Some(_), Some(_)) => return Err(WireError::DirectionMismatch),
            _ => return Err(WireError::InvalidPins),
        }
        self.wires.push(wire);
        self.drivers.insert(wire.dest, wire.source);
        debug!("Wired {} -> {}", wire.source, wire.dest);
        Ok(())
    }

    pub fn remove_wire(&mut self, wire: Wire) -> bool {
        let removed = self.remove_wire_directly(wire);
        if removed {
            self.propagate();
        }
        removed
    }

    pub fn remove_wire_directly(&mut self, wire: Wire) -> bool {
        let Some(index) = self.wires.iter().position(|w| *w == wire) else {
            return false;
        };
        self.wires.remove(index);
        self.forget_driver(wire);
        debug!("Unwired {} -> {}", wire.source, wire.dest);
        true
    }

    fn forget_driver(&mut self, wire: Wire) {
        if self.drivers.get(&wire.dest) != Some(&wire.source) {
            return;
        }
        self.drivers.remove(&wire.dest);
        if let Some(other) = self.wires.iter().rev().find(|w| w.dest == wire.dest) {
            self.drivers.insert(other.dest, other.source);
        }
    }

    /// True if `rect` overlaps any component other than `ignore`.
    pub fn is_space_occupied(&self, rect: Rect, ignore: Option<ComponentId>) -> bool {
        self.components
            .iter()
            .filter(|(id, _)| Some(*id) != ignore)
            .any(|(_, component)| component.bounds().intersects(&rect))
    }

    /// Moves a component, returning its previous position. Refused if the
    /// new footprint would overlap another component.
    pub fn move_component(
        &mut self,
        id: ComponentId,
        position: Position,
    ) -> Result<Position, PlacementError> {
        let size = self
            .component(id)
            .ok_or(PlacementError::UnknownComponent)?
            .size();
        if self.is_space_occupied(Rect::new(position, size), Some(id)) {
            return Err(PlacementError::SpaceOccupied);
        }
        let component = self.component_mut(id).ok_or(PlacementError::UnknownComponent)?;
        let previous = component.position();
        component.set_position(position);
        Ok(previous)
    }

    pub fn set_label(&mut self, id: ComponentId, label: &str) -> bool {
        match self.component_mut(id) {
            Some(component) => {
                component.set_label(label);
                true
            }
            None => false,
        }
    }

    /// Flips a switch and propagates. Returns the previous state, or `None`
    /// if `id` is not a switch.
    pub fn set_switch(&mut self, id: ComponentId, on: bool) -> Option<bool> {
        let previous = self.set_switch_directly(id, on)?;
        self.propagate();
        Some(previous)
    }

    /// Returns the new state.
    pub fn toggle_switch(&mut self, id: ComponentId) -> Option<bool> {
        let on = !self.component(id)?.switch_state()?;
        self.set_switch(id, on)?;
        Some(on)
    }

    pub(crate) fn set_switch_directly(&mut self, id: ComponentId, on: bool) -> Option<bool> {
        self.component_mut(id)?.set_switch(on)
    }

    pub fn propagate(&mut self) -> Propagation {
        let engine = self.engine;
        engine.run(self)
    }

    pub fn propagate_with<H: PropagationHooks>(&mut self, hooks: &mut H) -> Propagation {
        let engine = self.engine;
        engine.run_with_hooks(self, hooks)
    }

    /// One pass in insertion order. Each component sees the outputs already
    /// recomputed earlier in the same pass.
    pub(crate) fn update_pass(&mut self) -> bool {
        let mut changed = false;
        for slot in 0..self.components.len() {
            let inputs: Vec<PinState> = self.components[slot]
                .1
                .inputs()
                .iter()
                .map(|pin| self.pin_state(*pin))
                .collect();
            changed |= self.components[slot].1.update(&inputs);
        }
        changed
    }

    /// Drops every component and wire. Component ids keep counting up.
    pub fn clear(&mut self) {
        self.components.clear();
        self.slots.clear();
        self.pins.clear();
        self.wires.clear();
        self.drivers.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{components::Gate, pin::PinAllocator};

    fn and_with_inputs() -> (CircuitManager, [ComponentId; 3], PinAllocator) {
        let mut pins = PinAllocator::new();
        let mut circuit = CircuitManager::new();
        let a = circuit.add_component(Component::switch("S1", Position::new(0, 0), &mut pins));
        let b = circuit.add_component(Component::switch("S2", Position::new(0, 50), &mut pins));
        let and = Component::gate(Gate::And, "AND", Position::new(100, 0), &mut pins);
        let and = circuit.add_component(and);
        (circuit, [a, b, and], pins)
    }

    fn output(circuit: &CircuitManager, id: ComponentId, index: usize) -> PinId {
        circuit.component(id).map(|c| c.outputs()[index]).unwrap()
    }

    fn input(circuit: &CircuitManager, id: ComponentId, index: usize) -> PinId {
        circuit.component(id).map(|c| c.inputs()[index]).unwrap()
    }

    #[test]
    fn validate_wire_rules() {
        let (circuit, [a, b, and], _) = and_with_inputs();
        let a_out = output(&circuit, a, 0);
        let b_out = output(&circuit, b, 0);
        let and_in = input(&circuit, and, 0);
        let and_out = output(&circuit, and, 0);

        assert_eq!(circuit.validate_wire(a_out, and_in), Ok(Wire::new(a_out, and_in)));
        assert_eq!(circuit.validate_wire(and_in, a_out), Ok(Wire::new(a_out, and_in)));
        assert_eq!(circuit.validate_wire(a_out, b_out), Err(WireError::DirectionMismatch));
        assert_eq!(circuit.validate_wire(and_in, and_out), Err(WireError::SelfConnection));
        assert_eq!(circuit.validate_wire(PinId(999), and_in), Err(WireError::InvalidPins));
    }

    #[test]
    fn input_driven_once() {
        let (mut circuit, [a, b, and], _) = and_with_inputs();
        let and_in = input(&circuit, and, 0);
        circuit.add_wire(output(&circuit, a, 0), and_in).unwrap();
        let err = circuit.add_wire(output(&circuit, b, 0), and_in);
        assert_eq!(err, Err(WireError::InputAlreadyDriven));
        assert_eq!(circuit.wires().len(), 1);
    }

    #[test]
    fn pin_state_resolution() {
        let (mut circuit, [a, _, and], _) = and_with_inputs();
        let and_in = input(&circuit, and, 0);
        assert_eq!(circuit.pin_state(and_in), PinState::Floating);
        assert_eq!(circuit.pin_state(PinId(999)), PinState::Floating);

        circuit.add_wire(output(&circuit, a, 0), and_in).unwrap();
        assert_eq!(circuit.pin_state(and_in), PinState::Low);
        circuit.set_switch(a, true);
        assert_eq!(circuit.pin_state(and_in), PinState::High);
        assert_eq!(circuit.wire_into(and_in).map(|w| w.source), Some(output(&circuit, a, 0)));
    }

    #[test]
    fn remove_component_prunes_wires() {
        let (mut circuit, [a, b, and], _) = and_with_inputs();
        let a_out = output(&circuit, a, 0);
        let b_out = output(&circuit, b, 0);
        circuit.add_wire(a_out, input(&circuit, and, 0)).unwrap();
        circuit.add_wire(b_out, input(&circuit, and, 1)).unwrap();
        circuit.set_switch(a, true);
        circuit.set_switch(b, true);
        assert_eq!(circuit.pin_state(output(&circuit, and, 0)), PinState::High);

        let removed = circuit.remove_component(b).unwrap();
        assert_eq!(removed.origin.wires.len(), 1);
        assert_eq!(circuit.wires().len(), 1);
        assert_eq!(circuit.owner_of(b_out), None);
        assert_eq!(circuit.pin_state(output(&circuit, and, 0)), PinState::Floating);
        assert!(circuit.component(and).is_some());
    }

    #[test]
    fn restore_keeps_id_and_order() {
        let (mut circuit, [a, b, and], _) = and_with_inputs();
        let a_out = output(&circuit, a, 0);
        let b_out = output(&circuit, b, 0);
        let wire_a = circuit.add_wire(a_out, input(&circuit, and, 0)).unwrap();
        let wire_b = circuit.add_wire(b_out, input(&circuit, and, 1)).unwrap();
        let order: Vec<_> = circuit.components().map(|(id, _)| id).collect();

        let removed = circuit.remove_component_directly(a).unwrap();
        assert!(circuit.component(a).is_none());
        assert_eq!(removed.origin.slot, 0);
        assert_eq!(removed.origin.wires, vec![(0, wire_a)]);

        let back = circuit
            .restore_component_directly(removed.component, removed.origin)
            .unwrap();
        assert_eq!(back, a);
        assert_eq!(circuit.components().map(|(id, _)| id).collect::<Vec<_>>(), order);
        assert_eq!(circuit.wires(), &[wire_a, wire_b]);
        assert_eq!(circuit.wire_into(wire_a.dest), Some(wire_a));
    }

    #[test]
    fn restore_with_bad_wire_changes_nothing() {
        let (mut circuit, [a, _, and], _) = and_with_inputs();
        let and_in = input(&circuit, and, 0);
        let wire = circuit.add_wire(output(&circuit, a, 0), and_in).unwrap();
        let mut removed = circuit.remove_component_directly(a).unwrap();
        removed.origin.wires.push((1, Wire::new(PinId(900), and_in)));

        let result = circuit.restore_component_directly(removed.component, removed.origin);
        assert_eq!(result, Err(WireError::InvalidPins));
        assert!(circuit.component(a).is_none());
        assert_eq!(circuit.len(), 2);
        assert!(circuit.wires().is_empty());
        assert_eq!(circuit.wire_into(wire.dest), None);
    }

    #[test]
    fn move_respects_placement() {
        let (mut circuit, [a, _, and], _) = and_with_inputs();
        assert_eq!(
            circuit.move_component(a, Position::new(110, 10)),
            Err(PlacementError::SpaceOccupied)
        );
        // Touching edges is fine.
        assert_eq!(circuit.move_component(a, Position::new(70, 0)), Ok(Position::new(0, 0)));
        assert_eq!(circuit.component(a).map(|c| c.position()), Some(Position::new(70, 0)));
        assert!(circuit.move_component(and, Position::new(100, 0)).is_ok());
    }

    #[test]
    fn toggle_switch_flips() {
        let (mut circuit, [a, _, and], _) = and_with_inputs();
        assert_eq!(circuit.toggle_switch(a), Some(true));
        assert_eq!(circuit.toggle_switch(a), Some(false));
        assert_eq!(circuit.toggle_switch(and), None);
    }

    #[test]
    fn direct_wire_checks_direction_only() {
        let mut pins = PinAllocator::new();
        let mut circuit = CircuitManager::new();
        let not = Component::gate(Gate::Not, "NOT", Position::default(), &mut pins);
        let not = circuit.add_component(not);
        let loopback = Wire::new(output(&circuit, not, 0), input(&circuit, not, 0));
        assert_eq!(circuit.add_wire_directly(loopback), Ok(()));
        let backwards = Wire::new(input(&circuit, not, 0), output(&circuit, not, 0));
        assert_eq!(circuit.add_wire_directly(backwards), Err(WireError::DirectionMismatch));
        assert!(circuit.remove_wire(loopback));
        assert!(!circuit.remove_wire(loopback));
    }
}
