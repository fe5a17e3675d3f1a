use std::collections::HashSet;

use log::debug;

use crate::{
    circuit::{CircuitManager, ComponentId},
    pin::{PinAllocator, PinId},
};

use super::SubCircuit;

/// Replaces the selected components with one sub-circuit named `label`.
///
/// Wires between selected components move inside the block. A wire crossing
/// the selection boundary has its inside end replaced by the block's
/// external pin for the Switch or LED it touched, and is kept only if the
/// result is still a valid wire. Returns the id of the new block, or `None`
/// if nothing in `selection` exists.
pub fn create_subcircuit(
    circuit: &mut CircuitManager,
    pins: &mut PinAllocator,
    selection: &[ComponentId],
    label: &str,
) -> Option<ComponentId> {
    let mut seen = HashSet::new();
    let selection: Vec<ComponentId> = selection
        .iter()
        .copied()
        .filter(|id| circuit.component(*id).is_some() && seen.insert(*id))
        .collect();
    if selection.is_empty() {
        return None;
    }

    let inside: HashSet<PinId> = selection
        .iter()
        .filter_map(|id| circuit.component(*id))
        .flat_map(|component| component.pins())
        .collect();
    let mut internal = Vec::new();
    let mut external = Vec::new();
    for wire in circuit.wires() {
        match (inside.contains(&wire.source), inside.contains(&wire.dest)) {
            (true, true) => internal.push(*wire),
            (true, false) | (false, true) => external.push(*wire),
            (false, false) => (),
        }
    }

    // Removal prunes the crossing wires, so they are captured above.
    let components: Vec<_> = selection
        .iter()
        .filter_map(|id| circuit.remove_component_directly(*id))
        .map(|removed| removed.component)
        .collect();
    let block = SubCircuit::encapsulate(label, components, &internal, pins, circuit.engine());
    let (n_in, n_out) = (block.inputs().len(), block.outputs().len());

    let replacements: Vec<(PinId, PinId)> = external
        .iter()
        .filter_map(|wire| {
            if inside.contains(&wire.source) {
                block.external_pin_for(wire.source).map(|pin| (pin, wire.dest))
            } else {
                block.external_pin_for(wire.dest).map(|pin| (wire.source, pin))
            }
        })
        .collect();
    let id = circuit.add_component_directly(block);

    let mut kept = 0;
    for (a, b) in replacements {
        match circuit.validate_wire(a, b) {
            Ok(wire) => {
                if circuit.add_wire_directly(wire).is_ok() {
                    kept += 1;
                }
            }
            Err(err) => debug!("Dropped boundary wire {a} -> {b}: {err}"),
        }
    }
    debug!(
        "Extracted {label:?}: {n_in} in, {n_out} out, {} internal wires, {kept}/{} boundary wires",
        internal.len(),
        external.len()
    );
    circuit.propagate();
    Some(id)
}
