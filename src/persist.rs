//! Saved circuits as RON text.
//!
//! Components are written in insertion order with their pin ids, so a load
//! reproduces the exact wiring. Sub-circuits carry their whole inner circuit
//! along. A load parses and builds everything before touching the live
//! circuit; a bad file leaves it as it was.

use std::collections::HashSet;

use log::debug;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use crate::{
    circuit::CircuitManager,
    components::{Component, Direction, Kind, Position},
    error::LoadError,
    pin::{PinAllocator, PinId},
    propagation::PropagationEngine,
    subcircuit::SubCircuit,
    wire::Wire,
};

/// Deepest sub-circuit nesting a load or import accepts.
pub const MAX_NESTING_DEPTH: usize = 64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircuitDef {
    pub components: Vec<ComponentDef>,
    pub wires: Vec<Wire>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentDef {
    #[serde(rename = "type")]
    pub kind: Kind,
    pub label: String,
    pub position: Position,
    pub inputs: Vec<PinId>,
    pub outputs: Vec<PinId>,
    /// Switch position. Absent for everything else.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcircuit: Option<Box<SubCircuitDef>>,
}

/// Inner circuit of a sub-circuit. The maps list the internal Switch output
/// (or LED input) behind each external input (or output), in pin order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubCircuitDef {
    pub input_map: Vec<PinId>,
    pub output_map: Vec<PinId>,
    pub circuit: CircuitDef,
}

impl CircuitDef {
    pub fn from_circuit(circuit: &CircuitManager) -> Self {
        CircuitDef {
            components: circuit
                .components()
                .map(|(_, component)| ComponentDef::from_component(component))
                .collect(),
            wires: circuit.wires().to_vec(),
        }
    }
}

impl ComponentDef {
    pub fn from_component(component: &Component) -> Self {
        let subcircuit = component.as_subcircuit().map(|subcircuit| {
            Box::new(SubCircuitDef {
                input_map: subcircuit.input_map().to_vec(),
                output_map: subcircuit.output_map().to_vec(),
                circuit: CircuitDef::from_circuit(subcircuit.circuit()),
            })
        });
        ComponentDef {
            kind: component.kind(),
            label: component.label().to_string(),
            position: component.position(),
            inputs: component.inputs().to_vec(),
            outputs: component.outputs().to_vec(),
            on: component.switch_state(),
            subcircuit,
        }
    }
}

fn to_ron<T: Serialize>(value: &T) -> Result<String, LoadError> {
    Ok(ron::ser::to_string_pretty(value, PrettyConfig::default())?)
}

pub fn save(circuit: &CircuitManager) -> Result<String, LoadError> {
    to_ron(&CircuitDef::from_circuit(circuit))
}

/// Replaces the contents of `circuit` with the saved circuit in `text`,
/// keeping every pin id as saved.
///
/// `pins` is moved past the largest id in the file. Nothing changes if the
/// file is rejected.
pub fn load(
    text: &str,
    circuit: &mut CircuitManager,
    pins: &mut PinAllocator,
) -> Result<(), LoadError> {
    let def: CircuitDef = ron::from_str(text)?;
    let mut highest = None;
    let loaded = build_circuit(&def, 0, circuit.engine(), &mut highest)?;

    *circuit = loaded;
    if let Some(max) = highest {
        pins.advance_past(max);
    }
    circuit.propagate();
    debug!(
        "Loaded {} components and {} wires",
        circuit.len(),
        circuit.wires().len()
    );
    Ok(())
}

/// Serializes one sub-circuit on its own, for reuse in other circuits.
pub fn export_subcircuit(component: &Component) -> Result<String, LoadError> {
    if component.as_subcircuit().is_none() {
        return Err(LoadError::MissingDefinition(component.label().to_string()));
    }
    to_ron(&ComponentDef::from_component(component))
}

/// Reads an exported sub-circuit.
///
/// The external pins are issued fresh from `pins` so the block can join a
/// circuit that already uses the saved ids. The inner circuit keeps its ids;
/// they only need to be unique inside the block.
pub fn import_subcircuit(
    text: &str,
    pins: &mut PinAllocator,
    engine: PropagationEngine,
) -> Result<Component, LoadError> {
    let def: ComponentDef = ron::from_str(text)?;
    if def.kind != Kind::SubCircuit {
        return Err(LoadError::MissingDefinition(def.label));
    }
    let mut highest = None;
    let component = build_component(&def, 0, engine, &mut HashSet::new(), &mut highest)?;
    if let Some(max) = highest {
        pins.advance_past(max);
    }

    let inputs = component.inputs().iter().map(|_| pins.next()).collect();
    let outputs = component.outputs().iter().map(|_| pins.next()).collect();
    let Some(subcircuit) = component.as_subcircuit().cloned() else {
        return Err(LoadError::MissingDefinition(def.label));
    };
    debug!(
        "Imported {:?}: {} inputs, {} outputs",
        def.label,
        def.inputs.len(),
        def.outputs.len()
    );
    Ok(Component::from_subcircuit(
        &def.label,
        def.position,
        inputs,
        outputs,
        subcircuit,
    ))
}

/// Pin ids must be unique within one circuit level. `highest` tracks the
/// largest id over every level.
fn claim(
    pins: &[PinId],
    seen: &mut HashSet<PinId>,
    highest: &mut Option<PinId>,
) -> Result<(), LoadError> {
    for pin in pins {
        if !seen.insert(*pin) {
            return Err(LoadError::DuplicatePin(*pin));
        }
        *highest = (*highest).max(Some(*pin));
    }
    Ok(())
}

fn build_circuit(
    def: &CircuitDef,
    depth: usize,
    engine: PropagationEngine,
    highest: &mut Option<PinId>,
) -> Result<CircuitManager, LoadError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(LoadError::NestingTooDeep(MAX_NESTING_DEPTH));
    }
    let mut seen = HashSet::new();
    let mut circuit = CircuitManager::with_engine(engine);
    for component in &def.components {
        let component = build_component(component, depth, engine, &mut seen, highest)?;
        circuit.add_component_directly(component);
    }
    for wire in &def.wires {
        circuit
            .add_wire_directly(*wire)
            .map_err(|source| LoadError::Wire {
                wire: *wire,
                source,
            })?;
    }
    Ok(circuit)
}

fn build_component(
    def: &ComponentDef,
    depth: usize,
    engine: PropagationEngine,
    seen: &mut HashSet<PinId>,
    highest: &mut Option<PinId>,
) -> Result<Component, LoadError> {
    claim(&def.inputs, seen, highest)?;
    claim(&def.outputs, seen, highest)?;

    if def.kind != Kind::SubCircuit {
        if def.subcircuit.is_some() {
            return Err(LoadError::UnexpectedDefinition(def.label.clone()));
        }
        let mut component = Component::restore(
            def.kind,
            &def.label,
            def.position,
            def.inputs.clone(),
            def.outputs.clone(),
        )?;
        if let Some(on) = def.on {
            component.set_switch(on);
        }
        return Ok(component);
    }

    let Some(inner) = &def.subcircuit else {
        return Err(LoadError::MissingDefinition(def.label.clone()));
    };
    let circuit = build_circuit(&inner.circuit, depth + 1, engine, highest)?;
    let boundary_ok = inner.input_map.len() == def.inputs.len()
        && inner.output_map.len() == def.outputs.len()
        && maps_onto(&circuit, &inner.input_map, Kind::Switch, Direction::Output)
        && maps_onto(&circuit, &inner.output_map, Kind::Led, Direction::Input);
    if !boundary_ok {
        return Err(LoadError::BoundaryMismatch(def.label.clone()));
    }
    let subcircuit = SubCircuit::new(circuit, inner.input_map.clone(), inner.output_map.clone());
    Ok(Component::from_subcircuit(
        &def.label,
        def.position,
        def.inputs.clone(),
        def.outputs.clone(),
        subcircuit,
    ))
}

/// Every pin in `map` is a `direction` pin of a `kind` component in
/// `circuit`.
fn maps_onto(circuit: &CircuitManager, map: &[PinId], kind: Kind, direction: Direction) -> bool {
    map.iter().all(|pin| {
        circuit.direction_of(*pin) == Some(direction)
            && circuit
                .owner_of(*pin)
                .and_then(|id| circuit.component(id))
                .is_some_and(|component| component.kind() == kind)
    })
}
