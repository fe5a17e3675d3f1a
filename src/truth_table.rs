use std::fmt;

use crate::{
    circuit::{CircuitManager, ComponentId},
    pin::PinState,
};

/// Exhaustive Switch → LED table of one circuit level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TruthTable {
    /// Switch labels then LED labels, in insertion order.
    pub columns: Vec<String>,
    pub inputs: usize,
    pub rows: Vec<Vec<PinState>>,
}

impl TruthTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row `index` rendered as `'0'`/`'1'`/`'Z'` cells.
    pub fn cells(&self, index: usize) -> Option<String> {
        self.rows
            .get(index)
            .map(|row| row.iter().map(|state| state.symbol()).collect())
    }
}

impl fmt::Display for TruthTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.columns.join(" "))?;
        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&self.columns)
                .map(|(state, column)| {
                    format!("{:<width$}", state.symbol(), width = column.len())
                })
                .collect();
            writeln!(f, "{}", cells.join(" ").trim_end())?;
        }
        Ok(())
    }
}

/// Drives the Switches through all 2^n combinations, first Switch as the
/// most significant bit, and records what every LED shows.
///
/// The Switches are put back afterwards and the circuit settled once more.
/// A circuit without Switches gives an empty table.
pub fn generate(circuit: &mut CircuitManager) -> TruthTable {
    let switches: Vec<(ComponentId, bool)> = circuit
        .switches()
        .filter_map(|(id, component)| Some((id, component.switch_state()?)))
        .collect();
    let leds: Vec<ComponentId> = circuit.leds().map(|(id, _)| id).collect();
    let label = |id: ComponentId| circuit.component(id).map(|c| c.label().to_string());
    let columns = switches
        .iter()
        .map(|(id, _)| *id)
        .chain(leds.iter().copied())
        .filter_map(label)
        .collect();

    let n = switches.len();
    let mut table = TruthTable {
        columns,
        inputs: n,
        rows: Vec::new(),
    };
    if n == 0 {
        return table;
    }

    for i in 0..1usize << n {
        let mut row = Vec::with_capacity(n + leds.len());
        for (j, (id, _)) in switches.iter().enumerate() {
            let on = (i >> (n - j - 1)) & 1 == 1;
            circuit.set_switch_directly(*id, on);
            row.push(PinState::from_bool(on));
        }
        circuit.propagate();
        for id in &leds {
            let state = circuit
                .component(*id)
                .and_then(|led| led.inputs().first().copied())
                .map(|pin| circuit.pin_state(pin))
                .unwrap_or_default();
            row.push(state);
        }
        table.rows.push(row);
    }

    for (id, on) in switches {
        circuit.set_switch_directly(id, on);
    }
    circuit.propagate();
    table
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        components::{Component, Gate, Position},
        pin::PinAllocator,
    };

    #[test]
    fn and_table() {
        let mut pins = PinAllocator::new();
        let mut circuit = CircuitManager::new();
        let a = circuit.add_component(Component::switch("A", Position::new(0, 0), &mut pins));
        let b = circuit.add_component(Component::switch("B", Position::new(0, 50), &mut pins));
        let and = Component::gate(Gate::And, "AND", Position::new(100, 0), &mut pins);
        let and = circuit.add_component(and);
        let led = circuit.add_component(Component::led("Q", Position::new(200, 0), &mut pins));
        circuit.add_component(Component::led("F", Position::new(200, 50), &mut pins));
        let pin = |id: ComponentId, output: bool| {
            let c = circuit.component(id).unwrap();
            if output {
                c.outputs()[0]
            } else {
                c.inputs()[0]
            }
        };
        let (a_out, b_out) = (pin(a, true), pin(b, true));
        let (and_out, led_in) = (pin(and, true), pin(led, false));
        let and_in = circuit.component(and).unwrap().inputs().to_vec();
        circuit.add_wire(a_out, and_in[0]).unwrap();
        circuit.add_wire(b_out, and_in[1]).unwrap();
        circuit.add_wire(and_out, led_in).unwrap();
        circuit.set_switch(b, true);

        let table = generate(&mut circuit);
        assert_eq!(table.columns, vec!["A", "B", "Q", "F"]);
        let rows: Vec<String> = (0..4).filter_map(|i| table.cells(i)).collect();
        assert_eq!(rows, vec!["000Z", "010Z", "100Z", "111Z"]);

        // Switches are restored.
        assert_eq!(circuit.component(a).and_then(|c| c.switch_state()), Some(false));
        assert_eq!(circuit.component(b).and_then(|c| c.switch_state()), Some(true));
        assert_eq!(circuit.pin_state(led_in), PinState::Low);
    }

    #[test]
    fn no_switches_no_rows() {
        let mut pins = PinAllocator::new();
        let mut circuit = CircuitManager::new();
        circuit.add_component(Component::led("L1", Position::default(), &mut pins));
        let table = generate(&mut circuit);
        assert!(table.is_empty());
        assert_eq!(table.columns, vec!["L1"]);
    }
}
