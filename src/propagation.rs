use log::{trace, warn};

use crate::circuit::CircuitManager;

pub type Passes = usize;

/// Outcome of one settling run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Propagation {
    /// A full pass changed nothing.
    Converged { passes: Passes },
    /// Still changing after `max_passes`; the last computed state is kept.
    Oscillating { max_passes: Passes },
}

impl Propagation {
    pub fn converged(&self) -> bool {
        matches!(self, Propagation::Converged { .. })
    }
}

/// Observes a settling run pass by pass.
pub trait PropagationHooks {
    fn pass_complete(&mut self, _pass: Passes, _changed: bool, _circuit: &CircuitManager) {}
}

#[derive(Default)]
pub struct NoHooks;
impl PropagationHooks for NoHooks {}

/// Fixed-point settling over one circuit level.
///
/// Every pass updates each component once, in insertion order, each update
/// seeing the outputs already recomputed earlier in the same pass. Feed-forward
/// and feedback networks settle the same way; deep chains simply take more
/// passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropagationEngine {
    max_passes: Passes,
}

impl Default for PropagationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PropagationEngine {
    pub const MAX_PASSES: Passes = 100;

    pub fn new() -> Self {
        PropagationEngine {
            max_passes: Self::MAX_PASSES,
        }
    }

    pub fn with_max_passes(max_passes: Passes) -> Self {
        assert!(max_passes > 0);
        PropagationEngine { max_passes }
    }

    pub fn max_passes(&self) -> Passes {
        self.max_passes
    }

    pub fn run(&self, circuit: &mut CircuitManager) -> Propagation {
        self.run_with_hooks(circuit, &mut NoHooks)
    }

    pub fn run_with_hooks<H: PropagationHooks>(
        &self,
        circuit: &mut CircuitManager,
        hooks: &mut H,
    ) -> Propagation {
        for pass in 0..self.max_passes {
            let changed = circuit.update_pass();
            trace!("Propagation pass {pass}: changed = {changed}");
            hooks.pass_complete(pass, changed, circuit);
            if !changed {
                return Propagation::Converged { passes: pass + 1 };
            }
        }
        warn!(
            "Propagation exceeded {} passes. Possible oscillating circuit.",
            self.max_passes
        );
        Propagation::Oscillating {
            max_passes: self.max_passes,
        }
    }
}
