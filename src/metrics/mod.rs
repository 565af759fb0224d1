//! Deterministic post-allocation fairness metrics.

pub mod envy;
pub mod pmms;

pub use envy::{ef1_violations, ef_violations, efx_violations};
pub use pmms::pmms_violations;

use crate::agent::Agent;
use crate::allocation::Allocation;

/// `table[i][j]`: agent `i`'s valuation of agent `j`'s bundle.
///
/// Every envy metric reads bundles through the eyes of the potential
/// envier, so the full cross table is worth precomputing once.
pub fn valuation_table<A: Agent>(allocation: &Allocation, agents: &[A]) -> Vec<Vec<u64>> {
    let bundles: Vec<Vec<crate::ItemIndex>> =
        (0..agents.len()).map(|j| allocation.bundle(j)).collect();
    agents
        .iter()
        .map(|agent| bundles.iter().map(|bundle| agent.value(bundle)).collect())
        .collect()
}

/// Mean of the agents' utilities.
pub fn utilitarian_welfare<A: Agent>(allocation: &Allocation, agents: &[A]) -> f64 {
    let total: u64 = agents
        .iter()
        .enumerate()
        .map(|(index, agent)| agent.value(&allocation.bundle(index)))
        .sum();
    total as f64 / agents.len() as f64
}

/// `(zero-valued agents, geometric mean of the non-zero utilities)`.
///
/// The geometric mean is 0 when every agent values its bundle at zero.
pub fn nash_welfare<A: Agent>(allocation: &Allocation, agents: &[A]) -> (usize, f64) {
    let mut zeros = 0_usize;
    let mut log_sum = 0.0_f64;
    for (index, agent) in agents.iter().enumerate() {
        let value = agent.value(&allocation.bundle(index));
        if value == 0 {
            zeros += 1;
        } else {
            log_sum += (value as f64).ln();
        }
    }
    let nonzero = agents.len() - zeros;
    let geometric = if nonzero == 0 {
        0.0
    } else {
        (log_sum / nonzero as f64).exp()
    };
    (zeros, geometric)
}

/// Utilities sorted in decreasing order.
pub fn leximin<A: Agent>(allocation: &Allocation, agents: &[A]) -> Vec<u64> {
    let mut utilities: Vec<u64> = agents
        .iter()
        .enumerate()
        .map(|(index, agent)| agent.value(&allocation.bundle(index)))
        .collect();
    utilities.sort_unstable_by(|a, b| b.cmp(a));
    utilities
}
