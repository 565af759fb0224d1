//! Pairwise Maximin Share violations.
//!
//! An agent's PMMS against a partner is the minimum value it would receive
//! in the best two-way split of their combined bundles. The best split is
//! computed by running General Yankee Swap on a two-agent sub-instance built
//! from the union: each distinct item reappears with capacity equal to its
//! multiplicity across the two bundles, and the agent is restricted to the
//! reduced schedule. An allocation violates PMMS for an agent when the
//! agent's current value falls below that guarantee.

use crate::agent::{Agent, Restrict};
use crate::allocation::{general_yankee_swap, Allocation};
use crate::constraints::ConstraintError;
use crate::item::{sub_schedule, Item};
use crate::ItemIndex;

/// `(violations, enviers)` over all unordered agent pairs with a non-empty
/// combined bundle; enviers count each agent at most once.
pub fn pmms_violations<A>(
    allocation: &Allocation,
    agents: &[A],
    items: &[Item],
) -> Result<(usize, usize), ConstraintError>
where
    A: Agent + Restrict + Clone,
{
    let bundles: Vec<Vec<ItemIndex>> = (0..agents.len()).map(|j| allocation.bundle(j)).collect();
    let mut violations = 0_usize;
    let mut envious = vec![false; agents.len()];

    for first in 0..agents.len() {
        for second in (first + 1)..agents.len() {
            if bundles[first].is_empty() && bundles[second].is_empty() {
                continue;
            }
            let bundle_first = materialize(&bundles[first], items);
            let bundle_second = materialize(&bundles[second], items);
            let sub_items = sub_schedule(&[bundle_first.as_slice(), bundle_second.as_slice()]);

            for agent_index in [first, second] {
                let own_value = agents[agent_index].value(&bundles[agent_index]);
                let share = pairwise_share(&agents[agent_index], &sub_items)?;
                if own_value < share {
                    violations += 1;
                    envious[agent_index] = true;
                }
            }
        }
    }
    let enviers = envious.iter().filter(|&&e| e).count();
    Ok((violations, enviers))
}

/// Best-split guarantee: the smaller of the two bundle values after a
/// two-agent General Yankee Swap between clones of the restricted agent.
fn pairwise_share<A>(agent: &A, sub_items: &[Item]) -> Result<u64, ConstraintError>
where
    A: Agent + Restrict + Clone,
{
    let restricted = agent.restrict(sub_items)?;
    let pair = [restricted.clone(), restricted];
    let outcome = general_yankee_swap(&pair, sub_items);
    let first = pair[0].value(&outcome.allocation.bundle(0));
    let second = pair[1].value(&outcome.allocation.bundle(1));
    Ok(first.min(second))
}

fn materialize(bundle: &[ItemIndex], items: &[Item]) -> Vec<Item> {
    bundle.iter().map(|&index| items[index].clone()).collect()
}
