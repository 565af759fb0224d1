//! Greedy baseline allocators used to benchmark General Yankee Swap.

use super::Allocation;
use crate::agent::Agent;
use crate::item::Item;
use crate::ItemIndex;

/// Serial dictatorship: agents claim greedily in index order.
///
/// Each agent walks its desired items and takes every copy that is still in
/// the pool and strictly increases its value. Also known as SPIRE.
pub fn serial_dictatorship<A: Agent>(agents: &[A], items: &[Item]) -> Allocation {
    let mut allocation = Allocation::new(items, agents.len());
    for (agent_index, agent) in agents.iter().enumerate() {
        let mut bundle: Vec<ItemIndex> = Vec::new();
        for item in agent.desired_items(items) {
            if allocation.pool(item) > 0 {
                let mut grown = bundle.clone();
                grown.push(item);
                if agent.value(&grown) > agent.value(&bundle) {
                    allocation.assign(item, agent_index);
                    allocation.draw_from_pool(item);
                    bundle = grown;
                }
            }
        }
    }
    allocation
}

/// Alias for [`serial_dictatorship`]; the two names denote the same contract.
pub use serial_dictatorship as spire;

/// Round robin: rounds of single best-marginal picks.
///
/// In every round each still-active agent takes the one available item with
/// the highest positive marginal contribution (lowest index on ties), or is
/// dropped for the remaining rounds when no item qualifies.
pub fn round_robin<A: Agent>(agents: &[A], items: &[Item]) -> Allocation {
    let mut allocation = Allocation::new(items, agents.len());
    let mut active: Vec<usize> = (0..agents.len()).collect();
    while !active.is_empty() {
        let mut dropped: Vec<usize> = Vec::new();
        for &player in &active {
            let agent = &agents[player];
            let bundle = allocation.bundle(player);
            let mut best: Option<(ItemIndex, u64)> = None;
            for item in agent.desired_items(items) {
                if allocation.pool(item) == 0 {
                    continue;
                }
                let marginal = agent.marginal_contribution(&bundle, item);
                if marginal > 0 && best.map_or(true, |(_, m)| marginal > m) {
                    best = Some((item, marginal));
                }
            }
            match best {
                Some((item, _)) => {
                    allocation.assign(item, player);
                    allocation.draw_from_pool(item);
                }
                None => dropped.push(player),
            }
        }
        active.retain(|player| !dropped.contains(player));
    }
    allocation
}
