//! General Yankee Swap: augmenting-path allocation over the exchange graph.
//!
//! Each iteration probes the agent with the highest gain for a shortest
//! source-to-sink path. A path found means one more unit of value for that
//! agent, paid for by a chain of value-preserving swaps ending at the pool;
//! no path means the agent can never improve and is retired. With
//! matroid-rank valuations the resulting utility vector Lorenz-dominates
//! every alternative, which makes it leximin-optimal up to ties.

use std::collections::BTreeSet;
use std::time::Instant;

use log::debug;

use super::error::AllocationError;
use super::exchange::{ExchangeGraph, Node};
use super::Allocation;
use crate::agent::Agent;
use crate::item::Item;
use crate::ItemIndex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Priority criterion for choosing the next agent to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Criteria {
    /// `gain = -value`; yields the Lorenz-dominant allocation.
    #[default]
    LorenzDominance,
    /// `gain = -value / weight`.
    WeightedLeximin,
    /// `gain = (1 + 1/value)^weight`, `+∞` once a zero value is observed.
    WeightedNash,
    /// `gain = weight / (value + 1)`.
    WeightedHarmonic,
}

impl Criteria {
    fn needs_weights(self) -> bool {
        !matches!(self, Criteria::LorenzDominance)
    }

    fn gain(self, value: u64, weight: f64) -> f64 {
        let zero = value == 0;
        let value = value as f64;
        match self {
            Criteria::LorenzDominance => -value,
            Criteria::WeightedLeximin => -value / weight,
            Criteria::WeightedNash => {
                if zero {
                    f64::INFINITY
                } else {
                    (1.0 + 1.0 / value).powf(weight)
                }
            }
            Criteria::WeightedHarmonic => weight / (value + 1.0),
        }
    }
}

/// Result of one General Yankee Swap run.
///
/// `time_steps` holds the elapsed seconds at the end of each iteration (a
/// monotone trace); `agents_involved` holds, per iteration, how many agents
/// took part in the applied path — zero for an iteration that retired an
/// agent. Both traces have exactly one entry per iteration.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub allocation: Allocation,
    pub time_steps: Vec<f64>,
    pub agents_involved: Vec<usize>,
}

/// General Yankee Swap under Lorenz dominance.
pub fn general_yankee_swap<A: Agent>(agents: &[A], items: &[Item]) -> SwapOutcome {
    run(agents, items, Criteria::LorenzDominance, &[])
}

/// General Yankee Swap under an explicit criterion.
///
/// Weighted criteria require one weight per agent; `LorenzDominance`
/// ignores the slice.
pub fn general_yankee_swap_with<A: Agent>(
    agents: &[A],
    items: &[Item],
    criteria: Criteria,
    weights: &[f64],
) -> Result<SwapOutcome, AllocationError> {
    if criteria.needs_weights() && weights.len() != agents.len() {
        return Err(AllocationError::WeightsMismatch {
            agents: agents.len(),
            weights: weights.len(),
        });
    }
    Ok(run(agents, items, criteria, weights))
}

fn run<A: Agent>(
    agents: &[A],
    items: &[Item],
    criteria: Criteria,
    weights: &[f64],
) -> SwapOutcome {
    let n_agents = agents.len();
    let mut allocation = Allocation::new(items, n_agents);
    let mut graph = ExchangeGraph::new(items);
    let mut gain = vec![0.0_f64; n_agents];
    let mut active = vec![true; n_agents];
    let mut time_steps = Vec::new();
    let mut agents_involved = Vec::new();
    let weight = |agent: usize| weights.get(agent).copied().unwrap_or(1.0);

    let start = Instant::now();
    let mut iteration = 0_usize;
    while let Some(picked) = pick_agent(&gain, &active) {
        iteration += 1;
        let bundle = allocation.bundle(picked);
        graph.add_source_edges(&agents[picked], &bundle, items);
        let path = graph.shortest_path();
        graph.remove_source();

        match path {
            None => {
                active[picked] = false;
                gain[picked] = f64::NEG_INFINITY;
                agents_involved.push(0);
                debug!("iteration {iteration}: agent {picked} retired");
            }
            Some(path) => {
                let involved = apply_path(&mut allocation, &mut graph, &path, picked);
                refresh_graph(&allocation, &mut graph, agents, items, &involved);
                let value = agents[picked].value(&allocation.bundle(picked));
                gain[picked] = criteria.gain(value, weight(picked));
                debug!(
                    "iteration {iteration}: agent {picked} gains a unit via {} swaps",
                    involved.len() - 1
                );
                agents_involved.push(involved.len());
            }
        }
        time_steps.push(start.elapsed().as_secs_f64());
    }
    debug_assert!(
        (0..allocation.n_items())
            .all(|i| allocation.row_total(i) == i64::from(items[i].capacity())),
        "capacity conservation violated"
    );
    SwapOutcome {
        allocation,
        time_steps,
        agents_involved,
    }
}

/// Highest-gain active agent; ties break toward the lowest index.
fn pick_agent(gain: &[f64], active: &[bool]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (agent, &g) in gain.iter().enumerate() {
        if !active[agent] {
            continue;
        }
        match best {
            Some(current) if gain[current] >= g => {}
            _ => best = Some(agent),
        }
    }
    best
}

/// Applies an augmenting path `s → i₁ → … → i_k → t`.
///
/// The terminal item leaves the pool; each intermediate hop is executed by
/// its lowest-index witness, whose stale witness entries are invalidated on
/// the spot; the first item lands with the probed agent. Returns the agents
/// involved, probed agent first, in swap order.
fn apply_path(
    allocation: &mut Allocation,
    graph: &mut ExchangeGraph,
    path: &[Node],
    picked: usize,
) -> Vec<usize> {
    let item_path: Vec<ItemIndex> = path
        .iter()
        .filter_map(|node| match node {
            Node::Item(index) => Some(*index),
            _ => None,
        })
        .collect();
    let mut involved = vec![picked];

    let terminal = item_path[item_path.len() - 1];
    allocation.draw_from_pool(terminal);

    for hop in (1..item_path.len()).rev() {
        let from = item_path[hop - 1];
        let to = item_path[hop];
        let Some(witness) = graph.witness(from, to) else {
            // Every intermediate path edge carries a witness by construction.
            debug_assert!(false, "path edge ({from}, {to}) without witness");
            continue;
        };
        involved.push(witness);
        allocation.assign(to, witness);
        allocation.release(from, witness);
        graph.invalidate_witness_from(from, witness);
    }

    allocation.assign(item_path[0], picked);
    if allocation.pool(terminal) == 0 {
        graph.remove_sink_edge(terminal);
    }
    involved
}

/// Re-evaluates every (bundle item, desired item) pair of each involved
/// agent, bringing witness sets and edges back in line with the new
/// allocation.
fn refresh_graph<A: Agent>(
    allocation: &Allocation,
    graph: &mut ExchangeGraph,
    agents: &[A],
    items: &[Item],
    involved: &[usize],
) {
    let distinct: BTreeSet<usize> = involved.iter().copied().collect();
    for &agent_index in &distinct {
        let agent = &agents[agent_index];
        let bundle = allocation.bundle(agent_index);
        let desired = agent.desired_items(items);
        for &held in &bundle {
            for &wanted in &desired {
                if held == wanted {
                    continue;
                }
                let willing = agent.exchange_contribution(&bundle, held, wanted);
                graph.update_witness(held, wanted, agent_index, willing);
            }
        }
    }
}
