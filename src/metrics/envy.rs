//! Envy metrics: EF, EF1 and EFX violation counts.
//!
//! Every function returns `(violations, enviers)`: violations count ordered
//! agent pairs, enviers count each envious agent at most once.

use super::valuation_table;
use crate::agent::Agent;
use crate::allocation::Allocation;
use crate::ItemIndex;

/// Envy-free violations: `i` envies `j` when it values `j`'s bundle above
/// its own.
pub fn ef_violations<A: Agent>(allocation: &Allocation, agents: &[A]) -> (usize, usize) {
    let table = valuation_table(allocation, agents);
    count_pairs(agents.len(), |envier, envied| {
        table[envier][envier] < table[envier][envied]
    })
}

/// EF1 violations: envy that dropping no single item from the envied bundle
/// can remove.
pub fn ef1_violations<A: Agent>(allocation: &Allocation, agents: &[A]) -> (usize, usize) {
    let bundles: Vec<Vec<ItemIndex>> = (0..agents.len()).map(|j| allocation.bundle(j)).collect();
    count_pairs(agents.len(), |envier, envied| {
        let own = agents[envier].value(&bundles[envier]);
        if own >= agents[envier].value(&bundles[envied]) {
            return false;
        }
        drop_one_values(&agents[envier], &bundles[envied]).all(|reduced| reduced > own)
    })
}

/// EFX violations: envy that survives dropping some single item from the
/// envied bundle.
pub fn efx_violations<A: Agent>(allocation: &Allocation, agents: &[A]) -> (usize, usize) {
    let bundles: Vec<Vec<ItemIndex>> = (0..agents.len()).map(|j| allocation.bundle(j)).collect();
    count_pairs(agents.len(), |envier, envied| {
        let own = agents[envier].value(&bundles[envier]);
        if own >= agents[envier].value(&bundles[envied]) {
            return false;
        }
        drop_one_values(&agents[envier], &bundles[envied]).any(|reduced| reduced > own)
    })
}

/// The envied bundle's value through the envier's eyes after each possible
/// single-item removal.
fn drop_one_values<'a, A: Agent>(
    agent: &'a A,
    envied: &'a [ItemIndex],
) -> impl Iterator<Item = u64> + 'a {
    (0..envied.len()).map(move |skip| {
        let reduced: Vec<ItemIndex> = envied
            .iter()
            .enumerate()
            .filter(|(pos, _)| *pos != skip)
            .map(|(_, &item)| item)
            .collect();
        agent.value(&reduced)
    })
}

fn count_pairs(n_agents: usize, envies: impl Fn(usize, usize) -> bool) -> (usize, usize) {
    let mut violations = 0_usize;
    let mut enviers = 0_usize;
    for envier in 0..n_agents {
        let mut envious = false;
        for envied in 0..n_agents {
            if envier != envied && envies(envier, envied) {
                violations += 1;
                envious = true;
            }
        }
        if envious {
            enviers += 1;
        }
    }
    (violations, enviers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::tests::plain_schedule;
    use crate::metrics::tests::CapAgent;

    /// Agent 1 holds nothing while agent 0 holds two items both agents want.
    fn envious_fixture() -> (Allocation, Vec<CapAgent>) {
        let items = plain_schedule(&[1, 1]);
        let mut allocation = Allocation::new(&items, 2);
        for item in [0, 1] {
            allocation.assign(item, 0);
            allocation.draw_from_pool(item);
        }
        (allocation, vec![CapAgent { cap: 2 }, CapAgent { cap: 2 }])
    }

    #[test]
    fn ef_counts_the_empty_handed_agent() {
        let (allocation, agents) = envious_fixture();
        assert_eq!(ef_violations(&allocation, &agents), (1, 1));
    }

    #[test]
    fn ef1_forgives_one_item_of_envy() {
        // After dropping one of agent 0's two items, agent 1 still envies
        // (0 < 1), so the violation stands; with a singleton bundle it
        // would not.
        let (allocation, agents) = envious_fixture();
        assert_eq!(ef1_violations(&allocation, &agents), (1, 1));

        let items = plain_schedule(&[1]);
        let mut single = Allocation::new(&items, 2);
        single.assign(0, 0);
        single.draw_from_pool(0);
        assert_eq!(ef1_violations(&single, &agents), (0, 0));
    }

    #[test]
    fn efx_implies_ef1_implies_ef() {
        let (allocation, agents) = envious_fixture();
        let (ef, _) = ef_violations(&allocation, &agents);
        let (ef1, _) = ef1_violations(&allocation, &agents);
        let (efx, _) = efx_violations(&allocation, &agents);
        assert!(ef >= ef1);
        assert!(ef1 >= efx);
    }

    #[test]
    fn no_envy_toward_empty_bundles() {
        let items = plain_schedule(&[1, 1]);
        let allocation = Allocation::new(&items, 2);
        let agents = vec![CapAgent { cap: 2 }, CapAgent { cap: 2 }];
        assert_eq!(ef_violations(&allocation, &agents), (0, 0));
        assert_eq!(efx_violations(&allocation, &agents), (0, 0));
    }
}
