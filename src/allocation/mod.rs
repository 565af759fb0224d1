//! Allocation state and allocation algorithms.
//!
//! The [`Allocation`] matrix is the single source of truth while an
//! algorithm runs: one row per item, one 0/1 column per agent, and a final
//! residual-capacity pool column. [`general_yankee_swap`] is the production
//! allocator; [`serial_dictatorship`] and [`round_robin`] are the greedy
//! baselines it is measured against.

pub mod baselines;
pub mod error;
mod exchange;
pub mod yankee;


pub use baselines::{round_robin, serial_dictatorship, spire};
pub use error::AllocationError;
pub use yankee::{general_yankee_swap, general_yankee_swap_with, Criteria, SwapOutcome};

use ndarray::Array2;

use crate::item::Item;
use crate::ItemIndex;

/// The `(n_items, n_agents + 1)` allocation matrix.
///
/// Column `n_agents` is the pool: it starts at each item's capacity and is
/// decremented whenever a copy moves to an agent, so every row always sums
/// to the item's capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    matrix: Array2<i64>,
    n_agents: usize,
}

impl Allocation {
    /// All agent columns zero, pool column at capacity.
    ///
    /// Items must be indexed densely: `items[i].index() == i`.
    pub fn new(items: &[Item], n_agents: usize) -> Self {
        debug_assert!(
            items.iter().enumerate().all(|(i, item)| item.index() == i),
            "items must be densely indexed in order"
        );
        let mut matrix = Array2::zeros((items.len(), n_agents + 1));
        for (row, item) in items.iter().enumerate() {
            matrix[[row, n_agents]] = i64::from(item.capacity());
        }
        Self { matrix, n_agents }
    }

    pub fn n_agents(&self) -> usize {
        self.n_agents
    }

    pub fn n_items(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn matrix(&self) -> &Array2<i64> {
        &self.matrix
    }

    /// Item indices (ascending) currently assigned to `agent`.
    pub fn bundle(&self, agent: usize) -> Vec<ItemIndex> {
        (0..self.n_items())
            .filter(|&item| self.matrix[[item, agent]] == 1)
            .collect()
    }

    /// Agents (ascending) currently holding a copy of `item`.
    pub fn owners(&self, item: ItemIndex) -> Vec<usize> {
        (0..self.n_agents)
            .filter(|&agent| self.matrix[[item, agent]] == 1)
            .collect()
    }

    /// Remaining pool capacity of `item`.
    pub fn pool(&self, item: ItemIndex) -> i64 {
        self.matrix[[item, self.n_agents]]
    }

    /// Copies of `item` placed anywhere, pool included.
    pub fn row_total(&self, item: ItemIndex) -> i64 {
        self.matrix.row(item).sum()
    }

    pub(crate) fn assign(&mut self, item: ItemIndex, agent: usize) {
        debug_assert_eq!(self.matrix[[item, agent]], 0, "double assignment");
        self.matrix[[item, agent]] = 1;
    }

    pub(crate) fn release(&mut self, item: ItemIndex, agent: usize) {
        debug_assert_eq!(self.matrix[[item, agent]], 1, "releasing unheld item");
        self.matrix[[item, agent]] = 0;
    }

    pub(crate) fn draw_from_pool(&mut self, item: ItemIndex) {
        debug_assert!(self.pool(item) > 0, "drawing from an empty pool");
        self.matrix[[item, self.n_agents]] -= 1;
    }
}
