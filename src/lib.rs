//! fairsched - fair allocation of capacity-constrained schedulable items
//!
//! A constraint-driven fair-division library: items carry typed feature
//! values, agents value bundles through matroid-rank valuations induced by
//! linear constraints, and the General Yankee Swap allocator produces a
//! Lorenz-dominant allocation by augmenting-path search over an exchange
//! graph. Welfare, envy and pairwise-maximin-share metrics evaluate the
//! result, with an optional 0/1-program oracle for small instances.

pub mod agent;
pub mod allocation;
pub mod constraints;
pub mod feature;
pub mod item;
pub mod metrics;
pub mod optimization;
pub mod simulation;
pub mod valuation;

// Re-export the types a caller touches on every run.
pub use agent::{Agent, Restrict, Student};
pub use allocation::{
    general_yankee_swap, general_yankee_swap_with, round_robin, serial_dictatorship,
    Allocation, AllocationError, Criteria, SwapOutcome,
};
pub use constraints::{ConstraintError, LinearConstraint};
pub use feature::{Feature, FeatureError, FeatureValue};
pub use item::{Item, ItemError};
pub use valuation::{ConstraintValuation, UniqueItemsValuation, Valuation};

/// Index type positioning an item in constraint and allocation matrices.
///
/// Indices are dense per run: the `i`-th schedule item has index `i`.
pub type ItemIndex = usize;
