use thiserror::Error;

/// Errors that can occur when configuring an allocation run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("{agents} agents but {weights} weights for a weighted criterion")]
    WeightsMismatch { agents: usize, weights: usize },
}
