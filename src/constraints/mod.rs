pub mod builders;
pub mod error;
pub mod linear;

pub use builders::{CourseTimeConstraint, MutualExclusivityConstraint, PreferenceConstraint};
pub use error::ConstraintError;
pub use linear::LinearConstraint;

use ndarray::Array1;

use crate::ItemIndex;

/// 0/1 indicator vector of a bundle over `extent` columns.
///
/// Duplicate indices collapse to a single 1; indices must lie below `extent`
/// (a violation is a construction bug, asserted in strict builds).
pub fn indicator(extent: usize, bundle: &[ItemIndex]) -> Array1<i64> {
    let mut ind = Array1::zeros(extent);
    for &index in bundle {
        debug_assert!(index < extent, "item index {index} outside extent {extent}");
        if index < extent {
            ind[index] = 1;
        }
    }
    ind
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_collapses_duplicates() {
        let ind = indicator(4, &[1, 1, 3]);
        assert_eq!(ind.to_vec(), vec![0, 1, 0, 1]);
    }

    #[test]
    fn indicator_of_empty_bundle_is_zero() {
        assert_eq!(indicator(3, &[]).to_vec(), vec![0, 0, 0]);
    }
}
