//! Linear bundle constraints in matrix form `A·x ≤ b`.
//!
//! A bundle satisfies a constraint when the 0/1 indicator of its item
//! indices, multiplied by `A`, stays within `b` componentwise. The indicator
//! collapses duplicate items; multiset semantics live one level up, in the
//! valuation (see [`crate::valuation`]).

use std::collections::BTreeMap;

use ndarray::{Array1, Array2};

use super::error::ConstraintError;
use super::indicator;
use crate::item::Item;
use crate::ItemIndex;

/// A stack of `m` linear inequalities over an indicator of length `extent`.
///
/// `A` and `b` are integer; `extent` (the column count) must exceed the
/// largest item index the constraint will ever be asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    a: Array2<i64>,
    b: Array1<i64>,
}

impl LinearConstraint {
    /// Creates a constraint from a dense matrix and right-hand side.
    pub fn new(a: Array2<i64>, b: Array1<i64>) -> Result<Self, ConstraintError> {
        if a.nrows() != b.len() {
            return Err(ConstraintError::RowCountMismatch {
                rows: a.nrows(),
                rhs: b.len(),
            });
        }
        Ok(Self { a, b })
    }

    /// Creates a constraint from per-row `(column, coefficient)` entries.
    ///
    /// The pure inverse of [`LinearConstraint::sparse_rows`].
    pub fn from_sparse_rows(
        rows: &[Vec<(usize, i64)>],
        b: &[i64],
        extent: usize,
    ) -> Result<Self, ConstraintError> {
        if rows.len() != b.len() {
            return Err(ConstraintError::RowCountMismatch {
                rows: rows.len(),
                rhs: b.len(),
            });
        }
        let mut a = Array2::zeros((rows.len(), extent));
        for (row, entries) in rows.iter().enumerate() {
            for &(column, coefficient) in entries {
                if column >= extent {
                    return Err(ConstraintError::ColumnOutOfRange { column, extent });
                }
                a[[row, column]] += coefficient;
            }
        }
        Ok(Self {
            a,
            b: Array1::from(b.to_vec()),
        })
    }

    /// Number of indicator columns this constraint spans.
    pub fn extent(&self) -> usize {
        self.a.ncols()
    }

    /// Number of inequality rows.
    pub fn rows(&self) -> usize {
        self.a.nrows()
    }

    pub fn matrix(&self) -> &Array2<i64> {
        &self.a
    }

    pub fn rhs(&self) -> &Array1<i64> {
        &self.b
    }

    /// True if `A·χ(bundle) ≤ b` componentwise.
    pub fn satisfies(&self, bundle: &[ItemIndex]) -> bool {
        let ind = indicator(self.extent(), bundle);
        let product = self.a.dot(&ind);
        product.iter().zip(self.b.iter()).all(|(lhs, rhs)| lhs <= rhs)
    }

    /// The rows each item participates in, for diagnostics and program
    /// assembly.
    pub fn constrained_items(&self, items: &[Item]) -> BTreeMap<ItemIndex, Vec<usize>> {
        let mut active: BTreeMap<ItemIndex, Vec<usize>> = BTreeMap::new();
        for row in 0..self.rows() {
            for item in items {
                if item.index() < self.extent() && self.a[[row, item.index()]] != 0 {
                    active.entry(item.index()).or_default().push(row);
                }
            }
        }
        active
    }

    /// Drops all-zero rows. Satisfaction semantics are unchanged.
    pub fn prune(&self) -> LinearConstraint {
        let kept: Vec<usize> = (0..self.rows())
            .filter(|&row| self.a.row(row).iter().any(|&c| c != 0))
            .collect();
        let a = Array2::from_shape_fn((kept.len(), self.extent()), |(i, j)| {
            self.a[[kept[i], j]]
        });
        let b = Array1::from_iter(kept.iter().map(|&row| self.b[row]));
        Self { a, b }
    }

    /// Vertically stacks two constraints of equal extent into one equivalent
    /// constraint (satisfied iff both inputs are).
    pub fn stack(&self, other: &LinearConstraint) -> Result<LinearConstraint, ConstraintError> {
        if self.extent() != other.extent() {
            return Err(ConstraintError::ExtentMismatch {
                left: self.extent(),
                right: other.extent(),
            });
        }
        let rows = self.rows() + other.rows();
        let a = Array2::from_shape_fn((rows, self.extent()), |(i, j)| {
            if i < self.rows() {
                self.a[[i, j]]
            } else {
                other.a[[i - self.rows(), j]]
            }
        });
        let b = Array1::from_iter(self.b.iter().chain(other.b.iter()).copied());
        Ok(Self { a, b })
    }

    /// Per-row `(column, coefficient)` entries for the nonzero coefficients.
    pub fn sparse_rows(&self) -> Vec<Vec<(usize, i64)>> {
        (0..self.rows())
            .map(|row| {
                self.a
                    .row(row)
                    .iter()
                    .enumerate()
                    .filter(|(_, &c)| c != 0)
                    .map(|(column, &c)| (column, c))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn cap_two() -> LinearConstraint {
        // x0 + x1 + x2 <= 2
        LinearConstraint::new(array![[1, 1, 1]], array![2]).unwrap()
    }

    fn exclusive_pair() -> LinearConstraint {
        // x0 + x1 <= 1, padded with a zero row
        LinearConstraint::new(array![[1, 1, 0], [0, 0, 0]], array![1, 5]).unwrap()
    }

    // ── construction ──────────────────────────────────────────────────

    #[test]
    fn rejects_row_count_mismatch() {
        let err = LinearConstraint::new(array![[1, 0]], array![1, 2]).unwrap_err();
        assert!(matches!(err, ConstraintError::RowCountMismatch { .. }));
    }

    #[test]
    fn sparse_rows_round_trip() {
        let dense = exclusive_pair();
        let rows = dense.sparse_rows();
        assert_eq!(rows, vec![vec![(0, 1), (1, 1)], vec![]]);

        let back = LinearConstraint::from_sparse_rows(
            &rows,
            dense.rhs().as_slice().unwrap(),
            dense.extent(),
        )
        .unwrap();
        assert_eq!(back, dense);
    }

    #[test]
    fn sparse_rows_reject_out_of_extent_column() {
        let err =
            LinearConstraint::from_sparse_rows(&[vec![(3, 1)]], &[1], 3).unwrap_err();
        assert!(matches!(err, ConstraintError::ColumnOutOfRange { .. }));
    }

    // ── satisfies ─────────────────────────────────────────────────────

    #[test]
    fn satisfies_respects_rhs() {
        let c = cap_two();
        assert!(c.satisfies(&[]));
        assert!(c.satisfies(&[0, 2]));
        assert!(!c.satisfies(&[0, 1, 2]));
    }

    #[test]
    fn duplicate_indices_collapse_in_indicator() {
        let c = cap_two();
        // Three copies of one item occupy a single indicator column.
        assert!(c.satisfies(&[1, 1, 1]));
    }

    // ── prune / stack ─────────────────────────────────────────────────

    #[test]
    fn prune_preserves_satisfaction() {
        let c = exclusive_pair();
        let pruned = c.prune();
        assert_eq!(pruned.rows(), 1);
        for bundle in [&[][..], &[0][..], &[0, 1][..], &[1, 2][..]] {
            assert_eq!(pruned.satisfies(bundle), c.satisfies(bundle));
        }
    }

    #[test]
    fn stack_is_conjunction() {
        let c1 = cap_two();
        let c2 = exclusive_pair();
        let stacked = c1.stack(&c2).unwrap();
        for bundle in [&[][..], &[0][..], &[0, 1][..], &[0, 2][..], &[0, 1, 2][..]] {
            assert_eq!(
                stacked.satisfies(bundle),
                c1.satisfies(bundle) && c2.satisfies(bundle)
            );
        }
    }

    #[test]
    fn stack_rejects_extent_mismatch() {
        let narrow = LinearConstraint::new(array![[1, 1]], array![1]).unwrap();
        let err = cap_two().stack(&narrow).unwrap_err();
        assert!(matches!(err, ConstraintError::ExtentMismatch { .. }));
    }
}
