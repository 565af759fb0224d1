//! Constraint builders deriving `(A, b)` from items and features.
//!
//! Each builder is a namespace struct with a single constructor, mirroring
//! how course-allocation constraints arise in practice: bounded preferences
//! per category, no two meetings in the same weekday tick, and at most one
//! item per exclusive feature value (one section per course).

use ndarray::{Array1, Array2};

use super::error::ConstraintError;
use super::linear::LinearConstraint;
use crate::feature::Feature;
use crate::item::Item;

/// One column past the largest index among `items`; zero for an empty slice.
pub(crate) fn extent_of(items: &[Item]) -> usize {
    items.iter().map(|i| i.index() + 1).max().unwrap_or(0)
}

/// Bounded selections from pre-selected item categories.
pub struct PreferenceConstraint;

impl PreferenceConstraint {
    /// One row per category with 1s at the indices of that category's items
    /// and the category limit on the right-hand side.
    pub fn from_item_lists(
        categories: &[Vec<Item>],
        limits: &[u32],
        extent: usize,
    ) -> Result<LinearConstraint, ConstraintError> {
        if categories.len() != limits.len() {
            return Err(ConstraintError::CategoryLimitMismatch {
                categories: categories.len(),
                limits: limits.len(),
            });
        }
        let mut a = Array2::zeros((categories.len(), extent));
        for (row, category) in categories.iter().enumerate() {
            for item in category {
                if item.index() >= extent {
                    return Err(ConstraintError::ColumnOutOfRange {
                        column: item.index(),
                        extent,
                    });
                }
                a[[row, item.index()]] = 1;
            }
        }
        let b = Array1::from_iter(limits.iter().map(|&l| i64::from(l)));
        LinearConstraint::new(a, b)
    }
}

/// No two items meeting in the same weekday tick.
pub struct CourseTimeConstraint;

impl CourseTimeConstraint {
    /// One row per `(weekday, slot-tick)` pair with 1s at the items whose
    /// weekday pattern and slot span both touch it; every right-hand side
    /// is 1.
    pub fn from_items(
        items: &[Item],
        slot: &Feature,
        weekday: &Feature,
    ) -> Result<LinearConstraint, ConstraintError> {
        let extent = extent_of(items);
        let rows = weekday.domain().len() * slot.domain().len();
        let mut a = Array2::zeros((rows, extent));
        let mut row = 0;
        for day in weekday.domain() {
            for tick in slot.domain() {
                for item in items {
                    let on_day = item.value(weekday)?.contains_atom(day);
                    let in_tick = item.value(slot)?.contains_atom(tick);
                    if on_day && in_tick {
                        a[[row, item.index()]] = 1;
                    }
                }
                row += 1;
            }
        }
        LinearConstraint::new(a, Array1::ones(rows))
    }
}

/// At most one item per value of an exclusive feature.
pub struct MutualExclusivityConstraint;

impl MutualExclusivityConstraint {
    /// One row per domain value of `exclusive` with 1s at all items holding
    /// that value; every right-hand side is 1.
    pub fn from_items(
        items: &[Item],
        exclusive: &Feature,
    ) -> Result<LinearConstraint, ConstraintError> {
        let extent = extent_of(items);
        let rows = exclusive.domain().len();
        let mut a = Array2::zeros((rows, extent));
        for (row, value) in exclusive.domain().iter().enumerate() {
            for item in items {
                if item.value(exclusive)?.contains_atom(value) {
                    a[[row, item.index()]] = 1;
                }
            }
        }
        LinearConstraint::new(a, Array1::ones(rows))
    }
}
