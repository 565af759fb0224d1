use thiserror::Error;

use crate::item::ItemError;

/// Errors that can occur while building or combining linear constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConstraintError {
    #[error("constraint extents differ: {left} columns vs {right}")]
    ExtentMismatch { left: usize, right: usize },

    #[error("constraint matrix has {rows} rows but right-hand side has {rhs}")]
    RowCountMismatch { rows: usize, rhs: usize },

    #[error("{categories} preference categories but {limits} limits")]
    CategoryLimitMismatch { categories: usize, limits: usize },

    #[error("column {column} lies outside extent {extent}")]
    ColumnOutOfRange { column: usize, extent: usize },

    #[error(transparent)]
    Item(#[from] ItemError),
}
