//! Items: tuples of feature values with a stable index and a capacity.
//!
//! An [`Item`] is immutable after construction. Its `index` positions it in
//! every constraint matrix and allocation matrix of the run; its `capacity`
//! is the number of copies available to allocate. Equality and hashing cover
//! `(name, values)` only, so the same offering keeps its identity across
//! re-indexed sub-schedules.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use thiserror::Error;

use crate::feature::{Feature, FeatureValue};
use crate::ItemIndex;

/// Errors raised at item construction or feature access.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("item '{item}' has {values} values for {features} features")]
    ValueCountMismatch {
        item: String,
        features: usize,
        values: usize,
    },

    #[error("value '{value}' is outside the domain of feature '{feature}'")]
    Domain { feature: String, value: String },

    #[error("feature '{feature}' was not declared for item '{item}'")]
    UnknownFeature { item: String, feature: String },
}

/// A schedulable item defined over a shared feature list.
#[derive(Debug, Clone)]
pub struct Item {
    name: String,
    features: Arc<[Feature]>,
    values: Vec<FeatureValue>,
    index: ItemIndex,
    capacity: u32,
}

impl Item {
    /// Validates that values correspond 1:1 with features and that each value
    /// lies in its feature's domain.
    pub fn new(
        name: impl Into<String>,
        features: Arc<[Feature]>,
        values: Vec<FeatureValue>,
        index: ItemIndex,
        capacity: u32,
    ) -> Result<Self, ItemError> {
        let name = name.into();
        if values.len() != features.len() {
            return Err(ItemError::ValueCountMismatch {
                item: name,
                features: features.len(),
                values: values.len(),
            });
        }
        for (feature, value) in features.iter().zip(&values) {
            if !feature.admits(value) {
                return Err(ItemError::Domain {
                    feature: feature.name().to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(Self {
            name,
            features,
            values,
            index,
            capacity,
        })
    }

    /// The value this item holds for `feature`.
    pub fn value(&self, feature: &Feature) -> Result<&FeatureValue, ItemError> {
        self.features
            .iter()
            .position(|f| f == feature)
            .map(|pos| &self.values[pos])
            .ok_or_else(|| ItemError::UnknownFeature {
                item: self.name.clone(),
                feature: feature.name().to_string(),
            })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    pub fn index(&self) -> ItemIndex {
        self.index
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// The same offering placed at a different index with a different
    /// capacity. Values were validated at the original construction.
    pub fn with_placement(&self, index: ItemIndex, capacity: u32) -> Self {
        Self {
            name: self.name.clone(),
            features: Arc::clone(&self.features),
            values: self.values.clone(),
            index,
            capacity,
        }
    }

    /// Canonical sort key: identity, ignoring index and capacity.
    fn identity(&self) -> (&str, &[FeatureValue]) {
        (&self.name, &self.values)
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.values.hash(state);
    }
}

/// Merges bundles into the reduced schedule of a pairwise sub-instance.
///
/// The result holds each distinct item once, re-indexed from zero in a
/// canonical (identity-sorted) order, with capacity equal to the item's
/// multiplicity across the given bundles.
pub fn sub_schedule(bundles: &[&[Item]]) -> Vec<Item> {
    let merged: Vec<&Item> = bundles.iter().flat_map(|b| b.iter()).collect();
    let mut distinct: Vec<&Item> = Vec::new();
    for &item in &merged {
        if !distinct.iter().any(|d| *d == item) {
            distinct.push(item);
        }
    }
    distinct.sort_by(|a, b| a.identity().cmp(&b.identity()));
    distinct
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let multiplicity = merged.iter().filter(|m| **m == item).count() as u32;
            item.with_placement(index, multiplicity)
        })
        .collect()
}
