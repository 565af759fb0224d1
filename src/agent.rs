//! Agents: valuation wrappers answering the allocator's queries.
//!
//! The allocator only ever asks four things of an agent: the value of a
//! bundle, the marginal contribution of an item, whether an exchange keeps
//! value, and which items the agent wants at all. [`Student`] is the
//! course-allocation agent; anything implementing [`Agent`] can be allocated.

use std::collections::HashSet;

use crate::constraints::{
    ConstraintError, CourseTimeConstraint, MutualExclusivityConstraint, PreferenceConstraint,
};
use crate::feature::Feature;
use crate::item::Item;
use crate::valuation::{ConstraintValuation, UniqueItemsValuation, Valuation};
use crate::ItemIndex;

/// The allocator-facing view of an agent.
pub trait Agent {
    /// Value of the bundle under the agent's valuation.
    fn value(&self, bundle: &[ItemIndex]) -> u64;

    /// `v(S ∪ {x}) − v(S)`; zero when `x` is already in `S`.
    fn marginal_contribution(&self, bundle: &[ItemIndex], item: ItemIndex) -> u64;

    /// True when swapping `leaving` for `entering` preserves value.
    fn exchange_contribution(
        &self,
        bundle: &[ItemIndex],
        leaving: ItemIndex,
        entering: ItemIndex,
    ) -> bool;

    /// Indices (ascending) of the items this agent wants at all.
    fn desired_items(&self, items: &[Item]) -> Vec<ItemIndex>;
}

/// Generic marginal contribution over any rank valuation.
pub fn marginal_contribution<V: Valuation>(
    valuation: &V,
    bundle: &[ItemIndex],
    item: ItemIndex,
) -> u64 {
    if bundle.contains(&item) {
        return 0;
    }
    let current = valuation.value(bundle);
    let mut grown = bundle.to_vec();
    grown.push(item);
    valuation.value(&grown) - current
}

/// Generic exchange predicate over any rank valuation.
///
/// The exchange requires `leaving` in the bundle, `entering` outside it, the
/// two distinct, and equal value after the swap.
pub fn exchange_contribution<V: Valuation>(
    valuation: &V,
    bundle: &[ItemIndex],
    leaving: ItemIndex,
    entering: ItemIndex,
) -> bool {
    if leaving == entering || bundle.contains(&entering) {
        return false;
    }
    let Some(position) = bundle.iter().position(|&i| i == leaving) else {
        return false;
    };
    let mut swapped = bundle.to_vec();
    swapped.remove(position);
    swapped.push(entering);
    valuation.value(&swapped) == valuation.value(bundle)
}

/// Rebuild an agent on a reduced schedule.
///
/// PMMS sub-instances re-index items and shrink capacities; a restrictable
/// agent re-derives its preferences and constraints against the sub-items.
pub trait Restrict: Sized {
    fn restrict(&self, items: &[Item]) -> Result<Self, ConstraintError>;
}

/// A course-allocation agent.
///
/// Preferences are held per topic with a per-topic quantity and an overall
/// course cap; global time-conflict and section-exclusivity constraints are
/// rebuilt from whatever schedule the student is constructed over. The
/// valuation applies the unique-items adapter at construction, so repeated
/// item queries from the allocator are safe, and is compiled down to a
/// single stacked constraint.
#[derive(Debug, Clone)]
pub struct Student {
    valuation: UniqueItemsValuation,
    topics: Vec<Vec<Item>>,
    quantities: Vec<u32>,
    total_courses: u32,
    course: Feature,
    slot: Feature,
    weekday: Feature,
}

impl Student {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        topics: Vec<Vec<Item>>,
        quantities: Vec<u32>,
        total_courses: u32,
        schedule: &[Item],
        course: &Feature,
        slot: &Feature,
        weekday: &Feature,
    ) -> Result<Self, ConstraintError> {
        let extent = crate::constraints::builders::extent_of(schedule);
        let preferred: Vec<Item> = {
            let mut seen: Vec<Item> = Vec::new();
            for item in topics.iter().flatten() {
                if !seen.contains(item) {
                    seen.push(item.clone());
                }
            }
            seen
        };
        let undesired: Vec<Item> = schedule
            .iter()
            .filter(|item| !preferred.contains(*item))
            .cloned()
            .collect();

        let mut constraints = vec![
            PreferenceConstraint::from_item_lists(
                &[preferred],
                &[total_courses],
                extent,
            )?,
            PreferenceConstraint::from_item_lists(&[undesired], &[0], extent)?,
            PreferenceConstraint::from_item_lists(&topics, &quantities, extent)?,
        ];
        constraints.push(CourseTimeConstraint::from_items(schedule, slot, weekday)?);
        constraints.push(MutualExclusivityConstraint::from_items(schedule, course)?);

        let valuation =
            UniqueItemsValuation::new(ConstraintValuation::new(constraints)).compile()?;
        Ok(Self {
            valuation,
            topics,
            quantities,
            total_courses,
            course: course.clone(),
            slot: slot.clone(),
            weekday: weekday.clone(),
        })
    }

    pub fn valuation(&self) -> &UniqueItemsValuation {
        &self.valuation
    }

    pub fn topics(&self) -> &[Vec<Item>] {
        &self.topics
    }

    pub fn quantities(&self) -> &[u32] {
        &self.quantities
    }

    pub fn total_courses(&self) -> u32 {
        self.total_courses
    }

    /// Union of the per-topic preference lists.
    pub fn preferred_items(&self) -> Vec<Item> {
        let mut preferred: Vec<Item> = Vec::new();
        for item in self.topics.iter().flatten() {
            if !preferred.contains(item) {
                preferred.push(item.clone());
            }
        }
        preferred
    }
}

impl Agent for Student {
    fn value(&self, bundle: &[ItemIndex]) -> u64 {
        self.valuation.value(bundle)
    }

    fn marginal_contribution(&self, bundle: &[ItemIndex], item: ItemIndex) -> u64 {
        marginal_contribution(&self.valuation, bundle, item)
    }

    fn exchange_contribution(
        &self,
        bundle: &[ItemIndex],
        leaving: ItemIndex,
        entering: ItemIndex,
    ) -> bool {
        exchange_contribution(&self.valuation, bundle, leaving, entering)
    }

    fn desired_items(&self, items: &[Item]) -> Vec<ItemIndex> {
        let preferred: HashSet<&Item> = self.topics.iter().flatten().collect();
        let mut desired: Vec<ItemIndex> = items
            .iter()
            .filter(|item| preferred.contains(item))
            .map(Item::index)
            .collect();
        desired.sort_unstable();
        desired
    }
}

impl Restrict for Student {
    /// Intersects the per-topic preferences with the sub-schedule and
    /// rebuilds every constraint against it. Quantities and the overall cap
    /// carry over unchanged.
    fn restrict(&self, items: &[Item]) -> Result<Self, ConstraintError> {
        let topics: Vec<Vec<Item>> = self
            .topics
            .iter()
            .map(|topic| {
                topic
                    .iter()
                    .filter_map(|preferred| {
                        items.iter().find(|item| *item == preferred).cloned()
                    })
                    .collect()
            })
            .collect();
        Student::new(
            topics,
            self.quantities.clone(),
            self.total_courses,
            items,
            &self.course,
            &self.slot,
            &self.weekday,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureValue;
    use std::sync::Arc;

    fn campus() -> (Vec<Item>, Feature, Feature, Feature) {
        let course = Feature::course(["250", "301", "611"]);
        let slot = Feature::time_slots(&["09:00-09:50", "10:00-10:50", "11:00-11:50"], 15)
            .unwrap();
        let weekday = Feature::weekday();
        let features: Arc<[Feature]> =
            Arc::from(vec![course.clone(), slot.clone(), weekday.clone()]);
        let mk = |code: &str, range: &str, index: usize| {
            Item::new(
                "schedule",
                Arc::clone(&features),
                vec![
                    FeatureValue::token(code),
                    FeatureValue::ticks(
                        crate::feature::slots_for_time_range(range, 15).unwrap(),
                    ),
                    FeatureValue::tokens(["Mon"]),
                ],
                index,
                1,
            )
            .unwrap()
        };
        let items = vec![
            mk("250", "09:00-09:50", 0),
            mk("301", "10:00-10:50", 1),
            mk("611", "11:00-11:50", 2),
        ];
        (items, course, slot, weekday)
    }

    fn student(items: &[Item], course: &Feature, slot: &Feature, weekday: &Feature) -> Student {
        Student::new(
            vec![vec![items[0].clone(), items[1].clone()]],
            vec![2],
            2,
            items,
            course,
            slot,
            weekday,
        )
        .unwrap()
    }

    // ── queries ───────────────────────────────────────────────────────

    #[test]
    fn marginal_contribution_is_zero_for_held_item() {
        let (items, course, slot, weekday) = campus();
        let s = student(&items, &course, &slot, &weekday);
        assert_eq!(s.marginal_contribution(&[], 0), 1);
        assert_eq!(s.marginal_contribution(&[0], 0), 0);
        // Undesired item adds nothing.
        assert_eq!(s.marginal_contribution(&[], 2), 0);
    }

    #[test]
    fn exchange_requires_membership_and_equal_value() {
        let (items, course, slot, weekday) = campus();
        let s = student(&items, &course, &slot, &weekday);
        assert!(s.exchange_contribution(&[0], 0, 1));
        assert!(!s.exchange_contribution(&[0], 0, 0));
        assert!(!s.exchange_contribution(&[0, 1], 0, 1)); // entering already held
        assert!(!s.exchange_contribution(&[1], 0, 1)); // leaving not held
    }

    #[test]
    fn desired_items_are_the_preferred_indices() {
        let (items, course, slot, weekday) = campus();
        let s = student(&items, &course, &slot, &weekday);
        assert_eq!(s.desired_items(&items), vec![0, 1]);
    }

    // ── restriction ───────────────────────────────────────────────────

    #[test]
    fn restrict_intersects_preferences_and_reindexes() {
        let (items, course, slot, weekday) = campus();
        let s = student(&items, &course, &slot, &weekday);

        // Sub-schedule holding only item 301, re-indexed to zero.
        let sub = vec![items[1].with_placement(0, 1)];
        let restricted = s.restrict(&sub).unwrap();
        assert_eq!(restricted.desired_items(&sub), vec![0]);
        assert_eq!(restricted.value(&[0]), 1);
        assert_eq!(restricted.total_courses(), s.total_courses());
    }
}
