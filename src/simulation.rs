//! Randomly composed student agents for simulation sweeps.
//!
//! The core never draws randomness; simulated populations thread an
//! explicit seed, so equal seeds compose equal students and whole runs
//! replay bit-identically.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::agent::Student;
use crate::constraints::ConstraintError;
use crate::feature::Feature;
use crate::item::Item;

/// Samples a student over topic-grouped catalog items.
///
/// Per topic, a quantity is drawn from `0..=max_per_topic` (clamped to the
/// topic size) and that many distinct items are picked; the overall course
/// cap is drawn from `total_range`. The sampled preferences then compose
/// the usual constraint set: overall cap, zero undesired items, one
/// quantity bound per topic, and the global time and section-exclusivity
/// constraints over `schedule`.
#[allow(clippy::too_many_arguments)]
pub fn random_student(
    topics: &[Vec<Item>],
    max_per_topic: &[u32],
    total_range: std::ops::RangeInclusive<u32>,
    schedule: &[Item],
    course: &Feature,
    slot: &Feature,
    weekday: &Feature,
    seed: u64,
) -> Result<Student, ConstraintError> {
    if topics.len() != max_per_topic.len() {
        return Err(ConstraintError::CategoryLimitMismatch {
            categories: topics.len(),
            limits: max_per_topic.len(),
        });
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sampled_topics: Vec<Vec<Item>> = Vec::with_capacity(topics.len());
    let mut quantities: Vec<u32> = Vec::with_capacity(topics.len());
    for (topic, &cap) in topics.iter().zip(max_per_topic) {
        let quantity = rng.gen_range(0..=cap.min(topic.len() as u32));
        let mut picks = rand::seq::index::sample(&mut rng, topic.len(), quantity as usize)
            .into_vec();
        picks.sort_unstable();
        sampled_topics.push(picks.into_iter().map(|p| topic[p].clone()).collect());
        quantities.push(quantity);
    }
    let total_courses = rng.gen_range(total_range);
    Student::new(
        sampled_topics,
        quantities,
        total_courses,
        schedule,
        course,
        slot,
        weekday,
    )
}
