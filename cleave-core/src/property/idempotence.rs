//! Idempotence: seeding a cleave with its own groups reproduces it.
//!
//! - **Full re-seeding**: every supervoxel is re-seeded with its group's
//!   label (unassigned groups receive fresh labels above the operator's) and
//!   the cleave is re-run without a merge threshold. Assignments and cut
//!   edges must be unchanged.
//! - **One seed per group**: a cleave seeded with one supervoxel per label is
//!   re-run with one seed taken from each seeded group of its result. The
//!   outcome must be identical. Picking other group members as seeds can
//!   move the cut, so the seeds are drawn from the groups' own seeds.

use std::collections::BTreeMap;

use proptest::{prop_assert_eq, test_runner::TestCaseResult};

use crate::{CleaveOutcome, GroupKind, SeedAssignments, SeedLabel, SupervoxelId};

use super::{
    helpers::{STRATEGIES, cleave},
    types::CleaveFixture,
};

const FRESH_LABEL_BASE: u64 = 1 << 40;

/// Runs the idempotence property for the given fixture.
pub(super) fn run_idempotence_property(fixture: &CleaveFixture) -> TestCaseResult {
    for strategy in STRATEGIES {
        let first = cleave(fixture, strategy)?;
        let CleaveOutcome::Separated(first) = first else {
            continue;
        };

        let seeds: SeedAssignments = first
            .assignments()
            .iter()
            .map(|&(supervoxel, group)| {
                let label = first
                    .group(group)
                    .and_then(|summary| match summary.kind() {
                        GroupKind::Unassigned => None,
                        _ => summary.label(),
                    })
                    .unwrap_or_else(|| SeedLabel::new(FRESH_LABEL_BASE + u64::from(group.get())));
                (supervoxel, label)
            })
            .collect();
        let reseeded = CleaveFixture {
            raw: fixture.raw.clone(),
            seeds,
            min_merge_weight: 0.0,
            shape: fixture.shape,
        };

        let second = cleave(&reseeded, strategy)?;
        prop_assert_eq!(second.result().assignments(), first.assignments());
        prop_assert_eq!(second.result().cut_edges(), first.cut_edges());
    }
    Ok(())
}

/// Runs the one-seed-per-group idempotence property for the given fixture.
pub(super) fn run_single_seed_idempotence_property(fixture: &CleaveFixture) -> TestCaseResult {
    let mut first_seed: BTreeMap<SeedLabel, SupervoxelId> = BTreeMap::new();
    for &(supervoxel, label) in fixture.seeds.pairs() {
        first_seed
            .entry(label)
            .and_modify(|current| *current = (*current).min(supervoxel))
            .or_insert(supervoxel);
    }
    let single = CleaveFixture {
        seeds: first_seed
            .into_iter()
            .map(|(label, supervoxel)| (supervoxel, label))
            .collect(),
        ..fixture.clone()
    };

    for strategy in STRATEGIES {
        let first = cleave(&single, strategy)?;
        let seeds: SeedAssignments = first
            .result()
            .groups()
            .iter()
            .filter(|group| group.kind() == GroupKind::Seeded)
            .filter_map(|group| Some((*group.seeds().first()?, group.label()?)))
            .collect();
        let reseeded = CleaveFixture {
            seeds,
            ..single.clone()
        };

        let second = cleave(&reseeded, strategy)?;
        prop_assert_eq!(second, first);
    }
    Ok(())
}
