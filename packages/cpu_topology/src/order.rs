//! Orderings of topology entries.
//!
//! The optimal order puts processors that are good to pack worker threads onto first, and keeps
//! processors that share hardware next to each other, so that slicing the ordered table into
//! consecutive chunks yields thread groups with good locality.

use std::cmp::Ordering;

use itertools::Itertools;

use crate::{CpuTopoEntry, GroupDimension};

/// Orders entries by how suitable they are for running worker threads, best first.
///
/// The first property that tells the entries apart decides:
///
/// 1. available processors (neither offline nor excluded) come first;
/// 2. higher capacity comes first, but only if the capacities are in different tiers
///    (see below); an unknown or zero capacity never wins;
/// 3. more hardware threads per core comes first;
/// 4. then the package, NUMA node, L3 cache, cluster, L2 cache, thread set and L1 cache IDs,
///    in that order, with smaller IDs first and unknown IDs after every known one;
/// 5. finally, the smaller processor index comes first.
///
/// Comparing capacities pairwise with a 5% margin is not transitive (1000 ~ 960 ~ 920 but
/// 1000 > 920), which sorting cannot tolerate. The capacities present in the entries are instead
/// grouped into tiers when the order is created: a capacity more than 5% below the fastest
/// capacity of the current tier starts a new tier. Capacities more than 5% apart are therefore
/// always in different tiers.
///
/// An `OptimalOrder` only knows the capacities of the entries it was created from and ranks
/// any other capacity together with the unknown ones.
///
/// # Example
///
/// ```
/// use cpu_topology::{CpuTopoEntry, OptimalOrder};
///
/// let mut entries = vec![
///     CpuTopoEntry::new(0).with_capacity(512),
///     CpuTopoEntry::new(1).with_capacity(1000),
///     CpuTopoEntry::new(2).with_capacity(1024),
/// ];
///
/// let order = OptimalOrder::new(&entries);
/// entries.sort_unstable_by(|a, b| order.compare(a, b));
///
/// let indexes: Vec<_> = entries.iter().map(CpuTopoEntry::index).collect();
/// assert_eq!(indexes, [1, 2, 0]);
/// ```
#[derive(Clone, Debug)]
pub struct OptimalOrder {
    // Distinct known capacities, descending, with the tier of each.
    tiers: Vec<(u32, u32)>,
}

impl OptimalOrder {
    /// Creates the order for sorting `entries`.
    #[must_use]
    pub fn new(entries: &[CpuTopoEntry]) -> Self {
        let mut tiers = Vec::new();
        let mut tier: u32 = 0;
        let mut tier_top: Option<u32> = None;

        let capacities = entries
            .iter()
            .filter_map(CpuTopoEntry::capacity)
            .filter(|capacity| *capacity > 0)
            .sorted_unstable_by(|a, b| b.cmp(a))
            .dedup();

        for capacity in capacities {
            match tier_top {
                None => tier_top = Some(capacity),
                Some(top) if compare_capacity(Some(top), Some(capacity)) == Ordering::Less => {
                    tier = tier.saturating_add(1);
                    tier_top = Some(capacity);
                }
                Some(_) => {}
            }

            tiers.push((capacity, tier));
        }

        Self { tiers }
    }

    /// Rank of the capacity, smaller is faster.
    pub(crate) fn rank(&self, capacity: Option<u32>) -> u32 {
        capacity
            .filter(|capacity| *capacity > 0)
            .and_then(|capacity| {
                self.tiers
                    .binary_search_by(|(candidate, _)| capacity.cmp(candidate))
                    .ok()
            })
            .and_then(|position| self.tiers.get(position))
            .map_or(u32::MAX, |(_, tier)| *tier)
    }

    /// Compares two entries, best first. This is a total order, suitable for sorting.
    #[must_use]
    pub fn compare(&self, a: &CpuTopoEntry, b: &CpuTopoEntry) -> Ordering {
        let capacity_order = self.rank(a.capacity()).cmp(&self.rank(b.capacity()));

        compare_with_capacity_order(a, b, capacity_order)
    }
}

/// Compares two entries by processor index, restoring the order the table was created in.
#[must_use]
pub fn compare_index(a: &CpuTopoEntry, b: &CpuTopoEntry) -> Ordering {
    a.index().cmp(&b.index())
}
fn compare_with_capacity_order(
    a: &CpuTopoEntry,
    b: &CpuTopoEntry,
    capacity_order: Ordering,
) -> Ordering {
    b.is_available()
        .cmp(&a.is_available())
        .then(capacity_order)
        .then_with(|| b.sibling_count().cmp(&a.sibling_count()))
        .then_with(|| compare_group(a, b, GroupDimension::Package))
        .then_with(|| known_first(a.numa_node(), b.numa_node()))
        .then_with(|| compare_group(a, b, GroupDimension::L3Cache))
        .then_with(|| compare_group(a, b, GroupDimension::Cluster))
        .then_with(|| compare_group(a, b, GroupDimension::L2Cache))
        .then_with(|| compare_group(a, b, GroupDimension::ThreadSet))
        .then_with(|| compare_group(a, b, GroupDimension::L1Cache))
        .then_with(|| compare_index(a, b))
}

/// Higher capacity first if the difference exceeds 5%, otherwise equal.
fn compare_capacity(a: Option<u32>, b: Option<u32>) -> Ordering {
    let a = u64::from(a.unwrap_or_default());
    let b = u64::from(b.unwrap_or_default());

    if a.saturating_mul(19) > b.saturating_mul(20) {
        Ordering::Less
    } else if b.saturating_mul(19) > a.saturating_mul(20) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

fn compare_group(a: &CpuTopoEntry, b: &CpuTopoEntry, dimension: GroupDimension) -> Ordering {
    known_first(a.group_id(dimension), b.group_id(dimension))
}

/// Smaller first, unknown after every known value.
fn known_first(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
