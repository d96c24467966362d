use std::{mem, slice};

use cpuset::{CpuId, CpuSet};

use crate::CpuTopoEntry;
use crate::order::{OptimalOrder, compare_index};

/// One [`CpuTopoEntry`] for every processor a [`CpuSet`] can describe.
///
/// A new table lists the processors in index order, all of them usable and with nothing known
/// about their topology. Detection fills in the entries and [`sort_optimal()`][1] reorders them;
/// [`entry()`][2] finds a processor regardless of the current order.
///
/// [1]: Self::sort_optimal
/// [2]: Self::entry
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TopologyTable {
    entries: Box<[CpuTopoEntry]>,
}

impl TopologyTable {
    /// Creates a table with an entry for each processor from 0 to [`CpuSet::capacity()`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: (0..CpuSet::capacity())
                .zip(0..)
                .map(|(_, cpu)| CpuTopoEntry::new(cpu))
                .collect(),
        }
    }

    /// The entries in their current order.
    #[must_use]
    pub fn entries(&self) -> &[CpuTopoEntry] {
        &self.entries
    }

    /// Iterates over the entries in their current order.
    pub fn iter(&self) -> slice::Iter<'_, CpuTopoEntry> {
        self.entries.iter()
    }

    /// The entry describing processor `cpu`, or `None` if `cpu` is beyond the capacity.
    #[must_use]
    pub fn entry(&self, cpu: CpuId) -> Option<&CpuTopoEntry> {
        self.entries.get(self.position_of(cpu)?)
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [CpuTopoEntry] {
        &mut self.entries
    }

    pub(crate) fn entry_mut(&mut self, cpu: CpuId) -> Option<&mut CpuTopoEntry> {
        let position = self.position_of(cpu)?;
        self.entries.get_mut(position)
    }

    /// Replaces the entry describing the same processor as `entry`.
    ///
    /// Returns the previous entry, or `None` without changing anything if the processor is
    /// beyond the capacity.
    pub fn replace(&mut self, entry: CpuTopoEntry) -> Option<CpuTopoEntry> {
        let slot = self.entry_mut(entry.index())?;
        Some(mem::replace(slot, entry))
    }

    /// The entries of processors that are neither offline nor excluded, in current order.
    pub fn available(&self) -> impl Iterator<Item = &CpuTopoEntry> {
        self.entries.iter().filter(|entry| entry.is_available())
    }

    /// The highest processor index not known to be offline.
    #[must_use]
    pub fn last_online_cpu(&self) -> Option<CpuId> {
        self.entries
            .iter()
            .filter(|entry| !entry.is_offline())
            .map(CpuTopoEntry::index)
            .max()
    }

    /// Reorders the entries so that the best processors for worker threads come first and
    /// processors sharing hardware are next to each other.
    ///
    /// See [`OptimalOrder`] for the criteria.
    pub fn sort_optimal(&mut self) {
        let order = OptimalOrder::new(&self.entries);

        self.entries.sort_unstable_by(|a, b| order.compare(a, b));
    }

    /// Restores the original order, by processor index.
    pub fn sort_by_index(&mut self) {
        self.entries.sort_unstable_by(compare_index);
    }

    /// Whether the entries are in processor index order.
    #[must_use]
    pub fn is_index_ordered(&self) -> bool {
        self.entries.is_sorted_by_key(CpuTopoEntry::index)
    }

    /// Number of entries, which is always [`CpuSet::capacity()`].
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Trivial.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`; a table has an entry for every processor.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Trivial.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position_of(&self, cpu: CpuId) -> Option<usize> {
        // Unsorted tables have each processor at the position matching its index.
        let direct = usize::try_from(cpu).ok().filter(|position| {
            self.entries
                .get(*position)
                .is_some_and(|entry| entry.index() == cpu)
        });

        direct.or_else(|| self.entries.iter().position(|entry| entry.index() == cpu))
    }
}

impl Default for TopologyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a TopologyTable {
    type Item = &'a CpuTopoEntry;
    type IntoIter = slice::Iter<'a, CpuTopoEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::GroupDimension;

    assert_impl_all!(TopologyTable: Send, Sync, Clone);

    fn indexes(table: &TopologyTable) -> Vec<CpuId> {
        table.iter().map(CpuTopoEntry::index).collect()
    }

    #[test]
    fn new_table_covers_capacity_in_order() {
        let table = TopologyTable::new();

        assert_eq!(table.len(), CpuSet::capacity());
        assert!(!table.is_empty());
        assert!(table.is_index_ordered());
        assert_eq!(table.available().count(), CpuSet::capacity());
        assert!(table.iter().all(|entry| entry.group_id(GroupDimension::L1Cache).is_none()));
    }

    #[test]
    fn entry_beyond_capacity_is_none() {
        let mut table = TopologyTable::new();

        let beyond = CpuId::try_from(CpuSet::capacity()).unwrap();
        assert!(table.entry(beyond).is_none());
        assert!(table.replace(CpuTopoEntry::new(beyond)).is_none());
    }

    #[test]
    fn replace_stores_by_index() {
        let mut table = TopologyTable::new();

        let previous = table.replace(CpuTopoEntry::new(3).with_capacity(100)).unwrap();
        assert_eq!(previous, CpuTopoEntry::new(3));
        assert_eq!(table.entry(3).unwrap().capacity(), Some(100));
    }

    #[test]
    fn entry_found_after_sorting() {
        let mut table = TopologyTable::new();
        table.replace(CpuTopoEntry::new(5).with_capacity(1024));
        table.replace(CpuTopoEntry::new(9).with_capacity(1024));

        table.sort_optimal();

        assert_eq!(indexes(&table)[..2], [5, 9]);
        assert!(!table.is_index_ordered());
        assert_eq!(table.entry(9).unwrap().index(), 9);
        assert_eq!(table.entry(0).unwrap().index(), 0);
    }

    #[test]
    fn last_online_cpu_skips_offline_tail() {
        let mut table = TopologyTable::new();
        assert_eq!(
            table.last_online_cpu(),
            Some(CpuId::try_from(CpuSet::capacity() - 1).unwrap())
        );

        let cpus: Vec<CpuId> = table.iter().map(CpuTopoEntry::index).collect();
        for cpu in cpus.into_iter().filter(|cpu| *cpu >= 4) {
            table.replace(CpuTopoEntry::new(cpu).with_offline(true));
        }

        assert_eq!(table.last_online_cpu(), Some(3));
        assert_eq!(table.available().count(), 4);
    }

    #[test]
    fn sorting_a_sorted_table_changes_nothing() {
        let mut table = TopologyTable::new();
        table.replace(CpuTopoEntry::new(2).with_offline(true));
        table.replace(CpuTopoEntry::new(6).with_capacity(512));
        table.replace(
            CpuTopoEntry::new(7)
                .with_capacity(1024)
                .with_group(GroupDimension::Package, 0),
        );

        table.sort_optimal();
        let once = table.clone();

        table.sort_optimal();
        assert_eq!(table, once);
    }

    #[test]
    fn sort_then_index_sort_round_trips() {
        let mut table = TopologyTable::new();
        table.replace(CpuTopoEntry::new(1).with_excluded(true));
        table.replace(CpuTopoEntry::new(4).with_capacity(300));
        table.replace(CpuTopoEntry::new(8).with_sibling_count(2));
        let original = table.clone();

        table.sort_optimal();
        assert_ne!(table, original);

        table.sort_by_index();
        assert_eq!(table, original);
        assert!(table.is_index_ordered());
    }

    #[test]
    fn unavailable_sorted_last() {
        let mut table = TopologyTable::new();
        table.replace(CpuTopoEntry::new(0).with_offline(true));
        table.replace(CpuTopoEntry::new(1).with_excluded(true));

        table.sort_optimal();

        let tail = indexes(&table);
        assert_eq!(tail[tail.len() - 2..], [0, 1]);
    }

    fn with_near_equal_capacities() -> TopologyTable {
        let mut table = TopologyTable::new();
        table.replace(CpuTopoEntry::new(0).with_capacity(880));
        table.replace(CpuTopoEntry::new(1).with_capacity(920));
        table.replace(CpuTopoEntry::new(2).with_capacity(960));
        table.replace(CpuTopoEntry::new(3).with_capacity(1000));
        table.replace(CpuTopoEntry::new(4).with_capacity(0));
        table
    }

    #[test]
    fn near_equal_capacities_sort_by_tier() {
        let mut table = with_near_equal_capacities();

        table.sort_optimal();

        // 1000 and 960 share the first tier, 920 and 880 the second.
        assert_eq!(indexes(&table)[..5], [2, 3, 0, 1, 4]);
    }

    #[test]
    fn sorting_near_equal_capacities_twice_changes_nothing() {
        let mut table = with_near_equal_capacities();

        table.sort_optimal();
        let once = table.clone();

        table.sort_optimal();
        assert_eq!(table, once);
    }

    #[test]
    fn near_equal_capacities_round_trip() {
        let mut table = with_near_equal_capacities();
        let original = table.clone();

        table.sort_optimal();
        assert_ne!(table, original);

        table.sort_by_index();
        assert_eq!(table, original);
    }
}
