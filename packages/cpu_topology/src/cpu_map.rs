use cpuset::CpuSet;

use crate::Error;

/// How many thread groups a [`CpuMap`] can assign processors to.
pub const MAX_THREAD_GROUPS: usize = 16;

/// How many threads of each thread group a [`CpuMap`] can assign processors to.
pub const MAX_THREADS_PER_GROUP: usize = 64;

/// Processors explicitly assigned to each thread of each thread group.
///
/// The map starts out empty and is filled from configuration. An empty set means the thread has
/// no explicit assignment.
///
/// # Example
///
/// ```
/// use cpu_topology::CpuMap;
///
/// let mut map = CpuMap::new();
/// assert!(!map.configured());
///
/// map.set(1, 0, cpuset::parse_ranges(&["8-15"]).unwrap()).unwrap();
/// assert!(map.configured());
/// assert_eq!(map.get(1, 0).unwrap().count(), 8);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CpuMap {
    // Row-major, one row per thread group.
    slots: Box<[CpuSet]>,
}

impl CpuMap {
    /// Creates a map without any assignments.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: vec![CpuSet::new(); MAX_THREAD_GROUPS * MAX_THREADS_PER_GROUP]
                .into_boxed_slice(),
        }
    }

    /// The processors assigned to thread `thread` of thread group `group`, or `None` if either
    /// number is out of range.
    #[must_use]
    pub fn get(&self, group: usize, thread: usize) -> Option<&CpuSet> {
        self.slots.get(slot_index(group, thread).ok()?)
    }

    /// Assigns processors to thread `thread` of thread group `group`, replacing any previous
    /// assignment. Assigning an empty set removes the assignment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ThreadGroupOutOfRange`] or [`Error::ThreadOutOfRange`] if the numbers are
    /// beyond [`MAX_THREAD_GROUPS`] or [`MAX_THREADS_PER_GROUP`]. The map is unchanged.
    pub fn set(&mut self, group: usize, thread: usize, cpus: CpuSet) -> crate::Result<()> {
        let index = slot_index(group, thread)?;

        if let Some(slot) = self.slots.get_mut(index) {
            *slot = cpus;
        }

        Ok(())
    }

    /// Whether any thread has processors assigned.
    #[must_use]
    pub fn configured(&self) -> bool {
        self.slots.iter().any(|cpus| !cpus.is_empty())
    }

    /// Iterates over the assignments as `(group, thread, cpus)`, skipping threads without one.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &CpuSet)> {
        (0..MAX_THREAD_GROUPS)
            .flat_map(|group| (0..MAX_THREADS_PER_GROUP).map(move |thread| (group, thread)))
            .zip(self.slots.iter())
            .filter(|(_, cpus)| !cpus.is_empty())
            .map(|((group, thread), cpus)| (group, thread, cpus))
    }
}

impl Default for CpuMap {
    fn default() -> Self {
        Self::new()
    }
}

fn slot_index(group: usize, thread: usize) -> crate::Result<usize> {
    if group >= MAX_THREAD_GROUPS {
        return Err(Error::ThreadGroupOutOfRange { group });
    }

    if thread >= MAX_THREADS_PER_GROUP {
        return Err(Error::ThreadOutOfRange { thread });
    }

    #[expect(
        clippy::arithmetic_side_effects,
        reason = "both are bounds-checked above, the product fits easily"
    )]
    let index = group * MAX_THREADS_PER_GROUP + thread;

    Ok(index)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(CpuMap: Send, Sync, Clone);

    #[test]
    fn empty_map_is_not_configured() {
        let map = CpuMap::new();

        assert!(!map.configured());
        assert_eq!(map.iter().count(), 0);
        assert!(map.get(0, 0).unwrap().is_empty());
    }

    #[test]
    fn single_bit_makes_configured() {
        let mut map = CpuMap::new();

        let mut cpus = CpuSet::new();
        cpus.set(3).unwrap();

        map.set(MAX_THREAD_GROUPS - 1, MAX_THREADS_PER_GROUP - 1, cpus)
            .unwrap();

        assert!(map.configured());
        assert_eq!(
            map.iter().collect::<Vec<_>>(),
            vec![(MAX_THREAD_GROUPS - 1, MAX_THREADS_PER_GROUP - 1, &cpus)]
        );
    }

    #[test]
    fn empty_set_removes_assignment() {
        let mut map = CpuMap::new();

        map.set(2, 5, CpuSet::from_cpus([1]).unwrap()).unwrap();
        map.set(2, 5, CpuSet::new()).unwrap();

        assert!(!map.configured());
    }

    #[test]
    fn iter_reports_positions() {
        let mut map = CpuMap::new();

        map.set(0, 1, CpuSet::from_cpus([0]).unwrap()).unwrap();
        map.set(3, 0, CpuSet::from_cpus([5, 6]).unwrap()).unwrap();

        let positions: Vec<_> = map
            .iter()
            .map(|(group, thread, cpus)| (group, thread, cpus.count()))
            .collect();

        assert_eq!(positions, vec![(0, 1, 1), (3, 0, 2)]);
    }

    #[test]
    fn out_of_range_is_error() {
        let mut map = CpuMap::new();
        let cpus = CpuSet::from_cpus([0]).unwrap();

        assert!(matches!(
            map.set(MAX_THREAD_GROUPS, 0, cpus),
            Err(Error::ThreadGroupOutOfRange { group: MAX_THREAD_GROUPS })
        ));
        assert!(matches!(
            map.set(0, MAX_THREADS_PER_GROUP, cpus),
            Err(Error::ThreadOutOfRange { thread: MAX_THREADS_PER_GROUP })
        ));

        assert!(map.get(MAX_THREAD_GROUPS, 0).is_none());
        assert!(map.get(0, MAX_THREADS_PER_GROUP).is_none());
        assert!(!map.configured());
    }
}
