use std::fmt;

use cpuset::CpuId;

use crate::NodeId;

/// A way in which logical processors are grouped by the hardware they share.
///
/// Each processor belongs to at most one group per dimension. Group IDs are assigned by the
/// detector in discovery order, starting at zero, and only mean something when compared to other
/// IDs of the same dimension.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum GroupDimension {
    /// Processors sharing a level 1 data cache, typically the hardware threads of one core.
    L1Cache,

    /// Processors sharing a level 2 cache, which on some designs spans a cluster of cores.
    L2Cache,

    /// Processors sharing a level 3 cache slice.
    L3Cache,

    /// Hardware threads of the same physical core.
    ThreadSet,

    /// Cores grouped into a cluster (or, if the hardware has no clusters, a package).
    Cluster,

    /// Processors in the same physical package.
    Package,
}

impl GroupDimension {
    /// Every dimension, in detection order.
    pub const ALL: [Self; 6] = [
        Self::L1Cache,
        Self::L2Cache,
        Self::L3Cache,
        Self::ThreadSet,
        Self::Cluster,
        Self::Package,
    ];
}

impl fmt::Display for GroupDimension {
    #[cfg_attr(test, mutants::skip)] // Cosmetic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::L1Cache => "L1 cache",
            Self::L2Cache => "L2 cache",
            Self::L3Cache => "L3 cache",
            Self::ThreadSet => "thread set",
            Self::Cluster => "cluster",
            Self::Package => "package",
        };

        f.write_str(name)
    }
}

/// Everything known about one logical processor.
///
/// An entry starts out usable with every topology property unknown, and detection fills in
/// what the operating system reveals. Properties are never overwritten once known.
///
/// # Example
///
/// ```
/// use cpu_topology::{CpuTopoEntry, GroupDimension};
///
/// let entry = CpuTopoEntry::new(3)
///     .with_group(GroupDimension::L3Cache, 0)
///     .with_capacity(1024);
///
/// assert_eq!(entry.index(), 3);
/// assert!(entry.is_available());
/// assert_eq!(entry.group_id(GroupDimension::L3Cache), Some(0));
/// assert_eq!(entry.group_id(GroupDimension::Package), None);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct CpuTopoEntry {
    index: CpuId,

    excluded: bool,
    offline: bool,

    l1_id: Option<u32>,
    l2_id: Option<u32>,
    l3_id: Option<u32>,
    thread_set_id: Option<u32>,
    cluster_id: Option<u32>,
    package_id: Option<u32>,

    // 0 means unknown.
    sibling_count: u32,

    numa_node: Option<NodeId>,
    capacity: Option<u32>,
}

impl CpuTopoEntry {
    /// Creates an entry for the processor `index` with nothing known about it.
    #[must_use]
    pub const fn new(index: CpuId) -> Self {
        Self {
            index,
            excluded: false,
            offline: false,
            l1_id: None,
            l2_id: None,
            l3_id: None,
            thread_set_id: None,
            cluster_id: None,
            package_id: None,
            sibling_count: 0,
            numa_node: None,
            capacity: None,
        }
    }

    /// The processor this entry describes. Stays the same when the table is reordered.
    #[must_use]
    pub const fn index(&self) -> CpuId {
        self.index
    }

    /// Whether the process was not allowed to run on this processor when it started.
    #[must_use]
    pub const fn is_excluded(&self) -> bool {
        self.excluded
    }

    /// Whether the operating system reported this processor as offline.
    #[must_use]
    pub const fn is_offline(&self) -> bool {
        self.offline
    }

    /// Whether the processor is neither offline nor excluded.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        !self.excluded && !self.offline
    }

    /// The group this processor belongs to in the given dimension, if known.
    #[must_use]
    pub const fn group_id(&self, dimension: GroupDimension) -> Option<u32> {
        match dimension {
            GroupDimension::L1Cache => self.l1_id,
            GroupDimension::L2Cache => self.l2_id,
            GroupDimension::L3Cache => self.l3_id,
            GroupDimension::ThreadSet => self.thread_set_id,
            GroupDimension::Cluster => self.cluster_id,
            GroupDimension::Package => self.package_id,
        }
    }

    /// How many hardware threads share the core of this processor, 0 if unknown.
    #[must_use]
    pub const fn sibling_count(&self) -> u32 {
        self.sibling_count
    }

    /// The NUMA node the processor belongs to, if known.
    #[must_use]
    pub const fn numa_node(&self) -> Option<NodeId> {
        self.numa_node
    }

    /// Relative performance of the processor compared to the others, larger is faster.
    ///
    /// Typical hardware reports 1024 for its fastest cores and less for the others.
    #[must_use]
    pub const fn capacity(&self) -> Option<u32> {
        self.capacity
    }

    /// Marks the processor as excluded from the process affinity.
    #[must_use]
    pub const fn with_excluded(mut self, excluded: bool) -> Self {
        self.excluded = excluded;
        self
    }

    /// Marks the processor as offline.
    #[must_use]
    pub const fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Places the processor in the group `id` of the given dimension.
    #[must_use]
    pub const fn with_group(mut self, dimension: GroupDimension, id: u32) -> Self {
        *self.group_slot(dimension) = Some(id);
        self
    }

    /// Sets how many hardware threads share the core of this processor.
    #[must_use]
    pub const fn with_sibling_count(mut self, count: u32) -> Self {
        self.sibling_count = count;
        self
    }

    /// Places the processor in the NUMA node `node`.
    #[must_use]
    pub const fn with_numa_node(mut self, node: NodeId) -> Self {
        self.numa_node = Some(node);
        self
    }

    /// Sets the relative performance of the processor.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub(crate) const fn set_excluded(&mut self) {
        self.excluded = true;
    }

    pub(crate) const fn set_offline(&mut self) {
        self.offline = true;
    }

    /// Stores the group ID unless one is already known. Returns whether it was stored.
    pub(crate) const fn set_group_if_unknown(
        &mut self,
        dimension: GroupDimension,
        id: u32,
    ) -> bool {
        let slot = self.group_slot(dimension);

        if slot.is_some() {
            return false;
        }

        *slot = Some(id);
        true
    }

    pub(crate) const fn set_sibling_count_if_unknown(&mut self, count: u32) {
        if self.sibling_count == 0 {
            self.sibling_count = count;
        }
    }

    pub(crate) const fn set_numa_node_if_unknown(&mut self, node: NodeId) {
        if self.numa_node.is_none() {
            self.numa_node = Some(node);
        }
    }

    pub(crate) const fn set_capacity_if_unknown(&mut self, capacity: u32) {
        if self.capacity.is_none() {
            self.capacity = Some(capacity);
        }
    }

    const fn group_slot(&mut self, dimension: GroupDimension) -> &mut Option<u32> {
        match dimension {
            GroupDimension::L1Cache => &mut self.l1_id,
            GroupDimension::L2Cache => &mut self.l2_id,
            GroupDimension::L3Cache => &mut self.l3_id,
            GroupDimension::ThreadSet => &mut self.thread_set_id,
            GroupDimension::Cluster => &mut self.cluster_id,
            GroupDimension::Package => &mut self.package_id,
        }
    }
}
