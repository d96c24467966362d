use cpuset::{CpuId, CpuSet, parse_ranges};
use tracing::{debug, trace};

use crate::pal::{CpuDescriptor, Platform, PlatformFacade};
use crate::{DetectionConfig, GroupDimension, TopologyTable};

/// Learns the processor topology from the operating system and records it in a
/// [`TopologyTable`].
///
/// Detection is best-effort. Whatever the operating system does not reveal, or fails to reveal,
/// stays unknown in the table; nothing is ever reported as an error. Known values are never
/// overwritten, so running detection again on the same table changes nothing.
///
/// # Example
///
/// ```
/// use cpu_topology::{DetectionConfig, Detector, TopologyTable};
///
/// let detector = Detector::new(&DetectionConfig::default());
/// let mut table = TopologyTable::new();
///
/// detector.detect_all(&mut table);
///
/// println!("{} processors available", table.available().count());
/// ```
#[derive(Debug)]
pub struct Detector {
    platform: PlatformFacade,
}

impl Detector {
    /// Creates a detector for the operating system the crate was built for.
    #[must_use]
    pub fn new(config: &DetectionConfig) -> Self {
        Self::with_platform(PlatformFacade::target(config))
    }

    pub(crate) const fn with_platform(platform: PlatformFacade) -> Self {
        Self { platform }
    }

    /// The processors the current process is allowed to run on.
    ///
    /// An empty set means the affinity could not be determined.
    #[must_use]
    pub fn detect_bound(&self) -> CpuSet {
        let bound = self.platform.bound_cpus().unwrap_or_default();

        debug!(count = bound.count(), cpus = %bound, "detected process affinity");

        bound
    }

    /// The processors that are currently online.
    ///
    /// An empty set means the online processors could not be determined.
    #[must_use]
    pub fn detect_online(&self) -> CpuSet {
        let online = self.platform.online_cpus().unwrap_or_default();

        debug!(count = online.count(), cpus = %online, "detected online processors");

        online
    }

    /// Marks processors outside the process affinity as excluded and processors that are not
    /// online as offline.
    ///
    /// If either set cannot be determined, the corresponding flag is left alone on every entry.
    pub fn detect_usable(&self, table: &mut TopologyTable) {
        let bound = self.detect_bound();
        let online = self.detect_online();

        let mut excluded: usize = 0;
        let mut offline: usize = 0;

        for entry in table.entries_mut() {
            if !bound.is_empty() && !bound.test(entry.index()) && !entry.is_excluded() {
                entry.set_excluded();
                excluded = excluded.saturating_add(1);
            }

            if !online.is_empty() && !online.test(entry.index()) && !entry.is_offline() {
                entry.set_offline();
                offline = offline.saturating_add(1);
            }
        }

        debug!(excluded, offline, "flagged unusable processors");
    }

    /// Fills in the cache, core, cluster, package, capacity and NUMA node properties of every
    /// processor that is not offline.
    ///
    /// Processors beyond the highest one not known to be offline are ignored, as are properties
    /// that are already known. NUMA nodes are recorded for every processor they list, including
    /// offline and excluded ones.
    pub fn detect_full_topology(&self, table: &mut TopologyTable) {
        if let Some(last) = table.last_online_cpu() {
            self.detect_groups(table, last);
        }

        self.detect_numa_nodes(table);
    }

    /// Runs [`detect_usable()`][1] followed by [`detect_full_topology()`][2].
    ///
    /// [1]: Self::detect_usable
    /// [2]: Self::detect_full_topology
    pub fn detect_all(&self, table: &mut TopologyTable) {
        self.detect_usable(table);
        self.detect_full_topology(table);
    }

    fn detect_groups(&self, table: &mut TopologyTable, last: CpuId) {
        let mut counters = IdCounters::from_table(table);

        for cpu in 0..=last {
            if table.entry(cpu).is_none_or(|entry| entry.is_offline()) {
                continue;
            }

            for dimension in GroupDimension::ALL {
                if !is_unknown(table, cpu, dimension) {
                    continue;
                }

                if let Some(members) = self.group_members(cpu, dimension) {
                    assign_group(table, dimension, &members, last, &mut counters);
                }
            }

            if is_unknown(table, cpu, GroupDimension::Package) {
                if let Some(package) = self.scalar(cpu, CpuDescriptor::PhysicalPackageId) {
                    if let Some(entry) = table.entry_mut(cpu) {
                        entry.set_group_if_unknown(GroupDimension::Package, package);
                    }

                    counters.reserve(GroupDimension::Package, package);
                }
            }

            let capacity_unknown = table
                .entry(cpu)
                .is_some_and(|entry| entry.capacity().is_none());

            if capacity_unknown {
                if let Some(capacity) = self.scalar(cpu, CpuDescriptor::Capacity) {
                    if let Some(entry) = table.entry_mut(cpu) {
                        entry.set_capacity_if_unknown(capacity);
                    }
                }
            }
        }

        debug!(
            l1 = counters.l1,
            l2 = counters.l2,
            l3 = counters.l3,
            thread_sets = counters.thread_set,
            clusters = counters.cluster,
            packages = counters.package,
            "detected processor groups"
        );
    }

    fn detect_numa_nodes(&self, table: &mut TopologyTable) {
        for node in self.platform.numa_nodes() {
            for cpu in &node.cpus {
                if let Some(entry) = table.entry_mut(cpu) {
                    entry.set_numa_node_if_unknown(node.id);
                }
            }

            debug!(node = node.id, cpus = %node.cpus, "detected NUMA node");
        }
    }

    fn group_members(&self, cpu: CpuId, dimension: GroupDimension) -> Option<CpuSet> {
        let text = match dimension {
            GroupDimension::L1Cache => self.descriptor(cpu, CpuDescriptor::L1SharedCpus),
            GroupDimension::L2Cache => self.descriptor(cpu, CpuDescriptor::L2SharedCpus),
            GroupDimension::L3Cache => self.descriptor(cpu, CpuDescriptor::L3SharedCpus),
            GroupDimension::ThreadSet => self.descriptor(cpu, CpuDescriptor::ThreadSiblings),
            // Only hardware without clusters falls back to the whole package. A cluster list
            // that exists but is empty is taken at face value.
            GroupDimension::Cluster => self
                .descriptor(cpu, CpuDescriptor::ClusterCpus)
                .or_else(|| self.descriptor(cpu, CpuDescriptor::CoreSiblings)),
            GroupDimension::Package => self.descriptor(cpu, CpuDescriptor::PackageCpus),
        }?;

        parse_ranges(&[text.as_str()])
            .inspect_err(|error| trace!(cpu, %dimension, %error, "ignoring processor list"))
            .ok()
    }

    /// A single-number descriptor. Empty descriptors are unknown; text that does not start
    /// with a digit reads as zero.
    fn scalar(&self, cpu: CpuId, descriptor: CpuDescriptor) -> Option<u32> {
        let text = self.descriptor(cpu, descriptor)?;

        if text.is_empty() {
            return None;
        }

        Some(leading_decimal(&text))
    }

    fn descriptor(&self, cpu: CpuId, descriptor: CpuDescriptor) -> Option<String> {
        let text = self.platform.cpu_descriptor(cpu, descriptor);

        if text.is_none() {
            trace!(cpu, ?descriptor, "descriptor not available");
        }

        text
    }
}

/// The next group ID to hand out in each dimension.
///
/// # Example
///
/// ```
/// use cpu_topology::{GroupDimension, IdCounters, TopologyTable};
///
/// let counters = IdCounters::from_table(&TopologyTable::new());
/// assert_eq!(counters.next_id(GroupDimension::L3Cache), 0);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IdCounters {
    l1: u32,
    l2: u32,
    l3: u32,
    thread_set: u32,
    cluster: u32,
    package: u32,
}

impl IdCounters {
    /// Counters that start at zero in every dimension.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            l1: 0,
            l2: 0,
            l3: 0,
            thread_set: 0,
            cluster: 0,
            package: 0,
        }
    }

    /// Counters that continue after the highest ID already present in the table, so that new
    /// groups never reuse an existing ID.
    #[must_use]
    pub fn from_table(table: &TopologyTable) -> Self {
        let mut counters = Self::new();

        for entry in table {
            for dimension in GroupDimension::ALL {
                if let Some(id) = entry.group_id(dimension) {
                    counters.reserve(dimension, id);
                }
            }
        }

        counters
    }

    /// The ID the next group discovered in `dimension` will get.
    #[must_use]
    pub const fn next_id(&self, dimension: GroupDimension) -> u32 {
        match dimension {
            GroupDimension::L1Cache => self.l1,
            GroupDimension::L2Cache => self.l2,
            GroupDimension::L3Cache => self.l3,
            GroupDimension::ThreadSet => self.thread_set,
            GroupDimension::Cluster => self.cluster,
            GroupDimension::Package => self.package,
        }
    }

    const fn slot(&mut self, dimension: GroupDimension) -> &mut u32 {
        match dimension {
            GroupDimension::L1Cache => &mut self.l1,
            GroupDimension::L2Cache => &mut self.l2,
            GroupDimension::L3Cache => &mut self.l3,
            GroupDimension::ThreadSet => &mut self.thread_set,
            GroupDimension::Cluster => &mut self.cluster,
            GroupDimension::Package => &mut self.package,
        }
    }

    fn advance(&mut self, dimension: GroupDimension) {
        let slot = self.slot(dimension);
        *slot = slot.saturating_add(1);
    }

    /// Makes sure `id` is never handed out.
    fn reserve(&mut self, dimension: GroupDimension, id: u32) {
        let slot = self.slot(dimension);
        *slot = (*slot).max(id.saturating_add(1));
    }
}

/// Puts every processor in `members` up to and including `last` into a new group of the given
/// dimension, unless the processor already has a group in that dimension.
///
/// The new group gets the next ID from `counters`, and the counter advances only if at least one
/// processor joined the group. For [`GroupDimension::ThreadSet`], the processors that join also
/// learn their sibling count, the number of processors in `members`.
///
/// Returns the ID of the new group, or `None` if no processor joined it.
///
/// # Example
///
/// ```
/// use cpu_topology::{GroupDimension, IdCounters, TopologyTable, assign_group};
///
/// let mut table = TopologyTable::new();
/// let mut counters = IdCounters::new();
///
/// let core = cpuset::parse_ranges(&["0,4"]).unwrap();
/// let id = assign_group(&mut table, GroupDimension::ThreadSet, &core, 7, &mut counters);
///
/// assert_eq!(id, Some(0));
/// assert_eq!(table.entry(4).unwrap().group_id(GroupDimension::ThreadSet), Some(0));
/// assert_eq!(table.entry(4).unwrap().sibling_count(), 2);
/// assert_eq!(counters.next_id(GroupDimension::ThreadSet), 1);
/// ```
pub fn assign_group(
    table: &mut TopologyTable,
    dimension: GroupDimension,
    members: &CpuSet,
    last: CpuId,
    counters: &mut IdCounters,
) -> Option<u32> {
    let id = counters.next_id(dimension);
    let sibling_count = u32::try_from(members.count()).unwrap_or(u32::MAX);

    let mut joined = false;

    for cpu in members.iter().take_while(|cpu| *cpu <= last) {
        let Some(entry) = table.entry_mut(cpu) else {
            continue;
        };

        if entry.set_group_if_unknown(dimension, id) {
            joined = true;

            if dimension == GroupDimension::ThreadSet {
                entry.set_sibling_count_if_unknown(sibling_count);
            }
        }
    }

    if !joined {
        return None;
    }

    trace!(%dimension, id, cpus = %members, "assigned group");
    counters.advance(dimension);

    Some(id)
}

fn is_unknown(table: &TopologyTable, cpu: CpuId, dimension: GroupDimension) -> bool {
    table
        .entry(cpu)
        .is_some_and(|entry| entry.group_id(dimension).is_none())
}

/// Value of the decimal digits at the start of the string, zero if there are none.
/// Saturates instead of overflowing.
fn leading_decimal(s: &str) -> u32 {
    s.bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0_u32, |value, digit| {
            value
                .saturating_mul(10)
                .saturating_add(u32::from(digit.wrapping_sub(b'0')))
        })
}
