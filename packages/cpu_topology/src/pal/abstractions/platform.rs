use std::fmt::Debug;

use cpuset::{CpuId, CpuSet};

use crate::NodeId;

/// The operating system facts the topology detector consumes.
///
/// Every query is best-effort. A platform that does not know the answer (because the OS does not
/// expose it, because the query failed or because the platform is not supported) returns `None`
/// or an empty list. Implementations never panic on OS failures.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// The processors the current process is allowed to execute on.
    fn bound_cpus(&self) -> Option<CpuSet>;

    /// The processors that are currently online.
    fn online_cpus(&self) -> Option<CpuSet>;

    /// The raw text of a per-processor topology descriptor, with surrounding whitespace
    /// removed, or `None` if the descriptor does not exist for this processor.
    fn cpu_descriptor(&self, cpu: CpuId, descriptor: CpuDescriptor) -> Option<String>;

    /// Every NUMA node the platform reports, with the processors that belong to it.
    fn numa_nodes(&self) -> Vec<NumaNode>;
}

/// A per-processor topology descriptor.
///
/// The `*Cpus` and `*Siblings` descriptors hold a range list naming every processor that shares
/// the resource with the processor being described. The other descriptors hold a single number.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum CpuDescriptor {
    /// Processors sharing the level 1 data cache.
    L1SharedCpus,

    /// Processors sharing the level 2 cache.
    L2SharedCpus,

    /// Processors sharing the level 3 cache slice.
    L3SharedCpus,

    /// Hardware threads of the same core.
    ThreadSiblings,

    /// Cores of the same cluster.
    ClusterCpus,

    /// Cores of the same package, used when clusters are not reported.
    CoreSiblings,

    /// Processors of the same package.
    PackageCpus,

    /// Number of the package the processor belongs to.
    PhysicalPackageId,

    /// Relative performance of the processor, larger is faster.
    Capacity,
}

/// A NUMA node and the processors that belong to it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct NumaNode {
    pub(crate) id: NodeId,
    pub(crate) cpus: CpuSet,
}
