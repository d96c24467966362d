use cpuset::{CpuId, CpuSet, parse_ranges};
use itertools::Itertools;
use tracing::trace;

use crate::pal::linux::{Bindings, BindingsFacade, Filesystem, FilesystemFacade};
use crate::pal::{CpuDescriptor, NumaNode, Platform};
use crate::{DetectionConfig, NodeId};

const _: () = assert!(
    cpuset::MAX_CPUS <= libc::CPU_SETSIZE.unsigned_abs() as usize,
    "CpuSet must not be larger than the native affinity mask"
);

/// The platform that matches the crate's build target.
///
/// Affinity comes from `sched_getaffinity()`, everything else from the sysfs tree rooted at
/// [`DetectionConfig::sysfs_root()`].
#[derive(Debug)]
pub(crate) struct BuildTargetPlatform {
    bindings: BindingsFacade,
    fs: FilesystemFacade,
}

impl BuildTargetPlatform {
    pub(crate) fn from_config(config: &DetectionConfig) -> Self {
        Self::new(
            BindingsFacade::target(),
            FilesystemFacade::target(config.sysfs_root()),
        )
    }

    pub(crate) const fn new(bindings: BindingsFacade, fs: FilesystemFacade) -> Self {
        Self { bindings, fs }
    }
}

impl Platform for BuildTargetPlatform {
    fn bound_cpus(&self) -> Option<CpuSet> {
        let affinity = match self.bindings.process_affinity() {
            Ok(affinity) => affinity,
            Err(error) => {
                trace!(%error, "sched_getaffinity() failed");
                return None;
            }
        };

        let bound = (0..CpuSet::capacity())
            .zip(0..)
            // SAFETY: The index is below CPU_SETSIZE, as asserted at compile time above.
            .filter(|(index, _)| unsafe { libc::CPU_ISSET(*index, &affinity) })
            .map(|(_, cpu)| cpu);

        CpuSet::from_cpus(bound).ok()
    }

    fn online_cpus(&self) -> Option<CpuSet> {
        let contents = self.fs.get_cpu_online_contents()?;
        let first_line = contents.lines().next().unwrap_or_default();

        parse_ranges(&[first_line.trim()])
            .inspect_err(|error| trace!(%error, "ignoring unparseable online CPU list"))
            .ok()
    }

    fn cpu_descriptor(&self, cpu: CpuId, descriptor: CpuDescriptor) -> Option<String> {
        let contents = self
            .fs
            .get_cpu_attribute_contents(cpu, attribute_path(descriptor))?;

        // An empty file is an empty descriptor, not a missing one.
        let first_line = contents.lines().next().unwrap_or_default();

        Some(first_line.trim().to_string())
    }

    fn numa_nodes(&self) -> Vec<NumaNode> {
        let Some(entries) = self.fs.get_node_entry_names() else {
            return Vec::new();
        };

        entries
            .iter()
            .filter_map(|entry| {
                let id = node_id_from_entry_name(entry)?;

                let contents = self.fs.get_node_cpulist_contents(entry)?;
                let cpus = parse_ranges(&[contents.trim()])
                    .inspect_err(|error| {
                        trace!(entry = entry.as_str(), %error, "ignoring NUMA node");
                    })
                    .ok()?;

                Some(NumaNode { id, cpus })
            })
            .sorted_unstable_by_key(|node| node.id)
            .collect()
    }
}

fn attribute_path(descriptor: CpuDescriptor) -> &'static str {
    match descriptor {
        CpuDescriptor::L1SharedCpus => "cache/index0/shared_cpu_list",
        CpuDescriptor::L2SharedCpus => "cache/index2/shared_cpu_list",
        CpuDescriptor::L3SharedCpus => "cache/index3/shared_cpu_list",
        CpuDescriptor::ThreadSiblings => "topology/thread_siblings_list",
        CpuDescriptor::ClusterCpus => "topology/cluster_cpus_list",
        CpuDescriptor::CoreSiblings => "topology/core_siblings_list",
        CpuDescriptor::PackageCpus => "topology/package_cpus_list",
        CpuDescriptor::PhysicalPackageId => "topology/physical_package_id",
        CpuDescriptor::Capacity => "cpu_capacity",
    }
}

/// NUMA node directories are named `node` followed by the node number and nothing else.
fn node_id_from_entry_name(entry: &str) -> Option<NodeId> {
    let digits = entry.strip_prefix("node")?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}
