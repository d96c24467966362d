use cpuset::{CpuId, CpuSet};

use crate::DetectionConfig;
use crate::pal::{CpuDescriptor, NumaNode, Platform};

/// Fallback platform implementation for operating systems without native support.
///
/// Nothing about the hardware is known here, so every query reports "unknown". Detection on top of
/// this platform leaves every processor usable and every topology field unknown, which makes the
/// optimal ordering degrade to plain processor index order.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetPlatform;

impl BuildTargetPlatform {
    pub(crate) const fn from_config(_config: &DetectionConfig) -> Self {
        Self
    }
}

impl Platform for BuildTargetPlatform {
    fn bound_cpus(&self) -> Option<CpuSet> {
        None
    }

    fn online_cpus(&self) -> Option<CpuSet> {
        None
    }

    fn cpu_descriptor(&self, _cpu: CpuId, _descriptor: CpuDescriptor) -> Option<String> {
        None
    }

    fn numa_nodes(&self) -> Vec<NumaNode> {
        Vec::new()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn everything_is_unknown() {
        let platform = BuildTargetPlatform::from_config(&DetectionConfig::default());

        assert_eq!(platform.bound_cpus(), None);
        assert_eq!(platform.online_cpus(), None);
        assert_eq!(platform.cpu_descriptor(0, CpuDescriptor::ThreadSiblings), None);
        assert_eq!(platform.cpu_descriptor(0, CpuDescriptor::Capacity), None);
        assert!(platform.numa_nodes().is_empty());
    }
}
