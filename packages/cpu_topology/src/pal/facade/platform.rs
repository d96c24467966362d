use std::fmt::Debug;
use std::sync::Arc;

use cpuset::{CpuId, CpuSet};

use crate::DetectionConfig;
#[cfg(test)]
use crate::pal::MockPlatform;
use crate::pal::{BuildTargetPlatform, CpuDescriptor, NumaNode, Platform};

/// Enum to hide the real/mock choice behind a single wrapper type.
#[derive(Clone)]
pub(crate) enum PlatformFacade {
    Target(Arc<BuildTargetPlatform>),

    #[cfg(test)]
    Mock(Arc<MockPlatform>),
}

impl PlatformFacade {
    pub(crate) fn target(config: &DetectionConfig) -> Self {
        Self::Target(Arc::new(BuildTargetPlatform::from_config(config)))
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockPlatform) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

impl Platform for PlatformFacade {
    fn bound_cpus(&self) -> Option<CpuSet> {
        match self {
            Self::Target(p) => p.bound_cpus(),
            #[cfg(test)]
            Self::Mock(p) => p.bound_cpus(),
        }
    }

    fn online_cpus(&self) -> Option<CpuSet> {
        match self {
            Self::Target(p) => p.online_cpus(),
            #[cfg(test)]
            Self::Mock(p) => p.online_cpus(),
        }
    }

    fn cpu_descriptor(&self, cpu: CpuId, descriptor: CpuDescriptor) -> Option<String> {
        match self {
            Self::Target(p) => p.cpu_descriptor(cpu, descriptor),
            #[cfg(test)]
            Self::Mock(p) => p.cpu_descriptor(cpu, descriptor),
        }
    }

    fn numa_nodes(&self) -> Vec<NumaNode> {
        match self {
            Self::Target(p) => p.numa_nodes(),
            #[cfg(test)]
            Self::Mock(p) => p.numa_nodes(),
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // No API contract to test.
impl Debug for PlatformFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Target(inner) => inner.fmt(f),
            #[cfg(test)]
            Self::Mock(inner) => inner.fmt(f),
        }
    }
}
