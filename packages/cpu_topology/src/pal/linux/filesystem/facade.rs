use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use cpuset::CpuId;

#[cfg(test)]
use crate::pal::linux::MockFilesystem;
use crate::pal::linux::{BuildTargetFilesystem, Filesystem};

/// Enum to hide the different filesystem implementations behind a single wrapper type.
#[derive(Clone)]
pub(crate) enum FilesystemFacade {
    Target(Arc<BuildTargetFilesystem>),

    #[cfg(test)]
    Mock(Arc<MockFilesystem>),
}

impl FilesystemFacade {
    pub(crate) fn target(root: &Path) -> Self {
        Self::Target(Arc::new(BuildTargetFilesystem::new(root)))
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockFilesystem) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

impl Filesystem for FilesystemFacade {
    fn get_cpu_online_contents(&self) -> Option<String> {
        match self {
            Self::Target(filesystem) => filesystem.get_cpu_online_contents(),
            #[cfg(test)]
            Self::Mock(mock) => mock.get_cpu_online_contents(),
        }
    }

    fn get_cpu_attribute_contents(&self, cpu: CpuId, attribute: &str) -> Option<String> {
        match self {
            Self::Target(filesystem) => filesystem.get_cpu_attribute_contents(cpu, attribute),
            #[cfg(test)]
            Self::Mock(mock) => mock.get_cpu_attribute_contents(cpu, attribute),
        }
    }

    fn get_node_entry_names(&self) -> Option<Vec<String>> {
        match self {
            Self::Target(filesystem) => filesystem.get_node_entry_names(),
            #[cfg(test)]
            Self::Mock(mock) => mock.get_node_entry_names(),
        }
    }

    fn get_node_cpulist_contents(&self, node_entry: &str) -> Option<String> {
        match self {
            Self::Target(filesystem) => filesystem.get_node_cpulist_contents(node_entry),
            #[cfg(test)]
            Self::Mock(mock) => mock.get_node_cpulist_contents(node_entry),
        }
    }
}

impl Debug for FilesystemFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Target(inner) => inner.fmt(f),
            #[cfg(test)]
            Self::Mock(inner) => inner.fmt(f),
        }
    }
}
