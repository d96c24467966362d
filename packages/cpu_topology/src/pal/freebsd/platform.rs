use std::ffi::{CStr, c_int, c_void};
use std::{io, mem, ptr};

use cpuset::{CpuId, CpuSet};
use tracing::trace;

use crate::pal::{CpuDescriptor, NumaNode, Platform};
use crate::{DetectionConfig, NodeId};

// From <sys/cpuset.h>.
const CPU_LEVEL_CPUSET: libc::cpulevel_t = 2;
const CPU_LEVEL_WHICH: libc::cpulevel_t = 3;
const CPU_WHICH_PID: libc::cpuwhich_t = 2;
const CPU_WHICH_DOMAIN: libc::cpuwhich_t = 6;

const NDOMAINS_SYSCTL: &CStr = c"vm.ndomains";

const _: () = assert!(
    size_of::<libc::cpuset_t>().saturating_mul(8) >= cpuset::MAX_CPUS,
    "CpuSet must not be larger than the native affinity mask"
);

/// The platform that matches the crate's build target.
///
/// FreeBSD reports the process affinity and the processors of each memory domain. It does not
/// describe caches or packages, so per-processor descriptors are always unknown.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetPlatform;

impl BuildTargetPlatform {
    pub(crate) const fn from_config(_config: &DetectionConfig) -> Self {
        Self
    }
}

// Real OS calls are excluded from coverage measurement because error paths require OS-level
// failures that are impractical to trigger in tests.
#[cfg_attr(coverage_nightly, coverage(off))]
impl Platform for BuildTargetPlatform {
    fn bound_cpus(&self) -> Option<CpuSet> {
        getaffinity(CPU_LEVEL_CPUSET, CPU_WHICH_PID, -1)
            .inspect_err(|error| trace!(%error, "cpuset_getaffinity() failed"))
            .ok()
    }

    fn online_cpus(&self) -> Option<CpuSet> {
        let domains = domain_count()?;

        let mut online = CpuSet::new();

        for domain in 0..domains {
            if let Ok(cpus) = getaffinity(CPU_LEVEL_WHICH, CPU_WHICH_DOMAIN, domain.into()) {
                online.union(&cpus);
            }
        }

        Some(online)
    }

    fn cpu_descriptor(&self, _cpu: CpuId, _descriptor: CpuDescriptor) -> Option<String> {
        None
    }

    fn numa_nodes(&self) -> Vec<NumaNode> {
        let Some(domains) = domain_count() else {
            return Vec::new();
        };

        (0..domains)
            .filter_map(|domain| {
                let cpus = getaffinity(CPU_LEVEL_WHICH, CPU_WHICH_DOMAIN, domain.into())
                    .inspect_err(|error| trace!(domain, %error, "ignoring memory domain"))
                    .ok()?;

                Some(NumaNode {
                    id: NodeId::try_from(domain).ok()?,
                    cpus,
                })
            })
            .collect()
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
fn getaffinity(
    level: libc::cpulevel_t,
    which: libc::cpuwhich_t,
    id: libc::id_t,
) -> io::Result<CpuSet> {
    // SAFETY: All zeroes is a valid cpuset_t.
    let mut mask: libc::cpuset_t = unsafe { mem::zeroed() };

    // SAFETY: The size matches the buffer we pass.
    let result = unsafe {
        libc::cpuset_getaffinity(level, which, id, size_of::<libc::cpuset_t>(), &raw mut mask)
    };

    if result != 0 {
        return Err(io::Error::last_os_error());
    }

    let cpus = (0..CpuSet::capacity())
        .zip(0..)
        // SAFETY: The index is within the mask, as asserted at compile time above.
        .filter(|(index, _)| unsafe { libc::CPU_ISSET(*index, &mask) })
        .map(|(_, cpu)| cpu);

    CpuSet::from_cpus(cpus).map_err(io::Error::other)
}

#[cfg_attr(coverage_nightly, coverage(off))]
fn domain_count() -> Option<c_int> {
    let mut domains: c_int = 0;
    let mut len = size_of::<c_int>();

    // SAFETY: The output buffer and its length describe a valid c_int.
    let result = unsafe {
        libc::sysctlbyname(
            NDOMAINS_SYSCTL.as_ptr(),
            (&raw mut domains).cast::<c_void>(),
            &raw mut len,
            ptr::null(),
            0,
        )
    };

    if result != 0 {
        trace!(error = %io::Error::last_os_error(), "vm.ndomains sysctl failed");
        return None;
    }

    Some(domains)
}
