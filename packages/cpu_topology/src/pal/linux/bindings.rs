//! The one system call the Linux platform needs, behind a trait so that tests can replace it.

use std::fmt::{self, Debug};
use std::{io, mem};
#[cfg(test)]
use std::sync::Arc;

use libc::cpu_set_t;

#[cfg_attr(test, mockall::automock)]
pub(crate) trait Bindings: Debug + Send + Sync + 'static {
    /// The affinity mask of the calling thread. During boot that thread is the only one, so this
    /// is the affinity of the process.
    fn process_affinity(&self) -> io::Result<cpu_set_t>;
}

#[derive(Debug, Default)]
pub(crate) struct BuildTargetBindings;

#[cfg_attr(coverage_nightly, coverage(off))] // Thin wrapper over the OS; failures cannot be forced.
impl Bindings for BuildTargetBindings {
    fn process_affinity(&self) -> io::Result<cpu_set_t> {
        // SAFETY: cpu_set_t is a plain bit array, so all zeroes is a valid empty mask.
        let mut mask: cpu_set_t = unsafe { mem::zeroed() };

        // SAFETY: The mask is valid for writes of the size we pass. Pid 0 is the calling thread.
        let result = unsafe { libc::sched_getaffinity(0, size_of::<cpu_set_t>(), &raw mut mask) };

        if result == 0 {
            Ok(mask)
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

/// Real bindings, or mock bindings in tests.
#[derive(Clone)]
pub(crate) enum BindingsFacade {
    Target(&'static BuildTargetBindings),

    #[cfg(test)]
    Mock(Arc<MockBindings>),
}

impl BindingsFacade {
    pub(crate) const fn target() -> Self {
        Self::Target(&BuildTargetBindings)
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockBindings) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

impl Bindings for BindingsFacade {
    fn process_affinity(&self) -> io::Result<cpu_set_t> {
        match self {
            Self::Target(bindings) => bindings.process_affinity(),
            #[cfg(test)]
            Self::Mock(mock) => mock.process_affinity(),
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // No API contract to test.
impl Debug for BindingsFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target(inner) => inner.fmt(f),
            #[cfg(test)]
            Self::Mock(inner) => inner.fmt(f),
        }
    }
}
