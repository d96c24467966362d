#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Learns the processor topology at process startup and orders the logical processors so that
//! slicing the ordered list into consecutive chunks yields thread groups with good locality.
//!
//! Servers that run one worker thread per processor benefit from keeping the threads of a group on
//! processors that share caches, cores, packages and NUMA nodes, and from filling the fastest
//! cores of heterogeneous (big/little) hardware first. The operating system exposes this
//! information inconsistently: some platforms describe everything, some only the affinity of the
//! process, some nothing at all. This package reconciles whatever is available into one
//! [`TopologyTable`] and never reports a missing source as an error; it just leaves the property
//! unknown.
//!
//! # Lifecycle
//!
//! 1. Create a [`BootContext`], which owns a fresh table and an empty [`CpuMap`].
//! 2. Detect which processors are usable and how they relate to each other.
//! 3. Sort the table into the optimal order (see [`OptimalOrder`]).
//! 4. Call [`BootContext::finish()`] to get a [`TopologyContext`], a read-only view that can be
//!    shared with every thread.
//!
//! ```
//! use cpu_topology::{BootContext, DetectionConfig, GroupDimension};
//!
//! let mut boot = BootContext::new(&DetectionConfig::default());
//! boot.detect_all();
//! boot.optimize();
//!
//! let topology = boot.finish();
//!
//! for entry in topology.table().available() {
//!     println!(
//!         "processor {} (package {:?}, L3 {:?}, capacity {:?})",
//!         entry.index(),
//!         entry.group_id(GroupDimension::Package),
//!         entry.group_id(GroupDimension::L3Cache),
//!         entry.capacity(),
//!     );
//! }
//! ```
//!
//! # Platform support
//!
//! * Linux: process affinity, online processors, caches, cores, clusters, packages, capacity and
//!   NUMA nodes, read from sysfs (see [`DetectionConfig`]).
//! * FreeBSD: process affinity, online processors and NUMA nodes.
//! * Other platforms: nothing is detected, every processor is considered usable and the optimal
//!   order is the index order.
//!
//! # Logging
//!
//! Detection emits `tracing` events: `debug` for the outcome of each step and `trace` for each
//! descriptor that was missing or could not be parsed. No subscriber is installed by this package.

mod config;
mod context;
mod cpu_map;
mod detect;
mod entry;
mod error;
mod order;
mod pal;
mod table;

pub use config::*;
pub use context::*;
pub use cpu_map::*;
pub use cpuset::{CpuId, CpuSet};
pub use detect::*;
pub use entry::*;
pub use error::*;
pub use order::{OptimalOrder, compare_index};
pub use table::*;

/// Identifies a NUMA node, using the numbering of the operating system.
pub type NodeId = u32;
