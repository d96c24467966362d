#![cfg_attr(
    test,
    expect(
        clippy::struct_field_names,
        reason = "false positive from automock generated code"
    )
)]

use std::fmt::Debug;

use cpuset::CpuId;

/// Linux exposes the processor topology as a virtual filesystem under `/sys/devices/system`.
/// This trait abstracts that virtual filesystem to allow it to be mocked.
///
/// All paths are relative to the configured sysfs root. Every method returns `None` when the file
/// or directory does not exist or cannot be read; absence is normal, as different kernels and
/// architectures expose different subsets of the tree. All I/O is synchronous and blocking because
/// we expect it to hit a fast path in the OS, given the data is never on a real storage device.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Filesystem: Debug + Send + Sync + 'static {
    /// Gets the contents of the `cpu/online` file.
    ///
    /// This is a cpulist format file ("0-3,8" style list) naming every online processor.
    fn get_cpu_online_contents(&self) -> Option<String>;

    /// Gets the contents of the `cpu/cpu{cpu}/{attribute}` file, where `attribute` is a relative
    /// path such as `topology/thread_siblings_list`.
    fn get_cpu_attribute_contents(&self, cpu: CpuId, attribute: &str) -> Option<String>;

    /// Gets the names of the entries of the `node` directory.
    ///
    /// Only some of these are NUMA node directories (named `node{N}`); the directory also holds
    /// files like `possible` and `online`.
    fn get_node_entry_names(&self) -> Option<Vec<String>>;

    /// Gets the contents of the `node/{node_entry}/cpulist` file.
    ///
    /// This is a cpulist format file naming every processor of the NUMA node.
    fn get_node_cpulist_contents(&self, node_entry: &str) -> Option<String>;
}
