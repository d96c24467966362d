//! Detects the processor topology of the current machine and prints it in optimal order.
//!
//! Pass a directory laid out like `/sys/devices/system` as the first argument to read the
//! topology from there instead.

use std::env;

use cpu_topology::{BootContext, DetectionConfig, GroupDimension};

fn main() {
    let config = match env::args().nth(1) {
        Some(root) => DetectionConfig::default().with_sysfs_root(root),
        None => DetectionConfig::default(),
    };

    let mut boot = BootContext::new(&config);
    boot.detect_all();

    println!("Bound: {}", boot.detector().detect_bound());
    println!("Online: {}", boot.detector().detect_online());

    boot.optimize();
    let topology = boot.finish();

    println!();
    println!("cpu  pkg  node  l3  cluster  l2  core  l1  smt  capacity");

    for entry in topology.table().available() {
        println!(
            "{:>3}  {:>3}  {:>4}  {:>2}  {:>7}  {:>2}  {:>4}  {:>2}  {:>3}  {:>8}",
            entry.index(),
            show(entry.group_id(GroupDimension::Package)),
            show(entry.numa_node()),
            show(entry.group_id(GroupDimension::L3Cache)),
            show(entry.group_id(GroupDimension::Cluster)),
            show(entry.group_id(GroupDimension::L2Cache)),
            show(entry.group_id(GroupDimension::ThreadSet)),
            show(entry.group_id(GroupDimension::L1Cache)),
            entry.sibling_count(),
            show(entry.capacity()),
        );
    }

    let unavailable = topology
        .table()
        .len()
        .saturating_sub(topology.table().available().count());
    println!();
    println!("{unavailable} processors are offline or excluded.");
}

fn show(value: Option<u32>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}
