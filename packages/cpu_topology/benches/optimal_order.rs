//! Benchmarking the ordering of a fully populated topology table.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;

use cpu_topology::{CpuSet, CpuTopoEntry, GroupDimension, TopologyTable};
use criterion::{Criterion, criterion_group, criterion_main};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

fn entrypoint(c: &mut Criterion) {
    let table = big_little_table();

    let mut group = c.benchmark_group("TopologyTable");

    group.bench_function("sort_optimal", |b| {
        b.iter(|| {
            let mut table = table.clone();
            table.sort_optimal();
            black_box(table)
        });
    });

    let mut sorted = table.clone();
    sorted.sort_optimal();

    group.bench_function("sort_by_index", |b| {
        b.iter(|| {
            let mut table = sorted.clone();
            table.sort_by_index();
            black_box(table)
        });
    });

    group.finish();
}

/// Two packages, with the first half of the cores of every package fast and the rest slow.
/// Processors are numbered in x86 style and the second thread of each slow core is offline.
#[allow(
    clippy::arithmetic_side_effects,
    clippy::integer_division,
    clippy::modulo_arithmetic,
    reason = "small constants in benchmark setup"
)]
fn big_little_table() -> TopologyTable {
    let mut table = TopologyTable::new();
    let capacity = u32::try_from(CpuSet::capacity()).unwrap();
    let cores = capacity / 2;

    for cpu in 0..capacity {
        let core = cpu % cores;
        let package = core / (cores / 2).max(1);
        let fast = core % (cores / 2).max(1) < cores / 4;

        let entry = CpuTopoEntry::new(cpu)
            .with_group(GroupDimension::Package, package)
            .with_group(GroupDimension::L3Cache, package)
            .with_group(GroupDimension::Cluster, core / 4)
            .with_group(GroupDimension::L2Cache, core / 2)
            .with_group(GroupDimension::ThreadSet, core)
            .with_group(GroupDimension::L1Cache, core)
            .with_numa_node(package)
            .with_sibling_count(if fast { 2 } else { 1 })
            .with_capacity(if fast { 1024 } else { 400 })
            .with_offline(!fast && cpu >= cores);

        table.replace(entry);
    }

    table
}
