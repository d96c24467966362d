//! Example that demonstrates the exact usage shown in the package documentation.
//!
//! This shows how to parse the two textual CPU set formats and inspect the result.

fn main() {
    println!("=== CpuSet README Example ===");

    let workers = cpuset::parse_ranges(&["0-3,8"]).unwrap();
    assert_eq!(workers.count(), 5);

    println!("Worker processors: {workers}");
    println!("First worker processor: {:?}", workers.first_set());

    let from_sysfs = cpuset::parse_hexmap("f,3");
    println!("Processors in hex map 'f,3': {from_sysfs}");

    println!(
        "Up to {} processors are supported on this platform",
        cpuset::CpuSet::capacity()
    );

    println!("README example completed successfully!");
}
