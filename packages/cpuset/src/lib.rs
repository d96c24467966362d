#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Fixed-capacity sets of logical processor IDs, plus parsers for the two textual formats the
//! Linux kernel and server configuration files use to describe them.
//!
//! The capacity of a [`CpuSet`] is fixed per build target and matches the native affinity mask
//! of the operating system (1024 processors on Linux, 256 on FreeBSD, 64 elsewhere). Operations
//! that would address a processor beyond that capacity fail explicitly instead of wrapping.
//!
//! # Formats
//!
//! A *range list* is a comma-separated list of items, where each item is either a single
//! processor number (e.g. `4`) or an inclusive range (e.g. `0-3`). The upper bound of a range
//! may be omitted to mean "up to the last supported processor" (e.g. `8-`). Reversed ranges such
//! as `3-1` are accepted and mean the same as `1-3`.
//!
//! A *hex map* is a comma-separated list of 32-bit hexadecimal words, most significant word first,
//! one bit per processor. This is the format of the `cpumap` files under `/sys`.
//!
//! # Example
//!
//! ```
//! use cpuset::{parse_hexmap, parse_ranges};
//!
//! let workers = parse_ranges(&["0-3,8"]).unwrap();
//! assert_eq!(workers.count(), 5);
//! assert!(workers.test(2));
//! assert!(!workers.test(4));
//!
//! let from_sysfs = parse_hexmap("f,3");
//! assert_eq!(from_sysfs.iter().collect::<Vec<_>>(), vec![0, 1, 32, 33, 34, 35]);
//!
//! println!("Worker processors: {workers}");
//! ```

mod emit;
mod error;
mod parse;
mod set;

pub use emit::*;
pub use error::*;
pub use parse::*;
pub use set::*;

/// Identifies a logical processor, using the numbering of the operating system.
pub type CpuId = u32;
