use thiserror::Error;

use crate::CpuId;

/// Errors that can occur when manipulating CPU sets or parsing CPU set strings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An item of a range list did not start with a decimal digit.
    #[error("'{value}' is not a CPU range")]
    NotACpuRange {
        /// The item (and anything after it in the same string) that was rejected.
        value: String,
    },

    /// A CPU number was not representable in a [`CpuSet`][crate::CpuSet] on this platform.
    #[error("CPU {cpu} is out of range, supports CPU numbers from 0 to {max}")]
    CpuOutOfRange {
        /// The offending CPU number, as written by the caller.
        cpu: u64,

        /// The largest CPU number supported on this platform.
        max: CpuId,
    },
}

/// A specialized `Result` type for CPU set operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
