use thiserror::Error;

use crate::{MAX_THREAD_GROUPS, MAX_THREADS_PER_GROUP};

/// Errors that can occur when configuring processor assignments.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The thread group number is beyond the supported number of thread groups.
    #[error(
        "thread group {group} is out of range, supports thread groups from 0 to {}",
        MAX_THREAD_GROUPS - 1
    )]
    ThreadGroupOutOfRange {
        /// The thread group number that was rejected.
        group: usize,
    },

    /// The thread number is beyond the supported number of threads per group.
    #[error(
        "thread {thread} is out of range, supports threads from 0 to {} in each group",
        MAX_THREADS_PER_GROUP - 1
    )]
    ThreadOutOfRange {
        /// The thread number that was rejected.
        thread: usize,
    },
}

/// A specialized `Result` type for processor topology operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
