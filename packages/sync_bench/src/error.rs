use std::io;

use thiserror::Error;

/// Errors that can occur when configuring or executing a benchmark.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller asked for zero operations, which leaves nothing to divide among workers.
    #[error("operation count must be positive")]
    ZeroOperations,

    /// The requested operation count does not fit the counters used to plan measurements.
    #[error(
        "{millions} million operations is too many: the doubled count of skewed measurements and the bounded channel buffer must both fit"
    )]
    OperationCountOverflow {
        /// The operation count the caller asked for, in millions.
        millions: u64,
    },

    /// The report could not be written to its destination.
    #[error("failed to write benchmark report: {0}")]
    Output(#[from] io::Error),
}

/// A specialized `Result` type for benchmark operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
