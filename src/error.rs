//! Typed errors raised by the analysis core.

use thiserror::Error;

pub type AnalyzeResult<T> = Result<T, AnalyzeError>;

#[derive(Debug, Error, PartialEq)]
pub enum AnalyzeError {
    /// A side table or capture refers to an entry that does not exist.
    #[error("{table} refers to entry #{index}, but only {len} entries were logged")]
    IndexOutOfRange {
        table: &'static str,
        index: usize,
        len: usize,
    },

    #[error("invalid trace feed: {0}")]
    InvalidFeed(String),
}
