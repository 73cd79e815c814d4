//! Error types for loupe CLI operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for loupe CLI operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The log directory could not be read.
    #[error("cannot read directory `{path}`: {source}")]
    ReadDir {
        /// The directory that was scanned.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A log file could not be read.
    #[error("cannot read log file `{path}`: {source}")]
    ReadFile {
        /// The file that was being loaded.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The query failed to compile.
    #[error(transparent)]
    Query(#[from] loupe_query::Error),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// A specialized Result type for loupe operations.
pub type Result<T> = std::result::Result<T, Error>;
