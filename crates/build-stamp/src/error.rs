//! Error type for stamping operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while stamping a source file.
#[derive(Debug, Error)]
pub enum StampError {
    /// The target could not be opened or was not valid UTF-8 text.
    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        /// File being stamped.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The rewritten contents could not be written back.
    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        /// File being stamped.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}
