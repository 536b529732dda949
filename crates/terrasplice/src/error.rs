//! Error type for terrasplice.
//!
//! Only conditions that mean the build pipeline is broken end up here:
//! unreadable or malformed input, unknown area names, bad slot indices,
//! and output that cannot be written. Expected gaps (a neighbor tile that
//! has not been built yet, a sliver with nowhere to go) are not errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while clipping or matching a tile.
///
/// ## Rust Lesson #20: Error Handling
///
/// `thiserror` writes the `Display` and `std::error::Error` impls for us.
/// `#[source]` keeps the underlying cause so callers can walk the chain.
#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be opened, read or written.
    #[error("{context} {path}: {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A polygon definition stream is malformed.
    #[error("invalid polygon data in {path}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    /// An area name that is not in the priority table.
    #[error("unknown area type '{0}'")]
    UnknownAreaType(String),

    /// A raw area slot index outside the priority table.
    #[error("area type index {index} out of range (max {max})")]
    AreaIndexOutOfRange { index: usize, max: usize },

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl Error {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            context,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
