//! Error types surfaced at the boundaries of this crate: configuration parsing,
//! file I/O, and solver preconditions. Numeric degeneracies inside the Eikonal
//! update are never surfaced as errors (see [`crate::eikonal::solve_eikonal`]);
//! they are handled in-band by falling back to the one-dimensional update.

use thiserror::Error;

/// Unified error type for everything outside the hot solver loop.
#[derive(Error, Debug)]
pub enum EikonalError {
    /// A configuration file was missing a required key, had an unparseable
    /// value, or named an unknown solver.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A file could not be opened, or its contents did not match the expected
    /// grid/path/occupancy-map format.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A solver precondition was violated: the grid was not clean, no sources
    /// were given, a goal was required but unset, or a source fell on an
    /// impassable cell.
    #[error("precondition violated: {0}")]
    Precondition(String),
}

/// Convenience alias used throughout the crate's fallible APIs.
pub type Result<T> = std::result::Result<T, EikonalError>;
