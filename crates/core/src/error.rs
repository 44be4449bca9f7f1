//! Crate error type.
//!
//! Everything here is a configuration error: raised at construction or
//! first use, fatal to the operation, never retried. Leaving the feasible
//! domain during integration is *not* an error — it is a first-class
//! termination reason recorded on the trajectory record.

use thiserror::Error;

pub type ZermeloResult<T> = Result<T, ZermeloError>;

#[derive(Error, Debug)]
pub enum ZermeloError {
    /// A gridded field's bounds rank does not match its sample dimensionality.
    #[error("shape mismatch for {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// Unrecognized front-tracking scheme name.
    #[error("unknown scheme '{0}' (expected 'sethian' or 'lolla')")]
    UnknownScheme(String),

    /// Unrecognized grid interpolation mode name.
    #[error("unknown interpolation '{0}' (expected 'bilinear' or 'nearest')")]
    UnknownInterpolation(String),

    /// A composite field was built over an empty child list.
    #[error("{what} requires at least one child")]
    EmptyComposite { what: &'static str },

    /// Degenerate grid geometry (too few nodes, inverted corners, ...).
    #[error("invalid grid: {what}")]
    InvalidGrid { what: String },
}
