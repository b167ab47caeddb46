//! Error taxonomy.
//!
//! Every variant is a caller error detected at the boundary of the operation
//! that received the bad input. Zero-vector operands are not errors: they are
//! resolved by the convention in [`crate::operators::cosine_distance`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DistanceError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistanceError {
    /// Interval bounds of an oracle claim are malformed.
    #[error("invalid claim interval [{low}, {high}]: {reason}")]
    InvalidClaim {
        low: f64,
        high: f64,
        reason: &'static str,
    },

    #[error("the corpus contains no texts")]
    EmptyCorpus,

    #[error("a text set must contain at least one text")]
    EmptySet,

    #[error("fit requires at least one oracle claim")]
    EmptyClaimSet,

    /// A caller-supplied initial weight is negative or not finite.
    #[error("weight for '{key}' must be finite and non-negative, got {value}")]
    NegativeWeight { key: String, value: f64 },

    #[error("invalid fit configuration: {0}")]
    InvalidConfig(String),
}
