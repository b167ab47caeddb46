//! fitting_distance - a tf-idf cosine distance on sets of texts that learns
//! from examples.
//!
//! Texts are turned into multisets of factors; a set of texts becomes one
//! weighted vector (`text weight · factor weight · count`, summed); the
//! distance between two sets is one minus the cosine similarity of their
//! vectors. Callers can then state *oracle claims* ("the distance between
//! these two sets should lie in `[low, high]`") and fit the factor and text
//! weights so the distance agrees with them as closely as projected gradient
//! descent allows.
//!
//! # Architecture
//!
//! ```text
//! texts → FactorExtractor → Corpus ─┬→ CorpusStatistics → WeightStore (idf, 1/|bag|)
//!                                   │                          │
//!        TextSet, TextSet ──────────┴→ build_vector ──→ cosine_distance
//!                                                              │
//!        OracleClaim[] ─────────────→ FittingSession ──→ WeightStore (updated)
//! ```

pub mod builder;
pub mod claims;
pub mod corpus;
pub mod error;
pub mod evaluator;
pub mod extraction;
pub mod fitting;
pub mod operators;
pub mod weights;

#[cfg(test)]
mod tests;

pub use builder::DistanceEvaluatorBuilder;
pub use claims::{OracleClaim, TextSet};
pub use corpus::{Corpus, CorpusStatistics};
pub use error::{DistanceError, Result};
pub use evaluator::DistanceEvaluator;
pub use extraction::{FactorBag, FactorExtractor, SubstringExtractor};
pub use fitting::{FitConfig, FitReport, StopReason};
pub use weights::{WeightStore, DEFAULT_WEIGHT};
