//! The calibratable distance on sets of texts.
//!
//! A [`DistanceEvaluator`] owns the corpus, the learnable [`WeightStore`]
//! and the factor extractor. Queries borrow it immutably; [`fit`] borrows
//! it mutably, so a fit can never interleave with a distance query.
//!
//! # Examples
//!
//! ```
//! use fitting_distance::{DistanceEvaluator, OracleClaim, TextSet};
//!
//! let t0 = "a lovely text";
//! let t1 = "another lovely text";
//! let t2 = "something entirely different";
//! let mut ftd = DistanceEvaluator::new([t0, t1, t2]).unwrap();
//!
//! let d = ftd.distance(&TextSet::from([t0]), &TextSet::from([t1])).unwrap();
//! assert!((d - 0.7129).abs() < 1e-3);
//!
//! // the only shared factors occur in every text, so their idf weight is 0
//! let d = ftd.distance(&TextSet::from([t0]), &TextSet::from([t2])).unwrap();
//! assert_eq!(d, 1.0);
//!
//! let claim = OracleClaim::new(TextSet::from([t0]), TextSet::from([t1]), (0.5, 0.6)).unwrap();
//! let report = ftd.fit(&[claim]).unwrap();
//! assert!(report.final_loss < report.initial_loss);
//! ```
//!
//! [`fit`]: DistanceEvaluator::fit

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use log::{debug, trace};

use crate::builder::DistanceEvaluatorBuilder;
use crate::claims::{OracleClaim, TextSet};
use crate::corpus::{Corpus, CorpusStatistics};
use crate::error::{DistanceError, Result};
use crate::extraction::{FactorExtractor, SubstringExtractor};
use crate::fitting::{total_loss, FitConfig, FitReport, FittingSession, ResolvedClaim};
use crate::operators::{build_vector, cosine_distance, ResolvedText};
use crate::weights::WeightStore;

pub struct DistanceEvaluator<E = SubstringExtractor> {
    corpus: Corpus,
    weights: WeightStore,
    extractor: E,
}

impl DistanceEvaluator<SubstringExtractor> {
    /// Evaluator over `corpus` with every default.
    pub fn new<I, S>(corpus: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DistanceEvaluatorBuilder::new().build(corpus)
    }

    pub fn builder() -> DistanceEvaluatorBuilder<SubstringExtractor> {
        DistanceEvaluatorBuilder::new()
    }
}

impl<E: FactorExtractor> DistanceEvaluator<E> {
    pub(crate) fn from_parts(corpus: Corpus, weights: WeightStore, extractor: E) -> Self {
        Self {
            corpus,
            weights,
            extractor,
        }
    }

    // -------------------- Queries --------------------

    /// Cosine distance between the aggregated vectors of `a` and `b` under
    /// the current weights. Fails with `EmptySet` if either set is empty.
    pub fn distance(&self, a: &TextSet, b: &TextSet) -> Result<f64> {
        self.distance_with(&self.weights, a, b)
    }

    /// Same as [`Self::distance`] against an explicit weight snapshot.
    pub fn distance_with(&self, weights: &WeightStore, a: &TextSet, b: &TextSet) -> Result<f64> {
        a.ensure_non_empty()?;
        b.ensure_non_empty()?;
        let resolved_a = resolve(&self.corpus, &self.extractor, a);
        let resolved_b = resolve(&self.corpus, &self.extractor, b);
        let va = build_vector(&resolved_a, weights);
        let vb = build_vector(&resolved_b, weights);
        let d = cosine_distance(&va, &vb);
        trace!(
            "distance(|A|={}, |B|={}) = {:.6} over {}/{} coordinates",
            a.len(),
            b.len(),
            d,
            va.len(),
            vb.len()
        );
        Ok(d)
    }

    /// The weighted vector of `set`, keyed by factor.
    pub fn vectorize(&self, set: &TextSet) -> Result<BTreeMap<String, f64>> {
        set.ensure_non_empty()?;
        let resolved = resolve(&self.corpus, &self.extractor, set);
        Ok(build_vector(&resolved, &self.weights)
            .into_iter()
            .map(|(f, x)| (f.to_string(), x))
            .collect())
    }

    /// Current violation of one claim.
    pub fn violation(&self, claim: &OracleClaim) -> f64 {
        let resolved = resolve_claim(&self.corpus, &self.extractor, claim);
        claim.violation(resolved.distance(&self.weights))
    }

    /// Current total violation over `claims`.
    pub fn loss(&self, claims: &[OracleClaim]) -> f64 {
        let resolved: Vec<ResolvedClaim<'_>> = claims
            .iter()
            .map(|claim| resolve_claim(&self.corpus, &self.extractor, claim))
            .collect();
        total_loss(&resolved, &self.weights)
    }

    // -------------------- Calibration --------------------

    /// Fit the weights to `claims` with the default [`FitConfig`].
    pub fn fit(&mut self, claims: &[OracleClaim]) -> Result<FitReport> {
        self.fit_with(claims, FitConfig::default())
    }

    /// Fit the weights to `claims`, mutating them in place.
    ///
    /// Best effort: the report carries the residual violation of every
    /// claim, which need not reach zero.
    pub fn fit_with(&mut self, claims: &[OracleClaim], config: FitConfig) -> Result<FitReport> {
        if claims.is_empty() {
            return Err(DistanceError::EmptyClaimSet);
        }
        let resolved: Vec<ResolvedClaim<'_>> = claims
            .iter()
            .map(|claim| resolve_claim(&self.corpus, &self.extractor, claim))
            .collect();
        debug!(
            "Resolved {} claims over {} distinct texts",
            resolved.len(),
            distinct_texts(&resolved)
        );

        let session = FittingSession::new(&mut self.weights, &resolved, config)?;
        Ok(session.run())
    }

    // -------------------- Accessors --------------------

    /// Weight of `factor`; 1.0 for factors outside the corpus.
    pub fn factor_weight(&self, factor: &str) -> f64 {
        self.weights.factor_weight(factor)
    }

    /// Weight of `text`; 1.0 for texts outside the corpus.
    pub fn text_weight(&self, text: &str) -> f64 {
        self.weights.text_weight(text)
    }

    pub fn factor_weights(&self) -> &HashMap<String, f64> {
        self.weights.factor_weights()
    }

    pub fn text_weights(&self) -> &HashMap<String, f64> {
        self.weights.text_weights()
    }

    pub fn weights(&self) -> &WeightStore {
        &self.weights
    }

    pub fn statistics(&self) -> &CorpusStatistics {
        self.corpus.statistics()
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }
}

/// Pairs each text with its bag: cached for corpus texts, extracted on the
/// fly otherwise.
fn resolve<'a, E: FactorExtractor>(
    corpus: &'a Corpus,
    extractor: &E,
    set: &'a TextSet,
) -> Vec<ResolvedText<'a>> {
    set.iter()
        .map(|text| {
            let bag = match corpus.bag(text) {
                Some(bag) => Cow::Borrowed(bag),
                None => {
                    trace!("Extracting factors for text outside the corpus");
                    Cow::Owned(extractor.extract(text))
                }
            };
            ResolvedText { text, bag }
        })
        .collect()
}

fn resolve_claim<'a, E: FactorExtractor>(
    corpus: &'a Corpus,
    extractor: &E,
    claim: &'a OracleClaim,
) -> ResolvedClaim<'a> {
    ResolvedClaim {
        claim,
        set_a: resolve(corpus, extractor, claim.set_a()),
        set_b: resolve(corpus, extractor, claim.set_b()),
    }
}

fn distinct_texts(claims: &[ResolvedClaim<'_>]) -> usize {
    let mut texts: Vec<&str> = claims
        .iter()
        .flat_map(|c| c.set_a.iter().chain(c.set_b.iter()).map(|t| t.text))
        .collect();
    texts.sort_unstable();
    texts.dedup();
    texts.len()
}
