use std::collections::HashMap;

use crate::corpus::Corpus;
use crate::error::Result;
use crate::evaluator::DistanceEvaluator;
use crate::extraction::{FactorExtractor, SubstringExtractor};
use crate::weights::WeightStore;

// Add logging
use log::{debug, info, trace};

/// Construction options for a [`DistanceEvaluator`].
///
/// Without options the evaluator uses [`SubstringExtractor`] with its
/// defaults, idf factor weights and length-normalised text weights.
pub struct DistanceEvaluatorBuilder<E = SubstringExtractor> {
    extractor: E,
    factor_weights: HashMap<String, f64>,
    text_weights: HashMap<String, f64>,
}

impl Default for DistanceEvaluatorBuilder<SubstringExtractor> {
    fn default() -> Self {
        debug!("Creating DistanceEvaluatorBuilder with default parameters");
        Self {
            extractor: SubstringExtractor::default(),
            factor_weights: HashMap::new(),
            text_weights: HashMap::new(),
        }
    }
}

impl DistanceEvaluatorBuilder<SubstringExtractor> {
    pub fn new() -> Self {
        info!("Initializing new DistanceEvaluatorBuilder");
        Self::default()
    }
}

impl<E: FactorExtractor> DistanceEvaluatorBuilder<E> {
    // -------------------- Extraction --------------------

    /// Swap the factor extractor; any `Fn(&str) -> FactorBag` works.
    pub fn with_extractor<F: FactorExtractor>(self, extractor: F) -> DistanceEvaluatorBuilder<F> {
        info!("Configuring custom factor extractor");
        DistanceEvaluatorBuilder {
            extractor,
            factor_weights: self.factor_weights,
            text_weights: self.text_weights,
        }
    }

    // -------------------- Initial weights --------------------

    /// Initial factor weights replacing the idf value for the listed
    /// factors. Factors that never occur in the corpus are ignored.
    pub fn with_factor_weights<I, K>(mut self, weights: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        self.factor_weights
            .extend(weights.into_iter().map(|(k, w)| (k.into(), w)));
        info!("Setting {} initial factor weights", self.factor_weights.len());
        self
    }

    /// Initial text weights replacing `1 / |bag|` for the listed texts.
    pub fn with_text_weights<I, K>(mut self, weights: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        self.text_weights
            .extend(weights.into_iter().map(|(k, w)| (k.into(), w)));
        info!("Setting {} initial text weights", self.text_weights.len());
        self
    }

    // -------------------- Build --------------------

    /// Extract the corpus, count document frequencies and seed the weights.
    ///
    /// Fails with `EmptyCorpus` for an empty collection and with
    /// `NegativeWeight` if an initial weight is negative or not finite.
    pub fn build<I, S>(self, corpus: I) -> Result<DistanceEvaluator<E>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        trace!("Extracting corpus factors");
        let corpus = Corpus::new(corpus, &self.extractor)?;

        let mut weights = WeightStore::from_corpus(&corpus);
        if !self.factor_weights.is_empty() {
            let applied = weights.override_factor_weights(
                self.factor_weights.iter().map(|(k, &w)| (k.as_str(), w)),
            )?;
            debug!(
                "Applied {}/{} factor weight overrides",
                applied,
                self.factor_weights.len()
            );
        }
        if !self.text_weights.is_empty() {
            let applied = weights.override_text_weights(
                self.text_weights.iter().map(|(k, &w)| (k.as_str(), w)),
            )?;
            debug!(
                "Applied {}/{} text weight overrides",
                applied,
                self.text_weights.len()
            );
        }

        info!(
            "DistanceEvaluator build completed: {} texts, {} factors",
            corpus.len(),
            corpus.statistics().vocabulary_size()
        );
        Ok(DistanceEvaluator::from_parts(corpus, weights, self.extractor))
    }
}
