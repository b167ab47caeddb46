//! Learnable weights.
//!
//! Both mappings are total functions: keys observed in the corpus carry a
//! stored, learnable value; every other key reads as [`DEFAULT_WEIGHT`] and
//! is never written. All stored values stay non-negative: every write goes
//! through a projection onto `[0, ∞)`.

use std::collections::HashMap;

use log::{debug, trace};

use crate::corpus::Corpus;
use crate::error::{DistanceError, Result};

/// Weight of factors and texts outside the corpus.
pub const DEFAULT_WEIGHT: f64 = 1.0;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeightStore {
    factor_weights: HashMap<String, f64>,
    text_weights: HashMap<String, f64>,
}

impl WeightStore {
    /// Initial tf-idf style weights.
    ///
    /// - factor: `ln(N / df)`, so a factor present in every text weighs 0
    /// - text: `1 / |bag|` (occurrences counted with multiplicity); an empty
    ///   bag keeps [`DEFAULT_WEIGHT`]
    pub fn from_corpus(corpus: &Corpus) -> Self {
        let stats = corpus.statistics();
        let factor_weights: HashMap<String, f64> = stats
            .iter()
            .map(|(factor, _)| (factor.to_string(), stats.idf(factor)))
            .collect();

        let text_weights: HashMap<String, f64> = corpus
            .iter()
            .map(|(text, bag)| {
                let w = if bag.is_empty() {
                    DEFAULT_WEIGHT
                } else {
                    1.0 / bag.len() as f64
                };
                (text.to_string(), w)
            })
            .collect();

        debug!(
            "Initial weights: {} factors ({} at zero), {} texts",
            factor_weights.len(),
            factor_weights.values().filter(|&&w| w == 0.0).count(),
            text_weights.len()
        );

        Self {
            factor_weights,
            text_weights,
        }
    }

    #[inline]
    pub fn factor_weight(&self, factor: &str) -> f64 {
        self.factor_weights
            .get(factor)
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }

    #[inline]
    pub fn text_weight(&self, text: &str) -> f64 {
        self.text_weights.get(text).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    /// True if `factor` carries a learnable weight.
    #[inline]
    pub fn is_learnable_factor(&self, factor: &str) -> bool {
        self.factor_weights.contains_key(factor)
    }

    #[inline]
    pub fn is_learnable_text(&self, text: &str) -> bool {
        self.text_weights.contains_key(text)
    }

    pub fn factor_weights(&self) -> &HashMap<String, f64> {
        &self.factor_weights
    }

    pub fn text_weights(&self) -> &HashMap<String, f64> {
        &self.text_weights
    }

    /// Replaces initial factor weights. Keys outside the corpus are ignored.
    pub fn override_factor_weights<'a>(
        &mut self,
        weights: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Result<usize> {
        override_entries(&mut self.factor_weights, weights)
    }

    /// Replaces initial text weights. Keys outside the corpus are ignored.
    pub fn override_text_weights<'a>(
        &mut self,
        weights: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Result<usize> {
        override_entries(&mut self.text_weights, weights)
    }

    /// `w ← max(0, w − rate · g)` for a learnable factor. Returns false for
    /// keys outside the corpus, which are left untouched.
    pub(crate) fn step_factor(&mut self, factor: &str, rate: f64, gradient: f64) -> bool {
        step_entry(&mut self.factor_weights, factor, rate, gradient)
    }

    pub(crate) fn step_text(&mut self, text: &str, rate: f64, gradient: f64) -> bool {
        step_entry(&mut self.text_weights, text, rate, gradient)
    }

    /// Puts back a value saved before a rejected step.
    pub(crate) fn restore_factor(&mut self, factor: &str, value: f64) {
        if let Some(w) = self.factor_weights.get_mut(factor) {
            *w = value.max(0.0);
        }
    }

    pub(crate) fn restore_text(&mut self, text: &str, value: f64) {
        if let Some(w) = self.text_weights.get_mut(text) {
            *w = value.max(0.0);
        }
    }
}

fn override_entries<'a>(
    entries: &mut HashMap<String, f64>,
    weights: impl IntoIterator<Item = (&'a str, f64)>,
) -> Result<usize> {
    let mut applied = 0;
    for (key, value) in weights {
        if !value.is_finite() || value < 0.0 {
            return Err(DistanceError::NegativeWeight {
                key: key.to_string(),
                value,
            });
        }
        match entries.get_mut(key) {
            Some(slot) => {
                *slot = value;
                applied += 1;
            }
            None => trace!("Ignoring weight override for '{}' (not in corpus)", key),
        }
    }
    Ok(applied)
}

#[inline]
fn step_entry(entries: &mut HashMap<String, f64>, key: &str, rate: f64, gradient: f64) -> bool {
    match entries.get_mut(key) {
        Some(w) => {
            *w = (*w - rate * gradient).max(0.0);
            true
        }
        None => false,
    }
}
