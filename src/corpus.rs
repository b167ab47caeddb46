//! Corpus and corpus statistics.
//!
//! The corpus is fixed at construction: every text is extracted once, its
//! bag is cached, and document frequencies are counted over the distinct
//! texts. Nothing here is mutated afterwards.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info};

use crate::error::{DistanceError, Result};
use crate::extraction::{FactorBag, FactorExtractor};

/// Per-factor document frequency and corpus size.
#[derive(Clone, Debug, Default)]
pub struct CorpusStatistics {
    document_frequency: HashMap<String, usize>,
    size: usize,
}

impl CorpusStatistics {
    pub fn from_bags<'a>(bags: impl IntoIterator<Item = &'a FactorBag>) -> Self {
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        let mut size = 0;
        for bag in bags {
            size += 1;
            for factor in bag.factors() {
                *document_frequency.entry(factor.to_string()).or_insert(0) += 1;
            }
        }
        Self {
            document_frequency,
            size,
        }
    }

    /// Number of corpus texts containing `factor` (0 if unseen).
    #[inline]
    pub fn document_frequency(&self, factor: &str) -> usize {
        self.document_frequency.get(factor).copied().unwrap_or(0)
    }

    /// Number of distinct texts in the corpus.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of distinct factors observed in the corpus.
    #[inline]
    pub fn vocabulary_size(&self) -> usize {
        self.document_frequency.len()
    }

    pub fn contains(&self, factor: &str) -> bool {
        self.document_frequency.contains_key(factor)
    }

    /// `ln(N / df)`; 0 for a factor present in every text or never seen.
    pub fn idf(&self, factor: &str) -> f64 {
        let df = self.document_frequency(factor);
        if df == 0 {
            return 0.0;
        }
        (self.size as f64 / df as f64).ln()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.document_frequency.iter().map(|(f, &df)| (f.as_str(), df))
    }
}

/// The texts supplied at construction with their cached factor bags.
#[derive(Clone, Debug)]
pub struct Corpus {
    bags: BTreeMap<String, FactorBag>,
    statistics: CorpusStatistics,
}

impl Corpus {
    /// Extracts every text once. Duplicate texts collapse.
    pub fn new<I, S, E>(texts: I, extractor: &E) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        E: FactorExtractor + ?Sized,
    {
        let mut bags = BTreeMap::new();
        for text in texts {
            let text = text.into();
            if !bags.contains_key(&text) {
                let bag = extractor.extract(&text);
                bags.insert(text, bag);
            }
        }
        if bags.is_empty() {
            return Err(DistanceError::EmptyCorpus);
        }

        let statistics = CorpusStatistics::from_bags(bags.values());
        info!(
            "Corpus built: {} texts, {} distinct factors",
            statistics.size(),
            statistics.vocabulary_size()
        );
        debug!(
            "Mean factor occurrences per text: {:.2}",
            bags.values().map(FactorBag::len).sum::<usize>() as f64 / bags.len() as f64
        );

        Ok(Self { bags, statistics })
    }

    #[inline]
    pub fn bag(&self, text: &str) -> Option<&FactorBag> {
        self.bags.get(text)
    }

    #[inline]
    pub fn contains(&self, text: &str) -> bool {
        self.bags.contains_key(text)
    }

    pub fn len(&self) -> usize {
        self.bags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bags.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.bags.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FactorBag)> + '_ {
        self.bags.iter().map(|(t, b)| (t.as_str(), b))
    }

    pub fn statistics(&self) -> &CorpusStatistics {
        &self.statistics
    }
}
