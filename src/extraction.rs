//! Factor extraction: text → multiset of factors.
//!
//! The distance never tokenizes on its own; it asks a [`FactorExtractor`]
//! once per text and caches the resulting [`FactorBag`]. Any deterministic,
//! side-effect free `Fn(&str) -> FactorBag` is an extractor.
//!
//! [`SubstringExtractor`] is the default: it keeps a small alphabet, maps
//! every other character to a space, and emits every substring up to a
//! maximum length. Spaces are kept so that factors spanning word
//! boundaries (`"y te"`) carry word-order information.
//!
//! # Examples
//!
//! ```
//! use fitting_distance::extraction::{FactorExtractor, SubstringExtractor};
//!
//! let bag = SubstringExtractor::new(2).extract("Abba!");
//! assert_eq!(bag.count("b"), 2);
//! assert_eq!(bag.count("ab"), 1);
//! assert_eq!(bag.count("a "), 1);
//! ```

use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_MAX_FACTOR_LENGTH: usize = 5;
pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

/// Multiset of factors with per-factor multiplicity.
///
/// Backed by a sorted map so iteration order (and therefore every floating
/// point accumulation downstream) is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FactorBag {
    counts: BTreeMap<String, usize>,
    total: usize,
}

impl FactorBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `multiplicity` occurrences of `factor`.
    pub fn insert(&mut self, factor: impl Into<String>, multiplicity: usize) {
        if multiplicity == 0 {
            return;
        }
        *self.counts.entry(factor.into()).or_insert(0) += multiplicity;
        self.total += multiplicity;
    }

    #[inline]
    pub fn count(&self, factor: &str) -> usize {
        self.counts.get(factor).copied().unwrap_or(0)
    }

    /// Total number of occurrences, multiplicities included.
    #[inline]
    pub fn len(&self) -> usize {
        self.total
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of distinct factors.
    #[inline]
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.counts.iter().map(|(f, &c)| (f.as_str(), c))
    }

    pub fn factors(&self) -> impl Iterator<Item = &str> + '_ {
        self.counts.keys().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for FactorBag {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut bag = FactorBag::new();
        for factor in iter {
            bag.insert(factor, 1);
        }
        bag
    }
}

/// Pure function from a text to its factor multiset.
pub trait FactorExtractor {
    fn extract(&self, text: &str) -> FactorBag;
}

impl<F> FactorExtractor for F
where
    F: Fn(&str) -> FactorBag,
{
    fn extract(&self, text: &str) -> FactorBag {
        self(text)
    }
}

/// Character substrings of length `1..=max_factor_length` over a cleaned text.
#[derive(Clone, Debug)]
pub struct SubstringExtractor {
    max_factor_length: usize,
    alphabet: BTreeSet<char>,
}

impl Default for SubstringExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FACTOR_LENGTH)
    }
}

impl SubstringExtractor {
    /// `max_factor_length` of 0 is treated as 1.
    pub fn new(max_factor_length: usize) -> Self {
        Self {
            max_factor_length: max_factor_length.max(1),
            alphabet: DEFAULT_ALPHABET.chars().collect(),
        }
    }

    /// Replaces the retained alphabet. Letters are matched after lowercasing.
    pub fn with_alphabet(mut self, alphabet: &str) -> Self {
        self.alphabet = alphabet.chars().collect();
        self
    }

    pub fn max_factor_length(&self) -> usize {
        self.max_factor_length
    }

    /// Lowercases and maps every character outside the alphabet to `' '`.
    pub fn clean(&self, text: &str) -> Vec<char> {
        text.chars().map(|c| self.clean_char(c)).collect()
    }

    fn clean_char(&self, c: char) -> char {
        let mut lower = c.to_lowercase();
        match (lower.next(), lower.next()) {
            (Some(l), None) if self.alphabet.contains(&l) => l,
            _ => ' ',
        }
    }
}

impl FactorExtractor for SubstringExtractor {
    fn extract(&self, text: &str) -> FactorBag {
        let chars = self.clean(text);
        let n = chars.len();
        let mut bag = FactorBag::new();
        for start in 0..n {
            let end_max = n.min(start + self.max_factor_length);
            for end in (start + 1)..=end_max {
                bag.insert(chars[start..end].iter().collect::<String>(), 1);
            }
        }
        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bag_counts_and_total() {
        let bag: FactorBag = ["x", "y", "x"].into_iter().collect();
        assert_eq!(bag.count("x"), 2);
        assert_eq!(bag.count("z"), 0);
        assert_eq!(bag.len(), 3);
        assert_eq!(bag.distinct(), 2);
    }

    #[test]
    fn test_clean_maps_foreign_characters_to_space() {
        let ex = SubstringExtractor::default();
        let cleaned: String = ex.clean("Héllo, W0rld").into_iter().collect();
        assert_eq!(cleaned, "h llo  w0rld");
    }

    #[test]
    fn test_substring_count() {
        // n chars, max length m: sum over starts of min(m, n - start)
        let bag = SubstringExtractor::new(5).extract("a lovely text");
        assert_eq!(bag.len(), 55);
        let bag = SubstringExtractor::new(2).extract("abc");
        assert_eq!(bag.len(), 5);
        assert_eq!(bag.count("bc"), 1);
    }

    #[test]
    fn test_empty_text_gives_empty_bag() {
        assert!(SubstringExtractor::default().extract("").is_empty());
    }

    #[test]
    fn test_closure_is_an_extractor() {
        let words = |text: &str| text.split_whitespace().collect::<FactorBag>();
        let bag = words.extract("to be or not to be");
        assert_eq!(bag.count("to"), 2);
        assert_eq!(bag.distinct(), 4);
    }
}
