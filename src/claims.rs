//! Text sets and oracle claims.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{DistanceError, Result};

/// A finite collection of distinct texts; order is irrelevant and
/// duplicates collapse.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSet(BTreeSet<String>);

impl TextSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, text: impl Into<String>) -> bool {
        self.0.insert(text.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.0.contains(text)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    pub(crate) fn ensure_non_empty(&self) -> Result<()> {
        if self.is_empty() {
            Err(DistanceError::EmptySet)
        } else {
            Ok(())
        }
    }
}

impl<S: Into<String>> FromIterator<S> for TextSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for TextSet {
    fn from(texts: [S; N]) -> Self {
        texts.into_iter().collect()
    }
}

/// The distance between `set_a` and `set_b` should lie in `[low, high]`.
///
/// Immutable once built; `0 ≤ low ≤ high ≤ 1` and both sets non-empty.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OracleClaim {
    set_a: TextSet,
    set_b: TextSet,
    low: f64,
    high: f64,
}

impl OracleClaim {
    pub fn new(set_a: TextSet, set_b: TextSet, (low, high): (f64, f64)) -> Result<Self> {
        let invalid = |reason| DistanceError::InvalidClaim { low, high, reason };
        if !low.is_finite() || !high.is_finite() {
            return Err(invalid("bounds must be finite"));
        }
        if !(0.0..=1.0).contains(&low) || !(0.0..=1.0).contains(&high) {
            return Err(invalid("bounds must lie in [0, 1]"));
        }
        if low > high {
            return Err(invalid("low bound exceeds high bound"));
        }
        set_a.ensure_non_empty()?;
        set_b.ensure_non_empty()?;

        Ok(Self {
            set_a,
            set_b,
            low,
            high,
        })
    }

    pub fn set_a(&self) -> &TextSet {
        &self.set_a
    }

    pub fn set_b(&self) -> &TextSet {
        &self.set_b
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn interval(&self) -> (f64, f64) {
        (self.low, self.high)
    }

    /// `max(0, low − d)² + max(0, d − high)²`
    #[inline]
    pub fn violation(&self, distance: f64) -> f64 {
        let under = (self.low - distance).max(0.0);
        let over = (distance - self.high).max(0.0);
        under * under + over * over
    }

    /// d(violation)/d(distance); zero inside the interval.
    #[inline]
    pub fn violation_slope(&self, distance: f64) -> f64 {
        if distance < self.low {
            -2.0 * (self.low - distance)
        } else if distance > self.high {
            2.0 * (distance - self.high)
        } else {
            0.0
        }
    }
}

/// Claims deserialise through the validating constructor.
impl<'de> Deserialize<'de> for OracleClaim {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawClaim {
            set_a: TextSet,
            set_b: TextSet,
            low: f64,
            high: f64,
        }

        let raw = RawClaim::deserialize(deserializer)?;
        OracleClaim::new(raw.set_a, raw.set_b, (raw.low, raw.high))
            .map_err(serde::de::Error::custom)
    }
}
