//! Sparse weighted vectors and the cosine distance between them.
//!
//! - `build_vector`: Σ over texts of `text_weight · factor_weight · count`
//! - `cosine_distance`: `1 − a·b / (‖a‖‖b‖)` with the zero-vector convention
//! - `CosineTerms`: the same evaluation, keeping what the gradient needs
//!
//! Products are formed on operands rescaled by their largest coefficient,
//! so weights anywhere in the finite range neither overflow nor underflow.
//!
//! Vectors are keyed by factor in a sorted map, so every reduction walks
//! coordinates in the same order and `d(a, b) == d(b, a)` holds bit for bit.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::extraction::FactorBag;
use crate::weights::WeightStore;

/// Factor → coefficient. Zero coefficients are never stored.
pub type SparseVector<'a> = BTreeMap<&'a str, f64>;

/// A text together with its factor bag, ready to be vectorised.
///
/// Corpus texts borrow their cached bag; texts outside the corpus own a
/// freshly extracted one.
#[derive(Clone, Debug)]
pub struct ResolvedText<'a> {
    pub text: &'a str,
    pub bag: Cow<'a, FactorBag>,
}

/// Largest coefficient. Coefficients are positive, so 0 only for an empty
/// vector.
#[inline]
fn max_coefficient(a: &SparseVector<'_>) -> f64 {
    a.values().fold(0.0, |m, &x| m.max(x.abs()))
}

/// `‖a / scale‖`; with `scale` the largest coefficient this lies in
/// `[1, √n]` and can neither overflow nor underflow.
#[inline]
fn scaled_norm(a: &SparseVector<'_>, scale: f64) -> f64 {
    a.values()
        .map(|&x| {
            let y = x / scale;
            y * y
        })
        .sum::<f64>()
        .sqrt()
}

/// `(a / scale_a) · (b / scale_b)` over the shared support, walked in key
/// order of `a`.
#[inline]
fn scaled_dot(a: &SparseVector<'_>, b: &SparseVector<'_>, scale_a: f64, scale_b: f64) -> f64 {
    a.iter()
        .filter_map(|(f, &x)| b.get(f).map(|&y| (x / scale_a) * (y / scale_b)))
        .sum()
}

/// Euclidean norm (L2), rescaled so extreme coefficients do not overflow.
pub fn norm(a: &SparseVector<'_>) -> f64 {
    let scale = max_coefficient(a);
    if scale == 0.0 {
        return 0.0;
    }
    scale * scaled_norm(a, scale)
}

/// Aggregates a set of texts into a single weighted vector.
///
/// No normalisation: cosine similarity is scale invariant per operand.
pub fn build_vector<'b>(texts: &'b [ResolvedText<'_>], weights: &WeightStore) -> SparseVector<'b> {
    let mut vector = SparseVector::new();
    for resolved in texts {
        let tw = weights.text_weight(resolved.text);
        if tw == 0.0 {
            continue;
        }
        for (factor, count) in resolved.bag.iter() {
            let contribution = tw * weights.factor_weight(factor) * count as f64;
            if contribution > 0.0 {
                *vector.entry(factor).or_insert(0.0) += contribution;
            }
        }
    }
    vector
}

/// Weighted cosine distance in `[0, 1]`.
///
/// Both operands zero → 0; exactly one zero → 1.
pub fn cosine_distance(a: &SparseVector<'_>, b: &SparseVector<'_>) -> f64 {
    CosineTerms::evaluate(a, b).distance
}

/// Intermediate quantities of one cosine distance evaluation.
///
/// Both operands are divided by their largest coefficient before any
/// product is formed; cosine similarity is invariant under that rescaling.
#[derive(Clone, Debug)]
pub struct CosineTerms<'v, 'a> {
    a: &'v SparseVector<'a>,
    b: &'v SparseVector<'a>,
    scale_a: f64,
    scale_b: f64,
    norm_a: f64,
    norm_b: f64,
    pub similarity: f64,
    pub distance: f64,
    /// Set when either operand is the zero vector; the distance is then
    /// locally constant and its gradient is zero.
    pub degenerate: bool,
}

impl<'v, 'a> CosineTerms<'v, 'a> {
    pub fn evaluate(a: &'v SparseVector<'a>, b: &'v SparseVector<'a>) -> Self {
        let scale_a = max_coefficient(a);
        let scale_b = max_coefficient(b);
        let mut terms = Self {
            a,
            b,
            scale_a,
            scale_b,
            norm_a: 0.0,
            norm_b: 0.0,
            similarity: 0.0,
            distance: 1.0,
            degenerate: true,
        };

        // zero coefficients are never stored: empty is exactly the zero vector
        if a.is_empty() && b.is_empty() {
            terms.similarity = 1.0;
            terms.distance = 0.0;
            return terms;
        }
        if a.is_empty() || b.is_empty() {
            return terms;
        }

        let norm_a = scaled_norm(a, scale_a);
        let norm_b = scaled_norm(b, scale_b);
        let sim = scaled_dot(a, b, scale_a, scale_b) / (norm_a * norm_b);
        if !sim.is_finite() {
            // an overflowed (infinite) coefficient
            return terms;
        }

        terms.norm_a = norm_a;
        terms.norm_b = norm_b;
        terms.similarity = sim;
        terms.distance = (1.0 - sim).clamp(0.0, 1.0);
        terms.degenerate = false;
        terms
    }

    /// ∂distance/∂a_f = −(b_f / (‖a‖‖b‖) − sim · a_f / ‖a‖²)
    ///
    /// Defined for every factor, including those absent from `a`.
    #[inline]
    pub fn gradient_a(&self, factor: &str) -> f64 {
        if self.degenerate {
            return 0.0;
        }
        partial(
            (self.a, self.scale_a, self.norm_a),
            (self.b, self.scale_b, self.norm_b),
            self.similarity,
            factor,
        )
    }

    /// ∂distance/∂b_f, the mirror of [`Self::gradient_a`].
    #[inline]
    pub fn gradient_b(&self, factor: &str) -> f64 {
        if self.degenerate {
            return 0.0;
        }
        partial(
            (self.b, self.scale_b, self.norm_b),
            (self.a, self.scale_a, self.norm_a),
            self.similarity,
            factor,
        )
    }
}

/// The partial derivative on the rescaled operands `x̂ = x / s_x`:
/// `−(ŷ_f / (‖x̂‖‖ŷ‖) − sim · x̂_f / ‖x̂‖²) / s_x`.
#[inline]
fn partial(
    (x, scale_x, norm_x): (&SparseVector<'_>, f64, f64),
    (y, scale_y, norm_y): (&SparseVector<'_>, f64, f64),
    similarity: f64,
    factor: &str,
) -> f64 {
    let xf = x.get(factor).copied().unwrap_or(0.0) / scale_x;
    let yf = y.get(factor).copied().unwrap_or(0.0) / scale_y;
    -(yf / (norm_x * norm_y) - similarity * xf / (norm_x * norm_x)) / scale_x
}
