mod test_errors;
mod test_extraction;

use crate::claims::TextSet;
use crate::evaluator::DistanceEvaluator;
use crate::extraction::FactorBag;

pub const T0: &str = "a lovely text";
pub const T1: &str = "another lovely text";
pub const T2: &str = "something entirely different";

/// Routes `log` output through the test harness; `RUST_LOG=debug` to see it.
pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The three-text corpus with every default.
pub fn lovely_evaluator() -> DistanceEvaluator {
    DistanceEvaluator::new([T0, T1, T2]).expect("non-empty corpus")
}

pub fn set<const N: usize>(texts: [&str; N]) -> TextSet {
    TextSet::from(texts)
}

/// Whitespace tokenizer, handy when substring factors would obscure a test.
pub fn words(text: &str) -> FactorBag {
    text.split_whitespace().collect()
}
