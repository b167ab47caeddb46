use crate::evaluator::DistanceEvaluator;
use crate::extraction::{FactorExtractor, SubstringExtractor};
use crate::tests::{set, T0, T1};

use approx::assert_abs_diff_eq;

#[test]
fn test_case_and_punctuation_are_normalised() {
    let ftd = DistanceEvaluator::new([T0, T1, "Something, entirely DIFFERENT!"]).unwrap();
    let shouted = "A LOVELY TEXT";
    let d = ftd.distance(&set([T0]), &set([shouted])).unwrap();
    // same factor bag, but the shouted text is outside the corpus (weight 1)
    assert_abs_diff_eq!(d, 0.0, epsilon = 1e-12);
}

#[test]
fn test_extractor_bag_matches_cached_corpus_bag() {
    let ftd = DistanceEvaluator::new([T0, T1]).unwrap();
    let fresh = SubstringExtractor::default().extract(T0);
    assert_eq!(ftd.corpus().bag(T0), Some(&fresh));
}

#[test]
fn test_max_factor_length_controls_vocabulary() {
    let short = DistanceEvaluator::builder()
        .with_extractor(SubstringExtractor::new(1))
        .build([T0, T1])
        .unwrap();
    let long = DistanceEvaluator::builder()
        .with_extractor(SubstringExtractor::new(3))
        .build([T0, T1])
        .unwrap();

    assert_eq!(short.extractor().max_factor_length(), 1);
    assert_eq!(long.extractor().max_factor_length(), 3);
    assert!(short.factor_weights().keys().all(|f| f.chars().count() == 1));
    assert!(long.factor_weights().keys().any(|f| f.chars().count() == 3));
    assert!(long.statistics().vocabulary_size() > short.statistics().vocabulary_size());
}

#[test]
fn test_custom_alphabet() {
    let digits = SubstringExtractor::new(2).with_alphabet("0123456789");
    let bag = digits.extract("ab12");
    assert_eq!(bag.count("  "), 1);
    assert_eq!(bag.count("12"), 1);
    assert_eq!(bag.count("a"), 0);
}
