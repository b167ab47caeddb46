use crate::claims::{OracleClaim, TextSet};
use crate::error::DistanceError;
use crate::evaluator::DistanceEvaluator;
use crate::fitting::FitConfig;
use crate::tests::{lovely_evaluator, set, T0, T1};

#[test]
fn test_empty_corpus() {
    let empty: Vec<String> = Vec::new();
    let err = DistanceEvaluator::new(empty).err().expect("empty corpus must fail");
    assert_eq!(err, DistanceError::EmptyCorpus);
}

#[test]
fn test_empty_query_set() {
    let ftd = lovely_evaluator();
    let empty = TextSet::new();
    assert_eq!(
        ftd.distance(&empty, &set([T0])).unwrap_err(),
        DistanceError::EmptySet
    );
    assert_eq!(
        ftd.distance(&set([T0]), &empty).unwrap_err(),
        DistanceError::EmptySet
    );
    assert_eq!(ftd.vectorize(&empty).unwrap_err(), DistanceError::EmptySet);
}

#[test]
fn test_claim_with_inverted_bounds() {
    let err = OracleClaim::new(set([T0]), set([T1]), (0.7, 0.3)).unwrap_err();
    assert!(matches!(err, DistanceError::InvalidClaim { low, high, .. } if low == 0.7 && high == 0.3));
}

#[test]
fn test_claim_bounds_outside_unit_interval() {
    for bounds in [(-0.1, 0.5), (0.2, 1.5), (f64::NAN, 0.5), (0.0, f64::INFINITY)] {
        let err = OracleClaim::new(set([T0]), set([T1]), bounds).unwrap_err();
        assert!(
            matches!(err, DistanceError::InvalidClaim { .. }),
            "bounds {:?} should be rejected",
            bounds
        );
    }
}

#[test]
fn test_claim_degenerate_interval_is_valid() {
    let claim = OracleClaim::new(set([T0]), set([T1]), (0.4, 0.4)).unwrap();
    assert_eq!(claim.interval(), (0.4, 0.4));
    assert!(OracleClaim::new(set([T0]), set([T1]), (0.0, 1.0)).is_ok());
}

#[test]
fn test_claim_with_empty_set() {
    let err = OracleClaim::new(TextSet::new(), set([T1]), (0.2, 0.3)).unwrap_err();
    assert_eq!(err, DistanceError::EmptySet);
    let err = OracleClaim::new(set([T0]), TextSet::new(), (0.2, 0.3)).unwrap_err();
    assert_eq!(err, DistanceError::EmptySet);
}

#[test]
fn test_fit_without_claims() {
    let mut ftd = lovely_evaluator();
    let before = ftd.weights().clone();
    assert_eq!(ftd.fit(&[]).unwrap_err(), DistanceError::EmptyClaimSet);
    assert_eq!(ftd.weights(), &before);
}

#[test]
fn test_fit_rejects_invalid_config() {
    let mut ftd = lovely_evaluator();
    let claim = OracleClaim::new(set([T0]), set([T1]), (0.5, 0.6)).unwrap();
    let bad = [
        FitConfig::default().with_learning_rate(0.0),
        FitConfig::default().with_learning_rate(f64::NAN),
        FitConfig::default().with_max_iterations(0),
        FitConfig::default().with_tolerance(-1.0),
        FitConfig::default().with_text_weight_share(1.5),
    ];
    for config in bad {
        let err = ftd.fit_with(&[claim.clone()], config).unwrap_err();
        assert!(matches!(err, DistanceError::InvalidConfig(_)), "{:?}", config);
    }
}

#[test]
fn test_negative_initial_weight() {
    let err = DistanceEvaluator::builder()
        .with_factor_weights([("lovel", -2.0)])
        .build([T0, T1])
        .err()
        .expect("negative weight must fail");
    assert!(matches!(err, DistanceError::NegativeWeight { ref key, .. } if key == "lovel"));
}

#[test]
fn test_error_messages() {
    let err = OracleClaim::new(set([T0]), set([T1]), (0.7, 0.3)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid claim interval [0.7, 0.3]: low bound exceeds high bound"
    );
    assert_eq!(
        DistanceError::EmptyClaimSet.to_string(),
        "fit requires at least one oracle claim"
    );
}
