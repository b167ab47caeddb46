/// Calibration walk-through: measure a few distances, state what they should
/// be, fit, and measure again.
///
/// Run with `RUST_LOG=debug cargo run --example calibrate_texts` to follow
/// the descent.
use fitting_distance::{DistanceEvaluator, FitConfig, OracleClaim, TextSet};
use log::info;

fn print_section(title: &str) {
    println!();
    println!("── {} {}", title, "─".repeat(60usize.saturating_sub(title.len())));
}

fn main() -> fitting_distance::Result<()> {
    env_logger::init();

    let texts = [
        "a lovely text",
        "another lovely text",
        "something entirely different",
        "a lovely afternoon by the river",
        "the river was entirely different",
    ];
    let mut ftd = DistanceEvaluator::new(texts)?;
    info!(
        "Corpus: {} texts, {} distinct factors",
        ftd.corpus().len(),
        ftd.statistics().vocabulary_size()
    );

    let pairs = [
        (TextSet::from([texts[0]]), TextSet::from([texts[1]])),
        (TextSet::from([texts[0]]), TextSet::from([texts[2]])),
        (TextSet::from([texts[3]]), TextSet::from([texts[4]])),
        (TextSet::from([texts[0], texts[3]]), TextSet::from([texts[1], texts[4]])),
    ];

    print_section("Initial distances");
    for (a, b) in &pairs {
        println!("  {:>8.4}  {:?} ↔ {:?}", ftd.distance(a, b)?, a, b);
    }

    let claims = vec![
        OracleClaim::new(pairs[0].0.clone(), pairs[0].1.clone(), (0.1, 0.3))?,
        OracleClaim::new(pairs[2].0.clone(), pairs[2].1.clone(), (0.4, 0.6))?,
    ];

    print_section("Fitting");
    let config = FitConfig::default().with_max_iterations(20);
    let report = ftd.fit_with(&claims, config)?;
    println!(
        "  {:?} after {} iterations, loss {:.6e} → {:.6e}",
        report.stop_reason, report.iterations, report.initial_loss, report.final_loss
    );
    for (claim, (d, r)) in claims
        .iter()
        .zip(report.distances.iter().zip(report.residuals.iter()))
    {
        println!(
            "  [{:.2}, {:.2}]  distance {:.4}  residual {:.3e}",
            claim.low(),
            claim.high(),
            d,
            r
        );
    }

    print_section("Distances after fitting");
    for (a, b) in &pairs {
        println!("  {:>8.4}  {:?} ↔ {:?}", ftd.distance(a, b)?, a, b);
    }

    Ok(())
}
