//! Design Builder Tests
//!
//! Completeness, permutation validity, capping and shuffle uniformity.

use rand::rngs::StdRng;
use rand::SeedableRng;
use factorial_trials::design::{shuffle, DesignBuilder, Factor, FactorLevel, Trial};
use factorial_trials::Error;

fn sorted_keys(trials: &[Trial]) -> Vec<String> {
    let mut keys: Vec<String> = trials.iter().map(ToString::to_string).collect();
    keys.sort();
    keys
}

fn paired_design(reps: usize) -> DesignBuilder {
    DesignBuilder::new()
        .factor(Factor::range("Mass1", 1.0, 3.0, 3))
        .factor(Factor::range("Mass2", 1.0, 3.0, 3))
        .factor(Factor::discrete("Sound1", ["tap", "thud", "clank"]))
        .factor(Factor::discrete("Sound2", ["tap", "thud", "clank"]))
        .repetitions(reps)
}

// =============================================================================
// Completeness
// =============================================================================

#[test]
fn test_single_range_design_has_30_trials() {
    let sequence = DesignBuilder::new()
        .factor(Factor::range("Mass", 1.0, 4.0, 6))
        .repetitions(5)
        .build()
        .unwrap();

    assert_eq!(sequence.len(), 30);
    assert_eq!(sequence.design_size(), 30);
    assert_eq!(sequence.columns(), ["Mass"]);

    // Each of the 6 masses appears exactly 5 times.
    let mut masses: Vec<f64> = sequence.iter().filter_map(|t| t.magnitude(0)).collect();
    masses.sort_by(f64::total_cmp);
    for chunk in masses.chunks(5) {
        assert!(chunk.iter().all(|&m| (m - chunk[0]).abs() < 1e-12));
    }
}

#[test]
fn test_mixed_factor_design_size() {
    let sequence = paired_design(2).build().unwrap();
    assert_eq!(sequence.len(), 2 * 3 * 3 * 3 * 3);
}

// =============================================================================
// Permutation validity
// =============================================================================

#[test]
fn test_uncapped_sequence_is_permutation_of_cross_product() {
    let builder = paired_design(1);
    let base = builder.cross_product().unwrap();
    let shuffled = builder
        .build_with_rng(&mut StdRng::seed_from_u64(99))
        .unwrap();

    assert_eq!(sorted_keys(&base), sorted_keys(shuffled.trials()));
    assert_ne!(
        base.iter().map(ToString::to_string).collect::<Vec<_>>(),
        shuffled.iter().map(ToString::to_string).collect::<Vec<_>>()
    );
}

#[test]
fn test_capped_sequence_is_sample_without_replacement() {
    let builder = paired_design(3).max_trials(Some(50));
    let sequence = builder.build_with_rng(&mut StdRng::seed_from_u64(5)).unwrap();

    assert_eq!(builder.design_size().unwrap(), 243);
    assert_eq!(sequence.len(), 50);

    // No cell appears more often than its 3 repetitions allow.
    let keys = sorted_keys(sequence.trials());
    for window in keys.windows(4) {
        assert_ne!(window[0], window[3], "cell sampled more than 3 times");
    }

    let universe = sorted_keys(&builder.cross_product().unwrap());
    assert!(keys.iter().all(|k| universe.binary_search(k).is_ok()));
}

#[test]
fn test_back_to_back_capped_sessions_differ() {
    let builder = paired_design(3).max_trials(Some(50));
    let a = builder.build().unwrap();
    let b = builder.build().unwrap();
    assert_ne!(a.trials(), b.trials());
}

#[test]
fn test_discrete_levels_keep_labels() {
    let sequence = DesignBuilder::new()
        .factor(Factor::discrete("Sound", ["tap", "thud"]))
        .build()
        .unwrap();

    let mut labels: Vec<&str> = sequence
        .iter()
        .filter_map(|t| t.level(0).and_then(FactorLevel::label))
        .collect();
    labels.sort_unstable();
    assert_eq!(labels, ["tap", "thud"]);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_invalid_design_reports_factor() {
    let err = DesignBuilder::new()
        .factor(Factor::range("Scale", 0.5, 2.0, 1))
        .build()
        .unwrap_err();

    assert!(matches!(err, Error::InvalidDesign(_)));
    assert!(err.to_string().contains("Scale"));
}

#[test]
fn test_empty_discrete_list_is_invalid() {
    let labels: [&str; 0] = [];
    let err = DesignBuilder::new()
        .factor(Factor::range("Mass", 1.0, 2.0, 2))
        .factor(Factor::discrete("Sound", labels))
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDesign(_)));
}

#[test]
fn test_huge_design_is_invalid_not_fatal() {
    let err = DesignBuilder::new()
        .factor(Factor::indexed("A", 1 << 40))
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDesign(_)));
}

#[test]
fn test_unbounded_range_span_is_invalid() {
    let err = DesignBuilder::new()
        .factor(Factor::range("Mass", -1e308, 1e308, 3))
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDesign(_)));
}

// =============================================================================
// Uniformity (statistical)
// =============================================================================

#[test]
fn test_shuffle_positions_are_uniform() {
    const ITEMS: usize = 4;
    const RUNS: usize = 8000;

    let mut rng = StdRng::seed_from_u64(2024);
    let mut counts = [[0usize; ITEMS]; ITEMS];

    for _ in 0..RUNS {
        let mut items: Vec<usize> = (0..ITEMS).collect();
        shuffle(&mut items, &mut rng);
        for (position, &item) in items.iter().enumerate() {
            counts[position][item] += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let expected = (RUNS / ITEMS) as f64;
    for (position, row) in counts.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let chi_square: f64 = row
            .iter()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();
        // df = 3; p < 1e-5 cutoff
        assert!(
            chi_square < 25.9,
            "position {position} is not uniform: chi^2 = {chi_square:.2}, counts = {row:?}"
        );
    }
}
