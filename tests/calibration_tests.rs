use std::io::Write;

use phrase_clustering::calibration::{
    accuracy, CalibrationConfig, CalibrationCorpus, ThresholdCalibrator,
};
use phrase_clustering::{ClusterError, ModelConfig, WordVectorModel};
use tempfile::NamedTempFile;

fn build_test_model() -> WordVectorModel {
    let vocab = "\
car 1.0,0.0,0.0
automobile 2.0,0.0,0.0
vehicle 0.5,0.0,0.0
banana 0.0,1.0,0.0
ocean 0.0,0.0,1.0
sea 0.0,0.0,3.0
";
    WordVectorModel::from_reader(vocab.as_bytes(), ModelConfig::default())
        .unwrap()
}

fn build_calibrator(
    model: &WordVectorModel,
    parallel: bool,
) -> ThresholdCalibrator<'_, WordVectorModel> {
    let config = CalibrationConfig {
        parallel,
        ..CalibrationConfig::default()
    };
    ThresholdCalibrator::new(model, config).unwrap()
}

fn corpus(text: &str) -> CalibrationCorpus {
    CalibrationCorpus::parse(text.as_bytes()).unwrap()
}

#[test]
fn test_degenerate_corpus_has_perfect_interior_threshold() {
    let model = build_test_model();
    let good = corpus("1\ncar\nautomobile\nvehicle\n-\n2\nocean\nsea\n-\n");
    let bad = corpus("1\ncar\nbanana\n-\n3\nbanana\nsea\n-\n");

    for parallel in [false, true] {
        let best = build_calibrator(&model, parallel)
            .optimal_threshold(&good, &bad)
            .unwrap();
        assert!(best.threshold > 0.0 && best.threshold < 1.0, "got {best:?}");
        assert_eq!(best.score, 1.0);
        // First perfect point on the grid wins.
        assert!((best.threshold - 0.01).abs() < 1e-12);
    }
}

#[test]
fn test_sweep_covers_unit_interval() {
    let model = build_test_model();
    let calibrator = build_calibrator(&model, false);
    let good = corpus("1\ncar\nautomobile\n-\n");
    let bad = corpus("1\ncar\nbanana\n-\n");

    let sweep = calibrator.sweep(&good, &bad).unwrap();
    assert_eq!(sweep.len(), 101);
    assert_eq!(sweep[0].threshold, 0.0);
    assert_eq!(sweep[100].threshold, 1.0);

    // At t = 0 everything clusters, so the bad corpus scores zero.
    assert_eq!(sweep[0].good_accuracy, 1.0);
    assert_eq!(sweep[0].bad_accuracy, 1.0);
    assert_eq!(sweep[0].score, 0.5);
}

#[test]
fn test_pair_similarities_are_weighted_per_group() {
    let model = build_test_model();
    let calibrator = build_calibrator(&model, false);
    let good = corpus("2\ncar\nautomobile\nbanana\n-\n");

    let pairs = calibrator.pair_similarities(&good).unwrap();
    assert_eq!(pairs.len(), 3);
    assert!(pairs.iter().all(|p| p.weight == 2.0));
    assert_eq!(pairs[0].left, "car");
    assert_eq!(pairs[0].right, "automobile");
    assert!((pairs[0].similarity - 1.0).abs() < 1e-12);

    // One of three equally weighted pairs clears 0.5.
    assert!((accuracy(&pairs, 0.5) - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_unknown_phrases_score_zero() {
    let model = build_test_model();
    let calibrator = build_calibrator(&model, false);
    let pairs = calibrator
        .pair_similarities(&corpus("1\ncar\nthe\n-\n"))
        .unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].similarity, 0.0);
}

#[test]
fn test_calibrate_files() {
    let model = build_test_model();
    let mut good = NamedTempFile::new().unwrap();
    write!(good, "1\ncar\nautomobile\n-\n").unwrap();
    let mut bad = NamedTempFile::new().unwrap();
    write!(bad, "1\ncar\nocean\n-\n").unwrap();

    let calibrator = build_calibrator(&model, false);
    let best = calibrator.calibrate_files(good.path(), bad.path()).unwrap();
    assert_eq!(best.score, 1.0);
}

#[test]
fn test_unreadable_corpus_is_fatal() {
    let model = build_test_model();
    let calibrator = build_calibrator(&model, false);
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("cluster_these.txt");

    let err = calibrator.calibrate_files(&missing, &missing).unwrap_err();
    assert!(matches!(err, ClusterError::Io { .. }));
}

#[test]
fn test_corpus_format() {
    let corpus = corpus("0.5\nice cream\ngelato\n-\n\n3\nsoda\npop\ncoke\n--\n");
    assert_eq!(corpus.groups.len(), 2);
    assert_eq!(corpus.groups[0].weight, 0.5);
    assert_eq!(corpus.groups[1].phrases, vec!["soda", "pop", "coke"]);
    assert_eq!(corpus.pair_count(), 1 + 3);
}

#[test]
fn test_step_outside_unit_interval_is_rejected() {
    let model = build_test_model();
    for step in [0.0, -0.01, 2.0, f64::NAN] {
        let config = CalibrationConfig {
            step,
            ..CalibrationConfig::default()
        };
        let result = ThresholdCalibrator::new(&model, config);
        assert!(
            matches!(result, Err(ClusterError::InvalidConfig(_))),
            "step {step} should be rejected"
        );
    }
}

#[test]
fn test_coarse_step_grid() {
    let model = build_test_model();
    let config = CalibrationConfig {
        step: 0.25,
        ..CalibrationConfig::default()
    };
    let calibrator = ThresholdCalibrator::new(&model, config).unwrap();
    let good = corpus("1\ncar\nautomobile\n-\n");
    let bad = corpus("1\ncar\nbanana\n-\n");

    let sweep = calibrator.sweep(&good, &bad).unwrap();
    let grid: Vec<f64> = sweep.iter().map(|p| p.threshold).collect();
    assert_eq!(grid, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
}
