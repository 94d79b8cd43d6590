use std::fs;
use std::path::{Path, PathBuf};

use imcp_curve::config::{CurveKind, EvalConfig, RenderOptions};
use imcp_curve::pipeline::run;
use imcp_curve::EvalError;

const TRUTH: &str = "building_id,damage_grade
1,1
2,2
3,3
4,2
5,2
";

const PERFECT: &str = "building_id,damage_grade_pred,1,2,3
1,1,1.0,0.0,0.0
2,2,0.0,1.0,0.0
3,3,0.0,0.0,1.0
4,2,0.0,1.0,0.0
5,2,0.0,1.0,0.0
";

const NOISY: &str = "building_id,damage_grade_pred,1,2,3
1,1,0.7,0.2,0.1
2,2,0.1,0.6,0.3
3,2,0.2,0.5,0.3
4,2,0.3,0.4,0.3
5,1,0.5,0.3,0.2
";

/// Writes `contents` into `dir/name` and returns the path.
fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let p = dir.join(name);
    fs::write(&p, contents).unwrap();
    p
}

fn config() -> EvalConfig {
    EvalConfig {
        id_column: Some("building_id".into()),
        ..EvalConfig::default()
    }
}

#[test]
fn perfect_predictions_reach_the_maximum_area() {
    let dir = tempfile::tempdir().unwrap();
    let truth = write(dir.path(), "truth.csv", TRUTH);
    let pred = write(dir.path(), "pred.csv", PERFECT);
    let out = dir.path().join("plot.svg");

    let outcome = run(&truth, &pred, &out, &config(), RenderOptions::default()).unwrap();
    assert!((outcome.area() - 1.0).abs() < 1e-12);
    let svg = fs::read_to_string(&out).unwrap();
    assert!(svg.contains("<svg"));
}

#[test]
fn png_output_has_requested_size() {
    let dir = tempfile::tempdir().unwrap();
    let truth = write(dir.path(), "truth.csv", TRUTH);
    let pred = write(dir.path(), "pred.csv", NOISY);
    let out = dir.path().join("plot.png");

    let render = RenderOptions {
        width: 320,
        height: 240,
        per_class: true,
        font: None,
    };
    let outcome = run(&truth, &pred, &out, &config(), render).unwrap();
    assert!(outcome.area() > 0.0 && outcome.area() < 1.0);
    assert_eq!(image::image_dimensions(&out).unwrap(), (320, 240));
    assert_eq!(outcome.summary.classes.len(), 3);
    assert_eq!(outcome.summary.rows, 5);
}

#[test]
fn imcp_and_mcp_differ_on_imbalanced_data() {
    let dir = tempfile::tempdir().unwrap();
    let truth = write(dir.path(), "truth.csv", TRUTH);
    let pred = write(dir.path(), "pred.csv", NOISY);

    let imcp = run(&truth, &pred, &dir.path().join("a.svg"), &config(), RenderOptions::default())
        .unwrap()
        .area();
    let mcp_cfg = EvalConfig {
        curve: CurveKind::Mcp,
        ..config()
    };
    let mcp = run(&truth, &pred, &dir.path().join("b.svg"), &mcp_cfg, RenderOptions::default())
        .unwrap()
        .area();
    assert!((imcp - mcp).abs() > 1e-6);
}

#[test]
fn swapped_inputs_fail() {
    let dir = tempfile::tempdir().unwrap();
    let truth = write(dir.path(), "truth.csv", TRUTH);
    let pred = write(dir.path(), "pred.csv", PERFECT);
    let err = run(&pred, &truth, &dir.path().join("p.png"), &config(), RenderOptions::default())
        .unwrap_err();
    assert!(matches!(err, EvalError::MissingColumn { ref column, .. } if column == "damage_grade"));
}

#[test]
fn missing_prediction_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    let truth = write(dir.path(), "truth.csv", TRUTH);
    let pred = write(
        dir.path(),
        "pred.csv",
        "building_id,1,2,3\n1,1,0,0\n2,0,1,0\n3,0,0,1\n4,0,1,0\n5,0,1,0\n",
    );
    let err = run(&truth, &pred, &dir.path().join("p.png"), &config(), RenderOptions::default())
        .unwrap_err();
    assert!(
        matches!(err, EvalError::MissingColumn { ref column, .. } if column == "damage_grade_pred")
    );
}

#[test]
fn unjoined_id_column_is_not_taken_for_a_class() {
    let dir = tempfile::tempdir().unwrap();
    let truth = write(dir.path(), "truth.csv", TRUTH);
    let pred = write(dir.path(), "pred.csv", PERFECT);
    let out = dir.path().join("plot.svg");

    let err = run(&truth, &pred, &out, &EvalConfig::default(), RenderOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        EvalError::ClassMismatch { ref names, .. } if names == &["building_id".to_string()]
    ));
    assert!(!out.exists());
}

#[test]
fn missing_output_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let truth = write(dir.path(), "truth.csv", TRUTH);
    let pred = write(dir.path(), "pred.csv", PERFECT);
    let out = dir.path().join("no").join("such").join("plot.png");
    let err = run(&truth, &pred, &out, &config(), RenderOptions::default()).unwrap_err();
    assert!(matches!(err, EvalError::OutputDir(_)));
    assert!(!out.exists());
}

#[test]
fn row_count_mismatch_is_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let truth = write(dir.path(), "truth.csv", "damage_grade\n1\n2\n3\n");
    let pred = write(
        dir.path(),
        "pred.csv",
        "damage_grade_pred,1,2,3\n1,1,0,0\n2,0,1,0\n",
    );
    let err = run(
        &truth,
        &pred,
        &dir.path().join("p.png"),
        &EvalConfig::default(),
        RenderOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        EvalError::RowCountMismatch { truth: 3, predicted: 2 }
    ));
}

#[test]
fn id_join_matches_positional_alignment() {
    let dir = tempfile::tempdir().unwrap();
    let truth = write(dir.path(), "truth.csv", TRUTH);
    let mut shuffled: Vec<&str> = NOISY.lines().collect();
    shuffled[1..].reverse();
    let pred = write(dir.path(), "pred.csv", &(shuffled.join("\n") + "\n"));
    let aligned = write(dir.path(), "aligned.csv", NOISY);

    let joined = run(&truth, &pred, &dir.path().join("a.svg"), &config(), RenderOptions::default())
        .unwrap()
        .area();
    let positional = run(
        &truth,
        &aligned,
        &dir.path().join("b.svg"),
        &config(),
        RenderOptions::default(),
    )
    .unwrap()
    .area();
    assert!((joined - positional).abs() < 1e-12);
}

#[test]
fn custom_column_names() {
    let dir = tempfile::tempdir().unwrap();
    let truth = write(dir.path(), "truth.tsv", "label\ncat\ndog\n");
    let pred = write(
        dir.path(),
        "pred.tsv",
        "predicted\tp_cat\tp_dog\ncat\t0.9\t0.1\ndog\t0.2\t0.8\n",
    );
    let cfg = EvalConfig {
        truth_column: "label".into(),
        pred_column: "predicted".into(),
        ..EvalConfig::default()
    };
    let outcome = run(&truth, &pred, &dir.path().join("p.svg"), &cfg, RenderOptions::default())
        .unwrap();
    let cols: Vec<&str> = outcome
        .summary
        .classes
        .iter()
        .map(|c| c.column.as_str())
        .collect();
    assert_eq!(cols, vec!["p_cat", "p_dog"]);
}

#[test]
fn unsupported_image_extension_fails() {
    let dir = tempfile::tempdir().unwrap();
    let truth = write(dir.path(), "truth.csv", TRUTH);
    let pred = write(dir.path(), "pred.csv", PERFECT);
    let err = run(&truth, &pred, &dir.path().join("plot.pdf"), &config(), RenderOptions::default())
        .unwrap_err();
    assert!(matches!(err, EvalError::UnsupportedImage { .. }));
}
