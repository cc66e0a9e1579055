//! Classification outcomes over representative sampling studies.
//!
//! Each case mirrors a pattern seen in practice:
//! - Clear unilateral dominance with corroborating indices
//! - Symmetric bilateral secretion
//! - A failed right cannulation judged by rescue criteria
//! - A study with no usable reference specimen

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("avsx"))
}

fn write_case(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("case.toml");
    fs::write(&path, contents).expect("Failed to write case file");
    path
}

#[test]
fn test_unilateral_dominance_reaches_high_confidence() {
    let temp_dir = setup_test_dir();
    let case = write_case(
        &temp_dir,
        r#"
panel = "aldosterone"
phases = "post"

[meta]
initials = "AB"
exam_date = "2024-03-09"
nodule_side = "right"

[[post.left]]
primary = 180.0
companion = 850.0
drawn_at = "09:12"

[[post.right]]
primary = 2400.0
companion = 900.0
drawn_at = "09:16"

[[post.right]]
primary = 2150.0
companion = 880.0
drawn_at = "09:20"

[[post.ivc]]
primary = 15.0
companion = 20.0
drawn_at = "09:10"
"#,
    );

    cli()
        .arg("interpret")
        .arg(&case)
        .assert()
        .success()
        .stdout(predicate::str::contains("unilateral right (confidence high)"))
        .stdout(predicate::str::contains("Known nodule: right"))
        // Both right draws average into the lateralization index
        .stdout(predicate::str::contains("Lateralization index: 12.07"))
        .stdout(predicate::str::contains("csi:"));
}

#[test]
fn test_symmetric_secretion_reads_bilateral() {
    let temp_dir = setup_test_dir();
    let case = write_case(
        &temp_dir,
        r#"
panel = "aldosterone"
phases = "post"

[[post.left]]
primary = 1200.0
companion = 700.0

[[post.right]]
primary = 1400.0
companion = 800.0

[[post.ivc]]
primary = 18.0
companion = 20.0
"#,
    );

    cli()
        .arg("interpret")
        .arg(&case)
        .assert()
        .success()
        .stdout(predicate::str::contains("bilateral (no lateralization)"));
}

#[test]
fn test_failed_right_cannulation_is_rescued() {
    let temp_dir = setup_test_dir();
    let case = write_case(
        &temp_dir,
        r#"
panel = "aldosterone"
phases = "post"

[[post.left]]
primary = 4000.0
companion = 850.0

[[post.right]]
primary = 100.0
companion = 60.0

[[post.ivc]]
primary = 15.0
companion = 20.0
"#,
    );

    cli()
        .arg("interpret")
        .arg(&case)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "unilateral left (confidence low, rescue criteria)",
        ))
        .stdout(predicate::str::contains(
            "Selectivity failed on the right side",
        ))
        .stdout(predicate::str::contains("met the secretion criterion"));
}

#[test]
fn test_rescue_without_criteria_reports_failed_cannulation() {
    let temp_dir = setup_test_dir();
    let case = write_case(
        &temp_dir,
        r#"
panel = "aldosterone"
phases = "post"

[[post.left]]
primary = 300.0
companion = 100.0

[[post.right]]
primary = 100.0
companion = 60.0

[[post.ivc]]
primary = 30.0
companion = 20.0
"#,
    );

    cli()
        .arg("interpret")
        .arg(&case)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "cannulation failed on the right side",
        ))
        .stdout(predicate::str::contains(
            "no cannulation-independent criterion was met",
        ));
}

#[test]
fn test_no_reference_specimen_is_fatal() {
    let temp_dir = setup_test_dir();
    let case = write_case(
        &temp_dir,
        r#"
panel = "aldosterone"
phases = "post"

[[post.left]]
primary = 180.0
companion = 850.0

[[post.right]]
primary = 2400.0
companion = 900.0
"#,
    );

    cli()
        .arg("interpret")
        .arg(&case)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "no valid sample for the IVC site in the post phase",
        ));
}

#[test]
fn test_indeterminate_band_notes_the_lean() {
    let temp_dir = setup_test_dir();
    let case = write_case(
        &temp_dir,
        r#"
panel = "aldosterone"
phases = "post"

[[post.left]]
primary = 400.0
companion = 800.0

[[post.right]]
primary = 1750.0
companion = 1000.0

[[post.ivc]]
primary = 15.0
companion = 20.0
"#,
    );

    // LI of 3.50 falls between the bilateral and unilateral thresholds
    cli()
        .arg("interpret")
        .arg(&case)
        .assert()
        .success()
        .stdout(predicate::str::contains("equivocal (nearer unilateral)"))
        .stdout(predicate::str::contains("indeterminate band"));
}

#[test]
fn test_pre_stimulation_thresholds_apply() {
    let temp_dir = setup_test_dir();
    let case = write_case(
        &temp_dir,
        r#"
panel = "aldosterone"
phases = "pre"

[[pre.left]]
primary = 180.0
companion = 850.0

[[pre.right]]
primary = 700.0
companion = 880.0

[[pre.ivc]]
primary = 15.0
companion = 20.0
"#,
    );

    // An LI of 3.76 lateralizes under the unstimulated threshold of 2
    cli()
        .arg("interpret")
        .arg(&case)
        .assert()
        .success()
        .stdout(predicate::str::contains("Pre phase"))
        .stdout(predicate::str::contains("unilateral right"))
        .stdout(predicate::str::contains("li_uni_pre:"));
}

#[test]
fn test_picogram_inputs_normalize_to_canonical_units() {
    let temp_dir = setup_test_dir();
    let case = write_case(
        &temp_dir,
        r#"
panel = "aldosterone"
phases = "post"

[units]
aldosterone = "pg/mL"

[[post.left]]
primary = 1800.0
companion = 850.0

[[post.right]]
primary = 24000.0
companion = 900.0

[[post.ivc]]
primary = 150.0
companion = 20.0
"#,
    );

    // Same study as the canonical-unit fixture, scaled by ten
    cli()
        .arg("interpret")
        .arg(&case)
        .assert()
        .success()
        .stdout(predicate::str::contains("unilateral right (confidence high)"))
        .stdout(predicate::str::contains("Lateralization index: 12.59"));
}

#[test]
fn test_cortisol_panel_reads_bilateral() {
    let temp_dir = setup_test_dir();
    let case = write_case(
        &temp_dir,
        r#"
panel = "cortisol"
phases = "post"

[[post.left]]
primary = 25.0
companion = 4000.0

[[post.right]]
primary = 27.0
companion = 4200.0

[[post.ivc]]
primary = 4.0
companion = 800.0
"#,
    );

    cli()
        .arg("interpret")
        .arg(&case)
        .assert()
        .success()
        .stdout(predicate::str::contains("Units: ug/dL / pg/mL"))
        .stdout(predicate::str::contains("bilateral (no lateralization)"));
}

#[test]
fn test_implausible_reference_value_warns_without_changing_verdict() {
    let temp_dir = setup_test_dir();
    let case = write_case(
        &temp_dir,
        r#"
panel = "aldosterone"
phases = "post"

[[post.left]]
primary = 180.0
companion = 850.0

[[post.right]]
primary = 2400.0
companion = 900.0

[[post.ivc]]
primary = 200.0
companion = 20.0
"#,
    );

    cli()
        .arg("interpret")
        .arg(&case)
        .assert()
        .success()
        .stdout(predicate::str::contains("Warnings"))
        .stdout(predicate::str::contains("post.ivc.sample1.primary"))
        .stdout(predicate::str::contains("unilateral right"));
}

#[test]
fn test_exported_report_round_trips_raw_values() {
    let temp_dir = setup_test_dir();
    let case = write_case(
        &temp_dir,
        r#"
panel = "aldosterone"
phases = "post"

[units]
aldosterone = "pg/mL"

[meta]
initials = "AB"

[[post.left]]
primary = 1800.0
companion = 850.0

[[post.right]]
primary = 24000.0
companion = 900.0

[[post.ivc]]
primary = 150.0
companion = 20.0
"#,
    );
    let out = temp_dir.path().join("report.csv");

    cli()
        .arg("export")
        .arg(&case)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let text = fs::read_to_string(&out).expect("Failed to read report");
    let parsed = avs_core::parse_report(&text).expect("Failed to parse report");

    assert_eq!(parsed.panel, "aldosterone");
    assert_eq!(parsed.initials.as_deref(), Some("AB"));
    assert_eq!(parsed.phases.len(), 1);

    // Sample cells carry the values as entered, in the case's units,
    // and read back exactly
    let input = &parsed.phases[0].input;
    assert_eq!(input.left[0].primary, Some(1800.0));
    assert_eq!(input.right[0].primary, Some(24000.0));
    assert_eq!(input.ivc[0].primary, Some(150.0));
    assert!(parsed.phases[0].conclusion.contains("unilateral right"));
}
