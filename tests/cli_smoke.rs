use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::tempdir;

#[derive(Debug, serde::Deserialize)]
struct EvalRow {
    case_name: String,
    questions_asked: usize,
    pairs_wrong: usize,
    stop_reason: String,
}

const FLATS: &str = r#"{
    "criteria": {"rent": ["high", "fair", "low"], "light": ["dim", "bright"]},
    "alts": {
        "Attic": {"rent": "low", "light": "dim"},
        "Corner": {"rent": "fair", "light": "bright"},
        "Basement": {"rent": "fair", "light": "dim"}
    }
}"#;

#[test]
fn eval_writes_one_line_per_case() {
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("eval.jsonl");

    let status = Command::new(env!("CARGO_BIN_EXE_ordinal"))
        .args(["eval", "--case", "binary_2x2x2x2/"])
        .arg("--out")
        .arg(&out_path)
        .status()
        .unwrap();
    assert!(status.success());

    let raw = std::fs::read_to_string(&out_path).unwrap();
    let rows: Vec<EvalRow> = raw.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(rows.len(), 8);
    assert_eq!(rows[0].case_name, "binary_2x2x2x2/find_best_1/2");
    assert!(rows.iter().all(|r| r.pairs_wrong == 0));
    assert_eq!(rows[0].stop_reason, "goal_met");
    assert!(rows[7].questions_asked > 0);
}

#[test]
fn eval_runs_a_random_scenario() {
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("random.jsonl");

    let status = Command::new(env!("CARGO_BIN_EXE_ordinal"))
        .args(["eval", "--random-shape", "3,2,2", "--random-alts", "4", "--seed", "11"])
        .arg("--out")
        .arg(&out_path)
        .status()
        .unwrap();
    assert!(status.success());

    let raw = std::fs::read_to_string(&out_path).unwrap();
    let rows: Vec<EvalRow> = raw.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(rows.len(), 8);
    assert!(rows.iter().all(|r| r.case_name.starts_with("random_11/")));
    assert!(rows.iter().all(|r| r.pairs_wrong == 0));
}

#[test]
fn space_reports_dominance_only_order() {
    let dir = tempdir().unwrap();
    let scenario = dir.path().join("flats.json");
    std::fs::write(&scenario, FLATS).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_ordinal"))
        .arg("space")
        .arg(&scenario)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Items: 6\n"), "{stdout}");
    assert!(stdout.contains("(high, dim)<(low, dim)"), "{stdout}");
}

#[test]
fn run_answers_from_stdin_and_writes_outputs() {
    let dir = tempdir().unwrap();
    let scenario = dir.path().join("flats.json");
    std::fs::write(&scenario, FLATS).unwrap();
    let dot = dir.path().join("prefs.dot");
    let report = dir.path().join("report.md");
    let trace = dir.path().join("trace.jsonl");

    let mut child = Command::new(env!("CARGO_BIN_EXE_ordinal"))
        .arg("run")
        .arg(&scenario)
        .arg("--dot")
        .arg(&dot)
        .arg("--report")
        .arg(&report)
        .arg("--trace")
        .arg(&trace)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    // Always prefer the first option shown.
    child
        .stdin
        .take()
        .unwrap()
        .write_all("a\n".repeat(10).as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Which do you prefer?"));
    assert!(stdout.contains("Preferences: "), "{stdout}");
    assert!(stdout.contains("Basement<Corner"), "{stdout}");

    assert!(std::fs::read_to_string(&dot).unwrap().starts_with("digraph {"));
    assert!(std::fs::read_to_string(&report)
        .unwrap()
        .starts_with("# Elicitation Report"));
    let asked = std::fs::read_to_string(&trace).unwrap().lines().count();
    assert_eq!(stdout.matches("Which do you prefer?").count(), asked);
}
