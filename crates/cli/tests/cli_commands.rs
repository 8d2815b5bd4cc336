use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

#[allow(deprecated)]
fn semalign(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("semalign").expect("binary");
    cmd.current_dir(workdir)
        .env("SEMALIGN_EMBED_MODE", "stub")
        .env_remove("RUST_LOG");
    cmd
}

fn workspace(files: &[(&str, &str)]) -> TempDir {
    let temp = tempdir().unwrap();
    for (name, body) in files {
        fs::write(temp.path().join(name), body).unwrap();
    }
    temp
}

fn run_json(workdir: &Path, args: &[&str]) -> (bool, Value) {
    let output = semalign(workdir).args(args).output().expect("command run");
    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    (output.status.success(), body)
}

#[test]
fn align_reports_identical_sequences_as_matches() {
    let temp = workspace(&[(
        "input.json",
        r#"{"left": ["alpha", "beta", "gamma"], "right": ["alpha", "beta", "gamma"]}"#,
    )]);
    let (ok, body) = run_json(temp.path(), &["align", "--input", "input.json", "--json"]);
    assert!(ok, "{body}");
    assert_eq!(body["mode"], "single_shot");
    assert_eq!(body["model"], "stub");
    assert_eq!(body["gap_penalty"], 0.8);
    assert_eq!(body["stats"]["matches"], 3);
    assert_eq!(
        body["rows"],
        json!([["alpha", "alpha"], ["beta", "beta"], ["gamma", "gamma"]])
    );
}

#[test]
fn chunked_align_reports_resolved_overlap() {
    let tokens: Vec<String> = (0..9).map(|i| format!("step {i}")).collect();
    let input = json!({ "left": tokens, "right": tokens }).to_string();
    let temp = workspace(&[("input.json", &input)]);

    let (ok, body) = run_json(
        temp.path(),
        &["align", "--input", "input.json", "--chunk-size", "4", "--json"],
    );
    assert!(ok, "{body}");
    assert_eq!(body["mode"], "chunked");
    assert_eq!(body["chunk_size"], 4);
    assert_eq!(body["overlap_size"], 2);
    assert_eq!(body["stats"]["rows"], 9);
    assert_eq!(body["stats"]["matches"], 9);
}

#[test]
fn align_reads_pairs_text_and_prints_a_table() {
    let temp = workspace(&[("pairs.txt", "north , north\n      , south\neast  ,\n")]);
    semalign(temp.path())
        .args(["align", "--input", "pairs.txt", "--format", "pairs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. north | north"));
}

#[test]
fn stitch_upgrades_gap_rows_across_the_overlap() {
    let request = json!({
        "overlap_size": 2,
        "chunks": [
            [["dog", null], [null, "cat"], ["pizza", null], [null, "mouse"]],
            [[null, "mouse"], ["pizza", "pizza pie"], ["house", null]]
        ]
    });
    let temp = workspace(&[("chunks.json", &request.to_string())]);

    let (ok, body) = run_json(temp.path(), &["stitch", "--input", "chunks.json", "--json"]);
    assert!(ok, "{body}");
    assert_eq!(body["mode"], "stitch");
    assert_eq!(
        body["rows"],
        json!([
            ["dog", null],
            [null, "cat"],
            [null, "mouse"],
            ["pizza", "pizza pie"],
            ["house", null]
        ])
    );
}

#[test]
fn stitch_without_overlap_is_invalid_input() {
    let temp = workspace(&[("chunks.json", r#"{"chunks": [[["a", "b"]]]}"#)]);
    let (ok, body) = run_json(temp.path(), &["stitch", "--input", "chunks.json", "--json"]);
    assert!(!ok);
    assert_eq!(body["code"], "invalid_input");
}

#[test]
fn invalid_sizing_is_reported_as_an_error_envelope() {
    let temp = workspace(&[("input.json", r#"{"left": ["a"], "right": ["b"]}"#)]);
    let (ok, body) = run_json(
        temp.path(),
        &[
            "align",
            "--input",
            "input.json",
            "--chunk-size",
            "4",
            "--overlap-size",
            "4",
            "--json",
        ],
    );
    assert!(!ok);
    assert_eq!(body["code"], "invalid_input");
    assert!(body["message"].as_str().unwrap().contains("overlap"), "{body}");
}

#[test]
fn unknown_profile_keys_are_rejected() {
    let temp = workspace(&[
        ("input.json", r#"{"left": ["a"], "right": ["a"]}"#),
        ("profile.toml", "chunk_size = 4\nwindow = 2\n"),
    ]);
    let (ok, body) = run_json(
        temp.path(),
        &["align", "--input", "input.json", "--config", "profile.toml", "--json"],
    );
    assert!(!ok);
    assert_eq!(body["code"], "invalid_input");
    assert!(body["message"].as_str().unwrap().contains("window"), "{body}");
}

#[test]
fn profile_values_apply_when_flags_are_absent() {
    let temp = workspace(&[
        ("input.json", r#"{"left": ["a", "b"], "right": ["a", "b"]}"#),
        ("profile.json", r#"{"gap_penalty": 0.25}"#),
    ]);
    let (ok, body) = run_json(
        temp.path(),
        &["align", "--input", "input.json", "--config", "profile.json", "--json"],
    );
    assert!(ok, "{body}");
    assert_eq!(body["gap_penalty"], 0.25);
}

#[test]
fn embed_prints_stub_vectors() {
    let temp = tempdir().unwrap();
    let (ok, body) = run_json(temp.path(), &["embed", "river", "bank", "--json"]);
    assert!(ok, "{body}");
    assert_eq!(body["model"], "stub");
    assert_eq!(body["embeddings"][0]["token"], "river");
    let dimension = body["dimension"].as_u64().unwrap();
    assert!(dimension > 0);
    assert_eq!(
        body["embeddings"][1]["vector"].as_array().unwrap().len() as u64,
        dimension
    );
}

#[test]
fn missing_input_file_fails_without_json() {
    let temp = tempdir().unwrap();
    semalign(temp.path())
        .args(["align", "--input", "absent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.json"));
}
