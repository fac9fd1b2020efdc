use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const LENS_DOCUMENT: &str = r#"
{
  "tags": [{"id": "BC", "description": "Needed for backwards compatibility"}],
  "sections": [{"name": "lens", "description": "Lens control and state"}],
  "properties": [
    {"record": "entry", "name": "android.lens.facing", "kind": "static", "type": "byte",
     "enum": true, "enum_values": ["FRONT", "BACK"], "tag_ids": ["BC"]},
    {"record": "entry", "name": "android.lens.info.shading", "kind": "static", "type": "int32",
     "container": "array", "container_sizes": ["3", "3"]},
    {"record": "clone", "name": "android.lens.facing", "kind": "dynamic", "target_kind": "static"},
    {"record": "clone", "name": "android.lens.missing", "kind": "dynamic", "target_kind": "static"}
  ]
}
"#;

fn setup_document() -> (TempDir, PathBuf) {
    let temp = tempdir().unwrap();
    let path = temp.path().join("metadata.json");
    fs::write(&path, LENS_DOCUMENT).unwrap();
    (temp, path)
}

#[allow(deprecated)]
fn cli() -> Command {
    let mut cmd = Command::cargo_bin("camera-metadata").expect("binary");
    cmd.arg("--quiet");
    cmd
}

fn run_json(args: &[&str], file: &Path) -> Value {
    let output = cli().args(args).arg(file).output().expect("command run");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn tree_shows_kinds_namespaces_and_clones() {
    let (_temp, file) = setup_document();
    cli()
        .arg("tree")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("android\n  lens\n    static\n"))
        .stdout(predicate::str::contains(
            "      android.lens.facing (byte, enum)\n      info\n        android.lens.info.shading (int32[3, 3])\n",
        ))
        .stdout(predicate::str::contains("      android.lens.facing -> static\n"))
        .stdout(predicate::str::contains("android.lens.missing -> static (unresolved)"));
}

#[test]
fn tree_prune_drops_unresolved_clones() {
    let (_temp, file) = setup_document();
    cli()
        .args(["tree", "--prune"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("android.lens.facing -> static"))
        .stdout(predicate::str::contains("missing").not());
}

#[test]
fn stats_render_markdown_counts() {
    let (_temp, file) = setup_document();
    cli()
        .arg("stats")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("| `sections` | `1` |"))
        .stdout(predicate::str::contains("| `entries` | `2` |"))
        .stdout(predicate::str::contains("| `clones` | `2` |"))
        .stdout(predicate::str::contains("| `unresolved_clones` | `1` |"));
}

#[test]
fn dump_emits_nested_json() {
    let (_temp, file) = setup_document();
    let body = run_json(&["dump", "--pretty"], &file);

    assert_eq!(body["node"], "metadata");
    assert_eq!(body["tags"][0]["entries"][0], "android.lens.facing");
    let section = &body["outer_namespaces"][0]["sections"][0];
    assert_eq!(section["name"], "lens");
    assert_eq!(section["description"], "Lens control and state");
    assert_eq!(section["kinds"][1]["entries"][1]["unresolved"], true);
}

#[test]
fn enum_values_resolve_through_clones() {
    let (_temp, file) = setup_document();
    let expected = "LENS_FACING_FRONT = 0\nLENS_FACING_BACK = 1\n";
    cli()
        .arg("enum-values")
        .arg(&file)
        .arg("android.lens.facing")
        .assert()
        .success()
        .stdout(expected);
    cli()
        .arg("enum-values")
        .arg(&file)
        .args(["android.lens.facing", "--kind", "dynamic"])
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn enum_values_reports_unknown_property() {
    let (_temp, file) = setup_document();
    cli()
        .arg("enum-values")
        .arg(&file)
        .arg("android.lens.aperture")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No property named 'android.lens.aperture'"));
}

#[test]
fn invalid_config_is_rejected() {
    let (temp, file) = setup_document();
    let config = temp.path().join("build.toml");
    fs::write(&config, "strict_types = true\nallow_duplicate_entries = true\n").unwrap();

    cli()
        .arg("--config")
        .arg(&config)
        .arg("stats")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}
