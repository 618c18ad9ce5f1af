//! Rendering commands driven through a converter process
//!
//! A small shell script stands in for the converter executable.

#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PATIENT_JSON: &str = r#"{"resourceType":"Patient","id":"123"}"#;

const CONVERTER_SCRIPT: &str = r#"
if [ "$1" = "--version" ]; then echo "hff-test 1.0"; exit 0; fi
cat > /dev/null
printf 'resourceType: Patient\nsubject: Reference(Patient/123)\nurl: http://hl7.org/fhir\n'
"#;

const FAILING_SCRIPT: &str = r#"
if [ "$1" = "--version" ]; then exit 0; fi
cat > /dev/null
echo "parse error" >&2
exit 2
"#;

const MAPPING_SCRIPT: &str = r#"
if [ "$1" = "--version" ]; then exit 0; fi
cat > /dev/null
if [ "$1" = "--mapping" ]; then printf 'mapping: '; cat "$2"; else echo 'mapping: default'; fi
"#;

#[allow(deprecated)]
fn cli() -> Command {
    Command::cargo_bin("huff").unwrap()
}

/// Workspace with a config pointing the engine at `script`
fn create_workspace(script: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let script_path = temp_dir.path().join("converter.sh");
    fs::write(&script_path, script).unwrap();

    let config = serde_json::json!({
        "engine": { "command": "sh", "args": [script_path] },
        "readiness": { "pollIntervalMs": 1, "maxAttempts": 50 },
    });
    fs::write(
        temp_dir.path().join(".huffrc.json"),
        serde_json::to_string_pretty(&config).unwrap(),
    )
    .unwrap();
    fs::write(temp_dir.path().join("patient.json"), PATIENT_JSON).unwrap();

    temp_dir
}

fn huff_in(dir: &Path) -> Command {
    let mut cmd = cli();
    cmd.current_dir(dir).arg("--no-color");
    cmd
}

#[test]
fn test_render_with_all_postprocessing() {
    let temp_dir = create_workspace(CONVERTER_SCRIPT);

    huff_in(temp_dir.path())
        .args([
            "render",
            "patient.json",
            "--page-url",
            "https://host/fhir/Patient/123",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            r#"<pre><code class="language-yaml"><span class="hl-source hl-yaml">"#,
        ))
        .stdout(predicate::str::contains(">resourceType<"))
        .stdout(predicate::str::contains(
            r#"<a href="https://host/fhir/Patient/123">Patient/123</a>"#,
        ))
        .stdout(predicate::str::contains(
            r#"<a href="http://hl7.org/fhir">http://hl7.org/fhir</a>"#,
        ));
}

#[test]
fn test_render_without_postprocessing() {
    let temp_dir = create_workspace(CONVERTER_SCRIPT);

    huff_in(temp_dir.path())
        .args([
            "render",
            "patient.json",
            "--no-highlight",
            "--no-links",
            "--no-references",
        ])
        .assert()
        .success()
        .stdout(predicate::str::diff(concat!(
            "<pre><code class=\"language-yaml\">resourceType: Patient\n",
            "subject: Reference(Patient/123)\n",
            "url: http://hl7.org/fhir\n",
            "</code></pre>\n"
        )));
}

#[test]
fn test_render_conversion_failure_keeps_raw_json() {
    let temp_dir = create_workspace(FAILING_SCRIPT);

    huff_in(temp_dir.path())
        .args(["render", "patient.json"])
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("<pre>{PATIENT_JSON}</pre>\n")));
}

#[test]
fn test_page_command_runs_full_pipeline() {
    let temp_dir = create_workspace(CONVERTER_SCRIPT);
    fs::write(
        temp_dir.path().join("saved.html"),
        format!(
            "<html><head></head><body><pre>{PATIENT_JSON}</pre><div class=\"viewer\">raw</div></body></html>"
        ),
    )
    .unwrap();

    huff_in(temp_dir.path())
        .args([
            "page",
            "saved.html",
            "--page-url",
            "https://host/fhir/Patient/123",
            "--content-type",
            "application/fhir+json",
            "-o",
            "out.html",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("done 1 rendered, 0 failed"));

    let html = fs::read_to_string(temp_dir.path().join("out.html")).unwrap();
    assert!(html.contains(r#"<code class="language-yaml">"#));
    assert!(html.contains(r#"id="extPrefs""#));
    assert!(html.contains(r#"<script type="module" src="huff-render"></script>"#));
    assert!(html.contains("<style>"));
    assert!(!html.contains("class=\"viewer\""));
}

#[test]
fn test_page_command_skips_non_fhir() {
    let temp_dir = create_workspace(CONVERTER_SCRIPT);
    let original = format!("<html><head></head><body><pre>{PATIENT_JSON}</pre></body></html>");
    fs::write(temp_dir.path().join("saved.html"), &original).unwrap();

    huff_in(temp_dir.path())
        .args([
            "page",
            "saved.html",
            "--page-url",
            "https://host/api/thing",
            "--content-type",
            "application/json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{original}\n")))
        .stderr(predicate::str::contains("skipped"));
}

#[test]
fn test_render_uses_stored_custom_mappings() {
    let temp_dir = create_workspace(MAPPING_SCRIPT);

    huff_in(temp_dir.path())
        .args(["render", "patient.json", "--no-highlight", "--no-links", "--no-references"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mapping: default"));

    huff_in(temp_dir.path())
        .args(["prefs", "set", "customMappings", "Coding: code | display"])
        .assert()
        .success();

    huff_in(temp_dir.path())
        .args(["render", "patient.json", "--no-highlight", "--no-links", "--no-references"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mapping: Coding: code | display"));
}
