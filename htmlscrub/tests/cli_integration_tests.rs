// htmlscrub/tests/cli_integration_tests.rs
//! Command-line integration tests for the `htmlscrub` binary.
//!
//! Each test runs the real executable with `assert_cmd`, feeds a JSON body on
//! stdin or through a temporary file, and checks stdout, stderr and the exit
//! status. `HTMLSCRUB_CONFIG` is cleared so a developer's environment cannot
//! leak into the runs.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
settings:
  default:
    HTML.Allowed: "p,b,a[href]"
  plain:
    HTML.Allowed: ""
  custom_attributes:
    - [a, target, "Enum#_blank,_self"]
"#;

fn htmlscrub() -> Command {
    let mut cmd = Command::cargo_bin("htmlscrub").unwrap();
    cmd.env_remove("HTMLSCRUB_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn config_file() -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(CONFIG.as_bytes())?;
    Ok(file)
}

#[test]
fn test_sanitize_from_stdin() -> Result<()> {
    let config = config_file()?;
    let body = r#"{"title":"<b>Hi</b><script>x()</script>","link":"<a href=\"/x\" target=\"evil\">l</a>","n":7,"gone":"<script></script>"}"#;

    htmlscrub()
        .args(["-q", "sanitize", "--config"])
        .arg(config.path())
        .write_stdin(body)
        .assert()
        .success()
        .stdout(r#"{"title":"<b>Hi</b>","link":"<a href=\"/x\">l</a>","n":7,"gone":null}"#.to_owned() + "\n");
    Ok(())
}

#[test]
fn test_sanitize_file_to_file() -> Result<()> {
    let config = config_file()?;
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("body.json");
    let output = dir.path().join("clean.json");
    fs::write(&input, r#"{"comment":{"text":"<p onclick=\"x\">ok</p>","tags":["<i>t</i>"]}}"#)?;

    htmlscrub()
        .arg("sanitize")
        .arg("--config")
        .arg(config.path())
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Sanitized body written to"));

    let written = fs::read_to_string(&output)?;
    assert_eq!(written, "{\"comment\":{\"text\":\"<p>ok</p>\",\"tags\":[\"t\"]}}\n");
    Ok(())
}

#[test]
fn test_get_body_is_echoed() -> Result<()> {
    let config = config_file()?;
    let body = r#"{"q":"<script>x</script>"}"#;
    htmlscrub()
        .args(["sanitize", "--method", "GET", "--config"])
        .arg(config.path())
        .write_stdin(body)
        .assert()
        .success()
        .stdout(body)
        .stderr(predicate::str::contains("not sanitized"));
    Ok(())
}

#[test]
fn test_get_body_keeps_formatting_and_skips_parsing() -> Result<()> {
    let config = config_file()?;
    let body = "{\"a\": 1.50,\n \"b\": \"<script>x</script>\"}\n";
    htmlscrub()
        .args(["-q", "sanitize", "--pretty", "--method", "GET", "--config"])
        .arg(config.path())
        .write_stdin(body)
        .assert()
        .success()
        .stdout(body);

    htmlscrub()
        .args(["-q", "sanitize", "--method", "DELETE", "--config"])
        .arg(config.path())
        .write_stdin("name=<b>x</b>")
        .assert()
        .success()
        .stdout("name=<b>x</b>");
    Ok(())
}

#[test]
fn test_deeply_nested_post_body() -> Result<()> {
    let config = config_file()?;
    let nested = |levels: usize, leaf: &str| format!("{}{}{}", "[".repeat(levels), leaf, "]".repeat(levels));

    htmlscrub()
        .args(["-q", "sanitize", "--config"])
        .arg(config.path())
        .write_stdin(nested(200, "\"<i>x</i>\""))
        .assert()
        .success()
        .stdout(nested(200, "\"x\"") + "\n");

    htmlscrub()
        .args(["sanitize", "--config"])
        .arg(config.path())
        .write_stdin(nested(300, "1"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("nesting"));
    Ok(())
}

#[test]
fn test_profile_flag_and_env_config() -> Result<()> {
    let config = config_file()?;
    htmlscrub()
        .env("HTMLSCRUB_CONFIG", config.path())
        .args(["-q", "sanitize", "--profile", "plain"])
        .write_stdin(r#"{"t":"<b>bold</b>"}"#)
        .assert()
        .success()
        .stdout("{\"t\":\"bold\"}\n");
    Ok(())
}

#[test]
fn test_pretty_output() -> Result<()> {
    let config = config_file()?;
    htmlscrub()
        .args(["-q", "sanitize", "--pretty", "--config"])
        .arg(config.path())
        .write_stdin(r#"{"a":"x"}"#)
        .assert()
        .success()
        .stdout("{\n  \"a\": \"x\"\n}\n");
    Ok(())
}

#[test]
fn test_invalid_json_fails() -> Result<()> {
    let config = config_file()?;
    htmlscrub()
        .args(["sanitize", "--config"])
        .arg(config.path())
        .write_stdin("{not json")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not valid JSON"));
    Ok(())
}

#[test]
fn test_missing_config_fails() {
    htmlscrub()
        .args(["profiles", "--config", "/definitely/not/here.yaml"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_profiles_lists_names() -> Result<()> {
    let config = config_file()?;
    htmlscrub()
        .args(["profiles", "--config"])
        .arg(config.path())
        .assert()
        .success()
        .stdout("default (default)\nplain\n");
    Ok(())
}

#[test]
fn test_show_config_reports_grammar() -> Result<()> {
    let config = config_file()?;
    let output = htmlscrub()
        .args(["show-config", "--profile", "plain", "--config"])
        .arg(config.path())
        .output()?;
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["profile"], "plain");
    assert_eq!(report["directives"]["HTML.Allowed"], "");
    assert_eq!(report["definition"]["attributes"]["a"], serde_json::json!(["target"]));
    Ok(())
}

#[test]
fn test_no_arguments_prints_help() {
    htmlscrub()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
