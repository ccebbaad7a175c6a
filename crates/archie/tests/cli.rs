use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const DB_MANIFEST: &str = r#"{
    "packagePath": "db",
    "consumes": "logger",
    "provides": {
        "b": { "c": "c.js" },
        "a": "a.js"
    }
}"#;

#[test]
fn test_normalize_prints_flat_names() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let manifest = dir.path().join("db.json");
    fs::write(&manifest, DB_MANIFEST)?;

    let mut cmd = Command::cargo_bin("archie")?;
    cmd.arg("normalize").arg(&manifest).arg("--base").arg("/app");

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output)?;

    assert_eq!(json["provides"], serde_json::json!(["b.c", "b", "a"]));
    assert_eq!(json["consumes"], serde_json::json!(["logger"]));
    assert_eq!(json["providesIsJson"], serde_json::json!(true));
    assert_eq!(json["enhancers"]["a"], serde_json::json!("/app/db/a.js"));
    assert_eq!(json["enhancers"]["b.c"], serde_json::json!("/app/db/c.js"));
    Ok(())
}

#[test]
fn test_normalize_bare_manifest_name_resolves_absolute() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("db.json"), DB_MANIFEST)?;

    let mut cmd = Command::cargo_bin("archie")?;
    cmd.current_dir(dir.path()).arg("normalize").arg("db.json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output)?;

    let location = json["enhancers"]["a"].as_str().unwrap_or_default();
    assert!(std::path::Path::new(location).is_absolute(), "{} is not absolute", location);
    assert!(location.ends_with("db/a.js"), "{}", location);
    Ok(())
}

#[test]
fn test_check_counts_services() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let manifest = dir.path().join("db.json");
    fs::write(&manifest, DB_MANIFEST)?;

    let mut cmd = Command::cargo_bin("archie")?;
    cmd.arg("check").arg(&manifest);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ok: 3 services"));
    Ok(())
}

#[test]
fn test_check_yaml_manifest() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let manifest = dir.path().join("auth.yaml");
    fs::write(&manifest, "packagePath: auth\nprovides:\n  login: login.js\n")?;

    let mut cmd = Command::cargo_bin("archie")?;
    cmd.arg("check").arg(&manifest);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ok: 1 services"));
    Ok(())
}

#[test]
fn test_mixed_declaration_styles_fail() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let manifest = dir.path().join("bad.json");
    fs::write(
        &manifest,
        r#"{ "packagePath": "bad", "setup": "setup.js", "provides": { "a": "a.js" } }"#,
    )?;

    let mut cmd = Command::cargo_bin("archie")?;
    cmd.arg("check").arg(&manifest);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("setup entry point"))
        .stdout(predicate::str::contains("ok:").not());
    Ok(())
}

#[test]
fn test_missing_manifest_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    let mut cmd = Command::cargo_bin("archie")?;
    cmd.arg("normalize").arg(dir.path().join("nowhere.json"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("manifest not found"));
    Ok(())
}
