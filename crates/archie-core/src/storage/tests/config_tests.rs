#![cfg(test)]

use std::path::Path;

use tempfile::tempdir;

use crate::plugin_system::declaration::ServiceDeclaration;
use crate::plugin_system::manifest::Provides;
use crate::storage::config::{ManifestFormat, parse_manifest, read_manifest};
use crate::storage::error::StorageSystemError;

const JSON_MANIFEST: &str = r#"{
    "packagePath": "db",
    "consumes": "logger",
    "provides": {
        "zeta": "zeta.js",
        "models": { "user": "models/user.js", "group": "models/group.js" }
    },
    "instantiateBeforeInjection": false,
    "server": { "uri": "db://localhost" }
}"#;

fn tree(provides: Option<Provides>) -> ServiceDeclaration {
    match provides {
        Some(Provides::Tree(declaration)) => declaration,
        other => panic!("expected a provides mapping, got {:?}", other),
    }
}

#[test]
fn test_format_from_path() {
    assert_eq!(ManifestFormat::detect(Path::new("module.json")), Some(ManifestFormat::Json));
    assert_eq!(ManifestFormat::detect(Path::new("MODULE.JSON")), Some(ManifestFormat::Json));
    assert_eq!(ManifestFormat::detect(Path::new("module.ini")), None);
    assert_eq!(ManifestFormat::detect(Path::new("module")), None);
    assert_eq!(ManifestFormat::Json.label(), "json");
}

#[test]
fn test_parse_json_manifest() -> Result<(), StorageSystemError> {
    let manifest = parse_manifest(JSON_MANIFEST, ManifestFormat::Json)?;

    assert_eq!(manifest.package_path.as_deref(), Some("db"));
    assert_eq!(manifest.consumes.map(|c| c.into_vec()), Some(vec!["logger".to_string()]));
    assert_eq!(manifest.instantiate_before_injection, Some(false));
    assert!(manifest.settings.contains_key("server"));
    assert!(!manifest.settings.contains_key("provides"));

    // Authored key order survives parsing
    let declaration = tree(manifest.provides);
    let keys: Vec<&str> = declaration.entries().iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["zeta", "models"]);
    let models = declaration.get("models").expect("models namespace");
    let keys: Vec<&str> = models.entries().iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["user", "group"]);
    Ok(())
}

#[test]
fn test_parse_provides_list() -> Result<(), StorageSystemError> {
    let manifest = parse_manifest(
        r#"{ "packagePath": "auth", "provides": ["login", "logout"], "setup": "setup.js" }"#,
        ManifestFormat::Json,
    )?;
    match manifest.provides {
        Some(Provides::Names(names)) => assert_eq!(names.into_vec(), vec!["login", "logout"]),
        other => panic!("expected a list of names, got {:?}", other),
    }
    assert_eq!(manifest.setup.as_deref(), Some("setup.js"));
    Ok(())
}

#[test]
fn test_parse_rejects_duplicate_keys() {
    let result = parse_manifest(
        r#"{ "packagePath": "db", "provides": { "a": "a.js", "a": "b.js" } }"#,
        ManifestFormat::Json,
    );
    assert!(matches!(result, Err(StorageSystemError::Parse { .. })));
}

#[test]
fn test_parse_invalid_json() {
    let err = parse_manifest("{ not json", ManifestFormat::Json).unwrap_err();
    match err {
        StorageSystemError::Parse { format, .. } => assert_eq!(format, "json"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[cfg(feature = "yaml-config")]
#[test]
fn test_parse_yaml_manifest() -> Result<(), StorageSystemError> {
    let yaml = "
packagePath: db
provides:
  zeta: zeta.js
  models:
    user: models/user.js
server:
  uri: db://localhost
";
    let manifest = parse_manifest(yaml, ManifestFormat::Yaml)?;
    let declaration = tree(manifest.provides);
    let keys: Vec<&str> = declaration.entries().iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["zeta", "models"]);
    assert!(manifest.settings.contains_key("server"));
    Ok(())
}

#[cfg(feature = "toml-config")]
#[test]
fn test_parse_toml_manifest() -> Result<(), StorageSystemError> {
    let toml = r#"
packagePath = "db"
instantiateBeforeInjection = true

[provides]
zeta = "zeta.js"

[provides.models]
user = "models/user.js"
"#;
    let manifest = parse_manifest(toml, ManifestFormat::Toml)?;
    assert_eq!(manifest.instantiate_before_injection, Some(true));
    let declaration = tree(manifest.provides);
    assert_eq!(declaration.descendant_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_read_manifest_from_disk() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("db.json");
    tokio::fs::write(&path, JSON_MANIFEST).await?;

    let manifest = read_manifest(&path).await?;
    assert_eq!(manifest.package_path.as_deref(), Some("db"));
    Ok(())
}

#[tokio::test]
async fn test_read_manifest_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.json");

    let err = read_manifest(&path).await.unwrap_err();
    assert!(matches!(err, StorageSystemError::NotFound(p) if p == path));
}

#[tokio::test]
async fn test_read_manifest_unsupported_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db.ini");
    tokio::fs::write(&path, "packagePath=db").await.unwrap();

    let err = read_manifest(&path).await.unwrap_err();
    assert!(matches!(err, StorageSystemError::UnsupportedFormat(_)));
}
