use log_filter::config::{ConfigError, EngineConfig, default_config, load_config, load_config_from_path};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

#[test]
fn test_default_config_is_case_insensitive() {
    let config = default_config();
    assert!(!config.matching.case_sensitive);
    assert!(config.store.directory.is_none());
    assert_eq!(load_config(None).unwrap(), EngineConfig::default());
}

#[test]
fn test_load_config_from_toml() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("log-filter.toml");
    fs::write(
        &path,
        r#"
[matching]
case_sensitive = true

[store]
directory = "/var/lib/log-filter/filters"
"#,
    )
    .unwrap();

    let config = load_config_from_path(&path).expect("config should parse");
    assert!(config.matching.case_sensitive);
    assert_eq!(
        config.store_directory(),
        Some(PathBuf::from("/var/lib/log-filter/filters"))
    );
}

#[test]
fn test_partial_config_keeps_defaults() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("partial.toml");
    fs::write(&path, "[store]\ndirectory = \"filters\"\n").unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert!(!config.matching.case_sensitive);
    assert_eq!(config.store.directory, Some(PathBuf::from("filters")));
}

#[test]
fn test_missing_config_file_reports_path() {
    let err = load_config_from_path(Path::new("/nonexistent/log-filter.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("/nonexistent/log-filter.toml"));
}

#[test]
fn test_malformed_config_is_a_parse_error() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[matching]\ncase_sensitive = \"sometimes\"\n").unwrap();

    assert!(matches!(
        load_config_from_path(&path),
        Err(ConfigError::Parse { .. })
    ));
}
