// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn empty_config_uses_defaults() {
    let config = Config::from_toml("").unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.log_filter(), "info");
    assert!(config.notify.include_link);
}

#[test]
fn full_config_parses() {
    let config = Config::from_toml(
        r#"
state_dir = "/var/lib/watchpost"
log_filter = "wp_engine=debug"

[notify]
include_link = false
"#,
    )
    .unwrap();

    assert_eq!(config.state_dir, Some(PathBuf::from("/var/lib/watchpost")));
    assert_eq!(config.log_filter(), "wp_engine=debug");
    assert!(!config.notify.include_link);
}

#[test]
fn unknown_keys_are_rejected() {
    let result = Config::from_toml("stat_dir = \"/tmp\"");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn load_reports_missing_file() {
    let result = Config::load(Path::new("/nonexistent/watchpost.toml"));
    assert!(matches!(result, Err(ConfigError::Read(..))));
}

#[test]
fn load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("watchpost.toml");
    std::fs::write(&path, "log_filter = \"debug\"\n").unwrap();

    assert_eq!(Config::load(&path).unwrap().log_filter(), "debug");
}

#[test]
fn paths_derive_from_state_dir() {
    let paths = Config::for_state_dir("/srv/wp").paths().unwrap();

    assert_eq!(paths.state_dir, PathBuf::from("/srv/wp"));
    assert_eq!(paths.wal_path, PathBuf::from("/srv/wp/wal/watches.wal"));
    assert_eq!(paths.lock_path, PathBuf::from("/srv/wp/watchpost.pid"));
    assert_eq!(paths.log_path, PathBuf::from("/srv/wp/watchpost.log"));
}

#[test]
fn default_state_dir_prefers_xdg() {
    let dir = default_state_dir(
        Some(PathBuf::from("/xdg")),
        Some(PathBuf::from("/home/me")),
    )
    .unwrap();
    assert_eq!(dir, PathBuf::from("/xdg/watchpost"));

    let dir = default_state_dir(Some(PathBuf::new()), Some(PathBuf::from("/home/me"))).unwrap();
    assert_eq!(dir, PathBuf::from("/home/me/.local/state/watchpost"));

    assert!(matches!(
        default_state_dir(None, None),
        Err(ConfigError::NoStateDir)
    ));
}
