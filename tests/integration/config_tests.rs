use clap::Parser;
use dupecmp::cli::{Cli, OutputFormat};
use dupecmp::config::{Config, ConfigError};
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_defaults() {
    // figment directly, without Env, so other tests' variables cannot interfere
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.max_buffer, 8192);
    assert_eq!(config.max_open_files, 16);
    assert_eq!(config.output, OutputFormat::Text);
}

#[test]
fn test_config_from_toml_keeps_unset_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
max_buffer = 1048576
follow_symlinks = true
output = "json"
"#,
    )
    .unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .extract()
        .unwrap();

    assert_eq!(config.max_buffer, 1_048_576);
    assert!(config.follow_symlinks);
    assert_eq!(config.output, OutputFormat::Json);
    assert_eq!(config.max_open_files, 16);
    assert_eq!(config.min_size, 1);
}

#[test]
fn test_config_load_explicit_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dupecmp.toml");
    fs::write(&path, "min_size = 4096\nsame_fs = true\n").unwrap();

    let config = Config::load(Some(path.as_path())).unwrap();
    assert_eq!(config.min_size, 4096);
    assert!(config.same_fs);
    assert_eq!(config.walker_config().min_size, 4096);
}

#[test]
fn test_config_load_rejects_broken_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "max_buffer = [1, 2").unwrap();

    let err = Config::load(Some(path.as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
    assert!(err.to_string().contains("broken.toml"));
}

#[test]
fn test_config_load_missing_explicit_file() {
    let dir = tempdir().unwrap();
    let err = Config::load(Some(dir.path().join("nope.toml").as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
fn test_cli_flags_win_over_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "max_open_files = 64\nmax_buffer = 65536\n").unwrap();

    let cli = Cli::try_parse_from([
        "dupecmp",
        "--config",
        path.to_str().unwrap(),
        "--max-of",
        "2",
        "/data",
    ])
    .unwrap();
    let mut config = Config::load(cli.config.as_deref()).unwrap();
    config.apply_cli(&cli);

    assert_eq!(config.max_open_files, 2);
    assert_eq!(config.max_buffer, 65536);
    let compare = config.compare_config();
    assert_eq!(compare.max_open_files, 2);
    assert_eq!(compare.total_buffer, 65536);
}
