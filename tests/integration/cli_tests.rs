use clap::Parser;
use dupecmp::cli::Cli;
use dupecmp::duplicates::FinderError;
use dupecmp::error::ExitCode;
use dupecmp::run_app;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn cli(args: &[&str], dir: &Path) -> Cli {
    let mut argv = vec!["dupecmp", "--quiet", "--no-progress"];
    argv.extend_from_slice(args);
    let dir = dir.to_str().unwrap();
    argv.push(dir);
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn test_exit_code_when_duplicates_found() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"duplicate").unwrap();
    fs::write(dir.path().join("b"), b"duplicate").unwrap();

    let code = run_app(cli(&["--output", "json"], dir.path())).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_exit_code_when_nothing_found() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"one").unwrap();
    fs::write(dir.path().join("b"), b"two").unwrap();

    let code = run_app(cli(&["--output", "csv"], dir.path())).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_text_output_run() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"").unwrap();
    fs::write(dir.path().join("b"), b"").unwrap();

    // empty files only take part with a zero minimum size
    let code = run_app(cli(&[], dir.path())).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
    let code = run_app(cli(&["-m", "0"], dir.path())).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_missing_directory_is_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");

    let err = run_app(cli(&[], &missing)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<FinderError>(),
        Some(FinderError::PathNotFound(_))
    ));
    assert_eq!(ExitCode::from_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_bad_config_file_is_error() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "max_open_files = 0\n").unwrap();

    let err = run_app(cli(&["--config", config.to_str().unwrap()], dir.path())).unwrap_err();
    assert!(format!("{err:#}").contains("max_open_files"));
}
