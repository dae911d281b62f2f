/// Integration tests driving the built testplan-export binary
///
/// None of these tests need network access: the only remote endpoint used
/// is a closed local port.
use std::process::{Command, Output};
use tempfile::TempDir;

// Helper to run the binary with the given arguments
fn run_export(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_testplan-export"))
        .args(args)
        .env_remove("AZURE_DEVOPS_PAT")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run testplan-export {}: {}", args.join(" "), e))
}

#[test]
fn test_help_lists_options() {
    let output = run_export(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--organization", "--project", "--pat", "--test-plan-id", "--output", "--debug", "--concurrency"] {
        assert!(stdout.contains(flag), "help should mention {}", flag);
    }
}

#[test]
fn test_missing_required_arguments_fail() {
    let output = run_export(&["--organization", "contoso"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--project"));
}

#[test]
fn test_invalid_concurrency_exits_with_config_error() {
    let output = run_export(&[
        "--organization",
        "contoso",
        "--project",
        "shop",
        "--pat",
        "secret",
        "--test-plan-id",
        "7",
        "--concurrency",
        "0",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--concurrency must be at least 1"));
}

#[test]
fn test_unreachable_service_exits_with_no_data() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("export.csv");
    let csv_arg = csv_path.to_string_lossy().to_string();

    let output = run_export(&[
        "--organization",
        "contoso",
        "--project",
        "shop",
        "--pat",
        "secret",
        "--test-plan-id",
        "7",
        "--server-url",
        "http://127.0.0.1:9",
        "--timeout-secs",
        "5",
        "--output",
        &csv_arg,
    ]);

    assert_eq!(
        output.status.code(),
        Some(2),
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("No data to export"));
    assert!(!csv_path.exists());
}

#[test]
fn test_debug_log_file_is_written() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("debug.log");
    let log_arg = log_path.to_string_lossy().to_string();
    let csv_arg = dir.path().join("export.csv").to_string_lossy().to_string();

    let output = run_export(&[
        "--organization",
        "contoso",
        "--project",
        "shop",
        "--pat",
        "secret",
        "--test-plan-id",
        "7",
        "--server-url",
        "http://127.0.0.1:9",
        "--timeout-secs",
        "5",
        "--output",
        &csv_arg,
        "--log-file",
        &log_arg,
    ]);

    assert_eq!(output.status.code(), Some(2));
    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("Fetching test plan details for ID: 7"));
}
