//! Usage text and exit codes for incomplete invocations

use super::run_binary;

fn assert_usage(args: &[&str]) {
    let output = run_binary(args);
    assert_eq!(output.status.code(), Some(0), "args: {:?}", args);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("USAGE: streamtick producer|consumer STREAM_ID OSS_ENDPOINT"),
        "unexpected stdout: {}",
        stdout
    );
}

#[test]
fn test_no_arguments_prints_usage() {
    assert_usage(&[]);
}

#[test]
fn test_missing_endpoint_prints_usage() {
    assert_usage(&["producer", "ocid1.stream.oc1..aaaa"]);
}

#[test]
fn test_unknown_mode_prints_usage() {
    assert_usage(&[
        "replay",
        "ocid1.stream.oc1..aaaa",
        "https://cell-1.streaming.us-phoenix-1.oci.oraclecloud.com",
    ]);
}

#[test]
fn test_version_flag() {
    let output = run_binary(&["--version"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    assert!(stdout.contains("built"));
}

#[test]
fn test_help_lists_options() {
    let output = run_binary(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    for option in ["--oci-config", "--group", "--interval-ms", "--max-attempts"] {
        assert!(stdout.contains(option), "missing {} in help", option);
    }
}

#[test]
fn test_unknown_mode_with_extra_argument_prints_usage() {
    assert_usage(&["replay", "s", "https://e", "extra"]);
}

#[test]
fn test_unknown_flag_prints_usage() {
    assert_usage(&["-x"]);
    assert_usage(&["--no-such-option", "consumer", "s", "https://e"]);
}
