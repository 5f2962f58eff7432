//! Failures that happen before any loop starts

use super::run_binary;
use std::io::Write;
use tempfile::NamedTempFile;

const STREAM: &str = "ocid1.stream.oc1.phx.aaaa";
const ENDPOINT: &str = "http://127.0.0.1:9";

fn empty_settings() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# no settings").unwrap();
    file
}

#[test]
fn test_missing_credential_file_exits_with_error() {
    let settings = empty_settings();
    let settings_path = settings.path().to_string_lossy().to_string();

    let output = run_binary(&[
        "consumer",
        STREAM,
        ENDPOINT,
        "--config-file",
        &settings_path,
        "--oci-config",
        "/nonexistent/streamtick/oci-config",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unable to read OCI config file"), "stderr: {}", stderr);
}

#[test]
fn test_unknown_profile_exits_with_error() {
    let settings = empty_settings();
    let settings_path = settings.path().to_string_lossy().to_string();
    let mut oci = NamedTempFile::new().unwrap();
    writeln!(
        oci,
        "[DEFAULT]\nuser=u\nfingerprint=f\nkey_file=/k.pem\ntenancy=t"
    )
    .unwrap();
    let oci_path = oci.path().to_string_lossy().to_string();

    let output = run_binary(&[
        "producer",
        STREAM,
        ENDPOINT,
        "--config-file",
        &settings_path,
        "--oci-config",
        &oci_path,
        "--profile",
        "NOPE",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Profile 'NOPE' not found"), "stderr: {}", stderr);
}

#[test]
fn test_missing_settings_file_exits_with_error() {
    let output = run_binary(&[
        "producer",
        STREAM,
        ENDPOINT,
        "--config-file",
        "/nonexistent/streamtick.toml",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn test_out_of_range_limit_exits_with_error() {
    let settings = empty_settings();
    let settings_path = settings.path().to_string_lossy().to_string();

    let output = run_binary(&[
        "consumer",
        STREAM,
        ENDPOINT,
        "--config-file",
        &settings_path,
        "--limit",
        "0",
    ]);

    assert_eq!(output.status.code(), Some(1));
}
