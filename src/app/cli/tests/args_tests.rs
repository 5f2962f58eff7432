//! Tests for argument parsing and resolution

use crate::app::cli::args::*;
use crate::core::retry::RetryPolicy;
use crate::streaming::cursor::DEFAULT_GROUP_TIMEOUT_MS;
use crate::streaming::error::StreamError;
use std::path::PathBuf;
use std::time::Duration;

static COMMAND_NAME: &str = "streamtick";
const STREAM: &str = "ocid1.stream.oc1.phx.aaaa";
const ENDPOINT: &str = "https://cell-1.streaming.us-phoenix-1.oci.oraclecloud.com";

fn parse(extra: &[&str]) -> Args {
    let mut argv = vec![COMMAND_NAME];
    argv.extend_from_slice(extra);
    Args::try_parse_args(argv).unwrap()
}

fn run_settings(extra: &[&str]) -> RunSettings {
    match parse(extra).resolve().unwrap() {
        Invocation::Run(settings) => *settings,
        Invocation::Usage => panic!("expected a runnable invocation"),
    }
}

fn config_message(extra: &[&str]) -> String {
    match parse(extra).resolve() {
        Err(StreamError::Config { message }) => message,
        other => panic!("expected config error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_no_arguments_shows_usage() {
    let args = parse(&[]);
    assert_eq!(args.run_mode(), None);
    assert!(matches!(args.resolve().unwrap(), Invocation::Usage));
}

#[test]
fn test_missing_endpoint_shows_usage() {
    let args = parse(&["consumer", STREAM]);
    assert_eq!(args.run_mode(), None);
    assert!(matches!(args.resolve().unwrap(), Invocation::Usage));
}

#[test]
fn test_unknown_mode_shows_usage() {
    let args = parse(&["both", STREAM, ENDPOINT]);
    assert_eq!(args.run_mode(), None);
    assert!(matches!(args.resolve().unwrap(), Invocation::Usage));
}

#[test]
fn test_extra_positionals_are_ignored() {
    let settings = run_settings(&["consumer", STREAM, ENDPOINT, "extra", "more"]);
    assert_eq!(settings.mode, Mode::Consumer);
    assert_eq!(settings.endpoint, ENDPOINT);
}

#[test]
fn test_unknown_flag_is_a_parse_error() {
    assert!(Args::try_parse_args([COMMAND_NAME, "-x"]).is_err());
}

#[test]
fn test_mode_names_are_exact() {
    assert_eq!(Mode::parse("producer"), Some(Mode::Producer));
    assert_eq!(Mode::parse("consumer"), Some(Mode::Consumer));
    assert_eq!(Mode::parse("Consumer"), None);
}

#[test]
fn test_usage_names_both_modes() {
    assert!(usage().contains("producer|consumer STREAM_ID OSS_ENDPOINT"));
}

#[test]
fn test_producer_defaults() {
    let settings = run_settings(&["producer", STREAM, ENDPOINT, "--oci-config", "/tmp/oci"]);

    assert_eq!(settings.mode, Mode::Producer);
    assert_eq!(settings.stream_id, STREAM);
    assert_eq!(settings.endpoint, ENDPOINT);
    assert_eq!(settings.oci_config, PathBuf::from("/tmp/oci"));
    assert_eq!(settings.profile, DEFAULT_PROFILE);
    assert_eq!(settings.interval, Duration::from_secs(1));
    assert_eq!(settings.limit, None);
    assert_eq!(settings.retry, RetryPolicy::default());
    assert_eq!(
        settings.cursor_source,
        CursorSource::Partition(DEFAULT_PARTITION.to_string())
    );
}

#[test]
fn test_consumer_partition_and_tuning() {
    let settings = run_settings(&[
        "consumer",
        STREAM,
        ENDPOINT,
        "--partition",
        "2",
        "--interval-ms",
        "250",
        "--limit",
        "50",
        "--max-attempts",
        "1",
        "--retry-delay-ms",
        "10",
        "--profile",
        "ADMIN",
    ]);

    assert_eq!(settings.cursor_source, CursorSource::Partition("2".to_string()));
    assert_eq!(settings.interval, Duration::from_millis(250));
    assert_eq!(settings.limit, Some(50));
    assert_eq!(settings.retry.max_attempts, 1);
    assert_eq!(settings.retry.delay, Duration::from_millis(10));
    assert_eq!(settings.profile, "ADMIN");
}

#[test]
fn test_bare_group_flag_joins_default_group() {
    let settings = run_settings(&["consumer", STREAM, ENDPOINT, "--group"]);

    let CursorSource::Group(membership) = settings.cursor_source else {
        panic!("expected a group cursor");
    };
    assert_eq!(membership.group_name, "tutorial");
    assert_eq!(membership.timeout_ms, DEFAULT_GROUP_TIMEOUT_MS);
    assert_eq!(membership.instance_name.len(), 8);
}

#[test]
fn test_named_group_with_instance_and_timeout() {
    let settings = run_settings(&[
        "consumer",
        STREAM,
        ENDPOINT,
        "--group",
        "orders",
        "--instance-name",
        "reader-1",
        "--group-timeout-ms",
        "5000",
    ]);

    let CursorSource::Group(membership) = settings.cursor_source else {
        panic!("expected a group cursor");
    };
    assert_eq!(membership.group_name, "orders");
    assert_eq!(membership.instance_name, "reader-1");
    assert_eq!(membership.timeout_ms, 5000);
}

#[test]
fn test_out_of_range_values_are_config_errors() {
    assert!(config_message(&["consumer", STREAM, ENDPOINT, "--limit", "0"]).contains("--limit"));
    assert!(
        config_message(&["consumer", STREAM, ENDPOINT, "--limit", "10001"]).contains("10001")
    );
    assert!(
        config_message(&["producer", STREAM, ENDPOINT, "--interval-ms", "0"])
            .contains("--interval-ms")
    );
    assert!(
        config_message(&["producer", STREAM, ENDPOINT, "--max-attempts", "0"])
            .contains("--max-attempts")
    );
    assert!(config_message(&["consumer", STREAM, ENDPOINT, "--group", " "]).contains("--group"));
    assert!(config_message(&[
        "consumer",
        STREAM,
        ENDPOINT,
        "--group",
        "orders",
        "--instance-name",
        " "
    ])
    .contains("--instance-name"));
}

#[test]
fn test_limit_boundaries_are_accepted() {
    for limit in ["1", "10000"] {
        let settings = run_settings(&["consumer", STREAM, ENDPOINT, "--limit", limit]);
        assert!(settings.limit.is_some());
    }
}

#[test]
fn test_color_flags_conflict() {
    let result = Args::try_parse_args([COMMAND_NAME, "--color", "--no-color"]);
    assert!(result.is_err());
}

#[test]
fn test_use_color() {
    assert!(parse(&["--color"]).use_color(false));
    assert!(!parse(&["--no-color"]).use_color(true));
    assert!(parse(&[]).use_color(true));
    assert!(!parse(&[]).use_color(false));
}

#[test]
fn test_verbosity_counts() {
    assert_eq!(parse(&["-vv", "-q"]).verbosity(), 1);
    assert_eq!(parse(&["-qqq"]).verbosity(), -3);
    assert_eq!(parse(&[]).verbosity(), 0);
}

#[test]
fn test_log_file_magic_values() {
    assert_eq!(parse(&["--log-file", "none"]).effective_log_file(), None);
    assert_eq!(parse(&["--log-file", "-"]).effective_log_file(), None);
    assert_eq!(
        parse(&["--log-file", "/tmp/streamtick.log"]).effective_log_file(),
        Some(PathBuf::from("/tmp/streamtick.log"))
    );
}

#[test]
fn test_invalid_log_level_rejected_by_parser() {
    assert!(Args::try_parse_args([COMMAND_NAME, "--log-level", "loud"]).is_err());
    assert!(Args::try_parse_args([COMMAND_NAME, "--log-format", "xml"]).is_err());
}
