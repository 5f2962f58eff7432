//! Command line arguments and their resolution into run settings
//!
//! Positionals are optional at the clap level so that a short or unknown
//! invocation can fall back to the usage text instead of a clap error.

use crate::core::retry::RetryPolicy;
use crate::streaming::cursor::{GroupMembership, DEFAULT_GROUP_NAME, DEFAULT_GROUP_TIMEOUT_MS};
use crate::streaming::error::{StreamError, StreamResult};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PROFILE: &str = "DEFAULT";
pub const DEFAULT_PARTITION: &str = "0";
pub const DEFAULT_INTERVAL_MS: u64 = 1_000;
pub const MAX_LIMIT: u32 = 10_000;

const USAGE: &str = "
    A utility for producing and consuming test messages on Oracle
    Cloud Infrastructure's Streaming Service.

    USAGE: streamtick producer|consumer STREAM_ID OSS_ENDPOINT [OPTIONS]

    Run with --help for the list of options.
";

/// Usage text printed for incomplete or unrecognised invocations
pub fn usage() -> &'static str {
    USAGE
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "streamtick")]
#[command(about = "Produce or consume heartbeat messages on an OCI stream")]
#[command(version = crate::core::version::long_version())]
pub struct Args {
    /// Run mode: producer or consumer
    #[arg(value_name = "MODE")]
    pub mode: Option<String>,

    /// OCID of the stream
    #[arg(value_name = "STREAM_ID")]
    pub stream_id: Option<String>,

    /// Messages endpoint of the stream pool
    #[arg(value_name = "ENDPOINT")]
    pub endpoint: Option<String>,

    /// Positionals after ENDPOINT are accepted and ignored
    #[arg(value_name = "EXTRA", trailing_var_arg = true, hide = true)]
    pub extra: Vec<String>,

    /// Settings file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// OCI credential profile file [default: ~/.oci/config]
    #[arg(long = "oci-config", value_name = "FILE")]
    pub oci_config: Option<PathBuf>,

    /// Profile section inside the credential file [default: DEFAULT]
    #[arg(long = "profile", value_name = "NAME")]
    pub profile: Option<String>,

    /// Pause between polls or publications in milliseconds [default: 1000]
    #[arg(long = "interval-ms", value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Partition read by a partition cursor [default: 0]
    #[arg(long = "partition", value_name = "ID")]
    pub partition: Option<String>,

    /// Consume as a member of a consumer group [default group: tutorial]
    #[arg(
        long = "group",
        value_name = "NAME",
        num_args = 0..=1,
        default_missing_value = DEFAULT_GROUP_NAME
    )]
    pub group: Option<String>,

    /// Instance name within the group [default: random]
    #[arg(long = "instance-name", value_name = "NAME")]
    pub instance_name: Option<String>,

    /// Server-side wait bound for group polls in milliseconds [default: 30000]
    #[arg(long = "group-timeout-ms", value_name = "MS")]
    pub group_timeout_ms: Option<u32>,

    /// Maximum messages returned per poll (1-10000)
    #[arg(long = "limit", value_name = "N")]
    pub limit: Option<u32>,

    /// Attempts per remote call, including the first [default: 3]
    #[arg(long = "max-attempts", value_name = "N")]
    pub max_attempts: Option<usize>,

    /// Delay between attempts in milliseconds [default: 500]
    #[arg(long = "retry-delay-ms", value_name = "MS")]
    pub retry_delay_ms: Option<u64>,

    /// Log level
    #[arg(long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Force colored output
    #[arg(long = "color", action = ArgAction::SetTrue)]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color", action = ArgAction::SetTrue, conflicts_with = "color")]
    pub no_color: bool,

    /// More output (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Less output (repeatable)
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Producer,
    Consumer,
}

impl Mode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "producer" => Some(Mode::Producer),
            "consumer" => Some(Mode::Consumer),
            _ => None,
        }
    }
}

/// How the consumer obtains its initial cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorSource {
    Partition(String),
    Group(GroupMembership),
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub mode: Mode,
    pub stream_id: String,
    pub endpoint: String,
    pub oci_config: PathBuf,
    pub profile: String,
    pub interval: Duration,
    pub cursor_source: CursorSource,
    pub limit: Option<u32>,
    pub retry: RetryPolicy,
}

/// Outcome of interpreting the command line
#[derive(Debug, Clone)]
pub enum Invocation {
    Usage,
    Run(Box<RunSettings>),
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from an explicit argument list (program name first)
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// The requested mode, or `None` when the usage text should be shown
    pub fn run_mode(&self) -> Option<Mode> {
        match (&self.mode, &self.stream_id, &self.endpoint) {
            (Some(mode), Some(_), Some(_)) => Mode::parse(mode),
            _ => None,
        }
    }

    /// Net verbosity shift from `-v` and `-q`
    pub fn verbosity(&self) -> i8 {
        let verbose = self.verbose.min(i8::MAX as u8) as i8;
        let quiet = self.quiet.min(i8::MAX as u8) as i8;
        verbose - quiet
    }

    /// Whether log output should be colored
    ///
    /// Explicit flags win; otherwise color follows whether stdout is a terminal.
    pub fn use_color(&self, stdout_is_terminal: bool) -> bool {
        if self.no_color {
            false
        } else {
            self.color || stdout_is_terminal
        }
    }

    /// Log file with the magic values `none` and `-` meaning no file
    pub fn effective_log_file(&self) -> Option<PathBuf> {
        self.log_file.as_ref().and_then(|path| {
            let text = path.to_string_lossy();
            if text.eq_ignore_ascii_case("none") || text == "-" {
                None
            } else {
                Some(path.clone())
            }
        })
    }

    /// Interpret the positionals and options
    ///
    /// Missing positionals or an unknown mode yield [`Invocation::Usage`];
    /// option values out of range are configuration errors.
    pub fn resolve(&self) -> StreamResult<Invocation> {
        let (Some(mode), Some(stream_id), Some(endpoint)) =
            (self.run_mode(), &self.stream_id, &self.endpoint)
        else {
            return Ok(Invocation::Usage);
        };

        let interval_ms = self.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS);
        if interval_ms == 0 {
            return Err(StreamError::config("--interval-ms must be at least 1"));
        }
        if let Some(limit) = self.limit {
            if limit == 0 || limit > MAX_LIMIT {
                return Err(StreamError::config(format!(
                    "--limit must be between 1 and {}, got {}",
                    MAX_LIMIT, limit
                )));
            }
        }

        let defaults = RetryPolicy::default();
        let max_attempts = self.max_attempts.unwrap_or(defaults.max_attempts);
        if max_attempts == 0 {
            return Err(StreamError::config("--max-attempts must be at least 1"));
        }
        let retry = RetryPolicy {
            max_attempts,
            delay: self
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.delay),
        };

        let cursor_source = match &self.group {
            Some(group_name) => {
                if group_name.trim().is_empty() {
                    return Err(StreamError::config("--group name must not be empty"));
                }
                let mut membership = GroupMembership::new(group_name.as_str());
                if let Some(instance_name) = &self.instance_name {
                    if instance_name.trim().is_empty() {
                        return Err(StreamError::config("--instance-name must not be empty"));
                    }
                    membership.instance_name = instance_name.clone();
                }
                membership.timeout_ms = self.group_timeout_ms.unwrap_or(DEFAULT_GROUP_TIMEOUT_MS);
                CursorSource::Group(membership)
            }
            None => CursorSource::Partition(
                self.partition
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PARTITION.to_string()),
            ),
        };

        let oci_config = match &self.oci_config {
            Some(path) => path.clone(),
            None => dirs::home_dir()
                .map(|home| home.join(".oci").join("config"))
                .ok_or_else(|| {
                    StreamError::config("Cannot locate home directory; pass --oci-config")
                })?,
        };

        Ok(Invocation::Run(Box::new(RunSettings {
            mode,
            stream_id: stream_id.clone(),
            endpoint: endpoint.clone(),
            oci_config,
            profile: self
                .profile
                .clone()
                .unwrap_or_else(|| DEFAULT_PROFILE.to_string()),
            interval: Duration::from_millis(interval_ms),
            cursor_source,
            limit: self.limit,
            retry,
        })))
    }
}
