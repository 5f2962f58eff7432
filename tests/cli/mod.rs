//! CLI integration test modules

pub mod startup;
pub mod usage;

use std::process::{Command, Output};

/// Run the built binary with `args`
pub fn run_binary(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_streamtick"))
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run streamtick binary")
}
