//! CLI integration tests
//!
//! Tests are organized by functionality:
//! - `cli::usage` - usage text and exit status for incomplete invocations
//! - `cli::startup` - settings file and credential failures of the binary

mod cli;
