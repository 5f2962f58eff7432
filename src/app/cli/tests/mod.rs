//! Tests for CLI argument parsing and the settings file

pub mod args_tests;
