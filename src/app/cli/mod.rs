//! Command line, settings file and credential profile

pub mod args;
pub mod config;
pub mod profile;

#[cfg(test)]
mod tests;
