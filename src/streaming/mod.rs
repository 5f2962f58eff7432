//! Stream data plane: wire model, HTTP client, cursors and the two loops

pub mod client;
pub mod codec;
pub mod consumer;
pub mod cursor;
pub mod error;
pub mod http;
pub mod model;
pub mod producer;
pub mod signer;

#[cfg(test)]
pub(crate) mod tests;
