//! Base64 codec for message keys and values
//!
//! The service carries keys and values as standard base64 strings; in memory
//! they are raw bytes.

use base64::{engine::general_purpose, Engine as _};

/// Malformed base64 in an incoming message
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid base64 payload: {source}")]
pub struct DecodeError {
    #[from]
    source: base64::DecodeError,
}

pub fn encode(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

pub fn decode(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(general_purpose::STANDARD.decode(encoded)?)
}

/// Decode an optional key; absent and empty keys both mean "no key"
pub fn decode_key(encoded: Option<&str>) -> Result<Option<Vec<u8>>, DecodeError> {
    match encoded {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => {
            let bytes = decode(s)?;
            Ok(if bytes.is_empty() { None } else { Some(bytes) })
        }
    }
}
