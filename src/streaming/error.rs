//! Error types for stream operations

use crate::core::error_handling::ContextualError;
use crate::streaming::codec::DecodeError;
use thiserror::Error;

/// Failure of a single remote call
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Service returned {status} ({code}): {message}{}", request_id_suffix(.opc_request_id))]
    Api {
        status: u16,
        code: String,
        message: String,
        opc_request_id: Option<String>,
    },

    #[error("Malformed service response: {0}")]
    MalformedResponse(String),

    #[error("Request signing failed: {0}")]
    Signing(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

fn request_id_suffix(request_id: &Option<String>) -> String {
    match request_id {
        Some(id) => format!(" [opc-request-id: {}]", id),
        None => String::new(),
    }
}

impl ServiceError {
    /// Rate limits, server-side failures, timeouts and refused connections
    /// are worth another attempt; authentication, permission, not-found and
    /// protocol errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Transport(e) => e.is_timeout() || e.is_connect(),
            ServiceError::Api { status, .. } => *status == 429 || *status >= 500,
            ServiceError::MalformedResponse(_)
            | ServiceError::Signing(_)
            | ServiceError::InvalidRequest(_) => false,
        }
    }

    pub fn api(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Api {
            status,
            code: code.into(),
            message: message.into(),
            opc_request_id: None,
        }
    }
}

/// Errors that end a producer or consumer run
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to create cursor for stream '{stream_id}'")]
    CursorCreation {
        stream_id: String,
        #[source]
        source: ServiceError,
    },

    #[error("Failed to get messages from stream '{stream_id}'")]
    Poll {
        stream_id: String,
        #[source]
        source: ServiceError,
    },

    #[error("Failed to put messages to stream '{stream_id}'")]
    Publish {
        stream_id: String,
        #[source]
        source: ServiceError,
    },

    #[error("Message at partition {partition}, offset {offset} could not be decoded")]
    Decode {
        partition: String,
        offset: i64,
        #[source]
        source: DecodeError,
    },
}

pub type StreamResult<T> = Result<T, StreamError>;

impl StreamError {
    pub fn config(message: impl Into<String>) -> Self {
        StreamError::Config {
            message: message.into(),
        }
    }

    /// True when the underlying remote call failed in a retryable way
    pub fn is_retryable(&self) -> bool {
        match self {
            StreamError::CursorCreation { source, .. }
            | StreamError::Poll { source, .. }
            | StreamError::Publish { source, .. } => source.is_retryable(),
            StreamError::Config { .. } | StreamError::Decode { .. } => false,
        }
    }
}

impl ContextualError for StreamError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, StreamError::Config { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            StreamError::Config { message } => Some(message),
            _ => None,
        }
    }
}
