//! Stream data model and its wire representation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, service-issued read position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Cursors are long; the head is enough to tell two apart in a log line
        match self.0.char_indices().nth(16) {
            Some((cut, _)) => write!(f, "{}...", &self.0[..cut]),
            None => f.write_str(&self.0),
        }
    }
}

/// Where a new cursor starts reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CursorType {
    /// Only messages produced after the cursor was created
    Latest,
}

/// A message in memory: raw bytes, key optional
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub key: Option<Vec<u8>>,
    pub value: Vec<u8>,
}

impl Message {
    pub fn new(key: Option<impl Into<Vec<u8>>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.map(Into::into),
            value: value.into(),
        }
    }
}

/// A message as returned by GetMessages, key and value still base64
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMessage {
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub partition: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    pub value: String,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl StreamMessage {
    /// Build a wire message from raw bytes
    pub fn encode(message: &Message) -> Self {
        Self {
            stream: None,
            partition: None,
            key: message.key.as_deref().map(super::codec::encode),
            value: super::codec::encode(&message.value),
            offset: None,
            timestamp: None,
        }
    }
}

/// Result of one GetMessages call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult {
    pub messages: Vec<StreamMessage>,
    /// Position for the next poll; always replaces the cursor that was used
    pub next_cursor: Cursor,
}

/// One submitted message, base64 encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutMessagesDetailsEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: String,
}

impl From<&Message> for PutMessagesDetailsEntry {
    fn from(message: &Message) -> Self {
        let wire = StreamMessage::encode(message);
        Self {
            key: wire.key,
            value: wire.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutMessagesDetails {
    pub messages: Vec<PutMessagesDetailsEntry>,
}

/// Per-message outcome of a PutMessages call, in submission order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutMessagesResultEntry {
    #[serde(default)]
    pub partition: Option<String>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl PutMessagesResultEntry {
    pub fn published(partition: impl Into<String>, offset: i64) -> Self {
        Self {
            partition: Some(partition.into()),
            offset: Some(offset),
            timestamp: None,
            error: None,
            error_message: None,
        }
    }

    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            partition: None,
            offset: None,
            timestamp: None,
            error: Some(code.into()),
            error_message: Some(message.into()),
        }
    }

    pub fn outcome(&self) -> PutEntryOutcome {
        match &self.error {
            Some(code) => PutEntryOutcome::Rejected {
                code: code.clone(),
                message: self.error_message.clone().unwrap_or_default(),
            },
            None => PutEntryOutcome::Published {
                partition: self.partition.clone().unwrap_or_default(),
                offset: self.offset.unwrap_or_default(),
            },
        }
    }
}

/// What happened to one submitted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutEntryOutcome {
    Published { partition: String, offset: i64 },
    Rejected { code: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutMessagesResult {
    #[serde(default)]
    pub failures: u32,
    pub entries: Vec<PutMessagesResultEntry>,
}

/// Body of CreateCursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCursorDetails {
    pub partition: String,
    #[serde(rename = "type")]
    pub cursor_type: CursorType,
}

/// Body of CreateGroupCursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupCursorDetails {
    #[serde(rename = "type")]
    pub cursor_type: CursorType,
    pub group_name: String,
    pub instance_name: String,
    pub timeout_in_ms: u32,
    pub commit_on_get: bool,
}

/// Response body of both cursor creation calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorResponse {
    pub value: Cursor,
}

/// A decoded message ready for the output sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumedRecord {
    pub key: Option<String>,
    pub value: String,
}

impl ConsumedRecord {
    /// Render raw bytes as text; invalid UTF-8 is replaced rather than rejected
    pub fn from_bytes(key: Option<&[u8]>, value: &[u8]) -> Self {
        Self {
            key: key.map(|k| String::from_utf8_lossy(k).into_owned()),
            value: String::from_utf8_lossy(value).into_owned(),
        }
    }
}
