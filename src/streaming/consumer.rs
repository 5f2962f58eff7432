//! Cursor-based polling consumer
//!
//! The loop is a small state machine:
//!
//! ```text
//!            +-----------+   poll ok    +------------+
//!   start -> |  Polling  | -----------> | Processing |
//!            +-----------+              +------------+
//!              ^   |  poll failed          |       |
//!              |   v                 empty |       | messages
//!              | Failed (terminal)         v       |
//!              +---------------------- Idle <------+
//! ```
//!
//! Every successful poll replaces the held cursor with the response's
//! `next_cursor`, whether or not the batch had messages. Exactly one poll is
//! issued per interval and nothing runs concurrently with it.

use crate::core::error_handling::error_chain;
use crate::core::retry::{retry_async, RetryPolicy};
use crate::core::shutdown::ShutdownSignal;
use crate::streaming::client::StreamClient;
use crate::streaming::codec::{self, DecodeError};
use crate::streaming::error::{ServiceError, StreamError, StreamResult};
use crate::streaming::model::{ConsumedRecord, Cursor, StreamMessage};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Polling,
    Processing,
    Idle,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    pub interval: Duration,
    /// Page size passed to GetMessages; the service default when `None`
    pub limit: Option<u32>,
    pub retry: RetryPolicy,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            limit: None,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub polls: u64,
    pub empty_polls: u64,
    pub records: u64,
    /// Messages dropped because their key or value was not valid base64
    pub skipped: u64,
}

/// Destination for decoded records
pub trait RecordSink: Send {
    fn emit(&mut self, record: &ConsumedRecord);
}

/// Writes each record to the log as `[MESSAGE] key: value`
#[derive(Debug, Default)]
pub struct LogSink;

impl RecordSink for LogSink {
    fn emit(&mut self, record: &ConsumedRecord) {
        log::info!("{}", record_line(record));
    }
}

/// `[MESSAGE] key: value`, with `null` for a missing key
pub fn record_line(record: &ConsumedRecord) -> String {
    format!(
        "[MESSAGE] {}: {}",
        record.key.as_deref().unwrap_or("null"),
        record.value
    )
}

impl RecordSink for Vec<ConsumedRecord> {
    fn emit(&mut self, record: &ConsumedRecord) {
        self.push(record.clone());
    }
}

pub struct ConsumerLoop<S: RecordSink> {
    client: Arc<dyn StreamClient>,
    stream_id: String,
    cursor: Cursor,
    state: ConsumerState,
    config: ConsumerConfig,
    sink: S,
    stats: ConsumerStats,
}

impl<S: RecordSink> ConsumerLoop<S> {
    pub fn new(
        client: Arc<dyn StreamClient>,
        stream_id: impl Into<String>,
        initial_cursor: Cursor,
        config: ConsumerConfig,
        sink: S,
    ) -> Self {
        Self {
            client,
            stream_id: stream_id.into(),
            cursor: initial_cursor,
            state: ConsumerState::Polling,
            config,
            sink,
            stats: ConsumerStats::default(),
        }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    pub fn stats(&self) -> &ConsumerStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Poll until shutdown or a fatal error
    ///
    /// Shutdown is honoured at the top of each cycle and during the pacing
    /// sleep; a poll already in flight always completes and its cursor is kept.
    pub async fn run(&mut self, shutdown: &mut ShutdownSignal) -> StreamResult<()> {
        log::info!("Starting a consumer...");

        loop {
            if shutdown.is_triggered() {
                break;
            }
            if !shutdown.sleep(self.config.interval).await {
                break;
            }
            self.poll_once().await?;
        }

        log::info!(
            "Consumer stopped after {} polls, {} records (cursor {})",
            self.stats.polls,
            self.stats.records,
            self.cursor
        );
        Ok(())
    }

    /// One Polling -> Processing -> Idle/Polling cycle
    ///
    /// Returns the number of records emitted.
    pub async fn poll_once(&mut self) -> StreamResult<usize> {
        self.state = ConsumerState::Polling;

        let client = &self.client;
        let stream_id = self.stream_id.as_str();
        let cursor = &self.cursor;
        let limit = self.config.limit;
        let polled = retry_async(
            "get_messages",
            &self.config.retry,
            ServiceError::is_retryable,
            move || client.get_messages(stream_id, cursor, limit),
        )
        .await;

        let result = match polled {
            Ok(result) => result,
            Err(source) => {
                self.state = ConsumerState::Failed;
                return Err(StreamError::Poll {
                    stream_id: self.stream_id.clone(),
                    source,
                });
            }
        };

        self.stats.polls += 1;
        self.state = ConsumerState::Processing;
        let emitted = self.process(&result.messages);

        self.cursor = result.next_cursor;
        self.state = if result.messages.is_empty() {
            ConsumerState::Idle
        } else {
            ConsumerState::Polling
        };
        Ok(emitted)
    }

    fn process(&mut self, messages: &[StreamMessage]) -> usize {
        if messages.is_empty() {
            self.stats.empty_polls += 1;
            log::info!("No new messages...");
            return 0;
        }

        log::info!("Read {} messages", messages.len());
        let mut emitted = 0;
        for message in messages {
            match decode_message(message) {
                Ok(record) => {
                    self.sink.emit(&record);
                    emitted += 1;
                }
                Err(source) => {
                    self.stats.skipped += 1;
                    let err = StreamError::Decode {
                        partition: message.partition.clone().unwrap_or_default(),
                        offset: message.offset.unwrap_or(-1),
                        source,
                    };
                    log::error!("Skipping message: {}", error_chain(&err));
                }
            }
        }
        self.stats.records += emitted as u64;
        emitted
    }
}

/// Decode a wire message; an empty or absent key becomes `None`
pub fn decode_message(message: &StreamMessage) -> Result<ConsumedRecord, DecodeError> {
    let key = codec::decode_key(message.key.as_deref())?;
    let value = codec::decode(&message.value)?;
    Ok(ConsumedRecord::from_bytes(key.as_deref(), &value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(key: Option<&str>, value: &str) -> StreamMessage {
        StreamMessage {
            stream: None,
            partition: Some("0".to_string()),
            key: key.map(str::to_string),
            value: value.to_string(),
            offset: Some(1),
            timestamp: None,
        }
    }

    #[test]
    fn test_decode_message_with_key() {
        let record = decode_message(&wire(Some("dGltZQ=="), "MTcwMDAwMDAwMA==")).unwrap();
        assert_eq!(record.key.as_deref(), Some("time"));
        assert_eq!(record.value, "1700000000");
    }

    #[test]
    fn test_decode_message_empty_key_is_null() {
        assert_eq!(decode_message(&wire(Some(""), "dg==")).unwrap().key, None);
        assert_eq!(decode_message(&wire(None, "dg==")).unwrap().key, None);
    }

    #[test]
    fn test_decode_message_empty_value_is_empty_string() {
        let record = decode_message(&wire(Some("dGltZQ=="), "")).unwrap();
        assert_eq!(record.value, "");
    }

    #[test]
    fn test_decode_message_rejects_bad_value() {
        assert!(decode_message(&wire(None, "!!")).is_err());
        assert!(decode_message(&wire(Some("!!"), "dg==")).is_err());
    }

    #[test]
    fn test_record_line_shows_key_and_value() {
        let record = decode_message(&wire(Some("dGltZQ=="), "MTcwMDAwMDAwMA==")).unwrap();
        assert_eq!(record_line(&record), "[MESSAGE] time: 1700000000");
    }

    #[test]
    fn test_record_line_shows_null_for_missing_key() {
        let record = decode_message(&wire(None, "aGVsbG8=")).unwrap();
        assert_eq!(record_line(&record), "[MESSAGE] null: hello");
    }

    #[test]
    fn test_vec_sink_collects_in_order() {
        let mut sink: Vec<ConsumedRecord> = Vec::new();
        sink.emit(&ConsumedRecord::from_bytes(None, b"a"));
        sink.emit(&ConsumedRecord::from_bytes(Some(b"k"), b"b"));
        assert_eq!(sink[0].value, "a");
        assert_eq!(sink[1].key.as_deref(), Some("k"));
    }
}
