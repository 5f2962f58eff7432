//! Heartbeat producer
//!
//! Each tick publishes one message with key `time` and the current Unix time in
//! seconds as its value. The service picks the partition. A per-message error
//! in an otherwise successful response is logged and the loop carries on; a
//! failed call ends the run.

use crate::core::retry::{retry_async, RetryPolicy};
use crate::core::shutdown::ShutdownSignal;
use crate::core::time::TimeProvider;
use crate::streaming::client::StreamClient;
use crate::streaming::error::{ServiceError, StreamError, StreamResult};
use crate::streaming::model::{Message, PutEntryOutcome, PutMessagesDetails};
use std::sync::Arc;
use std::time::Duration;

pub const MESSAGE_KEY: &str = "time";
pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerConfig {
    pub interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_PUBLISH_INTERVAL,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProducerStats {
    pub ticks: u64,
    pub published: u64,
    pub rejected: u64,
}

pub struct ProducerLoop {
    client: Arc<dyn StreamClient>,
    stream_id: String,
    clock: Arc<dyn TimeProvider>,
    config: ProducerConfig,
    stats: ProducerStats,
}

impl ProducerLoop {
    pub fn new(
        client: Arc<dyn StreamClient>,
        stream_id: impl Into<String>,
        clock: Arc<dyn TimeProvider>,
        config: ProducerConfig,
    ) -> Self {
        Self {
            client,
            stream_id: stream_id.into(),
            clock,
            config,
            stats: ProducerStats::default(),
        }
    }

    pub fn stats(&self) -> &ProducerStats {
        &self.stats
    }

    /// The message for the current tick
    pub fn next_message(&self) -> Message {
        Message::new(Some(MESSAGE_KEY), self.clock.unix_seconds().to_string())
    }

    /// Publish until shutdown or a fatal error
    pub async fn run(&mut self, shutdown: &mut ShutdownSignal) -> StreamResult<()> {
        log::info!("Starting a producer...");

        loop {
            if shutdown.is_triggered() {
                break;
            }
            self.tick().await?;
            if !shutdown.sleep(self.config.interval).await {
                break;
            }
        }

        log::info!(
            "Producer stopped after {} ticks ({} published, {} rejected)",
            self.stats.ticks,
            self.stats.published,
            self.stats.rejected
        );
        Ok(())
    }

    /// Publish the heartbeat message once
    pub async fn tick(&mut self) -> StreamResult<PutEntryOutcome> {
        let message = self.next_message();
        log::info!(
            "Producing message for {}",
            String::from_utf8_lossy(&message.value)
        );

        self.stats.ticks += 1;
        let mut outcomes = self.publish(std::slice::from_ref(&message)).await?;
        outcomes.pop().ok_or_else(|| StreamError::Publish {
            stream_id: self.stream_id.clone(),
            source: ServiceError::MalformedResponse("PutMessages returned no entries".to_string()),
        })
    }

    /// Submit a batch; outcomes are returned in submission order
    pub async fn publish(&mut self, messages: &[Message]) -> StreamResult<Vec<PutEntryOutcome>> {
        let details = PutMessagesDetails {
            messages: messages.iter().map(Into::into).collect(),
        };

        let client = &self.client;
        let stream_id = self.stream_id.as_str();
        let details_ref = &details;
        let result = retry_async(
            "put_messages",
            &self.config.retry,
            ServiceError::is_retryable,
            move || client.put_messages(stream_id, details_ref),
        )
        .await
        .map_err(|source| StreamError::Publish {
            stream_id: self.stream_id.clone(),
            source,
        })?;

        let outcomes: Vec<PutEntryOutcome> = result.entries.iter().map(|e| e.outcome()).collect();
        for outcome in &outcomes {
            match outcome {
                PutEntryOutcome::Published { .. } => self.stats.published += 1,
                PutEntryOutcome::Rejected { .. } => self.stats.rejected += 1,
            }
            let (level, line) = outcome_log(outcome);
            log::log!(level, "{}", line);
        }
        Ok(outcomes)
    }
}

/// The log line for one publish outcome: info on success, error on rejection
pub fn outcome_log(outcome: &PutEntryOutcome) -> (log::Level, String) {
    match outcome {
        PutEntryOutcome::Published { partition, offset } => (
            log::Level::Info,
            format!("Published message to partition {} , offset {}", partition, offset),
        ),
        PutEntryOutcome::Rejected { code, message } => {
            (log::Level::Error, format!("Error ({}) : {}", code, message))
        }
    }
}
