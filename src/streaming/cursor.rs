//! Cursor creation
//!
//! Two kinds of cursor are supported. A partition cursor reads one partition
//! on behalf of this process alone. A group cursor joins a consumer group: the
//! service spreads partitions across every instance sharing the group name and
//! commits the previously returned position on each poll.
//!
//! Both start at `LATEST`, so messages already in the stream when the cursor
//! is created are never delivered. No retrying happens here; a failed creation
//! is returned to the caller as [`StreamError::CursorCreation`].

use crate::streaming::client::StreamClient;
use crate::streaming::error::{StreamError, StreamResult};
use crate::streaming::model::{CreateCursorDetails, CreateGroupCursorDetails, Cursor, CursorType};
use rand::Rng;
use std::sync::Arc;

pub const INSTANCE_NAME_LEN: usize = 8;
const INSTANCE_NAME_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Group name used when `--group` is given without a value
pub const DEFAULT_GROUP_NAME: &str = "tutorial";
pub const DEFAULT_GROUP_TIMEOUT_MS: u32 = 30_000;

/// Membership of one reader in a consumer group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMembership {
    pub group_name: String,
    /// Must be unique among concurrently running readers of the group
    pub instance_name: String,
    /// How long a poll may wait server-side for assignment or data
    pub timeout_ms: u32,
}

impl GroupMembership {
    /// Join `group_name` under a freshly generated instance name
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            instance_name: generate_instance_name(),
            timeout_ms: DEFAULT_GROUP_TIMEOUT_MS,
        }
    }
}

/// Random 8-character name over `A-Z0-9`
///
/// Collisions between concurrently running instances are possible but
/// unlikely (36^8 names); pass an explicit instance name when that matters.
pub fn generate_instance_name() -> String {
    let mut rng = rand::thread_rng();
    (0..INSTANCE_NAME_LEN)
        .map(|_| INSTANCE_NAME_CHARSET[rng.gen_range(0..INSTANCE_NAME_CHARSET.len())] as char)
        .collect()
}

/// Creates the initial cursor for a consumer run
pub struct CursorManager {
    client: Arc<dyn StreamClient>,
    stream_id: String,
}

impl CursorManager {
    pub fn new(client: Arc<dyn StreamClient>, stream_id: impl Into<String>) -> Self {
        Self {
            client,
            stream_id: stream_id.into(),
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub async fn create_partition_cursor(&self, partition: &str) -> StreamResult<Cursor> {
        log::info!("Creating a cursor for partition {}", partition);

        let details = CreateCursorDetails {
            partition: partition.to_string(),
            cursor_type: CursorType::Latest,
        };
        let cursor = self
            .client
            .create_cursor(&self.stream_id, &details)
            .await
            .map_err(|source| StreamError::CursorCreation {
                stream_id: self.stream_id.clone(),
                source,
            })?;

        log::debug!("Partition {} cursor: {}", partition, cursor);
        Ok(cursor)
    }

    pub async fn create_group_cursor(&self, membership: &GroupMembership) -> StreamResult<Cursor> {
        log::info!(
            "Creating a cursor for group '{}' as instance '{}'",
            membership.group_name,
            membership.instance_name
        );

        let details = CreateGroupCursorDetails {
            cursor_type: CursorType::Latest,
            group_name: membership.group_name.clone(),
            instance_name: membership.instance_name.clone(),
            timeout_in_ms: membership.timeout_ms,
            commit_on_get: true,
        };
        let cursor = self
            .client
            .create_group_cursor(&self.stream_id, &details)
            .await
            .map_err(|source| StreamError::CursorCreation {
                stream_id: self.stream_id.clone(),
                source,
            })?;

        log::debug!("Group '{}' cursor: {}", membership.group_name, cursor);
        Ok(cursor)
    }
}
