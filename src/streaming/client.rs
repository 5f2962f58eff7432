//! The remote operations the loops depend on

use crate::streaming::error::ServiceError;
use crate::streaming::model::{
    CreateCursorDetails, CreateGroupCursorDetails, Cursor, PollResult, PutMessagesDetails,
    PutMessagesResult,
};
use async_trait::async_trait;

/// An authenticated handle to the streaming service
///
/// One handle is created by the driver and passed explicitly to every
/// component that talks to the service.
#[async_trait]
pub trait StreamClient: Send + Sync {
    async fn create_cursor(
        &self,
        stream_id: &str,
        details: &CreateCursorDetails,
    ) -> Result<Cursor, ServiceError>;

    async fn create_group_cursor(
        &self,
        stream_id: &str,
        details: &CreateGroupCursorDetails,
    ) -> Result<Cursor, ServiceError>;

    /// Fetch the messages after `cursor`, with the cursor for the next call
    async fn get_messages(
        &self,
        stream_id: &str,
        cursor: &Cursor,
        limit: Option<u32>,
    ) -> Result<PollResult, ServiceError>;

    /// Submit messages; the result has exactly one entry per message, in order
    async fn put_messages(
        &self,
        stream_id: &str,
        details: &PutMessagesDetails,
    ) -> Result<PutMessagesResult, ServiceError>;
}
