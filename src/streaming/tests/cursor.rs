//! Cursor creation requests as seen by the service

use super::mock::MockStreamClient;
use crate::streaming::cursor::{CursorManager, GroupMembership, DEFAULT_GROUP_NAME};
use crate::streaming::error::{ServiceError, StreamError};
use crate::streaming::model::{Cursor, CursorType};
use std::sync::Arc;

#[tokio::test]
async fn test_partition_cursor_starts_at_latest() {
    let client = Arc::new(MockStreamClient::new().with_cursor(Ok(Cursor::new("C1"))));
    let manager = CursorManager::new(client.clone(), "demo");

    let cursor = manager.create_partition_cursor("0").await.unwrap();
    assert_eq!(cursor, Cursor::new("C1"));

    let requests = client.cursor_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].partition, "0");
    assert_eq!(requests[0].cursor_type, CursorType::Latest);
}

#[tokio::test]
async fn test_group_cursor_request_shape() {
    let client = Arc::new(MockStreamClient::new().with_cursor(Ok(Cursor::new("G1"))));
    let manager = CursorManager::new(client.clone(), "demo");
    let membership = GroupMembership::new(DEFAULT_GROUP_NAME);

    let cursor = manager.create_group_cursor(&membership).await.unwrap();
    assert_eq!(cursor.as_str(), "G1");

    let requests = client.group_cursor_requests.lock().unwrap();
    let request = &requests[0];
    assert_eq!(request.group_name, "tutorial");
    assert_eq!(request.cursor_type, CursorType::Latest);
    assert!(request.commit_on_get);
    assert_eq!(request.timeout_in_ms, membership.timeout_ms);
    assert_eq!(request.instance_name.len(), 8);
    assert!(request
        .instance_name
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    assert_eq!(request.instance_name, membership.instance_name);
}

#[tokio::test]
async fn test_cursor_failure_is_not_retried() {
    let client = Arc::new(
        MockStreamClient::new()
            .with_cursor(Err(ServiceError::api(503, "ServiceUnavailable", "try later")))
            .with_cursor(Ok(Cursor::new("C1"))),
    );
    let manager = CursorManager::new(client.clone(), "demo");

    let err = manager.create_partition_cursor("0").await.unwrap_err();
    assert!(matches!(
        err,
        StreamError::CursorCreation { ref stream_id, source: ServiceError::Api { status: 503, .. } }
            if stream_id == "demo"
    ));
    assert_eq!(client.cursor_requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_group_cursor_failure_maps_to_cursor_creation() {
    let client = Arc::new(MockStreamClient::new().with_cursor(Err(ServiceError::api(
        404,
        "NotAuthorizedOrNotFound",
        "stream not found",
    ))));
    let manager = CursorManager::new(client, "demo");

    let err = manager
        .create_group_cursor(&GroupMembership::new("orders"))
        .await
        .unwrap_err();
    assert!(matches!(err, StreamError::CursorCreation { .. }));
}
