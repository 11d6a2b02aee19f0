//! At-most-once event deduplication backed by DynamoDB.
//!
//! The conditional put is the system's sole concurrency primitive: for any
//! `client_msg_id` exactly one delivery observes [`DedupOutcome::Inserted`],
//! even under concurrent redelivery, because the store's atomic condition
//! check rejects every later write of the same key.

use std::future::Future;
use std::pin::Pin;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;
use tracing::debug;

use crate::{AppError, Result};

const SECONDS_PER_DAY: i64 = 86_400;

/// Result of a conditional dedup insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    /// The record was created; this delivery owns fulfillment.
    Inserted,
    /// A record for this key already exists; the event is a duplicate.
    AlreadyExists,
}

/// Port for the deduplication store.
pub trait DedupStore: Send + Sync {
    /// Attempt to claim `client_msg_id` for fulfillment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Dedup`](crate::AppError::Dedup) for storage
    /// failures other than the key already existing.
    fn reserve(
        &self,
        client_msg_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<DedupOutcome>> + Send + '_>>;
}

/// DynamoDB-backed [`DedupStore`].
///
/// Records carry a creation `timestamp` and an `expires_at` attribute
/// intended for the table's native TTL expiry, so retention is a table
/// policy rather than an in-process purge task.
pub struct DynamoDedupStore {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
    retention_days: u32,
}

impl DynamoDedupStore {
    /// Create a store writing to `table_name`.
    #[must_use]
    pub fn new(client: aws_sdk_dynamodb::Client, table_name: String, retention_days: u32) -> Self {
        Self {
            client,
            table_name,
            retention_days,
        }
    }

    async fn reserve_inner(&self, client_msg_id: String) -> Result<DedupOutcome> {
        let now = Utc::now().timestamp();
        let expires_at = now + i64::from(self.retention_days) * SECONDS_PER_DAY;

        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .item("client_msg_id", AttributeValue::S(client_msg_id.clone()))
            .item("timestamp", AttributeValue::N(now.to_string()))
            .item("expires_at", AttributeValue::N(expires_at.to_string()))
            .condition_expression("attribute_not_exists(client_msg_id)")
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(client_msg_id, "dedup record inserted");
                Ok(DedupOutcome::Inserted)
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_conditional_check_failed_exception() {
                    debug!(client_msg_id, "dedup record already exists");
                    Ok(DedupOutcome::AlreadyExists)
                } else {
                    Err(AppError::Dedup(format!(
                        "conditional put on {table}: {service_err}",
                        table = self.table_name
                    )))
                }
            }
        }
    }
}

impl DedupStore for DynamoDedupStore {
    fn reserve(
        &self,
        client_msg_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<DedupOutcome>> + Send + '_>> {
        let id = client_msg_id.to_owned();
        Box::pin(async move { self.reserve_inner(id).await })
    }
}
