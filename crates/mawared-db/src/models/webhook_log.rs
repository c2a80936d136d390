//! Webhook delivery log model.
//!
//! One row per delivery attempt, written after the attempt settles and
//! immutable thereafter. Rows reference webhooks by id only, so the audit
//! trail survives registration deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A recorded delivery attempt.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WebhookLog {
    /// Unique identifier.
    pub id: Uuid,

    /// Owning tenant.
    pub tenant_id: Uuid,

    /// The webhook this attempt targeted (reference, not ownership).
    pub webhook_id: Uuid,

    /// Event type name that was delivered.
    pub event: String,

    /// Exact JSON body that was sent, for reproducibility.
    pub payload: serde_json::Value,

    /// HTTP status code, absent when the request never completed.
    pub status_code: Option<i16>,

    /// Response body, truncated by the executor.
    pub response_body: Option<String>,

    /// Wall-clock duration of the request/response cycle.
    pub duration_ms: i32,

    /// Whether the endpoint acknowledged with a 2xx status.
    pub is_success: bool,

    /// Error description for failed attempts.
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Input for appending a delivery log entry.
#[derive(Debug, Clone)]
pub struct CreateWebhookLog {
    pub tenant_id: Uuid,
    pub webhook_id: Uuid,
    pub event: String,
    pub payload: serde_json::Value,
    pub status_code: Option<i16>,
    pub response_body: Option<String>,
    pub duration_ms: i32,
    pub is_success: bool,
    pub error_message: Option<String>,
}

impl WebhookLog {
    /// Append a delivery log entry.
    pub async fn create<'e, E>(executor: E, input: CreateWebhookLog) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r#"
            INSERT INTO webhook_logs
                (tenant_id, webhook_id, event, payload, status_code,
                 response_body, duration_ms, is_success, error_message)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(input.tenant_id)
        .bind(input.webhook_id)
        .bind(&input.event)
        .bind(&input.payload)
        .bind(input.status_code)
        .bind(&input.response_body)
        .bind(input.duration_ms)
        .bind(input.is_success)
        .bind(&input.error_message)
        .fetch_one(executor)
        .await
    }

    /// List log entries for a webhook, newest first.
    pub async fn list_by_webhook<'e, E>(
        executor: E,
        tenant_id: Uuid,
        webhook_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r#"
            SELECT * FROM webhook_logs
            WHERE tenant_id = $1 AND webhook_id = $2
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(webhook_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
    }

    /// Count log entries for a webhook.
    pub async fn count_by_webhook<'e, E>(
        executor: E,
        tenant_id: Uuid,
        webhook_id: Uuid,
    ) -> Result<i64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM webhook_logs
            WHERE tenant_id = $1 AND webhook_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(webhook_id)
        .fetch_one(executor)
        .await?;

        Ok(row.0)
    }

    /// Delete log entries older than the given cutoff (retention job hook).
    pub async fn delete_older_than<'e, E>(
        executor: E,
        tenant_id: Uuid,
        older_than: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM webhook_logs
            WHERE tenant_id = $1 AND created_at < $2
            "#,
        )
        .bind(tenant_id)
        .bind(older_than)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
