//! Webhook registration model.
//!
//! A webhook is a tenant-scoped registration of an external endpoint that
//! wants to be notified of platform events. Health bookkeeping (failure
//! count, last error, last-triggered) lives directly on the row so that
//! eligibility filtering happens inside the store query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered webhook endpoint.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Webhook {
    /// Unique identifier.
    pub id: Uuid,

    /// Owning tenant.
    pub tenant_id: Uuid,

    /// Display name.
    pub name: String,

    /// Target URL for deliveries.
    pub url: String,

    /// Signing secret, AES-256-GCM encrypted at rest.
    pub secret_encrypted: String,

    /// Event type names this endpoint is subscribed to.
    pub events: Vec<String>,

    /// Whether the registration is active.
    pub is_active: bool,

    /// Consecutive delivery failures since the last success.
    pub failure_count: i32,

    /// Message of the most recent failed delivery, if any.
    pub last_error: Option<String>,

    /// When a delivery (successful or not) was last attempted.
    pub last_triggered_at: Option<DateTime<Utc>>,

    /// User that created the registration, if known.
    pub created_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a webhook registration.
#[derive(Debug, Clone)]
pub struct CreateWebhook {
    pub tenant_id: Uuid,
    pub name: String,
    pub url: String,
    pub secret_encrypted: String,
    pub events: Vec<String>,
    pub created_by: Option<Uuid>,
}

/// Input for updating a webhook registration. `None` fields are left as-is.
#[derive(Debug, Clone, Default)]
pub struct UpdateWebhook {
    pub name: Option<String>,
    pub url: Option<String>,
    pub events: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl Webhook {
    /// Insert a new webhook registration.
    pub async fn create<'e, E>(executor: E, input: CreateWebhook) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r#"
            INSERT INTO webhooks (tenant_id, name, url, secret_encrypted, events, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.tenant_id)
        .bind(&input.name)
        .bind(&input.url)
        .bind(&input.secret_encrypted)
        .bind(&input.events)
        .bind(input.created_by)
        .fetch_one(executor)
        .await
    }

    /// Find a webhook by id within a tenant.
    pub async fn find_by_id<'e, E>(
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r#"
            SELECT * FROM webhooks
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// List webhooks for a tenant, newest first, optionally filtered by
    /// active state.
    pub async fn list_by_tenant<'e, E>(
        executor: E,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
        is_active: Option<bool>,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r#"
            SELECT * FROM webhooks
            WHERE tenant_id = $1 AND ($2::boolean IS NULL OR is_active = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(is_active)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
    }

    /// Count webhooks for a tenant, optionally filtered by active state.
    pub async fn count_by_tenant<'e, E>(
        executor: E,
        tenant_id: Uuid,
        is_active: Option<bool>,
    ) -> Result<i64, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM webhooks
            WHERE tenant_id = $1 AND ($2::boolean IS NULL OR is_active = $2)
            "#,
        )
        .bind(tenant_id)
        .bind(is_active)
        .fetch_one(executor)
        .await?;

        Ok(row.0)
    }

    /// List webhooks eligible for automatic delivery of an event: active,
    /// subscribed to the event type, and under the failure threshold.
    ///
    /// The eligibility filter is applied here, in SQL, so suspended
    /// registrations are never loaded by the dispatcher.
    pub async fn find_eligible<'e, E>(
        executor: E,
        tenant_id: Uuid,
        event_type: &str,
        failure_threshold: i32,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r#"
            SELECT * FROM webhooks
            WHERE tenant_id = $1
              AND is_active = TRUE
              AND $2 = ANY(events)
              AND failure_count < $3
            "#,
        )
        .bind(tenant_id)
        .bind(event_type)
        .bind(failure_threshold)
        .fetch_all(executor)
        .await
    }

    /// Record a successful delivery: reset the failure counter, clear the
    /// last error, and stamp the last-triggered time.
    pub async fn record_success<'e, E>(
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE webhooks
            SET failure_count = 0,
                last_error = NULL,
                last_triggered_at = $3,
                updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Record a failed delivery: atomically increment the failure counter
    /// and store the error message.
    ///
    /// The increment is a single SQL read-modify-write so a concurrent
    /// reactivation cannot lose an update.
    pub async fn record_failure<'e, E>(
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
        error: &str,
    ) -> Result<i32, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let row: (i32,) = sqlx::query_as(
            r#"
            UPDATE webhooks
            SET failure_count = failure_count + 1,
                last_error = $4,
                last_triggered_at = $3,
                updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            RETURNING failure_count
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(at)
        .bind(error)
        .fetch_one(executor)
        .await?;

        Ok(row.0)
    }

    /// Reactivate a webhook: set active, reset the failure counter, clear
    /// the last error.
    pub async fn reactivate<'e, E>(
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r#"
            UPDATE webhooks
            SET is_active = TRUE,
                failure_count = 0,
                last_error = NULL,
                updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Apply a partial update. Fields left as `None` keep their value.
    pub async fn update<'e, E>(
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateWebhook,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query_as(
            r#"
            UPDATE webhooks
            SET name = COALESCE($3, name),
                url = COALESCE($4, url),
                events = COALESCE($5, events),
                is_active = COALESCE($6, is_active),
                updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(input.name)
        .bind(input.url)
        .bind(input.events)
        .bind(input.is_active)
        .fetch_optional(executor)
        .await
    }

    /// Delete a webhook registration. Returns whether a row was removed.
    /// Delivery log entries are not touched.
    pub async fn delete<'e, E>(executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM webhooks
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
