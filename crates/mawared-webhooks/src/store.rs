//! Data-access interfaces consumed by the dispatch core.
//!
//! The dispatcher and the management services talk to the durable store
//! through these traits so the core stays independent of the persistence
//! layer. [`PgStore`] is the production implementation over the
//! `mawared-db` Postgres models; tests provide in-memory implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::WebhookError;
use mawared_db::models::{CreateWebhook, CreateWebhookLog, UpdateWebhook, Webhook, WebhookLog};

/// Durable store of webhook registrations.
///
/// Every operation is tenant-scoped; the tenant id is a mandatory filter,
/// never optional.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Insert a new registration.
    async fn create(&self, input: CreateWebhook) -> Result<Webhook, WebhookError>;

    /// Load a registration by id, suspended or not.
    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Webhook>, WebhookError>;

    /// List registrations for a tenant, newest first.
    async fn list(
        &self,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
        active: Option<bool>,
    ) -> Result<Vec<Webhook>, WebhookError>;

    /// Count registrations for a tenant.
    async fn count(&self, tenant_id: Uuid, active: Option<bool>) -> Result<i64, WebhookError>;

    /// Registrations eligible for automatic delivery of `event_type`:
    /// active, subscribed, and with a failure count below `threshold`.
    /// The filter is applied by the store, not the caller.
    async fn list_eligible(
        &self,
        tenant_id: Uuid,
        event_type: &str,
        threshold: i32,
    ) -> Result<Vec<Webhook>, WebhookError>;

    /// Apply a partial update.
    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateWebhook,
    ) -> Result<Option<Webhook>, WebhookError>;

    /// Record a successful delivery: reset the failure counter, clear the
    /// last error, stamp the last-triggered time.
    async fn record_success(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), WebhookError>;

    /// Record a failed delivery: atomically increment the failure counter
    /// and store the error text. Returns the new counter value.
    async fn record_failure(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
        error: &str,
    ) -> Result<i32, WebhookError>;

    /// Reactivate a registration, resetting its failure bookkeeping.
    async fn reactivate(&self, tenant_id: Uuid, id: Uuid)
        -> Result<Option<Webhook>, WebhookError>;

    /// Delete a registration. Log history is left untouched.
    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, WebhookError>;
}

/// Append-only record of delivery attempts.
#[async_trait]
pub trait DeliveryLog: Send + Sync {
    /// Append one entry. Called exactly once per settled delivery attempt.
    async fn append(&self, input: CreateWebhookLog) -> Result<WebhookLog, WebhookError>;

    /// List entries for a webhook, newest first.
    async fn list(
        &self,
        tenant_id: Uuid,
        webhook_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WebhookLog>, WebhookError>;

    /// Count entries for a webhook.
    async fn count(&self, tenant_id: Uuid, webhook_id: Uuid) -> Result<i64, WebhookError>;

    /// Delete entries older than the cutoff, for retention jobs. Returns
    /// the number of entries removed.
    async fn prune(&self, tenant_id: Uuid, older_than: DateTime<Utc>)
        -> Result<u64, WebhookError>;
}

// ---------------------------------------------------------------------------
// Postgres implementation
// ---------------------------------------------------------------------------

/// Postgres-backed store over the `mawared-db` models.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RegistrationStore for PgStore {
    async fn create(&self, input: CreateWebhook) -> Result<Webhook, WebhookError> {
        Ok(Webhook::create(&self.pool, input).await?)
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Webhook>, WebhookError> {
        Ok(Webhook::find_by_id(&self.pool, tenant_id, id).await?)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
        active: Option<bool>,
    ) -> Result<Vec<Webhook>, WebhookError> {
        Ok(Webhook::list_by_tenant(&self.pool, tenant_id, limit, offset, active).await?)
    }

    async fn count(&self, tenant_id: Uuid, active: Option<bool>) -> Result<i64, WebhookError> {
        Ok(Webhook::count_by_tenant(&self.pool, tenant_id, active).await?)
    }

    async fn list_eligible(
        &self,
        tenant_id: Uuid,
        event_type: &str,
        threshold: i32,
    ) -> Result<Vec<Webhook>, WebhookError> {
        Ok(Webhook::find_eligible(&self.pool, tenant_id, event_type, threshold).await?)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateWebhook,
    ) -> Result<Option<Webhook>, WebhookError> {
        Ok(Webhook::update(&self.pool, tenant_id, id, input).await?)
    }

    async fn record_success(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), WebhookError> {
        Ok(Webhook::record_success(&self.pool, tenant_id, id, at).await?)
    }

    async fn record_failure(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
        error: &str,
    ) -> Result<i32, WebhookError> {
        Ok(Webhook::record_failure(&self.pool, tenant_id, id, at, error).await?)
    }

    async fn reactivate(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Webhook>, WebhookError> {
        Ok(Webhook::reactivate(&self.pool, tenant_id, id).await?)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, WebhookError> {
        Ok(Webhook::delete(&self.pool, tenant_id, id).await?)
    }
}

#[async_trait]
impl DeliveryLog for PgStore {
    async fn append(&self, input: CreateWebhookLog) -> Result<WebhookLog, WebhookError> {
        Ok(WebhookLog::create(&self.pool, input).await?)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        webhook_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WebhookLog>, WebhookError> {
        Ok(WebhookLog::list_by_webhook(&self.pool, tenant_id, webhook_id, limit, offset).await?)
    }

    async fn count(&self, tenant_id: Uuid, webhook_id: Uuid) -> Result<i64, WebhookError> {
        Ok(WebhookLog::count_by_webhook(&self.pool, tenant_id, webhook_id).await?)
    }

    async fn prune(
        &self,
        tenant_id: Uuid,
        older_than: DateTime<Utc>,
    ) -> Result<u64, WebhookError> {
        Ok(WebhookLog::delete_older_than(&self.pool, tenant_id, older_than).await?)
    }
}
