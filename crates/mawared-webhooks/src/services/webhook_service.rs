//! Webhook registration CRUD service.
//!
//! Business logic for creating, listing, updating, and deleting webhook
//! registrations: URL and SSRF validation, event type validation, secret
//! generation and encryption at rest, and the per-tenant registration cap.

use std::sync::Arc;

use uuid::Uuid;

use crate::breaker::{HealthState, DEFAULT_FAILURE_THRESHOLD};
use crate::crypto;
use crate::error::WebhookError;
use crate::models::{
    CreateWebhookRequest, ListLogsQuery, ListWebhooksQuery, UpdateWebhookRequest,
    WebhookCreatedResponse, WebhookDetailResponse, WebhookListResponse, WebhookLogListResponse,
    WebhookLogResponse, WebhookResponse,
};
use crate::store::{DeliveryLog, RegistrationStore};
use crate::validation;
use mawared_db::models::{CreateWebhook, UpdateWebhook, Webhook, WebhookLog};

/// Default maximum registrations per tenant.
pub const DEFAULT_MAX_WEBHOOKS: i64 = 25;

/// Number of recent log entries included in the detail response.
const RECENT_LOG_COUNT: i64 = 20;

/// Service for webhook registration management.
#[derive(Clone)]
pub struct WebhookService {
    store: Arc<dyn RegistrationStore>,
    log: Arc<dyn DeliveryLog>,
    encryption_key: Vec<u8>,
    max_webhooks: i64,
    allow_http: bool,
    failure_threshold: i32,
}

impl WebhookService {
    /// Create a new service.
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        log: Arc<dyn DeliveryLog>,
        encryption_key: Vec<u8>,
    ) -> Self {
        Self {
            store,
            log,
            encryption_key,
            max_webhooks: DEFAULT_MAX_WEBHOOKS,
            allow_http: false,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }

    /// Set the maximum registrations per tenant.
    #[must_use]
    pub fn with_max_webhooks(mut self, max: i64) -> Self {
        self.max_webhooks = max;
        self
    }

    /// Allow HTTP URLs (for development/testing).
    #[must_use]
    pub fn with_allow_http(mut self, allow: bool) -> Self {
        self.allow_http = allow;
        self
    }

    /// Set the failure threshold used to derive health in responses.
    #[must_use]
    pub fn with_failure_threshold(mut self, threshold: i32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Create a new webhook registration.
    ///
    /// Generates a signing secret when the request does not supply one.
    /// The returned response is the only place the plaintext secret ever
    /// appears.
    pub async fn create_webhook(
        &self,
        tenant_id: Uuid,
        created_by: Option<Uuid>,
        request: CreateWebhookRequest,
    ) -> Result<WebhookCreatedResponse, WebhookError> {
        validation::validate_webhook_url(&request.url, self.allow_http)?;
        validation::validate_event_types(&request.events)?;

        let count = self.store.count(tenant_id, None).await?;
        if count >= self.max_webhooks {
            return Err(WebhookError::WebhookLimitExceeded {
                limit: self.max_webhooks,
            });
        }

        let secret = match request.secret {
            Some(s) if !s.is_empty() => s,
            _ => crypto::generate_secret(),
        };
        let secret_encrypted = crypto::encrypt_secret(&secret, &self.encryption_key)?;

        let webhook = self
            .store
            .create(CreateWebhook {
                tenant_id,
                name: request.name,
                url: request.url,
                secret_encrypted,
                events: request.events,
                created_by,
            })
            .await?;

        tracing::info!(
            target: "webhook_admin",
            webhook_id = %webhook.id,
            %tenant_id,
            "Webhook registration created"
        );

        Ok(WebhookCreatedResponse {
            webhook: self.to_response(webhook),
            secret,
        })
    }

    /// List webhook registrations for a tenant with pagination.
    pub async fn list_webhooks(
        &self,
        tenant_id: Uuid,
        query: ListWebhooksQuery,
    ) -> Result<WebhookListResponse, WebhookError> {
        let limit = query.limit.clamp(1, 100);
        let offset = query.offset.max(0);

        let webhooks = self
            .store
            .list(tenant_id, limit, offset, query.active)
            .await?;
        let total = self.store.count(tenant_id, query.active).await?;

        Ok(WebhookListResponse {
            items: webhooks.into_iter().map(|w| self.to_response(w)).collect(),
            total,
            limit,
            offset,
        })
    }

    /// Get a single registration with its last 20 delivery attempts.
    pub async fn get_webhook(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<WebhookDetailResponse, WebhookError> {
        let webhook = self
            .store
            .find(tenant_id, id)
            .await?
            .ok_or(WebhookError::WebhookNotFound)?;

        let recent = self.log.list(tenant_id, id, RECENT_LOG_COUNT, 0).await?;

        Ok(WebhookDetailResponse {
            webhook: self.to_response(webhook),
            recent_logs: recent.into_iter().map(log_to_response).collect(),
        })
    }

    /// Update a webhook registration.
    ///
    /// Setting `active = true` also resets the failure counter and clears
    /// the last error, returning the registration to the healthy state.
    pub async fn update_webhook(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        request: UpdateWebhookRequest,
    ) -> Result<WebhookResponse, WebhookError> {
        if let Some(ref url) = request.url {
            validation::validate_webhook_url(url, self.allow_http)?;
        }
        if let Some(ref events) = request.events {
            validation::validate_event_types(events)?;
        }

        let reactivating = request.active == Some(true);

        let updated = self
            .store
            .update(
                tenant_id,
                id,
                UpdateWebhook {
                    name: request.name,
                    url: request.url,
                    events: request.events,
                    is_active: request.active,
                },
            )
            .await?
            .ok_or(WebhookError::WebhookNotFound)?;

        let webhook = if reactivating {
            self.store
                .reactivate(tenant_id, id)
                .await?
                .ok_or(WebhookError::WebhookNotFound)?
        } else {
            updated
        };

        Ok(self.to_response(webhook))
    }

    /// Delete a webhook registration. Delivery history is retained.
    pub async fn delete_webhook(&self, tenant_id: Uuid, id: Uuid) -> Result<(), WebhookError> {
        if !self.store.delete(tenant_id, id).await? {
            return Err(WebhookError::WebhookNotFound);
        }

        tracing::info!(
            target: "webhook_admin",
            webhook_id = %id,
            %tenant_id,
            "Webhook registration deleted"
        );
        Ok(())
    }

    /// Paginated delivery history for a registration.
    pub async fn list_logs(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        query: ListLogsQuery,
    ) -> Result<WebhookLogListResponse, WebhookError> {
        // Verify ownership before exposing history
        self.store
            .find(tenant_id, id)
            .await?
            .ok_or(WebhookError::WebhookNotFound)?;

        let limit = query.limit.clamp(1, 100);
        let offset = query.offset.max(0);

        let logs = self.log.list(tenant_id, id, limit, offset).await?;
        let total = self.log.count(tenant_id, id).await?;

        Ok(WebhookLogListResponse {
            items: logs.into_iter().map(log_to_response).collect(),
            total,
            limit,
            offset,
        })
    }

    /// Convert a store model to an API response. The secret never leaves
    /// the store representation.
    fn to_response(&self, webhook: Webhook) -> WebhookResponse {
        let health =
            HealthState::from_failure_count(webhook.failure_count, self.failure_threshold);

        WebhookResponse {
            id: webhook.id,
            name: webhook.name,
            url: webhook.url,
            events: webhook.events,
            active: webhook.is_active,
            failure_count: webhook.failure_count,
            last_error: webhook.last_error,
            last_triggered_at: webhook.last_triggered_at,
            health,
            created_at: webhook.created_at,
            updated_at: webhook.updated_at,
        }
    }
}

/// Convert a log model to an API response.
fn log_to_response(log: WebhookLog) -> WebhookLogResponse {
    WebhookLogResponse {
        id: log.id,
        webhook_id: log.webhook_id,
        event: log.event,
        payload: log.payload,
        status_code: log.status_code,
        response_body: log.response_body,
        duration_ms: log.duration_ms,
        success: log.is_success,
        error_message: log.error_message,
        created_at: log.created_at,
    }
}
