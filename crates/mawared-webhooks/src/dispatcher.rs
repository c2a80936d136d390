//! Event dispatch: fan-out of one event to all eligible webhooks.
//!
//! The dispatcher resolves eligible registrations through the store (which
//! applies the active/subscribed/healthy filter in its query), runs one
//! delivery executor call per registration concurrently, and records every
//! settled outcome: exactly one delivery log entry plus a success or
//! failure mark on the registration's health bookkeeping.
//!
//! Delivery failures are data, not errors: the producer's call only fails
//! when the store itself does. Cancelling the dispatch future aborts
//! in-flight requests, but outcomes already logged are preserved.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::breaker::DEFAULT_FAILURE_THRESHOLD;
use crate::error::WebhookError;
use crate::executor::{DeliveryExecutor, DeliveryOutcome};
use crate::models::{DispatchSummary, TestDeliveryResponse};
use crate::store::{DeliveryLog, RegistrationStore};
use mawared_db::models::{CreateWebhookLog, Webhook};

/// Default cap on concurrent in-flight HTTP deliveries per dispatch call.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 50;

/// Event type name used for diagnostic test deliveries.
pub const TEST_EVENT: &str = "test";

/// Fans out events to eligible webhook registrations.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn RegistrationStore>,
    log: Arc<dyn DeliveryLog>,
    executor: Arc<DeliveryExecutor>,
    failure_threshold: i32,
    semaphore: Arc<Semaphore>,
}

impl Dispatcher {
    /// Create a dispatcher with default threshold and concurrency cap.
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        log: Arc<dyn DeliveryLog>,
        executor: DeliveryExecutor,
    ) -> Self {
        Self {
            store,
            log,
            executor: Arc::new(executor),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            semaphore: Arc::new(Semaphore::new(DEFAULT_MAX_IN_FLIGHT)),
        }
    }

    /// Set the circuit-breaker failure threshold.
    #[must_use]
    pub fn with_failure_threshold(mut self, threshold: i32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Cap the number of concurrent in-flight deliveries.
    #[must_use]
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.semaphore = Arc::new(Semaphore::new(max));
        self
    }

    /// The configured failure threshold.
    #[must_use]
    pub fn failure_threshold(&self) -> i32 {
        self.failure_threshold
    }

    /// Dispatch an event to every eligible webhook of the tenant.
    ///
    /// Deliveries run concurrently and independently: one endpoint's
    /// slowness or failure never delays another's delivery. The call
    /// returns once all deliveries have settled.
    ///
    /// # Errors
    ///
    /// Only a store lookup failure is an error. Individual delivery
    /// failures are absorbed into the summary counts.
    pub async fn dispatch(
        &self,
        tenant_id: Uuid,
        event_type: &str,
        data: serde_json::Value,
    ) -> Result<DispatchSummary, WebhookError> {
        let eligible = self
            .store
            .list_eligible(tenant_id, event_type, self.failure_threshold)
            .await?;

        if eligible.is_empty() {
            tracing::debug!(
                target: "webhook_delivery",
                %tenant_id,
                event_type,
                "No eligible webhooks for event"
            );
            return Ok(DispatchSummary::default());
        }

        tracing::info!(
            target: "webhook_delivery",
            %tenant_id,
            event_type,
            webhook_count = eligible.len(),
            "Dispatching event to eligible webhooks"
        );

        let attempted = eligible.len();
        let mut tasks = JoinSet::new();

        for webhook in eligible {
            let executor = Arc::clone(&self.executor);
            let store = Arc::clone(&self.store);
            let log = Arc::clone(&self.log);
            let semaphore = Arc::clone(&self.semaphore);
            let event_type = event_type.to_string();
            let data = data.clone();
            let threshold = self.failure_threshold;

            tasks.spawn(async move {
                // Closed only if the semaphore is dropped, which cannot
                // happen while this task holds a clone.
                let _permit = semaphore.acquire().await.expect("semaphore closed");

                let outcome = executor.deliver(&webhook, &event_type, data).await;
                record_outcome(&*store, &*log, &webhook, &event_type, &outcome, threshold).await;
                outcome.success
            });
        }

        let mut succeeded = 0usize;
        let mut failed = 0usize;
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(true) => succeeded += 1,
                Ok(false) => failed += 1,
                Err(e) => {
                    tracing::error!(
                        target: "webhook_delivery",
                        error = %e,
                        "Delivery task panicked"
                    );
                    failed += 1;
                }
            }
        }

        Ok(DispatchSummary {
            attempted,
            succeeded,
            failed,
        })
    }

    /// Perform a synchronous diagnostic delivery to a single webhook,
    /// bypassing the suspended-exclusion filter.
    ///
    /// The attempt is logged and health-tracked like any other, so a
    /// successful probe resets the failure counter and restores the
    /// webhook's eligibility for automatic dispatch.
    pub async fn test_delivery(
        &self,
        tenant_id: Uuid,
        webhook_id: Uuid,
    ) -> Result<TestDeliveryResponse, WebhookError> {
        let webhook = self
            .store
            .find(tenant_id, webhook_id)
            .await?
            .ok_or(WebhookError::WebhookNotFound)?;

        let data = serde_json::json!({
            "test": true,
            "message": "Webhook test delivery",
            "timestamp": Utc::now(),
        });

        let outcome = self.executor.deliver(&webhook, TEST_EVENT, data).await;
        record_outcome(
            &*self.store,
            &*self.log,
            &webhook,
            TEST_EVENT,
            &outcome,
            self.failure_threshold,
        )
        .await;

        Ok(TestDeliveryResponse {
            success: outcome.success,
            status_code: outcome.status_code,
            duration_ms: outcome.duration_ms,
            error_message: outcome.error_message,
        })
    }
}

/// Record a settled delivery outcome: one log entry, then the health mark.
///
/// Store write failures here are logged and swallowed — the delivery
/// already happened and must not be reported as undone.
async fn record_outcome(
    store: &dyn RegistrationStore,
    log: &dyn DeliveryLog,
    webhook: &Webhook,
    event_type: &str,
    outcome: &DeliveryOutcome,
    threshold: i32,
) {
    let now = Utc::now();

    if let Err(e) = log
        .append(CreateWebhookLog {
            tenant_id: webhook.tenant_id,
            webhook_id: webhook.id,
            event: event_type.to_string(),
            payload: outcome.payload.clone(),
            status_code: outcome.status_code,
            response_body: outcome.response_excerpt.clone(),
            duration_ms: outcome.duration_ms,
            is_success: outcome.success,
            error_message: outcome.error_message.clone(),
        })
        .await
    {
        tracing::error!(
            target: "webhook_delivery",
            webhook_id = %webhook.id,
            delivery_id = %outcome.delivery_id,
            error = %e,
            "Failed to append delivery log entry"
        );
    }

    if outcome.success {
        tracing::info!(
            target: "webhook_delivery",
            webhook_id = %webhook.id,
            tenant_id = %webhook.tenant_id,
            delivery_id = %outcome.delivery_id,
            event_type,
            status_code = outcome.status_code,
            duration_ms = outcome.duration_ms,
            "Webhook delivery succeeded"
        );

        if let Err(e) = store
            .record_success(webhook.tenant_id, webhook.id, now)
            .await
        {
            tracing::error!(
                target: "webhook_delivery",
                webhook_id = %webhook.id,
                error = %e,
                "Failed to record delivery success"
            );
        }
    } else {
        let error_text = outcome
            .error_message
            .as_deref()
            .unwrap_or("Delivery failed");

        tracing::warn!(
            target: "webhook_delivery",
            webhook_id = %webhook.id,
            tenant_id = %webhook.tenant_id,
            delivery_id = %outcome.delivery_id,
            event_type,
            status_code = outcome.status_code,
            duration_ms = outcome.duration_ms,
            error = error_text,
            "Webhook delivery failed"
        );

        match store
            .record_failure(webhook.tenant_id, webhook.id, now, error_text)
            .await
        {
            Ok(failures) if failures >= threshold => {
                tracing::warn!(
                    target: "webhook_delivery",
                    webhook_id = %webhook.id,
                    tenant_id = %webhook.tenant_id,
                    failure_count = failures,
                    threshold,
                    "Webhook suspended after consecutive failures"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(
                    target: "webhook_delivery",
                    webhook_id = %webhook.id,
                    error = %e,
                    "Failed to record delivery failure"
                );
            }
        }
    }
}
