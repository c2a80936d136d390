//! Shared test fixtures: an in-memory store and webhook builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use mawared_db::models::{CreateWebhook, CreateWebhookLog, UpdateWebhook, Webhook, WebhookLog};
use mawared_webhooks::crypto;
use mawared_webhooks::error::WebhookError;
use mawared_webhooks::executor::DeliveryExecutor;
use mawared_webhooks::store::{DeliveryLog, RegistrationStore};
use mawared_webhooks::Dispatcher;

/// Fixed encryption key for tests.
pub fn test_key() -> Vec<u8> {
    vec![7u8; 32]
}

/// Fixed signing secret for tests.
pub const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

/// In-memory store implementing both persistence traits.
#[derive(Default)]
pub struct MemoryStore {
    webhooks: Mutex<HashMap<Uuid, Webhook>>,
    logs: Mutex<Vec<WebhookLog>>,
    fail_lookups: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent store read fail, to exercise error paths.
    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }

    /// Insert a pre-built webhook directly.
    pub fn insert(&self, webhook: Webhook) {
        self.webhooks
            .lock()
            .unwrap()
            .insert(webhook.id, webhook);
    }

    /// Snapshot of a webhook's current state.
    pub fn get(&self, id: Uuid) -> Option<Webhook> {
        self.webhooks.lock().unwrap().get(&id).cloned()
    }

    /// All log entries, in append order.
    pub fn all_logs(&self) -> Vec<WebhookLog> {
        self.logs.lock().unwrap().clone()
    }

    /// Log entries for one webhook, in append order.
    pub fn logs_for(&self, webhook_id: Uuid) -> Vec<WebhookLog> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.webhook_id == webhook_id)
            .cloned()
            .collect()
    }

    fn check_available(&self) -> Result<(), WebhookError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(WebhookError::Internal("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn create(&self, input: CreateWebhook) -> Result<Webhook, WebhookError> {
        self.check_available()?;
        let now = Utc::now();
        let webhook = Webhook {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            name: input.name,
            url: input.url,
            secret_encrypted: input.secret_encrypted,
            events: input.events,
            is_active: true,
            failure_count: 0,
            last_error: None,
            last_triggered_at: None,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };
        self.insert(webhook.clone());
        Ok(webhook)
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Webhook>, WebhookError> {
        self.check_available()?;
        Ok(self
            .webhooks
            .lock()
            .unwrap()
            .get(&id)
            .filter(|w| w.tenant_id == tenant_id)
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
        active: Option<bool>,
    ) -> Result<Vec<Webhook>, WebhookError> {
        self.check_available()?;
        let mut items: Vec<Webhook> = self
            .webhooks
            .lock()
            .unwrap()
            .values()
            .filter(|w| w.tenant_id == tenant_id)
            .filter(|w| active.map_or(true, |a| w.is_active == a))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, tenant_id: Uuid, active: Option<bool>) -> Result<i64, WebhookError> {
        self.check_available()?;
        Ok(self
            .webhooks
            .lock()
            .unwrap()
            .values()
            .filter(|w| w.tenant_id == tenant_id)
            .filter(|w| active.map_or(true, |a| w.is_active == a))
            .count() as i64)
    }

    async fn list_eligible(
        &self,
        tenant_id: Uuid,
        event_type: &str,
        threshold: i32,
    ) -> Result<Vec<Webhook>, WebhookError> {
        self.check_available()?;
        Ok(self
            .webhooks
            .lock()
            .unwrap()
            .values()
            .filter(|w| {
                w.tenant_id == tenant_id
                    && w.is_active
                    && w.events.iter().any(|e| e == event_type)
                    && w.failure_count < threshold
            })
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateWebhook,
    ) -> Result<Option<Webhook>, WebhookError> {
        self.check_available()?;
        let mut webhooks = self.webhooks.lock().unwrap();
        let Some(webhook) = webhooks.get_mut(&id).filter(|w| w.tenant_id == tenant_id) else {
            return Ok(None);
        };
        if let Some(name) = input.name {
            webhook.name = name;
        }
        if let Some(url) = input.url {
            webhook.url = url;
        }
        if let Some(events) = input.events {
            webhook.events = events;
        }
        if let Some(is_active) = input.is_active {
            webhook.is_active = is_active;
        }
        webhook.updated_at = Utc::now();
        Ok(Some(webhook.clone()))
    }

    async fn record_success(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), WebhookError> {
        let mut webhooks = self.webhooks.lock().unwrap();
        if let Some(webhook) = webhooks.get_mut(&id).filter(|w| w.tenant_id == tenant_id) {
            webhook.failure_count = 0;
            webhook.last_error = None;
            webhook.last_triggered_at = Some(at);
            webhook.updated_at = at;
        }
        Ok(())
    }

    async fn record_failure(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
        error: &str,
    ) -> Result<i32, WebhookError> {
        let mut webhooks = self.webhooks.lock().unwrap();
        let Some(webhook) = webhooks.get_mut(&id).filter(|w| w.tenant_id == tenant_id) else {
            return Err(WebhookError::WebhookNotFound);
        };
        webhook.failure_count += 1;
        webhook.last_error = Some(error.to_string());
        webhook.last_triggered_at = Some(at);
        webhook.updated_at = at;
        Ok(webhook.failure_count)
    }

    async fn reactivate(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Webhook>, WebhookError> {
        let mut webhooks = self.webhooks.lock().unwrap();
        let Some(webhook) = webhooks.get_mut(&id).filter(|w| w.tenant_id == tenant_id) else {
            return Ok(None);
        };
        webhook.is_active = true;
        webhook.failure_count = 0;
        webhook.last_error = None;
        webhook.updated_at = Utc::now();
        Ok(Some(webhook.clone()))
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, WebhookError> {
        let mut webhooks = self.webhooks.lock().unwrap();
        match webhooks.get(&id) {
            Some(w) if w.tenant_id == tenant_id => {
                webhooks.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl DeliveryLog for MemoryStore {
    async fn append(&self, input: CreateWebhookLog) -> Result<WebhookLog, WebhookError> {
        let entry = WebhookLog {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            webhook_id: input.webhook_id,
            event: input.event,
            payload: input.payload,
            status_code: input.status_code,
            response_body: input.response_body,
            duration_ms: input.duration_ms,
            is_success: input.is_success,
            error_message: input.error_message,
            created_at: Utc::now(),
        };
        self.logs.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        webhook_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WebhookLog>, WebhookError> {
        let mut items: Vec<WebhookLog> = self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.tenant_id == tenant_id && l.webhook_id == webhook_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, tenant_id: Uuid, webhook_id: Uuid) -> Result<i64, WebhookError> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.tenant_id == tenant_id && l.webhook_id == webhook_id)
            .count() as i64)
    }

    async fn prune(
        &self,
        tenant_id: Uuid,
        older_than: DateTime<Utc>,
    ) -> Result<u64, WebhookError> {
        let mut logs = self.logs.lock().unwrap();
        let before = logs.len();
        logs.retain(|l| l.tenant_id != tenant_id || l.created_at >= older_than);
        Ok((before - logs.len()) as u64)
    }
}

/// Build a webhook registration pointing at `url`, secret encrypted with
/// the test key.
pub fn make_webhook(tenant_id: Uuid, url: &str, events: &[&str]) -> Webhook {
    let now = Utc::now();
    Webhook {
        id: Uuid::new_v4(),
        tenant_id,
        name: "test webhook".to_string(),
        url: url.to_string(),
        secret_encrypted: crypto::encrypt_secret(TEST_SECRET, &test_key())
            .expect("encrypt test secret"),
        events: events.iter().map(|e| e.to_string()).collect(),
        is_active: true,
        failure_count: 0,
        last_error: None,
        last_triggered_at: None,
        created_by: None,
        created_at: now,
        updated_at: now,
    }
}

/// Build a dispatcher over the in-memory store with the test key.
pub fn make_dispatcher(store: Arc<MemoryStore>) -> Dispatcher {
    let executor = DeliveryExecutor::new(test_key()).expect("build executor");
    Dispatcher::new(store.clone(), store, executor)
}

/// Build a dispatcher with a short delivery timeout.
pub fn make_dispatcher_with_timeout(
    store: Arc<MemoryStore>,
    timeout: std::time::Duration,
) -> Dispatcher {
    let executor = DeliveryExecutor::new(test_key())
        .expect("build executor")
        .with_timeout(timeout);
    Dispatcher::new(store.clone(), store, executor)
}
