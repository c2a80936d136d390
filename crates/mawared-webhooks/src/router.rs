//! Router and shared state for the webhook management API.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use uuid::Uuid;

use crate::dispatcher::Dispatcher;
use crate::handlers::{logs, webhooks};
use crate::services::WebhookService;

/// Tenant identity for a request, installed as a request extension by the
/// enclosing API layer after authentication.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext {
    /// Tenant the request operates on. Mandatory; there is no cross-tenant
    /// access.
    pub tenant_id: Uuid,
    /// Authenticated user, when known, recorded as the creator of new
    /// registrations.
    pub user_id: Option<Uuid>,
}

impl TenantContext {
    /// Context for a tenant with no acting user.
    #[must_use]
    pub fn new(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            user_id: None,
        }
    }
}

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct WebhooksState {
    pub webhook_service: Arc<WebhookService>,
    pub dispatcher: Arc<Dispatcher>,
}

/// Build the webhook management router.
///
/// Routes are nested under the caller's API prefix; the enclosing layer is
/// responsible for authentication and for installing [`TenantContext`].
pub fn webhooks_router(state: WebhooksState) -> Router {
    Router::new()
        .route(
            "/webhooks",
            post(webhooks::create_webhook).get(webhooks::list_webhooks),
        )
        .route("/webhooks/events", get(webhooks::list_event_types))
        .route(
            "/webhooks/:id",
            get(webhooks::get_webhook)
                .patch(webhooks::update_webhook)
                .delete(webhooks::delete_webhook),
        )
        .route("/webhooks/:id/test", post(webhooks::test_webhook))
        .route("/webhooks/:id/logs", get(logs::list_webhook_logs))
        .with_state(state)
}
