//! Outbound webhook event dispatch for the Mawared platform.
//!
//! Tenants register HTTPS endpoints subscribed to platform events. When an
//! event fires, the dispatcher fans it out concurrently to every eligible
//! registration, signing each payload with HMAC-SHA256 and recording every
//! attempt in a delivery log. Endpoints that fail ten deliveries in a row
//! are suspended until an operator re-enables them or a test delivery
//! succeeds.
//!
//! # Components
//!
//! - [`Dispatcher`]: concurrent fan-out of one event to all eligible
//!   webhooks, with per-endpoint health bookkeeping.
//! - [`DeliveryExecutor`]: one signed HTTP POST per attempt, with a hard
//!   timeout and outcome classification.
//! - [`WebhookService`]: registration CRUD for the management API.
//! - [`webhooks_router`]: axum routes exposing the management API.
//! - [`RegistrationStore`] / [`DeliveryLog`]: persistence seams, implemented
//!   for Postgres by [`PgStore`].

pub mod breaker;
pub mod crypto;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;
pub mod validation;

pub use breaker::{HealthState, DEFAULT_FAILURE_THRESHOLD};
pub use dispatcher::{Dispatcher, DEFAULT_MAX_IN_FLIGHT};
pub use error::{ApiResult, WebhookError};
pub use executor::{DeliveryExecutor, DeliveryOutcome, DELIVERY_TIMEOUT};
pub use models::{DispatchSummary, EventEnvelope, WebhookEventType};
pub use router::{webhooks_router, TenantContext, WebhooksState};
pub use services::WebhookService;
pub use store::{DeliveryLog, PgStore, RegistrationStore};
