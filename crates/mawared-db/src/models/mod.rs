//! Database models.

pub mod webhook;
pub mod webhook_log;

pub use webhook::{CreateWebhook, UpdateWebhook, Webhook};
pub use webhook_log::{CreateWebhookLog, WebhookLog};
