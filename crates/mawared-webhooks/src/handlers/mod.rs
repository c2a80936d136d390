//! Axum handlers for the webhook management API.

pub mod logs;
pub mod webhooks;
