//! Business-logic services for the management API.

pub mod webhook_service;

pub use webhook_service::WebhookService;
