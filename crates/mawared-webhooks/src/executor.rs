//! Delivery execution: one signed HTTP POST per attempt.
//!
//! The executor builds the event envelope, signs it, performs the request
//! under a hard timeout, and classifies the outcome. It never touches the
//! store; recording outcomes is the dispatcher's job, which keeps this
//! component independently testable.

use std::time::{Duration, Instant};

use reqwest::Client;
use uuid::Uuid;

use crate::crypto;
use crate::error::WebhookError;
use crate::models::EventEnvelope;
use mawared_db::models::Webhook;

/// Hard timeout for the whole request/response cycle.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Response bodies are truncated to this many characters for diagnostics.
pub const RESPONSE_EXCERPT_CHARS: usize = 1000;

/// Header carrying the event type name.
pub const HEADER_EVENT: &str = "X-Webhook-Event";

/// Header carrying the hex-encoded HMAC-SHA256 signature of the body.
pub const HEADER_SIGNATURE: &str = "X-Webhook-Signature";

/// Header carrying the unique delivery identifier (for receiver-side
/// de-duplication).
pub const HEADER_DELIVERY_ID: &str = "X-Webhook-Delivery";

/// The classified result of a single delivery attempt.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    /// Unique id of this attempt, also sent in the delivery header.
    pub delivery_id: Uuid,
    /// Whether the endpoint acknowledged with a 2xx status.
    pub success: bool,
    /// HTTP status code; absent when the request never completed.
    pub status_code: Option<i16>,
    /// Response body excerpt (first 1000 characters).
    pub response_excerpt: Option<String>,
    /// Wall-clock duration of the attempt.
    pub duration_ms: i32,
    /// Error description for failed attempts.
    pub error_message: Option<String>,
    /// The exact envelope that was sent, for the log snapshot.
    pub payload: serde_json::Value,
}

/// Executes signed webhook deliveries over a shared HTTP client.
#[derive(Clone)]
pub struct DeliveryExecutor {
    http_client: Client,
    encryption_key: Vec<u8>,
    timeout: Duration,
}

impl DeliveryExecutor {
    /// Create a new executor with a shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::Internal`] if the HTTP client cannot be built.
    pub fn new(encryption_key: Vec<u8>) -> Result<Self, WebhookError> {
        let http_client = Client::builder()
            .user_agent("mawared-webhooks/1.0")
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| WebhookError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            encryption_key,
            timeout: DELIVERY_TIMEOUT,
        })
    }

    /// Override the delivery timeout (used by tests).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Perform exactly one delivery attempt to a webhook's URL.
    ///
    /// Builds the envelope `{event, timestamp, data}`, signs its serialized
    /// bytes with the webhook's secret, POSTs, and classifies the result.
    /// Performs exactly one outbound call and no store mutations.
    pub async fn deliver(
        &self,
        webhook: &Webhook,
        event_type: &str,
        data: serde_json::Value,
    ) -> DeliveryOutcome {
        let delivery_id = Uuid::new_v4();
        let envelope = EventEnvelope::new(event_type, data);

        let payload = serde_json::to_value(&envelope).unwrap_or_default();
        let body = match serde_json::to_vec(&envelope) {
            Ok(b) => b,
            Err(e) => {
                return DeliveryOutcome {
                    delivery_id,
                    success: false,
                    status_code: None,
                    response_excerpt: None,
                    duration_ms: 0,
                    error_message: Some(format!("Failed to serialize payload: {e}")),
                    payload,
                };
            }
        };

        let mut request = self
            .http_client
            .post(&webhook.url)
            .timeout(self.timeout)
            .header("Content-Type", "application/json")
            .header(HEADER_DELIVERY_ID, delivery_id.to_string());

        match event_type.parse::<reqwest::header::HeaderValue>() {
            Ok(v) => {
                request = request.header(HEADER_EVENT, v);
            }
            Err(_) => {
                tracing::warn!(
                    target: "webhook_delivery",
                    webhook_id = %webhook.id,
                    delivery_id = %delivery_id,
                    event_type,
                    "Event type is not a valid header value — delivering without event header"
                );
            }
        }

        match crypto::decrypt_secret(&webhook.secret_encrypted, &self.encryption_key) {
            Ok(secret) => {
                let signature = crypto::compute_signature(&secret, &body);
                request = request.header(HEADER_SIGNATURE, signature);
            }
            Err(e) => {
                tracing::warn!(
                    target: "webhook_delivery",
                    webhook_id = %webhook.id,
                    delivery_id = %delivery_id,
                    error = %e,
                    "Failed to decrypt webhook secret — delivering without signature"
                );
            }
        }

        let start = Instant::now();
        let result = request.body(body).send().await;
        let duration_ms = start.elapsed().as_millis() as i32;

        match result {
            Ok(response) => {
                let status = response.status();
                let status_code = status.as_u16() as i16;
                let excerpt = truncate_chars(
                    &response.text().await.unwrap_or_default(),
                    RESPONSE_EXCERPT_CHARS,
                );

                if status.is_success() {
                    DeliveryOutcome {
                        delivery_id,
                        success: true,
                        status_code: Some(status_code),
                        response_excerpt: Some(excerpt),
                        duration_ms,
                        error_message: None,
                        payload,
                    }
                } else {
                    DeliveryOutcome {
                        delivery_id,
                        success: false,
                        status_code: Some(status_code),
                        response_excerpt: Some(excerpt),
                        duration_ms,
                        error_message: Some(format!("HTTP {status_code}")),
                        payload,
                    }
                }
            }
            Err(e) => {
                let error_message = if e.is_timeout() {
                    format!("Request timeout ({}s)", self.timeout.as_secs())
                } else if e.is_connect() {
                    format!("Connection failed: {e}")
                } else {
                    format!("Request error: {e}")
                };

                DeliveryOutcome {
                    delivery_id,
                    success: false,
                    status_code: None,
                    response_excerpt: None,
                    duration_ms,
                    error_message: Some(error_message),
                    payload,
                }
            }
        }
    }
}

/// Truncate a string to at most `max` characters (not bytes).
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_short_string() {
        assert_eq!(truncate_chars("hello", 1000), "hello");
    }

    #[test]
    fn test_truncate_chars_long_string() {
        let long = "x".repeat(5000);
        assert_eq!(truncate_chars(&long, RESPONSE_EXCERPT_CHARS).len(), 1000);
    }

    #[test]
    fn test_truncate_chars_multibyte_boundary() {
        // 3-byte characters; truncation counts characters, not bytes
        let s = "é".repeat(10);
        assert_eq!(truncate_chars(&s, 4).chars().count(), 4);
    }

    #[test]
    fn test_delivery_timeout_is_ten_seconds() {
        assert_eq!(DELIVERY_TIMEOUT.as_secs(), 10);
    }
}
