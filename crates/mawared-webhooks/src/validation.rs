//! Registration-time validation for webhook URLs and event subscriptions.
//!
//! Invalid URLs are a configuration error: they are rejected synchronously
//! at creation/update time and never reach the delivery path.

use std::net::IpAddr;

use crate::error::WebhookError;
use crate::models::WebhookEventType;

/// Validate a webhook delivery URL.
///
/// Checks that the URL parses, uses HTTPS (HTTP only when `allow_http` is
/// set for dev/test), and does not point at a private or internal host.
pub fn validate_webhook_url(url: &str, allow_http: bool) -> Result<(), WebhookError> {
    let parsed = url::Url::parse(url)
        .map_err(|e| WebhookError::InvalidUrl(format!("Invalid URL format: {e}")))?;

    match parsed.scheme() {
        "https" => {}
        "http" if allow_http => {}
        "http" => {
            return Err(WebhookError::InvalidUrl(
                "Webhook URLs must use HTTPS".to_string(),
            ));
        }
        scheme => {
            return Err(WebhookError::InvalidUrl(format!(
                "Unsupported URL scheme: {scheme}"
            )));
        }
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| WebhookError::InvalidUrl("URL must have a host".to_string()))?;

    validate_host_not_internal(host)
}

/// Reject hosts that resolve into private or internal address space.
///
/// Blocks loopback, RFC 1918 ranges, link-local (cloud metadata endpoints),
/// CGNAT, IPv6 loopback/unspecified, and well-known internal hostnames.
pub fn validate_host_not_internal(host: &str) -> Result<(), WebhookError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_internal_ip(&ip) {
            return Err(WebhookError::SsrfDetected(format!(
                "Destination host {host} is a private/internal address"
            )));
        }
    }

    let lower = host.to_ascii_lowercase();
    if lower == "localhost"
        || lower == "metadata.google.internal"
        || lower.ends_with(".internal")
        || lower.ends_with(".local")
    {
        return Err(WebhookError::SsrfDetected(format!(
            "Destination host {host} is a restricted internal hostname"
        )));
    }

    Ok(())
}

fn is_internal_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (CGNAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}

/// Validate that every subscribed event name is a recognized event type.
pub fn validate_event_types(events: &[String]) -> Result<(), WebhookError> {
    for event in events {
        if WebhookEventType::parse(event).is_none() {
            return Err(WebhookError::Validation(format!(
                "Unknown event type: {event}"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
