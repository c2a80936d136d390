//! Threshold-based circuit breaking for webhook endpoints.
//!
//! This is an embedded policy, not a separate service: the failure counter
//! lives on the registration row, the store's eligibility query excludes
//! registrations at or above the threshold, and this module only defines
//! the threshold and the derived health state.
//!
//! There is no time-windowed half-open state. A suspended webhook recovers
//! only through explicit reactivation or a successful test delivery, both
//! of which reset the counter to zero.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Consecutive failures after which automatic delivery stops.
pub const DEFAULT_FAILURE_THRESHOLD: i32 = 10;

/// Derived health of a webhook registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// Failure count below the threshold; eligible for automatic delivery.
    Healthy,
    /// Failure count at or above the threshold; excluded from automatic
    /// delivery until manually recovered.
    Suspended,
}

impl HealthState {
    /// Derive the health state from a failure count.
    #[must_use]
    pub fn from_failure_count(failure_count: i32, threshold: i32) -> Self {
        if failure_count >= threshold {
            Self::Suspended
        } else {
            Self::Healthy
        }
    }

    /// String representation used in API responses.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Suspended => "suspended",
        }
    }

    /// Whether automatic deliveries may proceed.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_below_threshold() {
        let state = HealthState::from_failure_count(0, DEFAULT_FAILURE_THRESHOLD);
        assert_eq!(state, HealthState::Healthy);
        assert!(state.is_healthy());

        let state = HealthState::from_failure_count(9, DEFAULT_FAILURE_THRESHOLD);
        assert_eq!(state, HealthState::Healthy);
    }

    #[test]
    fn test_suspended_at_threshold() {
        let state = HealthState::from_failure_count(10, DEFAULT_FAILURE_THRESHOLD);
        assert_eq!(state, HealthState::Suspended);
        assert!(!state.is_healthy());
    }

    #[test]
    fn test_suspended_above_threshold() {
        let state = HealthState::from_failure_count(42, DEFAULT_FAILURE_THRESHOLD);
        assert_eq!(state, HealthState::Suspended);
    }

    #[test]
    fn test_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(HealthState::Healthy).unwrap(),
            serde_json::json!("healthy")
        );
        assert_eq!(
            serde_json::to_value(HealthState::Suspended).unwrap(),
            serde_json::json!("suspended")
        );
    }
}
