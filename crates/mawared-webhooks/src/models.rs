//! Domain and API types for the webhook subsystem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::breaker::HealthState;

// ---------------------------------------------------------------------------
// Event envelope
// ---------------------------------------------------------------------------

/// The canonical structure serialized, signed, and transmitted to endpoints.
///
/// The HMAC signature is computed over the serialized bytes of this
/// envelope, and those exact bytes are stored as the payload snapshot in
/// the delivery log.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventEnvelope {
    /// Event type name, e.g. `task.created`.
    pub event: String,
    /// Dispatch time (RFC 3339).
    pub timestamp: DateTime<Utc>,
    /// Arbitrary JSON payload supplied by the event producer.
    pub data: serde_json::Value,
}

impl EventEnvelope {
    /// Build an envelope stamped with the current time.
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            timestamp: Utc::now(),
            data,
        }
    }
}

// ---------------------------------------------------------------------------
// Event type catalog
// ---------------------------------------------------------------------------

/// All event types the platform emits webhooks for.
///
/// The category is the part of the name before the first `.`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEventType {
    TaskCreated,
    TaskUpdated,
    TaskCompleted,
    TaskDeleted,
    TaskAssigned,
    TaskComment,
    ProjectCreated,
    ProjectUpdated,
    ProjectCompleted,
    TeamMemberAdded,
    TeamMemberRemoved,
    ReleaseCreated,
    ReleasePublished,
    EmployeeCreated,
    EmployeeUpdated,
    AttendanceCheckin,
    AttendanceCheckout,
    LeaveRequested,
    LeaveApproved,
}

impl WebhookEventType {
    /// The wire name of this event type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskCreated => "task.created",
            Self::TaskUpdated => "task.updated",
            Self::TaskCompleted => "task.completed",
            Self::TaskDeleted => "task.deleted",
            Self::TaskAssigned => "task.assigned",
            Self::TaskComment => "task.comment",
            Self::ProjectCreated => "project.created",
            Self::ProjectUpdated => "project.updated",
            Self::ProjectCompleted => "project.completed",
            Self::TeamMemberAdded => "team.member_added",
            Self::TeamMemberRemoved => "team.member_removed",
            Self::ReleaseCreated => "release.created",
            Self::ReleasePublished => "release.published",
            Self::EmployeeCreated => "employee.created",
            Self::EmployeeUpdated => "employee.updated",
            Self::AttendanceCheckin => "attendance.checkin",
            Self::AttendanceCheckout => "attendance.checkout",
            Self::LeaveRequested => "leave.requested",
            Self::LeaveApproved => "leave.approved",
        }
    }

    /// Parse a wire name into an event type.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|et| et.as_str() == s)
    }

    /// The category prefix of the event name.
    #[must_use]
    pub fn category(&self) -> &'static str {
        self.as_str()
            .split('.')
            .next()
            .expect("event names contain a category prefix")
    }

    /// Human-readable description for the event catalog.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::TaskCreated => "A new task was created",
            Self::TaskUpdated => "A task was updated",
            Self::TaskCompleted => "A task was completed",
            Self::TaskDeleted => "A task was deleted",
            Self::TaskAssigned => "A task was assigned to an employee",
            Self::TaskComment => "A comment was added to a task",
            Self::ProjectCreated => "A project was created",
            Self::ProjectUpdated => "A project was updated",
            Self::ProjectCompleted => "A project was completed",
            Self::TeamMemberAdded => "A member was added to a team",
            Self::TeamMemberRemoved => "A member was removed from a team",
            Self::ReleaseCreated => "A release was created",
            Self::ReleasePublished => "A release was published",
            Self::EmployeeCreated => "An employee was added",
            Self::EmployeeUpdated => "An employee's record was updated",
            Self::AttendanceCheckin => "An employee checked in",
            Self::AttendanceCheckout => "An employee checked out",
            Self::LeaveRequested => "A leave request was submitted",
            Self::LeaveApproved => "A leave request was approved",
        }
    }

    /// All recognized event types, in catalog order.
    #[must_use]
    pub fn all() -> Vec<Self> {
        vec![
            Self::TaskCreated,
            Self::TaskUpdated,
            Self::TaskCompleted,
            Self::TaskDeleted,
            Self::TaskAssigned,
            Self::TaskComment,
            Self::ProjectCreated,
            Self::ProjectUpdated,
            Self::ProjectCompleted,
            Self::TeamMemberAdded,
            Self::TeamMemberRemoved,
            Self::ReleaseCreated,
            Self::ReleasePublished,
            Self::EmployeeCreated,
            Self::EmployeeUpdated,
            Self::AttendanceCheckin,
            Self::AttendanceCheckout,
            Self::LeaveRequested,
            Self::LeaveApproved,
        ]
    }
}

impl std::fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// API request types
// ---------------------------------------------------------------------------

/// Request body for creating a webhook registration.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateWebhookRequest {
    /// Display name.
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    /// Delivery target URL (HTTPS).
    #[validate(length(min = 1, max = 2048))]
    pub url: String,

    /// Event type names to subscribe to.
    #[validate(length(min = 1))]
    pub events: Vec<String>,

    /// Optional signing secret; generated when absent.
    pub secret: Option<String>,
}

/// Request body for updating a webhook registration.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateWebhookRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 2048))]
    pub url: Option<String>,

    #[validate(length(min = 1))]
    pub events: Option<Vec<String>>,

    /// Setting `true` also resets the failure counter and clears the
    /// last error.
    pub active: Option<bool>,
}

/// Query parameters for listing webhook registrations.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListWebhooksQuery {
    /// Page size (1-100).
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Page offset.
    #[serde(default)]
    pub offset: i64,
    /// Filter by active flag.
    pub active: Option<bool>,
}

/// Query parameters for listing delivery log entries.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListLogsQuery {
    /// Page size (1-100).
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Page offset.
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

/// A webhook registration as exposed by the API. Never includes the secret.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebhookResponse {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub events: Vec<String>,
    pub active: bool,
    pub failure_count: i32,
    pub last_error: Option<String>,
    pub last_triggered_at: Option<DateTime<Utc>>,
    /// Derived from the failure count and the circuit-breaker threshold.
    pub health: HealthState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation response: the only place the plaintext secret ever appears.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebhookCreatedResponse {
    #[serde(flatten)]
    pub webhook: WebhookResponse,
    /// The signing secret. Store it now; it is not retrievable later.
    pub secret: String,
}

/// Detail response: registration plus its most recent delivery attempts.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebhookDetailResponse {
    #[serde(flatten)]
    pub webhook: WebhookResponse,
    pub recent_logs: Vec<WebhookLogResponse>,
}

/// Paginated list of webhook registrations.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebhookListResponse {
    pub items: Vec<WebhookResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// A delivery log entry as exposed by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebhookLogResponse {
    pub id: Uuid,
    pub webhook_id: Uuid,
    pub event: String,
    pub payload: serde_json::Value,
    pub status_code: Option<i16>,
    pub response_body: Option<String>,
    pub duration_ms: i32,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Paginated delivery history with total count.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebhookLogListResponse {
    pub items: Vec<WebhookLogResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// One entry in the event type catalog.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventTypeInfo {
    pub event: String,
    pub category: String,
    pub description: String,
}

/// The event type catalog.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventTypeListResponse {
    pub events: Vec<EventTypeInfo>,
}

/// Aggregate result of one dispatch call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DispatchSummary {
    /// Eligible webhooks a delivery was attempted to.
    pub attempted: usize,
    /// Deliveries acknowledged with a 2xx status.
    pub succeeded: usize,
    /// Deliveries that failed (non-2xx, network error, or timeout).
    pub failed: usize,
}

/// Result of a synchronous test delivery.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TestDeliveryResponse {
    pub success: bool,
    pub status_code: Option<i16>,
    pub duration_ms: i32,
    pub error_message: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
