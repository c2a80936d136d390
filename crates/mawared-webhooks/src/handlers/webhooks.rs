//! Handlers for webhook registration CRUD, test delivery, and the event
//! type catalog.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiResult, WebhookError};
use crate::models::{
    CreateWebhookRequest, EventTypeInfo, EventTypeListResponse, ListWebhooksQuery,
    TestDeliveryResponse, UpdateWebhookRequest, WebhookCreatedResponse, WebhookDetailResponse,
    WebhookEventType, WebhookListResponse, WebhookResponse,
};
use crate::router::{TenantContext, WebhooksState};

/// Create a webhook registration.
#[utoipa::path(
    post,
    path = "/webhooks",
    tag = "webhooks",
    request_body = CreateWebhookRequest,
    responses(
        (status = 201, description = "Webhook created", body = WebhookCreatedResponse),
        (status = 400, description = "Invalid URL or event types"),
        (status = 409, description = "Webhook limit reached"),
    )
)]
pub async fn create_webhook(
    State(state): State<WebhooksState>,
    Extension(ctx): Extension<TenantContext>,
    Json(request): Json<CreateWebhookRequest>,
) -> ApiResult<(StatusCode, Json<WebhookCreatedResponse>)> {
    request
        .validate()
        .map_err(|e| WebhookError::Validation(e.to_string()))?;

    let created = state
        .webhook_service
        .create_webhook(ctx.tenant_id, ctx.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// List webhook registrations.
#[utoipa::path(
    get,
    path = "/webhooks",
    tag = "webhooks",
    params(ListWebhooksQuery),
    responses(
        (status = 200, description = "Webhook list", body = WebhookListResponse),
    )
)]
pub async fn list_webhooks(
    State(state): State<WebhooksState>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<ListWebhooksQuery>,
) -> ApiResult<Json<WebhookListResponse>> {
    let list = state
        .webhook_service
        .list_webhooks(ctx.tenant_id, query)
        .await?;
    Ok(Json(list))
}

/// Get a webhook registration with its recent delivery attempts.
#[utoipa::path(
    get,
    path = "/webhooks/{id}",
    tag = "webhooks",
    params(("id" = Uuid, Path, description = "Webhook ID")),
    responses(
        (status = 200, description = "Webhook detail", body = WebhookDetailResponse),
        (status = 404, description = "Webhook not found"),
    )
)]
pub async fn get_webhook(
    State(state): State<WebhooksState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WebhookDetailResponse>> {
    let detail = state.webhook_service.get_webhook(ctx.tenant_id, id).await?;
    Ok(Json(detail))
}

/// Update a webhook registration.
#[utoipa::path(
    patch,
    path = "/webhooks/{id}",
    tag = "webhooks",
    params(("id" = Uuid, Path, description = "Webhook ID")),
    request_body = UpdateWebhookRequest,
    responses(
        (status = 200, description = "Updated webhook", body = WebhookResponse),
        (status = 400, description = "Invalid URL or event types"),
        (status = 404, description = "Webhook not found"),
    )
)]
pub async fn update_webhook(
    State(state): State<WebhooksState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateWebhookRequest>,
) -> ApiResult<Json<WebhookResponse>> {
    request
        .validate()
        .map_err(|e| WebhookError::Validation(e.to_string()))?;

    let updated = state
        .webhook_service
        .update_webhook(ctx.tenant_id, id, request)
        .await?;
    Ok(Json(updated))
}

/// Delete a webhook registration. Delivery history is retained.
#[utoipa::path(
    delete,
    path = "/webhooks/{id}",
    tag = "webhooks",
    params(("id" = Uuid, Path, description = "Webhook ID")),
    responses(
        (status = 204, description = "Webhook deleted"),
        (status = 404, description = "Webhook not found"),
    )
)]
pub async fn delete_webhook(
    State(state): State<WebhooksState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .webhook_service
        .delete_webhook(ctx.tenant_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Send a test event to a webhook and return the delivery result.
///
/// Works on suspended webhooks; a successful test resets the failure
/// counter and restores eligibility for automatic dispatch.
#[utoipa::path(
    post,
    path = "/webhooks/{id}/test",
    tag = "webhooks",
    params(("id" = Uuid, Path, description = "Webhook ID")),
    responses(
        (status = 200, description = "Test delivery result", body = TestDeliveryResponse),
        (status = 404, description = "Webhook not found"),
    )
)]
pub async fn test_webhook(
    State(state): State<WebhooksState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TestDeliveryResponse>> {
    let result = state.dispatcher.test_delivery(ctx.tenant_id, id).await?;
    Ok(Json(result))
}

/// List the event types available for subscription.
#[utoipa::path(
    get,
    path = "/webhooks/events",
    tag = "webhooks",
    responses(
        (status = 200, description = "Event type catalog", body = EventTypeListResponse),
    )
)]
pub async fn list_event_types() -> Json<EventTypeListResponse> {
    let events = WebhookEventType::all()
        .into_iter()
        .map(|et| EventTypeInfo {
            event: et.as_str().to_string(),
            category: et.category().to_string(),
            description: et.description().to_string(),
        })
        .collect();

    Json(EventTypeListResponse { events })
}
