//! Handler for the delivery log history endpoint.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{ListLogsQuery, WebhookLogListResponse};
use crate::router::{TenantContext, WebhooksState};

/// Paginated delivery history for a webhook, newest first.
#[utoipa::path(
    get,
    path = "/webhooks/{id}/logs",
    tag = "webhooks",
    params(
        ("id" = Uuid, Path, description = "Webhook ID"),
        ListLogsQuery,
    ),
    responses(
        (status = 200, description = "Delivery log entries", body = WebhookLogListResponse),
        (status = 404, description = "Webhook not found"),
    )
)]
pub async fn list_webhook_logs(
    State(state): State<WebhooksState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListLogsQuery>,
) -> ApiResult<Json<WebhookLogListResponse>> {
    let logs = state
        .webhook_service
        .list_logs(ctx.tenant_id, id, query)
        .await?;
    Ok(Json(logs))
}
