//! HTTP handlers for `{apiRoot}/{scsAsId}/subscriptions[/{subscriptionId}]`.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use nef_api::ApiError;
use nef_api::monitoring::MonitoringEventSubscription;

use super::service::SubscriptionService;

pub async fn list_subscriptions(
    State(service): State<Arc<SubscriptionService>>,
    Path(scs_as_id): Path<String>,
) -> Result<Json<Vec<MonitoringEventSubscription>>, ApiError> {
    Ok(Json(service.get_all(&scs_as_id).await?))
}

/// Answers `200` with the immediate report; `Location` is only set when the
/// subscription was persisted.
pub async fn create_subscription(
    State(service): State<Arc<SubscriptionService>>,
    Path(scs_as_id): Path<String>,
    payload: Result<Json<MonitoringEventSubscription>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let created = service.post(&scs_as_id, payload).await?;

    let response = match created.location {
        Some(location) => (
            StatusCode::OK,
            [(header::LOCATION, location)],
            Json(created.report),
        )
            .into_response(),
        None => (StatusCode::OK, Json(created.report)).into_response(),
    };
    Ok(response)
}

pub async fn get_subscription(
    State(service): State<Arc<SubscriptionService>>,
    Path((scs_as_id, subscription_id)): Path<(String, String)>,
) -> Result<Json<MonitoringEventSubscription>, ApiError> {
    Ok(Json(service.get(&scs_as_id, &subscription_id).await?))
}

pub async fn update_subscription(
    State(service): State<Arc<SubscriptionService>>,
    Path((scs_as_id, subscription_id)): Path<(String, String)>,
    payload: Result<Json<MonitoringEventSubscription>, JsonRejection>,
) -> Result<Json<MonitoringEventSubscription>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    Ok(Json(
        service
            .update(&scs_as_id, &subscription_id, payload)
            .await?,
    ))
}

pub async fn patch_subscription(
    Path((_scs_as_id, _subscription_id)): Path<(String, String)>,
) -> ApiError {
    ApiError::not_implemented("patching a monitoring event subscription is not implemented")
}

pub async fn delete_subscription(
    State(service): State<Arc<SubscriptionService>>,
    Path((scs_as_id, subscription_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    service.delete(&scs_as_id, &subscription_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
