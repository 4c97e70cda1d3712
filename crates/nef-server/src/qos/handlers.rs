use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use nef_api::ApiError;
use nef_api::qos::AsSessionWithQosSubscription;

use super::service::QosService;

pub async fn list_subscriptions(
    State(service): State<Arc<QosService>>,
    Path(scs_as_id): Path<String>,
) -> Result<Json<Vec<AsSessionWithQosSubscription>>, ApiError> {
    Ok(Json(service.get_all(&scs_as_id).await?))
}

pub async fn create_subscription(
    State(service): State<Arc<QosService>>,
    Path(scs_as_id): Path<String>,
    payload: Result<Json<AsSessionWithQosSubscription>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let (location, body) = service.post_detached(scs_as_id, payload).await?;
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(body)).into_response())
}

pub async fn get_subscription(
    State(service): State<Arc<QosService>>,
    Path((scs_as_id, subscription_id)): Path<(String, String)>,
) -> Result<Json<AsSessionWithQosSubscription>, ApiError> {
    Ok(Json(service.get(&scs_as_id, &subscription_id).await?))
}

pub async fn update_subscription(
    State(service): State<Arc<QosService>>,
    Path((scs_as_id, subscription_id)): Path<(String, String)>,
    payload: Result<Json<AsSessionWithQosSubscription>, JsonRejection>,
) -> Result<Json<AsSessionWithQosSubscription>, ApiError> {
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
    ApiError::not_implemented("patching an AS session with QoS is not implemented")
}

pub async fn delete_subscription(
    State(service): State<Arc<QosService>>,
    Path((scs_as_id, subscription_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    service.delete(&scs_as_id, &subscription_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
