//! Serverless-style handler: takes an event carrying an order, returns an
//! acknowledgement.

use axum::Json;
use common::AggregateId;
use domain::Order;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// The event a function invocation receives.
#[derive(Debug, Deserialize)]
pub struct InvokeEvent {
    pub order: Option<Order>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct InvokeResponse {
    pub status: &'static str,
    pub order_id: AggregateId,
}

/// Handles one event. The order is acknowledged, not stored.
pub fn handle_event(event: InvokeEvent) -> Result<InvokeResponse, ApiError> {
    let order = event
        .order
        .ok_or_else(|| ApiError::BadRequest("event has no order".to_string()))?;
    tracing::info!(order_id = %order.id, quantity = order.quantity, "received order");

    Ok(InvokeResponse {
        status: "processed",
        order_id: order.id,
    })
}

/// POST /invoke: runs [`handle_event`] on the request body.
#[tracing::instrument(skip(body))]
pub async fn invoke(Json(body): Json<serde_json::Value>) -> Result<Json<InvokeResponse>, ApiError> {
    let event: InvokeEvent = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("malformed event: {e}")))?;
    handle_event(event).map(Json)
}
