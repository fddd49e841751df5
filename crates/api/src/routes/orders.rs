//! Order endpoints, the read model query and the fulfillment saga trigger.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::AggregateId;
use domain::{InMemoryOrderRepository, Order, OrderJournal, OrderService, ProductId};
use event_store::EventStore;
use projections::{OrdersByItemView, ProjectionProcessor};
use saga::{SagaCoordinator, SagaDefinition, SagaResult};
use serde::Serialize;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EventStore> {
    pub order_service: OrderService<InMemoryOrderRepository>,
    pub journal: OrderJournal<S>,
    pub projection_processor: ProjectionProcessor<S>,
    pub orders_by_item: OrdersByItemView,
    pub fulfillment: SagaDefinition,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub status: &'static str,
    pub order: Order,
}

#[derive(Serialize)]
pub struct OrderStatusResponse {
    pub order_id: AggregateId,
    pub state: String,
    pub version: u64,
}

#[derive(Serialize)]
pub struct EventEnvelopeResponse {
    pub event_id: String,
    pub event_type: String,
    pub aggregate_id: AggregateId,
    pub version: u64,
    pub timestamp: String,
    pub payload: serde_json::Value,
}

// -- Handlers --

/// POST /orders: validate and store an order.
///
/// Orders naming an item are also recorded in the journal, which feeds the
/// orders-by-item read model.
#[tracing::instrument(skip(state, order), fields(order_id = %order.id))]
pub async fn create<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(order): Json<Order>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let order = state.order_service.create_order(order).await?;

    if let Some(item) = order.item.clone() {
        state.journal.create_order(order.id, item).await?;
        let delivered = state.projection_processor.run_catch_up().await?;
        tracing::debug!(delivered, "read models caught up");
    }

    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse {
            status: "order created",
            order,
        }),
    ))
}

/// GET /orders: list stored orders, ordered by id.
#[tracing::instrument(skip(state))]
pub async fn list<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.order_service.list_orders().await?))
}

/// GET /orders/{id}: load a stored order.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_aggregate_id(&id)?;
    load_order(&state, order_id).await.map(Json)
}

/// POST /orders/{id}/ship: record that a journaled order was shipped.
#[tracing::instrument(skip(state))]
pub async fn ship<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderStatusResponse>, ApiError> {
    let order_id = parse_aggregate_id(&id)?;

    let result = state.journal.ship_order(order_id).await?;
    state.projection_processor.run_catch_up().await?;

    Ok(Json(OrderStatusResponse {
        order_id,
        state: result.aggregate.state().to_string(),
        version: result.new_version.as_u64(),
    }))
}

/// GET /orders/{id}/events: list the journal events of an order.
#[tracing::instrument(skip(state))]
pub async fn events<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<EventEnvelopeResponse>>, ApiError> {
    let order_id = parse_aggregate_id(&id)?;

    let envelopes = state
        .journal
        .store()
        .get_events_for_aggregate(order_id)
        .await
        .map_err(domain::DomainError::from)?;

    let responses = envelopes
        .into_iter()
        .map(|e| EventEnvelopeResponse {
            event_id: e.event_id.to_string(),
            event_type: e.event_type,
            aggregate_id: e.aggregate_id,
            version: e.version.as_u64(),
            timestamp: e.timestamp.to_rfc3339(),
            payload: e.payload,
        })
        .collect();

    Ok(Json(responses))
}

/// POST /orders/{id}/fulfill: run the fulfillment saga for a stored order.
///
/// Both outcomes are a 200: a compensated saga is a reported result, not a
/// request error.
#[tracing::instrument(skip(state))]
pub async fn fulfill<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<SagaResult>, ApiError> {
    let order_id = parse_aggregate_id(&id)?;
    let order = load_order(&state, order_id).await?;

    let result = SagaCoordinator::run(&state.fulfillment, &order);
    tracing::info!(%order_id, status = ?result.status, "fulfillment finished");

    Ok(Json(result))
}

/// GET /orders/by-item: the orders-by-item read model.
#[tracing::instrument(skip(state))]
pub async fn by_item<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<BTreeMap<ProductId, Vec<AggregateId>>>, ApiError> {
    state.projection_processor.run_catch_up().await?;
    Ok(Json(state.orders_by_item.snapshot().await))
}

async fn load_order<S: EventStore>(
    state: &AppState<S>,
    order_id: AggregateId,
) -> Result<Order, ApiError> {
    state
        .order_service
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {order_id} not found")))
}

fn parse_aggregate_id(id: &str) -> Result<AggregateId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid order id: {id}")))
}
