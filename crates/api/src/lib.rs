//! HTTP API server for the order-patterns workspace.
//!
//! Exposes the order service, the order journal and its read model, the
//! fulfillment saga, a serverless-style handler and an intent router, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{InMemoryOrderRepository, OrderJournal, OrderService};
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{OrdersByItemView, ProjectionProcessor};
use saga::order_fulfillment;
use saga::{InMemoryPaymentService, InMemoryShippingService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route("/orders/by-item", get(routes::orders::by_item::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/ship", post(routes::orders::ship::<S>))
        .route("/orders/{id}/events", get(routes::orders::events::<S>))
        .route("/orders/{id}/fulfill", post(routes::orders::fulfill::<S>))
        .route("/invoke", post(routes::invoke::invoke))
        .route("/route", post(routes::intent::route))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// In-memory services the fulfillment saga talks to.
#[derive(Debug, Clone, Default)]
pub struct Services {
    pub payment: InMemoryPaymentService,
    pub shipping: InMemoryShippingService,
}

/// Creates the application state over the given event store, with
/// in-memory repository and services.
///
/// The returned [`Services`] share their ledgers with the saga, so callers
/// can inspect payments and shipments.
pub fn create_default_state<S: EventStore + Clone + 'static>(
    event_store: S,
    config: &Config,
) -> (Arc<AppState<S>>, Services) {
    let services = Services::default();
    let fulfillment = order_fulfillment::definition(
        config.fulfillment(),
        services.payment.clone(),
        services.shipping.clone(),
    );

    let orders_by_item = OrdersByItemView::new();
    let mut projection_processor = ProjectionProcessor::new(event_store.clone());
    projection_processor.register(Box::new(orders_by_item.clone()));

    let state = Arc::new(AppState {
        order_service: OrderService::new(InMemoryOrderRepository::new()),
        journal: OrderJournal::new(event_store),
        projection_processor,
        orders_by_item,
        fulfillment,
    });

    (state, services)
}
