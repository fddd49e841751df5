//! Intent router: picks the service that should handle a free-text request.

use axum::Json;
use serde::{Deserialize, Serialize};

pub const ORDER_SERVICE: &str = "Order Service";
pub const PAYMENT_SERVICE: &str = "Payment Service";
pub const UNKNOWN_SERVICE: &str = "Unknown";

/// Routes an intent by keyword.
///
/// Matching is a case-sensitive substring check, and "order" wins over
/// "payment" when both appear.
pub fn route_intent(intent: &str) -> &'static str {
    if intent.contains("order") {
        ORDER_SERVICE
    } else if intent.contains("payment") {
        PAYMENT_SERVICE
    } else {
        UNKNOWN_SERVICE
    }
}

#[derive(Deserialize)]
pub struct RouteRequest {
    pub intent: String,
}

#[derive(Serialize)]
pub struct RouteResponse {
    pub intent: String,
    pub service: &'static str,
}

/// POST /route: returns the service an intent is routed to.
#[tracing::instrument(skip(req), fields(intent = %req.intent))]
pub async fn route(Json(req): Json<RouteRequest>) -> Json<RouteResponse> {
    let service = route_intent(&req.intent);
    tracing::info!(service, "intent routed");
    Json(RouteResponse {
        intent: req.intent,
        service,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_takes_precedence_over_payment() {
        assert_eq!(
            route_intent("Process my payment for order 123"),
            ORDER_SERVICE
        );
    }

    #[test]
    fn payment_only() {
        assert_eq!(route_intent("refund my payment"), PAYMENT_SERVICE);
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(route_intent("Order status"), UNKNOWN_SERVICE);
        assert_eq!(route_intent("PAYMENT"), UNKNOWN_SERVICE);
    }

    #[test]
    fn unrelated_text_is_unknown() {
        assert_eq!(route_intent(""), UNKNOWN_SERVICE);
        assert_eq!(route_intent("hello"), UNKNOWN_SERVICE);
    }
}
