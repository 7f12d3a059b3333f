//! Axum router configuration for checkout endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_payment_intent, get_order, handle_stripe_webhook, order_history, place_order,
    CheckoutAppState,
};

/// Checkout commands.
///
/// # Routes
/// - `POST /purchase` - Place an order
/// - `POST /payment-intent` - Open a standalone payment intent
pub fn checkout_routes() -> Router<CheckoutAppState> {
    Router::new()
        .route("/purchase", post(place_order))
        .route("/payment-intent", post(create_payment_intent))
}

/// Order lookups.
///
/// # Routes
/// - `GET /?email=` - Order history for a customer
/// - `GET /:tracking_number` - One order
pub fn order_routes() -> Router<CheckoutAppState> {
    Router::new()
        .route("/", get(order_history))
        .route("/:tracking_number", get(get_order))
}

/// Payment processor callbacks. Verified by signature, not by session.
///
/// # Routes
/// - `POST /stripe` - Handle Stripe webhooks
pub fn webhook_routes() -> Router<CheckoutAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// The complete checkout API, suitable for mounting at `/api`.
///
/// ```ignore
/// let app = Router::new()
///     .nest("/api", checkout_router())
///     .with_state(app_state);
/// ```
pub fn checkout_router() -> Router<CheckoutAppState> {
    Router::new()
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .nest("/webhooks", webhook_routes())
}
