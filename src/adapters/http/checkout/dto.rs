//! Data Transfer Objects for the checkout API.
//!
//! The storefront speaks camelCase JSON with prices as decimal numbers in
//! major units; everything here converts to and from the cent-based domain
//! types at the boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::checkout::{
    Address, Customer, Order, OrderItem, OrderSummary, PaymentInfo, PaymentIntent,
    PaymentIntentStatus, Purchase, PurchaseResponse,
};
use crate::domain::foundation::{Money, ProductId, ValidationError};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/checkout/purchase`.
///
/// Storefronts send either the purchase itself or the purchase wrapped
/// together with the card form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PurchaseBody {
    Wrapped(WrappedPurchase),
    Bare(PurchaseRequest),
}

impl PurchaseBody {
    pub fn into_purchase(self) -> PurchaseRequest {
        match self {
            PurchaseBody::Wrapped(wrapped) => wrapped.purchase,
            PurchaseBody::Bare(purchase) => purchase,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedPurchase {
    pub purchase: PurchaseRequest,

    /// Card details collected by older storefronts. Never read; card data
    /// goes straight from the browser to the processor.
    #[serde(default)]
    pub payment_info: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub customer: CustomerDto,
    pub shipping_address: AddressDto,
    pub billing_address: AddressDto,
    pub order: OrderSummaryRequest,
    pub order_items: Vec<OrderItemDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddressDto {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummaryRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub total_quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub product_id: i64,
    #[serde(default)]
    pub image_url: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// Body of `POST /api/checkout/payment-intent`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    /// Amount in minor units.
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt_email: Option<String>,
}

/// Query string of `GET /api/orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderHistoryParams {
    pub email: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Request conversion
// ════════════════════════════════════════════════════════════════════════════════

impl TryFrom<CustomerDto> for Customer {
    type Error = ValidationError;

    fn try_from(dto: CustomerDto) -> Result<Self, Self::Error> {
        Customer::new(&dto.first_name, &dto.last_name, &dto.email)
    }
}

impl TryFrom<AddressDto> for Address {
    type Error = ValidationError;

    fn try_from(dto: AddressDto) -> Result<Self, Self::Error> {
        Address::new(&dto.street, &dto.city, &dto.state, &dto.country, &dto.zip_code)
    }
}

impl TryFrom<OrderItemDto> for OrderItem {
    type Error = ValidationError;

    fn try_from(dto: OrderItemDto) -> Result<Self, Self::Error> {
        OrderItem::new(
            ProductId::new(dto.product_id)?,
            dto.image_url,
            Money::from_decimal(dto.unit_price)?,
            dto.quantity,
        )
    }
}

impl TryFrom<PurchaseRequest> for Purchase {
    type Error = ValidationError;

    fn try_from(dto: PurchaseRequest) -> Result<Self, Self::Error> {
        Ok(Purchase {
            customer: dto.customer.try_into()?,
            shipping_address: dto.shipping_address.try_into()?,
            billing_address: dto.billing_address.try_into()?,
            order: OrderSummary {
                total_price: Money::from_decimal(dto.order.total_price)?,
                total_quantity: dto.order.total_quantity,
            },
            order_items: dto
                .order_items
                .into_iter()
                .map(OrderItem::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

impl TryFrom<PaymentIntentRequest> for PaymentInfo {
    type Error = ValidationError;

    fn try_from(dto: PaymentIntentRequest) -> Result<Self, Self::Error> {
        PaymentInfo::new(
            Money::from_cents(dto.amount)?,
            &dto.currency,
            dto.receipt_email.as_deref(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponseDto {
    pub order_tracking_number: String,
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
}

impl From<PurchaseResponse> for PurchaseResponseDto {
    fn from(response: PurchaseResponse) -> Self {
        Self {
            order_tracking_number: response.order_tracking_number.to_string(),
            payment_intent_id: response.payment_intent_id,
            client_secret: response.client_secret,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub id: String,
    pub client_secret: Option<String>,
    /// Amount in minor units.
    pub amount: i64,
    pub currency: String,
    pub status: PaymentIntentStatus,
}

impl From<PaymentIntent> for PaymentIntentResponse {
    fn from(intent: PaymentIntent) -> Self {
        Self {
            id: intent.id,
            client_secret: intent.client_secret,
            amount: intent.amount.cents(),
            currency: intent.currency,
            status: intent.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_tracking_number: String,
    pub status: String,
    pub customer: CustomerDto,
    pub shipping_address: AddressDto,
    pub billing_address: AddressDto,
    pub order_items: Vec<OrderItemDto>,
    pub total_quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub currency: String,
    pub payment_intent_id: Option<String>,
    pub last_payment_error: Option<String>,
    pub date_created: String,
    pub last_updated: String,
}

fn address_dto(address: &Address) -> AddressDto {
    AddressDto {
        street: address.street().to_string(),
        city: address.city().to_string(),
        state: address.state().to_string(),
        country: address.country().to_string(),
        zip_code: address.zip_code().to_string(),
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            order_tracking_number: order.tracking_number.to_string(),
            status: order.status.as_str().to_string(),
            customer: CustomerDto {
                first_name: order.customer.first_name().to_string(),
                last_name: order.customer.last_name().to_string(),
                email: order.customer.email().to_string(),
            },
            shipping_address: address_dto(&order.shipping_address),
            billing_address: address_dto(&order.billing_address),
            order_items: order
                .items
                .iter()
                .map(|item| OrderItemDto {
                    product_id: item.product_id().value(),
                    image_url: item.image_url().to_string(),
                    unit_price: item.unit_price().to_decimal(),
                    quantity: item.quantity(),
                })
                .collect(),
            total_quantity: order.total_quantity,
            total_price: order.total_price.to_decimal(),
            currency: order.currency.clone(),
            payment_intent_id: order.payment_intent_id.clone(),
            last_payment_error: order.last_payment_error.clone(),
            date_created: order.created_at.as_datetime().to_rfc3339(),
            last_updated: order.updated_at.as_datetime().to_rfc3339(),
        }
    }
}

/// One row of the order history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderHistoryEntry {
    pub order_tracking_number: String,
    pub status: String,
    pub total_quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub currency: String,
    pub date_created: String,
}

impl From<&Order> for OrderHistoryEntry {
    fn from(order: &Order) -> Self {
        Self {
            order_tracking_number: order.tracking_number.to_string(),
            status: order.status.as_str().to_string(),
            total_quantity: order.total_quantity,
            total_price: order.total_price.to_decimal(),
            currency: order.currency.clone(),
            date_created: order.created_at.as_datetime().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderHistoryResponse {
    pub orders: Vec<OrderHistoryEntry>,
}

/// Acknowledgement for the processor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookAck {
    pub received: bool,
    pub outcome: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
