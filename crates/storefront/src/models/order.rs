//! Order models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hearth_core::{AuthorSummary, Money, OrderId, OrderStatus, ProductId, UserId};

use crate::validation::FieldErrors;

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: ProductId,
    #[serde(default, alias = "name")]
    pub title: String,
    pub price: Money,
    pub quantity: u32,
}

impl OrderItem {
    /// `price * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.price.times(self.quantity)
    }
}

/// Where an order ships to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// Check the address before an order is placed.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("fullName", &self.full_name);
        errors.require("address", &self.address);
        errors.require("city", &self.city);
        errors.require("postalCode", &self.postal_code);
        errors.require("country", &self.country);
        if let Some(phone) = &self.phone {
            errors.check(
                phone
                    .chars()
                    .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')')),
                "phone",
                "contains invalid characters",
            );
        }
        errors
    }
}

/// The customer on an order: populated on admin listings, a bare id elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderCustomer {
    Populated(AuthorSummary),
    Id(UserId),
}

impl OrderCustomer {
    /// The customer's user id.
    #[must_use]
    pub const fn id(&self) -> &UserId {
        match self {
            Self::Populated(author) => &author.id,
            Self::Id(id) => id,
        }
    }
}

/// An order as returned by `/orders/*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id", alias = "id")]
    pub id: OrderId,
    #[serde(default)]
    pub user: Option<OrderCustomer>,
    #[serde(alias = "orderItems")]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    pub total_price: Money,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewOrder<'a> {
    pub items: &'a [OrderItem],
    pub shipping_address: &'a ShippingAddress,
    pub total_price: Money,
}

/// Result of placing an order.
///
/// `client_secret` is handed to the payment provider's card widget when the
/// backend created a payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order: Order,
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// `POST /orders` answers with `{order, clientSecret}` or the bare order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PlaceOrderResponse {
    Wrapped(PlacedOrder),
    Bare(Order),
}

impl From<PlaceOrderResponse> for PlacedOrder {
    fn from(response: PlaceOrderResponse) -> Self {
        match response {
            PlaceOrderResponse::Wrapped(placed) => placed,
            PlaceOrderResponse::Bare(order) => Self {
                order,
                client_secret: None,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Ada Lovelace".to_string(),
            address: "12 St James's Square".to_string(),
            city: "London".to_string(),
            postal_code: "SW1Y 4JH".to_string(),
            country: "UK".to_string(),
            phone: Some("+44 20 7946 0000".to_string()),
        }
    }

    #[test]
    fn test_address_validation() {
        assert!(address().validate().is_empty());

        let mut bad = address();
        bad.city = " ".to_string();
        bad.phone = Some("call me".to_string());
        let errors = bad.validate();
        assert_eq!(errors.get("city"), Some("is required"));
        assert_eq!(errors.get("phone"), Some("contains invalid characters"));
        assert!(errors.get("country").is_none());
    }

    #[test]
    fn test_order_customer_populated_or_id() {
        let json = r#"{
            "_id": "o1",
            "user": {"_id": "u1", "name": "Ada"},
            "orderItems": [{"product": "p1", "name": "Mug", "price": 10, "quantity": 3}],
            "totalPrice": 30,
            "status": "shipped",
            "createdAt": "2024-03-01T12:00:00Z"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.user.as_ref().unwrap().id().as_str(), "u1");
        assert!(matches!(order.user, Some(OrderCustomer::Populated(_))));
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.items[0].subtotal(), Money::from(30));
        assert!(!order.is_paid);

        let json = r#"{"_id":"o2","user":"u9","items":[],"totalPrice":0,"createdAt":"2024-03-01T12:00:00Z"}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert!(matches!(order.user, Some(OrderCustomer::Id(ref id)) if id.as_str() == "u9"));
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_place_order_response_shapes() {
        let wrapped: PlaceOrderResponse = serde_json::from_str(
            r#"{"order":{"_id":"o1","items":[],"totalPrice":5,"createdAt":"2024-03-01T12:00:00Z"},"clientSecret":"pi_123_secret"}"#,
        )
        .unwrap();
        let placed = PlacedOrder::from(wrapped);
        assert_eq!(placed.client_secret.as_deref(), Some("pi_123_secret"));

        let bare: PlaceOrderResponse = serde_json::from_str(
            r#"{"_id":"o1","items":[],"totalPrice":5,"createdAt":"2024-03-01T12:00:00Z"}"#,
        )
        .unwrap();
        let placed = PlacedOrder::from(bare);
        assert_eq!(placed.order.id.as_str(), "o1");
        assert!(placed.client_secret.is_none());
    }
}
