//! Orders.

use serde::Serialize;
use tracing::instrument;

use hearth_core::{Money, OrderId, OrderStatus};

use crate::models::order::{NewOrder, PlaceOrderResponse};
use crate::models::{Order, OrderItem, PlacedOrder, ShippingAddress};
use crate::transport::{ApiClient, ApiError, segment};

#[derive(Serialize)]
struct StatusUpdate {
    status: OrderStatus,
}

/// `/orders` endpoints.
#[derive(Debug, Clone)]
pub struct OrdersApi {
    api: ApiClient,
}

impl OrdersApi {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Place an order. Called by [`crate::cart::CartStore::checkout`].
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the order.
    #[instrument(skip(self, items, shipping), fields(items = items.len(), total = %total))]
    pub async fn place(
        &self,
        items: &[OrderItem],
        shipping: &ShippingAddress,
        total: Money,
    ) -> Result<PlacedOrder, ApiError> {
        let body = NewOrder {
            items,
            shipping_address: shipping,
            total_price: total,
        };
        let response: PlaceOrderResponse = self.api.post_json("/orders", &body).await?;
        Ok(response.into())
    }

    /// Orders placed by the current principal.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn mine(&self) -> Result<Vec<Order>, ApiError> {
        self.api.get("/orders/mine").await
    }

    /// Every order (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn all(&self) -> Result<Vec<Order>, ApiError> {
        self.api.get("/orders/admin").await
    }

    /// Move an order to a new status (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order, ApiError> {
        let path = format!("/orders/{}/status", segment(id.as_str())?);
        self.api.put_json(&path, &StatusUpdate { status }).await
    }
}
