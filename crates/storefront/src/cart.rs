//! The locally persisted cart.
//!
//! [`CartStore`] writes the full line collection to storage after every
//! mutation, so what is on disk always matches what is in memory. Mutations
//! take `&mut self`: the store has exactly one writer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use hearth_core::{Money, ProductId};

use crate::api::OrdersApi;
use crate::models::{OrderItem, PlacedOrder, Product, ShippingAddress};
use crate::session::SessionStore;
use crate::storage::{Storage, get_json, keys, set_json};
use crate::transport::ApiError;
use crate::validation::FieldErrors;

/// One product and quantity in the cart.
///
/// Display fields are captured when the product is first added and are not
/// refreshed from the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "_id")]
    pub product_id: ProductId,
    pub title: String,
    pub price: Money,
    #[serde(default)]
    pub image: Option<String>,
    pub quantity: u32,
}

impl CartLine {
    fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            title: product.title.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity,
        }
    }

    /// `price * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.price.times(self.quantity)
    }
}

/// Errors from handing the cart over to checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Sign in to place an order")]
    NotAuthenticated,

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Invalid shipping address: {0}")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The persisted cart.
pub struct CartStore {
    storage: Arc<dyn Storage>,
    lines: Vec<CartLine>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Load the cart from storage.
    ///
    /// Missing or malformed data loads as an empty cart. Lines with zero
    /// quantity are dropped and duplicate products are merged.
    #[must_use]
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let stored = match get_json::<Vec<CartLine>>(storage.as_ref(), keys::CART) {
            Ok(lines) => lines.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed cart snapshot");
                Vec::new()
            }
        };

        let mut lines: Vec<CartLine> = Vec::with_capacity(stored.len());
        for line in stored.into_iter().filter(|line| line.quantity > 0) {
            match lines.iter_mut().find(|l| l.product_id == line.product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => lines.push(line),
            }
        }

        Self { storage, lines }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` units of `product`, merging with an existing line.
    ///
    /// A zero quantity is ignored.
    pub fn add_item(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLine::from_product(product, quantity)),
        }
        self.persist();
    }

    /// Remove the line for `product_id`. Absent ids are a no-op.
    pub fn remove_item(&mut self, product_id: &ProductId) {
        self.lines.retain(|line| &line.product_id != product_id);
        self.persist();
    }

    /// Set the quantity for `product_id`. Zero or less removes the line.
    ///
    /// Setting a quantity for a product that is not in the cart does nothing.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.lines.iter_mut().find(|l| &l.product_id == product_id) {
            line.quantity = quantity;
        }
        self.persist();
    }

    /// Empty the cart and delete the persisted snapshot.
    pub fn clear(&mut self) {
        self.lines.clear();
        if let Err(e) = self.storage.remove(keys::CART) {
            tracing::error!(error = %e, "Failed to remove persisted cart");
        }
    }

    fn persist(&self) {
        if let Err(e) = set_json(self.storage.as_ref(), keys::CART, &self.lines) {
            tracing::error!(error = %e, "Failed to persist cart");
        }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Place an order for the cart contents.
    ///
    /// Requires a logged-in session and a non-empty cart, and validates the
    /// shipping address before anything is sent. The cart is cleared only
    /// after the backend accepts the order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if a precondition fails or the backend rejects
    /// the order. The cart is left untouched.
    #[instrument(skip(self, session, orders, shipping), fields(lines = self.lines.len()))]
    pub async fn checkout(
        &mut self,
        session: &SessionStore,
        orders: &OrdersApi,
        shipping: ShippingAddress,
    ) -> Result<PlacedOrder, CheckoutError> {
        if !session.is_authenticated() {
            return Err(CheckoutError::NotAuthenticated);
        }
        if self.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let errors = shipping.validate();
        if !errors.is_empty() {
            return Err(CheckoutError::Invalid(errors));
        }

        let items: Vec<OrderItem> = self
            .lines
            .iter()
            .map(|line| OrderItem {
                product: line.product_id.clone(),
                title: line.title.clone(),
                price: line.price,
                quantity: line.quantity,
            })
            .collect();

        let placed = orders.place(&items, &shipping, self.total()).await?;
        tracing::info!(order_id = %placed.order.id, "Order placed, clearing cart");
        self.clear();
        Ok(placed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn product(id: &str, cents: i64) -> Product {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "title": format!("Product {id}"),
            "price": Money::from_cents(cents),
        }))
        .unwrap()
    }

    fn cart() -> (Arc<MemoryStorage>, CartStore) {
        let storage = Arc::new(MemoryStorage::new());
        let cart = CartStore::load(Arc::clone(&storage) as Arc<dyn Storage>);
        (storage, cart)
    }

    fn reload(storage: &Arc<MemoryStorage>) -> CartStore {
        CartStore::load(Arc::clone(storage) as Arc<dyn Storage>)
    }

    #[test]
    fn test_repeated_adds_merge_into_one_line() {
        let (storage, mut cart) = cart();
        let mug = product("A", 1000);
        for quantity in [1, 2, 4] {
            cart.add_item(&mug, quantity);
        }
        cart.add_item(&product("B", 500), 1);

        let reloaded = reload(&storage);
        assert_eq!(reloaded.lines().len(), 2);
        assert_eq!(reloaded.get(&ProductId::from("A")).unwrap().quantity, 7);
        assert_eq!(reloaded.item_count(), 8);
    }

    #[test]
    fn test_add_to_existing_line_recomputes_total() {
        let (storage, mut cart) = cart();
        let a = product("A", 1000);
        cart.add_item(&a, 2);
        cart.add_item(&a, 1);

        let reloaded = reload(&storage);
        assert_eq!(reloaded.lines().len(), 1);
        assert_eq!(reloaded.lines()[0].quantity, 3);
        assert_eq!(reloaded.total(), Money::from(30));
    }

    #[test]
    fn test_set_quantity_zero_equals_remove() {
        let (_, mut removed) = cart();
        let (_, mut zeroed) = cart();
        for cart in [&mut removed, &mut zeroed] {
            cart.add_item(&product("A", 1000), 2);
            cart.add_item(&product("B", 250), 3);
        }

        removed.remove_item(&ProductId::from("A"));
        zeroed.set_quantity(&ProductId::from("A"), 0);
        assert_eq!(removed.lines(), zeroed.lines());

        zeroed.set_quantity(&ProductId::from("B"), -4);
        assert!(zeroed.is_empty());
    }

    #[test]
    fn test_huge_quantity_total_saturates() {
        let (storage, mut cart) = cart();
        let yacht: Product = serde_json::from_value(serde_json::json!({
            "_id": "Y",
            "title": "Yacht",
            "price": 1e20,
        }))
        .unwrap();
        cart.add_item(&yacht, 1);
        cart.add_item(&product("B", 500), 1);
        cart.set_quantity(&ProductId::from("Y"), 10_000_000_000);

        let reloaded = reload(&storage);
        let line = reloaded.get(&ProductId::from("Y")).unwrap();
        assert_eq!(line.quantity, u32::MAX);
        // Already at the decimal ceiling, so the second line adds nothing.
        assert_eq!(reloaded.total(), line.subtotal());
        assert!(reloaded.total() > Money::from(u32::MAX));
        assert_eq!(reloaded.item_count(), u32::MAX);
    }

    #[test]
    fn test_set_quantity_overwrites_and_ignores_unknown() {
        let (storage, mut cart) = cart();
        cart.add_item(&product("A", 1000), 2);
        cart.set_quantity(&ProductId::from("A"), 5);
        cart.set_quantity(&ProductId::from("missing"), 3);

        let reloaded = reload(&storage);
        assert_eq!(reloaded.lines().len(), 1);
        assert_eq!(reloaded.lines()[0].quantity, 5);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (_, mut cart) = cart();
        cart.add_item(&product("A", 1000), 1);
        cart.remove_item(&ProductId::from("Z"));
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_clear_removes_snapshot() {
        let (storage, mut cart) = cart();
        cart.add_item(&product("A", 1000), 1);
        assert!(storage.contains(keys::CART));

        cart.clear();
        assert!(!storage.contains(keys::CART));
        assert!(reload(&storage).is_empty());
    }

    #[test]
    fn test_malformed_snapshot_loads_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::CART, r#"{"not":"a list"}"#).unwrap();
        assert!(reload(&storage).is_empty());
    }

    #[test]
    fn test_load_normalises_zero_and_duplicate_lines() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(
                keys::CART,
                r#"[
                    {"_id":"A","title":"A","price":10,"quantity":2},
                    {"_id":"B","title":"B","price":5,"quantity":0},
                    {"_id":"A","title":"A","price":10,"quantity":1}
                ]"#,
            )
            .unwrap();

        let cart = reload(&storage);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn test_line_captures_display_fields_at_add_time() {
        let (_, mut cart) = cart();
        let mut mug = product("A", 1000);
        mug.image = Some("/img/mug.png".to_string());
        cart.add_item(&mug, 1);

        mug.price = Money::from_cents(9999);
        cart.add_item(&mug, 1);

        let line = cart.get(&ProductId::from("A")).unwrap();
        assert_eq!(line.price, Money::from_cents(1000));
        assert_eq!(line.image.as_deref(), Some("/img/mug.png"));
        assert_eq!(line.quantity, 2);
    }
}
