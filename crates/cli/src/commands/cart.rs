//! Cart and checkout commands.

use hearth_core::ProductId;
use hearth_storefront::models::ShippingAddress;

use super::Context;
use crate::error::{AppError, Result};
use crate::output;

/// `hearth cart show`
pub fn show(ctx: &Context) {
    output::cart(&ctx.cart);
}

/// `hearth cart add`
///
/// Fetches the product first so the line captures its current title and price.
pub async fn add(ctx: &mut Context, id: &ProductId, quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(AppError::InvalidArgument("quantity must be at least 1".to_string()));
    }
    let product = ctx.catalog.get(id).await?;
    if product.is_sold_out() {
        return Err(AppError::InvalidArgument(format!("{} is sold out", product.title)));
    }
    ctx.cart.add_item(&product, quantity);
    output::cart(&ctx.cart);
    Ok(())
}

/// `hearth cart remove`
pub fn remove(ctx: &mut Context, id: &ProductId) {
    ctx.cart.remove_item(id);
    output::cart(&ctx.cart);
}

/// `hearth cart set`
pub fn set(ctx: &mut Context, id: &ProductId, quantity: i64) {
    ctx.cart.set_quantity(id, quantity);
    output::cart(&ctx.cart);
}

/// `hearth cart clear`
pub fn clear(ctx: &mut Context) {
    ctx.cart.clear();
    output::done("Cart cleared.");
}

/// `hearth checkout`
pub async fn checkout(ctx: &mut Context, shipping: ShippingAddress) -> Result<()> {
    let placed = ctx
        .cart
        .checkout(&ctx.session, &ctx.orders, shipping)
        .await?;
    output::placed_order(&placed);
    Ok(())
}
