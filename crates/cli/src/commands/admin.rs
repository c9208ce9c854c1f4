//! Administrator commands.
//!
//! All of these require an administrator session. Destructive ones also
//! require `--yes`.

use std::path::PathBuf;

use hearth_core::{Money, OrderId, OrderStatus, ProductId, Role, UserId};
use hearth_storefront::models::ProductDraft;

use super::{Context, confirm, read_upload};
use crate::error::Result;
use crate::output;

/// Product fields from the command line.
pub struct ProductArgs {
    pub title: String,
    pub description: String,
    pub price: Money,
    pub category: Option<String>,
    pub stock: u32,
    pub image: Option<PathBuf>,
}

impl ProductArgs {
    async fn into_draft(self) -> Result<ProductDraft> {
        let image = match &self.image {
            Some(path) => Some(read_upload(path).await?),
            None => None,
        };
        Ok(ProductDraft {
            title: self.title,
            description: self.description,
            price: self.price,
            category: self.category,
            stock: self.stock,
            image,
        })
    }
}

/// `hearth admin stats`
pub async fn stats(ctx: &Context) -> Result<()> {
    let stats = ctx.admin()?.dashboard().await?;
    output::dashboard(&stats);
    Ok(())
}

/// `hearth admin users`
pub async fn users(ctx: &Context) -> Result<()> {
    let users = ctx.admin()?.users().await?;
    output::users(&users);
    Ok(())
}

/// `hearth admin set-role`
pub async fn set_role(ctx: &Context, id: &UserId, role: Role) -> Result<()> {
    let user = ctx.admin()?.set_role(id, role).await?;
    output::done(&format!("{} is now {}.", user.name, user.role));
    Ok(())
}

/// `hearth admin delete-user`
pub async fn delete_user(ctx: &Context, id: &UserId, yes: bool) -> Result<()> {
    let admin = ctx.admin()?;
    confirm(yes, format!("delete user {id}"))?;
    admin.delete_user(id).await?;
    output::done("User deleted.");
    Ok(())
}

/// `hearth admin orders`
pub async fn orders(ctx: &Context) -> Result<()> {
    ctx.admin()?;
    let orders = ctx.orders.all().await?;
    output::orders(&orders);
    Ok(())
}

/// `hearth admin order-status`
pub async fn order_status(ctx: &Context, id: &OrderId, status: OrderStatus) -> Result<()> {
    ctx.admin()?;
    let order = ctx.orders.update_status(id, status).await?;
    output::done(&format!("Order {} is now {}.", order.id, order.status));
    Ok(())
}

/// `hearth admin create-product`
pub async fn create_product(ctx: &Context, args: ProductArgs) -> Result<()> {
    ctx.admin()?;
    let product = ctx.catalog.create(args.into_draft().await?).await?;
    output::done(&format!("Created product {}.", product.id));
    Ok(())
}

/// `hearth admin update-product`
pub async fn update_product(ctx: &Context, id: &ProductId, args: ProductArgs) -> Result<()> {
    ctx.admin()?;
    let product = ctx.catalog.update(id, args.into_draft().await?).await?;
    output::done(&format!("Updated product {}.", product.id));
    Ok(())
}

/// `hearth admin delete-product`
pub async fn delete_product(ctx: &Context, id: &ProductId, yes: bool) -> Result<()> {
    ctx.admin()?;
    confirm(yes, format!("delete product {id}"))?;
    ctx.catalog.delete(id).await?;
    output::done("Product deleted.");
    Ok(())
}
