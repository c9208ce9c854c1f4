//! Product browsing and reviews.

use hearth_core::ProductId;
use hearth_storefront::models::{NewReview, ProductQuery};

use super::Context;
use crate::error::Result;
use crate::output;

/// `hearth products list`
pub async fn list(ctx: &Context, query: &ProductQuery) -> Result<()> {
    let page = ctx.catalog.list(query).await?;
    output::product_page(&page);
    Ok(())
}

/// `hearth products show`
pub async fn show(ctx: &Context, id: &ProductId) -> Result<()> {
    let (product, reviews) = tokio::try_join!(ctx.catalog.get(id), ctx.catalog.reviews(id))?;
    output::product(&product, &reviews);
    Ok(())
}

/// `hearth products review`
pub async fn review(ctx: &Context, id: &ProductId, rating: u8, comment: String) -> Result<()> {
    ctx.principal()?;
    let review = ctx
        .catalog
        .add_review(id, &NewReview { rating, comment })
        .await?;
    output::done(&format!("Review {} posted.", review.id));
    Ok(())
}
