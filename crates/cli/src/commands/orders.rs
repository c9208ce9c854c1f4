//! Order history.

use super::Context;
use crate::error::Result;
use crate::output;

/// `hearth orders mine`
pub async fn mine(ctx: &Context) -> Result<()> {
    ctx.principal()?;
    let orders = ctx.orders.mine().await?;
    output::orders(&orders);
    Ok(())
}
