//! Admin dashboard models.

use serde::Deserialize;

use hearth_core::Money;

use super::Order;

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub total_revenue: Money,
    #[serde(default)]
    pub recent_orders: Vec<Order>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_counters_default_to_zero() {
        let stats: DashboardStats =
            serde_json::from_str(r#"{"totalUsers":12,"totalRevenue":1520.5}"#).unwrap();
        assert_eq!(stats.total_users, 12);
        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.total_revenue, Money::from_cents(152_050));
        assert!(stats.recent_orders.is_empty());
    }
}
