use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

use super::inventory::below_minimum;
use super::orders::OrderService;
use crate::config::AppConfig;
use crate::entities::{customer, inventory, order, product, OrderStatus};
use crate::errors::ServiceError;
use crate::formatting::format_currency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub products: u64,
    pub customers: u64,
    pub orders: u64,
    /// Inventory rows under their minimum, zero-stock rows included
    pub low_stock: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentOrder {
    pub id: i32,
    pub customer_name: String,
    pub order_date: chrono::NaiveDate,
    pub total_amount: Decimal,
    pub total_display: String,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub counts: DashboardCounts,
    pub total_revenue: Decimal,
    pub average_order_value: Decimal,
    pub recent_orders: Vec<RecentOrder>,
}

/// Stateless aggregates; every call recomputes from the tables.
#[derive(Clone)]
pub struct DashboardService {
    db: Arc<DatabaseConnection>,
    config: Arc<AppConfig>,
}

impl DashboardService {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    #[instrument(skip(self))]
    pub async fn dashboard_counts(&self) -> Result<DashboardCounts, ServiceError> {
        let db = &*self.db;
        let (products, customers, orders, low_stock) = futures::try_join!(
            product::Entity::find().count(db),
            customer::Entity::find().count(db),
            order::Entity::find().count(db),
            inventory::Entity::find().filter(below_minimum()).count(db),
        )?;
        Ok(DashboardCounts {
            products,
            customers,
            orders,
            low_stock,
        })
    }

    /// Sum of completed order totals, or zero.
    #[instrument(skip(self))]
    pub async fn total_revenue(&self) -> Result<Decimal, ServiceError> {
        let (sum, _) = self.completed_totals().await?;
        Ok(sum)
    }

    /// Mean completed order total, or zero when nothing is completed.
    #[instrument(skip(self))]
    pub async fn average_order_value(&self) -> Result<Decimal, ServiceError> {
        let (sum, count) = self.completed_totals().await?;
        Ok(mean(sum, count))
    }

    async fn completed_totals(&self) -> Result<(Decimal, u64), ServiceError> {
        let completed = || order::Entity::find().filter(order::Column::Status.eq(OrderStatus::Completed));

        let sum = completed()
            .select_only()
            .column_as(order::Column::TotalAmount.sum(), "revenue")
            .into_tuple::<Option<Decimal>>()
            .one(&*self.db)
            .await?
            .flatten()
            .unwrap_or(Decimal::ZERO);
        let count = completed().count(&*self.db).await?;

        // REAL columns sum in floating point
        Ok((sum.round_dp(2), count))
    }

    /// Newest orders first; same-day orders by descending id.
    #[instrument(skip(self))]
    pub async fn recent_orders(&self, limit: u64) -> Result<Vec<RecentOrder>, ServiceError> {
        let rows = OrderService::summaries()
            .order_by_desc(order::Column::OrderDate)
            .order_by_desc(order::Column::Id)
            .limit(limit)
            .into_model::<super::orders::OrderSummary>()
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| RecentOrder {
                customer_name: row.customer_name(),
                total_display: format_currency(row.total_amount),
                id: row.id,
                order_date: row.order_date,
                total_amount: row.total_amount,
                status: row.status,
            })
            .collect())
    }

    /// Every dashboard figure in one value, recent orders capped by config.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<Dashboard, ServiceError> {
        let (total_revenue, completed) = self.completed_totals().await?;
        Ok(Dashboard {
            counts: self.dashboard_counts().await?,
            total_revenue,
            average_order_value: mean(total_revenue, completed),
            recent_orders: self.recent_orders(self.config.recent_orders_limit).await?,
        })
    }
}

fn mean(sum: Decimal, count: u64) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        (sum / Decimal::from(count)).round_dp(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean(Decimal::ZERO, 0), Decimal::ZERO);
        assert_eq!(mean(dec!(22999.95), 3), dec!(7666.65));
        assert_eq!(mean(dec!(10), 3), dec!(3.33));
    }
}
