use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    IntoSimpleExpr, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{matches_any, today};
use crate::db::with_transaction;
use crate::entities::{inventory, product};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Extra units added on top of the minimum when bulk-restocking.
pub const RESTOCK_BUFFER: i32 = 20;

/// Stock predicate applied on top of the text search.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum StockFilter {
    #[default]
    All,
    /// `0 < quantity < minimum`
    #[strum(to_string = "Low Stock", serialize = "low", serialize = "lowstock", serialize = "low-stock")]
    LowStock,
    /// `quantity = 0`
    #[strum(to_string = "Out of Stock", serialize = "out", serialize = "outofstock", serialize = "out-of-stock")]
    OutOfStock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum StockStatus {
    #[strum(serialize = "In Stock")]
    #[serde(rename = "In Stock")]
    InStock,
    #[strum(serialize = "Low Stock")]
    #[serde(rename = "Low Stock")]
    LowStock,
    #[strum(serialize = "Out of Stock")]
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl StockStatus {
    /// Zero is out of stock; anything under the minimum (negative included)
    /// is low.
    pub fn classify(quantity: i32, min_stock_level: i32) -> Self {
        if quantity == 0 {
            StockStatus::OutOfStock
        } else if quantity < min_stock_level {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

#[derive(Debug, Clone, FromQueryResult)]
struct InventoryRecord {
    id: i32,
    product_id: i32,
    product_name: String,
    brand: Option<String>,
    size: Option<Decimal>,
    quantity: i32,
    min_stock_level: i32,
    last_restocked: Option<NaiveDate>,
}

/// Inventory row joined with its product, plus the derived status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryRow {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub brand: Option<String>,
    pub size: Option<Decimal>,
    pub quantity: i32,
    pub min_stock_level: i32,
    pub last_restocked: Option<NaiveDate>,
    pub status: StockStatus,
}

impl From<InventoryRecord> for InventoryRow {
    fn from(r: InventoryRecord) -> Self {
        Self {
            status: StockStatus::classify(r.quantity, r.min_stock_level),
            id: r.id,
            product_id: r.product_id,
            product_name: r.product_name,
            brand: r.brand,
            size: r.size,
            quantity: r.quantity,
            min_stock_level: r.min_stock_level,
            last_restocked: r.last_restocked,
        }
    }
}

#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    fn joined() -> Select<inventory::Entity> {
        inventory::Entity::find()
            .select_only()
            .columns([
                inventory::Column::Id,
                inventory::Column::ProductId,
                inventory::Column::Quantity,
                inventory::Column::MinStockLevel,
                inventory::Column::LastRestocked,
            ])
            .column_as(product::Column::Name, "product_name")
            .column_as(product::Column::Brand, "brand")
            .column_as(product::Column::Size, "size")
            .join(JoinType::InnerJoin, inventory::Relation::Product.def())
    }

    /// Every inventory row whose product name or brand contains `filter`.
    pub async fn list(&self, filter: Option<&str>) -> Result<Vec<InventoryRow>, ServiceError> {
        self.search(filter, StockFilter::All).await
    }

    /// Text search combined with a stock-level predicate, ordered by id.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        term: Option<&str>,
        mode: StockFilter,
    ) -> Result<Vec<InventoryRow>, ServiceError> {
        let mut query = Self::joined();
        if let Some(cond) = matches_any(
            [
                product::Column::Name.into_simple_expr(),
                product::Column::Brand.into_simple_expr(),
            ],
            term,
        ) {
            query = query.filter(cond);
        }

        query = match mode {
            StockFilter::All => query,
            StockFilter::LowStock => query
                .filter(inventory::Column::Quantity.gt(0))
                .filter(below_minimum()),
            StockFilter::OutOfStock => query.filter(inventory::Column::Quantity.eq(0)),
        };

        let records = query
            .order_by_asc(inventory::Column::Id)
            .into_model::<InventoryRecord>()
            .all(&*self.db)
            .await?;

        Ok(records.into_iter().map(InventoryRow::from).collect())
    }

    /// Adds `quantity` units to one row and stamps today's date.
    #[instrument(skip(self))]
    pub async fn restock_one(&self, inventory_id: i32, quantity: i32) -> Result<(), ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::validation("Quantity must be positive"));
        }

        let restocked_on = today();
        let touched = add_stock(&*self.db, inventory_id, quantity, restocked_on).await?;
        if touched == 0 {
            return Err(ServiceError::not_found(format!(
                "Inventory item {} not found",
                inventory_id
            )));
        }

        info!(inventory_id, quantity, "Inventory restocked");
        self.event_sender.send_or_log(Event::InventoryRestocked {
            inventory_id,
            quantity_added: quantity,
            restocked_on,
        });
        Ok(())
    }

    /// Tops every low-stock row up to `minimum + RESTOCK_BUFFER`. Returns how
    /// many rows were restocked.
    #[instrument(skip(self))]
    pub async fn restock_all_low_stock(&self) -> Result<u64, ServiceError> {
        let restocked_on = today();

        let rows = with_transaction(&self.db, |txn| {
            Box::pin(async move {
                let low = inventory::Entity::find()
                    .filter(below_minimum())
                    .order_by_asc(inventory::Column::Id)
                    .all(txn)
                    .await?;

                let mut rows = 0u64;
                for item in low {
                    let amount = (item.min_stock_level + RESTOCK_BUFFER) - item.quantity;
                    if amount > 0 {
                        add_stock(txn, item.id, amount, restocked_on).await?;
                        rows += 1;
                    }
                }
                Ok::<_, ServiceError>(rows)
            })
        })
        .await?;

        info!(rows, "Low stock items restocked");
        self.event_sender
            .send_or_log(Event::LowStockReplenished { rows });
        Ok(rows)
    }
}

/// `quantity < min_stock_level`, compared column to column.
pub(crate) fn below_minimum() -> sea_orm::sea_query::SimpleExpr {
    Expr::col((inventory::Entity, inventory::Column::Quantity))
        .lt(Expr::col((inventory::Entity, inventory::Column::MinStockLevel)))
}

async fn add_stock<C: ConnectionTrait>(
    conn: &C,
    inventory_id: i32,
    amount: i32,
    restocked_on: NaiveDate,
) -> Result<u64, ServiceError> {
    let result = inventory::Entity::update_many()
        .col_expr(
            inventory::Column::Quantity,
            Expr::col(inventory::Column::Quantity).add(amount),
        )
        .col_expr(inventory::Column::LastRestocked, Expr::value(restocked_on))
        .filter(inventory::Column::Id.eq(inventory_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case(0, 10, StockStatus::OutOfStock)]
    #[case(3, 10, StockStatus::LowStock)]
    #[case(-2, 10, StockStatus::LowStock)]
    #[case(10, 10, StockStatus::InStock)]
    #[case(45, 10, StockStatus::InStock)]
    fn classifies_stock(#[case] quantity: i32, #[case] min: i32, #[case] expected: StockStatus) {
        assert_eq!(StockStatus::classify(quantity, min), expected);
    }

    #[test]
    fn filter_names_parse_loosely() {
        assert_eq!(StockFilter::from_str("low stock").unwrap(), StockFilter::LowStock);
        assert_eq!(StockFilter::from_str("OUT").unwrap(), StockFilter::OutOfStock);
        assert_eq!(StockFilter::from_str("all").unwrap(), StockFilter::All);
        assert_eq!(StockStatus::OutOfStock.to_string(), "Out of Stock");
    }
}
