use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    IntoSimpleExpr, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    Select, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use super::catalog::{resolve_category, resolve_supplier};
use super::{matches_any, non_blank, parse_choice, parse_decimal, today};
use crate::db::with_transaction;
use crate::entities::inventory::DEFAULT_MIN_STOCK_LEVEL;
use crate::entities::{category, inventory, order_detail, product, supplier, Gender};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Product form contents as typed by the user.
///
/// `category` and `supplier` are looked up by exact name; blank leaves the
/// reference empty. Numeric fields are parsed here so that a typo surfaces as
/// a validation error instead of a database error.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 100, message = "Product name is required"))]
    pub name: String,
    pub category: String,
    pub supplier: String,
    pub brand: String,
    pub size: String,
    pub color: String,
    pub gender: String,
    pub price: String,
    pub cost_price: String,
    pub description: String,
}

#[derive(Debug)]
struct ProductFields {
    name: String,
    category: Option<String>,
    supplier: Option<String>,
    brand: Option<String>,
    size: Option<Decimal>,
    color: Option<String>,
    gender: Option<Gender>,
    price: Decimal,
    cost_price: Option<Decimal>,
    description: Option<String>,
}

impl ProductInput {
    fn parse(self) -> Result<ProductFields, ServiceError> {
        let input = ProductInput {
            name: self.name.trim().to_string(),
            ..self
        };
        input.validate()?;

        let price = parse_decimal("price", &input.price)?
            .ok_or_else(|| ServiceError::validation("Price is required"))?;
        if price.is_sign_negative() {
            return Err(ServiceError::validation("Price must not be negative"));
        }
        let cost_price = parse_decimal("cost price", &input.cost_price)?;
        if cost_price.is_some_and(|c| c.is_sign_negative()) {
            return Err(ServiceError::validation("Cost price must not be negative"));
        }
        let size = parse_decimal("size", &input.size)?;
        if size.is_some_and(|s| s <= Decimal::ZERO) {
            return Err(ServiceError::validation("Size must be positive"));
        }

        Ok(ProductFields {
            gender: parse_choice("Gender", &input.gender)?,
            category: non_blank(&input.category),
            supplier: non_blank(&input.supplier),
            brand: non_blank(&input.brand),
            color: non_blank(&input.color),
            description: non_blank(&input.description),
            name: input.name,
            size,
            price,
            cost_price,
        })
    }
}

impl ProductFields {
    fn write_to(
        self,
        model: &mut product::ActiveModel,
        category_id: Option<i32>,
        supplier_id: Option<i32>,
    ) {
        model.name = Set(self.name);
        model.category_id = Set(category_id);
        model.supplier_id = Set(supplier_id);
        model.brand = Set(self.brand);
        model.size = Set(self.size);
        model.color = Set(self.color);
        model.gender = Set(self.gender);
        model.price = Set(self.price);
        model.cost_price = Set(self.cost_price);
        model.description = Set(self.description);
    }
}

/// Product joined with its category and supplier names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct ProductRow {
    pub id: i32,
    pub name: String,
    pub brand: Option<String>,
    pub size: Option<Decimal>,
    pub color: Option<String>,
    pub gender: Option<Gender>,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub supplier_id: Option<i32>,
    pub supplier_name: Option<String>,
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    fn joined() -> Select<product::Entity> {
        product::Entity::find()
            .select_only()
            .columns([
                product::Column::Id,
                product::Column::Name,
                product::Column::Brand,
                product::Column::Size,
                product::Column::Color,
                product::Column::Gender,
                product::Column::Price,
                product::Column::CostPrice,
                product::Column::Description,
                product::Column::CategoryId,
                product::Column::SupplierId,
            ])
            .column_as(category::Column::Name, "category_name")
            .column_as(supplier::Column::Name, "supplier_name")
            .join(JoinType::LeftJoin, product::Relation::Category.def())
            .join(JoinType::LeftJoin, product::Relation::Supplier.def())
    }

    /// Lists products by id, optionally narrowed to those whose name, brand
    /// or category contains `filter` (case-insensitive).
    #[instrument(skip(self))]
    pub async fn list(&self, filter: Option<&str>) -> Result<Vec<ProductRow>, ServiceError> {
        let mut query = Self::joined();
        if let Some(cond) = matches_any(
            [
                product::Column::Name.into_simple_expr(),
                product::Column::Brand.into_simple_expr(),
                category::Column::Name.into_simple_expr(),
            ],
            filter,
        ) {
            query = query.filter(cond);
        }

        Ok(query
            .order_by_asc(product::Column::Id)
            .into_model::<ProductRow>()
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<ProductRow, ServiceError> {
        Self::joined()
            .filter(product::Column::Id.eq(id))
            .into_model::<ProductRow>()
            .one(&*self.db)
            .await?
            .ok_or_else(|| product_not_found(id))
    }

    /// Creates a product and its inventory row (zero stock, default minimum)
    /// in one transaction. Returns the new product id.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: ProductInput) -> Result<i32, ServiceError> {
        let fields = input.parse()?;
        let category_id = resolve_category(&*self.db, fields.category.as_deref()).await?;
        let supplier_id = resolve_supplier(&*self.db, fields.supplier.as_deref()).await?;

        let product_id = with_transaction(&self.db, |txn| {
            Box::pin(async move {
                let mut model = <product::ActiveModel as Default>::default();
                fields.write_to(&mut model, category_id, supplier_id);
                let product = model.insert(txn).await?;

                inventory::ActiveModel {
                    product_id: Set(product.id),
                    quantity: Set(0),
                    last_restocked: Set(Some(today())),
                    min_stock_level: Set(DEFAULT_MIN_STOCK_LEVEL),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                Ok::<_, ServiceError>(product.id)
            })
        })
        .await?;

        info!(product_id, "Product created");
        self.event_sender.send_or_log(Event::ProductCreated(product_id));
        Ok(product_id)
    }

    /// Overwrites every editable field of an existing product.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn update(&self, id: i32, input: ProductInput) -> Result<(), ServiceError> {
        let existing = product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| product_not_found(id))?;

        let fields = input.parse()?;
        let category_id = resolve_category(&*self.db, fields.category.as_deref()).await?;
        let supplier_id = resolve_supplier(&*self.db, fields.supplier.as_deref()).await?;

        let mut model: product::ActiveModel = existing.into();
        fields.write_to(&mut model, category_id, supplier_id);
        model.update(&*self.db).await?;

        info!(product_id = id, "Product updated");
        self.event_sender.send_or_log(Event::ProductUpdated(id));
        Ok(())
    }

    /// Deletes a product together with its inventory row. Products that
    /// appear on any order are kept.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        if product::Entity::find_by_id(id).one(&*self.db).await?.is_none() {
            return Err(product_not_found(id));
        }

        let referencing = order_detail::Entity::find()
            .filter(order_detail::Column::ProductId.eq(id))
            .count(&*self.db)
            .await?;
        if referencing > 0 {
            return Err(ServiceError::conflict(
                "Cannot delete product with existing orders",
            ));
        }

        with_transaction(&self.db, |txn| {
            Box::pin(async move {
                inventory::Entity::delete_many()
                    .filter(inventory::Column::ProductId.eq(id))
                    .exec(txn)
                    .await?;
                product::Entity::delete_by_id(id).exec(txn).await?;
                Ok::<_, ServiceError>(())
            })
        })
        .await?;

        info!(product_id = id, "Product deleted");
        self.event_sender.send_or_log(Event::ProductDeleted(id));
        Ok(())
    }
}

fn product_not_found(id: i32) -> ServiceError {
    ServiceError::not_found(format!("Product {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn form(name: &str, price: &str) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            price: price.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn parse_trims_and_converts() {
        let fields = ProductInput {
            size: "10.5".into(),
            gender: "unisex".into(),
            cost_price: "".into(),
            category: "  ".into(),
            ..form("  Air Max  ", "5499.99")
        }
        .parse()
        .unwrap();

        assert_eq!(fields.name, "Air Max");
        assert_eq!(fields.price, dec!(5499.99));
        assert_eq!(fields.size, Some(dec!(10.5)));
        assert_eq!(fields.gender, Some(Gender::Unisex));
        assert_eq!(fields.cost_price, None);
        assert_eq!(fields.category, None);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_matches!(form("   ", "10").parse(), Err(ServiceError::ValidationError(m)) if m == "Product name is required");
        assert_matches!(form("Shoe", "").parse(), Err(ServiceError::ValidationError(m)) if m == "Price is required");
        assert_matches!(form("Shoe", "ten").parse(), Err(ServiceError::ValidationError(_)));
        assert_matches!(form("Shoe", "-1").parse(), Err(ServiceError::ValidationError(_)));
        assert_matches!(
            ProductInput { gender: "robot".into(), ..form("Shoe", "1") }.parse(),
            Err(ServiceError::ValidationError(_))
        );
    }
}
