use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::cart::{Cart, CartLine};
use super::catalog::default_employee;
use super::today;
use crate::config::AppConfig;
use crate::db::with_transaction;
use crate::entities::{
    customer, employee, inventory, order, order_detail, product, OrderStatus, PaymentMethod,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Everything `commit` needs besides the cart itself.
#[derive(Debug, Clone, Default)]
pub struct CommitOrder {
    pub customer_id: Option<i32>,
    /// `None` records the first employee on file, if any.
    pub employee_id: Option<i32>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct OrderSummary {
    pub id: i32,
    pub customer_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub order_date: NaiveDate,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_method: Option<PaymentMethod>,
}

impl OrderSummary {
    pub fn customer_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct OrderLine {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// An order with its customer, clerk and line items
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderWithDetails {
    pub order: order::Model,
    pub customer_name: String,
    pub employee_name: Option<String>,
    pub lines: Vec<OrderLine>,
}

/// Order assembly and order records.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            event_sender,
            config,
        }
    }

    /// Adds `quantity` of a product to the cart at its current price.
    #[instrument(skip(self, cart))]
    pub async fn add_line<'c>(
        &self,
        cart: &'c mut Cart,
        product_id: i32,
        quantity: i32,
    ) -> Result<&'c CartLine, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::validation("Quantity must be positive"));
        }

        let product = product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::validation(format!("Product {} does not exist", product_id))
            })?;

        cart.push(product.id, product.name, product.price, quantity)
    }

    /// Persists the cart as one order: the order row, one detail per line and
    /// the inventory decrements commit together or not at all. The cart is
    /// emptied only on success. Returns the new order id.
    #[instrument(skip(self, cart), fields(lines = cart.len()))]
    pub async fn commit(&self, cart: &mut Cart, request: CommitOrder) -> Result<i32, ServiceError> {
        let customer_id = request
            .customer_id
            .ok_or_else(|| ServiceError::validation("Please select a customer"))?;
        if cart.is_empty() {
            return Err(ServiceError::validation(
                "Order must have at least one item",
            ));
        }

        if customer::Entity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found(format!(
                "Customer {} not found",
                customer_id
            )));
        }

        let employee_id = match request.employee_id {
            Some(id) => Some(
                employee::Entity::find_by_id(id)
                    .one(&*self.db)
                    .await?
                    .map(|e| e.id)
                    .ok_or_else(|| ServiceError::not_found(format!("Employee {} not found", id)))?,
            ),
            None => default_employee(&*self.db).await?.map(|e| e.id),
        };

        let total = cart.total();
        let lines = cart.lines().to_vec();
        let demand = cart.quantities_by_product();
        let allow_negative = self.config.allow_negative_stock;

        let order_id = with_transaction(&self.db, |txn| {
            Box::pin(async move {
                if !allow_negative {
                    for (product_id, wanted) in &demand {
                        let on_hand = inventory::Entity::find()
                            .filter(inventory::Column::ProductId.eq(*product_id))
                            .one(txn)
                            .await?
                            .map(|i| i.quantity)
                            .unwrap_or(0);
                        if on_hand < *wanted {
                            return Err(ServiceError::InsufficientStock(format!(
                                "Product {} has {} in stock, {} requested",
                                product_id, on_hand, wanted
                            )));
                        }
                    }
                }

                let order = order::ActiveModel {
                    customer_id: Set(customer_id),
                    employee_id: Set(employee_id),
                    order_date: Set(today()),
                    total_amount: Set(total),
                    status: Set(request.status),
                    payment_method: Set(Some(request.payment_method)),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                for line in &lines {
                    // The product may have been deleted since it was added to the cart.
                    if product::Entity::find_by_id(line.product_id)
                        .one(txn)
                        .await?
                        .is_none()
                    {
                        return Err(ServiceError::not_found(format!(
                            "Product {} not found",
                            line.product_id
                        )));
                    }

                    order_detail::ActiveModel {
                        order_id: Set(order.id),
                        product_id: Set(line.product_id),
                        quantity: Set(line.quantity),
                        unit_price: Set(line.unit_price),
                        subtotal: Set(line.subtotal),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    inventory::Entity::update_many()
                        .col_expr(
                            inventory::Column::Quantity,
                            Expr::col(inventory::Column::Quantity).sub(line.quantity),
                        )
                        .filter(inventory::Column::ProductId.eq(line.product_id))
                        .exec(txn)
                        .await?;
                }

                let oversold = inventory::Entity::find()
                    .filter(
                        inventory::Column::ProductId
                            .is_in(demand.iter().map(|(product_id, _)| *product_id)),
                    )
                    .filter(inventory::Column::Quantity.lt(0))
                    .all(txn)
                    .await?;
                for item in oversold {
                    warn!(
                        product_id = item.product_id,
                        quantity = item.quantity,
                        "Order drove stock below zero"
                    );
                }

                Ok::<_, ServiceError>(order.id)
            })
        })
        .await?;

        cart.clear();
        info!(order_id, customer_id, %total, "Order created");
        self.event_sender.send_or_log(Event::OrderCreated(order_id));
        Ok(order_id)
    }

    pub(crate) fn summaries() -> Select<order::Entity> {
        order::Entity::find()
            .select_only()
            .columns([
                order::Column::Id,
                order::Column::CustomerId,
                order::Column::OrderDate,
                order::Column::TotalAmount,
                order::Column::Status,
                order::Column::PaymentMethod,
            ])
            .column_as(customer::Column::FirstName, "first_name")
            .column_as(customer::Column::LastName, "last_name")
            .join(JoinType::InnerJoin, order::Relation::Customer.def())
    }

    /// All orders, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderSummary>, ServiceError> {
        Ok(Self::summaries()
            .order_by_desc(order::Column::OrderDate)
            .order_by_desc(order::Column::Id)
            .into_model::<OrderSummary>()
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i32) -> Result<OrderWithDetails, ServiceError> {
        let (order, customer) = order::Entity::find_by_id(order_id)
            .find_also_related(customer::Entity)
            .one(&*self.db)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;

        let employee_name = match order.employee_id {
            Some(id) => employee::Entity::find_by_id(id)
                .one(&*self.db)
                .await?
                .map(|e| format!("{} {}", e.first_name, e.last_name)),
            None => None,
        };

        let lines = order_detail::Entity::find()
            .select_only()
            .columns([
                order_detail::Column::Id,
                order_detail::Column::ProductId,
                order_detail::Column::Quantity,
                order_detail::Column::UnitPrice,
                order_detail::Column::Subtotal,
            ])
            .column_as(product::Column::Name, "product_name")
            .join(JoinType::InnerJoin, order_detail::Relation::Product.def())
            .filter(order_detail::Column::OrderId.eq(order_id))
            .order_by_asc(order_detail::Column::Id)
            .into_model::<OrderLine>()
            .all(&*self.db)
            .await?;

        Ok(OrderWithDetails {
            customer_name: customer.map(|c| c.full_name()).unwrap_or_default(),
            employee_name,
            lines,
            order,
        })
    }

    /// Changes only the status; revenue figures follow on the next read.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: i32,
        status: OrderStatus,
    ) -> Result<(), ServiceError> {
        let existing = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;
        let old_status = existing.status;

        let mut model: order::ActiveModel = existing.into();
        model.status = Set(status);
        model.update(&*self.db).await?;

        info!(order_id, %old_status, new_status = %status, "Order status changed");
        self.event_sender.send_or_log(Event::OrderStatusChanged {
            order_id,
            old_status,
            new_status: status,
        });
        Ok(())
    }
}

fn order_not_found(id: i32) -> ServiceError {
    ServiceError::not_found(format!("Order {} not found", id))
}
