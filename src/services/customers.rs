use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoSimpleExpr,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use super::{matches_any, non_blank};
use crate::entities::{customer, order};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Customer form contents. Names are required; everything else may be blank.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CustomerInput {
    #[validate(length(min = 1, max = 50, message = "First and last name are required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "First and last name are required"))]
    pub last_name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CustomerInput {
    fn normalized(self) -> Result<Self, ServiceError> {
        let input = CustomerInput {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.as_deref().and_then(non_blank),
            phone: self.phone.as_deref().and_then(non_blank),
            address: self.address.as_deref().and_then(non_blank),
        };
        input.validate()?;
        Ok(input)
    }

    fn write_to(self, model: &mut customer::ActiveModel) {
        model.first_name = Set(self.first_name);
        model.last_name = Set(self.last_name);
        model.email = Set(self.email);
        model.phone = Set(self.phone);
        model.address = Set(self.address);
    }
}

/// Service for managing customers
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Lists customers by id, optionally narrowed to those whose first name,
    /// last name or email contains `filter`.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: Option<&str>) -> Result<Vec<customer::Model>, ServiceError> {
        let mut query = customer::Entity::find();
        if let Some(cond) = matches_any(
            [
                customer::Column::FirstName.into_simple_expr(),
                customer::Column::LastName.into_simple_expr(),
                customer::Column::Email.into_simple_expr(),
            ],
            filter,
        ) {
            query = query.filter(cond);
        }

        Ok(query
            .order_by_asc(customer::Column::Id)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| customer_not_found(id))
    }

    /// Registers a customer dated today. Returns the new id.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CustomerInput) -> Result<i32, ServiceError> {
        let input = input.normalized()?;

        let mut model = customer::ActiveModel {
            registration_date: Set(super::today()),
            ..Default::default()
        };
        input.write_to(&mut model);
        let created = model.insert(&*self.db).await?;

        info!(customer_id = created.id, "Customer created");
        self.event_sender
            .send_or_log(Event::CustomerCreated(created.id));
        Ok(created.id)
    }

    /// Overwrites name and contact details. The registration date is kept.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i32, input: CustomerInput) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;
        let input = input.normalized()?;

        let mut model: customer::ActiveModel = existing.into();
        input.write_to(&mut model);
        model.update(&*self.db).await?;

        info!(customer_id = id, "Customer updated");
        self.event_sender.send_or_log(Event::CustomerUpdated(id));
        Ok(())
    }

    /// Removes a customer that has never ordered.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.get(id).await?;

        let orders = order::Entity::find()
            .filter(order::Column::CustomerId.eq(id))
            .count(&*self.db)
            .await?;
        if orders > 0 {
            return Err(ServiceError::conflict(
                "Cannot delete customer with existing orders",
            ));
        }

        customer::Entity::delete_by_id(id).exec(&*self.db).await?;

        info!(customer_id = id, "Customer deleted");
        self.event_sender.send_or_log(Event::CustomerDeleted(id));
        Ok(())
    }
}

fn customer_not_found(id: i32) -> ServiceError {
    ServiceError::not_found(format!("Customer {} not found", id))
}
