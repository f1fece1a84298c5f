use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A committed sale. `total_amount` is fixed at commit time from the detail
/// subtotals.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_id: i32,
    #[sea_orm(nullable)]
    pub employee_id: Option<i32>,
    pub order_date: NaiveDate,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[sea_orm(nullable)]
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
    #[sea_orm(has_many = "super::order_detail::Entity")]
    OrderDetails,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::order_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Order status enumeration
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[strum(ascii_case_insensitive)]
pub enum OrderStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Processing")]
    Processing,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Payment method enumeration
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(30))")]
#[strum(ascii_case_insensitive)]
pub enum PaymentMethod {
    #[sea_orm(string_value = "Cash")]
    Cash,
    #[sea_orm(string_value = "Credit Card")]
    #[strum(serialize = "Credit Card")]
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[sea_orm(string_value = "Debit Card")]
    #[strum(serialize = "Debit Card")]
    #[serde(rename = "Debit Card")]
    DebitCard,
    #[sea_orm(string_value = "GCash")]
    #[strum(serialize = "GCash")]
    GCash,
    #[sea_orm(string_value = "PayMaya")]
    #[strum(serialize = "PayMaya")]
    PayMaya,
    #[sea_orm(string_value = "Bank Transfer")]
    #[strum(serialize = "Bank Transfer")]
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::Cash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn payment_methods_parse_their_display_text() {
        assert_eq!(
            PaymentMethod::from_str("credit card").unwrap(),
            PaymentMethod::CreditCard
        );
        assert_eq!(PaymentMethod::from_str("GCASH").unwrap(), PaymentMethod::GCash);
        assert_eq!(PaymentMethod::BankTransfer.to_string(), "Bank Transfer");
        assert!(PaymentMethod::from_str("Bitcoin").is_err());
    }

    #[test]
    fn status_parsing_ignores_case() {
        assert_eq!(OrderStatus::from_str("completed").unwrap(), OrderStatus::Completed);
        assert_eq!(OrderStatus::Cancelled.to_string(), "Cancelled");
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }
}
