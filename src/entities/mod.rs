//! SeaORM entities for the shop schema.

pub mod category;
pub mod customer;
pub mod employee;
pub mod inventory;
pub mod order;
pub mod order_detail;
pub mod product;
pub mod supplier;

pub use order::{OrderStatus, PaymentMethod};
pub use product::Gender;
