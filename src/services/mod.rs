//! Data access operations, aggregation queries and the order workflow.

pub mod cart;
pub mod catalog;
pub mod customers;
pub mod dashboard;
pub mod inventory;
pub mod orders;
pub mod products;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{Condition, DatabaseConnection};
use std::str::FromStr;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::events::EventSender;

/// Every service, sharing one pool and one event channel.
#[derive(Clone)]
pub struct AppServices {
    pub products: products::ProductService,
    pub customers: customers::CustomerService,
    pub inventory: inventory::InventoryService,
    pub orders: orders::OrderService,
    pub dashboard: dashboard::DashboardService,
    pub catalog: catalog::CatalogService,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            products: products::ProductService::new(db.clone(), event_sender.clone()),
            customers: customers::CustomerService::new(db.clone(), event_sender.clone()),
            inventory: inventory::InventoryService::new(db.clone(), event_sender.clone()),
            orders: orders::OrderService::new(db.clone(), event_sender, config.clone()),
            dashboard: dashboard::DashboardService::new(db.clone(), config),
            catalog: catalog::CatalogService::new(db),
        }
    }
}

/// Current date as SQLite's `CURRENT_DATE` reports it.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Trimmed text, or `None` when blank.
pub(crate) fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Case-insensitive "contains" over several text columns; a row matches if
/// any column does. `None` for a blank term so callers can skip the filter.
pub(crate) fn matches_any<I>(columns: I, term: Option<&str>) -> Option<Condition>
where
    I: IntoIterator<Item = SimpleExpr>,
{
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;
    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));

    Some(columns.into_iter().fold(Condition::any(), |cond, column| {
        cond.add(
            Expr::expr(Func::lower(column))
                .like(LikeExpr::new(pattern.as_str()).escape(LIKE_ESCAPE)),
        )
    }))
}

const LIKE_ESCAPE: char = '\\';

/// Makes `%` and `_` in user text match literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Parses user-entered money or measurement text.
pub(crate) fn parse_decimal(field: &str, text: &str) -> Result<Option<Decimal>, ServiceError> {
    match non_blank(text) {
        None => Ok(None),
        Some(value) => Decimal::from_str(&value).map(Some).map_err(|_| {
            ServiceError::validation(format!("Please enter a valid numeric value for {}", field))
        }),
    }
}

/// Parses one of the closed text enums, naming the allowed values on failure.
pub(crate) fn parse_choice<T>(field: &str, text: &str) -> Result<Option<T>, ServiceError>
where
    T: FromStr + sea_orm::Iterable + std::fmt::Display,
{
    match non_blank(text) {
        None => Ok(None),
        Some(value) => T::from_str(&value).map(Some).map_err(|_| {
            let allowed: Vec<String> = T::iter().map(|v| v.to_string()).collect();
            ServiceError::validation(format!("{} must be one of: {}", field, allowed.join(", ")))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Gender, PaymentMethod};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn decimals_accept_blank_and_reject_words() {
        assert_eq!(parse_decimal("price", " 2499.50 ").unwrap(), Some(dec!(2499.50)));
        assert_eq!(parse_decimal("size", "   ").unwrap(), None);
        assert_matches!(
            parse_decimal("price", "cheap"),
            Err(ServiceError::ValidationError(msg)) if msg.contains("price")
        );
    }

    #[test]
    fn choices_list_allowed_values_on_failure() {
        assert_eq!(parse_choice::<Gender>("Gender", "kids").unwrap(), Some(Gender::Kids));
        assert_eq!(parse_choice::<Gender>("Gender", "").unwrap(), None);
        assert_eq!(
            parse_choice::<PaymentMethod>("Payment method", "paymaya").unwrap(),
            Some(PaymentMethod::PayMaya)
        );

        let err = parse_choice::<Gender>("Gender", "Adults").unwrap_err();
        assert_eq!(err.user_message(), "Gender must be one of: Men, Women, Unisex, Kids");
    }

    #[test]
    fn blank_search_terms_disable_the_filter() {
        let columns = || -> Vec<SimpleExpr> { vec![Expr::col(sea_orm::sea_query::Alias::new("name")).into()] };
        assert!(matches_any(columns(), None).is_none());
        assert!(matches_any(columns(), Some("  ")).is_none());
        assert!(matches_any(columns(), Some("Nike")).is_some());
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("court_classic"), "court\\_classic");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("air max"), "air max");
    }
}
