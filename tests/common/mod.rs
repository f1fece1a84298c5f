#![allow(dead_code)]

use rust_decimal::Decimal;
use sea_orm::{sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter};
use shoe_shop::{
    config::AppConfig,
    db,
    entities::inventory,
    events::{self, Event},
    seed,
    services::{customers::CustomerInput, products::ProductInput},
    AppState,
};
use tokio::sync::mpsc;

/// Application state over a private in-memory SQLite database.
pub struct TestApp {
    pub state: AppState,
    pub events: mpsc::Receiver<Event>,
}

impl TestApp {
    /// Empty schema, no sample data.
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Schema plus the sample data set.
    pub async fn seeded() -> Self {
        let app = Self::new().await;
        assert!(seed::seed_if_empty(&app.state.db)
            .await
            .expect("seed sample data"));
        app
    }

    pub async fn with_config(cfg: AppConfig) -> Self {
        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::ensure_schema(&pool).await.expect("create schema");

        let (state, events) = AppState::new(pool, cfg);
        Self { state, events }
    }

    /// Everything published since the last call.
    pub fn take_events(&mut self) -> Vec<Event> {
        events::drain(&mut self.events)
    }

    pub async fn add_customer(&self, first: &str, last: &str) -> i32 {
        self.state
            .services
            .customers
            .create(CustomerInput {
                first_name: first.to_string(),
                last_name: last.to_string(),
                ..Default::default()
            })
            .await
            .expect("create customer")
    }

    pub async fn add_product(&self, name: &str, price: Decimal) -> i32 {
        self.state
            .services
            .products
            .create(ProductInput {
                name: name.to_string(),
                price: price.to_string(),
                ..Default::default()
            })
            .await
            .expect("create product")
    }

    pub async fn set_stock(&self, product_id: i32, quantity: i32, min_stock_level: i32) {
        inventory::Entity::update_many()
            .col_expr(inventory::Column::Quantity, Expr::value(quantity))
            .col_expr(inventory::Column::MinStockLevel, Expr::value(min_stock_level))
            .filter(inventory::Column::ProductId.eq(product_id))
            .exec(self.state.db.as_ref())
            .await
            .expect("set stock");
    }

    pub async fn stock_of(&self, product_id: i32) -> inventory::Model {
        inventory::Entity::find()
            .filter(inventory::Column::ProductId.eq(product_id))
            .one(self.state.db.as_ref())
            .await
            .expect("query inventory")
            .expect("inventory row exists")
    }
}

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::new("sqlite::memory:");
    cfg.seed_sample_data = false;
    cfg
}
