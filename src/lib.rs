//! Shoe Shop Library
//!
//! Products, customers, orders and inventory for a single shoe shop, kept in
//! a local SQLite database.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod formatting;
pub mod migrator;
pub mod seed;
pub mod services;
pub mod session;

use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::AppServices;

/// Everything a presentation layer needs, wired to one database.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub event_sender: Arc<EventSender>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> (Self, mpsc::Receiver<Event>) {
        let (sender, events) = EventSender::channel(config.event_channel_capacity);
        let db = Arc::new(db);
        let config = Arc::new(config);
        let event_sender = Arc::new(sender);
        let services = AppServices::new(db.clone(), event_sender.clone(), config.clone());

        (
            Self {
                db,
                config,
                event_sender,
                services,
            },
            events,
        )
    }
}

/// Connects, creates the schema and (when enabled) seeds a fresh database.
pub async fn bootstrap(config: AppConfig) -> Result<(AppState, mpsc::Receiver<Event>), ServiceError> {
    let db = db::establish_connection_from_app_config(&config).await?;
    db::ensure_schema(&db).await?;

    let (state, events) = AppState::new(db, config);
    if state.config.seed_sample_data && seed::seed_if_empty(&state.db).await? {
        state.event_sender.send_or_log(Event::DataSeeded);
    }

    info!("Shoe shop ready");
    Ok((state, events))
}
