mod common;

use common::{test_config, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shoe_shop::{
    entities::OrderStatus,
    events::Event,
    services::{cart::Cart, orders::CommitOrder},
    session::{Section, Session},
};

#[tokio::test]
async fn empty_shop_reports_zeroes() {
    let app = TestApp::new().await;
    let dashboard = app.state.services.dashboard.dashboard().await.unwrap();

    assert_eq!(dashboard.counts.products, 0);
    assert_eq!(dashboard.counts.customers, 0);
    assert_eq!(dashboard.counts.orders, 0);
    assert_eq!(dashboard.counts.low_stock, 0);
    assert_eq!(dashboard.total_revenue, Decimal::ZERO);
    assert_eq!(dashboard.average_order_value, Decimal::ZERO);
    assert!(dashboard.recent_orders.is_empty());
}

#[tokio::test]
async fn seeded_figures() {
    let app = TestApp::seeded().await;
    let dashboard = app.state.services.dashboard.dashboard().await.unwrap();

    assert_eq!(dashboard.counts.products, 10);
    assert_eq!(dashboard.counts.customers, 10);
    assert_eq!(dashboard.counts.orders, 5);
    assert_eq!(dashboard.counts.low_stock, 0);
    assert_eq!(dashboard.total_revenue, dec!(22999.95));
    assert_eq!(dashboard.average_order_value, dec!(7666.65));

    let first = &dashboard.recent_orders[0];
    assert_eq!(first.id, 5);
    assert_eq!(first.customer_name, "Michael Tan");
    assert_eq!(first.total_display, "₱4,499.98");
    assert_eq!(first.status, OrderStatus::Completed);
}

#[tokio::test]
async fn revenue_follows_status_changes() {
    let app = TestApp::seeded().await;
    let services = &app.state.services;

    services.orders.update_status(2, OrderStatus::Cancelled).await.unwrap();
    assert_eq!(services.dashboard.total_revenue().await.unwrap(), dec!(9999.97));

    services.orders.update_status(2, OrderStatus::Completed).await.unwrap();
    assert_eq!(services.dashboard.total_revenue().await.unwrap(), dec!(22999.95));
    assert_eq!(
        services.dashboard.average_order_value().await.unwrap(),
        dec!(7666.65)
    );
}

#[tokio::test]
async fn low_stock_count_tracks_sales() {
    let app = TestApp::new().await;
    let customer = app.add_customer("Ana", "Garcia").await;
    let product = app.add_product("Runner", dec!(100)).await;
    app.set_stock(product, 11, 10).await;

    let services = &app.state.services;
    assert_eq!(services.dashboard.dashboard_counts().await.unwrap().low_stock, 0);

    let mut cart = Cart::new();
    services.orders.add_line(&mut cart, product, 2).await.unwrap();
    services
        .orders
        .commit(&mut cart, CommitOrder { customer_id: Some(customer), ..Default::default() })
        .await
        .unwrap();

    assert_eq!(services.dashboard.dashboard_counts().await.unwrap().low_stock, 1);
}

#[tokio::test]
async fn recent_orders_respect_the_configured_limit() {
    let mut cfg = test_config();
    cfg.recent_orders_limit = 2;
    let app = TestApp::with_config(cfg).await;
    shoe_shop::seed::seed_if_empty(&app.state.db).await.unwrap();

    let dashboard = app.state.services.dashboard.dashboard().await.unwrap();
    let ids: Vec<_> = dashboard.recent_orders.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![5, 4]);
    assert_eq!(app.state.services.dashboard.recent_orders(10).await.unwrap().len(), 5);
}

#[tokio::test]
async fn session_refreshes_after_writes_on_the_dashboard() {
    let mut app = TestApp::seeded().await;

    let (session, refresh) = Session::new().take_refresh();
    assert!(refresh);

    let session = session.navigate(Section::Products);
    app.state
        .services
        .orders
        .update_status(3, OrderStatus::Completed)
        .await
        .unwrap();

    let session = app
        .take_events()
        .iter()
        .fold(session, |session, event| session.observe(event));
    assert!(session.dashboard_stale());
    let (session, refresh) = session.take_refresh();
    assert!(!refresh);

    let (session, refresh) = session.navigate(Section::Dashboard).take_refresh();
    assert!(refresh);
    assert!(!session.dashboard_stale());

    let session = session.observe(&Event::OrderCreated(6));
    let (_, refresh) = session.take_refresh();
    assert!(refresh);
}
