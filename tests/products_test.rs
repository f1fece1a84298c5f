mod common;

use assert_matches::assert_matches;
use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use shoe_shop::{
    entities::{inventory, product, Gender},
    errors::ServiceError,
    events::Event,
    services::{cart::Cart, orders::CommitOrder, products::ProductInput},
};

fn sneaker() -> ProductInput {
    ProductInput {
        name: "Trail Runner".to_string(),
        category: "Running Shoes".to_string(),
        supplier: "Nike Philippines".to_string(),
        brand: "Nike".to_string(),
        size: "9.5".to_string(),
        color: "Olive".to_string(),
        gender: "unisex".to_string(),
        price: "4599.50".to_string(),
        cost_price: "2800".to_string(),
        description: String::new(),
    }
}

#[tokio::test]
async fn creating_a_product_pairs_it_with_an_empty_inventory_row() {
    let mut app = TestApp::seeded().await;
    let products = &app.state.services.products;

    let id = products.create(sneaker()).await.unwrap();

    let row = products.get(id).await.unwrap();
    assert_eq!(row.name, "Trail Runner");
    assert_eq!(row.category_name.as_deref(), Some("Running Shoes"));
    assert_eq!(row.supplier_name.as_deref(), Some("Nike Philippines"));
    assert_eq!(row.gender, Some(Gender::Unisex));
    assert_eq!(row.price.round_dp(2), dec!(4599.50));
    assert_eq!(row.description, None);

    let stock = app.stock_of(id).await;
    assert_eq!(stock.quantity, 0);
    assert_eq!(stock.min_stock_level, inventory::DEFAULT_MIN_STOCK_LEVEL);
    assert!(stock.last_restocked.is_some());

    assert!(app.take_events().contains(&Event::ProductCreated(id)));
}

#[tokio::test]
async fn invalid_forms_are_rejected_without_writing() {
    let app = TestApp::seeded().await;
    let products = &app.state.services.products;

    let cases = [
        (ProductInput { name: "   ".into(), ..sneaker() }, "Product name is required"),
        (ProductInput { price: "".into(), ..sneaker() }, "Price is required"),
        (ProductInput { price: "abc".into(), ..sneaker() }, "Please enter a valid numeric value for price"),
        (ProductInput { price: "-1".into(), ..sneaker() }, "Price must not be negative"),
        (ProductInput { size: "0".into(), ..sneaker() }, "Size must be positive"),
    ];
    for (input, message) in cases {
        let err = products.create(input).await.unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
        assert_eq!(err.user_message(), message);
    }

    let err = products
        .create(ProductInput { gender: "Robots".into(), ..sneaker() })
        .await
        .unwrap_err();
    assert!(err.user_message().starts_with("Gender must be one of"));

    let err = products
        .create(ProductInput { category: "Snowshoes".into(), ..sneaker() })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let db = app.state.db.as_ref();
    assert_eq!(product::Entity::find().count(db).await.unwrap(), 10);
    assert_eq!(inventory::Entity::find().count(db).await.unwrap(), 10);
}

#[tokio::test]
async fn list_filters_on_name_brand_or_category() {
    let app = TestApp::seeded().await;
    let products = &app.state.services.products;

    let all = products.list(None).await.unwrap();
    assert_eq!(all.len(), 10);
    assert!(all.windows(2).all(|w| w[0].id < w[1].id));

    let by_brand: Vec<_> = products
        .list(Some("world balance"))
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(by_brand, vec!["Comfort Slippers", "Running Pro"]);

    let by_category = products.list(Some("FORMAL")).await.unwrap();
    assert_eq!(by_category.len(), 2);

    assert_eq!(products.list(Some("")).await.unwrap().len(), 10);
    assert!(products.list(Some("zzz")).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_overwrites_every_field() {
    let app = TestApp::seeded().await;
    let products = &app.state.services.products;
    let id = products.create(sneaker()).await.unwrap();

    products
        .update(
            id,
            ProductInput {
                name: "Trail Runner GTX".into(),
                category: String::new(),
                price: "4999".into(),
                color: String::new(),
                ..sneaker()
            },
        )
        .await
        .unwrap();

    let row = products.get(id).await.unwrap();
    assert_eq!(row.name, "Trail Runner GTX");
    assert_eq!(row.category_id, None);
    assert_eq!(row.color, None);
    assert_eq!(row.price.round_dp(2), dec!(4999));

    let err = products.update(9999, sneaker()).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn delete_removes_product_and_inventory() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;
    let id = app.add_product("Loafer", dec!(1500)).await;

    products.delete(id).await.unwrap();

    assert_matches!(products.get(id).await, Err(ServiceError::NotFound(_)));
    let db = app.state.db.as_ref();
    assert_eq!(inventory::Entity::find().count(db).await.unwrap(), 0);
    assert_matches!(products.delete(id).await, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn products_on_orders_cannot_be_deleted() {
    let app = TestApp::new().await;
    let customer = app.add_customer("Ana", "Garcia").await;
    let id = app.add_product("Loafer", dec!(1500)).await;

    let orders = &app.state.services.orders;
    let mut cart = Cart::new();
    orders.add_line(&mut cart, id, 1).await.unwrap();
    orders
        .commit(
            &mut cart,
            CommitOrder {
                customer_id: Some(customer),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = app.state.services.products.delete(id).await.unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
    assert_eq!(err.user_message(), "Cannot delete product with existing orders");

    assert!(app.state.services.products.get(id).await.is_ok());
    assert_eq!(app.stock_of(id).await.quantity, -1);
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
    let app = TestApp::new().await;
    app.add_product("Air Max", dec!(5000)).await;
    app.add_product("Court_Classic", dec!(2500)).await;
    app.add_product("Promo 50% Off", dec!(999)).await;
    let products = &app.state.services.products;

    let names = |rows: Vec<shoe_shop::services::products::ProductRow>| {
        rows.into_iter().map(|p| p.name).collect::<Vec<_>>()
    };
    assert_eq!(names(products.list(Some("_")).await.unwrap()), vec!["Court_Classic"]);
    assert_eq!(names(products.list(Some("%")).await.unwrap()), vec!["Promo 50% Off"]);
    assert_eq!(names(products.list(Some("court_c")).await.unwrap()), vec!["Court_Classic"]);
}
