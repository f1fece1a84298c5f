use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use shoe_shop::{
    bootstrap, config,
    entities::{OrderStatus, PaymentMethod},
    errors::ServiceError,
    events,
    formatting::format_currency,
    seed,
    services::{
        cart::Cart,
        customers::CustomerInput,
        dashboard::Dashboard,
        inventory::{InventoryRow, StockFilter},
        orders::{CommitOrder, OrderSummary, OrderWithDetails},
        products::{ProductInput, ProductRow},
    },
    AppState,
};

mod shell;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config().context("failed to load application config")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let (state, mut event_rx) = bootstrap(cfg)
        .await
        .context("failed to open the shop database")?;

    let json = cli.json;
    let outcome = match cli.command {
        Commands::Dashboard => handle_dashboard(&state, json).await,
        Commands::Products(command) => handle_products_command(&state, command, json).await,
        Commands::Customers(command) => handle_customers_command(&state, command, json).await,
        Commands::Inventory(command) => handle_inventory_command(&state, command, json).await,
        Commands::Orders(command) => handle_orders_command(&state, command, json).await,
        Commands::Reference(command) => handle_reference_command(&state, command, json).await,
        Commands::Seed => handle_seed(&state).await,
        Commands::Shell => shell::run(&state, &mut event_rx).await,
    };

    for event in events::drain(&mut event_rx) {
        debug!(target: "shoe_shop_cli", event = ?event, "change published");
    }
    if let Err(err) = shoe_shop::db::close_pool(state.db.as_ref().clone()).await {
        debug!(error = %err, "pool did not close cleanly");
    }

    outcome
}

#[derive(Parser)]
#[command(name = "shoe-shop", about = "Shoe shop products, customers, orders and inventory", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Headline figures and the latest orders
    Dashboard,
    #[command(subcommand)]
    Products(ProductsCommands),
    #[command(subcommand)]
    Customers(CustomersCommands),
    #[command(subcommand)]
    Inventory(InventoryCommands),
    #[command(subcommand)]
    Orders(OrdersCommands),
    #[command(subcommand)]
    Reference(ReferenceCommands),
    /// Insert the sample data set if the database is empty
    Seed,
    /// Interactive session with a persistent cart
    Shell,
}

#[derive(Subcommand)]
enum ProductsCommands {
    List(SearchArgs),
    Show(IdArg),
    Add(ProductArgs),
    Update {
        id: i32,
        #[command(flatten)]
        fields: ProductArgs,
    },
    Delete(IdArg),
}

#[derive(Subcommand)]
enum CustomersCommands {
    List(SearchArgs),
    Show(IdArg),
    Add(CustomerArgs),
    Update {
        id: i32,
        #[command(flatten)]
        fields: CustomerArgs,
    },
    Delete(IdArg),
}

#[derive(Subcommand)]
enum InventoryCommands {
    List {
        #[arg(long, help = "Match against product name or brand")]
        search: Option<String>,
        #[arg(long, default_value = "all", value_parser = parse_stock_filter, help = "all, low or out")]
        filter: StockFilter,
    },
    Restock {
        #[arg(help = "Inventory row id")]
        id: i32,
        #[arg(help = "Units to add")]
        quantity: i32,
    },
    /// Top every low-stock row up to its minimum plus the restock buffer
    RestockLow,
}

#[derive(Subcommand)]
enum OrdersCommands {
    List,
    Show(IdArg),
    Create(CreateOrderArgs),
    SetStatus {
        id: i32,
        #[arg(value_parser = parse_status)]
        status: OrderStatus,
    },
}

#[derive(Subcommand)]
enum ReferenceCommands {
    Categories,
    Suppliers,
    Employees,
}

#[derive(Args)]
struct SearchArgs {
    #[arg(long, help = "Case-insensitive substring filter")]
    search: Option<String>,
}

#[derive(Args)]
struct IdArg {
    id: i32,
}

#[derive(Args)]
struct ProductArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "", help = "Category name; blank for none")]
    category: String,
    #[arg(long, default_value = "", help = "Supplier name; blank for none")]
    supplier: String,
    #[arg(long, default_value = "")]
    brand: String,
    #[arg(long, default_value = "")]
    size: String,
    #[arg(long, default_value = "")]
    color: String,
    #[arg(long, default_value = "", help = "Men, Women, Unisex or Kids")]
    gender: String,
    #[arg(long)]
    price: String,
    #[arg(long, default_value = "")]
    cost_price: String,
    #[arg(long, default_value = "")]
    description: String,
}

impl From<ProductArgs> for ProductInput {
    fn from(args: ProductArgs) -> Self {
        ProductInput {
            name: args.name,
            category: args.category,
            supplier: args.supplier,
            brand: args.brand,
            size: args.size,
            color: args.color,
            gender: args.gender,
            price: args.price,
            cost_price: args.cost_price,
            description: args.description,
        }
    }
}

#[derive(Args)]
struct CustomerArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    address: Option<String>,
}

impl From<CustomerArgs> for CustomerInput {
    fn from(args: CustomerArgs) -> Self {
        CustomerInput {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone: args.phone,
            address: args.address,
        }
    }
}

#[derive(Args)]
struct CreateOrderArgs {
    #[arg(long, help = "Customer id")]
    customer: i32,
    #[arg(long, help = "Employee id; defaults to the first employee")]
    employee: Option<i32>,
    #[arg(
        long = "item",
        required = true,
        value_parser = parse_item,
        help = "Line item as PRODUCT_ID:QUANTITY (repeatable)"
    )]
    items: Vec<(i32, i32)>,
    #[arg(long, default_value = "Pending", value_parser = parse_status)]
    status: OrderStatus,
    #[arg(long, default_value = "Cash", value_parser = parse_payment)]
    payment: PaymentMethod,
}

fn parse_item(raw: &str) -> std::result::Result<(i32, i32), String> {
    let (product, quantity) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected PRODUCT_ID:QUANTITY, got '{}'", raw))?;
    let product = product
        .trim()
        .parse()
        .map_err(|_| format!("invalid product id '{}'", product))?;
    let quantity = quantity
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity '{}'", quantity))?;
    Ok((product, quantity))
}

fn parse_status(raw: &str) -> std::result::Result<OrderStatus, String> {
    raw.parse()
        .map_err(|_| "expected Pending, Processing, Completed or Cancelled".to_string())
}

fn parse_payment(raw: &str) -> std::result::Result<PaymentMethod, String> {
    raw.parse().map_err(|_| {
        "expected Cash, Credit Card, Debit Card, GCash, PayMaya or Bank Transfer".to_string()
    })
}

fn parse_stock_filter(raw: &str) -> std::result::Result<StockFilter, String> {
    raw.parse()
        .map_err(|_| "expected all, low or out".to_string())
}

/// Logs the full error and keeps only the user-facing message.
pub(crate) fn report(err: ServiceError) -> anyhow::Error {
    debug!(kind = %err.kind(), error = %err, "operation failed");
    anyhow!(err.user_message())
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn handle_dashboard(state: &AppState, json: bool) -> Result<()> {
    let dashboard = state.services.dashboard.dashboard().await.map_err(report)?;
    if json {
        print_json(&dashboard)
    } else {
        render_dashboard(&dashboard);
        Ok(())
    }
}

async fn handle_products_command(
    state: &AppState,
    command: ProductsCommands,
    json: bool,
) -> Result<()> {
    let service = &state.services.products;
    match command {
        ProductsCommands::List(args) => {
            let rows = service.list(args.search.as_deref()).await.map_err(report)?;
            if json {
                print_json(&rows)
            } else {
                render_products(&rows);
                Ok(())
            }
        }
        ProductsCommands::Show(args) => {
            let row = service.get(args.id).await.map_err(report)?;
            if json {
                print_json(&row)
            } else {
                render_products(std::slice::from_ref(&row));
                if let Some(description) = &row.description {
                    println!("  {}", description);
                }
                Ok(())
            }
        }
        ProductsCommands::Add(args) => {
            let id = service.create(args.into()).await.map_err(report)?;
            println!("Product added successfully (id {})", id);
            Ok(())
        }
        ProductsCommands::Update { id, fields } => {
            service.update(id, fields.into()).await.map_err(report)?;
            println!("Product updated successfully");
            Ok(())
        }
        ProductsCommands::Delete(args) => {
            service.delete(args.id).await.map_err(report)?;
            println!("Product deleted successfully");
            Ok(())
        }
    }
}

async fn handle_customers_command(
    state: &AppState,
    command: CustomersCommands,
    json: bool,
) -> Result<()> {
    let service = &state.services.customers;
    match command {
        CustomersCommands::List(args) => {
            let rows = service.list(args.search.as_deref()).await.map_err(report)?;
            if json {
                print_json(&rows)
            } else {
                for c in &rows {
                    println!(
                        "{:>4}  {:<24} {:<30} {:<18} {}",
                        c.id,
                        c.full_name(),
                        c.email.as_deref().unwrap_or("-"),
                        c.phone.as_deref().unwrap_or("-"),
                        c.registration_date
                    );
                }
                Ok(())
            }
        }
        CustomersCommands::Show(args) => {
            let customer = service.get(args.id).await.map_err(report)?;
            if json {
                print_json(&customer)
            } else {
                println!("{} (id {})", customer.full_name(), customer.id);
                println!("  email:      {}", customer.email.as_deref().unwrap_or("-"));
                println!("  phone:      {}", customer.phone.as_deref().unwrap_or("-"));
                println!("  address:    {}", customer.address.as_deref().unwrap_or("-"));
                println!("  registered: {}", customer.registration_date);
                Ok(())
            }
        }
        CustomersCommands::Add(args) => {
            let id = service.create(args.into()).await.map_err(report)?;
            println!("Customer added successfully (id {})", id);
            Ok(())
        }
        CustomersCommands::Update { id, fields } => {
            service.update(id, fields.into()).await.map_err(report)?;
            println!("Customer updated successfully");
            Ok(())
        }
        CustomersCommands::Delete(args) => {
            service.delete(args.id).await.map_err(report)?;
            println!("Customer deleted successfully");
            Ok(())
        }
    }
}

async fn handle_inventory_command(
    state: &AppState,
    command: InventoryCommands,
    json: bool,
) -> Result<()> {
    let service = &state.services.inventory;
    match command {
        InventoryCommands::List { search, filter } => {
            let rows = service
                .search(search.as_deref(), filter)
                .await
                .map_err(report)?;
            if json {
                print_json(&rows)
            } else {
                render_inventory(&rows);
                Ok(())
            }
        }
        InventoryCommands::Restock { id, quantity } => {
            service.restock_one(id, quantity).await.map_err(report)?;
            println!("Inventory restocked successfully");
            Ok(())
        }
        InventoryCommands::RestockLow => {
            let count = service.restock_all_low_stock().await.map_err(report)?;
            println!("{} items restocked!", count);
            Ok(())
        }
    }
}

async fn handle_orders_command(
    state: &AppState,
    command: OrdersCommands,
    json: bool,
) -> Result<()> {
    let service = &state.services.orders;
    match command {
        OrdersCommands::List => {
            let orders = service.list_orders().await.map_err(report)?;
            if json {
                print_json(&orders)
            } else {
                render_orders(&orders);
                Ok(())
            }
        }
        OrdersCommands::Show(args) => {
            let order = service.get_order(args.id).await.map_err(report)?;
            if json {
                print_json(&order)
            } else {
                render_order(&order);
                Ok(())
            }
        }
        OrdersCommands::Create(args) => {
            let mut cart = Cart::new();
            for (product_id, quantity) in &args.items {
                service
                    .add_line(&mut cart, *product_id, *quantity)
                    .await
                    .map_err(report)?;
            }
            let total = cart.total();
            let order_id = service
                .commit(
                    &mut cart,
                    CommitOrder {
                        customer_id: Some(args.customer),
                        employee_id: args.employee,
                        status: args.status,
                        payment_method: args.payment,
                    },
                )
                .await
                .map_err(report)?;
            println!(
                "Order created successfully! Order ID: {} (total {})",
                order_id,
                format_currency(total)
            );
            Ok(())
        }
        OrdersCommands::SetStatus { id, status } => {
            service.update_status(id, status).await.map_err(report)?;
            println!("Order {} is now {}", id, status);
            Ok(())
        }
    }
}

async fn handle_reference_command(
    state: &AppState,
    command: ReferenceCommands,
    json: bool,
) -> Result<()> {
    let catalog = &state.services.catalog;
    match command {
        ReferenceCommands::Categories => {
            let rows = catalog.list_categories().await.map_err(report)?;
            if json {
                return print_json(&rows);
            }
            for c in &rows {
                println!("{:>3}  {:<16} {}", c.id, c.name, c.description.as_deref().unwrap_or(""));
            }
        }
        ReferenceCommands::Suppliers => {
            let rows = catalog.list_suppliers().await.map_err(report)?;
            if json {
                return print_json(&rows);
            }
            for s in &rows {
                println!(
                    "{:>3}  {:<22} {:<18} {}",
                    s.id,
                    s.name,
                    s.contact_person.as_deref().unwrap_or("-"),
                    s.phone.as_deref().unwrap_or("-")
                );
            }
        }
        ReferenceCommands::Employees => {
            let rows = catalog.list_employees().await.map_err(report)?;
            if json {
                return print_json(&rows);
            }
            for e in &rows {
                println!(
                    "{:>3}  {} {:<12} {}",
                    e.id,
                    e.first_name,
                    e.last_name,
                    e.position.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

async fn handle_seed(state: &AppState) -> Result<()> {
    if seed::seed_if_empty(&state.db).await.map_err(report)? {
        println!("Sample data inserted");
    } else {
        println!("Database already has data; nothing to do");
    }
    Ok(())
}

pub(crate) fn render_dashboard(dashboard: &Dashboard) {
    let c = &dashboard.counts;
    println!("Total Products   {:>8}", c.products);
    println!("Total Customers  {:>8}", c.customers);
    println!("Total Orders     {:>8}", c.orders);
    println!("Low Stock Items  {:>8}", c.low_stock);
    println!("Total Revenue    {}", format_currency(dashboard.total_revenue));
    println!("Avg Order Value  {}", format_currency(dashboard.average_order_value));
    println!();
    println!("Recent Orders");
    for o in &dashboard.recent_orders {
        println!(
            "{:>4}  {:<24} {}  {:>14}  {}",
            o.id, o.customer_name, o.order_date, o.total_display, o.status
        );
    }
}

pub(crate) fn render_products(rows: &[ProductRow]) {
    for p in rows {
        println!(
            "{:>4}  {:<20} {:<14} {:>5} {:<12} {:>12}  {}",
            p.id,
            p.name,
            p.brand.as_deref().unwrap_or("-"),
            p.size.map(|s| s.normalize().to_string()).unwrap_or_default(),
            p.color.as_deref().unwrap_or("-"),
            format_currency(p.price),
            p.category_name.as_deref().unwrap_or("-")
        );
    }
}

pub(crate) fn render_inventory(rows: &[InventoryRow]) {
    for i in rows {
        println!(
            "{:>4}  {:<20} {:<14} {:>6} {:>6}  {}",
            i.id,
            i.product_name,
            i.brand.as_deref().unwrap_or("-"),
            i.quantity,
            i.min_stock_level,
            i.status
        );
    }
}

fn render_orders(orders: &[OrderSummary]) {
    for o in orders {
        println!(
            "{:>4}  {:<24} {}  {:>14}  {:<10} {}",
            o.id,
            o.customer_name(),
            o.order_date,
            format_currency(o.total_amount),
            o.status,
            o.payment_method.map(|p| p.to_string()).unwrap_or_default()
        );
    }
}

fn render_order(details: &OrderWithDetails) {
    let order = &details.order;
    println!(
        "Order {} • {} • {} • {}",
        order.id, details.customer_name, order.order_date, order.status
    );
    if let Some(employee) = &details.employee_name {
        println!("  handled by {}", employee);
    }
    for line in &details.lines {
        println!(
            "  {:>3} x {:<20} @ {:>12} = {:>12}",
            line.quantity,
            line.product_name,
            format_currency(line.unit_price),
            format_currency(line.subtotal)
        );
    }
    println!("  total {}", format_currency(order.total_amount));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_item_pairs() {
        assert_eq!(parse_item("3:2").unwrap(), (3, 2));
        assert_eq!(parse_item(" 7 : 1 ").unwrap(), (7, 1));
        assert!(parse_item("3").is_err());
        assert!(parse_item("x:1").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_an_order_command() {
        let cli = Cli::try_parse_from([
            "shoe-shop",
            "orders",
            "create",
            "--customer",
            "1",
            "--item",
            "1:2",
            "--item",
            "2:1",
            "--payment",
            "gcash",
        ])
        .unwrap();

        match cli.command {
            Commands::Orders(OrdersCommands::Create(args)) => {
                assert_eq!(args.items, vec![(1, 2), (2, 1)]);
                assert_eq!(args.payment, PaymentMethod::GCash);
                assert_eq!(args.status, OrderStatus::Pending);
            }
            _ => panic!("expected orders create"),
        }
    }
}
