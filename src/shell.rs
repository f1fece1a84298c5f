//! Line-oriented interactive session.
//!
//! Keeps one [`Session`] alive between commands so the cart survives section
//! changes, and redraws the dashboard whenever a published change asks for it.

use std::io::Write;
use std::str::FromStr;

use anyhow::Result;
use strum::IntoEnumIterator;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use shoe_shop::{
    entities::{OrderStatus, PaymentMethod},
    errors::ServiceError,
    events::{self, Event},
    formatting::format_currency,
    services::{inventory::StockFilter, orders::CommitOrder},
    session::{Section, Session},
    AppState,
};

use crate::{render_dashboard, render_inventory, render_products};

enum Flow {
    Continue,
    Quit,
}

pub async fn run(state: &AppState, event_rx: &mut mpsc::Receiver<Event>) -> Result<()> {
    let mut session = Session::new();
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    println!("Type 'help' for commands.");

    loop {
        for event in events::drain(event_rx) {
            session = session.observe(&event);
        }
        let (next, refresh) = session.take_refresh();
        session = next;
        if refresh {
            match state.services.dashboard.dashboard().await {
                Ok(dashboard) => render_dashboard(&dashboard),
                Err(err) => eprintln!("Error: {}", err.user_message()),
            }
        }

        print!("{}> ", session.active());
        std::io::stdout().flush()?;

        let Some(line) = input.next_line().await? else {
            break;
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((command, args)) = words.split_first() else {
            continue;
        };

        match execute(state, &mut session, command, args).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(err) => {
                tracing::debug!(kind = %err.kind(), error = %err, "shell command failed");
                eprintln!("Error: {}", err.user_message());
            }
        }
    }

    if !session.cart().is_empty() {
        println!("Discarding {} unsaved cart line(s)", session.cart().len());
    }
    Ok(())
}

async fn execute(
    state: &AppState,
    session: &mut Session,
    command: &str,
    args: &[&str],
) -> Result<Flow, ServiceError> {
    let services = &state.services;
    match command {
        "help" | "?" => print_help(),
        "quit" | "exit" => return Ok(Flow::Quit),
        "go" => {
            let section: Section = parse_arg(args, 0, "go <section>")?;
            *session = std::mem::take(session).navigate(section);
        }
        "dashboard" => {
            *session = std::mem::take(session).navigate(Section::Dashboard);
        }
        "list" => {
            let term = (!args.is_empty()).then(|| args.join(" "));
            list_active(state, session.active(), term.as_deref()).await?;
        }
        "add" => {
            let product_id: i32 = parse_arg(args, 0, "add <product id> <quantity>")?;
            let quantity: i32 = parse_arg(args, 1, "add <product id> <quantity>")?;
            let line = services
                .orders
                .add_line(session.cart_mut(), product_id, quantity)
                .await?;
            println!(
                "Added {} x {} ({})",
                line.quantity,
                line.product_name,
                format_currency(line.subtotal)
            );
        }
        "remove" => {
            let index: usize = parse_arg(args, 0, "remove <line>")?;
            let line = session.cart_mut().remove_line(index)?;
            println!("Removed {}", line.product_name);
        }
        "cart" => print_cart(session),
        "clear" => {
            session.cart_mut().clear();
            println!("Cart cleared");
        }
        "commit" => {
            let usage = "commit <customer id> [status] [payment]";
            let customer_id: i32 = parse_arg(args, 0, usage)?;
            let status = match args.get(1) {
                Some(raw) => parse_word::<OrderStatus>(raw, "Status", OrderStatus::iter())?,
                None => OrderStatus::default(),
            };
            let payment_method = match args.get(2..).filter(|rest| !rest.is_empty()) {
                Some(rest) => parse_word::<PaymentMethod>(
                    &rest.join(" "),
                    "Payment method",
                    PaymentMethod::iter(),
                )?,
                None => PaymentMethod::default(),
            };
            let order_id = services
                .orders
                .commit(
                    session.cart_mut(),
                    CommitOrder {
                        customer_id: Some(customer_id),
                        employee_id: None,
                        status,
                        payment_method,
                    },
                )
                .await?;
            println!("Order created successfully! Order ID: {}", order_id);
        }
        "restock" => {
            let id: i32 = parse_arg(args, 0, "restock <inventory id> <quantity>")?;
            let quantity: i32 = parse_arg(args, 1, "restock <inventory id> <quantity>")?;
            services.inventory.restock_one(id, quantity).await?;
            println!("Inventory restocked successfully");
        }
        "restock-low" => {
            let count = services.inventory.restock_all_low_stock().await?;
            println!("{} items restocked!", count);
        }
        "stock" => {
            let mode = match args.first() {
                Some(raw) => parse_word::<StockFilter>(raw, "Filter", [
                    StockFilter::All,
                    StockFilter::LowStock,
                    StockFilter::OutOfStock,
                ])?,
                None => StockFilter::All,
            };
            let term = (args.len() > 1).then(|| args[1..].join(" "));
            let rows = services.inventory.search(term.as_deref(), mode).await?;
            render_inventory(&rows);
        }
        other => {
            return Err(ServiceError::validation(format!(
                "Unknown command '{}'; type 'help'",
                other
            )))
        }
    }
    Ok(Flow::Continue)
}

async fn list_active(
    state: &AppState,
    section: Section,
    term: Option<&str>,
) -> Result<(), ServiceError> {
    let services = &state.services;
    match section {
        Section::Dashboard => render_dashboard(&services.dashboard.dashboard().await?),
        Section::Products => render_products(&services.products.list(term).await?),
        Section::Inventory => render_inventory(&services.inventory.list(term).await?),
        Section::Customers => {
            for c in services.customers.list(term).await? {
                println!(
                    "{:>4}  {:<24} {}",
                    c.id,
                    c.full_name(),
                    c.email.as_deref().unwrap_or("-")
                );
            }
        }
        Section::Orders => {
            for o in services.orders.list_orders().await? {
                println!(
                    "{:>4}  {:<24} {}  {:>14}  {}",
                    o.id,
                    o.customer_name(),
                    o.order_date,
                    format_currency(o.total_amount),
                    o.status
                );
            }
        }
    }
    Ok(())
}

fn print_cart(session: &Session) {
    let cart = session.cart();
    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }
    for (index, line) in cart.lines().iter().enumerate() {
        println!(
            "[{}] {:>3} x {:<20} @ {:>12} = {:>12}",
            index,
            line.quantity,
            line.product_name,
            format_currency(line.unit_price),
            format_currency(line.subtotal)
        );
    }
    println!("Total: {}", format_currency(cart.total()));
}

fn print_help() {
    let sections: Vec<String> = Section::iter().map(|s| s.to_string()).collect();
    println!("go <section>          switch to {}", sections.join(", "));
    println!("list [text]           list the current section, optionally filtered");
    println!("dashboard             show headline figures");
    println!("add <product> <qty>   put a product in the cart");
    println!("remove <line>         drop a cart line by its [index]");
    println!("cart | clear          show or empty the cart");
    println!("commit <customer> [status] [payment]");
    println!("restock <id> <qty>    add stock to one inventory row");
    println!("restock-low           top up every low-stock row");
    println!("stock [all|low|out] [text]");
    println!("quit");
}

fn parse_arg<T: FromStr>(args: &[&str], position: usize, usage: &str) -> Result<T, ServiceError> {
    args.get(position)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| ServiceError::validation(format!("Usage: {}", usage)))
}

fn parse_word<T>(
    raw: &str,
    field: &str,
    choices: impl IntoIterator<Item = T>,
) -> Result<T, ServiceError>
where
    T: FromStr + std::fmt::Display,
{
    raw.parse().map_err(|_| {
        let names: Vec<String> = choices.into_iter().map(|c| c.to_string()).collect();
        ServiceError::validation(format!("{} must be one of: {}", field, names.join(", ")))
    })
}
