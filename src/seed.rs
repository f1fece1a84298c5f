//! Demonstration data inserted into a fresh database.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, PaginatorTrait, Set};
use tracing::{info, instrument};

use crate::db::with_transaction;
use crate::entities::{
    category, customer, employee, inventory, order, order_detail, product, supplier, Gender,
    OrderStatus, PaymentMethod,
};
use crate::errors::ServiceError;

const CATEGORIES: [(&str, &str); 6] = [
    ("Running Shoes", "Athletic shoes for running"),
    ("Casual Shoes", "Everyday casual footwear"),
    ("Formal Shoes", "Dress shoes for formal occasions"),
    ("Sports Shoes", "Shoes for various sports"),
    ("Sandals", "Open footwear for warm weather"),
    ("Slippers", "Comfortable indoor/outdoor footwear"),
];

// name, contact, phone, email, address
const SUPPLIERS: [(&str, &str, &str, &str, &str); 6] = [
    ("Nike Philippines", "Juan Dela Cruz", "+63-2-8123-4567", "juan.delacruz@nike.ph", "123 Bonifacio High Street, Taguig City, Metro Manila"),
    ("Adidas Philippines", "Maria Santos", "+63-917-123-4567", "maria.santos@adidas.ph", "456 SM Megamall, Ortigas Center, Mandaluyong City"),
    ("Puma Philippines", "Roberto Reyes", "+63-2-8234-5678", "roberto.reyes@puma.ph", "789 Ayala Center, Makati City, Metro Manila"),
    ("Skechers Philippines", "Lisa Tan", "+63-918-234-5678", "lisa.tan@skechers.ph", "101 Robinsons Place, Ermita, Manila"),
    ("World Balance", "Carlos Lim", "+63-2-8765-4321", "carlos.lim@worldbalance.ph", "555 Quezon Avenue, Quezon City"),
    ("San Marino", "Andrea Gomez", "+63-919-345-6789", "andrea.gomez@sanmarino.ph", "777 Pioneer Street, Mandaluyong City"),
];

struct SeedProduct {
    name: &'static str,
    category: usize,
    supplier: usize,
    brand: &'static str,
    size: Decimal,
    color: &'static str,
    gender: Gender,
    price: Decimal,
    cost_price: Decimal,
    description: &'static str,
}

fn products() -> Vec<SeedProduct> {
    let p = |name, category, supplier, brand, size, color, gender, price, cost_price, description| {
        SeedProduct {
            name,
            category,
            supplier,
            brand,
            size,
            color,
            gender,
            price,
            cost_price,
            description,
        }
    };
    vec![
        p("Air Max 270", 0, 0, "Nike", dec!(10.5), "Black/White", Gender::Men, dec!(5499.99), dec!(3299.99), "Running shoes with Max Air cushioning"),
        p("Ultraboost 22", 0, 1, "Adidas", dec!(9.0), "Blue", Gender::Women, dec!(6799.99), dec!(4099.99), "Responsive running shoes"),
        p("Classic Leather", 1, 2, "Puma", dec!(11.0), "White", Gender::Men, dec!(2999.99), dec!(1799.99), "Iconic casual shoes"),
        p("Go Walk 5", 1, 3, "Skechers", dec!(8.5), "Gray", Gender::Women, dec!(2499.99), dec!(1499.99), "Comfortable walking shoes"),
        p("Court Royale", 2, 0, "Nike", dec!(10.0), "Black", Gender::Men, dec!(2299.99), dec!(1379.99), "Classic court-style shoes"),
        p("Predator Freak", 3, 1, "Adidas", dec!(9.5), "Red/Black", Gender::Men, dec!(8999.99), dec!(5399.99), "Soccer shoes with advanced grip"),
        p("Comfort Slippers", 5, 4, "World Balance", dec!(9.0), "Blue/White", Gender::Unisex, dec!(499.99), dec!(299.99), "Comfortable everyday slippers"),
        p("Leather Sandals", 4, 5, "San Marino", dec!(8.0), "Brown", Gender::Men, dec!(1299.99), dec!(779.99), "Premium leather sandals"),
        p("Running Pro", 0, 4, "World Balance", dec!(10.5), "Green", Gender::Men, dec!(1899.99), dec!(1139.99), "Affordable running shoes"),
        p("School Shoes", 2, 5, "San Marino", dec!(7.0), "Black", Gender::Kids, dec!(999.99), dec!(599.99), "Durable school shoes"),
    ]
}

// first, last, email, phone, address
const CUSTOMERS: [(&str, &str, &str, &str, &str); 10] = [
    ("Juan", "Dela Cruz", "juan.delacruz@email.com", "+63-917-111-2233", "123 Rizal Street, Barangay Poblacion, Makati City"),
    ("Maria", "Santos", "maria.santos@email.com", "+63-918-222-3344", "456 Mabini Road, Cebu City, Cebu"),
    ("Roberto", "Reyes", "roberto.reyes@email.com", "+63-919-333-4455", "789 Quezon Avenue, Quezon City"),
    ("Ana", "Garcia", "ana.garcia@email.com", "+63-920-444-5566", "101 Bonifacio Street, Davao City"),
    ("Michael", "Tan", "michael.tan@email.com", "+63-921-555-6677", "222 Ortigas Center, Pasig City"),
    ("Sofia", "Lim", "sofia.lim@email.com", "+63-922-666-7788", "333 Alabang, Muntinlupa City"),
    ("Jose", "Gonzales", "jose.gonzales@email.com", "+63-923-777-8899", "444 Taft Avenue, Manila"),
    ("Carmen", "Torres", "carmen.torres@email.com", "+63-924-888-9900", "555 Pioneer Street, Mandaluyong"),
    ("Pedro", "Aquino", "pedro.aquino@email.com", "+63-925-999-0011", "666 Commonwealth Avenue, Quezon City"),
    ("Lourdes", "Fernandez", "lourdes.fernandez@email.com", "+63-926-000-1122", "777 Katipunan Avenue, Quezon City"),
];

// first, last, email, phone, position, salary
const EMPLOYEES: [(&str, &str, &str, &str, &str, i64); 5] = [
    ("Alice", "Cruz", "alice@barakokicks.ph", "+63-917-123-4567", "Store Manager", 35000),
    ("Charlie", "David", "charlie@barakokicks.ph", "+63-918-234-5678", "Sales Supervisor", 25000),
    ("Bianca", "Ramos", "bianca@barakokicks.ph", "+63-919-345-6789", "Sales Associate", 18000),
    ("Daniel", "Mendoza", "daniel@barakokicks.ph", "+63-920-456-7890", "Sales Associate", 18000),
    ("Elena", "Sison", "elena@barakokicks.ph", "+63-921-567-8901", "Inventory Clerk", 20000),
];

// product, quantity, last restocked, minimum
const INVENTORY: [(usize, i32, &str, i32); 10] = [
    (0, 45, "2024-01-15", 10),
    (1, 35, "2024-01-10", 8),
    (2, 50, "2024-01-20", 12),
    (3, 40, "2024-01-12", 10),
    (4, 25, "2024-01-18", 8),
    (5, 15, "2024-01-05", 5),
    (6, 100, "2024-01-25", 20),
    (7, 30, "2024-01-22", 10),
    (8, 60, "2024-01-28", 15),
    (9, 40, "2024-01-30", 12),
];

fn orders() -> [(usize, usize, &'static str, Decimal, OrderStatus, PaymentMethod); 5] {
    [
        (0, 1, "2024-01-20", dec!(5499.99), OrderStatus::Completed, PaymentMethod::CreditCard),
        (1, 2, "2024-01-22", dec!(12999.98), OrderStatus::Completed, PaymentMethod::GCash),
        (2, 3, "2024-01-25", dec!(2999.99), OrderStatus::Processing, PaymentMethod::Cash),
        (3, 1, "2024-01-26", dec!(4999.98), OrderStatus::Pending, PaymentMethod::DebitCard),
        (4, 2, "2024-01-28", dec!(4499.98), OrderStatus::Completed, PaymentMethod::GCash),
    ]
}

// order, product, quantity, unit price
fn order_details() -> [(usize, usize, i32, Decimal); 7] {
    [
        (0, 0, 1, dec!(5499.99)),
        (1, 1, 1, dec!(6799.99)),
        (1, 5, 1, dec!(8999.99)),
        (2, 2, 1, dec!(2999.99)),
        (3, 0, 2, dec!(5499.99)),
        (4, 8, 2, dec!(1899.99)),
        (4, 6, 2, dec!(499.99)),
    ]
}

fn date(text: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|e| ServiceError::InternalError(format!("bad seed date {}: {}", text, e)))
}

fn id_at(ids: &[i32], index: usize) -> Result<i32, ServiceError> {
    ids.get(index)
        .copied()
        .ok_or_else(|| ServiceError::InternalError(format!("seed reference {} out of range", index)))
}

/// Inserts the demonstration data set when the categories table is empty.
///
/// Returns `true` when rows were written. Everything goes in one transaction,
/// so a failure leaves the database empty and the next start tries again.
#[instrument(skip(db))]
pub async fn seed_if_empty(db: &DatabaseConnection) -> Result<bool, ServiceError> {
    if category::Entity::find().count(db).await? > 0 {
        info!("Database already populated; skipping sample data");
        return Ok(false);
    }

    with_transaction(db, |txn| Box::pin(async move { insert_sample_data(txn).await })).await?;

    info!("Sample data inserted");
    Ok(true)
}

async fn insert_sample_data(txn: &DatabaseTransaction) -> Result<(), ServiceError> {
    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for (name, description) in CATEGORIES {
        let row = category::ActiveModel {
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            ..Default::default()
        }
        .insert(txn)
        .await?;
        category_ids.push(row.id);
    }

    let mut supplier_ids = Vec::with_capacity(SUPPLIERS.len());
    for (name, contact, phone, email, address) in SUPPLIERS {
        let row = supplier::ActiveModel {
            name: Set(name.to_string()),
            contact_person: Set(Some(contact.to_string())),
            phone: Set(Some(phone.to_string())),
            email: Set(Some(email.to_string())),
            address: Set(Some(address.to_string())),
            ..Default::default()
        }
        .insert(txn)
        .await?;
        supplier_ids.push(row.id);
    }

    let mut product_ids = Vec::new();
    for p in products() {
        let row = product::ActiveModel {
            name: Set(p.name.to_string()),
            category_id: Set(Some(id_at(&category_ids, p.category)?)),
            supplier_id: Set(Some(id_at(&supplier_ids, p.supplier)?)),
            brand: Set(Some(p.brand.to_string())),
            size: Set(Some(p.size)),
            color: Set(Some(p.color.to_string())),
            gender: Set(Some(p.gender)),
            price: Set(p.price),
            cost_price: Set(Some(p.cost_price)),
            description: Set(Some(p.description.to_string())),
            ..Default::default()
        }
        .insert(txn)
        .await?;
        product_ids.push(row.id);
    }

    let mut customer_ids = Vec::with_capacity(CUSTOMERS.len());
    for (first, last, email, phone, address) in CUSTOMERS {
        let row = customer::ActiveModel {
            first_name: Set(first.to_string()),
            last_name: Set(last.to_string()),
            email: Set(Some(email.to_string())),
            phone: Set(Some(phone.to_string())),
            address: Set(Some(address.to_string())),
            ..Default::default()
        }
        .insert(txn)
        .await?;
        customer_ids.push(row.id);
    }

    let mut employee_ids = Vec::with_capacity(EMPLOYEES.len());
    for (first, last, email, phone, position, salary) in EMPLOYEES {
        let row = employee::ActiveModel {
            first_name: Set(first.to_string()),
            last_name: Set(last.to_string()),
            email: Set(Some(email.to_string())),
            phone: Set(Some(phone.to_string())),
            position: Set(Some(position.to_string())),
            salary: Set(Some(Decimal::from(salary))),
            ..Default::default()
        }
        .insert(txn)
        .await?;
        employee_ids.push(row.id);
    }

    for (product, quantity, restocked, minimum) in INVENTORY {
        inventory::ActiveModel {
            product_id: Set(id_at(&product_ids, product)?),
            quantity: Set(quantity),
            last_restocked: Set(Some(date(restocked)?)),
            min_stock_level: Set(minimum),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }

    let mut order_ids = Vec::new();
    for (customer, employee, placed, total, status, payment) in orders() {
        let row = order::ActiveModel {
            customer_id: Set(id_at(&customer_ids, customer)?),
            employee_id: Set(Some(id_at(&employee_ids, employee)?)),
            order_date: Set(date(placed)?),
            total_amount: Set(total),
            status: Set(status),
            payment_method: Set(Some(payment)),
            ..Default::default()
        }
        .insert(txn)
        .await?;
        order_ids.push(row.id);
    }

    for (order, product, quantity, unit_price) in order_details() {
        order_detail::ActiveModel {
            order_id: Set(id_at(&order_ids, order)?),
            product_id: Set(id_at(&product_ids, product)?),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            subtotal: Set(unit_price * Decimal::from(quantity)),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }

    Ok(())
}
