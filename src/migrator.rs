use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_catalog_tables::Migration),
            Box::new(m20240101_000002_create_people_tables::Migration),
            Box::new(m20240101_000003_create_order_tables::Migration),
            Box::new(m20240101_000004_create_inventory_table::Migration),
        ]
    }
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
    Description,
}

#[derive(DeriveIden)]
enum Suppliers {
    Table,
    Id,
    Name,
    ContactPerson,
    Phone,
    Email,
    Address,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Name,
    CategoryId,
    SupplierId,
    Brand,
    Size,
    Color,
    Gender,
    Price,
    CostPrice,
    Description,
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    Phone,
    Address,
    RegistrationDate,
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    Phone,
    Position,
    Salary,
    HireDate,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    CustomerId,
    EmployeeId,
    OrderDate,
    TotalAmount,
    Status,
    PaymentMethod,
}

#[derive(DeriveIden)]
enum OrderDetails {
    Table,
    Id,
    OrderId,
    ProductId,
    Quantity,
    UnitPrice,
    Subtotal,
}

#[derive(DeriveIden)]
enum Inventory {
    Table,
    Id,
    ProductId,
    Quantity,
    LastRestocked,
    MinStockLevel,
}

mod m20240101_000001_create_catalog_tables {
    use super::{Categories, Products, Suppliers};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Categories::Name).string_len(50).not_null())
                        .col(ColumnDef::new(Categories::Description).text().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string_len(100).not_null())
                        .col(ColumnDef::new(Suppliers::ContactPerson).string_len(100).null())
                        .col(ColumnDef::new(Suppliers::Phone).string_len(20).null())
                        .col(ColumnDef::new(Suppliers::Email).string_len(100).null())
                        .col(ColumnDef::new(Suppliers::Address).text().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string_len(100).not_null())
                        .col(ColumnDef::new(Products::CategoryId).integer().null())
                        .col(ColumnDef::new(Products::SupplierId).integer().null())
                        .col(ColumnDef::new(Products::Brand).string_len(50).null())
                        .col(ColumnDef::new(Products::Size).decimal().null())
                        .col(ColumnDef::new(Products::Color).string_len(30).null())
                        .col(ColumnDef::new(Products::Gender).string_len(10).null())
                        .col(ColumnDef::new(Products::Price).decimal().not_null())
                        .col(ColumnDef::new(Products::CostPrice).decimal().null())
                        .col(ColumnDef::new(Products::Description).text().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_category_id")
                                .from(Products::Table, Products::CategoryId)
                                .to(Categories::Table, Categories::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_supplier_id")
                                .from(Products::Table, Products::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000002_create_people_tables {
    use super::{Customers, Employees};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_people_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Customers::FirstName).string_len(50).not_null())
                        .col(ColumnDef::new(Customers::LastName).string_len(50).not_null())
                        .col(ColumnDef::new(Customers::Email).string_len(100).null())
                        .col(ColumnDef::new(Customers::Phone).string_len(20).null())
                        .col(ColumnDef::new(Customers::Address).text().null())
                        .col(
                            ColumnDef::new(Customers::RegistrationDate)
                                .date()
                                .not_null()
                                .default(Expr::current_date()),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Employees::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Employees::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Employees::FirstName).string_len(50).not_null())
                        .col(ColumnDef::new(Employees::LastName).string_len(50).not_null())
                        .col(ColumnDef::new(Employees::Email).string_len(100).null())
                        .col(ColumnDef::new(Employees::Phone).string_len(20).null())
                        .col(ColumnDef::new(Employees::Position).string_len(50).null())
                        .col(ColumnDef::new(Employees::Salary).decimal().null())
                        .col(
                            ColumnDef::new(Employees::HireDate)
                                .date()
                                .not_null()
                                .default(Expr::current_date()),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Employees::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000003_create_order_tables {
    use super::{Customers, Employees, OrderDetails, Orders, Products};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Orders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Orders::CustomerId).integer().not_null())
                        .col(ColumnDef::new(Orders::EmployeeId).integer().null())
                        .col(
                            ColumnDef::new(Orders::OrderDate)
                                .date()
                                .not_null()
                                .default(Expr::current_date()),
                        )
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::Status)
                                .string_len(20)
                                .not_null()
                                .default("Pending"),
                        )
                        .col(ColumnDef::new(Orders::PaymentMethod).string_len(30).null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_customer_id")
                                .from(Orders::Table, Orders::CustomerId)
                                .to(Customers::Table, Customers::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_employee_id")
                                .from(Orders::Table, Orders::EmployeeId)
                                .to(Employees::Table, Employees::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderDetails::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrderDetails::OrderId).integer().not_null())
                        .col(ColumnDef::new(OrderDetails::ProductId).integer().not_null())
                        .col(ColumnDef::new(OrderDetails::Quantity).integer().not_null())
                        .col(ColumnDef::new(OrderDetails::UnitPrice).decimal().not_null())
                        .col(ColumnDef::new(OrderDetails::Subtotal).decimal().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_details_order_id")
                                .from(OrderDetails::Table, OrderDetails::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_details_product_id")
                                .from(OrderDetails::Table, OrderDetails::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000004_create_inventory_table {
    use super::{Inventory, Products};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_inventory_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Inventory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Inventory::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Inventory::ProductId)
                                .integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Inventory::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Inventory::LastRestocked).date().null())
                        .col(
                            ColumnDef::new(Inventory::MinStockLevel)
                                .integer()
                                .not_null()
                                .default(10),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_product_id")
                                .from(Inventory::Table, Inventory::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Inventory::Table).to_owned())
                .await
        }
    }
}
