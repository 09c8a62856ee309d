//! # Seed Data Generator
//!
//! Fills a register database with a demo cafe menu and a cashier account.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p cafe-db --bin seed
//!
//! # Specify database path
//! cargo run -p cafe-db --bin seed -- --db ./data/cafe.db
//!
//! # Choose starting stock for every product
//! cargo run -p cafe-db --bin seed -- --stock 25
//! ```
//!
//! ## Generated Data
//! - Hot drinks, cold drinks, pastries and sandwiches with fixed prices
//! - SKU: `{CATEGORY CODE}-{NNN}`
//! - Default settings, the `admin` account (password `admin123`) and a
//!   `cashier` account (password `cashier123`)

use std::env;

use cafe_core::{NewProduct, NewUser, Role};
use cafe_db::{Database, DbConfig, DbError};

/// Demo menu: (category, SKU code, [(name, price)]).
const MENU: &[(&str, &str, &[(&str, f64)])] = &[
    (
        "Hot Drinks",
        "HOT",
        &[
            ("Espresso", 25.0),
            ("Double Espresso", 35.0),
            ("Americano", 30.0),
            ("Cappuccino", 40.0),
            ("Latte", 42.0),
            ("Flat White", 45.0),
            ("Mocha", 48.0),
            ("Turkish Coffee", 20.0),
            ("Hot Chocolate", 38.0),
            ("Mint Tea", 18.0),
        ],
    ),
    (
        "Cold Drinks",
        "CLD",
        &[
            ("Iced Latte", 45.0),
            ("Iced Americano", 35.0),
            ("Frappe", 55.0),
            ("Lemon Mint", 30.0),
            ("Fresh Orange Juice", 35.0),
            ("Mango Smoothie", 50.0),
            ("Sparkling Water", 15.0),
            ("Still Water", 10.0),
        ],
    ),
    (
        "Pastries",
        "PST",
        &[
            ("Butter Croissant", 28.0),
            ("Chocolate Croissant", 32.0),
            ("Blueberry Muffin", 30.0),
            ("Cinnamon Roll", 35.0),
            ("Cheesecake Slice", 55.0),
            ("Brownie", 25.0),
        ],
    ),
    (
        "Sandwiches",
        "SND",
        &[
            ("Halloumi Sandwich", 65.0),
            ("Turkey Club", 75.0),
            ("Tuna Melt", 70.0),
            ("Veggie Wrap", 60.0),
        ],
    ),
];

const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut stock: i64 = 50;
    let mut db_path = String::from("./cafe_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--stock" | "-s" => {
                if i + 1 < args.len() {
                    stock = args[i + 1].parse().unwrap_or(50);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Cafe Register Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --stock <N>    Starting stock per product (default: 50)");
                println!("  -d, --db <PATH>    Database file path (default: ./cafe_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Cafe Register Seed Data Generator");
    println!("===================================");
    println!("Database: {}", db_path);
    println!("Stock:    {}", stock);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let added = db.settings().seed_defaults().await?;
    println!("✓ Settings ready ({} defaults added)", added);

    if db.users().ensure_default_admin(DEFAULT_ADMIN_PASSWORD).await?.is_some() {
        println!("✓ Created admin / {}", DEFAULT_ADMIN_PASSWORD);
    }

    let cashier = NewUser {
        username: "cashier".to_string(),
        password: "cashier123".to_string(),
        role: Role::Cashier,
    };
    match db.users().create(&cashier).await {
        Ok(user) => println!("✓ Created {} / cashier123", user.username),
        Err(DbError::UniqueViolation { .. }) => println!("  Cashier account already exists"),
        Err(e) => return Err(e.into()),
    }

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping menu to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Adding menu...");

    let mut generated = 0;
    for (category, code, items) in MENU {
        for (index, (name, price)) in items.iter().enumerate() {
            let product = NewProduct {
                name: name.to_string(),
                price: *price,
                category: category.to_string(),
                sku: format!("{}-{:03}", code, index + 1),
                stock,
                image: None,
            };

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.sku, e);
                continue;
            }
            generated += 1;
        }
        println!("  {}: {} products", category, items.len());
    }

    println!();
    println!("✓ Added {} products", generated);
    println!("  Next order number: {}", db.fulfillment().peek_order_number().await?);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
