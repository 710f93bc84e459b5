//! # Seed Data Generator
//!
//! Creates an administrator account, a few customers and sample products
//! for development.
//!
//! ## Usage
//! ```bash
//! # Default admin (admin@tally.local / admin123) and 40 products
//! cargo run -p tally-db --bin seed
//!
//! # Custom amount and database
//! cargo run -p tally-db --bin seed -- --count 100 --db ./data/tally.db
//!
//! # Custom admin credentials
//! cargo run -p tally-db --bin seed -- --email me@shop.io --password hunter22
//! ```
//!
//! ## Generated Products
//! - Barcode: `899{seed:010}`
//! - Sell price: 1.99 - 9.99 plus a size add-on
//! - Cost: 60-80% of sell price
//! - Stock: 0 - 100 units

use std::env;

use anyhow::Context;
use tally_core::input::{CustomerInput, ProductInput};
use tally_core::{Money, Quantity};
use tally_db::password::hash_password;
use tally_db::{Database, DbConfig, NewUser};

/// Product families for realistic test data
const FAMILIES: &[&str] = &[
    "Coffee Beans",
    "Green Tea",
    "Rice",
    "Sugar",
    "Cooking Oil",
    "Instant Noodles",
    "Mineral Water",
    "Chocolate Bar",
    "Cheddar Cheese",
    "Wheat Flour",
];

/// Size variants with a price add-on in cents
const SIZES: &[(&str, i64)] = &[("Small", 0), ("Medium", 150), ("Large", 300), ("Family", 600)];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Budi Santoso", "budi@example.com"),
    ("Siti Rahma", "siti@example.com"),
    ("John Doe", "john@example.com"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally_db=info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 40;
    let mut db_path = String::from("./data/tally.db");
    let mut email = String::from("admin@tally.local");
    let mut password = String::from("admin123");

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match (args[i].as_str(), value) {
            ("--count" | "-c", Some(v)) => {
                count = v.parse().unwrap_or(count);
                i += 1;
            }
            ("--db" | "-d", Some(v)) => {
                db_path = v;
                i += 1;
            }
            ("--email", Some(v)) => {
                email = v;
                i += 1;
            }
            ("--password", Some(v)) => {
                password = v;
                i += 1;
            }
            ("--help" | "-h", _) => {
                println!("Tally Back Office Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>      Number of products to generate (default: 40)");
                println!("  -d, --db <PATH>      Database file path (default: ./data/tally.db)");
                println!("      --email <EMAIL>  Admin email (default: admin@tally.local)");
                println!("      --password <PW>  Admin password (default: admin123)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent).context("creating database directory")?;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Admin account
    if db.users().get_credentials_by_email(&email).await?.is_some() {
        println!("⚠ Admin {} already exists, leaving it alone", email);
    } else {
        let password_hash = hash_password(&password)?;
        let admin = db
            .users()
            .create(NewUser {
                first_name: "Store",
                last_name: "Admin",
                email: &email,
                password_hash: &password_hash,
                role_id: 1,
            })
            .await?;
        println!("✓ Created admin {} (id {})", admin.email, admin.id);
    }

    // Customers
    if db.customers().list_all().await?.is_empty() {
        for (name, email) in CUSTOMERS {
            db.customers()
                .create(&CustomerInput {
                    name: name.to_string(),
                    email: email.to_string(),
                })
                .await?;
        }
        println!("✓ Created {} customers", CUSTOMERS.len());
    }

    // Products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping product seed to avoid duplicate barcodes.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (family_idx, family) in FAMILIES.iter().enumerate() {
        for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
            if generated >= count {
                break 'outer;
            }

            let input = generate_product(family, size, *addon, family_idx * 10 + size_idx);
            if let Err(e) = db.products().insert(&input, None).await {
                eprintln!("Failed to insert {}: {}", input.title, e);
                continue;
            }
            generated += 1;
        }
    }

    println!("✓ Generated {} products in {:?}", generated, start.elapsed());
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one product with deterministic pseudo-random numbers.
fn generate_product(family: &str, size: &str, price_addon: i64, seed: usize) -> ProductInput {
    let sell_cents = 199 + ((seed * 17) % 800) as i64 + price_addon;
    let cost_pct = 60 + (seed % 20) as i64;

    ProductInput {
        title: format!("{} {}", family, size),
        description: format!("{} ({})", family, size.to_lowercase()),
        barcode: Some(format!("899{:010}", seed)),
        price: Money::from_cents(sell_cents * cost_pct / 100),
        sell_price: Money::from_cents(sell_cents),
        stock: Quantity::from_units((seed % 101) as i64),
    }
}
