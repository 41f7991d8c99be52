//! # Seed Data Generator
//!
//! Populates a database with development products, each backed by an
//! opening PURCHASE ledger entry, exactly as real intake would.
//!
//! ## Usage
//! ```bash
//! # Generate the default 200 products
//! cargo run -p tally-db --bin seed
//!
//! # Generate a custom amount into a custom file
//! cargo run -p tally-db --bin seed -- --count 500 --db ./data/tally.db
//! ```

use chrono::Utc;
use std::env;
use uuid::Uuid;

use tally_core::{Category, Product, StockStatus, StockTransaction, TransactionType};
use tally_db::repository::ledger::generate_transaction_id;
use tally_db::{Database, DbConfig, LedgerRepository, ProductRepository};

/// Tenant used for development data.
const SEED_TENANT: &str = "00000000-0000-0000-0000-000000000001";

/// Sample names per category.
const SAMPLES: &[(Category, &[&str])] = &[
    (
        Category::Beverage,
        &["Coca-Cola 330ml", "Orange Juice 1L", "Green Tea 500ml", "Sparkling Water"],
    ),
    (
        Category::Snack,
        &["Potato Chips", "Salted Peanuts", "Chocolate Bar", "Granola Bar"],
    ),
    (
        Category::Grocery,
        &["Basmati Rice 5kg", "Spaghetti 500g", "Canned Tomatoes", "Olive Oil 1L"],
    ),
    (
        Category::CleaningSupplies,
        &["Dish Soap", "Glass Cleaner", "Laundry Detergent", "Sponges 6-Pack"],
    ),
    (
        Category::Stationery,
        &["Ballpoint Pens", "A4 Paper Ream", "Sticky Notes", "Stapler"],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("Tally Inventory Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tally Inventory Seed Data Generator");
    println!("===================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.products().count(SEED_TENANT).await?;
    if existing > 0 {
        println!("⚠ Database already has {} products for the seed tenant", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for batch in 0.. {
        for (category, names) in SAMPLES {
            for (name_idx, name) in names.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = batch * 100 + name_idx;
                let product = generate_product(*category, name, batch, seed);

                // Seed the same way real intake does: product row plus an
                // opening PURCHASE entry, in one transaction.
                let entry = StockTransaction {
                    id: generate_transaction_id(),
                    tenant_id: product.tenant_id.clone(),
                    product_id: product.id.clone(),
                    quantity: product.quantity,
                    amount_cents: product.quantity * product.price_cents,
                    tx_type: TransactionType::Purchase,
                    created_at: product.created_at,
                };

                let mut tx = db.begin().await?;
                ProductRepository::insert(&mut tx, &product).await?;
                LedgerRepository::record(&mut tx, &entry).await?;
                tx.commit().await?;

                generated += 1;
                if generated % 50 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    let net = db.products().count(SEED_TENANT).await?;
    println!("  Seed tenant now has {} products", net);

    Ok(())
}

/// Generates a single product with deterministic pseudo-random data.
fn generate_product(category: Category, name: &str, batch: usize, seed: usize) -> Product {
    let now = Utc::now();

    let code = format!(
        "{}-{:04}",
        name.split_whitespace()
            .next()
            .unwrap_or("ITEM")
            .to_uppercase(),
        batch * 100 + seed
    );

    let price_cents = 99 + ((seed * 37) % 2000) as i64;
    let quantity = ((seed * 13) % 120) as i64 + 1;
    let threshold = ((seed * 7) % 20) as i64;

    Product {
        id: Uuid::new_v4().to_string(),
        tenant_id: SEED_TENANT.to_string(),
        code,
        name: if batch == 0 {
            name.to_string()
        } else {
            format!("{} #{}", name, batch + 1)
        },
        category,
        price_cents,
        quantity,
        unit: "pcs".to_string(),
        expiry_date: None,
        threshold,
        status: StockStatus::derive(quantity, threshold),
        created_at: now,
        updated_at: now,
    }
}
