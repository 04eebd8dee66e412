//! # Seed Data Generator
//!
//! Populates the database with a GST-rated development catalog and the
//! default business settings.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p till-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p till-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p till-db --bin seed -- --db ./data/till.db
//! ```
//!
//! ## Generated Products
//! Each product name is `{item} {size}`, priced from the item's base price
//! plus a size addon, with one of the common GST slabs split evenly into
//! CGST and SGST:
//! - 0% (fresh produce)
//! - 5% → 2.5% + 2.5%
//! - 12% → 6% + 6%
//! - 18% → 9% + 9%

use std::collections::BTreeMap;
use std::env;

use anyhow::Context;
use till_core::{Money, ProductDraft, TaxRate, SETTING_BUSINESS_NAME, SETTING_CURRENCY_CODE};
use till_db::{Database, DbConfig};

/// Catalog items: (name, base price in paise, total GST in bps)
const ITEMS: &[(&str, i64, u32)] = &[
    ("Masala Chai", 2_000, 500),
    ("Filter Coffee", 3_000, 500),
    ("Cold Coffee", 9_000, 1_800),
    ("Lemon Soda", 4_000, 1_200),
    ("Mango Lassi", 6_000, 500),
    ("Veg Sandwich", 8_000, 500),
    ("Paneer Roll", 11_000, 500),
    ("Samosa", 1_500, 500),
    ("Banana", 800, 0),
    ("Apple", 2_500, 0),
    ("Chocolate Bar", 5_000, 1_800),
    ("Bottled Water", 2_000, 1_200),
    ("Butter Cookies", 3_500, 1_800),
    ("Potato Chips", 2_000, 1_200),
    ("Ice Cream Cup", 6_500, 1_800),
];

/// Size variants: (label, price addon in paise)
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Regular", 1_000),
    ("Large", 2_500),
    ("Family Pack", 6_000),
    ("Combo", 4_000),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./till_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().context("--count expects a number")?;
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
                println!("Till POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./till_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Till POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {}", db_path))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut defaults = BTreeMap::new();
    defaults.insert(SETTING_BUSINESS_NAME.to_string(), "Till Demo Café".to_string());
    defaults.insert(SETTING_CURRENCY_CODE.to_string(), "INR".to_string());
    db.settings().put_many(&defaults).await?;
    println!("✓ Default settings written");

    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (name, base_price, gst_bps) in ITEMS {
        for (size, addon) in SIZES {
            if generated >= count {
                break 'outer;
            }

            let draft = generate_product(name, size, *base_price + addon, *gst_bps);
            if let Err(e) = db.products().create(&draft).await {
                eprintln!("Failed to insert {}: {}", draft.name, e);
                continue;
            }

            generated += 1;
            if generated % 25 == 0 {
                println!("  Generated {} products...", generated);
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    println!();
    println!("Verifying search...");
    let hits = db.products().search("coffee", 10).await?;
    println!("  Search 'coffee': {} results", hits.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one catalog entry, splitting the GST slab evenly.
fn generate_product(name: &str, size: &str, price_cents: i64, gst_bps: u32) -> ProductDraft {
    let half = TaxRate::from_bps(gst_bps / 2);
    ProductDraft::new(
        format!("{} {}", name, size),
        Money::from_cents(price_cents),
        half,
        half,
    )
}
