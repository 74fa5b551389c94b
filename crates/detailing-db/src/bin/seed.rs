//! # Seed Data Generator
//!
//! Populates the database with a demo detailing catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./detailing.db
//! cargo run -p detailing-db --bin seed
//!
//! # Specify database path
//! cargo run -p detailing-db --bin seed -- --db ./data/shop.db
//! ```
//!
//! ## Generated Data
//! - Product categories with retail products (waxes, cleaners, accessories)
//! - Service categories with detailing services
//! - A handful of clients, each with one or two vehicles

use std::env;

use detailing_core::Money;
use detailing_db::{Database, DbConfig, NewClient, NewProduct, NewService, NewVehicle};

/// Seed rows are attributed to the bootstrap administrator.
const SEED_USER_ID: i64 = 1;

/// (category, [(name, price, stock, min_stock)])
const PRODUCTS: &[(&str, &[(&str, &str, i64, i64)])] = &[
    (
        "Waxes & Sealants",
        &[
            ("Carnauba Paste Wax", "24.99", 30, 5),
            ("Spray Sealant 500ml", "18.50", 24, 6),
            ("Ceramic Coating Kit", "89.00", 6, 2),
        ],
    ),
    (
        "Cleaners",
        &[
            ("pH Neutral Shampoo 1L", "12.99", 40, 8),
            ("Wheel Cleaner", "14.50", 18, 5),
            ("Interior Detailer", "11.00", 22, 5),
            ("Glass Cleaner", "8.99", 35, 10),
        ],
    ),
    (
        "Accessories",
        &[
            ("Microfiber Towel Pack", "15.99", 50, 10),
            ("Wash Mitt", "9.99", 15, 5),
            ("Tire Applicator", "4.50", 4, 5),
        ],
    ),
];

/// (category, [(name, price)])
const SERVICES: &[(&str, &[(&str, &str)])] = &[
    (
        "Washing",
        &[
            ("Exterior Hand Wash", "10.00"),
            ("Wash & Vacuum", "25.50"),
            ("Engine Bay Cleaning", "35.00"),
        ],
    ),
    (
        "Detailing",
        &[
            ("Interior Deep Clean", "80.00"),
            ("Paint Correction", "250.00"),
            ("Ceramic Coating Application", "450.00"),
        ],
    ),
];

/// (client, phone, [(plate, brand, model, color)])
const CLIENTS: &[(&str, &str, &[(&str, &str, &str, &str)])] = &[
    (
        "Ana Torres",
        "555-0101",
        &[("ABC-123", "Toyota", "Corolla", "White")],
    ),
    (
        "Bruno Silva",
        "555-0102",
        &[
            ("BRN-042", "Ford", "Ranger", "Blue"),
            ("BRN-777", "Honda", "Civic", "Black"),
        ],
    ),
    (
        "Carla Mendes",
        "555-0103",
        &[("CRL-900", "Volkswagen", "Golf", "Red")],
    ),
    (
        "Diego Ramos",
        "555-0104",
        &[("DGR-314", "Chevrolet", "Onix", "Silver")],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./detailing.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Detailing Shop Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./detailing.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Detailing Shop Seed Data Generator");
    println!("=====================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let catalog = db.catalog();

    let existing = catalog.count_products().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating catalog...");

    let mut products = 0;
    for (category, items) in PRODUCTS {
        let category_id = catalog
            .insert_product_category(category, SEED_USER_ID)
            .await?;

        for (name, price, stock, min_stock) in items.iter() {
            let product = NewProduct {
                name: name.to_string(),
                description: None,
                price: price.parse::<Money>()?,
                stock: *stock,
                min_stock: *min_stock,
                category_id: Some(category_id),
            };

            if let Err(e) = catalog.insert_product(&product, SEED_USER_ID).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }
            products += 1;
        }
    }
    println!("  {} products", products);

    let mut services = 0;
    for (category, items) in SERVICES {
        let category_id = catalog
            .insert_service_category(category, SEED_USER_ID)
            .await?;

        for (name, price) in items.iter() {
            let service = NewService {
                name: name.to_string(),
                description: None,
                price: price.parse::<Money>()?,
                category_id: Some(category_id),
            };

            if let Err(e) = catalog.insert_service(&service, SEED_USER_ID).await {
                eprintln!("Failed to insert {}: {}", service.name, e);
                continue;
            }
            services += 1;
        }
    }
    println!("  {} services", services);

    let mut vehicles = 0;
    for (name, phone, cars) in CLIENTS {
        let client_id = catalog
            .insert_client(
                &NewClient {
                    name: name.to_string(),
                    phone: Some(phone.to_string()),
                    email: None,
                },
                SEED_USER_ID,
            )
            .await?;

        for (plate, brand, model, color) in cars.iter() {
            let vehicle = NewVehicle {
                client_id,
                plate: plate.to_string(),
                brand: Some(brand.to_string()),
                model: Some(model.to_string()),
                color: Some(color.to_string()),
            };

            if let Err(e) = catalog.insert_vehicle(&vehicle, SEED_USER_ID).await {
                eprintln!("Failed to insert vehicle {}: {}", vehicle.plate, e);
                continue;
            }
            vehicles += 1;
        }
    }
    println!("  {} clients, {} vehicles", CLIENTS.len(), vehicles);

    let low_stock = catalog.low_stock_products().await?;
    println!();
    println!("Products at or below minimum stock: {}", low_stock.len());
    for product in &low_stock {
        println!("  {} ({} left, min {})", product.name, product.stock, product.min_stock);
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_prices_parse() {
        for (_, items) in PRODUCTS {
            for (name, price, _, _) in items.iter() {
                assert!(price.parse::<Money>().is_ok(), "{name}: {price}");
            }
        }
        for (_, items) in SERVICES {
            for (name, price) in items.iter() {
                assert!(price.parse::<Money>().is_ok(), "{name}: {price}");
            }
        }
        assert_eq!("4.50".parse::<Money>().unwrap(), Money::from_cents(450));
    }
}
