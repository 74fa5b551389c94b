//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tempfile::TempDir;

use detailing_core::{
    Actor, Money, ProductLineRequest, ProductSaleRequest, ServiceLineRequest, ServiceSaleRequest,
};
use detailing_db::{Database, DbConfig, NewClient, NewProduct, NewService, NewVehicle};
use detailing_service::{Backoffice, MemoryAuditSink};

pub const CASH: i64 = 1;
pub const CARD: i64 = 2;
pub const TRANSFER: i64 = 3;

/// A migrated in-memory shop with a small catalog.
pub struct Shop {
    pub db: Database,
    pub backoffice: Backoffice,
    pub audit: MemoryAuditSink,

    pub ana: i64,
    pub ana_car: i64,
    pub bruno: i64,
    pub bruno_truck: i64,

    /// $10.00, 20 in stock, minimum 2
    pub wax: i64,
    /// $15.99, 50 in stock, minimum 5
    pub towels: i64,
    /// $89.00, 1 in stock, minimum 0
    pub ceramic_kit: i64,

    /// $10.00
    pub wash: i64,
    /// $25.50
    pub vacuum: i64,
    /// $80.00
    pub polish: i64,

    /// Keeps the database file of a disk-backed shop alive.
    _dir: Option<TempDir>,
}

pub fn actor() -> Actor {
    Actor::new(7).with_username("front-desk").with_ip_address("10.0.0.7")
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn noon(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
}

pub async fn shop() -> Shop {
    shop_with(DbConfig::in_memory(), None).await
}

/// Same catalog on a database file with a multi-connection pool, so
/// concurrent transactions really overlap.
pub async fn shop_on_disk() -> Shop {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig::new(dir.path().join("shop.db")).max_connections(5);
    shop_with(config, Some(dir)).await
}

async fn shop_with(config: DbConfig, dir: Option<TempDir>) -> Shop {
    let db = Database::new(config).await.unwrap();
    let audit = MemoryAuditSink::new();
    let backoffice = Backoffice::new(db.clone(), Arc::new(audit.clone()), Duration::from_secs(5));

    let catalog = db.catalog();

    let ana = catalog
        .insert_client(
            &NewClient {
                name: "Ana Torres".to_string(),
                phone: Some("555-0101".to_string()),
                email: None,
            },
            1,
        )
        .await
        .unwrap();
    let bruno = catalog
        .insert_client(
            &NewClient {
                name: "Bruno Silva".to_string(),
                phone: None,
                email: Some("bruno@example.com".to_string()),
            },
            1,
        )
        .await
        .unwrap();

    let ana_car = catalog
        .insert_vehicle(&vehicle(ana, "ABC-123"), 1)
        .await
        .unwrap();
    let bruno_truck = catalog
        .insert_vehicle(&vehicle(bruno, "BRN-042"), 1)
        .await
        .unwrap();

    let wax = catalog
        .insert_product(&product("Carnauba Wax", 1000, 20, 2), 1)
        .await
        .unwrap();
    let towels = catalog
        .insert_product(&product("Microfiber Towels", 1599, 50, 5), 1)
        .await
        .unwrap();
    let ceramic_kit = catalog
        .insert_product(&product("Ceramic Kit", 8900, 1, 0), 1)
        .await
        .unwrap();

    let wash = catalog
        .insert_service(&service("Exterior Wash", 1000), 1)
        .await
        .unwrap();
    let vacuum = catalog
        .insert_service(&service("Interior Vacuum", 2550), 1)
        .await
        .unwrap();
    let polish = catalog
        .insert_service(&service("Machine Polish", 8000), 1)
        .await
        .unwrap();

    Shop {
        db,
        backoffice,
        audit,
        ana,
        ana_car,
        bruno,
        bruno_truck,
        wax,
        towels,
        ceramic_kit,
        wash,
        vacuum,
        polish,
        _dir: dir,
    }
}

fn vehicle(client_id: i64, plate: &str) -> NewVehicle {
    NewVehicle {
        client_id,
        plate: plate.to_string(),
        brand: None,
        model: None,
        color: None,
    }
}

fn product(name: &str, cents: i64, stock: i64, min_stock: i64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: None,
        price: Money::from_cents(cents),
        stock,
        min_stock,
        category_id: None,
    }
}

fn service(name: &str, cents: i64) -> NewService {
    NewService {
        name: name.to_string(),
        description: None,
        price: Money::from_cents(cents),
        category_id: None,
    }
}

pub fn product_sale(client_id: i64, lines: &[(i64, i64)]) -> ProductSaleRequest {
    ProductSaleRequest {
        client_id,
        payment_method_id: CASH,
        payment_status_id: None,
        observations: None,
        products: lines
            .iter()
            .map(|(product_id, quantity)| ProductLineRequest {
                product_id: *product_id,
                quantity: *quantity,
            })
            .collect(),
    }
}

pub fn service_sale(client_id: i64, vehicle_id: i64, services: &[i64]) -> ServiceSaleRequest {
    ServiceSaleRequest {
        client_id,
        vehicle_id,
        payment_method_id: CARD,
        payment_status_id: None,
        observations: None,
        services: services
            .iter()
            .map(|service_id| ServiceLineRequest {
                service_id: *service_id,
            })
            .collect(),
    }
}

impl Shop {
    pub async fn stock(&self, product_id: i64) -> i64 {
        self.db.catalog().get_product(product_id).await.unwrap().stock
    }

    pub async fn sale_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }

    pub async fn line_count(&self) -> i64 {
        sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM sale_products) + (SELECT COUNT(*) FROM sale_services)",
        )
        .fetch_one(self.db.pool())
        .await
        .unwrap()
    }

    pub async fn set_stock(&self, product_id: i64, stock: i64) {
        sqlx::query("UPDATE products SET stock = ?1 WHERE id = ?2")
            .bind(stock)
            .bind(product_id)
            .execute(self.db.pool())
            .await
            .unwrap();
    }

    /// Moves a sale's creation time, for report windows.
    pub async fn backdate(&self, sale_id: i64, at: DateTime<Utc>) {
        sqlx::query("UPDATE sales SET created_at = ?1 WHERE id = ?2")
            .bind(at)
            .bind(sale_id)
            .execute(self.db.pool())
            .await
            .unwrap();
    }
}
