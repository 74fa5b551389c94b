//! # Catalog Repository
//!
//! Clients, vehicles, products and services as the sale paths need them.
//!
//! ## Guarded Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products SET stock = stock - :qty                               │
//! │   WHERE id = :id AND deleted_at IS NULL AND stock >= :qty               │
//! │                                                                         │
//! │  rows_affected = 1  → decremented                                       │
//! │  rows_affected = 0  → not enough stock (or product gone)                │
//! │                                                                         │
//! │  The check and the write are one statement under SQLite's write lock,  │
//! │  so two sales racing for the last unit cannot both succeed and stock    │
//! │  can never go below zero.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every read filters `deleted_at IS NULL`: soft-deleted rows behave as
//! absent.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use detailing_core::{Money, Product, Service};

// =============================================================================
// Inputs
// =============================================================================

#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub client_id: i64,
    pub plate: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: i64,
    pub min_stock: i64,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub category_id: Option<i64>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog rows.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Transaction-scoped
    // -------------------------------------------------------------------------

    /// Whether an active client with this id exists.
    pub async fn client_exists(conn: &mut SqliteConnection, client_id: i64) -> DbResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM clients WHERE id = ?1 AND deleted_at IS NULL")
                .bind(client_id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(found.is_some())
    }

    /// Owner of an active vehicle, `None` when absent or soft-deleted.
    pub async fn vehicle_owner(
        conn: &mut SqliteConnection,
        vehicle_id: i64,
    ) -> DbResult<Option<i64>> {
        let owner = sqlx::query_scalar(
            "SELECT client_id FROM vehicles WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(vehicle_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(owner)
    }

    /// Batch-fetches active products by id. Missing ids are simply absent.
    pub async fn active_products(
        conn: &mut SqliteConnection,
        ids: &[i64],
    ) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = ids.len(), "Loading products for sale");

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, name, price_cents, stock, min_stock, category_id \
             FROM products WHERE deleted_at IS NULL AND id IN (",
        );
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let products = query
            .build_query_as::<Product>()
            .fetch_all(&mut *conn)
            .await?;

        Ok(products)
    }

    /// Batch-fetches active services by id. Missing ids are simply absent.
    pub async fn active_services(
        conn: &mut SqliteConnection,
        ids: &[i64],
    ) -> DbResult<Vec<Service>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = ids.len(), "Loading services for sale");

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, name, price_cents, category_id \
             FROM services WHERE deleted_at IS NULL AND id IN (",
        );
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let services = query
            .build_query_as::<Service>()
            .fetch_all(&mut *conn)
            .await?;

        Ok(services)
    }

    /// Decrements stock only if enough is on hand.
    ///
    /// Returns `false` (and changes nothing) when the product has fewer than
    /// `quantity` units or is no longer active.
    pub async fn decrement_stock(
        conn: &mut SqliteConnection,
        product_id: i64,
        quantity: i64,
        updated_by: i64,
    ) -> DbResult<bool> {
        debug!(product_id, quantity, "Decrementing stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?2,
                updated_by = ?3,
                updated_at = ?4
            WHERE id = ?1
              AND deleted_at IS NULL
              AND stock >= ?2
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(updated_by)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // -------------------------------------------------------------------------
    // Pool reads
    // -------------------------------------------------------------------------

    /// Gets an active product by id.
    pub async fn get_product(&self, id: i64) -> DbResult<Product> {
        sqlx::query_as::<_, Product>(
            "SELECT id, name, price_cents, stock, min_stock, category_id \
             FROM products WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Active products at or below their minimum stock, lowest stock first.
    pub async fn low_stock_products(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_cents, stock, min_stock, category_id
            FROM products
            WHERE deleted_at IS NULL AND stock <= min_stock
            ORDER BY stock ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Number of active products.
    pub async fn count_products(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Inserts (seed data and fixtures)
    // -------------------------------------------------------------------------

    pub async fn insert_client(&self, client: &NewClient, created_by: i64) -> DbResult<i64> {
        let result = sqlx::query(
            "INSERT INTO clients (name, phone, email, created_by, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(created_by)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_vehicle(&self, vehicle: &NewVehicle, created_by: i64) -> DbResult<i64> {
        let result = sqlx::query(
            "INSERT INTO vehicles (client_id, plate, brand, model, color, created_by, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(vehicle.client_id)
        .bind(&vehicle.plate)
        .bind(&vehicle.brand)
        .bind(&vehicle.model)
        .bind(&vehicle.color)
        .bind(created_by)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_product_category(&self, name: &str, created_by: i64) -> DbResult<i64> {
        let result = sqlx::query(
            "INSERT INTO product_categories (name, created_by, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(name)
        .bind(created_by)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_service_category(&self, name: &str, created_by: i64) -> DbResult<i64> {
        let result = sqlx::query(
            "INSERT INTO service_categories (name, created_by, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(name)
        .bind(created_by)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_product(&self, product: &NewProduct, created_by: i64) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO products (
                name, description, price_cents, stock, min_stock, category_id,
                created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.category_id)
        .bind(created_by)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_service(&self, service: &NewService, created_by: i64) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO services (
                name, description, price_cents, category_id, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price)
        .bind(service.category_id)
        .bind(created_by)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Sets a product's catalog price. Existing sale lines keep their snapshot.
    pub async fn update_product_price(&self, id: i64, price: Money, updated_by: i64) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET price_cents = ?2, updated_by = ?3, updated_at = ?4 \
             WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(price)
        .bind(updated_by)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Soft deletes
    // -------------------------------------------------------------------------

    /// Marks a product deleted. Its name becomes available again.
    pub async fn soft_delete_product(&self, id: i64, deleted_by: i64) -> DbResult<()> {
        self.soft_delete("products", "Product", id, deleted_by).await
    }

    pub async fn soft_delete_service(&self, id: i64, deleted_by: i64) -> DbResult<()> {
        self.soft_delete("services", "Service", id, deleted_by).await
    }

    pub async fn soft_delete_vehicle(&self, id: i64, deleted_by: i64) -> DbResult<()> {
        self.soft_delete("vehicles", "Vehicle", id, deleted_by).await
    }

    async fn soft_delete(
        &self,
        table: &'static str,
        entity: &'static str,
        id: i64,
        deleted_by: i64,
    ) -> DbResult<()> {
        debug!(table, id, "Soft-deleting row");

        let sql = format!(
            "UPDATE {table} SET deleted_by = ?2, deleted_at = ?3 \
             WHERE id = ?1 AND deleted_at IS NULL"
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(deleted_by)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(entity, id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
