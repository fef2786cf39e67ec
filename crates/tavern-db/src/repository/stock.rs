//! # Stock Repository
//!
//! Per-warehouse stock rows plus the supply and write-off journals.
//!
//! A stock row counts exactly one item: an ingredient or a product. Lookups
//! compare both columns with `IS`, which treats two NULLs as equal, so one
//! query serves both item kinds.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tavern_core::{Stock, StockItem, Supply, WriteOff};

const STOCK_COLUMNS: &str = r#"
    id, establishment_id, warehouse_id, ingredient_id, product_id,
    quantity, price_per_unit_cents, updated_at
"#;

/// Repository for stock, supplies and write-offs.
#[derive(Debug)]
pub struct StockRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> StockRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        StockRepository { conn }
    }

    /// Stock row for one item in one warehouse.
    pub async fn get(&mut self, warehouse_id: &str, item: &StockItem) -> DbResult<Option<Stock>> {
        let (ingredient_id, product_id) = item.columns();
        let sql = format!(
            "SELECT {STOCK_COLUMNS} FROM stock WHERE warehouse_id = ?1 AND ingredient_id IS ?2 AND product_id IS ?3"
        );

        let stock = sqlx::query_as::<_, Stock>(&sql)
            .bind(warehouse_id)
            .bind(ingredient_id)
            .bind(product_id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(stock)
    }

    pub async fn get_by_ingredient_and_warehouse(
        &mut self,
        ingredient_id: &str,
        warehouse_id: &str,
    ) -> DbResult<Option<Stock>> {
        self.get(warehouse_id, &StockItem::Ingredient(ingredient_id.to_string()))
            .await
    }

    pub async fn get_by_product_and_warehouse(
        &mut self,
        product_id: &str,
        warehouse_id: &str,
    ) -> DbResult<Option<Stock>> {
        self.get(warehouse_id, &StockItem::Product(product_id.to_string()))
            .await
    }

    /// Every stock row of a warehouse.
    pub async fn list(&mut self, warehouse_id: &str) -> DbResult<Vec<Stock>> {
        let sql = format!("SELECT {STOCK_COLUMNS} FROM stock WHERE warehouse_id = ?1 ORDER BY updated_at DESC");

        let rows = sqlx::query_as::<_, Stock>(&sql)
            .bind(warehouse_id)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn insert(&mut self, stock: &Stock) -> DbResult<()> {
        debug!(
            id = %stock.id,
            warehouse_id = %stock.warehouse_id,
            quantity = stock.quantity,
            "Inserting stock row"
        );

        sqlx::query(
            r#"
            INSERT INTO stock (
                id, establishment_id, warehouse_id, ingredient_id, product_id,
                quantity, price_per_unit_cents, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&stock.id)
        .bind(&stock.establishment_id)
        .bind(&stock.warehouse_id)
        .bind(&stock.ingredient_id)
        .bind(&stock.product_id)
        .bind(stock.quantity)
        .bind(stock.price_per_unit_cents)
        .bind(stock.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Adds a supplied quantity and sets the blended unit price.
    pub async fn add_quantity(
        &mut self,
        id: &str,
        quantity: f64,
        price_per_unit_cents: i64,
        at: DateTime<Utc>,
    ) -> DbResult<Stock> {
        debug!(id = %id, quantity, price_per_unit_cents, "Adding stock");

        let sql = format!(
            r#"
            UPDATE stock
            SET quantity = quantity + ?2, price_per_unit_cents = ?3, updated_at = ?4
            WHERE id = ?1
            RETURNING {STOCK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Stock>(&sql)
            .bind(id)
            .bind(quantity)
            .bind(price_per_unit_cents)
            .bind(at)
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or_else(|| DbError::not_found("Stock", id))
    }

    /// Removes `quantity` only if that much is on hand. Returns the updated
    /// row, or `None` when the stock is short (nothing written).
    pub async fn decrement(
        &mut self,
        id: &str,
        quantity: f64,
        at: DateTime<Utc>,
    ) -> DbResult<Option<Stock>> {
        debug!(id = %id, quantity, "Decrementing stock");

        let sql = format!(
            r#"
            UPDATE stock
            SET quantity = quantity - ?2, updated_at = ?3
            WHERE id = ?1 AND quantity >= ?2
            RETURNING {STOCK_COLUMNS}
            "#
        );

        let stock = sqlx::query_as::<_, Stock>(&sql)
            .bind(id)
            .bind(quantity)
            .bind(at)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(stock)
    }

    // =========================================================================
    // Journals
    // =========================================================================

    pub async fn insert_supply(&mut self, supply: &Supply) -> DbResult<()> {
        debug!(
            id = %supply.id,
            warehouse_id = %supply.warehouse_id,
            total_cost_cents = supply.total_cost_cents,
            "Recording supply"
        );

        sqlx::query(
            r#"
            INSERT INTO supplies (
                id, establishment_id, warehouse_id, ingredient_id, product_id,
                quantity, price_per_unit_cents, total_cost_cents,
                account_id, transaction_id, supplied_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&supply.id)
        .bind(&supply.establishment_id)
        .bind(&supply.warehouse_id)
        .bind(&supply.ingredient_id)
        .bind(&supply.product_id)
        .bind(supply.quantity)
        .bind(supply.price_per_unit_cents)
        .bind(supply.total_cost_cents)
        .bind(&supply.account_id)
        .bind(&supply.transaction_id)
        .bind(supply.supplied_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn insert_write_off(&mut self, write_off: &WriteOff) -> DbResult<()> {
        debug!(
            id = %write_off.id,
            warehouse_id = %write_off.warehouse_id,
            quantity = write_off.quantity,
            "Recording write-off"
        );

        sqlx::query(
            r#"
            INSERT INTO write_offs (
                id, establishment_id, warehouse_id, ingredient_id, product_id,
                quantity, reason, written_off_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&write_off.id)
        .bind(&write_off.establishment_id)
        .bind(&write_off.warehouse_id)
        .bind(&write_off.ingredient_id)
        .bind(&write_off.product_id)
        .bind(write_off.quantity)
        .bind(&write_off.reason)
        .bind(write_off.written_off_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Supplies into a warehouse, most recent first.
    pub async fn list_supplies(&mut self, warehouse_id: &str) -> DbResult<Vec<Supply>> {
        let supplies = sqlx::query_as::<_, Supply>(
            r#"
            SELECT id, establishment_id, warehouse_id, ingredient_id, product_id,
                   quantity, price_per_unit_cents, total_cost_cents,
                   account_id, transaction_id, supplied_at
            FROM supplies
            WHERE warehouse_id = ?1
            ORDER BY supplied_at DESC
            "#,
        )
        .bind(warehouse_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(supplies)
    }

    /// Write-offs from a warehouse, most recent first.
    pub async fn list_write_offs(&mut self, warehouse_id: &str) -> DbResult<Vec<WriteOff>> {
        let write_offs = sqlx::query_as::<_, WriteOff>(
            r#"
            SELECT id, establishment_id, warehouse_id, ingredient_id, product_id,
                   quantity, reason, written_off_at
            FROM write_offs
            WHERE warehouse_id = ?1
            ORDER BY written_off_at DESC
            "#,
        )
        .bind(warehouse_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(write_offs)
    }
}
