//! # Order Repository
//!
//! Database operations for orders and order items.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE DRAFT                                                        │
//! │     └── insert() → Order { status: Draft }                              │
//! │                                                                         │
//! │  2. EDIT ITEMS (draft only)                                             │
//! │     └── insert_item() / update_item() / delete_item()                   │
//! │     └── update_total() → Σ line totals                                  │
//! │                                                                         │
//! │  3. FINALIZE (exactly one of)                                           │
//! │     └── mark_paid()      → Order { status: Paid }                       │
//! │     └── mark_cancelled() → Order { status: Cancelled }                  │
//! │                                                                         │
//! │  Every write in 2 and 3 carries `WHERE status = 'draft'`; zero affected │
//! │  rows means the order was finalized concurrently.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tavern_core::{Order, OrderItem};

const ORDER_COLUMNS: &str = r#"
    id, establishment_id, table_id, status, payment_status,
    total_amount_cents, cash_amount_cents, card_amount_cents, change_amount_cents,
    cancellation_reason, created_at, updated_at, closed_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, order_id, product_id, tech_card_id, quantity,
    unit_price_cents, line_total_cents, created_at
"#;

/// Amounts persisted when an order is paid.
#[derive(Debug, Clone, Copy)]
pub struct PaidAmounts {
    pub cash_cents: i64,
    pub card_cents: i64,
    pub change_cents: i64,
}

/// Repository for orders and their items.
#[derive(Debug)]
pub struct OrderRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> OrderRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        OrderRepository { conn }
    }

    pub async fn insert(&mut self, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, establishment_id = %order.establishment_id, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, establishment_id, table_id, status, payment_status,
                total_amount_cents, cash_amount_cents, card_amount_cents, change_amount_cents,
                cancellation_reason, created_at, updated_at, closed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&order.id)
        .bind(&order.establishment_id)
        .bind(&order.table_id)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(order.total_amount_cents)
        .bind(order.cash_amount_cents)
        .bind(order.card_amount_cents)
        .bind(order.change_amount_cents)
        .bind(&order.cancellation_reason)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.closed_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&mut self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(order)
    }

    /// Draft orders of an establishment, oldest first.
    pub async fn list_active(&mut self, establishment_id: &str) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE establishment_id = ?1 AND status = 'draft' ORDER BY created_at"
        );

        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(establishment_id)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(orders)
    }

    /// Sets the total of a draft order. Returns false if the order is no
    /// longer a draft.
    pub async fn update_total(&mut self, order_id: &str, total_cents: i64) -> DbResult<bool> {
        debug!(order_id = %order_id, total_cents, "Updating order total");

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET total_amount_cents = ?2, updated_at = ?3
            WHERE id = ?1 AND status = 'draft'
            "#,
        )
        .bind(order_id)
        .bind(total_cents)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Draft → paid. Returns the updated order, or `None` if it was not a
    /// draft anymore.
    pub async fn mark_paid(
        &mut self,
        order_id: &str,
        amounts: PaidAmounts,
        at: DateTime<Utc>,
    ) -> DbResult<Option<Order>> {
        debug!(
            order_id = %order_id,
            cash_cents = amounts.cash_cents,
            card_cents = amounts.card_cents,
            change_cents = amounts.change_cents,
            "Marking order paid"
        );

        let sql = format!(
            r#"
            UPDATE orders SET
                status = 'paid',
                payment_status = 'paid',
                cash_amount_cents = ?2,
                card_amount_cents = ?3,
                change_amount_cents = ?4,
                updated_at = ?5,
                closed_at = ?5
            WHERE id = ?1 AND status = 'draft'
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .bind(amounts.cash_cents)
            .bind(amounts.card_cents)
            .bind(amounts.change_cents)
            .bind(at)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(order)
    }

    /// Draft → cancelled. Returns the updated order, or `None` if it was not
    /// a draft anymore.
    pub async fn mark_cancelled(
        &mut self,
        order_id: &str,
        reason: Option<&str>,
        at: DateTime<Utc>,
    ) -> DbResult<Option<Order>> {
        debug!(order_id = %order_id, ?reason, "Cancelling order");

        let sql = format!(
            r#"
            UPDATE orders SET
                status = 'cancelled',
                payment_status = 'cancelled',
                cancellation_reason = ?2,
                updated_at = ?3,
                closed_at = ?3
            WHERE id = ?1 AND status = 'draft'
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .bind(reason)
            .bind(at)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(order)
    }

    // =========================================================================
    // Items
    // =========================================================================

    pub async fn insert_item(&mut self, item: &OrderItem) -> DbResult<()> {
        debug!(
            order_id = %item.order_id,
            product_id = ?item.product_id,
            tech_card_id = ?item.tech_card_id,
            quantity = item.quantity,
            "Adding order item"
        );

        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, product_id, tech_card_id, quantity,
                unit_price_cents, line_total_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.order_id)
        .bind(&item.product_id)
        .bind(&item.tech_card_id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.line_total_cents)
        .bind(item.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn get_item(&mut self, order_id: &str, item_id: &str) -> DbResult<Option<OrderItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE id = ?1 AND order_id = ?2");

        let item = sqlx::query_as::<_, OrderItem>(&sql)
            .bind(item_id)
            .bind(order_id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(item)
    }

    /// Items of an order in insertion order.
    pub async fn items(&mut self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY created_at, id");

        let items = sqlx::query_as::<_, OrderItem>(&sql)
            .bind(order_id)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(items)
    }

    /// Rewrites quantity and pricing of one line.
    pub async fn update_item(&mut self, item: &OrderItem) -> DbResult<()> {
        debug!(id = %item.id, quantity = item.quantity, "Updating order item");

        let result = sqlx::query(
            r#"
            UPDATE order_items
            SET quantity = ?2, unit_price_cents = ?3, line_total_cents = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.line_total_cents)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("OrderItem", &item.id));
        }

        Ok(())
    }

    pub async fn delete_item(&mut self, order_id: &str, item_id: &str) -> DbResult<bool> {
        debug!(order_id = %order_id, item_id = %item_id, "Removing order item");

        let result = sqlx::query("DELETE FROM order_items WHERE id = ?1 AND order_id = ?2")
            .bind(item_id)
            .bind(order_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use crate::{Database, DbConfig};
    use tavern_core::{OrderStatus, PaymentStatus};

    #[tokio::test]
    async fn test_draft_to_paid_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let est = fixtures::establishment(&mut conn).await;
        let order = fixtures::draft_order(&est.id);

        let mut repo = OrderRepository::new(&mut conn);
        repo.insert(&order).await.unwrap();
        assert!(repo.update_total(&order.id, 8_000).await.unwrap());

        let amounts = PaidAmounts {
            cash_cents: 8_000,
            card_cents: 0,
            change_cents: 2_000,
        };
        let paid = repo.mark_paid(&order.id, amounts, Utc::now()).await.unwrap().unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.total_amount_cents, 8_000);
        assert_eq!(paid.change_amount_cents, 2_000);
        assert!(paid.closed_at.is_some());

        assert!(repo.mark_paid(&order.id, amounts, Utc::now()).await.unwrap().is_none());
        assert!(repo.mark_cancelled(&order.id, None, Utc::now()).await.unwrap().is_none());
        assert!(!repo.update_total(&order.id, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_items_and_active_listing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let est = fixtures::establishment(&mut conn).await;
        let product = fixtures::product(&mut conn, &est.id, 350).await;
        let order = fixtures::draft_order(&est.id);
        let cancelled = fixtures::draft_order(&est.id);

        let mut repo = OrderRepository::new(&mut conn);
        repo.insert(&order).await.unwrap();
        repo.insert(&cancelled).await.unwrap();
        repo.mark_cancelled(&cancelled.id, Some("walked out"), Utc::now())
            .await
            .unwrap()
            .unwrap();

        let mut item = fixtures::product_line(&order.id, &product.id, 2, 350);
        repo.insert_item(&item).await.unwrap();

        item.quantity = 3;
        item.line_total_cents = 1_050;
        repo.update_item(&item).await.unwrap();

        let items = repo.items(&order.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].line_total_cents, 1_050);
        assert!(repo.get_item(&cancelled.id, &item.id).await.unwrap().is_none());

        let active = repo.list_active(&est.id).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, order.id);

        assert!(repo.delete_item(&order.id, &item.id).await.unwrap());
        assert!(!repo.delete_item(&order.id, &item.id).await.unwrap());
    }
}
