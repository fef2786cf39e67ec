//! # Transaction Repository
//!
//! Persistence of ledger entries. Balance effects are applied by the caller
//! through [`AccountRepository`](super::account::AccountRepository) on the
//! same connection.
//!
//! ## Filtering
//! ```text
//! WHERE establishment_id = ?            (always)
//!   AND account_id = ?                  (filter.account_id)
//!   AND shift_id = ?                    (filter.shift_id)
//!   AND order_id = ?                    (filter.order_id)
//!   AND category = ?                    (filter.category)
//!   AND transaction_type = ?            (filter.transaction_type)
//!   AND date >= ? / date <= ?           (filter.date.from / .to)
//! ```

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tavern_core::{LedgerTransaction, TransactionFilter};

const COLUMNS: &str = r#"
    id, establishment_id, account_id, transaction_type, amount_cents,
    category, description, date, shift_id, order_id, created_at, updated_at
"#;

/// Repository for ledger transactions.
#[derive(Debug)]
pub struct TransactionRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> TransactionRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        TransactionRepository { conn }
    }

    pub async fn insert(&mut self, tx: &LedgerTransaction) -> DbResult<()> {
        debug!(
            id = %tx.id,
            account_id = %tx.account_id,
            transaction_type = ?tx.transaction_type,
            category = ?tx.category,
            amount_cents = tx.amount_cents,
            "Inserting transaction"
        );

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, establishment_id, account_id, transaction_type, amount_cents,
                category, description, date, shift_id, order_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.establishment_id)
        .bind(&tx.account_id)
        .bind(tx.transaction_type)
        .bind(tx.amount_cents)
        .bind(tx.category)
        .bind(&tx.description)
        .bind(tx.date)
        .bind(&tx.shift_id)
        .bind(&tx.order_id)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Rewrites every mutable column of an existing row.
    pub async fn update(&mut self, tx: &LedgerTransaction) -> DbResult<()> {
        debug!(id = %tx.id, account_id = %tx.account_id, "Updating transaction");

        let result = sqlx::query(
            r#"
            UPDATE transactions SET
                account_id = ?3,
                transaction_type = ?4,
                amount_cents = ?5,
                category = ?6,
                description = ?7,
                date = ?8,
                shift_id = ?9,
                order_id = ?10,
                updated_at = ?11
            WHERE id = ?1 AND establishment_id = ?2
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.establishment_id)
        .bind(&tx.account_id)
        .bind(tx.transaction_type)
        .bind(tx.amount_cents)
        .bind(tx.category)
        .bind(&tx.description)
        .bind(tx.date)
        .bind(&tx.shift_id)
        .bind(&tx.order_id)
        .bind(tx.updated_at)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", &tx.id));
        }

        Ok(())
    }

    pub async fn delete(&mut self, id: &str, establishment_id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting transaction");

        let result = sqlx::query("DELETE FROM transactions WHERE id = ?1 AND establishment_id = ?2")
            .bind(id)
            .bind(establishment_id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", id));
        }

        Ok(())
    }

    pub async fn get_by_id(
        &mut self,
        id: &str,
        establishment_id: &str,
    ) -> DbResult<Option<LedgerTransaction>> {
        let sql = format!("SELECT {COLUMNS} FROM transactions WHERE id = ?1 AND establishment_id = ?2");

        let tx = sqlx::query_as::<_, LedgerTransaction>(&sql)
            .bind(id)
            .bind(establishment_id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(tx)
    }

    /// Filtered entries, oldest first.
    pub async fn list(
        &mut self,
        establishment_id: &str,
        filter: &TransactionFilter,
    ) -> DbResult<Vec<LedgerTransaction>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM transactions"));
        push_filter(&mut qb, establishment_id, filter);
        qb.push(" ORDER BY date, created_at");

        let rows = qb
            .build_query_as::<LedgerTransaction>()
            .fetch_all(&mut *self.conn)
            .await?;

        debug!(establishment_id = %establishment_id, count = rows.len(), "Listed transactions");
        Ok(rows)
    }

    /// Σ signed effect (income positive, expense negative) of the filtered
    /// entries. Zero when nothing matches.
    pub async fn total_amount(
        &mut self,
        establishment_id: &str,
        filter: &TransactionFilter,
    ) -> DbResult<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT COALESCE(SUM(CASE transaction_type
                                    WHEN 'income' THEN amount_cents
                                    ELSE -amount_cents
                                END), 0)
            FROM transactions
            "#,
        );
        push_filter(&mut qb, establishment_id, filter);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(total)
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, establishment_id: &str, filter: &TransactionFilter) {
    qb.push(" WHERE establishment_id = ")
        .push_bind(establishment_id.to_string());

    if let Some(account_id) = &filter.account_id {
        qb.push(" AND account_id = ").push_bind(account_id.clone());
    }
    if let Some(shift_id) = &filter.shift_id {
        qb.push(" AND shift_id = ").push_bind(shift_id.clone());
    }
    if let Some(order_id) = &filter.order_id {
        qb.push(" AND order_id = ").push_bind(order_id.clone());
    }
    if let Some(category) = filter.category {
        qb.push(" AND category = ").push_bind(category);
    }
    if let Some(transaction_type) = filter.transaction_type {
        qb.push(" AND transaction_type = ").push_bind(transaction_type);
    }
    if let Some(from) = filter.date.from {
        qb.push(" AND date >= ").push_bind(from);
    }
    if let Some(to) = filter.date.to {
        qb.push(" AND date <= ").push_bind(to);
    }
}
