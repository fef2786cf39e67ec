//! # Account Repository
//!
//! Accounts and the balance primitive of the ledger.
//!
//! ## Balance Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_balance_delta(id, +200)                                          │
//! │                                                                         │
//! │    UPDATE accounts                                                      │
//! │    SET current_balance_cents = current_balance_cents + 200              │
//! │    WHERE id = ? RETURNING current_balance_cents                         │
//! │                                                                         │
//! │  One statement: concurrent writers on the same row serialize inside     │
//! │  SQLite and no update is lost.                                          │
//! │                                                                         │
//! │  apply_balance_delta_guarded(id, -300)                                  │
//! │    ... AND current_balance_cents + (-300) >= 0                          │
//! │    → None when the balance would go negative (nothing written)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tavern_core::Account;

const SELECT_ACCOUNT: &str = r#"
    SELECT id, establishment_id, name, currency, kind,
           initial_balance_cents, current_balance_cents, is_active,
           created_at, updated_at
    FROM accounts
"#;

/// Repository for accounts.
#[derive(Debug)]
pub struct AccountRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> AccountRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        AccountRepository { conn }
    }

    pub async fn insert(&mut self, account: &Account) -> DbResult<()> {
        debug!(
            id = %account.id,
            establishment_id = %account.establishment_id,
            kind = ?account.kind,
            "Inserting account"
        );

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, establishment_id, name, currency, kind,
                initial_balance_cents, current_balance_cents, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&account.id)
        .bind(&account.establishment_id)
        .bind(&account.name)
        .bind(&account.currency)
        .bind(account.kind)
        .bind(account.initial_balance_cents)
        .bind(account.current_balance_cents)
        .bind(account.is_active)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Active account scoped to an establishment.
    pub async fn get_by_id(&mut self, id: &str, establishment_id: &str) -> DbResult<Option<Account>> {
        let sql = format!("{SELECT_ACCOUNT} WHERE id = ?1 AND establishment_id = ?2 AND is_active = 1");

        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(establishment_id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(account)
    }

    /// Active accounts of an establishment, oldest first.
    pub async fn list(&mut self, establishment_id: &str) -> DbResult<Vec<Account>> {
        let sql = format!(
            "{SELECT_ACCOUNT} WHERE establishment_id = ?1 AND is_active = 1 ORDER BY created_at, name"
        );

        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(establishment_id)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(accounts)
    }

    /// Adds `delta_cents` to the balance and returns the new balance.
    ///
    /// `None` if no account has this id.
    pub async fn apply_balance_delta(&mut self, id: &str, delta_cents: i64) -> DbResult<Option<i64>> {
        debug!(account_id = %id, delta_cents, "Applying balance delta");

        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE accounts
            SET current_balance_cents = current_balance_cents + ?2,
                updated_at = ?3
            WHERE id = ?1
            RETURNING current_balance_cents
            "#,
        )
        .bind(id)
        .bind(delta_cents)
        .bind(Utc::now())
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(balance)
    }

    /// Like [`apply_balance_delta`](Self::apply_balance_delta), but only when
    /// the resulting balance stays non-negative.
    ///
    /// `None` if the account is missing or the balance cannot cover the delta;
    /// nothing is written in that case.
    pub async fn apply_balance_delta_guarded(
        &mut self,
        id: &str,
        delta_cents: i64,
    ) -> DbResult<Option<i64>> {
        debug!(account_id = %id, delta_cents, "Applying guarded balance delta");

        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE accounts
            SET current_balance_cents = current_balance_cents + ?2,
                updated_at = ?3
            WHERE id = ?1 AND current_balance_cents + ?2 >= 0
            RETURNING current_balance_cents
            "#,
        )
        .bind(id)
        .bind(delta_cents)
        .bind(Utc::now())
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(balance)
    }

    /// Overwrites the balance. Only for ledger replay.
    pub async fn set_balance(&mut self, id: &str, balance_cents: i64) -> DbResult<()> {
        debug!(account_id = %id, balance_cents, "Rewriting balance");

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET current_balance_cents = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(balance_cents)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        Ok(())
    }

    /// Soft delete. Returns false if no active account matched.
    pub async fn deactivate(&mut self, id: &str, establishment_id: &str) -> DbResult<bool> {
        debug!(account_id = %id, "Deactivating account");

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET is_active = 0, updated_at = ?3
            WHERE id = ?1 AND establishment_id = ?2 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(establishment_id)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
