//! # Establishment Repository

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tavern_core::Establishment;

/// Repository for establishments.
#[derive(Debug)]
pub struct EstablishmentRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> EstablishmentRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        EstablishmentRepository { conn }
    }

    pub async fn insert(&mut self, establishment: &Establishment) -> DbResult<()> {
        debug!(id = %establishment.id, name = %establishment.name, "Inserting establishment");

        sqlx::query(
            r#"
            INSERT INTO establishments (id, name, currency, cash_account_id, card_account_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&establishment.id)
        .bind(&establishment.name)
        .bind(&establishment.currency)
        .bind(&establishment.cash_account_id)
        .bind(&establishment.card_account_id)
        .bind(establishment.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&mut self, id: &str) -> DbResult<Option<Establishment>> {
        let establishment = sqlx::query_as::<_, Establishment>(
            r#"
            SELECT id, name, currency, cash_account_id, card_account_id, created_at
            FROM establishments
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(establishment)
    }

    /// Maps payment methods to accounts.
    pub async fn set_payment_accounts(
        &mut self,
        id: &str,
        cash_account_id: Option<&str>,
        card_account_id: Option<&str>,
    ) -> DbResult<()> {
        debug!(id = %id, ?cash_account_id, ?card_account_id, "Setting payment accounts");

        let result = sqlx::query(
            r#"
            UPDATE establishments
            SET cash_account_id = ?2, card_account_id = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(cash_account_id)
        .bind(card_account_id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Establishment", id));
        }

        Ok(())
    }
}
