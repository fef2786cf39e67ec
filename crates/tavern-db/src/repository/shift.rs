//! # Shift Repository
//!
//! A partial unique index (`user_id WHERE end_time IS NULL`) backs the
//! one-active-shift rule, and [`ShiftRepository::end`] only touches rows that
//! are still open, so two racing closes cannot both succeed.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::error::DbResult;
use tavern_core::{Shift, ShiftFilter};

const COLUMNS: &str = r#"
    id, user_id, establishment_id, start_time, end_time,
    initial_cash_cents, final_cash_cents, comment
"#;

/// Repository for shifts.
#[derive(Debug)]
pub struct ShiftRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ShiftRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        ShiftRepository { conn }
    }

    /// Fails with `DbError::UniqueViolation` if the user already has an
    /// open shift.
    pub async fn insert(&mut self, shift: &Shift) -> DbResult<()> {
        debug!(id = %shift.id, user_id = %shift.user_id, "Inserting shift");

        sqlx::query(
            r#"
            INSERT INTO shifts (
                id, user_id, establishment_id, start_time, end_time,
                initial_cash_cents, final_cash_cents, comment
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&shift.id)
        .bind(&shift.user_id)
        .bind(&shift.establishment_id)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.initial_cash_cents)
        .bind(shift.final_cash_cents)
        .bind(&shift.comment)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&mut self, id: &str) -> DbResult<Option<Shift>> {
        let sql = format!("SELECT {COLUMNS} FROM shifts WHERE id = ?1");

        let shift = sqlx::query_as::<_, Shift>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(shift)
    }

    pub async fn get_active_by_user_id(&mut self, user_id: &str) -> DbResult<Option<Shift>> {
        let sql = format!("SELECT {COLUMNS} FROM shifts WHERE user_id = ?1 AND end_time IS NULL");

        let shift = sqlx::query_as::<_, Shift>(&sql)
            .bind(user_id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(shift)
    }

    /// Closes an open shift. Returns the closed row, or `None` if the shift
    /// was already closed (or never existed).
    pub async fn end(
        &mut self,
        id: &str,
        end_time: DateTime<Utc>,
        final_cash_cents: i64,
        comment: Option<&str>,
    ) -> DbResult<Option<Shift>> {
        debug!(id = %id, final_cash_cents, "Ending shift");

        let sql = format!(
            r#"
            UPDATE shifts
            SET end_time = ?2, final_cash_cents = ?3, comment = ?4
            WHERE id = ?1 AND end_time IS NULL
            RETURNING {COLUMNS}
            "#
        );

        let shift = sqlx::query_as::<_, Shift>(&sql)
            .bind(id)
            .bind(end_time)
            .bind(final_cash_cents)
            .bind(comment)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(shift)
    }

    /// Shifts of an establishment, most recent start first.
    ///
    /// A date range matches shifts whose start time lies inside it.
    pub async fn list(&mut self, establishment_id: &str, filter: &ShiftFilter) -> DbResult<Vec<Shift>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM shifts"));
        qb.push(" WHERE establishment_id = ")
            .push_bind(establishment_id.to_string());

        if let Some(user_id) = &filter.user_id {
            qb.push(" AND user_id = ").push_bind(user_id.clone());
        }
        if let Some(from) = filter.date.from {
            qb.push(" AND start_time >= ").push_bind(from);
        }
        if let Some(to) = filter.date.to {
            qb.push(" AND start_time <= ").push_bind(to);
        }
        qb.push(" ORDER BY start_time DESC");

        let shifts = qb
            .build_query_as::<Shift>()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(shifts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::fixtures;
    use crate::{Database, DbConfig};
    use chrono::Duration;

    #[tokio::test]
    async fn test_one_open_shift_per_user() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let est = fixtures::establishment(&mut conn).await;

        let first = fixtures::open_shift(&est.id, "alice", 50_000);
        let second = fixtures::open_shift(&est.id, "alice", 10_000);

        let mut repo = ShiftRepository::new(&mut conn);
        repo.insert(&first).await.unwrap();
        let err = repo.insert(&second).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let active = repo.get_active_by_user_id("alice").await.unwrap().unwrap();
        assert_eq!(active.id, first.id);
        assert!(repo.get_active_by_user_id("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_end_only_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let est = fixtures::establishment(&mut conn).await;
        let shift = fixtures::open_shift(&est.id, "alice", 50_000);

        let mut repo = ShiftRepository::new(&mut conn);
        repo.insert(&shift).await.unwrap();

        let closed = repo
            .end(&shift.id, Utc::now(), 70_000, Some("busy night"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(closed.final_cash_cents, Some(70_000));
        assert_eq!(closed.comment.as_deref(), Some("busy night"));
        assert!(!closed.is_active());

        assert!(repo.end(&shift.id, Utc::now(), 1, None).await.unwrap().is_none());
        assert!(repo.get_active_by_user_id("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_most_recent_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let est = fixtures::establishment(&mut conn).await;

        let mut older = fixtures::open_shift(&est.id, "alice", 0);
        older.start_time = Utc::now() - Duration::days(2);
        older.end_time = Some(older.start_time + Duration::hours(8));
        let newer = fixtures::open_shift(&est.id, "alice", 0);
        let other_user = fixtures::open_shift(&est.id, "bob", 0);

        let mut repo = ShiftRepository::new(&mut conn);
        for shift in [&older, &newer, &other_user] {
            repo.insert(shift).await.unwrap();
        }

        let alice = ShiftFilter {
            user_id: Some("alice".to_string()),
            ..Default::default()
        };
        let shifts = repo.list(&est.id, &alice).await.unwrap();
        assert_eq!(shifts.len(), 2);
        assert_eq!(shifts[0].id, newer.id);

        assert_eq!(repo.list(&est.id, &ShiftFilter::default()).await.unwrap().len(), 3);
    }
}
