//! # Shift Session Manager
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  start_shift(user, est, float)                                          │
//! │     └── user already has an open shift?       → ShiftAlreadyActive      │
//! │                                                                         │
//! │  end_shift(shift, final_cash, comment, cash_account?)                   │
//! │     ├── unknown shift                          → ShiftNotFound          │
//! │     ├── end_time already set                   → ShiftAlreadyEnded      │
//! │     ├── UPDATE ... WHERE end_time IS NULL                               │
//! │     └── final ≠ initial → one incassation entry on the cash account     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! At most one open shift per user is also enforced by a partial unique
//! index, so two concurrent starts cannot both succeed.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use tavern_core::shift::{ensure_active, ensure_can_start, reconcile};
use tavern_core::validation::{validate_amount_cents, validate_name, validate_note};
use tavern_core::{
    CoreError, LedgerTransaction, Money, Shift, ShiftFilter, TransactionCategory, TransactionDraft,
};
use tavern_db::{Database, EstablishmentRepository, ShiftRepository};

use crate::error::ServiceResult;
use crate::finance::FinanceService;

/// A closed shift and the reconciling entry, if one was needed.
#[derive(Debug, Clone, Serialize)]
pub struct ShiftClosure {
    pub shift: Shift,
    pub incassation: Option<LedgerTransaction>,
}

#[derive(Debug, Clone, Copy)]
pub struct ShiftService<'a> {
    db: &'a Database,
}

impl<'a> ShiftService<'a> {
    pub fn new(db: &'a Database) -> Self {
        ShiftService { db }
    }

    pub async fn start_shift(
        &self,
        user_id: &str,
        establishment_id: &str,
        initial_cash: Money,
    ) -> ServiceResult<Shift> {
        validate_name("user_id", user_id)?;
        validate_amount_cents("initial_cash", initial_cash.cents())?;

        let mut tx = self.db.begin().await?;

        if EstablishmentRepository::new(&mut tx)
            .get_by_id(establishment_id)
            .await?
            .is_none()
        {
            return Err(CoreError::EstablishmentNotFound(establishment_id.to_string()).into());
        }

        let active = ShiftRepository::new(&mut tx)
            .get_active_by_user_id(user_id)
            .await?;
        if let Err(err) = ensure_can_start(user_id, active.as_ref()) {
            warn!(user_id = %user_id, "Shift start rejected: already active");
            return Err(err.into());
        }

        let shift = Shift {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            establishment_id: establishment_id.to_string(),
            start_time: Utc::now(),
            end_time: None,
            initial_cash_cents: initial_cash.cents(),
            final_cash_cents: None,
            comment: None,
        };

        match ShiftRepository::new(&mut tx).insert(&shift).await {
            Ok(()) => {}
            Err(err) if err.is_unique_violation() => {
                // Lost a race with another start for the same user.
                let winner = ShiftRepository::new(&mut tx)
                    .get_active_by_user_id(user_id)
                    .await?;
                return Err(CoreError::ShiftAlreadyActive {
                    user_id: user_id.to_string(),
                    shift_id: winner.map(|s| s.id).unwrap_or_default(),
                }
                .into());
            }
            Err(err) => return Err(err.into()),
        }

        tx.commit().await?;

        info!(shift_id = %shift.id, user_id = %user_id, initial_cash = %initial_cash, "Shift started");
        Ok(shift)
    }

    /// Closes a shift with the counted cash.
    ///
    /// `cash_account_id` defaults to the establishment's cash account; it is
    /// only needed when the count differs from the opening float.
    pub async fn end_shift(
        &self,
        shift_id: &str,
        final_cash: Money,
        comment: Option<&str>,
        cash_account_id: Option<&str>,
    ) -> ServiceResult<ShiftClosure> {
        validate_amount_cents("final_cash", final_cash.cents())?;
        if let Some(comment) = comment {
            validate_note("comment", comment)?;
        }

        let mut tx = self.db.begin().await?;

        let shift = ShiftRepository::new(&mut tx)
            .get_by_id(shift_id)
            .await?
            .ok_or_else(|| CoreError::ShiftNotFound(shift_id.to_string()))?;
        ensure_active(&shift)?;

        let end_time = Utc::now();
        let shift = ShiftRepository::new(&mut tx)
            .end(shift_id, end_time, final_cash.cents(), comment)
            .await?
            .ok_or_else(|| CoreError::ShiftAlreadyEnded(shift_id.to_string()))?;

        let incassation = match reconcile(shift.initial_cash(), final_cash) {
            None => None,
            Some(difference) => {
                let account_id = match cash_account_id {
                    Some(id) => id.to_string(),
                    None => EstablishmentRepository::new(&mut tx)
                        .get_by_id(&shift.establishment_id)
                        .await?
                        .and_then(|est| est.cash_account_id)
                        .ok_or_else(|| CoreError::AccountNotConfigured {
                            establishment_id: shift.establishment_id.clone(),
                            purpose: "cash".to_string(),
                        })?,
                };

                let draft = TransactionDraft::new(
                    account_id,
                    difference.transaction_type,
                    difference.amount,
                    TransactionCategory::Incassation,
                )
                .with_description(format!("Shift close: cash difference {}", difference.effect))
                .with_shift(Some(shift.id.clone()))
                .with_date(end_time);

                let entry = FinanceService::create_in(&mut tx, &shift.establishment_id, draft).await?;
                Some(entry)
            }
        };

        tx.commit().await?;

        info!(
            shift_id = %shift.id,
            final_cash = %final_cash,
            incassation = incassation.is_some(),
            "Shift ended"
        );

        Ok(ShiftClosure { shift, incassation })
    }

    pub async fn get_shift(&self, shift_id: &str) -> ServiceResult<Shift> {
        let mut conn = self.db.acquire().await?;
        let shift = ShiftRepository::new(&mut conn)
            .get_by_id(shift_id)
            .await?
            .ok_or_else(|| CoreError::ShiftNotFound(shift_id.to_string()))?;

        Ok(shift)
    }

    /// The user's open shift, if any.
    pub async fn get_active_shift(&self, user_id: &str) -> ServiceResult<Option<Shift>> {
        let mut conn = self.db.acquire().await?;
        Ok(ShiftRepository::new(&mut conn)
            .get_active_by_user_id(user_id)
            .await?)
    }

    /// Shifts of an establishment, most recent start first.
    pub async fn list_shifts(
        &self,
        establishment_id: &str,
        filter: &ShiftFilter,
    ) -> ServiceResult<Vec<Shift>> {
        let mut conn = self.db.acquire().await?;
        Ok(ShiftRepository::new(&mut conn)
            .list(establishment_id, filter)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fund, onboard, tavern};
    use tavern_core::{ErrorKind, TransactionType};

    #[tokio::test]
    async fn test_start_and_end_without_difference() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;

        let shift = tavern
            .shifts()
            .start_shift("alice", &setup.establishment.id, Money::from_cents(50_000))
            .await
            .unwrap();
        assert!(shift.is_active());

        let active = tavern.shifts().get_active_shift("alice").await.unwrap();
        assert_eq!(active.map(|s| s.id), Some(shift.id.clone()));

        let closure = tavern
            .shifts()
            .end_shift(&shift.id, Money::from_cents(50_000), Some("quiet night"), None)
            .await
            .unwrap();

        assert!(closure.incassation.is_none());
        assert_eq!(closure.shift.final_cash_cents, Some(50_000));
        assert_eq!(closure.shift.comment.as_deref(), Some("quiet night"));
        assert!(tavern.shifts().get_active_shift("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_start_rejected() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;

        let first = tavern.shifts().start_shift("bob", est, Money::zero()).await.unwrap();
        let err = tavern.shifts().start_shift("bob", est, Money::zero()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidState);
        match err.as_core() {
            Some(CoreError::ShiftAlreadyActive { shift_id, .. }) => assert_eq!(shift_id, &first.id),
            other => panic!("unexpected error: {other:?}"),
        }

        // Another user is unaffected.
        tavern.shifts().start_shift("carol", est, Money::zero()).await.unwrap();
    }

    #[tokio::test]
    async fn test_shortfall_posts_expense() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;
        let cash = &setup.cash_account.id;

        fund(&tavern, est, cash, 10_000).await;

        let shift = tavern.shifts().start_shift("dave", est, Money::from_cents(5_000)).await.unwrap();
        let closure = tavern
            .shifts()
            .end_shift(&shift.id, Money::from_cents(4_500), None, None)
            .await
            .unwrap();

        let entry = closure.incassation.unwrap();
        assert_eq!(entry.transaction_type, TransactionType::Expense);
        assert_eq!(entry.amount_cents, 500);
        assert_eq!(entry.category, TransactionCategory::Incassation);
        assert_eq!(entry.shift_id.as_deref(), Some(shift.id.as_str()));
        assert_eq!(Some(entry.date), closure.shift.end_time);

        let account = tavern.accounts().get_account(est, cash).await.unwrap();
        assert_eq!(account.current_balance_cents, 9_500);
    }

    #[tokio::test]
    async fn test_end_twice_and_unknown() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;

        let shift = tavern
            .shifts()
            .start_shift("erin", &setup.establishment.id, Money::zero())
            .await
            .unwrap();
        tavern.shifts().end_shift(&shift.id, Money::zero(), None, None).await.unwrap();

        let err = tavern
            .shifts()
            .end_shift(&shift.id, Money::zero(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::ShiftAlreadyEnded(_))));

        let err = tavern
            .shifts()
            .end_shift("no-such-shift", Money::zero(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::ShiftNotFound(_))));
    }

    #[tokio::test]
    async fn test_failed_incassation_keeps_shift_open() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;

        let shift = tavern
            .shifts()
            .start_shift("frank", &setup.establishment.id, Money::from_cents(1_000))
            .await
            .unwrap();

        // Empty cash account cannot absorb a shortfall.
        let err = tavern
            .shifts()
            .end_shift(&shift.id, Money::zero(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::InsufficientBalance { .. })));

        let reloaded = tavern.shifts().get_shift(&shift.id).await.unwrap();
        assert!(reloaded.is_active());
    }

    #[tokio::test]
    async fn test_list_filters_by_user() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;

        tavern.shifts().start_shift("gina", est, Money::zero()).await.unwrap();
        tavern.shifts().start_shift("hank", est, Money::zero()).await.unwrap();

        let filter = ShiftFilter {
            user_id: Some("gina".to_string()),
            ..Default::default()
        };
        let shifts = tavern.shifts().list_shifts(est, &filter).await.unwrap();
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].user_id, "gina");

        let all = tavern.shifts().list_shifts(est, &ShiftFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
