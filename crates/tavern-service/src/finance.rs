//! # Finance Engine
//!
//! Creates, edits and deletes ledger entries while keeping every account
//! balance equal to its opening balance plus the signed effect of its
//! entries.
//!
//! ## Posting An Entry
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. validate amount ≥ 0                                                │
//! │   2. load account scoped to the establishment     → AccountNotFound     │
//! │   3. income:  balance += amount                                         │
//! │      expense: balance -= amount  only if balance stays ≥ 0              │
//! │                                                  → InsufficientBalance  │
//! │   4. insert the entry                                                   │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `*_in` functions run on a borrowed connection so shift close, order
//! payment and supplies post entries inside their own database transaction.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tavern_core::ledger::{ensure_covers, plan_delete, plan_update, signed_effect};
use tavern_core::validation::{validate_amount_cents, validate_note};
use tavern_core::{CoreError, LedgerTransaction, Money, TransactionDraft, TransactionFilter, TransactionType};
use tavern_db::{AccountRepository, Database, TransactionRepository};

use crate::error::ServiceResult;

/// Ledger entry use cases.
#[derive(Debug, Clone, Copy)]
pub struct FinanceService<'a> {
    db: &'a Database,
}

impl<'a> FinanceService<'a> {
    pub fn new(db: &'a Database) -> Self {
        FinanceService { db }
    }

    pub async fn create_transaction(
        &self,
        establishment_id: &str,
        draft: TransactionDraft,
    ) -> ServiceResult<LedgerTransaction> {
        let mut tx = self.db.begin().await?;
        let entry = Self::create_in(&mut tx, establishment_id, draft).await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Replaces entry `id` with `draft`, moving its effect between accounts
    /// if the account changed.
    pub async fn update_transaction(
        &self,
        establishment_id: &str,
        id: &str,
        draft: TransactionDraft,
    ) -> ServiceResult<LedgerTransaction> {
        let mut tx = self.db.begin().await?;
        let entry = Self::update_in(&mut tx, establishment_id, id, draft).await?;
        tx.commit().await?;
        Ok(entry)
    }

    pub async fn delete_transaction(&self, establishment_id: &str, id: &str) -> ServiceResult<()> {
        let mut tx = self.db.begin().await?;
        Self::delete_in(&mut tx, establishment_id, id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_transaction(
        &self,
        establishment_id: &str,
        id: &str,
    ) -> ServiceResult<LedgerTransaction> {
        let mut conn = self.db.acquire().await?;
        let entry = TransactionRepository::new(&mut conn)
            .get_by_id(id, establishment_id)
            .await?
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;

        Ok(entry)
    }

    /// Entries matching `filter`, oldest first.
    pub async fn list_transactions(
        &self,
        establishment_id: &str,
        filter: &TransactionFilter,
    ) -> ServiceResult<Vec<LedgerTransaction>> {
        let mut conn = self.db.acquire().await?;
        let entries = TransactionRepository::new(&mut conn)
            .list(establishment_id, filter)
            .await?;

        Ok(entries)
    }

    /// Net signed amount of the entries matching `filter`: income counts
    /// positive, expense negative.
    pub async fn get_total_transactions_amount(
        &self,
        establishment_id: &str,
        filter: &TransactionFilter,
    ) -> ServiceResult<Money> {
        let mut conn = self.db.acquire().await?;
        let total = TransactionRepository::new(&mut conn)
            .total_amount(establishment_id, filter)
            .await?;

        Ok(Money::from_cents(total))
    }

    // =========================================================================
    // Connection-scoped operations
    // =========================================================================

    pub async fn create_in(
        conn: &mut SqliteConnection,
        establishment_id: &str,
        draft: TransactionDraft,
    ) -> ServiceResult<LedgerTransaction> {
        validate_draft(&draft)?;

        let account = AccountRepository::new(conn)
            .get_by_id(&draft.account_id, establishment_id)
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(draft.account_id.clone()))?;

        let balance = apply_effect(
            conn,
            &account.id,
            account.current_balance(),
            draft.transaction_type,
            draft.amount(),
        )
        .await?;

        let now = Utc::now();
        let entry = LedgerTransaction {
            id: Uuid::new_v4().to_string(),
            establishment_id: establishment_id.to_string(),
            account_id: account.id,
            transaction_type: draft.transaction_type,
            amount_cents: draft.amount_cents,
            category: draft.category,
            description: draft.description,
            date: draft.date.unwrap_or(now),
            shift_id: draft.shift_id,
            order_id: draft.order_id,
            created_at: now,
            updated_at: now,
        };

        TransactionRepository::new(conn).insert(&entry).await?;

        info!(
            transaction_id = %entry.id,
            account_id = %entry.account_id,
            kind = ?entry.transaction_type,
            category = ?entry.category,
            amount = %entry.amount(),
            balance = %balance,
            "Transaction created"
        );

        Ok(entry)
    }

    pub async fn update_in(
        conn: &mut SqliteConnection,
        establishment_id: &str,
        id: &str,
        draft: TransactionDraft,
    ) -> ServiceResult<LedgerTransaction> {
        validate_draft(&draft)?;

        let old = TransactionRepository::new(conn)
            .get_by_id(id, establishment_id)
            .await?
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;

        let new_account = AccountRepository::new(conn)
            .get_by_id(&draft.account_id, establishment_id)
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(draft.account_id.clone()))?;

        let [revert, _] = plan_update(&old, &draft);

        AccountRepository::new(conn)
            .apply_balance_delta(&revert.account_id, revert.delta.cents())
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(revert.account_id.clone()))?;

        // Balance of the new account once the old effect is gone.
        let available = if revert.account_id == new_account.id {
            new_account.current_balance() + revert.delta
        } else {
            new_account.current_balance()
        };

        apply_effect(
            conn,
            &new_account.id,
            available,
            draft.transaction_type,
            draft.amount(),
        )
        .await?;

        let entry = LedgerTransaction {
            id: old.id,
            establishment_id: old.establishment_id,
            account_id: new_account.id,
            transaction_type: draft.transaction_type,
            amount_cents: draft.amount_cents,
            category: draft.category,
            description: draft.description,
            date: draft.date.unwrap_or(old.date),
            shift_id: draft.shift_id,
            order_id: draft.order_id,
            created_at: old.created_at,
            updated_at: Utc::now(),
        };

        TransactionRepository::new(conn).update(&entry).await?;

        info!(
            transaction_id = %entry.id,
            from_account = %old.account_id,
            to_account = %entry.account_id,
            amount = %entry.amount(),
            "Transaction updated"
        );

        Ok(entry)
    }

    pub async fn delete_in(
        conn: &mut SqliteConnection,
        establishment_id: &str,
        id: &str,
    ) -> ServiceResult<()> {
        let old = TransactionRepository::new(conn)
            .get_by_id(id, establishment_id)
            .await?
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;

        let revert = plan_delete(&old);
        AccountRepository::new(conn)
            .apply_balance_delta(&revert.account_id, revert.delta.cents())
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(revert.account_id.clone()))?;

        TransactionRepository::new(conn)
            .delete(id, establishment_id)
            .await?;

        info!(transaction_id = %id, account_id = %old.account_id, "Transaction deleted");
        Ok(())
    }
}

fn validate_draft(draft: &TransactionDraft) -> ServiceResult<()> {
    validate_amount_cents("amount", draft.amount_cents)?;
    if let Some(description) = &draft.description {
        validate_note("description", description)?;
    }
    Ok(())
}

/// Moves `account_id` by the effect of one entry and returns the new
/// balance. `available` is the balance the entry is checked against.
///
/// Positive expenses go through the guarded update, so the funds check and
/// the write are one statement.
async fn apply_effect(
    conn: &mut SqliteConnection,
    account_id: &str,
    available: Money,
    transaction_type: TransactionType,
    amount: Money,
) -> ServiceResult<Money> {
    let delta = signed_effect(transaction_type, amount);
    let mut accounts = AccountRepository::new(conn);

    let balance = if transaction_type == TransactionType::Expense && amount.is_positive() {
        if let Err(err) = ensure_covers(account_id, available, amount) {
            warn!(account_id = %account_id, %available, requested = %amount, "Expense rejected");
            return Err(err.into());
        }

        accounts
            .apply_balance_delta_guarded(account_id, delta.cents())
            .await?
            .ok_or_else(|| CoreError::InsufficientBalance {
                account_id: account_id.to_string(),
                available,
                requested: amount,
            })?
    } else {
        accounts
            .apply_balance_delta(account_id, delta.cents())
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))?
    };

    debug!(account_id = %account_id, delta = %delta, balance, "Balance moved");
    Ok(Money::from_cents(balance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{onboard, tavern};
    use tavern_core::{ErrorKind, TransactionCategory};

    fn income(account_id: &str, cents: i64) -> TransactionDraft {
        TransactionDraft::new(
            account_id,
            TransactionType::Income,
            Money::from_cents(cents),
            TransactionCategory::Other,
        )
    }

    fn expense(account_id: &str, cents: i64) -> TransactionDraft {
        TransactionDraft::new(
            account_id,
            TransactionType::Expense,
            Money::from_cents(cents),
            TransactionCategory::Other,
        )
    }

    #[tokio::test]
    async fn test_create_moves_balance() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;
        let cash = &setup.cash_account.id;

        tavern.finance().create_transaction(est, income(cash, 10_000)).await.unwrap();
        tavern.finance().create_transaction(est, expense(cash, 2_500)).await.unwrap();

        let account = tavern.accounts().get_account(est, cash).await.unwrap();
        assert_eq!(account.current_balance_cents, 7_500);
    }

    #[tokio::test]
    async fn test_expense_cannot_overdraw() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;
        let cash = &setup.cash_account.id;

        tavern.finance().create_transaction(est, income(cash, 1_000)).await.unwrap();
        let err = tavern
            .finance()
            .create_transaction(est, expense(cash, 1_001))
            .await
            .unwrap_err();

        assert!(matches!(err.as_core(), Some(CoreError::InsufficientBalance { .. })));

        let account = tavern.accounts().get_account(est, cash).await.unwrap();
        assert_eq!(account.current_balance_cents, 1_000);
        let entries = tavern
            .finance()
            .list_transactions(est, &TransactionFilter::for_account(cash.clone()))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_negative_amount_rejected() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;

        let err = tavern
            .finance()
            .create_transaction(&setup.establishment.id, income(&setup.cash_account.id, -5))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_account_scoped_to_establishment() {
        let tavern = tavern().await;
        let first = onboard(&tavern).await;
        let second = onboard(&tavern).await;

        let err = tavern
            .finance()
            .create_transaction(&second.establishment.id, income(&first.cash_account.id, 100))
            .await
            .unwrap_err();

        assert!(matches!(err.as_core(), Some(CoreError::AccountNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_same_account_checks_reverted_balance() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;
        let cash = &setup.cash_account.id;

        tavern.finance().create_transaction(est, income(cash, 1_000)).await.unwrap();
        let spent = tavern.finance().create_transaction(est, expense(cash, 800)).await.unwrap();

        // 200 left, but the edited expense is checked against 1 000.
        let edited = tavern
            .finance()
            .update_transaction(est, &spent.id, expense(cash, 1_000))
            .await
            .unwrap();
        assert_eq!(edited.amount_cents, 1_000);
        assert_eq!(edited.created_at, spent.created_at);

        let account = tavern.accounts().get_account(est, cash).await.unwrap();
        assert_eq!(account.current_balance_cents, 0);
    }

    #[tokio::test]
    async fn test_delete_reverts_effect() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;
        let bank = &setup.bank_account.id;

        let entry = tavern.finance().create_transaction(est, income(bank, 4_200)).await.unwrap();
        tavern.finance().delete_transaction(est, &entry.id).await.unwrap();

        let account = tavern.accounts().get_account(est, bank).await.unwrap();
        assert_eq!(account.current_balance_cents, 0);

        let err = tavern.finance().get_transaction(est, &entry.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = tavern.finance().delete_transaction(est, &entry.id).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::TransactionNotFound(_))));
    }

    #[tokio::test]
    async fn test_total_amount_nets_income_and_expense() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;
        let cash = &setup.cash_account.id;

        tavern.finance().create_transaction(est, income(cash, 3_000)).await.unwrap();
        tavern.finance().create_transaction(est, expense(cash, 1_200)).await.unwrap();

        let filter = TransactionFilter::default();
        let total = tavern.finance().get_total_transactions_amount(est, &filter).await.unwrap();
        assert_eq!(total.cents(), 1_800);

        let expenses = TransactionFilter {
            transaction_type: Some(TransactionType::Expense),
            ..Default::default()
        };
        let total = tavern.finance().get_total_transactions_amount(est, &expenses).await.unwrap();
        assert_eq!(total.cents(), -1_200);
    }
}
