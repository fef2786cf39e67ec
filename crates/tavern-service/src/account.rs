//! Account management and balance maintenance.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use tavern_core::ledger::replay_balance;
use tavern_core::validation::{validate_amount_cents, validate_currency, validate_name};
use tavern_core::{Account, AccountKind, CoreError, Money, TransactionFilter};
use tavern_db::{AccountRepository, Database, EstablishmentRepository, TransactionRepository};

use crate::error::ServiceResult;

/// Input for [`AccountService::create_account`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    /// Falls back to the establishment currency.
    pub currency: Option<String>,
    pub kind: AccountKind,
    pub initial_balance_cents: i64,
}

impl NewAccount {
    pub fn new(name: impl Into<String>, kind: AccountKind) -> Self {
        NewAccount {
            name: name.into(),
            currency: None,
            kind,
            initial_balance_cents: 0,
        }
    }

    pub fn with_initial_balance(mut self, balance: Money) -> Self {
        self.initial_balance_cents = balance.cents();
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AccountService<'a> {
    db: &'a Database,
}

impl<'a> AccountService<'a> {
    pub fn new(db: &'a Database) -> Self {
        AccountService { db }
    }

    pub async fn create_account(
        &self,
        establishment_id: &str,
        input: NewAccount,
    ) -> ServiceResult<Account> {
        validate_name("name", &input.name)?;
        validate_amount_cents("initial_balance", input.initial_balance_cents)?;

        let mut conn = self.db.acquire().await?;
        let establishment = EstablishmentRepository::new(&mut conn)
            .get_by_id(establishment_id)
            .await?
            .ok_or_else(|| CoreError::EstablishmentNotFound(establishment_id.to_string()))?;

        let currency = input.currency.unwrap_or(establishment.currency);
        validate_currency(&currency)?;

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4().to_string(),
            establishment_id: establishment.id,
            name: input.name.trim().to_string(),
            currency,
            kind: input.kind,
            initial_balance_cents: input.initial_balance_cents,
            current_balance_cents: input.initial_balance_cents,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        AccountRepository::new(&mut conn).insert(&account).await?;

        info!(account_id = %account.id, kind = ?account.kind, "Account created");
        Ok(account)
    }

    pub async fn get_account(&self, establishment_id: &str, id: &str) -> ServiceResult<Account> {
        let mut conn = self.db.acquire().await?;
        let account = AccountRepository::new(&mut conn)
            .get_by_id(id, establishment_id)
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(id.to_string()))?;

        Ok(account)
    }

    pub async fn list_accounts(&self, establishment_id: &str) -> ServiceResult<Vec<Account>> {
        let mut conn = self.db.acquire().await?;
        Ok(AccountRepository::new(&mut conn).list(establishment_id).await?)
    }

    /// Soft delete; ledger history stays.
    pub async fn delete_account(&self, establishment_id: &str, id: &str) -> ServiceResult<()> {
        let mut conn = self.db.acquire().await?;
        let removed = AccountRepository::new(&mut conn)
            .deactivate(id, establishment_id)
            .await?;

        if !removed {
            return Err(CoreError::AccountNotFound(id.to_string()).into());
        }

        info!(account_id = %id, "Account deactivated");
        Ok(())
    }

    /// Recomputes the balance from the opening balance and every entry on
    /// the account, and stores it. Returns the recomputed balance.
    pub async fn recalculate_balance(
        &self,
        establishment_id: &str,
        account_id: &str,
    ) -> ServiceResult<Money> {
        let mut tx = self.db.begin().await?;

        let account = AccountRepository::new(&mut tx)
            .get_by_id(account_id, establishment_id)
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))?;

        let history = TransactionRepository::new(&mut tx)
            .list(establishment_id, &TransactionFilter::for_account(account_id))
            .await?;

        let balance = replay_balance(account.initial_balance(), &history);
        if balance != account.current_balance() {
            warn!(
                account_id = %account_id,
                stored = %account.current_balance(),
                replayed = %balance,
                "Balance drift corrected"
            );
        }

        AccountRepository::new(&mut tx)
            .set_balance(account_id, balance.cents())
            .await?;
        tx.commit().await?;

        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fund, onboard, tavern};
    use tavern_core::{TransactionCategory, TransactionDraft, TransactionType};

    #[tokio::test]
    async fn test_create_uses_establishment_currency() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;

        let account = tavern
            .accounts()
            .create_account(
                est,
                NewAccount::new("Tips jar", AccountKind::Other)
                    .with_initial_balance(Money::from_cents(1_500)),
            )
            .await
            .unwrap();

        assert_eq!(account.currency, setup.establishment.currency);
        assert_eq!(account.current_balance_cents, 1_500);
        assert_eq!(tavern.accounts().list_accounts(est).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_create_requires_establishment() {
        let tavern = tavern().await;

        let err = tavern
            .accounts()
            .create_account("missing", NewAccount::new("Till", AccountKind::Cash))
            .await
            .unwrap_err();

        assert!(matches!(err.as_core(), Some(CoreError::EstablishmentNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_hides_account() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;

        tavern.accounts().delete_account(est, &setup.safe.id).await.unwrap();

        assert!(tavern.accounts().get_account(est, &setup.safe.id).await.is_err());
        assert!(tavern.accounts().delete_account(est, &setup.safe.id).await.is_err());
        assert_eq!(tavern.accounts().list_accounts(est).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_balance_delta_is_relative() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let safe = &setup.safe.id;

        let mut conn = tavern.database().acquire().await.unwrap();
        let mut accounts = AccountRepository::new(&mut conn);
        assert_eq!(accounts.apply_balance_delta(safe, 900).await.unwrap(), Some(900));
        assert_eq!(accounts.apply_balance_delta(safe, -400).await.unwrap(), Some(500));
        assert_eq!(accounts.apply_balance_delta("missing", 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_funding_keeps_balance_replayable() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;
        let cash = &setup.cash_account.id;

        fund(&tavern, est, cash, 10_000).await;

        let account = tavern.accounts().get_account(est, cash).await.unwrap();
        assert_eq!(account.current_balance_cents, 10_000);
        let replayed = tavern.accounts().recalculate_balance(est, cash).await.unwrap();
        assert_eq!(replayed.cents(), 10_000);
    }

    #[tokio::test]
    async fn test_recalculate_repairs_drift() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;
        let cash = &setup.cash_account.id;

        tavern
            .finance()
            .create_transaction(
                est,
                TransactionDraft::new(
                    cash.clone(),
                    TransactionType::Income,
                    Money::from_cents(2_000),
                    TransactionCategory::Other,
                ),
            )
            .await
            .unwrap();

        // Out-of-band change with no ledger entry behind it.
        {
            let mut conn = tavern.database().acquire().await.unwrap();
            AccountRepository::new(&mut conn)
                .apply_balance_delta(cash, 77)
                .await
                .unwrap();
        }

        let balance = tavern.accounts().recalculate_balance(est, cash).await.unwrap();
        assert_eq!(balance.cents(), 2_000);
        let account = tavern.accounts().get_account(est, cash).await.unwrap();
        assert_eq!(account.current_balance_cents, 2_000);
    }
}
