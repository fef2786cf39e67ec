//! Establishment bootstrap.
//!
//! A new establishment starts with three zero-balance accounts and one
//! warehouse. The cash register takes cash payments; the bank account takes
//! card payments.

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use tavern_core::validation::{validate_currency, validate_name};
use tavern_core::{Account, AccountKind, Establishment, Warehouse};
use tavern_db::{AccountRepository, CatalogRepository, Database, EstablishmentRepository};

use crate::catalog::new_warehouse;
use crate::error::ServiceResult;

pub const CASH_REGISTER_NAME: &str = "Cash register";
pub const BANK_ACCOUNT_NAME: &str = "Bank account";
pub const SAFE_NAME: &str = "Safe";
pub const MAIN_WAREHOUSE_NAME: &str = "Main warehouse";

/// Everything created for a new establishment.
#[derive(Debug, Clone, Serialize)]
pub struct EstablishmentSetup {
    pub establishment: Establishment,
    pub cash_account: Account,
    pub bank_account: Account,
    pub safe: Account,
    pub warehouse: Warehouse,
}

impl EstablishmentSetup {
    pub fn accounts(&self) -> [&Account; 3] {
        [&self.cash_account, &self.bank_account, &self.safe]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OnboardingService<'a> {
    db: &'a Database,
    default_currency: &'a str,
}

impl<'a> OnboardingService<'a> {
    pub fn new(db: &'a Database, default_currency: &'a str) -> Self {
        OnboardingService { db, default_currency }
    }

    pub async fn create_establishment(
        &self,
        name: &str,
        currency: Option<&str>,
    ) -> ServiceResult<EstablishmentSetup> {
        validate_name("name", name)?;
        let currency = currency.unwrap_or(self.default_currency);
        validate_currency(currency)?;

        let now = Utc::now();
        let mut establishment = Establishment {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            currency: currency.to_string(),
            cash_account_id: None,
            card_account_id: None,
            created_at: now,
        };

        let account = |name: &str, kind: AccountKind| Account {
            id: Uuid::new_v4().to_string(),
            establishment_id: establishment.id.clone(),
            name: name.to_string(),
            currency: currency.to_string(),
            kind,
            initial_balance_cents: 0,
            current_balance_cents: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let cash_account = account(CASH_REGISTER_NAME, AccountKind::Cash);
        let bank_account = account(BANK_ACCOUNT_NAME, AccountKind::Bank);
        let safe = account(SAFE_NAME, AccountKind::Safe);
        let warehouse = new_warehouse(&establishment.id, MAIN_WAREHOUSE_NAME);

        let mut tx = self.db.begin().await?;

        EstablishmentRepository::new(&mut tx).insert(&establishment).await?;
        for account in [&cash_account, &bank_account, &safe] {
            AccountRepository::new(&mut tx).insert(account).await?;
        }
        CatalogRepository::new(&mut tx).insert_warehouse(&warehouse).await?;
        EstablishmentRepository::new(&mut tx)
            .set_payment_accounts(&establishment.id, Some(&cash_account.id), Some(&bank_account.id))
            .await?;

        tx.commit().await?;

        establishment.cash_account_id = Some(cash_account.id.clone());
        establishment.card_account_id = Some(bank_account.id.clone());

        info!(establishment_id = %establishment.id, currency = %establishment.currency, "Establishment created");

        Ok(EstablishmentSetup {
            establishment,
            cash_account,
            bank_account,
            safe,
            warehouse,
        })
    }
}
