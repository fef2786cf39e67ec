//! # tavern-service: Use Cases for Tavern POS
//!
//! Every operation of the back office lives here: ledger entries, accounts,
//! shifts, orders and payments, shift reports, stock, and establishment
//! bootstrap.
//!
//! ## Transaction Boundaries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Tavern (facade, owns the pool)                                         │
//! │    │                                                                    │
//! │    ├── finance()     create / update / delete / list / total            │
//! │    ├── accounts()    create / get / list / delete / recalculate         │
//! │    ├── shifts()      start / end (+ incassation) / get / list           │
//! │    ├── orders()      create / items / pay / close without payment       │
//! │    ├── reports()     shift report                                       │
//! │    ├── stock()       supplies / write-offs / lookups                    │
//! │    ├── catalog()     products / tech cards / ingredients / warehouses   │
//! │    └── onboarding()  establishment + default accounts                   │
//! │                                                                         │
//! │  A writing use case = one sqlx::Transaction. Returning early drops it   │
//! │  and SQLite rolls back.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use tavern_core::Money;
//! use tavern_service::{AppConfig, Tavern};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! tavern_service::telemetry::init_tracing(&config.log_filter);
//!
//! let tavern = Tavern::connect(&config).await?;
//! let setup = tavern.onboarding().create_establishment("The Prancing Pony", None).await?;
//! let shift = tavern
//!     .shifts()
//!     .start_shift("barliman", &setup.establishment.id, Money::from_cents(20_000))
//!     .await?;
//! # let _ = shift;
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod catalog;
pub mod config;
pub mod error;
pub mod finance;
pub mod onboarding;
pub mod order;
pub mod report;
pub mod shift;
pub mod stock;
pub mod telemetry;

use tavern_core::DEFAULT_CURRENCY;
use tavern_db::Database;

pub use account::{AccountService, NewAccount};
pub use catalog::CatalogService;
pub use config::{AppConfig, ConfigError};
pub use error::{ErrorBody, ServiceError, ServiceResult};
pub use finance::FinanceService;
pub use onboarding::{EstablishmentSetup, OnboardingService};
pub use order::{OrderClosure, OrderDetails, OrderService, PaymentReceipt};
pub use report::ShiftReportService;
pub use shift::{ShiftClosure, ShiftService};
pub use stock::{NewSupply, NewWriteOff, StockService, SupplyRecord, WriteOffRecord};

/// Entry point holding the database pool.
///
/// Cheap to clone. Service handles borrow it and are created per call.
#[derive(Debug, Clone)]
pub struct Tavern {
    db: Database,
    default_currency: String,
}

impl Tavern {
    /// Opens (and migrates) the database described by `config`.
    pub async fn connect(config: &AppConfig) -> ServiceResult<Self> {
        let db = Database::new(config.db_config()).await?;
        Ok(Tavern {
            db,
            default_currency: config.default_currency.clone(),
        })
    }

    pub fn new(db: Database) -> Self {
        Tavern {
            db,
            default_currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    pub fn with_default_currency(mut self, currency: impl Into<String>) -> Self {
        self.default_currency = currency.into();
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn finance(&self) -> FinanceService<'_> {
        FinanceService::new(&self.db)
    }

    pub fn accounts(&self) -> AccountService<'_> {
        AccountService::new(&self.db)
    }

    pub fn shifts(&self) -> ShiftService<'_> {
        ShiftService::new(&self.db)
    }

    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(&self.db)
    }

    pub fn reports(&self) -> ShiftReportService<'_> {
        ShiftReportService::new(&self.db)
    }

    pub fn stock(&self) -> StockService<'_> {
        StockService::new(&self.db)
    }

    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(&self.db)
    }

    pub fn onboarding(&self) -> OnboardingService<'_> {
        OnboardingService::new(&self.db, &self.default_currency)
    }
}
