//! # tavern-core: Pure Business Logic for Tavern POS
//!
//! Ledger arithmetic, payment settlement, shift reconciliation and report
//! aggregation as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tavern POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                tavern-service (use cases)                       │   │
//! │  │   finance, accounts, shifts, orders, reports, stock, onboarding │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tavern-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │ ledger  │ │ payment │ │  shift  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐                          │   │
//! │  │   │ report  │ │inventory│ │validation│                          │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘                          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tavern-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Account, LedgerTransaction, Shift, Order, ...)
//! - [`money`] - Integer-cents money type
//! - [`ledger`] - Signed effects and balance adjustment plans
//! - [`payment`] - Cash/card split validation and change
//! - [`shift`] - Shift state checks and cash reconciliation
//! - [`report`] - Shift report aggregation
//! - [`inventory`] - Weighted stock price and availability
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tavern_core::money::Money;
//! use tavern_core::shift::reconcile;
//! use tavern_core::TransactionType;
//!
//! // Opened with 500.00, counted 700.00 at close
//! let incassation = reconcile(Money::from_cents(50_000), Money::from_cents(70_000)).unwrap();
//! assert_eq!(incassation.transaction_type, TransactionType::Income);
//! assert_eq!(incassation.amount.cents(), 20_000);
//! ```

pub mod error;
pub mod inventory;
pub mod ledger;
pub mod money;
pub mod payment;
pub mod report;
pub mod shift;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use payment::PaymentSplit;
pub use report::ShiftReport;
pub use types::*;

/// Maximum quantity of a single order line.
///
/// Catches typos like 1000 instead of 10 at the register.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest single monetary amount accepted from a client, in cents
/// (10 billion major units).
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;

/// Currency assigned to accounts when none is given.
pub const DEFAULT_CURRENCY: &str = "USD";
