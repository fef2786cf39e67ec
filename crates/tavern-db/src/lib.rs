//! # tavern-db: Database Layer for Tavern POS
//!
//! SQLite persistence for the Tavern POS backend, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tavern POS Data Flow                             │
//! │                                                                         │
//! │  tavern-service (ProcessOrderPayment, EndShift, ...)                    │
//! │       │  opens one sqlx Transaction per use case                        │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tavern-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │    │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │    │   │
//! │  │   │               │    │ AccountRepo   │    │              │    │   │
//! │  │   │ SqlitePool    │◄───│ TransactionRe │    │ 001_initial_ │    │   │
//! │  │   │ begin/acquire │    │ ShiftRepo ... │    │ schema.sql   │    │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL)                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tavern_db::{AccountRepository, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/tavern.db")).await?;
//!
//! let mut tx = db.begin().await?;
//! let balance = AccountRepository::new(&mut tx)
//!     .apply_balance_delta(&account_id, 2_000)
//!     .await?;
//! tx.commit().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::account::AccountRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::establishment::EstablishmentRepository;
pub use repository::order::{OrderRepository, PaidAmounts};
pub use repository::shift::ShiftRepository;
pub use repository::stock::StockRepository;
pub use repository::transaction::TransactionRepository;
