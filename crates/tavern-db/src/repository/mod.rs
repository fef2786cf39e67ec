//! # Repository Module
//!
//! Database repository implementations for Tavern POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Connection-Borrowing Repositories                    │
//! │                                                                         │
//! │  Service use case                                                       │
//! │       │                                                                 │
//! │       │  let mut tx = db.begin().await?;                                │
//! │       │  TransactionRepository::new(&mut tx).insert(&entry).await?;     │
//! │       │  AccountRepository::new(&mut tx).apply_balance_delta(..).await?;│
//! │       │  tx.commit().await?;                                            │
//! │       ▼                                                                 │
//! │  Repositories hold `&mut SqliteConnection`, so a sqlx Transaction and   │
//! │  a PoolConnection both work. Every statement of one use case runs on    │
//! │  the same connection and commits or rolls back together.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lookups return `Option`; translating a missing row into a domain error is
//! the caller's job.
//!
//! ## Available Repositories
//!
//! - [`AccountRepository`](account::AccountRepository) - Accounts, atomic balance deltas
//! - [`TransactionRepository`](transaction::TransactionRepository) - Ledger entries, filtered totals
//! - [`ShiftRepository`](shift::ShiftRepository) - Shift open/close
//! - [`OrderRepository`](order::OrderRepository) - Orders, items, status transitions
//! - [`CatalogRepository`](catalog::CatalogRepository) - Products, tech cards, ingredients, warehouses
//! - [`StockRepository`](stock::StockRepository) - Stock, supplies, write-offs
//! - [`EstablishmentRepository`](establishment::EstablishmentRepository) - Tenants

pub mod account;
pub mod catalog;
pub mod establishment;
pub mod order;
pub mod shift;
pub mod stock;
pub mod transaction;

#[cfg(test)]
pub(crate) mod fixtures;
