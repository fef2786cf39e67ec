//! # Error Types
//!
//! Domain errors for tavern-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tavern-core (this file)                                                │
//! │  ├── CoreError        - Business rule / state / lookup failures         │
//! │  └── ValidationError  - Malformed input                                 │
//! │                                                                         │
//! │  tavern-db                                                              │
//! │  └── DbError          - Storage failures                                │
//! │                                                                         │
//! │  tavern-service                                                         │
//! │  └── ServiceError     - Core | Db, classified by ErrorKind              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every [`CoreError`] variant belongs to exactly one [`ErrorKind`]; the
//! kind decides how a caller (e.g. an HTTP layer) reports it. Nothing in the
//! core retries.

use serde::Serialize;
use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification of failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// A referenced entity does not exist in the establishment (404).
    NotFound,
    /// The entity is in a state that forbids the operation (409).
    InvalidState,
    /// A money/stock rule rejected the request (400).
    BusinessRule,
    /// The input itself is malformed (400).
    Validation,
    /// Storage failed; nothing was committed (500).
    Persistence,
}

impl ErrorKind {
    /// HTTP-equivalent status code.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidState => 409,
            ErrorKind::BusinessRule | ErrorKind::Validation => 400,
            ErrorKind::Persistence => 500,
        }
    }
}

// =============================================================================
// Core Error
// =============================================================================

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Establishment not found: {0}")]
    EstablishmentNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Shift not found: {0}")]
    ShiftNotFound(String),

    /// A shift report filter matched nothing.
    #[error("No shifts found for the given filter")]
    NoShiftsFound,

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order item not found: {0}")]
    OrderItemNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Tech card not found: {0}")]
    TechCardNotFound(String),

    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    #[error("Warehouse not found: {0}")]
    WarehouseNotFound(String),

    #[error("No stock for {item} in warehouse {warehouse_id}")]
    StockNotFound { item: String, warehouse_id: String },

    /// The establishment has no account mapped for a payment method or for
    /// cash reconciliation.
    #[error("No {purpose} account configured for establishment {establishment_id}")]
    AccountNotConfigured {
        establishment_id: String,
        purpose: String,
    },

    /// Order is `paid` or `cancelled`.
    #[error("Order {order_id} is already {status}")]
    OrderAlreadyFinalized { order_id: String, status: String },

    #[error("User {user_id} already has an active shift ({shift_id})")]
    ShiftAlreadyActive { user_id: String, shift_id: String },

    #[error("Shift {0} has already ended")]
    ShiftAlreadyEnded(String),

    /// Expense larger than the account balance.
    #[error("Insufficient balance on account {account_id}: available {available}, requested {requested}")]
    InsufficientBalance {
        account_id: String,
        available: Money,
        requested: Money,
    },

    /// cash + card does not cover the order total.
    #[error("Insufficient payment: total {total}, paid {paid}")]
    InsufficientPayment { total: Money, paid: Money },

    /// The customer handed over less cash than the cash part of the split.
    #[error("Client cash {given} is less than cash amount {cash}")]
    ClientCashTooLow { given: Money, cash: Money },

    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: f64,
        requested: f64,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::EstablishmentNotFound(_)
            | CoreError::AccountNotFound(_)
            | CoreError::TransactionNotFound(_)
            | CoreError::ShiftNotFound(_)
            | CoreError::NoShiftsFound
            | CoreError::OrderNotFound(_)
            | CoreError::OrderItemNotFound(_)
            | CoreError::ProductNotFound(_)
            | CoreError::TechCardNotFound(_)
            | CoreError::IngredientNotFound(_)
            | CoreError::WarehouseNotFound(_)
            | CoreError::StockNotFound { .. } => ErrorKind::NotFound,

            CoreError::OrderAlreadyFinalized { .. }
            | CoreError::ShiftAlreadyActive { .. }
            | CoreError::ShiftAlreadyEnded(_)
            | CoreError::AccountNotConfigured { .. } => ErrorKind::InvalidState,

            CoreError::InsufficientBalance { .. }
            | CoreError::InsufficientPayment { .. }
            | CoreError::ClientCashTooLow { .. }
            | CoreError::InsufficientStock { .. } => ErrorKind::BusinessRule,

            CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
