//! # Domain Types
//!
//! Entities shared by every Tavern POS layer.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Establishment ──┬── Account ◄──────── LedgerTransaction                │
//! │  (tenant)        │   balance             type + amount + category       │
//! │                  │                       shift_id? order_id?            │
//! │                  ├── Shift ──────────────────┘                          │
//! │                  │   start/end, cash                                    │
//! │                  ├── Order ── OrderItem ──► Product | TechCard          │
//! │                  │   draft → paid | cancelled                           │
//! │                  └── Warehouse ── Stock ◄── Supply / WriteOff           │
//! │                                   Ingredient | Product                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Money columns are stored as `*_cents: i64`; each entity exposes
//! [`Money`] accessors for arithmetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ledger;
use crate::money::Money;

// =============================================================================
// Establishment
// =============================================================================

/// Tenant boundary. Every other entity carries an `establishment_id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Establishment {
    pub id: String,
    pub name: String,
    /// ISO 4217 code shared by the default accounts.
    pub currency: String,
    /// Account that receives cash payments and incassations.
    pub cash_account_id: Option<String>,
    /// Account that receives card payments.
    pub card_account_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Establishment {
    /// Account configured for a payment method.
    pub fn account_for(&self, method: PaymentMethod) -> Option<&str> {
        match method {
            PaymentMethod::Cash => self.cash_account_id.as_deref(),
            PaymentMethod::Card => self.card_account_id.as_deref(),
        }
    }
}

// =============================================================================
// Account
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Register drawer.
    Cash,
    /// Bank / acquiring account.
    Bank,
    Safe,
    Other,
}

/// A monetary holding (cash box, bank account, safe).
///
/// `current_balance_cents` is owned by the ledger: it only moves through
/// relative balance updates issued alongside transaction writes.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Account {
    pub id: String,
    pub establishment_id: String,
    pub name: String,
    pub currency: String,
    pub kind: AccountKind,
    pub initial_balance_cents: i64,
    pub current_balance_cents: i64,
    /// Soft-delete flag.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Account {
    #[inline]
    pub fn initial_balance(&self) -> Money {
        Money::from_cents(self.initial_balance_cents)
    }

    #[inline]
    pub fn current_balance(&self) -> Money {
        Money::from_cents(self.current_balance_cents)
    }
}

// =============================================================================
// Ledger Transaction
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
}

/// Closed category taxonomy for ledger entries.
///
/// Shift reports partition income by these values, so payment methods are
/// categories of their own rather than free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionCategory {
    CashPayment,
    CardPayment,
    /// Reconciling entry posted when a shift closes with a cash difference.
    Incassation,
    Discount,
    /// Order closed without payment.
    OrderWriteOff,
    Supply,
    Salary,
    Other,
}

impl TransactionCategory {
    /// Ledger category used for money received through a payment method.
    pub fn for_payment(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Cash => TransactionCategory::CashPayment,
            PaymentMethod::Card => TransactionCategory::CardPayment,
        }
    }
}

/// One money movement against one account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LedgerTransaction {
    pub id: String,
    pub establishment_id: String,
    pub account_id: String,
    pub transaction_type: TransactionType,
    /// Non-negative magnitude. The sign comes from `transaction_type`.
    pub amount_cents: i64,
    pub category: TransactionCategory,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub shift_id: Option<String>,
    pub order_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl LedgerTransaction {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Effect of this entry on its account balance.
    #[inline]
    pub fn signed_effect(&self) -> Money {
        ledger::signed_effect(self.transaction_type, self.amount())
    }
}

/// Caller-supplied fields for a new or edited ledger entry.
///
/// The engine fills in ids and timestamps; `date` defaults to now.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionDraft {
    pub account_id: String,
    pub transaction_type: TransactionType,
    pub amount_cents: i64,
    pub category: TransactionCategory,
    pub description: Option<String>,
    #[ts(as = "Option<String>")]
    pub date: Option<DateTime<Utc>>,
    pub shift_id: Option<String>,
    pub order_id: Option<String>,
}

impl TransactionDraft {
    /// Minimal draft; optional fields empty.
    pub fn new(
        account_id: impl Into<String>,
        transaction_type: TransactionType,
        amount: Money,
        category: TransactionCategory,
    ) -> Self {
        TransactionDraft {
            account_id: account_id.into(),
            transaction_type,
            amount_cents: amount.cents(),
            category,
            description: None,
            date: None,
            shift_id: None,
            order_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_shift(mut self, shift_id: Option<String>) -> Self {
        self.shift_id = shift_id;
        self
    }

    pub fn with_order(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Shift
// =============================================================================

/// One user's work session at a register. `end_time = None` means active.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shift {
    pub id: String,
    pub user_id: String,
    pub establishment_id: String,
    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub end_time: Option<DateTime<Utc>>,
    pub initial_cash_cents: i64,
    pub final_cash_cents: Option<i64>,
    pub comment: Option<String>,
}

impl Shift {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    #[inline]
    pub fn initial_cash(&self) -> Money {
        Money::from_cents(self.initial_cash_cents)
    }

    #[inline]
    pub fn final_cash(&self) -> Option<Money> {
        self.final_cash_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Items can still be added or changed.
    Draft,
    Paid,
    Cancelled,
}

impl OrderStatus {
    /// `Paid` and `Cancelled` admit no further transitions.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Cancelled)
    }

    /// Stored and serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Draft
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
}

/// A customer check.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub establishment_id: String,
    pub table_id: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Σ line totals, recomputed from scratch after every item change.
    pub total_amount_cents: i64,
    pub cash_amount_cents: i64,
    pub card_amount_cents: i64,
    pub change_amount_cents: i64,
    pub cancellation_reason: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Order {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn change_amount(&self) -> Money {
        Money::from_cents(self.change_amount_cents)
    }
}

/// What an order line sells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ItemRef {
    Product(String),
    TechCard(String),
}

/// A line on an order. Exactly one of `product_id` / `tech_card_id` is set.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: Option<String>,
    pub tech_card_id: Option<String>,
    pub quantity: i64,
    /// Unit price resolved from the catalog when the line was last touched.
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// The referenced catalog entry, `None` for a malformed row.
    pub fn item_ref(&self) -> Option<ItemRef> {
        match (&self.product_id, &self.tech_card_id) {
            (Some(id), None) => Some(ItemRef::Product(id.clone())),
            (None, Some(id)) => Some(ItemRef::TechCard(id.clone())),
            _ => None,
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub establishment_id: String,
    pub name: String,
    pub price_cents: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// A recipe sold like a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TechCard {
    pub id: String,
    pub establishment_id: String,
    pub name: String,
    pub price_cents: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl TechCard {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Ingredient {
    pub id: String,
    pub establishment_id: String,
    pub name: String,
    /// Measurement unit: "kg", "l", "pcs".
    pub unit: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Warehouse {
    pub id: String,
    pub establishment_id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock
// =============================================================================

/// What a stock row counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum StockItem {
    Ingredient(String),
    Product(String),
}

impl StockItem {
    /// `(ingredient_id, product_id)` column pair.
    pub fn columns(&self) -> (Option<&str>, Option<&str>) {
        match self {
            StockItem::Ingredient(id) => (Some(id.as_str()), None),
            StockItem::Product(id) => (None, Some(id.as_str())),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            StockItem::Ingredient(id) | StockItem::Product(id) => id,
        }
    }
}

/// Quantity and unit price of one item in one warehouse.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Stock {
    pub id: String,
    pub establishment_id: String,
    pub warehouse_id: String,
    pub ingredient_id: Option<String>,
    pub product_id: Option<String>,
    pub quantity: f64,
    pub price_per_unit_cents: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Stock {
    #[inline]
    pub fn price_per_unit(&self) -> Money {
        Money::from_cents(self.price_per_unit_cents)
    }

    /// Value of the stock on hand.
    pub fn value(&self) -> Money {
        self.price_per_unit().multiply_measure(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supply {
    pub id: String,
    pub establishment_id: String,
    pub warehouse_id: String,
    pub ingredient_id: Option<String>,
    pub product_id: Option<String>,
    pub quantity: f64,
    pub price_per_unit_cents: i64,
    pub total_cost_cents: i64,
    /// Account charged for the supply, if any.
    pub account_id: Option<String>,
    /// Ledger entry posted for the supply, if any.
    pub transaction_id: Option<String>,
    #[ts(as = "String")]
    pub supplied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct WriteOff {
    pub id: String,
    pub establishment_id: String,
    pub warehouse_id: String,
    pub ingredient_id: Option<String>,
    pub product_id: Option<String>,
    pub quantity: f64,
    pub reason: Option<String>,
    #[ts(as = "String")]
    pub written_off_at: DateTime<Utc>,
}

// =============================================================================
// Filters
// =============================================================================

/// Inclusive time window. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "Option<String>")]
    pub from: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        DateRange {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| at >= from) && self.to.map_or(true, |to| at <= to)
    }
}

/// Optional criteria for listing ledger entries inside an establishment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionFilter {
    pub account_id: Option<String>,
    pub shift_id: Option<String>,
    pub order_id: Option<String>,
    pub category: Option<TransactionCategory>,
    pub transaction_type: Option<TransactionType>,
    pub date: DateRange,
}

impl TransactionFilter {
    pub fn for_account(account_id: impl Into<String>) -> Self {
        TransactionFilter {
            account_id: Some(account_id.into()),
            ..Default::default()
        }
    }

    pub fn for_shift(shift_id: impl Into<String>) -> Self {
        TransactionFilter {
            shift_id: Some(shift_id.into()),
            ..Default::default()
        }
    }
}

/// Criteria for resolving shifts. The date range applies to `start_time`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShiftFilter {
    pub user_id: Option<String>,
    pub date: DateRange,
}

// =============================================================================
// Unit Tests
// =============================================================================
