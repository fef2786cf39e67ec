//! # Order Payment Math
//!
//! Validation of a cash/card split against an order total, change
//! calculation, and order total recomputation.
//!
//! ## Payment Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order total 80.00                                                      │
//! │                                                                         │
//! │  cash 50.00 + card 30.00, client hands over 100.00                      │
//! │       │                                                                 │
//! │       ├── order paid/cancelled?        → OrderAlreadyFinalized          │
//! │       ├── cash + card < total?         → InsufficientPayment            │
//! │       ├── client cash < cash part?     → ClientCashTooLow               │
//! │       ▼                                                                 │
//! │  change = 100.00 - 50.00 = 50.00                                        │
//! │  ledger lines: (cash_payment, 50.00) (card_payment, 30.00)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Order, OrderItem, PaymentMethod};
use crate::validation::validate_amount_cents;
use crate::MAX_AMOUNT_CENTS;

/// Amounts a cashier enters when settling an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentSplit {
    pub cash_amount_cents: i64,
    pub card_amount_cents: i64,
    /// Physical cash the customer handed over.
    pub client_cash_given_cents: i64,
}

impl PaymentSplit {
    pub fn new(cash: Money, card: Money, client_cash_given: Money) -> Self {
        PaymentSplit {
            cash_amount_cents: cash.cents(),
            card_amount_cents: card.cents(),
            client_cash_given_cents: client_cash_given.cents(),
        }
    }

    #[inline]
    pub fn cash(&self) -> Money {
        Money::from_cents(self.cash_amount_cents)
    }

    #[inline]
    pub fn card(&self) -> Money {
        Money::from_cents(self.card_amount_cents)
    }

    #[inline]
    pub fn client_cash_given(&self) -> Money {
        Money::from_cents(self.client_cash_given_cents)
    }
}

/// Outcome of a validated payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub cash: Money,
    pub card: Money,
    pub change: Money,
}

impl Settlement {
    /// One `(method, amount)` per payment method actually used.
    pub fn ledger_lines(&self) -> Vec<(PaymentMethod, Money)> {
        [(PaymentMethod::Cash, self.cash), (PaymentMethod::Card, self.card)]
            .into_iter()
            .filter(|(_, amount)| !amount.is_zero())
            .collect()
    }
}

/// Fails with `OrderAlreadyFinalized` unless the order is still a draft.
pub fn ensure_open(order: &Order) -> CoreResult<()> {
    if order.status.is_terminal() {
        return Err(CoreError::OrderAlreadyFinalized {
            order_id: order.id.clone(),
            status: order.status.as_str().to_string(),
        });
    }

    Ok(())
}

/// Validates `split` against `order` and computes the change.
///
/// ```rust
/// use tavern_core::money::Money;
/// use tavern_core::payment::{settle_amounts, PaymentSplit};
///
/// let split = PaymentSplit::new(Money::from_cents(8_000), Money::zero(), Money::from_cents(10_000));
/// let settlement = settle_amounts(Money::from_cents(8_000), &split).unwrap();
/// assert_eq!(settlement.change.cents(), 2_000);
/// ```
pub fn settle(order: &Order, split: &PaymentSplit) -> CoreResult<Settlement> {
    ensure_open(order)?;
    settle_amounts(order.total_amount(), split)
}

/// The amount checks of [`settle`], without the order status check.
pub fn settle_amounts(total: Money, split: &PaymentSplit) -> CoreResult<Settlement> {
    validate_amount_cents("cash_amount", split.cash_amount_cents)?;
    validate_amount_cents("card_amount", split.card_amount_cents)?;
    validate_amount_cents("client_cash_given", split.client_cash_given_cents)?;

    let paid = split
        .cash()
        .checked_add(split.card())
        .ok_or_else(|| amount_out_of_range("paid_amount"))?;
    if paid < total {
        return Err(CoreError::InsufficientPayment { total, paid });
    }

    if split.client_cash_given() < split.cash() {
        return Err(CoreError::ClientCashTooLow {
            given: split.client_cash_given(),
            cash: split.cash(),
        });
    }

    Ok(Settlement {
        cash: split.cash(),
        card: split.card(),
        change: split.client_cash_given() - split.cash(),
    })
}

/// Line total for a unit price and quantity.
pub fn line_total(unit_price: Money, quantity: i64) -> CoreResult<Money> {
    unit_price
        .checked_multiply_quantity(quantity)
        .ok_or_else(|| amount_out_of_range("line_total"))
}

/// Order total recomputed from every line; never adjusted incrementally.
pub fn order_total(items: &[OrderItem]) -> CoreResult<Money> {
    items.iter().try_fold(Money::zero(), |total, item| {
        total
            .checked_add(item.line_total())
            .ok_or_else(|| amount_out_of_range("total_amount"))
    })
}

fn amount_out_of_range(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: MAX_AMOUNT_CENTS,
    }
    .into()
}
