//! # Shift Report Aggregation
//!
//! Folds the ledger entries of one shift into totals:
//!
//! | Field             | Entries summed                           |
//! |-------------------|------------------------------------------|
//! | `total_amount`    | every income                             |
//! | `total_discounts` | expenses with category `discount`        |
//! | `cash_payments`   | income with category `cash_payment`      |
//! | `card_payments`   | income with category `card_payment`      |
//!
//! Entries outside `[start_time, end]` or tagged with another shift are
//! ignored, so the caller may pass a loosely filtered list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{DateRange, LedgerTransaction, Shift, TransactionCategory, TransactionType};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShiftReport {
    pub shift: Shift,
    pub total_amount_cents: i64,
    pub total_discounts_cents: i64,
    pub cash_payments_cents: i64,
    pub card_payments_cents: i64,
    pub transaction_count: usize,
}

impl ShiftReport {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn total_discounts(&self) -> Money {
        Money::from_cents(self.total_discounts_cents)
    }

    #[inline]
    pub fn cash_payments(&self) -> Money {
        Money::from_cents(self.cash_payments_cents)
    }

    #[inline]
    pub fn card_payments(&self) -> Money {
        Money::from_cents(self.card_payments_cents)
    }
}

/// Time window a shift covers. An active shift is open up to `now`.
pub fn shift_window(shift: &Shift, now: DateTime<Utc>) -> DateRange {
    DateRange::between(shift.start_time, shift.end_time.unwrap_or(now))
}

/// Builds the report for `shift` from `transactions`.
pub fn summarize(shift: &Shift, transactions: &[LedgerTransaction], now: DateTime<Utc>) -> ShiftReport {
    let window = shift_window(shift, now);

    let mut total = Money::zero();
    let mut discounts = Money::zero();
    let mut cash = Money::zero();
    let mut card = Money::zero();
    let mut count = 0;

    let in_shift = transactions
        .iter()
        .filter(|tx| tx.shift_id.as_deref() == Some(shift.id.as_str()) && window.contains(tx.date));

    for tx in in_shift {
        count += 1;
        match (tx.transaction_type, tx.category) {
            (TransactionType::Income, category) => {
                total += tx.amount();
                match category {
                    TransactionCategory::CashPayment => cash += tx.amount(),
                    TransactionCategory::CardPayment => card += tx.amount(),
                    _ => {}
                }
            }
            (TransactionType::Expense, TransactionCategory::Discount) => discounts += tx.amount(),
            (TransactionType::Expense, _) => {}
        }
    }

    ShiftReport {
        shift: shift.clone(),
        total_amount_cents: total.cents(),
        total_discounts_cents: discounts.cents(),
        cash_payments_cents: cash.cents(),
        card_payments_cents: card.cents(),
        transaction_count: count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn shift(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Shift {
        Shift {
            id: "shift-1".to_string(),
            user_id: "user-1".to_string(),
            establishment_id: "est".to_string(),
            start_time: start,
            end_time: end,
            initial_cash_cents: 0,
            final_cash_cents: None,
            comment: None,
        }
    }

    fn tx(
        kind: TransactionType,
        category: TransactionCategory,
        cents: i64,
        at: DateTime<Utc>,
        shift_id: &str,
    ) -> LedgerTransaction {
        LedgerTransaction {
            id: format!("{cents}-{category:?}"),
            establishment_id: "est".to_string(),
            account_id: "acc".to_string(),
            transaction_type: kind,
            amount_cents: cents,
            category,
            description: None,
            date: at,
            shift_id: Some(shift_id.to_string()),
            order_id: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_summarize_partitions_by_category() {
        let start = Utc::now() - Duration::hours(8);
        let end = start + Duration::hours(8);
        let during = start + Duration::hours(1);
        let s = shift(start, Some(end));

        let txs = vec![
            tx(TransactionType::Income, TransactionCategory::CashPayment, 8_000, during, "shift-1"),
            tx(TransactionType::Income, TransactionCategory::CardPayment, 3_000, during, "shift-1"),
            tx(TransactionType::Income, TransactionCategory::Incassation, 500, end, "shift-1"),
            tx(TransactionType::Expense, TransactionCategory::Discount, 700, during, "shift-1"),
            tx(TransactionType::Expense, TransactionCategory::Supply, 9_999, during, "shift-1"),
        ];

        let report = summarize(&s, &txs, Utc::now());
        assert_eq!(report.total_amount().cents(), 11_500);
        assert_eq!(report.cash_payments().cents(), 8_000);
        assert_eq!(report.card_payments().cents(), 3_000);
        assert_eq!(report.total_discounts().cents(), 700);
        assert_eq!(report.transaction_count, 5);
    }

    #[test]
    fn test_summarize_ignores_other_shifts_and_outside_window() {
        let start = Utc::now() - Duration::hours(2);
        let end = start + Duration::hours(1);
        let s = shift(start, Some(end));

        let txs = vec![
            tx(TransactionType::Income, TransactionCategory::CashPayment, 100, start, "shift-1"),
            tx(TransactionType::Income, TransactionCategory::CashPayment, 200, start, "shift-2"),
            tx(
                TransactionType::Income,
                TransactionCategory::CashPayment,
                400,
                end + Duration::minutes(1),
                "shift-1",
            ),
        ];

        let report = summarize(&s, &txs, Utc::now());
        assert_eq!(report.total_amount().cents(), 100);
        assert_eq!(report.transaction_count, 1);
    }

    #[test]
    fn test_active_shift_window_ends_now() {
        let start = Utc::now() - Duration::hours(1);
        let now = Utc::now();
        let window = shift_window(&shift(start, None), now);
        assert_eq!(window.to, Some(now));
    }
}
