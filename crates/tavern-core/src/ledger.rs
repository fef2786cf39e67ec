//! # Ledger Arithmetic
//!
//! How ledger entries move account balances.
//!
//! ## Balance Invariant
//! ```text
//! current_balance = initial_balance + Σ signed_effect(tx)   for every tx on the account
//!
//! signed_effect(income,  a) = +a
//! signed_effect(expense, a) = -a
//! ```
//!
//! ## Editing An Entry
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  old: income 100 on A          new: income 120 on B                     │
//! │                                                                         │
//! │  step 1  revert old on old account   A += -100                          │
//! │  step 2  apply new on new account    B += +120                          │
//! │                                                                         │
//! │  Always revert first, then apply, even when A == B.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The storage layer applies each [`BalanceAdjustment`] as a relative update
//! (`balance = balance + delta`); nothing here reads a balance and writes it
//! back.

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{LedgerTransaction, TransactionDraft, TransactionType};

/// Effect of an entry of `transaction_type` and magnitude `amount` on its
/// account.
#[inline]
pub fn signed_effect(transaction_type: TransactionType, amount: Money) -> Money {
    match transaction_type {
        TransactionType::Income => amount,
        TransactionType::Expense => -amount,
    }
}

/// Entry type and magnitude producing a given signed effect.
///
/// ```rust
/// use tavern_core::ledger::entry_for_effect;
/// use tavern_core::money::Money;
/// use tavern_core::TransactionType;
///
/// let (kind, amount) = entry_for_effect(Money::from_cents(-3_000));
/// assert_eq!(kind, TransactionType::Expense);
/// assert_eq!(amount.cents(), 3_000);
/// ```
pub fn entry_for_effect(effect: Money) -> (TransactionType, Money) {
    if effect.is_negative() {
        (TransactionType::Expense, effect.abs())
    } else {
        (TransactionType::Income, effect)
    }
}

/// A relative change to apply to one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceAdjustment {
    pub account_id: String,
    pub delta: Money,
}

/// Balance adjustments for replacing `old` with `new`, in application order:
/// revert the old effect on the old account, then apply the new effect on
/// the new account.
pub fn plan_update(old: &LedgerTransaction, new: &TransactionDraft) -> [BalanceAdjustment; 2] {
    [
        BalanceAdjustment {
            account_id: old.account_id.clone(),
            delta: -old.signed_effect(),
        },
        BalanceAdjustment {
            account_id: new.account_id.clone(),
            delta: signed_effect(new.transaction_type, new.amount()),
        },
    ]
}

/// Adjustment undoing a deleted entry.
pub fn plan_delete(old: &LedgerTransaction) -> BalanceAdjustment {
    BalanceAdjustment {
        account_id: old.account_id.clone(),
        delta: -old.signed_effect(),
    }
}

/// Recomputes a balance from an account's opening balance and its history.
pub fn replay_balance<'a, I>(initial: Money, history: I) -> Money
where
    I: IntoIterator<Item = &'a LedgerTransaction>,
{
    initial + history.into_iter().map(LedgerTransaction::signed_effect).sum::<Money>()
}

/// Fails with `InsufficientBalance` when `balance` cannot cover `amount`.
pub fn ensure_covers(account_id: &str, balance: Money, amount: Money) -> CoreResult<()> {
    if balance < amount {
        return Err(CoreError::InsufficientBalance {
            account_id: account_id.to_string(),
            available: balance,
            requested: amount,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionCategory;
    use chrono::Utc;

    fn entry(account: &str, kind: TransactionType, cents: i64) -> LedgerTransaction {
        let now = Utc::now();
        LedgerTransaction {
            id: format!("tx-{account}-{cents}"),
            establishment_id: "est".to_string(),
            account_id: account.to_string(),
            transaction_type: kind,
            amount_cents: cents,
            category: TransactionCategory::Other,
            description: None,
            date: now,
            shift_id: None,
            order_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_signed_effect() {
        let amount = Money::from_cents(10_000);
        assert_eq!(signed_effect(TransactionType::Income, amount).cents(), 10_000);
        assert_eq!(signed_effect(TransactionType::Expense, amount).cents(), -10_000);
    }

    #[test]
    fn test_entry_for_effect_zero_is_income() {
        let (kind, amount) = entry_for_effect(Money::zero());
        assert_eq!(kind, TransactionType::Income);
        assert!(amount.is_zero());
    }

    #[test]
    fn test_plan_update_moves_between_accounts() {
        // A holds 500 including a 100 income; move it to B as 120.
        let old = entry("A", TransactionType::Income, 10_000);
        let new = TransactionDraft::new(
            "B",
            TransactionType::Income,
            Money::from_cents(12_000),
            TransactionCategory::Other,
        );

        let [revert, apply] = plan_update(&old, &new);
        assert_eq!(revert.account_id, "A");
        assert_eq!(revert.delta.cents(), -10_000);
        assert_eq!(apply.account_id, "B");
        assert_eq!(apply.delta.cents(), 12_000);

        let a = Money::from_cents(50_000) + revert.delta;
        let b = Money::from_cents(20_000) + apply.delta;
        assert_eq!(a.cents(), 40_000);
        assert_eq!(b.cents(), 32_000);
    }

    #[test]
    fn test_plan_update_type_flip_same_account() {
        let old = entry("A", TransactionType::Income, 5_000);
        let new = TransactionDraft::new(
            "A",
            TransactionType::Expense,
            Money::from_cents(5_000),
            TransactionCategory::Other,
        );

        let net: Money = plan_update(&old, &new).iter().map(|a| a.delta).sum();
        assert_eq!(net.cents(), -10_000);
    }

    #[test]
    fn test_plan_delete_reverts() {
        let old = entry("A", TransactionType::Expense, 2_500);
        assert_eq!(plan_delete(&old).delta.cents(), 2_500);
    }

    #[test]
    fn test_replay_balance() {
        let history = vec![
            entry("A", TransactionType::Income, 10_000),
            entry("A", TransactionType::Expense, 3_000),
            entry("A", TransactionType::Income, 500),
        ];
        assert_eq!(replay_balance(Money::from_cents(1_000), &history).cents(), 8_500);
        assert_eq!(replay_balance(Money::from_cents(1_000), &Vec::<LedgerTransaction>::new()).cents(), 1_000);
    }

    #[test]
    fn test_ensure_covers() {
        assert!(ensure_covers("A", Money::from_cents(100), Money::from_cents(100)).is_ok());
        let err = ensure_covers("A", Money::from_cents(99), Money::from_cents(100)).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientBalance { .. }));
    }
}
