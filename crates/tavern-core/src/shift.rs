//! # Shift Lifecycle Rules
//!
//! ```text
//! no shift ──start──► active ──end──► ended (terminal)
//! ```
//!
//! Closing a shift compares the declared cash with the opening float. Any
//! difference becomes one incassation entry on the cash account:
//!
//! ```text
//! effect = final_cash - initial_cash
//!   500 → 700   income  200   (surplus)
//!   500 → 450   expense  50   (shortfall)
//!   500 → 500   nothing
//! ```

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::ledger::entry_for_effect;
use crate::money::Money;
use crate::types::{Shift, TransactionType};

/// Reconciling ledger entry produced at shift close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Incassation {
    pub transaction_type: TransactionType,
    /// |final - initial|
    pub amount: Money,
    /// final - initial
    pub effect: Money,
}

/// Incassation needed to close a shift, `None` when the cash matches.
pub fn reconcile(initial_cash: Money, final_cash: Money) -> Option<Incassation> {
    let effect = final_cash - initial_cash;
    if effect.is_zero() {
        return None;
    }

    let (transaction_type, amount) = entry_for_effect(effect);
    Some(Incassation {
        transaction_type,
        amount,
        effect,
    })
}

/// Fails with `ShiftAlreadyActive` if the user still has an open shift.
pub fn ensure_can_start(user_id: &str, active: Option<&Shift>) -> CoreResult<()> {
    match active {
        Some(shift) => Err(CoreError::ShiftAlreadyActive {
            user_id: user_id.to_string(),
            shift_id: shift.id.clone(),
        }),
        None => Ok(()),
    }
}

/// Fails with `ShiftAlreadyEnded` once `end_time` is set.
pub fn ensure_active(shift: &Shift) -> CoreResult<()> {
    if !shift.is_active() {
        return Err(CoreError::ShiftAlreadyEnded(shift.id.clone()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn shift(ended: bool) -> Shift {
        Shift {
            id: "shift-1".to_string(),
            user_id: "user-1".to_string(),
            establishment_id: "est".to_string(),
            start_time: Utc::now(),
            end_time: ended.then(Utc::now),
            initial_cash_cents: 50_000,
            final_cash_cents: None,
            comment: None,
        }
    }

    #[test]
    fn test_surplus_is_income() {
        let inc = reconcile(Money::from_cents(50_000), Money::from_cents(70_000)).unwrap();
        assert_eq!(inc.transaction_type, TransactionType::Income);
        assert_eq!(inc.amount.cents(), 20_000);
        assert_eq!(inc.effect.cents(), 20_000);
    }

    #[test]
    fn test_shortfall_is_expense() {
        let inc = reconcile(Money::from_cents(50_000), Money::from_cents(45_000)).unwrap();
        assert_eq!(inc.transaction_type, TransactionType::Expense);
        assert_eq!(inc.amount.cents(), 5_000);
        assert_eq!(inc.effect.cents(), -5_000);
    }

    #[test]
    fn test_matching_cash_needs_nothing() {
        assert!(reconcile(Money::from_cents(50_000), Money::from_cents(50_000)).is_none());
    }

    #[test]
    fn test_state_checks() {
        let open = shift(false);
        assert!(ensure_can_start("user-1", None).is_ok());
        assert!(matches!(
            ensure_can_start("user-1", Some(&open)),
            Err(CoreError::ShiftAlreadyActive { .. })
        ));

        assert!(ensure_active(&open).is_ok());
        assert!(matches!(
            ensure_active(&shift(true)),
            Err(CoreError::ShiftAlreadyEnded(_))
        ));
    }
}
