//! # Stock Math
//!
//! Supplies add quantity and blend the unit price; write-offs remove
//! quantity and never go below zero.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::StockItem;

/// Quantity-weighted average of the stock price and the supplied price.
///
/// ```rust
/// use tavern_core::inventory::weighted_price;
/// use tavern_core::money::Money;
///
/// // 10 kg at 2.00 + 10 kg at 3.00 → 2.50
/// let price = weighted_price(10.0, Money::from_cents(200), 10.0, Money::from_cents(300));
/// assert_eq!(price.cents(), 250);
/// ```
pub fn weighted_price(
    on_hand: f64,
    current_price: Money,
    supplied: f64,
    supplied_price: Money,
) -> Money {
    let on_hand = on_hand.max(0.0);
    let total_qty = on_hand + supplied;
    if total_qty <= 0.0 {
        return supplied_price;
    }

    let value = current_price.cents() as f64 * on_hand + supplied_price.cents() as f64 * supplied;
    Money::from_cents((value / total_qty).round() as i64)
}

/// Fails with `InsufficientStock` when `requested` exceeds `available`.
pub fn ensure_available(item: &StockItem, available: f64, requested: f64) -> CoreResult<()> {
    if requested > available {
        return Err(CoreError::InsufficientStock {
            item: item.id().to_string(),
            available,
            requested,
        });
    }

    Ok(())
}
