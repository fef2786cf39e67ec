//! Shift report generation. Read-only.

use chrono::Utc;
use tracing::debug;

use tavern_core::report::{shift_window, summarize};
use tavern_core::{CoreError, ShiftFilter, ShiftReport, TransactionFilter};
use tavern_db::{Database, ShiftRepository, TransactionRepository};

use crate::error::ServiceResult;

#[derive(Debug, Clone, Copy)]
pub struct ShiftReportService<'a> {
    db: &'a Database,
}

impl<'a> ShiftReportService<'a> {
    pub fn new(db: &'a Database) -> Self {
        ShiftReportService { db }
    }

    /// Totals for the most recent shift matching `filter`.
    ///
    /// An open shift is reported up to now.
    pub async fn generate_shift_report(
        &self,
        establishment_id: &str,
        filter: &ShiftFilter,
    ) -> ServiceResult<ShiftReport> {
        let mut conn = self.db.acquire().await?;

        let shift = ShiftRepository::new(&mut conn)
            .list(establishment_id, filter)
            .await?
            .into_iter()
            .next()
            .ok_or(CoreError::NoShiftsFound)?;

        let now = Utc::now();
        let entries = TransactionRepository::new(&mut conn)
            .list(
                establishment_id,
                &TransactionFilter {
                    shift_id: Some(shift.id.clone()),
                    date: shift_window(&shift, now),
                    ..Default::default()
                },
            )
            .await?;

        debug!(shift_id = %shift.id, entries = entries.len(), "Building shift report");
        Ok(summarize(&shift, &entries, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{onboard, tavern};
    use tavern_core::{ItemRef, Money, PaymentSplit, TransactionCategory, TransactionDraft, TransactionType};

    #[tokio::test]
    async fn test_no_shifts() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;

        let err = tavern
            .reports()
            .generate_shift_report(&setup.establishment.id, &ShiftFilter::default())
            .await
            .unwrap_err();

        assert!(matches!(err.as_core(), Some(CoreError::NoShiftsFound)));
    }

    #[tokio::test]
    async fn test_report_totals() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;

        let shift = tavern.shifts().start_shift("kim", est, Money::zero()).await.unwrap();
        let beer = tavern.catalog().create_product(est, "Beer", Money::from_cents(600)).await.unwrap();

        for split in [
            PaymentSplit::new(Money::from_cents(1_200), Money::zero(), Money::from_cents(2_000)),
            PaymentSplit::new(Money::zero(), Money::from_cents(1_200), Money::zero()),
        ] {
            let order = tavern.orders().create_order(est, None).await.unwrap();
            tavern
                .orders()
                .add_order_item(&order.id, ItemRef::Product(beer.id.clone()), 2)
                .await
                .unwrap();
            tavern
                .orders()
                .process_order_payment(&order.id, split, Some(&shift.id))
                .await
                .unwrap();
        }

        let discount = TransactionDraft::new(
            setup.cash_account.id.clone(),
            TransactionType::Expense,
            Money::from_cents(150),
            TransactionCategory::Discount,
        )
        .with_shift(Some(shift.id.clone()));
        tavern.finance().create_transaction(est, discount).await.unwrap();

        // Not tagged with the shift.
        let untagged = TransactionDraft::new(
            setup.cash_account.id.clone(),
            TransactionType::Income,
            Money::from_cents(9_999),
            TransactionCategory::Other,
        );
        tavern.finance().create_transaction(est, untagged).await.unwrap();

        let report = tavern
            .reports()
            .generate_shift_report(est, &ShiftFilter::default())
            .await
            .unwrap();

        assert_eq!(report.shift.id, shift.id);
        assert_eq!(report.total_amount_cents, 2_400);
        assert_eq!(report.cash_payments_cents, 1_200);
        assert_eq!(report.card_payments_cents, 1_200);
        assert_eq!(report.total_discounts_cents, 150);
        assert_eq!(report.transaction_count, 3);
    }
}
