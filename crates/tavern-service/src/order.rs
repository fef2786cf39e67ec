//! # Order Payment Processor
//!
//! Draft orders collect priced lines; paying or closing an order is a single
//! conditional transition out of `draft`.
//!
//! ## Payment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. load order                               → OrderNotFound           │
//! │   2. settle(order, split)                     → OrderAlreadyFinalized   │
//! │                                                 InsufficientPayment     │
//! │                                                 ClientCashTooLow        │
//! │   3. shift (if given) exists and is open      → ShiftNotFound / Ended   │
//! │   4. resolve cash/card accounts               → AccountNotConfigured    │
//! │   5. UPDATE orders ... WHERE status = 'draft'                           │
//! │   6. one income entry per method used                                   │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any failure drops the transaction: the order stays a draft and no ledger
//! entry remains.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{info, warn};
use uuid::Uuid;

use tavern_core::payment::{ensure_open, line_total, order_total, settle, PaymentSplit};
use tavern_core::shift::ensure_active;
use tavern_core::validation::{validate_note, validate_quantity};
use tavern_core::{
    CoreError, Establishment, ItemRef, LedgerTransaction, Money, Order, OrderItem, OrderStatus,
    PaymentMethod, PaymentStatus, TransactionCategory, TransactionDraft, TransactionType,
};
use tavern_db::{
    CatalogRepository, Database, EstablishmentRepository, OrderRepository, PaidAmounts,
    ShiftRepository,
};

use crate::error::{ServiceError, ServiceResult};
use crate::finance::FinanceService;

/// An order with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Result of a successful payment.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub order: Order,
    /// One income entry per payment method used.
    pub transactions: Vec<LedgerTransaction>,
    pub change: Money,
}

/// Result of closing an order without payment.
#[derive(Debug, Clone, Serialize)]
pub struct OrderClosure {
    pub order: Order,
    /// Zero-amount entry recording the write-off.
    pub write_off: LedgerTransaction,
}

#[derive(Debug, Clone, Copy)]
pub struct OrderService<'a> {
    db: &'a Database,
}

impl<'a> OrderService<'a> {
    pub fn new(db: &'a Database) -> Self {
        OrderService { db }
    }

    pub async fn create_order(
        &self,
        establishment_id: &str,
        table_id: Option<&str>,
    ) -> ServiceResult<Order> {
        let mut conn = self.db.acquire().await?;

        if EstablishmentRepository::new(&mut conn)
            .get_by_id(establishment_id)
            .await?
            .is_none()
        {
            return Err(CoreError::EstablishmentNotFound(establishment_id.to_string()).into());
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            establishment_id: establishment_id.to_string(),
            table_id: table_id.map(str::to_string),
            status: OrderStatus::Draft,
            payment_status: PaymentStatus::Unpaid,
            total_amount_cents: 0,
            cash_amount_cents: 0,
            card_amount_cents: 0,
            change_amount_cents: 0,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
        };

        OrderRepository::new(&mut conn).insert(&order).await?;

        info!(order_id = %order.id, table_id = ?order.table_id, "Order created");
        Ok(order)
    }

    /// Adds a line priced from the catalog.
    pub async fn add_order_item(
        &self,
        order_id: &str,
        item: ItemRef,
        quantity: i64,
    ) -> ServiceResult<OrderDetails> {
        validate_quantity(quantity)?;

        let mut tx = self.db.begin().await?;
        let mut order = load_open_order(&mut tx, order_id).await?;

        let unit_price = resolve_price(&mut tx, &order.establishment_id, &item).await?;
        let (product_id, tech_card_id) = match item {
            ItemRef::Product(id) => (Some(id), None),
            ItemRef::TechCard(id) => (None, Some(id)),
        };

        let line = OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            product_id,
            tech_card_id,
            quantity,
            unit_price_cents: unit_price.cents(),
            line_total_cents: line_total(unit_price, quantity)?.cents(),
            created_at: Utc::now(),
        };
        OrderRepository::new(&mut tx).insert_item(&line).await?;

        let items = recompute_total(&mut tx, &mut order).await?;
        tx.commit().await?;

        info!(order_id = %order.id, item_id = %line.id, quantity, total = %order.total_amount(), "Order item added");
        Ok(OrderDetails { order, items })
    }

    /// Changes a line's quantity and reprices it from the catalog.
    pub async fn update_order_item_quantity(
        &self,
        order_id: &str,
        item_id: &str,
        quantity: i64,
    ) -> ServiceResult<OrderDetails> {
        validate_quantity(quantity)?;

        let mut tx = self.db.begin().await?;
        let mut order = load_open_order(&mut tx, order_id).await?;

        let mut line = OrderRepository::new(&mut tx)
            .get_item(order_id, item_id)
            .await?
            .ok_or_else(|| CoreError::OrderItemNotFound(item_id.to_string()))?;

        if let Some(item) = line.item_ref() {
            let unit_price = resolve_price(&mut tx, &order.establishment_id, &item).await?;
            line.unit_price_cents = unit_price.cents();
        }
        line.quantity = quantity;
        line.line_total_cents = line_total(line.unit_price(), quantity)?.cents();

        OrderRepository::new(&mut tx).update_item(&line).await?;

        let items = recompute_total(&mut tx, &mut order).await?;
        tx.commit().await?;

        info!(order_id = %order.id, item_id = %item_id, quantity, total = %order.total_amount(), "Order item updated");
        Ok(OrderDetails { order, items })
    }

    pub async fn remove_order_item(&self, order_id: &str, item_id: &str) -> ServiceResult<OrderDetails> {
        let mut tx = self.db.begin().await?;
        let mut order = load_open_order(&mut tx, order_id).await?;

        let removed = OrderRepository::new(&mut tx)
            .delete_item(order_id, item_id)
            .await?;
        if !removed {
            return Err(CoreError::OrderItemNotFound(item_id.to_string()).into());
        }

        let items = recompute_total(&mut tx, &mut order).await?;
        tx.commit().await?;

        info!(order_id = %order.id, item_id = %item_id, total = %order.total_amount(), "Order item removed");
        Ok(OrderDetails { order, items })
    }

    /// Settles a draft order with a cash/card split.
    ///
    /// Income entries are tagged with the order and, when given, the shift.
    pub async fn process_order_payment(
        &self,
        order_id: &str,
        split: PaymentSplit,
        shift_id: Option<&str>,
    ) -> ServiceResult<PaymentReceipt> {
        let mut tx = self.db.begin().await?;

        let order = OrderRepository::new(&mut tx)
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        let settlement = match settle(&order, &split) {
            Ok(settlement) => settlement,
            Err(err) => {
                warn!(order_id = %order_id, error = %err, "Payment rejected");
                return Err(err.into());
            }
        };

        if let Some(shift_id) = shift_id {
            let shift = ShiftRepository::new(&mut tx)
                .get_by_id(shift_id)
                .await?
                .filter(|s| s.establishment_id == order.establishment_id)
                .ok_or_else(|| CoreError::ShiftNotFound(shift_id.to_string()))?;
            ensure_active(&shift)?;
        }

        let establishment = load_establishment(&mut tx, &order.establishment_id).await?;
        let mut postings = Vec::new();
        for (method, amount) in settlement.ledger_lines() {
            let account_id = establishment
                .account_for(method)
                .ok_or_else(|| CoreError::AccountNotConfigured {
                    establishment_id: establishment.id.clone(),
                    purpose: method_name(method).to_string(),
                })?;
            postings.push((method, amount, account_id.to_string()));
        }

        let paid_at = Utc::now();
        let amounts = PaidAmounts {
            cash_cents: settlement.cash.cents(),
            card_cents: settlement.card.cents(),
            change_cents: settlement.change.cents(),
        };
        let order = match OrderRepository::new(&mut tx)
            .mark_paid(order_id, amounts, paid_at)
            .await?
        {
            Some(order) => order,
            None => return Err(finalized_concurrently(&mut tx, order_id).await),
        };

        let mut transactions = Vec::with_capacity(postings.len());
        for (method, amount, account_id) in postings {
            let draft = TransactionDraft::new(
                account_id,
                TransactionType::Income,
                amount,
                TransactionCategory::for_payment(method),
            )
            .with_description(format!("Order payment ({})", method_name(method)))
            .with_order(order.id.clone())
            .with_shift(shift_id.map(str::to_string))
            .with_date(paid_at);

            transactions.push(FinanceService::create_in(&mut tx, &order.establishment_id, draft).await?);
        }

        tx.commit().await?;

        info!(
            order_id = %order.id,
            total = %order.total_amount(),
            cash = %settlement.cash,
            card = %settlement.card,
            change = %settlement.change,
            "Order paid"
        );

        Ok(PaymentReceipt {
            order,
            transactions,
            change: settlement.change,
        })
    }

    /// Cancels a draft order and records a zero-amount write-off entry on
    /// the cash account.
    pub async fn close_order_without_payment(
        &self,
        order_id: &str,
        reason: Option<&str>,
    ) -> ServiceResult<OrderClosure> {
        if let Some(reason) = reason {
            validate_note("reason", reason)?;
        }

        let mut tx = self.db.begin().await?;
        let order = load_open_order(&mut tx, order_id).await?;

        let establishment = load_establishment(&mut tx, &order.establishment_id).await?;
        let cash_account_id = establishment
            .account_for(PaymentMethod::Cash)
            .ok_or_else(|| CoreError::AccountNotConfigured {
                establishment_id: establishment.id.clone(),
                purpose: "cash".to_string(),
            })?
            .to_string();

        let closed_at = Utc::now();
        let order = match OrderRepository::new(&mut tx)
            .mark_cancelled(order_id, reason, closed_at)
            .await?
        {
            Some(order) => order,
            None => return Err(finalized_concurrently(&mut tx, order_id).await),
        };

        let mut draft = TransactionDraft::new(
            cash_account_id,
            TransactionType::Expense,
            Money::zero(),
            TransactionCategory::OrderWriteOff,
        )
        .with_order(order.id.clone())
        .with_date(closed_at);
        if let Some(reason) = reason {
            draft = draft.with_description(reason);
        }

        let write_off = FinanceService::create_in(&mut tx, &order.establishment_id, draft).await?;
        tx.commit().await?;

        info!(order_id = %order.id, reason = ?reason, "Order closed without payment");
        Ok(OrderClosure { order, write_off })
    }

    pub async fn get_order(&self, order_id: &str) -> ServiceResult<OrderDetails> {
        let mut conn = self.db.acquire().await?;

        let order = OrderRepository::new(&mut conn)
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        let items = OrderRepository::new(&mut conn).items(order_id).await?;

        Ok(OrderDetails { order, items })
    }

    /// Draft orders of an establishment.
    pub async fn list_active_orders(&self, establishment_id: &str) -> ServiceResult<Vec<Order>> {
        let mut conn = self.db.acquire().await?;
        Ok(OrderRepository::new(&mut conn)
            .list_active(establishment_id)
            .await?)
    }
}

fn method_name(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "cash",
        PaymentMethod::Card => "card",
    }
}

/// The conditional transition matched no draft row; reports the status the
/// row holds now.
async fn finalized_concurrently(conn: &mut SqliteConnection, order_id: &str) -> ServiceError {
    let current = match OrderRepository::new(conn).get_by_id(order_id).await {
        Ok(current) => current,
        Err(err) => return err.into(),
    };

    match current {
        Some(order) => CoreError::OrderAlreadyFinalized {
            order_id: order.id,
            status: order.status.as_str().to_string(),
        }
        .into(),
        None => CoreError::OrderNotFound(order_id.to_string()).into(),
    }
}

async fn load_open_order(conn: &mut SqliteConnection, order_id: &str) -> ServiceResult<Order> {
    let order = OrderRepository::new(conn)
        .get_by_id(order_id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
    ensure_open(&order)?;
    Ok(order)
}

async fn load_establishment(conn: &mut SqliteConnection, id: &str) -> ServiceResult<Establishment> {
    let establishment = EstablishmentRepository::new(conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::EstablishmentNotFound(id.to_string()))?;
    Ok(establishment)
}

async fn resolve_price(
    conn: &mut SqliteConnection,
    establishment_id: &str,
    item: &ItemRef,
) -> ServiceResult<Money> {
    let mut catalog = CatalogRepository::new(conn);

    let price = match item {
        ItemRef::Product(id) => catalog
            .get_product(id, establishment_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.clone()))?
            .price(),
        ItemRef::TechCard(id) => catalog
            .get_tech_card(id, establishment_id)
            .await?
            .ok_or_else(|| CoreError::TechCardNotFound(id.clone()))?
            .price(),
    };

    Ok(price)
}

/// Sets the order total to the sum of its lines and returns the lines.
async fn recompute_total(conn: &mut SqliteConnection, order: &mut Order) -> ServiceResult<Vec<OrderItem>> {
    let items = OrderRepository::new(conn).items(&order.id).await?;
    let total = order_total(&items)?;

    let updated = OrderRepository::new(conn)
        .update_total(&order.id, total.cents())
        .await?;
    if !updated {
        return Err(finalized_concurrently(conn, &order.id).await);
    }

    order.total_amount_cents = total.cents();
    Ok(items)
}
