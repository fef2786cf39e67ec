//! # Stock Movements
//!
//! ```text
//! supply     stock.quantity += q      price = weighted average
//!            optional expense on the paying account
//! write-off  stock.quantity -= q      only if q ≤ quantity
//! ```
//!
//! Both movements leave a journal row (supplies / write_offs) written in the
//! same database transaction as the stock change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::{info, warn};
use uuid::Uuid;

use tavern_core::inventory::{ensure_available, weighted_price};
use tavern_core::validation::{validate_amount_cents, validate_measure, validate_note};
use tavern_core::{
    CoreError, LedgerTransaction, Money, Stock, StockItem, Supply, TransactionCategory,
    TransactionDraft, TransactionType, Warehouse, WriteOff,
};
use tavern_db::{CatalogRepository, Database, StockRepository};

use crate::error::ServiceResult;
use crate::finance::FinanceService;

/// Goods received into a warehouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSupply {
    pub warehouse_id: String,
    pub item: StockItem,
    pub quantity: f64,
    pub price_per_unit_cents: i64,
    /// Account paying for the supply; no ledger entry when absent.
    pub account_id: Option<String>,
    pub supplied_at: Option<DateTime<Utc>>,
}

/// Goods removed from a warehouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWriteOff {
    pub warehouse_id: String,
    pub item: StockItem,
    pub quantity: f64,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplyRecord {
    pub stock: Stock,
    pub supply: Supply,
    pub transaction: Option<LedgerTransaction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteOffRecord {
    pub stock: Stock,
    pub write_off: WriteOff,
}

#[derive(Debug, Clone, Copy)]
pub struct StockService<'a> {
    db: &'a Database,
}

impl<'a> StockService<'a> {
    pub fn new(db: &'a Database) -> Self {
        StockService { db }
    }

    pub async fn get_stock_by_ingredient_and_warehouse(
        &self,
        establishment_id: &str,
        ingredient_id: &str,
        warehouse_id: &str,
    ) -> ServiceResult<Stock> {
        let mut conn = self.db.acquire().await?;
        let stock = StockRepository::new(&mut conn)
            .get_by_ingredient_and_warehouse(ingredient_id, warehouse_id)
            .await?;

        scoped(stock, establishment_id, ingredient_id, warehouse_id)
    }

    pub async fn get_stock_by_product_and_warehouse(
        &self,
        establishment_id: &str,
        product_id: &str,
        warehouse_id: &str,
    ) -> ServiceResult<Stock> {
        let mut conn = self.db.acquire().await?;
        let stock = StockRepository::new(&mut conn)
            .get_by_product_and_warehouse(product_id, warehouse_id)
            .await?;

        scoped(stock, establishment_id, product_id, warehouse_id)
    }

    pub async fn list_stock(&self, establishment_id: &str, warehouse_id: &str) -> ServiceResult<Vec<Stock>> {
        let mut conn = self.db.acquire().await?;
        load_warehouse(&mut conn, establishment_id, warehouse_id).await?;
        Ok(StockRepository::new(&mut conn).list(warehouse_id).await?)
    }

    pub async fn list_supplies(&self, establishment_id: &str, warehouse_id: &str) -> ServiceResult<Vec<Supply>> {
        let mut conn = self.db.acquire().await?;
        load_warehouse(&mut conn, establishment_id, warehouse_id).await?;
        Ok(StockRepository::new(&mut conn).list_supplies(warehouse_id).await?)
    }

    pub async fn list_write_offs(
        &self,
        establishment_id: &str,
        warehouse_id: &str,
    ) -> ServiceResult<Vec<WriteOff>> {
        let mut conn = self.db.acquire().await?;
        load_warehouse(&mut conn, establishment_id, warehouse_id).await?;
        Ok(StockRepository::new(&mut conn).list_write_offs(warehouse_id).await?)
    }

    /// Receives goods: creates or tops up the stock row, blends the unit
    /// price and, when an account is given, posts a `supply` expense for the
    /// total cost.
    pub async fn record_supply(&self, establishment_id: &str, input: NewSupply) -> ServiceResult<SupplyRecord> {
        validate_measure(input.quantity)?;
        validate_amount_cents("price_per_unit", input.price_per_unit_cents)?;

        let mut tx = self.db.begin().await?;
        load_warehouse(&mut tx, establishment_id, &input.warehouse_id).await?;
        ensure_item(&mut tx, establishment_id, &input.item).await?;

        let now = Utc::now();
        let supplied_at = input.supplied_at.unwrap_or(now);
        let unit_price = Money::from_cents(input.price_per_unit_cents);
        let total_cost = unit_price.multiply_measure(input.quantity);

        let transaction = match &input.account_id {
            Some(account_id) => {
                let draft = TransactionDraft::new(
                    account_id.clone(),
                    TransactionType::Expense,
                    total_cost,
                    TransactionCategory::Supply,
                )
                .with_description(format!("Supply of {} x {}", input.quantity, input.item.id()))
                .with_date(supplied_at);

                Some(FinanceService::create_in(&mut tx, establishment_id, draft).await?)
            }
            None => None,
        };

        let existing = StockRepository::new(&mut tx)
            .get(&input.warehouse_id, &input.item)
            .await?;

        let stock = match existing {
            Some(stock) => {
                let price = weighted_price(stock.quantity, stock.price_per_unit(), input.quantity, unit_price);
                StockRepository::new(&mut tx)
                    .add_quantity(&stock.id, input.quantity, price.cents(), now)
                    .await?
            }
            None => {
                let (ingredient_id, product_id) = input.item.columns();
                let stock = Stock {
                    id: Uuid::new_v4().to_string(),
                    establishment_id: establishment_id.to_string(),
                    warehouse_id: input.warehouse_id.clone(),
                    ingredient_id: ingredient_id.map(str::to_string),
                    product_id: product_id.map(str::to_string),
                    quantity: input.quantity,
                    price_per_unit_cents: unit_price.cents(),
                    updated_at: now,
                };
                StockRepository::new(&mut tx).insert(&stock).await?;
                stock
            }
        };

        let supply = Supply {
            id: Uuid::new_v4().to_string(),
            establishment_id: establishment_id.to_string(),
            warehouse_id: input.warehouse_id,
            ingredient_id: stock.ingredient_id.clone(),
            product_id: stock.product_id.clone(),
            quantity: input.quantity,
            price_per_unit_cents: unit_price.cents(),
            total_cost_cents: total_cost.cents(),
            account_id: input.account_id,
            transaction_id: transaction.as_ref().map(|t| t.id.clone()),
            supplied_at,
        };
        StockRepository::new(&mut tx).insert_supply(&supply).await?;

        tx.commit().await?;

        info!(
            stock_id = %stock.id,
            quantity = input.quantity,
            on_hand = stock.quantity,
            price_per_unit = %stock.price_per_unit(),
            "Supply recorded"
        );

        Ok(SupplyRecord {
            stock,
            supply,
            transaction,
        })
    }

    /// Removes goods. Never takes stock below zero.
    pub async fn record_write_off(
        &self,
        establishment_id: &str,
        input: NewWriteOff,
    ) -> ServiceResult<WriteOffRecord> {
        validate_measure(input.quantity)?;
        if let Some(reason) = &input.reason {
            validate_note("reason", reason)?;
        }

        let mut tx = self.db.begin().await?;

        let stock = StockRepository::new(&mut tx)
            .get(&input.warehouse_id, &input.item)
            .await?;
        let stock = scoped(stock, establishment_id, input.item.id(), &input.warehouse_id)?;

        if let Err(err) = ensure_available(&input.item, stock.quantity, input.quantity) {
            warn!(stock_id = %stock.id, on_hand = stock.quantity, requested = input.quantity, "Write-off rejected");
            return Err(err.into());
        }

        let now = Utc::now();
        let stock = StockRepository::new(&mut tx)
            .decrement(&stock.id, input.quantity, now)
            .await?
            .ok_or_else(|| CoreError::InsufficientStock {
                item: input.item.id().to_string(),
                available: stock.quantity,
                requested: input.quantity,
            })?;

        let write_off = WriteOff {
            id: Uuid::new_v4().to_string(),
            establishment_id: establishment_id.to_string(),
            warehouse_id: input.warehouse_id,
            ingredient_id: stock.ingredient_id.clone(),
            product_id: stock.product_id.clone(),
            quantity: input.quantity,
            reason: input.reason,
            written_off_at: now,
        };
        StockRepository::new(&mut tx).insert_write_off(&write_off).await?;

        tx.commit().await?;

        info!(stock_id = %stock.id, quantity = write_off.quantity, on_hand = stock.quantity, "Write-off recorded");
        Ok(WriteOffRecord { stock, write_off })
    }
}

/// Stock rows of another establishment are reported as missing.
fn scoped(
    stock: Option<Stock>,
    establishment_id: &str,
    item_id: &str,
    warehouse_id: &str,
) -> ServiceResult<Stock> {
    stock
        .filter(|s| s.establishment_id == establishment_id)
        .ok_or_else(|| {
            CoreError::StockNotFound {
                item: item_id.to_string(),
                warehouse_id: warehouse_id.to_string(),
            }
            .into()
        })
}

async fn load_warehouse(
    conn: &mut SqliteConnection,
    establishment_id: &str,
    warehouse_id: &str,
) -> ServiceResult<Warehouse> {
    let warehouse = CatalogRepository::new(conn)
        .get_warehouse(warehouse_id, establishment_id)
        .await?
        .ok_or_else(|| CoreError::WarehouseNotFound(warehouse_id.to_string()))?;
    Ok(warehouse)
}

async fn ensure_item(conn: &mut SqliteConnection, establishment_id: &str, item: &StockItem) -> ServiceResult<()> {
    let mut catalog = CatalogRepository::new(conn);

    match item {
        StockItem::Ingredient(id) => {
            if catalog.get_ingredient(id, establishment_id).await?.is_none() {
                return Err(CoreError::IngredientNotFound(id.clone()).into());
            }
        }
        StockItem::Product(id) => {
            if catalog.get_product(id, establishment_id).await?.is_none() {
                return Err(CoreError::ProductNotFound(id.clone()).into());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fund, onboard, tavern};
    use tavern_core::ErrorKind;

    fn supply(warehouse_id: &str, item: StockItem, quantity: f64, price_cents: i64) -> NewSupply {
        NewSupply {
            warehouse_id: warehouse_id.to_string(),
            item,
            quantity,
            price_per_unit_cents: price_cents,
            account_id: None,
            supplied_at: None,
        }
    }

    #[tokio::test]
    async fn test_supply_blends_price() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;
        let wh = &setup.warehouse.id;

        let flour = tavern.catalog().create_ingredient(est, "Flour", "kg").await.unwrap();
        let item = StockItem::Ingredient(flour.id.clone());

        tavern.stock().record_supply(est, supply(wh, item.clone(), 10.0, 200)).await.unwrap();
        let record = tavern.stock().record_supply(est, supply(wh, item, 30.0, 400)).await.unwrap();

        assert_eq!(record.stock.quantity, 40.0);
        assert_eq!(record.stock.price_per_unit_cents, 350);
        assert!(record.transaction.is_none());

        let stock = tavern
            .stock()
            .get_stock_by_ingredient_and_warehouse(est, &flour.id, wh)
            .await
            .unwrap();
        assert_eq!(stock.id, record.stock.id);
        assert_eq!(tavern.stock().list_supplies(est, wh).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_paid_supply_posts_expense() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;
        let wh = &setup.warehouse.id;
        let bank = &setup.bank_account.id;

        fund(&tavern, est, bank, 10_000).await;
        let cola = tavern.catalog().create_product(est, "Cola", Money::from_cents(300)).await.unwrap();

        let mut input = supply(wh, StockItem::Product(cola.id.clone()), 24.0, 120);
        input.account_id = Some(bank.clone());
        let record = tavern.stock().record_supply(est, input).await.unwrap();

        let entry = record.transaction.unwrap();
        assert_eq!(entry.amount_cents, 2_880);
        assert_eq!(entry.category, TransactionCategory::Supply);
        assert_eq!(record.supply.transaction_id.as_deref(), Some(entry.id.as_str()));

        let account = tavern.accounts().get_account(est, bank).await.unwrap();
        assert_eq!(account.current_balance_cents, 7_120);

        let stock = tavern
            .stock()
            .get_stock_by_product_and_warehouse(est, &cola.id, wh)
            .await
            .unwrap();
        assert_eq!(stock.quantity, 24.0);
    }

    #[tokio::test]
    async fn test_unpayable_supply_leaves_no_stock() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;
        let wh = &setup.warehouse.id;

        let milk = tavern.catalog().create_ingredient(est, "Milk", "l").await.unwrap();
        let mut input = supply(wh, StockItem::Ingredient(milk.id.clone()), 5.0, 100);
        input.account_id = Some(setup.safe.id.clone());

        let err = tavern.stock().record_supply(est, input).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::InsufficientBalance { .. })));

        assert!(tavern.stock().list_stock(est, wh).await.unwrap().is_empty());
        assert!(tavern.stock().list_supplies(est, wh).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_supply_checks_references() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;

        let err = tavern
            .stock()
            .record_supply(est, supply("nowhere", StockItem::Ingredient("x".to_string()), 1.0, 1))
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::WarehouseNotFound(_))));

        let err = tavern
            .stock()
            .record_supply(est, supply(&setup.warehouse.id, StockItem::Ingredient("x".to_string()), 1.0, 1))
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::IngredientNotFound(_))));

        let err = tavern
            .stock()
            .record_supply(est, supply(&setup.warehouse.id, StockItem::Product("x".to_string()), 0.0, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_write_off_bounds() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;
        let wh = &setup.warehouse.id;

        let sugar = tavern.catalog().create_ingredient(est, "Sugar", "kg").await.unwrap();
        let item = StockItem::Ingredient(sugar.id.clone());

        let missing = NewWriteOff {
            warehouse_id: wh.clone(),
            item: item.clone(),
            quantity: 1.0,
            reason: None,
        };
        let err = tavern.stock().record_write_off(est, missing).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::StockNotFound { .. })));

        tavern.stock().record_supply(est, supply(wh, item.clone(), 5.0, 90)).await.unwrap();

        let too_much = NewWriteOff {
            warehouse_id: wh.clone(),
            item: item.clone(),
            quantity: 5.5,
            reason: None,
        };
        let err = tavern.stock().record_write_off(est, too_much).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::InsufficientStock { .. })));

        let spoiled = NewWriteOff {
            warehouse_id: wh.clone(),
            item,
            quantity: 2.0,
            reason: Some("spoiled".to_string()),
        };
        let record = tavern.stock().record_write_off(est, spoiled).await.unwrap();
        assert_eq!(record.stock.quantity, 3.0);
        assert_eq!(record.write_off.reason.as_deref(), Some("spoiled"));
        assert_eq!(tavern.stock().list_write_offs(est, wh).await.unwrap().len(), 1);
    }
}
