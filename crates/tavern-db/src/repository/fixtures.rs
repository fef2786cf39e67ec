//! Row builders shared by the repository tests.

use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::account::AccountRepository;
use super::catalog::CatalogRepository;
use super::establishment::EstablishmentRepository;
use tavern_core::{
    Account, AccountKind, Establishment, Ingredient, LedgerTransaction, Order, OrderItem,
    OrderStatus, PaymentStatus, Product, Shift, Stock, StockItem, TechCard, TransactionCategory,
    TransactionType, Warehouse,
};

fn id() -> String {
    Uuid::new_v4().to_string()
}

pub async fn establishment(conn: &mut SqliteConnection) -> Establishment {
    let est = Establishment {
        id: id(),
        name: "Test Tavern".to_string(),
        currency: "USD".to_string(),
        cash_account_id: None,
        card_account_id: None,
        created_at: Utc::now(),
    };
    EstablishmentRepository::new(conn).insert(&est).await.unwrap();
    est
}

pub async fn account(conn: &mut SqliteConnection, establishment_id: &str, balance_cents: i64) -> Account {
    let now = Utc::now();
    let account = Account {
        id: id(),
        establishment_id: establishment_id.to_string(),
        name: "Cash register".to_string(),
        currency: "USD".to_string(),
        kind: AccountKind::Cash,
        initial_balance_cents: balance_cents,
        current_balance_cents: balance_cents,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    AccountRepository::new(conn).insert(&account).await.unwrap();
    account
}

pub fn ledger_entry(
    establishment_id: &str,
    account_id: &str,
    transaction_type: TransactionType,
    amount_cents: i64,
) -> LedgerTransaction {
    let now = Utc::now();
    LedgerTransaction {
        id: id(),
        establishment_id: establishment_id.to_string(),
        account_id: account_id.to_string(),
        transaction_type,
        amount_cents,
        category: TransactionCategory::Other,
        description: None,
        date: now,
        shift_id: None,
        order_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn open_shift(establishment_id: &str, user_id: &str, initial_cash_cents: i64) -> Shift {
    Shift {
        id: id(),
        user_id: user_id.to_string(),
        establishment_id: establishment_id.to_string(),
        start_time: Utc::now(),
        end_time: None,
        initial_cash_cents,
        final_cash_cents: None,
        comment: None,
    }
}

pub fn draft_order(establishment_id: &str) -> Order {
    let now = Utc::now();
    Order {
        id: id(),
        establishment_id: establishment_id.to_string(),
        table_id: Some("T1".to_string()),
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
    }
}

pub fn product_line(order_id: &str, product_id: &str, quantity: i64, unit_price_cents: i64) -> OrderItem {
    OrderItem {
        id: id(),
        order_id: order_id.to_string(),
        product_id: Some(product_id.to_string()),
        tech_card_id: None,
        quantity,
        unit_price_cents,
        line_total_cents: unit_price_cents * quantity,
        created_at: Utc::now(),
    }
}

pub fn new_product(establishment_id: &str, price_cents: i64) -> Product {
    Product {
        id: id(),
        establishment_id: establishment_id.to_string(),
        name: "Cola".to_string(),
        price_cents,
        is_active: true,
        created_at: Utc::now(),
    }
}

pub async fn product(conn: &mut SqliteConnection, establishment_id: &str, price_cents: i64) -> Product {
    let product = new_product(establishment_id, price_cents);
    CatalogRepository::new(conn).insert_product(&product).await.unwrap();
    product
}

pub fn new_tech_card(establishment_id: &str, price_cents: i64) -> TechCard {
    TechCard {
        id: id(),
        establishment_id: establishment_id.to_string(),
        name: "Margherita".to_string(),
        price_cents,
        is_active: true,
        created_at: Utc::now(),
    }
}

pub async fn ingredient(
    conn: &mut SqliteConnection,
    establishment_id: &str,
    name: &str,
    unit: &str,
) -> Ingredient {
    let ingredient = Ingredient {
        id: id(),
        establishment_id: establishment_id.to_string(),
        name: name.to_string(),
        unit: unit.to_string(),
        created_at: Utc::now(),
    };
    CatalogRepository::new(conn).insert_ingredient(&ingredient).await.unwrap();
    ingredient
}

pub async fn warehouse(conn: &mut SqliteConnection, establishment_id: &str) -> Warehouse {
    let warehouse = Warehouse {
        id: id(),
        establishment_id: establishment_id.to_string(),
        name: "Main warehouse".to_string(),
        created_at: Utc::now(),
    };
    CatalogRepository::new(conn).insert_warehouse(&warehouse).await.unwrap();
    warehouse
}

pub fn stock_row(
    establishment_id: &str,
    warehouse_id: &str,
    item: &StockItem,
    quantity: f64,
    price_per_unit_cents: i64,
) -> Stock {
    let (ingredient_id, product_id) = item.columns();
    Stock {
        id: id(),
        establishment_id: establishment_id.to_string(),
        warehouse_id: warehouse_id.to_string(),
        ingredient_id: ingredient_id.map(str::to_string),
        product_id: product_id.map(str::to_string),
        quantity,
        price_per_unit_cents,
        updated_at: Utc::now(),
    }
}
