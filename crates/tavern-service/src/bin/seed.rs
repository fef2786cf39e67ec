//! # Demo Data Generator
//!
//! Creates a demo establishment and plays through one shift so the ledger,
//! stock and reports have something to show.
//!
//! ## Usage
//! ```bash
//! # One shift with 20 orders (default)
//! cargo run -p tavern-service --bin seed
//!
//! # More orders
//! cargo run -p tavern-service --bin seed -- --orders 200
//!
//! # Specify database path
//! cargo run -p tavern-service --bin seed -- --db ./data/tavern.db
//! ```
//!
//! ## What Gets Created
//! - Establishment "Demo Tavern" with its cash register, bank account and safe
//! - A small menu of products and tech cards
//! - Ingredient supplies into the main warehouse, paid from the bank account
//! - One shift: paid orders (cash, card and split), one cancelled order,
//!   and a closing cash count with a small surplus
//!
//! The shift report is printed as JSON at the end.

use std::env;

use tavern_core::{
    ItemRef, Money, PaymentSplit, ShiftFilter, StockItem, TransactionCategory, TransactionDraft, TransactionType,
};
use tavern_service::{telemetry, AppConfig, NewSupply, Tavern};

/// Menu: (name, price in cents, is tech card)
const MENU: &[(&str, i64, bool)] = &[
    ("Draught Ale", 550, false),
    ("House Red", 700, false),
    ("Lemonade", 350, false),
    ("Fish and Chips", 1_450, true),
    ("Shepherd's Pie", 1_300, true),
    ("Ploughman's Lunch", 1_100, true),
];

/// Ingredients: (name, unit, quantity, price per unit in cents)
const INGREDIENTS: &[(&str, &str, f64, i64)] = &[
    ("Potatoes", "kg", 50.0, 120),
    ("Cod", "kg", 10.0, 1_800),
    ("Minced lamb", "kg", 8.0, 1_400),
    ("Cheddar", "kg", 5.0, 1_100),
];

const OPENING_FLOAT_CENTS: i64 = 20_000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config = AppConfig::load()?;
    let mut orders: usize = 20;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--orders" | "-o" => {
                if i + 1 < args.len() {
                    orders = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.db_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tavern POS Demo Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -o, --orders <N>   Orders to play through the shift (default: 20)");
                println!("  -d, --db <PATH>    Database file path (default: $TAVERN_DB_PATH or ./tavern.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    telemetry::init_tracing(&config.log_filter);

    println!("🌱 Tavern POS Demo Data Generator");
    println!("=================================");
    println!("Database: {}", config.db_path.display());
    println!("Orders:   {}", orders);
    println!();

    let tavern = Tavern::connect(&config).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let setup = tavern.onboarding().create_establishment("Demo Tavern", None).await?;
    let est = setup.establishment.id.clone();
    println!("✓ Establishment {} ({})", setup.establishment.name, est);

    // Working capital so supplies can be paid.
    tavern
        .finance()
        .create_transaction(
            &est,
            TransactionDraft::new(
                setup.bank_account.id.as_str(),
                TransactionType::Income,
                Money::from_cents(100_000),
                TransactionCategory::Other,
            )
            .with_description("Opening capital"),
        )
        .await?;

    let mut menu = Vec::with_capacity(MENU.len());
    for (name, price, is_tech_card) in MENU {
        let item = if *is_tech_card {
            ItemRef::TechCard(tavern.catalog().create_tech_card(&est, name, Money::from_cents(*price)).await?.id)
        } else {
            ItemRef::Product(tavern.catalog().create_product(&est, name, Money::from_cents(*price)).await?.id)
        };
        menu.push(item);
    }
    println!("✓ Menu with {} items", menu.len());

    for (name, unit, quantity, price) in INGREDIENTS {
        let ingredient = tavern.catalog().create_ingredient(&est, name, unit).await?;
        tavern
            .stock()
            .record_supply(
                &est,
                NewSupply {
                    warehouse_id: setup.warehouse.id.clone(),
                    item: StockItem::Ingredient(ingredient.id),
                    quantity: *quantity,
                    price_per_unit_cents: *price,
                    account_id: Some(setup.bank_account.id.clone()),
                    supplied_at: None,
                },
            )
            .await?;
    }
    println!("✓ {} ingredient supplies recorded", INGREDIENTS.len());

    println!();
    println!("Playing shift...");

    let shift = tavern
        .shifts()
        .start_shift("demo-cashier", &est, Money::from_cents(OPENING_FLOAT_CENTS))
        .await?;

    let start = std::time::Instant::now();

    for n in 0..orders {
        let order = tavern.orders().create_order(&est, Some(&format!("T{}", n % 12 + 1))).await?;

        let mut details = None;
        for (line, item) in menu.iter().enumerate().filter(|(idx, _)| (n + idx) % 3 == 0) {
            let quantity = (n + line) as i64 % 3 + 1;
            details = Some(tavern.orders().add_order_item(&order.id, item.clone(), quantity).await?);
        }
        let total = details.map(|d| d.order.total_amount()).unwrap_or(Money::zero());

        if n % 10 == 9 {
            tavern
                .orders()
                .close_order_without_payment(&order.id, Some("walked out"))
                .await?;
            continue;
        }

        let split = match n % 3 {
            0 => {
                let given = Money::from_cents((total.cents() + 999) / 1_000 * 1_000);
                PaymentSplit::new(total, Money::zero(), given)
            }
            1 => PaymentSplit::new(Money::zero(), total, Money::zero()),
            _ => {
                let cash = Money::from_cents(total.cents() / 2);
                PaymentSplit::new(cash, total - cash, cash)
            }
        };
        tavern
            .orders()
            .process_order_payment(&order.id, split, Some(&shift.id))
            .await?;

        if (n + 1) % 50 == 0 {
            println!("  Played {} orders...", n + 1);
        }
    }

    // A stray tip left in the drawer.
    let counted = Money::from_cents(OPENING_FLOAT_CENTS + 250);
    let closure = tavern
        .shifts()
        .end_shift(&shift.id, counted, Some("demo shift"), None)
        .await?;

    println!("✓ Played {} orders in {:?}", orders, start.elapsed());
    if let Some(entry) = &closure.incassation {
        println!("  Incassation: {:?} {}", entry.transaction_type, entry.amount());
    }

    let report = tavern
        .reports()
        .generate_shift_report(&est, &ShiftFilter::default())
        .await?;

    println!();
    println!("Shift report:");
    println!("{}", serde_json::to_string_pretty(&report)?);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
