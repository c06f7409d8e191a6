//! A day at the exchange office.
//!
//! Walks through a manager setting up the till, a cashier serving a few
//! clients (including a split request and one the till cannot cover), a
//! replayed day of random traffic, and the closing report with its bonus.

use exchange_office::prelude::*;
use exchange_office::simulation::trading_day::{generate_requests, run_trading_day, TradingDayConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal_macros::dec;

fn main() {
    println!("╔════════════════════════════════════════╗");
    println!("║  exchange-office: A Day at the Office  ║");
    println!("╚════════════════════════════════════════╝\n");

    let config = OfficeConfig::default();
    let mut store = MemoryStore::new();
    let mut office = config
        .build_office(&mut store)
        .expect("reference configuration is valid");

    let manager = Manager::new(Party::new(1, "Mia"), config.bonus_policy().expect("valid bonus"));
    let cashier = Cashier::new(Party::new(2, "Carol"));

    // --- Opening ---
    println!("━━━ Opening ━━━\n");
    manager
        .set_critical_reserve(&mut office, Currency::Local, dec!(900))
        .expect("threshold is positive");
    manager
        .set_exchange_rate(&mut office, Currency::Eur, Currency::Local, dec!(1.25))
        .expect("rate is positive");
    for currency in Currency::ALL {
        println!("  {:<6}{:>10.2}", currency, office.reserve().balance(currency));
    }
    println!();

    // --- Scenario 1: a plain exchange ---
    println!("━━━ Scenario 1: 100 USD into LOCAL ━━━\n");
    let request = ExchangeRequest::simple(Party::new(3, "Dave"), Currency::Usd, dec!(100), Currency::Local)
        .expect("request is well formed");
    match cashier.handle_request(&mut office, &request) {
        Ok(receipt) => println!("{}", receipt),
        Err(e) => println!("Rejected: {}\n", e),
    }
    for currency in cashier.low_reserve_alerts(&office) {
        println!("  ! {} below its critical minimum\n", currency);
    }

    // --- Scenario 2: a split request ---
    println!("━━━ Scenario 2: 200 GBP, 80 into EUR, the rest into LOCAL notes ━━━\n");
    let request = ExchangeRequest::new(
        Party::new(4, "Erin"),
        Currency::Gbp,
        dec!(200),
        vec![
            ExchangePortion::fixed(Currency::Eur, dec!(80)),
            ExchangePortion::remainder(Currency::Local).with_denominations([100, 50, 20]),
        ],
    )
    .expect("request is well formed");
    if let Ok(quote) = office.quote(&request) {
        println!("  Quoted profit: {:.2} LOCAL", quote.profit_base);
    }
    match cashier.handle_request(&mut office, &request) {
        Ok(receipt) => println!("{}", receipt),
        Err(e) => println!("Rejected: {}\n", e),
    }

    // --- Scenario 3: more than the till holds ---
    println!("━━━ Scenario 3: 5000 USD into EUR ━━━\n");
    let request = ExchangeRequest::simple(Party::new(5, "Finn"), Currency::Usd, dec!(5000), Currency::Eur)
        .expect("request is well formed");
    match cashier.handle_request(&mut office, &request) {
        Ok(receipt) => println!("{}", receipt),
        Err(e) => println!("  Rejected ({:?}): {}\n", e.kind(), e),
    }

    // --- Scenario 4: the rest of the day ---
    println!("━━━ Scenario 4: 40 random clients ━━━\n");
    let day = TradingDayConfig {
        transactions: 40,
        ..Default::default()
    };
    let requests =
        generate_requests(&day, &mut StdRng::seed_from_u64(2024)).expect("day configuration is valid");
    let outcome = run_trading_day(&mut office, &cashier, requests);
    println!("  Accepted: {}", outcome.accepted());
    println!("  Rejected: {}", outcome.rejected_count());
    for (kind, count) in &outcome.rejected {
        println!("    {:?}: {}", kind, count);
    }
    println!();

    // --- Closing ---
    println!("━━━ Closing ━━━\n");
    let summary = manager.daily_summary(&office);
    println!("{}", summary.report);
    println!("Manager bonus: {:.2} {}", summary.bonus, summary.report.base_currency());
    let location = store
        .persist_report(&summary.report, manager.identity())
        .expect("memory store never fails");
    println!("Report filed as {}", location);
    manager.reset_daily_cycle(&mut office);
}
