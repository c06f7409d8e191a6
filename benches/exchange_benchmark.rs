use criterion::{black_box, criterion_group, criterion_main, Criterion};
use exchange_office::config::OfficeConfig;
use exchange_office::core::currency::Currency;
use exchange_office::core::party::Party;
use exchange_office::engine::office::ExchangeOffice;
use exchange_office::engine::staff::Cashier;
use exchange_office::simulation::trading_day::{generate_requests, run_trading_day, TradingDayConfig};
use exchange_office::store::MemoryStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal_macros::dec;

fn office() -> ExchangeOffice {
    let config = OfficeConfig {
        initial_reserve: Currency::ALL.iter().map(|&c| (c, dec!(1_000_000))).collect(),
        ..OfficeConfig::default()
    };
    config
        .build_office(&mut MemoryStore::new())
        .expect("reference configuration is valid")
}

fn bench_day(c: &mut Criterion, name: &str, transactions: usize) {
    let config = TradingDayConfig {
        transactions,
        clients: 100,
        split_probability: 0.5,
        ..Default::default()
    };
    let requests = generate_requests(&config, &mut StdRng::seed_from_u64(42))
        .expect("benchmark configuration is valid");
    let office = office();
    let cashier = Cashier::new(Party::new(1, "Bench"));

    c.bench_function(name, |b| {
        b.iter(|| {
            let mut office = office.clone();
            run_trading_day(&mut office, &cashier, black_box(requests.clone()))
        })
    });
}

fn bench_trading_day_100(c: &mut Criterion) {
    bench_day(c, "trading_day_100", 100);
}

fn bench_trading_day_1000(c: &mut Criterion) {
    bench_day(c, "trading_day_1000", 1000);
}

fn bench_quote(c: &mut Criterion) {
    let requests = generate_requests(
        &TradingDayConfig {
            transactions: 1,
            split_probability: 1.0,
            ..Default::default()
        },
        &mut StdRng::seed_from_u64(7),
    )
    .expect("benchmark configuration is valid");
    let office = office();

    c.bench_function("quote_split_request", |b| {
        b.iter(|| office.quote(black_box(&requests[0])))
    });
}

fn bench_daily_report(c: &mut Criterion) {
    let mut office = office();
    let requests = generate_requests(
        &TradingDayConfig {
            transactions: 1000,
            ..Default::default()
        },
        &mut StdRng::seed_from_u64(9),
    )
    .expect("benchmark configuration is valid");
    run_trading_day(&mut office, &Cashier::new(Party::new(1, "Bench")), requests);

    c.bench_function("daily_report_1000", |b| {
        b.iter(|| black_box(&office).compile_daily_report())
    });
}

criterion_group!(
    benches,
    bench_trading_day_100,
    bench_trading_day_1000,
    bench_quote,
    bench_daily_report
);
criterion_main!(benches);
