use exchange_office::core::currency::{Amount, Currency};
use exchange_office::core::party::Party;
use exchange_office::core::rates::RateTable;
use exchange_office::core::request::{ExchangePortion, ExchangeRequest};
use exchange_office::core::reserve::Reserve;
use exchange_office::engine::office::{ExchangeOffice, OfficeSettings};
use exchange_office::error::ErrorKind;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Any currency the office trades.
fn arb_currency() -> impl Strategy<Value = Currency> {
    prop::sample::select(Currency::ALL.to_vec())
}

/// A positive amount with cent precision (0.01 to 100,000.00).
fn arb_amount() -> impl Strategy<Value = Amount> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// A rate between 0.0001 and 10.0000.
fn arb_rate() -> impl Strategy<Value = Amount> {
    (1i64..100_000i64).prop_map(|units| Decimal::new(units, 4))
}

/// Rates of USD, EUR and GBP against LOCAL.
fn arb_rate_table() -> impl Strategy<Value = RateTable> {
    (arb_rate(), arb_rate(), arb_rate()).prop_map(|(usd, eur, gbp)| {
        let mut rates = RateTable::new(Currency::Local);
        for (currency, rate) in [(Currency::Usd, usd), (Currency::Eur, eur), (Currency::Gbp, gbp)] {
            rates
                .set_rate(currency, Currency::Local, rate)
                .expect("generated rates are positive");
        }
        rates
    })
}

/// An office with random rates, balances and commission.
fn arb_office() -> impl Strategy<Value = ExchangeOffice> {
    (
        arb_rate_table(),
        prop::collection::vec(arb_amount(), 4),
        (0i64..20i64).prop_map(|pct| Decimal::new(pct, 2)),
    )
        .prop_map(|(rates, balances, commission)| {
            let reserve = Reserve::with_balances(Currency::ALL.into_iter().zip(balances))
                .expect("generated balances are positive");
            let settings = OfficeSettings::with_commission(commission)
                .expect("generated commission is below one");
            ExchangeOffice::new(rates, reserve, settings)
        })
}

/// A request of one or two portions drawn from any currencies.
fn arb_request() -> impl Strategy<Value = ExchangeRequest> {
    (
        arb_currency(),
        arb_amount(),
        arb_currency(),
        prop::option::of((arb_currency(), 1u32..100u32)),
    )
        .prop_map(|(source, total, target, split)| {
            let portions = match split {
                // The fixed portion takes a share of the total, in percent.
                Some((fixed_target, share)) => vec![
                    ExchangePortion::fixed(
                        fixed_target,
                        (total * Decimal::from(share) / dec!(100)).round_dp(2),
                    ),
                    ExchangePortion::remainder(target),
                ],
                None => vec![ExchangePortion::remainder(target)],
            };
            ExchangeRequest::new(Party::new(1, "Client"), source, total, portions)
                .expect("generated requests are well formed")
        })
}

fn approx_eq(a: Amount, b: Amount, tolerance: Amount) -> bool {
    (a - b).abs() <= tolerance
}

proptest! {
    // ===================================================================
    // Setting a rate fixes its inverse; same-currency rates are 1.
    // ===================================================================
    #[test]
    fn inverse_rate_is_reciprocal(
        from in arb_currency(),
        to in arb_currency(),
        rate in arb_rate(),
    ) {
        prop_assume!(from != to);
        let mut rates = RateTable::new(Currency::Local);
        rates.set_rate(from, to, rate).unwrap();

        prop_assert_eq!(rates.get_rate(from, to).unwrap(), rate);
        prop_assert_eq!(rates.get_rate(to, from).unwrap(), Decimal::ONE / rate);
        prop_assert_eq!(rates.get_rate(from, from).unwrap(), Decimal::ONE);
        prop_assert_eq!(rates.get_rate(to, to).unwrap(), Decimal::ONE);
    }

    // ===================================================================
    // Converting there and back returns the original amount.
    // ===================================================================
    #[test]
    fn conversion_round_trips(
        rates in arb_rate_table(),
        from in arb_currency(),
        to in arb_currency(),
        amount in arb_amount(),
    ) {
        let there = rates.convert(amount, from, to).unwrap();
        let back = rates.convert(there, to, from).unwrap();
        prop_assert!(
            approx_eq(back, amount, dec!(0.00000001)),
            "{} {} -> {} {} -> {} {}", amount, from, there, to, back, from
        );
    }

    // ===================================================================
    // Withdrawals never overdraw; a refused one changes nothing.
    // ===================================================================
    #[test]
    fn withdraw_never_goes_negative(
        balance in arb_amount(),
        amount in arb_amount(),
        currency in arb_currency(),
    ) {
        let mut reserve = Reserve::with_balances([(currency, balance)]).unwrap();
        match reserve.withdraw(currency, amount) {
            Ok(()) => {
                prop_assert!(amount <= balance);
                prop_assert_eq!(reserve.balance(currency), balance - amount);
            }
            Err(_) => {
                prop_assert!(amount > balance);
                prop_assert_eq!(reserve.balance(currency), balance);
            }
        }
        prop_assert!(reserve.balance(currency) >= Decimal::ZERO);
    }

    // ===================================================================
    // A transaction commits fully or not at all, and never overdraws.
    // ===================================================================
    #[test]
    fn transactions_are_all_or_nothing(
        mut office in arb_office(),
        request in arb_request(),
    ) {
        let before = office.reserve().all_balances().clone();
        let profit_before = office.current_profit();

        match office.execute_transaction(&request, &Party::new(9, "Cashier")) {
            Ok(receipt) => {
                prop_assert!(receipt.source_amount() <= request.total_amount());
                prop_assert_eq!(office.history().len(), 1);
                prop_assert_eq!(office.current_profit(), profit_before + receipt.profit_base());
            }
            Err(err) => {
                prop_assert_ne!(err.kind(), ErrorKind::Validation);
                prop_assert_eq!(office.reserve().all_balances(), &before);
                prop_assert_eq!(office.current_profit(), profit_before);
                prop_assert!(office.history().is_empty());
            }
        }
        for currency in Currency::ALL {
            prop_assert!(office.reserve().balance(currency) >= Decimal::ZERO);
        }
    }

    // ===================================================================
    // Valued in the base currency, the reserve grows by exactly the
    // commission the office kept.
    // ===================================================================
    #[test]
    fn reserve_value_grows_by_profit(
        mut office in arb_office(),
        request in arb_request(),
    ) {
        let base = office.rates().base();
        let value_before = office.reserve().total_in(base, office.rates()).unwrap();

        if let Ok(receipt) = office.execute_transaction(&request, &Party::new(9, "Cashier")) {
            let value_after = office.reserve().total_in(base, office.rates()).unwrap();
            prop_assert!(
                approx_eq(value_after - value_before, receipt.profit_base(), dec!(0.000001)),
                "value moved by {} but profit was {}",
                value_after - value_before,
                receipt.profit_base()
            );
        }
    }

    // ===================================================================
    // Source money not claimed by any portion never enters the till.
    // ===================================================================
    #[test]
    fn unallocated_source_is_not_deposited(
        mut office in arb_office(),
        source in arb_currency(),
        target in arb_currency(),
        total in arb_amount(),
        share in 1u32..100u32,
    ) {
        prop_assume!(source != target);
        let fixed = (total * Decimal::from(share) / dec!(100)).round_dp(2);
        let request = ExchangeRequest::new(
            Party::new(1, "Client"),
            source,
            total,
            vec![ExchangePortion::fixed(target, fixed)],
        )
        .unwrap();
        let source_before = office.reserve().balance(source);

        if let Ok(receipt) = office.execute_transaction(&request, &Party::new(9, "Cashier")) {
            prop_assert_eq!(receipt.source_amount(), fixed);
            prop_assert_eq!(office.reserve().balance(source), source_before + fixed);
        }
    }

    // ===================================================================
    // Two remainder portions are always rejected at construction.
    // ===================================================================
    #[test]
    fn two_remainders_rejected(
        source in arb_currency(),
        a in arb_currency(),
        b in arb_currency(),
        total in arb_amount(),
    ) {
        let result = ExchangeRequest::new(
            Party::new(1, "Client"),
            source,
            total,
            vec![ExchangePortion::remainder(a), ExchangePortion::remainder(b)],
        );
        prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);
    }
}
