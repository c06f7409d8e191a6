//! exchange-office CLI
//!
//! Run the office's daily operations from the command line. State lives in
//! the configured data directory and is saved after every successful change.
//!
//! # Usage
//!
//! ```bash
//! # Exchange 100 USD: 40 of it into EUR, the rest into LOCAL notes of 50 and 20
//! exchange-office exchange --cashier Carol --client Dave --from USD --amount 100 \
//!     --portion EUR=40 --portion LOCAL@50,20
//!
//! # Inspect the till
//! exchange-office status
//!
//! # Close the day
//! exchange-office reset --manager Mia
//!
//! # Several commands against one office, keeping the day's history
//! exchange-office session < commands.txt
//! ```

use exchange_office::config::{ConfigError, OfficeConfig};
use exchange_office::core::currency::{Amount, Currency};
use exchange_office::core::party::{Party, PersonRole};
use exchange_office::core::request::{ExchangePortion, ExchangeRequest};
use exchange_office::engine::office::ExchangeOffice;
use exchange_office::engine::staff::{Cashier, Manager};
use exchange_office::error::ExchangeError;
use exchange_office::simulation::trading_day::{generate_requests, run_trading_day, TradingDayConfig};
use exchange_office::store::{DataStore, FileStore, StoreError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::io::{self, BufRead};
use std::process;
use thiserror::Error;

const USAGE: &str = r#"exchange-office: currency-exchange office transaction and ledger engine

USAGE:
    exchange-office [--config <FILE>] <COMMAND> [OPTIONS]

COMMANDS:
    exchange    Exchange a client's money into one or more currencies
    status      Show reserves, thresholds, rates and today's profit
    rate        Set an exchange rate (manager)
    critical    Set a critical reserve minimum (manager)
    topup       Add cash to the reserve (manager)
    reduce      Take cash out of the reserve (manager)
    report      Compile and file the daily report (manager)
    reset       File the daily report and start a new day (manager)
    simulate    Replay a randomly generated trading day
    session     Read commands line by line from stdin against one office
    help        Show this message

    Every command except `session` starts from the saved reserve, rates and
    thresholds. Transaction history and profit accumulate only within one
    `session`, so a one-shot `report` or `reset` covers an empty day.

OPTIONS (exchange):
    --cashier <NAME>    Cashier serving the client
    --client <NAME>     Client name
    --from <CUR>        Currency handed in
    --amount <AMOUNT>   Amount handed in
    --portion <SPEC>    CUR[=AMOUNT][@D1,D2,...], repeatable; without
                        =AMOUNT the portion takes whatever is left
    --quote             Show the outcome without executing

OPTIONS (rate):         --manager <NAME> --from <CUR> --to <CUR> --rate <RATE>
OPTIONS (critical, topup, reduce):
                        --manager <NAME> --currency <CUR> --amount <AMOUNT>
OPTIONS (report):       --manager <NAME> [--format text|json]
OPTIONS (reset):        --manager <NAME>
OPTIONS (simulate):
    --transactions <N>  Number of requests (default: 50)
    --clients <N>       Number of distinct clients (default: 10)
    --seed <N>          Random seed (default: random)
    --cashier <NAME>    Cashier serving the day (default: Simulator)
    --dry-run           Do not save anything

CURRENCIES: USD, EUR, GBP, LOCAL

EXAMPLES:
    exchange-office exchange --cashier Carol --client Dave --from USD --amount 100 --portion LOCAL
    exchange-office rate --manager Mia --from EUR --to LOCAL --rate 1.19
    exchange-office critical --manager Mia --currency LOCAL --amount 200
    exchange-office --config office.json simulate --transactions 200 --seed 7"#;

fn print_usage() {
    eprintln!("{USAGE}");
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot render JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot read input: {0}")]
    Io(#[from] io::Error),
}

type CmdResult = Result<(), CliError>;

fn usage(message: impl Into<String>) -> CliError {
    CliError::Usage(message.into())
}

/// Options that take no value.
const FLAGS: &[&str] = &["--quote", "--dry-run"];

/// `--name value` pairs and bare flags, in command-line order.
struct Options {
    values: Vec<(String, String)>,
    flags: Vec<String>,
}

impl Options {
    fn parse(args: &[String]) -> Result<Self, CliError> {
        let mut values = Vec::new();
        let mut flags = Vec::new();
        let mut i = 0;
        while i < args.len() {
            let name = args[i].as_str();
            if !name.starts_with("--") {
                return Err(usage(format!("Unexpected argument: {name}")));
            }
            if FLAGS.contains(&name) {
                flags.push(name.to_string());
            } else {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| usage(format!("{name} requires a value")))?;
                values.push((name.to_string(), value.clone()));
            }
            i += 1;
        }
        Ok(Self { values, flags })
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn all(&self, name: &str) -> impl Iterator<Item = &str> + '_ {
        let name = name.to_string();
        self.values
            .iter()
            .filter(move |(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    fn require(&self, name: &str) -> Result<&str, CliError> {
        self.get(name)
            .ok_or_else(|| usage(format!("{name} is required")))
    }

    fn flag(&self, name: &str) -> bool {
        self.flags.iter().any(|flag| flag == name)
    }

    fn currency(&self, name: &str) -> Result<Currency, CliError> {
        parse_currency(self.require(name)?)
    }

    fn amount(&self, name: &str) -> Result<Amount, CliError> {
        parse_amount(self.require(name)?)
    }

    fn number<T: std::str::FromStr>(&self, name: &str, default: T) -> Result<T, CliError> {
        match self.get(name) {
            Some(raw) => raw
                .parse()
                .map_err(|_| usage(format!("{name} requires a number, got '{raw}'"))),
            None => Ok(default),
        }
    }
}

fn parse_currency(raw: &str) -> Result<Currency, CliError> {
    raw.parse().map_err(|e| usage(format!("{e}")))
}

fn parse_amount(raw: &str) -> Result<Amount, CliError> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|e| usage(format!("Invalid amount '{raw}': {e}")))
}

/// `CUR[=AMOUNT][@D1,D2,...]`
fn parse_portion(raw: &str) -> Result<ExchangePortion, CliError> {
    let (head, notes) = match raw.split_once('@') {
        Some((head, notes)) => (head, Some(notes)),
        None => (raw, None),
    };
    let portion = match head.split_once('=') {
        Some((currency, amount)) => {
            ExchangePortion::fixed(parse_currency(currency)?, parse_amount(amount)?)
        }
        None => ExchangePortion::remainder(parse_currency(head)?),
    };
    let Some(notes) = notes else {
        return Ok(portion);
    };
    let denominations = notes
        .split(',')
        .filter(|note| !note.trim().is_empty())
        .map(|note| {
            note.trim()
                .parse::<u32>()
                .map_err(|_| usage(format!("Invalid denomination '{note}' in '{raw}'")))
        })
        .collect::<Result<Vec<u32>, CliError>>()?;
    Ok(portion.with_denominations(denominations))
}

/// The office loaded from the data directory, plus where to save it.
struct Context {
    config: OfficeConfig,
    store: FileStore,
    office: ExchangeOffice,
}

impl Context {
    fn open(config: OfficeConfig) -> Result<Self, CliError> {
        let mut store = FileStore::open(config.data_dir.clone())?;
        let office = config.build_office(&mut store)?;
        Ok(Self {
            config,
            store,
            office,
        })
    }

    fn party(&mut self, role: PersonRole, name: &str) -> Result<Party, CliError> {
        let id = self.store.ensure_person_id(role, name)?;
        Ok(Party::new(id, name.trim()))
    }

    fn cashier(&mut self, opts: &Options, default: Option<&str>) -> Result<Cashier, CliError> {
        let name = match (opts.get("--cashier"), default) {
            (Some(name), _) | (None, Some(name)) => name,
            (None, None) => return Err(usage("--cashier is required")),
        };
        Ok(Cashier::new(self.party(PersonRole::Cashier, name)?))
    }

    fn manager(&mut self, opts: &Options) -> Result<Manager, CliError> {
        let identity = self.party(PersonRole::Manager, opts.require("--manager")?)?;
        Ok(Manager::new(identity, self.config.bonus_policy()?))
    }

    fn save_reserve(&mut self) -> CmdResult {
        self.store.save_reserve(self.office.reserve().all_balances())?;
        Ok(())
    }

    fn dispatch(&mut self, command: &str, args: &[String]) -> CmdResult {
        let opts = Options::parse(args)?;
        match command {
            "exchange" => self.cmd_exchange(&opts),
            "status" => self.cmd_status(),
            "rate" => self.cmd_rate(&opts),
            "critical" => self.cmd_critical(&opts),
            "topup" => self.cmd_topup(&opts),
            "reduce" => self.cmd_reduce(&opts),
            "report" => self.cmd_report(&opts),
            "reset" => self.cmd_reset(&opts),
            "simulate" => self.cmd_simulate(&opts),
            _ => Err(usage(format!("Unknown command: {command}"))),
        }
    }

    fn cmd_exchange(&mut self, opts: &Options) -> CmdResult {
        let source = opts.currency("--from")?;
        let amount = opts.amount("--amount")?;
        let portions = opts
            .all("--portion")
            .map(parse_portion)
            .collect::<Result<Vec<_>, _>>()?;
        let cashier = self.cashier(opts, None)?;
        let client = self.party(PersonRole::Client, opts.require("--client")?)?;
        let request = ExchangeRequest::new(client, source, amount, portions)?;

        if opts.flag("--quote") {
            let quote = self.office.quote(&request)?;
            println!("Quote for {} {:.2}", quote.source_currency, quote.source_consumed);
            for payout in &quote.payouts {
                println!("  -> {} amount: {:.2}", payout.currency, payout.amount_paid);
            }
            if quote.returned_to_client > Decimal::ZERO {
                println!("Returned to client: {:.2}", quote.returned_to_client);
            }
            println!("Profit (base): {:.2}", quote.profit_base);
            return Ok(());
        }

        let receipt = cashier.handle_request(&mut self.office, &request)?;
        self.save_reserve()?;
        self.store.append_transaction(&receipt)?;

        print!("{}", receipt);
        let returned = request.total_amount() - receipt.source_amount();
        if returned > Decimal::ZERO {
            println!("Returned to client: {:.2} {}", returned, receipt.source_currency());
        }
        for currency in cashier.low_reserve_alerts(&self.office) {
            println!(
                "WARNING: {} reserve below critical minimum ({:.2} < {:.2})",
                currency,
                self.office.reserve().balance(currency),
                self.office.critical_minimum(currency)
            );
        }
        Ok(())
    }

    fn cmd_status(&mut self) -> CmdResult {
        let office = &self.office;
        let base = office.rates().base();
        println!(
            "Base currency: {}    Commission: {}%",
            base,
            office.settings().commission() * Decimal::ONE_HUNDRED
        );
        println!("\nReserve:");
        for currency in Currency::ALL {
            print!("  {:<6}{:>14.2}", currency, office.reserve().balance(currency));
            if let Some(threshold) = office.critical_minimums().get(&currency) {
                print!("   (critical {:.2})", threshold);
                if office.is_below_critical(currency) {
                    print!(" LOW");
                }
            }
            println!();
        }
        match office.reserve().total_in(base, office.rates()) {
            Ok(total) => println!("  Total value: {:.2} {}", total, base),
            Err(e) => println!("  Total value unavailable: {}", e),
        }
        println!("\nRates:");
        for entry in office.rates().entries() {
            println!("  1 {} = {} {}", entry.from, entry.rate.round_dp(6), entry.to);
        }
        println!(
            "\nToday: {} transactions, profit {:.2} {}",
            office.history().len(),
            office.current_profit(),
            base
        );
        Ok(())
    }

    fn cmd_rate(&mut self, opts: &Options) -> CmdResult {
        let from = opts.currency("--from")?;
        let to = opts.currency("--to")?;
        let rate = opts.amount("--rate")?;
        let manager = self.manager(opts)?;
        manager.set_exchange_rate(&mut self.office, from, to, rate)?;
        self.store.save_rates(self.office.rates())?;
        println!("1 {} = {} {}", from, rate, to);
        Ok(())
    }

    fn cmd_critical(&mut self, opts: &Options) -> CmdResult {
        let currency = opts.currency("--currency")?;
        let amount = opts.amount("--amount")?;
        let manager = self.manager(opts)?;
        manager.set_critical_reserve(&mut self.office, currency, amount)?;
        self.store.save_critical_minimums(self.office.critical_minimums())?;
        println!("Critical minimum for {} set to {:.2}", currency, amount);
        Ok(())
    }

    fn cmd_topup(&mut self, opts: &Options) -> CmdResult {
        let currency = opts.currency("--currency")?;
        let amount = opts.amount("--amount")?;
        let manager = self.manager(opts)?;
        manager.top_up_reserve(&mut self.office, currency, amount)?;
        self.save_reserve()?;
        println!(
            "{} reserve: {:.2}",
            currency,
            self.office.reserve().balance(currency)
        );
        Ok(())
    }

    fn cmd_reduce(&mut self, opts: &Options) -> CmdResult {
        let currency = opts.currency("--currency")?;
        let amount = opts.amount("--amount")?;
        let manager = self.manager(opts)?;
        manager.reduce_reserve(&mut self.office, currency, amount)?;
        self.save_reserve()?;
        println!(
            "{} reserve: {:.2}",
            currency,
            self.office.reserve().balance(currency)
        );
        if self.office.is_below_critical(currency) {
            println!("WARNING: {} reserve below critical minimum", currency);
        }
        Ok(())
    }

    fn cmd_report(&mut self, opts: &Options) -> CmdResult {
        let format = opts.get("--format").unwrap_or("text");
        if format != "text" && format != "json" {
            return Err(usage("--format requires 'text' or 'json'"));
        }
        let manager = self.manager(opts)?;
        let summary = manager.daily_summary(&self.office);
        let location = self.store.persist_report(&summary.report, manager.identity())?;

        if format == "json" {
            println!("{}", serde_json::to_string_pretty(&summary.report)?);
        } else {
            print!("{}", summary.report);
            println!(
                "Manager bonus: {:.2} {}",
                summary.bonus,
                summary.report.base_currency()
            );
        }
        eprintln!("Report saved to {}", location);
        Ok(())
    }

    fn cmd_reset(&mut self, opts: &Options) -> CmdResult {
        let manager = self.manager(opts)?;
        let summary = manager.daily_summary(&self.office);
        let location = self.store.persist_report(&summary.report, manager.identity())?;
        manager.reset_daily_cycle(&mut self.office);
        self.save_reserve()?;
        println!(
            "Day closed: {} transactions, profit {:.2}, bonus {:.2} {}",
            summary.report.transaction_count(),
            summary.report.total_profit(),
            summary.bonus,
            summary.report.base_currency()
        );
        println!("Report saved to {}", location);
        Ok(())
    }

    fn cmd_simulate(&mut self, opts: &Options) -> CmdResult {
        let defaults = TradingDayConfig::default();
        let config = TradingDayConfig {
            transactions: opts.number("--transactions", defaults.transactions)?,
            clients: opts.number("--clients", defaults.clients)?,
            ..defaults
        };
        let seed = opts.number("--seed", rand::thread_rng().gen::<u64>())?;
        let dry_run = opts.flag("--dry-run");

        let requests = generate_requests(&config, &mut StdRng::seed_from_u64(seed))?;
        let cashier = self.cashier(opts, Some("Simulator"))?;
        let mut scratch;
        let office = if dry_run {
            scratch = self.office.clone();
            &mut scratch
        } else {
            &mut self.office
        };
        let outcome = run_trading_day(office, &cashier, requests);
        let base = office.rates().base();

        if !dry_run {
            for receipt in &outcome.receipts {
                self.store.append_transaction(receipt)?;
            }
            self.save_reserve()?;
        }

        println!("Simulated trading day (seed {})", seed);
        println!("  Accepted: {}", outcome.accepted());
        println!("  Rejected: {}", outcome.rejected_count());
        for (kind, count) in &outcome.rejected {
            println!("    {:?}: {}", kind, count);
        }
        println!("  Profit:   {:.2} {}", outcome.total_profit(), base);
        Ok(())
    }

    fn session(&mut self) -> CmdResult {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            let Some((command, rest)) = tokens.split_first() else {
                continue;
            };
            match command.as_str() {
                c if c.starts_with('#') => continue,
                "quit" | "exit" => break,
                "help" => print_usage(),
                "session" => eprintln!("Error: already in a session"),
                _ => {
                    if let Err(e) = self.dispatch(command, rest) {
                        eprintln!("Error: {}", e);
                    }
                }
            }
        }
        Ok(())
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let mut config_path = None;
    if args.first().map(String::as_str) == Some("--config") {
        if args.len() < 2 {
            eprintln!("--config requires a file path");
            process::exit(1);
        }
        config_path = Some(args.remove(1));
        args.remove(0);
    }

    if args.is_empty() {
        print_usage();
        process::exit(1);
    }

    let command = args[0].as_str();
    let rest = &args[1..];

    if matches!(command, "help" | "--help" | "-h") {
        print_usage();
        return;
    }

    let config = match config_path {
        Some(path) => OfficeConfig::load(&path).unwrap_or_else(|e| {
            eprintln!("Error loading '{}': {}", path, e);
            process::exit(1);
        }),
        None => OfficeConfig::default(),
    };

    let mut context = Context::open(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    let result = if command == "session" {
        context.session()
    } else {
        context.dispatch(command, rest)
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if matches!(e, CliError::Usage(_)) {
            eprintln!("Run 'exchange-office help' for usage.");
        }
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_portion_forms() {
        let remainder = parse_portion("local").unwrap();
        assert!(remainder.is_remainder());
        assert_eq!(remainder.target(), Currency::Local);

        let fixed = parse_portion("EUR=40.5@20,10").unwrap();
        assert_eq!(fixed.fixed_amount(), Some(dec!(40.5)));
        assert_eq!(fixed.denominations(), &[20, 10]);

        let notes_only = parse_portion("GBP@50").unwrap();
        assert!(notes_only.is_remainder());
        assert_eq!(notes_only.denominations(), &[50]);
    }

    #[test]
    fn test_usage_explains_where_history_lives() {
        assert!(USAGE.contains("profit accumulate only within one"));
        assert!(USAGE.contains("one-shot `report` or `reset` covers an empty day"));
    }

    #[test]
    fn test_parse_portion_rejects_garbage() {
        assert!(parse_portion("JPY").is_err());
        assert!(parse_portion("USD=abc").is_err());
        assert!(parse_portion("USD@ten").is_err());
    }

    #[test]
    fn test_options_values_and_flags() {
        let opts = Options::parse(&args(&[
            "--portion", "EUR=10", "--quote", "--portion", "LOCAL", "--amount", "25",
        ]))
        .unwrap();
        assert!(opts.flag("--quote"));
        assert!(!opts.flag("--dry-run"));
        assert_eq!(opts.all("--portion").collect::<Vec<_>>(), vec!["EUR=10", "LOCAL"]);
        assert_eq!(opts.amount("--amount").unwrap(), dec!(25));
        assert!(opts.require("--client").is_err());
    }

    #[test]
    fn test_options_missing_value() {
        assert!(Options::parse(&args(&["--amount"])).is_err());
        assert!(Options::parse(&args(&["stray"])).is_err());
    }
}
