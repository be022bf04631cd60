use gondola::config::PaperTradeConfig;
use gondola::data::{CsvQuoteLoader, QuoteSource};
use gondola::engines::evaluation::{PaperTrade, SimplePaperTrader};
use gondola::gondola::{Expression, Variables};
use gondola::types::Symbol;
use std::path::PathBuf;

/// Writes a CSV with a rising BHP and a falling CBA over six days.
fn quotes_file(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("gondola_{}_{}.csv", name, std::process::id()));
    let mut text = String::from("date,symbol,open,high,low,close,volume\n");
    for day in 0..6 {
        let bhp = 10.0 + day as f64;
        let cba = 60.0 - 2.0 * day as f64;
        text.push_str(&format!(
            "2024-02-{:02},BHP,{bhp},{},{},{bhp},{}\n",
            day + 1,
            bhp + 1.0,
            bhp - 1.0,
            1000 + day
        ));
        text.push_str(&format!(
            "2024-02-{:02},CBA,{cba},{},{},{cba},500\n",
            day + 1,
            cba + 1.0,
            cba - 1.0
        ));
    }
    std::fs::write(&path, text).unwrap();
    path
}

fn trader(name: &str, config: PaperTradeConfig) -> SimplePaperTrader<gondola::data::QuoteBundle> {
    let path = quotes_file(name);
    let (bundle, report) = CsvQuoteLoader::load_bundle(&path, None).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(report.rows, 12);
    assert_eq!(report.skipped, 0);
    SimplePaperTrader::new(bundle, config).unwrap()
}

fn rule(text: &str) -> Expression {
    Expression::parse(text, &Variables::trading_context()).unwrap()
}

fn config() -> PaperTradeConfig {
    PaperTradeConfig {
        initial_capital: 1_200.0,
        num_stocks: 2,
        trade_cost: 0.0,
        first_day: None,
        last_day: None,
    }
}

#[test]
fn test_loaded_quotes_drive_rules() {
    let trader = trader("drive", config());
    let bhp = Symbol::parse("BHP").unwrap();
    let value = rule("momentum(close, 2, 0)>0.0")
        .evaluate(&Variables::trading_context(), trader.quotes(), &bhp, 3)
        .unwrap();
    assert_eq!(value, 1.0);
    assert_eq!(trader.quotes().symbols().len(), 2);
}

#[test]
fn test_momentum_rule_buys_only_the_riser() {
    let trader = trader("riser", config());
    let portfolio = trader
        .simulate(&rule("momentum(close, 1, 0)>0.0"), &rule("false"))
        .unwrap();

    let bhp = Symbol::parse("BHP").unwrap();
    let cba = Symbol::parse("CBA").unwrap();
    assert!(portfolio.position(&cba).is_none());
    let position = portfolio.position(&bhp).unwrap();
    // Day 0 has no previous close, so momentum is 0 and nothing is bought
    assert_eq!(position.entry_day, 1);
    assert_eq!(position.entry_price, 11.0);
    // Half the cash went into BHP, the other half stays idle
    assert!((portfolio.total_value() - (600.0 + 600.0 / 11.0 * 15.0)).abs() < 1e-9);
}

#[test]
fn test_selling_the_faller_limits_loss() {
    let trader = trader("faller", config());
    let held = trader.paper_trade(&rule("order==1"), &rule("false")).unwrap();
    let cut = trader.paper_trade(&rule("order==1"), &rule("held>=1")).unwrap();
    assert!(held < 1_200.0);
    assert!(cut > held);
}

#[test]
fn test_trade_costs_reduce_value() {
    let free = trader("free", config());
    let costly = trader(
        "costly",
        PaperTradeConfig {
            trade_cost: 1.0,
            ..config()
        },
    );
    let (buy, sell) = (rule("true"), rule("true"));
    let portfolio = costly.simulate(&buy, &sell).unwrap();
    assert_eq!(portfolio.transactions, 12);
    assert!(portfolio.total_value() < free.paper_trade(&buy, &sell).unwrap());
}
