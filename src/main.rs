use anyhow::{bail, Context, Result};
use gondola::{
    config::ConfigManager,
    data::{CsvQuoteLoader, QuoteSource},
    engines::{
        evaluation::SimplePaperTrader,
        generation::{ConsoleProgressCallback, GeneticProgramme, Mutator},
    },
    gondola::Variables,
};

/// Rules printed at the end of a run
const BEST_RULES_SHOWN: usize = 5;

fn main() -> Result<()> {
    // Configure logging (RUST_LOG)
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        bail!("usage: {} <config.toml> <quotes.csv> [rules.json]", args[0]);
    }
    let (config_path, quotes_path) = (&args[1], &args[2]);

    let mut manager = ConfigManager::new();
    manager
        .load_from_file(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    let config = manager.get().clone();

    let (bundle, report) = CsvQuoteLoader::load_bundle(quotes_path, None)
        .with_context(|| format!("Failed to load quotes from {}", quotes_path))?;
    if report.skipped > 0 {
        log::warn!("Skipped {} malformed rows", report.skipped);
    }

    let partners = bundle.symbols();
    let mutator = Mutator::new(config.mutator.clone(), &Variables::trading_context(), partners)?;
    let trader = SimplePaperTrader::new(bundle, config.paper_trade.clone())?;
    let mut programme = GeneticProgramme::new(trader, mutator, config.evolution.clone())?;

    programme
        .run(
            config.evolution.num_generations,
            config.evolution.candidates_per_generation,
            &mut ConsoleProgressCallback,
        )
        .context("Genetic programme run failed")?;

    let rules = programme.export();
    if rules.is_empty() {
        println!("No rule pair beat the initial capital");
    }
    for (rank, rule) in rules.iter().take(BEST_RULES_SHOWN).enumerate() {
        println!("#{} {:.2}", rank + 1, rule.fitness);
        println!("  buy:  {}", rule.buy_rule);
        println!("  sell: {}", rule.sell_rule);
    }

    if let Some(best) = programme.breeding_population().best() {
        let portfolio = programme
            .trader()
            .simulate(best.buy_rule(), best.sell_rule())
            .context("Failed to replay the best rule pair")?;
        println!(
            "Best rule pair: {} trades, {} transactions, max drawdown {:.2}%",
            portfolio.trades.len(),
            portfolio.transactions,
            portfolio.max_drawdown * 100.0
        );
    }

    if let Some(output) = args.get(3) {
        programme
            .save_json(output)
            .with_context(|| format!("Failed to write rules to {}", output))?;
        println!("Saved {} rules to {}", rules.len(), output);
    }

    Ok(())
}
