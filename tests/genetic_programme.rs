use chrono::{Duration, NaiveDate};
use gondola::config::{EvolutionConfig, MutatorConfig, PaperTradeConfig};
use gondola::data::{Quote, QuoteBundle, QuoteSource};
use gondola::engines::evaluation::{PaperTrade, SimplePaperTrader};
use gondola::engines::generation::{
    ChannelProgressCallback, GeneticProgramme, Mutator, ProgressMessage,
};
use gondola::gondola::Variables;
use gondola::types::Symbol;
use std::sync::mpsc;

const INITIAL_CAPITAL: f64 = 10_000.0;

/// Three symbols over 60 days with wave-shaped prices, so some rules win
/// and others lose.
fn bundle() -> QuoteBundle {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut records = Vec::new();
    for (k, name) in ["AAA", "BBB", "CCC"].iter().enumerate() {
        let symbol = Symbol::parse(name).unwrap();
        for i in 0..60 {
            let wave = ((i as f64) * 0.3 + k as f64).sin();
            let close = 20.0 + 5.0 * wave + 0.05 * i as f64;
            let quote = Quote::new(close - 0.2, close + 0.5, close - 0.5, close, 1_000 + 10 * i);
            records.push((symbol.clone(), start + Duration::days(i), quote));
        }
    }
    QuoteBundle::from_records(records).unwrap()
}

type Programme = GeneticProgramme<SimplePaperTrader<QuoteBundle>>;

fn programme(seed: u64, population_size: usize) -> Programme {
    let quotes = bundle();
    let mutator = Mutator::new(
        MutatorConfig::default(),
        &Variables::trading_context(),
        quotes.symbols(),
    )
    .unwrap();
    let trader = SimplePaperTrader::new(
        quotes,
        PaperTradeConfig {
            initial_capital: INITIAL_CAPITAL,
            num_stocks: 2,
            trade_cost: 5.0,
            first_day: None,
            last_day: None,
        },
    )
    .unwrap();
    let config = EvolutionConfig {
        population_size,
        seed,
        ..Default::default()
    };
    GeneticProgramme::new(trader, mutator, config).unwrap()
}

/// Distinct fitness values above the initial capital.
fn profitable(fitnesses: &[f64]) -> Vec<u64> {
    let mut bits: Vec<u64> = fitnesses
        .iter()
        .filter(|fitness| **fitness > INITIAL_CAPITAL)
        .map(|fitness| fitness.to_bits())
        .collect();
    bits.sort_unstable();
    bits.dedup();
    bits
}

#[test]
fn test_first_generation_keeps_exactly_the_profitable() {
    let mut gp = programme(7, 10);
    let mut scored = Vec::new();

    for _ in 0..40 {
        let individual = gp.next_individual().unwrap();
        scored.push(individual.fitness().unwrap());
        assert!(gp.next_breeding_population().len() <= 10);
    }

    let profitable = profitable(&scored);
    let population = gp.next_breeding_population();
    assert_eq!(population.len(), profitable.len().min(10));
    for (fitness, individual) in population.iter() {
        assert!(fitness > INITIAL_CAPITAL);
        assert!(profitable.contains(&fitness.to_bits()));
        assert_eq!(individual.fitness(), Some(fitness));
    }
}

#[test]
fn test_same_seed_same_population() {
    let mut first = programme(11, 10);
    let mut second = programme(11, 10);
    for _ in 0..25 {
        let a = first.next_individual().unwrap();
        let b = second.next_individual().unwrap();
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a.fitness(), b.fitness());
    }
    assert_eq!(first.export_json().unwrap(), second.export_json().unwrap());
}

#[test]
fn test_losses_never_retained_across_generations() {
    let mut gp = programme(3, 5);
    for _ in 0..3 {
        for _ in 0..20 {
            gp.next_individual().unwrap();
            let population = gp.next_breeding_population();
            assert!(population.len() <= 5);
            assert!(population.iter().all(|(fitness, _)| fitness > INITIAL_CAPITAL));
        }
        gp.next_generation();
        assert_eq!(
            gp.breeding_population().len(),
            gp.next_breeding_population().len()
        );
    }
    assert_eq!(gp.generation(), 4);
}

#[test]
fn test_breeding_individual_falls_back_to_fittest() {
    let mut gp = programme(5, 10);
    for _ in 0..30 {
        gp.next_individual().unwrap();
    }
    gp.next_generation();

    let best = gp.breeding_population().best().map(|best| best.to_string());
    let beyond = gp.fitness_sum() * 2.0 + 1.0;
    assert_eq!(gp.breeding_individual(beyond).map(|i| i.to_string()), best);
    assert_eq!(gp.breeding_individual(0.0).map(|i| i.to_string()), best);
}

#[test]
fn test_scores_match_paper_trader() {
    let mut gp = programme(13, 10);
    for _ in 0..10 {
        let individual = gp.next_individual().unwrap();
        let replayed = gp
            .trader()
            .paper_trade(individual.buy_rule(), individual.sell_rule())
            .unwrap();
        assert_eq!(individual.fitness(), Some(replayed));
    }
}

#[test]
fn test_run_reports_progress() {
    let mut gp = programme(17, 10);
    let (sender, receiver) = mpsc::channel();
    let mut callback = ChannelProgressCallback::new(sender);

    gp.run(2, 5, &mut callback).unwrap();
    drop(callback);
    let messages: Vec<ProgressMessage> = receiver.iter().collect();

    assert_eq!(messages.len(), 2 * (1 + 5 + 1));
    assert_eq!(messages[0], ProgressMessage::GenerationStart(1));
    assert_eq!(
        messages[5],
        ProgressMessage::CandidateScored { current: 5, total: 5 }
    );
    assert!(matches!(
        messages[6],
        ProgressMessage::GenerationComplete { generation: 1, .. }
    ));
    assert_eq!(messages[7], ProgressMessage::GenerationStart(2));
    assert_eq!(gp.generation(), 3);
}
