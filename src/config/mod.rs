pub mod traits;
pub mod evolution;
pub mod mutator;
pub mod paper_trade;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use evolution::{BreedWeights, EvolutionConfig};
pub use mutator::MutatorConfig;
pub use paper_trade::PaperTradeConfig;
pub use traits::ConfigSection;
