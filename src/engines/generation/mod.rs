pub mod genetic_programme;
pub mod individual;
pub mod mutator;
pub mod operators;
pub mod population;
pub mod progress;

pub use genetic_programme::{ExportedRule, GeneticProgramme};
pub use individual::{BreedType, Individual};
pub use mutator::{find_random_site, find_random_site_of_type, MutationKind, Mutator};
pub use population::{Admission, Fitness, Population};
pub use progress::{
    ChannelProgressCallback, ConsoleProgressCallback, ProgressCallback, ProgressMessage,
};
