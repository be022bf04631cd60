use super::{
    evolution::EvolutionConfig,
    mutator::MutatorConfig,
    paper_trade::PaperTradeConfig,
    traits::ConfigSection,
};
use crate::error::GondolaError;
use config::{Config, Environment, File, FileFormat, Source};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment variables overriding file settings, e.g.
/// `GONDOLA_EVOLUTION__SEED=7`.
pub const ENV_PREFIX: &str = "GONDOLA";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub mutator: MutatorConfig,
    pub paper_trade: PaperTradeConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), GondolaError> {
        validate_section(&self.evolution)?;
        validate_section(&self.mutator)?;
        validate_section(&self.paper_trade)?;
        Ok(())
    }
}

/// Validates one section, naming it in the error.
fn validate_section<S: ConfigSection>(section: &S) -> Result<(), GondolaError> {
    section.validate().map_err(|e| match e {
        GondolaError::Configuration(message) => {
            GondolaError::Configuration(format!("[{}] {}", S::section_name(), message))
        }
        other => other,
    })
}

pub struct ConfigManager {
    config: AppConfig,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Layers defaults, the file and `GONDOLA_` environment variables.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), GondolaError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GondolaError::Configuration(format!(
                "Config file {} not found",
                path.display()
            )));
        }
        self.load_sources(File::from(path), Self::environment())
    }

    pub fn load_from_str(
        &mut self,
        text: &str,
        environment: Environment,
    ) -> Result<(), GondolaError> {
        self.load_sources(File::from_str(text, FileFormat::Toml), environment)
    }

    fn load_sources<F, E>(&mut self, file: F, environment: E) -> Result<(), GondolaError>
    where
        F: Source + Send + Sync + 'static,
        E: Source + Send + Sync + 'static,
    {
        let config: AppConfig = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        log::debug!("Loaded configuration: {:?}", config);

        self.config = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), GondolaError> {
        let toml_str = toml::to_string_pretty(&self.config)
            .map_err(|e| GondolaError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| GondolaError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> &AppConfig {
        &self.config
    }

    /// Applies `f` and keeps the result only if it validates.
    pub fn update<F>(&mut self, f: F) -> Result<(), GondolaError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.clone();
        f(&mut config);
        config.validate()?;
        self.config = config;
        Ok(())
    }
}
