use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub simulator: SimulatorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulatorConfig {
    pub interval_secs: u64,
    pub churn_probability: f64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Built-in defaults; every file layer is optional.
            .set_default("storage.data_dir", ".studyspace")?
            .set_default("simulator.interval_secs", 30i64)?
            .set_default("simulator.churn_probability", 0.3)?
            .add_source(config::File::with_name("config/default").required(false))
            // Add in the current environment file
            // Default to 'development' env
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of STUDYSPACE)
            // Eg.. `STUDYSPACE__SIMULATOR__INTERVAL_SECS=10`
            .add_source(config::Environment::with_prefix("STUDYSPACE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
