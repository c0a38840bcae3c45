use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub encryption_key: String,
    pub server_host: String,
    pub server_port: u16,

    // Renderer sidecar
    pub renderer_url: String,
    pub renderer_timeout_secs: u64,
    pub max_concurrent_renders: usize,

    /// Operator plan override for controlled testing; empty means none.
    pub forced_plan: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("DOCMINT").separator("_"))
            .set_default("server_host", "0.0.0.0")?
            .set_default("server_port", 8080)?
            .set_default("renderer_url", "http://127.0.0.1:3001")?
            .set_default("renderer_timeout_secs", 30)?
            .set_default("max_concurrent_renders", 4)?
            .set_default("forced_plan", "")?
            .build()?;

        config.try_deserialize()
    }
}
