//! Settings of the merch store process.
//!
//! Read from an optional `settings.toml` in the working directory, then
//! overridden by `MERCH_STORE__*` environment variables
//! (e.g. `MERCH_STORE__SERVER__PORT=9000`). See `settings.example.toml`.
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// `tracing` level for the workspace crates.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Ledger {
    #[serde(default = "default_starting_balance")]
    pub starting_balance: i64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            starting_balance: default_starting_balance(),
        }
    }
}

/// Secret pepper and bcrypt work factor for stored passwords.
#[derive(Debug, Deserialize)]
pub struct PasswordHash {
    #[serde(default)]
    pub pepper: String,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for PasswordHash {
    fn default() -> Self {
        Self {
            pepper: String::new(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub ledger: Ledger,
    #[serde(default)]
    pub password_hash: PasswordHash,
    pub server: Option<Server>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_starting_balance() -> i64 {
    engine::STARTING_BALANCE
}

fn default_bcrypt_cost() -> u32 {
    server::DEFAULT_BCRYPT_COST
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("MERCH_STORE").separator("__"))
            .build()?
            .try_deserialize()
    }

    #[cfg(test)]
    fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
