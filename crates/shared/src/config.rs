//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Billing defaults.
    #[serde(default)]
    pub billing: BillingConfig,
    /// Revenue-cycle orchestrator schedule.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Log output settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Billing defaults applied when a request leaves them out.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// ISO 4217 code recorded on payments without an explicit currency.
    #[serde(default = "default_currency")]
    pub default_currency: String,
}

fn default_currency() -> String {
    "PKR".to_string()
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            default_currency: default_currency(),
        }
    }
}

/// Revenue-cycle orchestrator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
    /// Whether the server spawns the scheduled orchestrator task.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between scheduled runs.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Run once immediately when the server starts.
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
    /// IANA timezone used for organizations without a valid one.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    /// Closing day used for plans without a valid one.
    #[serde(default = "default_closing_day")]
    pub default_closing_day: u32,
    /// Name hashed into the advisory lock key.
    #[serde(default = "default_lock_name")]
    pub lock_name: String,
}

fn default_true() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    86_400 // daily
}

fn default_timezone() -> String {
    "Asia/Karachi".to_string()
}

fn default_closing_day() -> u32 {
    10
}

fn default_lock_name() -> String {
    "revenue_cycle_orchestrator".to_string()
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            interval_secs: default_interval_secs(),
            run_on_startup: default_true(),
            default_timezone: default_timezone(),
            default_closing_day: default_closing_day(),
            lock_name: default_lock_name(),
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SAIREX").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
