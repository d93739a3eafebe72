//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger policy.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Notification dispatch.
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// SMTP settings.
    #[serde(default)]
    pub email: EmailConfig,
    /// Log output.
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
    /// Apply pending migrations at startup.
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger policy knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Balance seeded into every new wallet.
    #[serde(default = "default_welcome_bonus", with = "rust_decimal::serde::str")]
    pub welcome_bonus: Decimal,
    /// Upper bound for any single credit, debit, or transfer.
    #[serde(default = "default_max_amount", with = "rust_decimal::serde::str")]
    pub max_amount: Decimal,
    /// Smallest deposit accepted from a payment rail.
    #[serde(default = "default_deposit_min", with = "rust_decimal::serde::str")]
    pub deposit_min: Decimal,
    /// Largest deposit accepted from a payment rail.
    #[serde(default = "default_deposit_max", with = "rust_decimal::serde::str")]
    pub deposit_max: Decimal,
    /// How long an atomic unit may wait for a row lock.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// How long a counterparty-name lookup may take before the user id is used.
    #[serde(default = "default_identity_timeout_ms")]
    pub identity_timeout_ms: u64,
    /// Number of rows returned with the wallet summary.
    #[serde(default = "default_recent_transactions")]
    pub recent_transactions: u64,
}

fn default_welcome_bonus() -> Decimal {
    Decimal::ONE_HUNDRED
}

fn default_max_amount() -> Decimal {
    Decimal::from(10_000)
}

fn default_deposit_min() -> Decimal {
    Decimal::ONE
}

fn default_deposit_max() -> Decimal {
    Decimal::from(10_000)
}

fn default_lock_timeout_ms() -> u64 {
    5_000
}

fn default_identity_timeout_ms() -> u64 {
    500
}

fn default_recent_transactions() -> u64 {
    5
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            welcome_bonus: default_welcome_bonus(),
            max_amount: default_max_amount(),
            deposit_min: default_deposit_min(),
            deposit_max: default_deposit_max(),
            lock_timeout_ms: default_lock_timeout_ms(),
            identity_timeout_ms: default_identity_timeout_ms(),
            recent_transactions: default_recent_transactions(),
        }
    }
}

/// Notification dispatch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Whether ledger events are delivered at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Outbox capacity; events beyond it are dropped and logged.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Per-delivery timeout.
    #[serde(default = "default_notify_timeout_ms")]
    pub timeout_ms: u64,
    /// Deliver over SMTP in addition to the log sink.
    #[serde(default)]
    pub email: bool,
    /// JSON user directory supplying names and email addresses.
    #[serde(default)]
    pub directory_path: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    1024
}

fn default_notify_timeout_ms() -> u64 {
    3_000
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel_capacity: default_channel_capacity(),
            timeout_ms: default_notify_timeout_ms(),
            email: false,
            directory_path: None,
        }
    }
}

/// SMTP configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: String,
    /// Sender address.
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    1025
}

fn default_from_email() -> String {
    "no-reply@gcoin.local".to_string()
}

fn default_from_name() -> String {
    "G Coin Wallet".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
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
            .add_source(config::Environment::with_prefix("GCOIN").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_config_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.welcome_bonus, Decimal::ONE_HUNDRED);
        assert_eq!(config.max_amount, Decimal::from(10_000));
        assert_eq!(config.deposit_min, Decimal::ONE);
        assert_eq!(config.lock_timeout_ms, 5_000);
        assert_eq!(config.identity_timeout_ms, 500);
        assert_eq!(config.recent_transactions, 5);
    }

    #[test]
    fn test_email_config_default() {
        let config = EmailConfig::default();
        assert_eq!(config.smtp_host, "localhost");
        assert_eq!(config.smtp_port, 1025);
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("GCOIN__SERVER__PORT", Some("9090")),
                (
                    "GCOIN__DATABASE__URL",
                    Some("postgres://ledger@localhost/ledger"),
                ),
                ("GCOIN__LEDGER__WELCOME_BONUS", Some("25.50")),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.database.url, "postgres://ledger@localhost/ledger");
                assert_eq!(config.ledger.welcome_bonus, Decimal::new(2550, 2));
                assert_eq!(config.ledger.deposit_max, Decimal::from(10_000));
                assert!(config.notifications.enabled);
                assert!(config.notifications.directory_path.is_none());
            },
        );
    }
}
