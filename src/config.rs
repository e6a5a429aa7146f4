//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::wallet::types::Address;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    pub wallet: WalletSection,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identities the wallet starts with
#[derive(Debug, Clone, Deserialize)]
pub struct WalletSection {
    /// The wallet's own address
    pub address: Address,
    pub owner: Address,
    /// Initial admin, defaults to the owner
    #[serde(default)]
    pub admin: Option<Address>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default = "default_log_directive")]
    pub directive: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            directive: default_log_directive(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Upper bound on `events.channel_capacity`
pub const MAX_CHANNEL_CAPACITY: usize = 65_536;

fn default_channel_capacity() -> usize {
    crate::wallet::managed::DEFAULT_EVENT_CAPACITY
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_log_directive() -> String {
    "managed_wallet=info".to_string()
}

impl WalletConfig {
    /// Configuration with default events and logging sections
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            wallet: WalletSection {
                address,
                owner,
                admin: None,
            },
            events: EventsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Pick up MANAGED_WALLET__* overrides from a local .env
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("events.channel_capacity", default_channel_capacity() as i64)?
            .set_default("logging.directive", default_log_directive())?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix MANAGED_WALLET__)
            .add_source(
                config::Environment::with_prefix("MANAGED_WALLET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: WalletConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.events.channel_capacity == 0 {
            anyhow::bail!("events.channel_capacity must be positive");
        }

        if self.events.channel_capacity > MAX_CHANNEL_CAPACITY {
            anyhow::bail!(
                "events.channel_capacity cannot exceed {}, got {}",
                MAX_CHANNEL_CAPACITY,
                self.events.channel_capacity
            );
        }

        if self.wallet.owner.is_zero() {
            anyhow::bail!("wallet.owner cannot be the zero address");
        }

        if self.wallet.admin.is_some_and(|admin| admin.is_zero()) {
            anyhow::bail!("wallet.admin cannot be the zero address");
        }

        if self.wallet.owner == self.wallet.address {
            anyhow::bail!("wallet.owner cannot be the wallet's own address");
        }

        tracing_subscriber::EnvFilter::try_new(&self.logging.directive)
            .with_context(|| format!("Invalid logging.directive: {}", self.logging.directive))?;

        if self.wallet.admin.is_none() {
            tracing::debug!("wallet.admin not set, owner {} is admin", self.wallet.owner);
        }

        Ok(())
    }

    /// Human readable summary of the effective configuration
    pub fn summary(&self) -> String {
        format!(
            r#"Configuration:
  Wallet:
    address: {}
    owner: {}
    admin: {}
  Events:
    channel_capacity: {}
  Logging:
    format: {:?}
    directive: {}
"#,
            self.wallet.address,
            self.wallet.owner,
            self.wallet
                .admin
                .map(|a| a.to_string())
                .unwrap_or_else(|| "(owner)".to_string()),
            self.events.channel_capacity,
            self.logging.format,
            self.logging.directive,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_minimal_file() {
        let file = write_config(
            r#"
[wallet]
address = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
owner = "0x0101010101010101010101010101010101010101"
"#,
        );

        let config = WalletConfig::load(file.path()).unwrap();
        assert_eq!(config.wallet.owner, Address::new([0x01; 20]));
        assert_eq!(config.wallet.admin, None);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.directive, "managed_wallet=info");
    }

    #[test]
    fn test_load_full_file() {
        let file = write_config(
            r#"
[wallet]
address = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
owner = "0x0101010101010101010101010101010101010101"
admin = "0x0202020202020202020202020202020202020202"

[events]
channel_capacity = 16

[logging]
format = "json"
directive = "managed_wallet=debug"
"#,
        );

        let config = WalletConfig::load(file.path()).unwrap();
        assert_eq!(config.wallet.admin, Some(Address::new([0x02; 20])));
        assert_eq!(config.events.channel_capacity, 16);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_rejects_bad_address() {
        let file = write_config(
            r#"
[wallet]
address = "0xeeee"
owner = "0x0101010101010101010101010101010101010101"
"#,
        );

        assert!(WalletConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let file = write_config(
            r#"
[wallet]
address = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
owner = "0x0101010101010101010101010101010101010101"

[events]
channel_capacity = 0
"#,
        );

        let err = WalletConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("channel_capacity"));
    }

    #[test]
    fn test_rejects_oversized_capacity() {
        let file = write_config(
            r#"
[wallet]
address = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
owner = "0x0101010101010101010101010101010101010101"

[events]
channel_capacity = 65537
"#,
        );

        let err = WalletConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("cannot exceed 65536"));
    }

    #[test]
    fn test_rejects_zero_owner() {
        let file = write_config(
            r#"
[wallet]
address = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
owner = "0x0000000000000000000000000000000000000000"
"#,
        );

        let err = WalletConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("wallet.owner"));
    }

    #[test]
    fn test_rejects_zero_admin() {
        let file = write_config(
            r#"
[wallet]
address = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
owner = "0x0101010101010101010101010101010101010101"
admin = "0x0000000000000000000000000000000000000000"
"#,
        );

        let err = WalletConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("wallet.admin"));
    }

    #[test]
    fn test_summary_marks_default_admin() {
        let config = WalletConfig::new(Address::new([0xee; 20]), Address::new([0x01; 20]));
        let summary = config.summary();
        assert!(summary.contains("admin: (owner)"));
        assert!(summary.contains("channel_capacity: 256"));
    }
}
