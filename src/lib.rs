//! Managed Wallet Library
//!
//! Role-gated custodial wallet with owner/admin separation and RSK bridge
//! notifications.

pub mod config;
pub mod error;
pub mod logging;
pub mod wallet;

// Re-export commonly used types
pub use config::WalletConfig;
pub use error::{Error, Result};
pub use wallet::{Address, BtcTxHash, ManagedWallet, Role, Wei};
