//! Error types for the managed wallet

use thiserror::Error;

use crate::wallet::types::{Address, Role, Wei};

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the managed wallet
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Authorization errors
    #[error("Unauthorized: {caller} does not hold the {role} role")]
    Unauthorized { role: Role, caller: Address },

    // Funds errors
    #[error("Insufficient funds: {available} wei available, {requested} wei requested")]
    InsufficientFunds { available: Wei, requested: Wei },

    #[error("Balance overflow")]
    BalanceOverflow,

    // Bridge errors
    #[error("Bridge rejected transfer: {0}")]
    TransferRejected(String),

    // Parse errors
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid bitcoin transaction hash: {0}")]
    InvalidTxHash(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Check if the caller was rejected because of its role
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, Error::Unauthorized { .. })
    }

    /// Check if the operation was rejected because of the wallet balance
    pub fn is_funds_failure(&self) -> bool {
        matches!(
            self,
            Error::InsufficientFunds { .. } | Error::BalanceOverflow
        )
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classification() {
        let unauthorized = Error::Unauthorized {
            role: Role::Owner,
            caller: Address::ZERO,
        };
        assert!(unauthorized.is_authorization_failure());
        assert!(!unauthorized.is_funds_failure());

        let short = Error::InsufficientFunds {
            available: 1,
            requested: 2,
        };
        assert!(short.is_funds_failure());
        assert!(!short.is_authorization_failure());

        assert!(!Error::TransferRejected("paused".into()).is_funds_failure());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::InsufficientFunds {
            available: 10,
            requested: 20,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: 10 wei available, 20 wei requested"
        );

        let err = Error::Unauthorized {
            role: Role::Admin,
            caller: Address::ZERO,
        };
        assert_eq!(
            err.to_string(),
            "Unauthorized: 0x0000000000000000000000000000000000000000 does not hold the admin role"
        );
    }
}
