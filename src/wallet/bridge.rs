//! Bridge collaborator
//!
//! The wallet forwards value to a bridge contract with an opaque payload.
//! The bridge's own accounting is not interpreted here.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ledger::Ledger;
use super::types::{Address, Wei};

/// Value transfer handed to a bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeDeposit {
    /// Wallet sending the value
    pub from: Address,

    /// User the bridge should account the deposit to
    pub user_ref: Address,

    /// Amount in wei
    pub amount: Wei,

    /// Opaque call data for the bridge
    pub payload: Vec<u8>,
}

/// Reason a bridge declined a deposit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRejection(pub String);

impl std::fmt::Display for BridgeRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BridgeRejection {}

/// Target that accepts value transfers with a payload
///
/// The sending wallet has already debited the deposit and released its
/// lock when `accept` runs, so implementations may call back into it.
/// Returning a rejection makes the wallet credit the deposit back.
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Address of the bridge contract
    fn address(&self) -> Address;

    /// Accept or reject an incoming deposit
    async fn accept(&self, deposit: BridgeDeposit) -> Result<(), BridgeRejection>;
}

/// Bridge that books accepted deposits to its own ledger account
pub struct LedgerBridge {
    address: Address,
    ledger: Arc<dyn Ledger>,
}

impl LedgerBridge {
    pub fn new(address: Address, ledger: Arc<dyn Ledger>) -> Self {
        Self { address, ledger }
    }
}

#[async_trait]
impl Bridge for LedgerBridge {
    fn address(&self) -> Address {
        self.address
    }

    async fn accept(&self, deposit: BridgeDeposit) -> Result<(), BridgeRejection> {
        self.ledger
            .credit(&self.address, deposit.amount)
            .map_err(|e| BridgeRejection(e.to_string()))?;

        info!(
            "Bridge {} accepted {} wei for {} ({} payload bytes)",
            self.address,
            deposit.amount,
            deposit.user_ref,
            deposit.payload.len()
        );
        Ok(())
    }
}
