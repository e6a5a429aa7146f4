//! External account balances
//!
//! The ledger is the host environment's record of balances held outside
//! the wallet. Payouts from the wallet land here.

use dashmap::DashMap;
use tracing::debug;

use crate::error::{Error, Result};

use super::types::{Address, Wei};

/// Balances of accounts outside the wallet
pub trait Ledger: Send + Sync {
    /// Credit `amount` to `account`
    fn credit(&self, account: &Address, amount: Wei) -> Result<()>;

    /// Current balance of `account`
    fn balance_of(&self, account: &Address) -> Wei;
}

/// Ledger kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: DashMap<Address, Wei>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the balance of an account
    pub fn set_balance(&self, account: Address, amount: Wei) {
        self.balances.insert(account, amount);
    }

    /// Number of accounts with a recorded balance
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

impl Ledger for InMemoryLedger {
    fn credit(&self, account: &Address, amount: Wei) -> Result<()> {
        let mut entry = self.balances.entry(*account).or_insert(0);
        let updated = entry.checked_add(amount).ok_or(Error::BalanceOverflow)?;
        *entry = updated;
        debug!("Ledger credit: {} wei to {} (now {})", amount, account, updated);
        Ok(())
    }

    fn balance_of(&self, account: &Address) -> Wei {
        self.balances.get(account).map(|b| *b).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_accumulates() {
        let ledger = InMemoryLedger::new();
        let acc = Address::new([1; 20]);

        assert_eq!(ledger.balance_of(&acc), 0);
        ledger.credit(&acc, 100).unwrap();
        ledger.credit(&acc, 50).unwrap();
        assert_eq!(ledger.balance_of(&acc), 150);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_credit_overflow_leaves_balance() {
        let ledger = InMemoryLedger::new();
        let acc = Address::new([2; 20]);
        ledger.set_balance(acc, Wei::MAX);

        assert_eq!(ledger.credit(&acc, 1), Err(Error::BalanceOverflow));
        assert_eq!(ledger.balance_of(&acc), Wei::MAX);
    }
}
