//! Managed wallet - role-gated custody
//!
//! Holds a balance on behalf of an owner. Every value-moving operation is
//! gated by exactly one role:
//!
//! | Operation            | Role  |
//! |----------------------|-------|
//! | `receive`            | none  |
//! | `withdraw`           | owner |
//! | `change_admin`       | owner |
//! | `transfer_ownership` | owner |
//! | `withdraw_admin`     | admin |
//! | `transfer_to_bridge` | admin |
//! | `transfer_to_user`   | admin |
//!
//! All state lives behind one lock. Role checks, balance checks and the
//! commit happen in the same critical section, so a failed operation never
//! leaves a partial debit behind. Bridge calls run with the lock released:
//! the debit is applied first and credited back if the bridge refuses.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::config::WalletConfig;
use crate::error::{Error, Result};

use super::bridge::{Bridge, BridgeDeposit};
use super::events::{EventBus, TransferRecord, WalletEvent};
use super::ledger::Ledger;
use super::types::{Address, BtcTxHash, Role, WalletSnapshot, Wei};

/// Default capacity of the event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct WalletState {
    owner: Address,
    admin: Address,
    balance: Wei,
    /// Debited for bridge calls that have not returned yet
    in_flight: Wei,
}

impl WalletState {
    fn holder(&self, role: Role) -> Address {
        match role {
            Role::Owner => self.owner,
            Role::Admin => self.admin,
        }
    }

    fn require(&self, role: Role, caller: &Address) -> Result<()> {
        if self.holder(role) == *caller {
            Ok(())
        } else {
            Err(Error::Unauthorized {
                role,
                caller: *caller,
            })
        }
    }

    /// Balance after adding `amount`, leaving room to roll back in-flight debits
    fn staged_credit(&self, amount: Wei) -> Result<Wei> {
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(Error::BalanceOverflow)?;
        balance
            .checked_add(self.in_flight)
            .ok_or(Error::BalanceOverflow)?;
        Ok(balance)
    }

    /// Balance after removing `amount`, without applying it
    fn staged_debit(&self, amount: Wei) -> Result<Wei> {
        self.balance
            .checked_sub(amount)
            .ok_or(Error::InsufficientFunds {
                available: self.balance,
                requested: amount,
            })
    }
}

/// Custodial wallet with owner and admin roles
pub struct ManagedWallet {
    /// The wallet's own address
    address: Address,

    state: Mutex<WalletState>,

    /// Where payouts are credited
    ledger: Arc<dyn Ledger>,

    events: EventBus,
}

impl ManagedWallet {
    /// Create a wallet whose admin is the owner
    pub fn new(address: Address, owner: Address, ledger: Arc<dyn Ledger>) -> Result<Self> {
        Self::with_roles(address, owner, owner, ledger, DEFAULT_EVENT_CAPACITY)
    }

    /// Create a wallet from configuration
    pub fn from_config(config: &WalletConfig, ledger: Arc<dyn Ledger>) -> Result<Self> {
        let owner = config.wallet.owner;
        let admin = config.wallet.admin.unwrap_or(owner);
        Self::with_roles(
            config.wallet.address,
            owner,
            admin,
            ledger,
            config.events.channel_capacity,
        )
    }

    fn with_roles(
        address: Address,
        owner: Address,
        admin: Address,
        ledger: Arc<dyn Ledger>,
        event_capacity: usize,
    ) -> Result<Self> {
        require_identity(Role::Owner, &owner)?;
        require_identity(Role::Admin, &admin)?;

        info!(
            "Managed wallet {} created (owner: {}, admin: {})",
            address, owner, admin
        );

        Ok(Self {
            address,
            state: Mutex::new(WalletState {
                owner,
                admin,
                balance: 0,
                in_flight: 0,
            }),
            ledger,
            events: EventBus::new(event_capacity),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn owner(&self) -> Address {
        self.state.lock().await.owner
    }

    pub async fn admin(&self) -> Address {
        self.state.lock().await.admin
    }

    /// Balance held by the wallet in wei
    pub async fn balance(&self) -> Wei {
        self.state.lock().await.balance
    }

    pub async fn snapshot(&self) -> WalletSnapshot {
        let state = self.state.lock().await;
        WalletSnapshot {
            address: self.address,
            owner: state.owner,
            admin: state.admin,
            balance: state.balance,
        }
    }

    /// Subscribe to wallet events
    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    /// Accept funds from anyone
    ///
    /// Returns the new balance.
    pub async fn receive(&self, from: Address, amount: Wei) -> Result<Wei> {
        let mut state = self.state.lock().await;
        let balance = state.staged_credit(amount)?;
        state.balance = balance;

        info!("Received {} wei from {} (balance: {})", amount, from, balance);
        Ok(balance)
    }

    /// Withdraw to the owner
    pub async fn withdraw(&self, amount: Wei, caller: Address) -> Result<()> {
        let mut state = self.state.lock().await;
        self.authorize(&state, Role::Owner, &caller, "withdraw")?;

        let owner = state.owner;
        self.pay_out(&mut state, &owner, amount)?;

        info!(
            "Owner {} withdrew {} wei (balance: {})",
            owner, amount, state.balance
        );
        Ok(())
    }

    /// Withdraw to an arbitrary recipient on the owner's behalf
    pub async fn withdraw_admin(
        &self,
        recipient: Address,
        amount: Wei,
        caller: Address,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        self.authorize(&state, Role::Admin, &caller, "withdraw_admin")?;

        self.pay_out(&mut state, &recipient, amount)?;

        info!(
            "Admin {} withdrew {} wei to {} (balance: {})",
            caller, amount, recipient, state.balance
        );
        Ok(())
    }

    /// Reassign the admin role
    pub async fn change_admin(&self, new_admin: Address, caller: Address) -> Result<()> {
        let mut state = self.state.lock().await;
        self.authorize(&state, Role::Owner, &caller, "change_admin")?;
        require_identity(Role::Admin, &new_admin)?;

        let previous = std::mem::replace(&mut state.admin, new_admin);
        info!("Admin changed: {} -> {}", previous, new_admin);
        Ok(())
    }

    /// Reassign the owner role
    ///
    /// The admin is not touched.
    pub async fn transfer_ownership(&self, new_owner: Address, caller: Address) -> Result<()> {
        let mut state = self.state.lock().await;
        self.authorize(&state, Role::Owner, &caller, "transfer_ownership")?;
        require_identity(Role::Owner, &new_owner)?;

        let previous = std::mem::replace(&mut state.owner, new_owner);
        info!("Ownership transferred: {} -> {}", previous, new_owner);
        Ok(())
    }

    /// Forward value and a payload to a bridge
    ///
    /// The debit is applied before the bridge runs, with the wallet lock
    /// released, so the bridge may call back into this wallet. A rejected
    /// deposit is credited back.
    pub async fn transfer_to_bridge(
        &self,
        bridge: &dyn Bridge,
        user_ref: Address,
        amount: Wei,
        payload: Vec<u8>,
        caller: Address,
    ) -> Result<()> {
        let bridge_address = bridge.address();

        {
            let mut state = self.state.lock().await;
            self.authorize(&state, Role::Admin, &caller, "transfer_to_bridge")?;

            let remaining = state.staged_debit(amount)?;
            let in_flight = state
                .in_flight
                .checked_add(amount)
                .ok_or(Error::BalanceOverflow)?;
            state.balance = remaining;
            state.in_flight = in_flight;
        }

        debug!(
            "Forwarding {} wei to bridge {} for {} ({} payload bytes)",
            amount,
            bridge_address,
            user_ref,
            payload.len()
        );

        let deposit = BridgeDeposit {
            from: self.address,
            user_ref,
            amount,
            payload,
        };
        let outcome = bridge.accept(deposit).await;

        let mut state = self.state.lock().await;
        state.in_flight -= amount;

        if let Err(rejection) = outcome {
            // in_flight was counted against every credit made meanwhile
            state.balance = state
                .balance
                .checked_add(amount)
                .ok_or(Error::BalanceOverflow)?;
            warn!(
                "Bridge {} rejected {} wei for {}: {} (balance restored: {})",
                bridge_address, amount, user_ref, rejection, state.balance
            );
            return Err(Error::TransferRejected(rejection.0));
        }

        info!(
            "Transferred {} wei to bridge {} for {} (balance: {})",
            amount, bridge_address, user_ref, state.balance
        );
        Ok(())
    }

    /// Release value to a user for an incoming bitcoin transfer
    ///
    /// `fee` is recorded in the event but not debited. The `(btc_tx_hash,
    /// btc_tx_vout)` pair is not checked for reuse.
    pub async fn transfer_to_user(
        &self,
        recipient: Address,
        amount: Wei,
        fee: Wei,
        btc_tx_hash: BtcTxHash,
        btc_tx_vout: u32,
        caller: Address,
    ) -> Result<TransferRecord> {
        let mut state = self.state.lock().await;
        self.authorize(&state, Role::Admin, &caller, "transfer_to_user")?;

        self.pay_out(&mut state, &recipient, amount)?;

        let record = TransferRecord {
            rsk_address: recipient,
            amount_wei: amount,
            fee_wei: fee,
            btc_tx_hash,
            btc_tx_vout,
        };

        info!(
            "Released {} wei (fee {}) to {} for btc tx {}:{} (balance: {})",
            amount, fee, recipient, btc_tx_hash, btc_tx_vout, state.balance
        );

        // Still under the lock so observers see events in commit order
        self.events
            .publish(WalletEvent::NewBitcoinTransferIncoming(record.clone()));

        Ok(record)
    }

    fn authorize(
        &self,
        state: &WalletState,
        role: Role,
        caller: &Address,
        operation: &str,
    ) -> Result<()> {
        state.require(role, caller).inspect_err(|_| {
            warn!(
                "Rejected {} on {}: {} is not the {}",
                operation, self.address, caller, role
            );
        })
    }

    /// Debit the wallet and credit `recipient` on the ledger
    fn pay_out(&self, state: &mut WalletState, recipient: &Address, amount: Wei) -> Result<()> {
        let remaining = state.staged_debit(amount).inspect_err(|e| {
            warn!("Payout of {} wei to {} refused: {}", amount, recipient, e);
        })?;

        self.ledger.credit(recipient, amount)?;
        state.balance = remaining;
        Ok(())
    }
}

/// Roles must always be held by a real account
fn require_identity(role: Role, holder: &Address) -> Result<()> {
    if holder.is_zero() {
        warn!("Refusing zero address as {}", role);
        return Err(Error::InvalidAddress(format!(
            "{} cannot be the zero address",
            role
        )));
    }
    Ok(())
}

impl std::fmt::Debug for ManagedWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedWallet")
            .field("address", &self.address)
            .field("observers", &self.events.observer_count())
            .finish_non_exhaustive()
    }
}
