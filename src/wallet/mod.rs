//! Managed wallet module
//!
//! Custody of a single balance on behalf of an owner, with an admin that
//! disburses funds and releases bridge transfers.
//!
//! # Architecture
//!
//! ```text
//!                ┌──────────── Bridge (transfer_to_bridge)
//!                │
//! ManagedWallet ─┼──────────── Ledger (payouts)
//!                │
//!                └──────────── EventBus → NewBitcoinTransferIncoming
//! ```
//!
//! # Roles
//!
//! - Owner: withdraws to itself, reassigns both roles
//! - Admin: pays out to third parties, transfers to bridge and users

pub mod bridge;
pub mod events;
pub mod ledger;
pub mod managed;
pub mod types;

pub use bridge::{Bridge, BridgeDeposit, BridgeRejection, LedgerBridge};
pub use events::{EventBus, TransferRecord, WalletEvent};
pub use ledger::{InMemoryLedger, Ledger};
pub use managed::ManagedWallet;
pub use types::{rbtc_to_wei, Address, BtcTxHash, Role, WalletSnapshot, Wei, WEI_PER_RBTC};
