//! Wallet events
//!
//! Events are published on a broadcast channel after the state change
//! they describe has been committed.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::error::Result;

use super::types::{Address, BtcTxHash, Wei};

/// Disbursement correlated to a bitcoin transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    /// Recipient of the released value
    pub rsk_address: Address,

    /// Amount moved to the recipient
    pub amount_wei: Wei,

    /// Fee charged upstream, recorded for audit only
    pub fee_wei: Wei,

    /// Originating bitcoin transaction
    pub btc_tx_hash: BtcTxHash,

    /// Output index within the bitcoin transaction
    pub btc_tx_vout: u32,
}

/// Event emitted by a managed wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum WalletEvent {
    NewBitcoinTransferIncoming(TransferRecord),
}

impl WalletEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WalletEvent::NewBitcoinTransferIncoming(_) => "NewBitcoinTransferIncoming",
        }
    }

    /// JSON form delivered to external monitors
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Fan-out of wallet events to any number of observers
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WalletEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, crate::config::MAX_CHANNEL_CAPACITY);
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.sender.subscribe()
    }

    /// Publish an event, returning how many observers received it
    pub fn publish(&self, event: WalletEvent) -> usize {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!("Published {} to {} observers", name, receivers);
                receivers
            }
            Err(_) => {
                trace!("Published {} with no observers", name);
                0
            }
        }
    }

    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> TransferRecord {
        TransferRecord {
            rsk_address: Address::new([0x22; 20]),
            amount_wei: 100_000_000_000_000_000,
            fee_wei: 123,
            btc_tx_hash: BtcTxHash::new([0xab; 32]),
            btc_tx_vout: 2,
        }
    }

    #[test]
    fn test_event_json_shape() {
        let event = WalletEvent::NewBitcoinTransferIncoming(sample_record());
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["event"], "NewBitcoinTransferIncoming");
        assert_eq!(
            value["rskAddress"],
            "0x2222222222222222222222222222222222222222"
        );
        assert_eq!(value["feeWei"], 123);
        assert_eq!(value["btcTxVout"], 2);
        assert_eq!(value["btcTxHash"], format!("0x{}", "ab".repeat(32)));
    }

    #[test]
    fn test_to_json_keeps_full_amount() {
        let mut record = sample_record();
        record.amount_wei = 25 * 1_000_000_000_000_000_000;
        let json = WalletEvent::NewBitcoinTransferIncoming(record).to_json().unwrap();

        assert!(json.starts_with(r#"{"event":"NewBitcoinTransferIncoming""#));
        assert!(json.contains(r#""amountWei":25000000000000000000"#));
    }

    #[tokio::test]
    async fn test_publish_reaches_every_observer() {
        let bus = EventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.observer_count(), 2);

        let event = WalletEvent::NewBitcoinTransferIncoming(sample_record());
        assert_eq!(bus.publish(event.clone()), 2);

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn test_publish_without_observers() {
        let bus = EventBus::new(8);
        let event = WalletEvent::NewBitcoinTransferIncoming(sample_record());
        assert_eq!(bus.publish(event), 0);
    }

    #[test]
    fn test_capacity_is_clamped() {
        // broadcast::channel panics on 0 and on capacities above usize::MAX / 2
        for capacity in [0, usize::MAX] {
            let bus = EventBus::new(capacity);
            let _rx = bus.subscribe();
            let event = WalletEvent::NewBitcoinTransferIncoming(sample_record());
            assert_eq!(bus.publish(event), 1);
        }
    }
}
