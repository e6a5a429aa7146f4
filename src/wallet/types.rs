//! Core types for the managed wallet
//!
//! Defines account identities, amounts, bitcoin transaction references
//! and the two wallet roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Amount in wei (1 RBTC = 10^18 wei)
pub type Wei = u128;

/// Wei per whole RBTC
pub const WEI_PER_RBTC: Wei = 1_000_000_000_000_000_000;

const RBTC_DECIMALS: usize = 18;

/// 20-byte account identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = strip_hex_prefix(s.trim());
        if digits.len() != 40 {
            return Err(Error::InvalidAddress(format!(
                "expected 40 hex digits, got {} in {:?}",
                digits.len(),
                s
            )));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| Error::InvalidAddress(format!("{:?}: {}", s, e)))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Hash of the originating bitcoin transaction
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BtcTxHash([u8; 32]);

impl BtcTxHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for BtcTxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for BtcTxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BtcTxHash({})", self)
    }
}

impl FromStr for BtcTxHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = strip_hex_prefix(s.trim());
        if digits.len() != 64 {
            return Err(Error::InvalidTxHash(format!(
                "expected 64 hex digits, got {}",
                digits.len()
            )));
        }

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| Error::InvalidTxHash(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 32]> for BtcTxHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for BtcTxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BtcTxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Wallet role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Withdraws to itself and reassigns roles
    Owner,

    /// Disburses to third parties and performs bridge/user transfers
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Point-in-time copy of the wallet state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    /// The wallet's own address
    pub address: Address,
    pub owner: Address,
    pub admin: Address,
    /// Balance held by the wallet in wei
    pub balance: Wei,
}

/// Convert a decimal RBTC amount (e.g. "0.1") to wei
pub fn rbtc_to_wei(amount: &str) -> Result<Wei> {
    let amount = amount.trim();
    let (whole, frac) = match amount.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (amount, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(Error::InvalidAmount(format!("{:?}", amount)));
    }
    if frac.len() > RBTC_DECIMALS {
        return Err(Error::InvalidAmount(format!(
            "{:?} has more than {} decimals",
            amount, RBTC_DECIMALS
        )));
    }
    if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidAmount(format!("{:?}", amount)));
    }

    let whole_wei = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<Wei>()
            .map_err(|e| Error::InvalidAmount(e.to_string()))?
            .checked_mul(WEI_PER_RBTC)
            .ok_or_else(|| Error::InvalidAmount(format!("{:?} is too large", amount)))?
    };

    let frac_wei = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = RBTC_DECIMALS);
        padded
            .parse::<Wei>()
            .map_err(|e| Error::InvalidAmount(e.to_string()))?
    };

    whole_wei
        .checked_add(frac_wei)
        .ok_or_else(|| Error::InvalidAmount(format!("{:?} is too large", amount)))
}
