//! Core types for wallet state
//!
//! Defines the wallet and address snapshots the send form reads from.
//! Both are supplied externally and never mutated by the form.

use serde::{Deserialize, Serialize};

/// Smallest coin unit: 1 coin = 1_000_000 droplets
pub const DROPLETS_PER_COIN: u64 = 1_000_000;

/// Maximum number of decimal places a coin amount may carry
pub const MAX_COIN_DECIMALS: usize = 6;

/// Convert a coin amount to droplets, rounding to the nearest droplet.
///
/// Negative and non-finite amounts map to zero.
pub fn coins_to_droplets(coins: f64) -> u64 {
    if !coins.is_finite() || coins <= 0.0 {
        return 0;
    }
    (coins * DROPLETS_PER_COIN as f64).round() as u64
}

/// Convert droplets back to a coin amount
pub fn droplets_to_coins(droplets: u64) -> f64 {
    droplets as f64 / DROPLETS_PER_COIN as f64
}

/// Address snapshot with its current balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Address identifier
    pub address: String,

    /// Coin balance
    #[serde(default)]
    pub coins: f64,

    /// Coin-hour balance
    #[serde(default)]
    pub hours: u64,
}

impl Address {
    pub fn new(address: impl Into<String>, coins: f64, hours: u64) -> Self {
        Self {
            address: address.into(),
            coins,
            hours,
        }
    }

    /// Addresses are the same entry when their identifiers match, whatever the balance
    pub fn same_address(&self, other: &Address) -> bool {
        self.address == other.address
    }

    /// Check if this address holds any coins
    pub fn is_spendable(&self) -> bool {
        self.coins > 0.0
    }

    /// Coin balance in droplets
    pub fn droplets(&self) -> u64 {
        coins_to_droplets(self.coins)
    }
}

/// Wallet snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Wallet identifier used by the transaction service (e.g. "2017_11_25_e5fb.wlt")
    pub id: String,

    /// Human-readable name
    #[serde(default)]
    pub label: String,

    /// Whether a secret is needed to spend from this wallet
    #[serde(default)]
    pub encrypted: bool,

    /// Addresses in wallet order
    #[serde(default)]
    pub addresses: Vec<Address>,
}

impl Wallet {
    /// Total coin balance across all addresses
    pub fn total_coins(&self) -> f64 {
        droplets_to_coins(self.addresses.iter().map(Address::droplets).sum())
    }

    /// Total coin-hour balance across all addresses
    pub fn total_hours(&self) -> u64 {
        self.addresses.iter().map(|a| a.hours).sum()
    }

    /// Find an address by identifier
    pub fn find_address(&self, address: &str) -> Option<&Address> {
        self.addresses.iter().find(|a| a.address == address)
    }
}

impl std::fmt::Display for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.label.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.label, self.id)
        }
    }
}

/// Wallet registry file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRegistryFile {
    /// Registry format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Wallet snapshots
    #[serde(default)]
    pub wallets: Vec<Wallet>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for WalletRegistryFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            wallets: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_droplet_conversion() {
        assert_eq!(coins_to_droplets(1.0), 1_000_000);
        assert_eq!(coins_to_droplets(0.000001), 1);
        assert_eq!(coins_to_droplets(0.1) + coins_to_droplets(0.2), coins_to_droplets(0.3));
        assert_eq!(coins_to_droplets(-5.0), 0);
        assert_eq!(coins_to_droplets(f64::NAN), 0);
        assert_eq!(droplets_to_coins(2_500_000), 2.5);
    }

    #[test]
    fn test_wallet_totals() {
        let wallet = Wallet {
            id: "w.wlt".to_string(),
            label: "Main".to_string(),
            encrypted: false,
            addresses: vec![Address::new("a", 1.5, 10), Address::new("b", 2.25, 5)],
        };

        assert_eq!(wallet.total_coins(), 3.75);
        assert_eq!(wallet.total_hours(), 15);
        assert!(wallet.find_address("b").is_some());
        assert!(wallet.find_address("c").is_none());
        assert_eq!(wallet.to_string(), "Main (w.wlt)");
    }

    #[test]
    fn test_same_address_ignores_balance() {
        let a = Address::new("2GgFvqoyk9RjwVzj8tqfcXVXB4orBwoc9qv", 1.0, 1);
        let b = Address::new("2GgFvqoyk9RjwVzj8tqfcXVXB4orBwoc9qv", 9.0, 0);
        assert!(a.same_address(&b));
    }

    #[test]
    fn test_registry_deserialize_defaults() {
        let json = r#"{"wallets":[{"id":"x.wlt","addresses":[{"address":"a","coins":3}]}]}"#;
        let file: WalletRegistryFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.version, "1.0");
        assert!(!file.wallets[0].encrypted);
        assert_eq!(file.wallets[0].addresses[0].hours, 0);
    }
}
