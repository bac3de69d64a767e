//! Transaction model returned by the transaction service
//!
//! Mirrors the coin package layout: a transaction spends inputs (previous
//! outputs, by uxid) and creates outputs, each paying coins and hours to an
//! address. Amounts arrive as decimal strings.

use serde::{Deserialize, Serialize};

use crate::form::numeric::{parse_float, parse_int};
use crate::wallet::types::{coins_to_droplets, droplets_to_coins};

/// Output spent by the transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub uxid: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub coins: String,
    #[serde(default)]
    pub hours: String,
    /// Hours including those accrued since the output was created
    #[serde(default)]
    pub calculated_hours: String,
}

/// Output created by the transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    #[serde(default)]
    pub uxid: String,
    pub address: String,
    pub coins: String,
    #[serde(default)]
    pub hours: String,
}

/// Unsigned-or-signed transaction built by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub txid: String,
    #[serde(default)]
    pub inner_hash: String,
    /// Hours burned as fee
    #[serde(default)]
    pub fee: String,
    #[serde(default)]
    pub inputs: Vec<TransactionInput>,
    #[serde(default)]
    pub outputs: Vec<TransactionOutput>,
    /// Hex-encoded serialized transaction
    #[serde(default)]
    pub encoded: String,
}

impl Transaction {
    /// Total coins across all outputs
    pub fn total_coins(&self) -> f64 {
        droplets_to_coins(
            self.outputs
                .iter()
                .filter_map(|o| parse_float(&o.coins))
                .map(coins_to_droplets)
                .sum(),
        )
    }

    /// Total hours across all outputs
    pub fn total_hours(&self) -> u64 {
        self.outputs
            .iter()
            .filter_map(|o| parse_int(&o.hours))
            .filter(|h| *h > 0.0)
            .map(|h| h as u64)
            .sum()
    }

    /// Outputs paying to the given address
    pub fn outputs_to<'a>(
        &'a self,
        address: &'a str,
    ) -> impl Iterator<Item = &'a TransactionOutput> {
        self.outputs.iter().filter(move |o| o.address == address)
    }

    /// Coins paid to addresses outside `recipients` (change)
    pub fn change_coins(&self, recipients: &[String]) -> f64 {
        droplets_to_coins(
            self.outputs
                .iter()
                .filter(|o| !recipients.contains(&o.address))
                .filter_map(|o| parse_float(&o.coins))
                .map(coins_to_droplets)
                .sum(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(address: &str, coins: &str, hours: &str) -> TransactionOutput {
        TransactionOutput {
            uxid: String::new(),
            address: address.to_string(),
            coins: coins.to_string(),
            hours: hours.to_string(),
        }
    }

    #[test]
    fn test_totals() {
        let tx = Transaction {
            txid: "ab".to_string(),
            inner_hash: String::new(),
            fee: "10".to_string(),
            inputs: vec![],
            outputs: vec![
                output("X", "5.000000", "20"),
                output("X", "0.100000", "1"),
                output("change", "4.900000", "19"),
            ],
            encoded: String::new(),
        };

        assert_eq!(tx.total_coins(), 10.0);
        assert_eq!(tx.total_hours(), 40);
        assert_eq!(tx.outputs_to("X").count(), 2);
        assert_eq!(tx.change_coins(&["X".to_string()]), 4.9);
    }

    #[test]
    fn test_deserialize_minimal() {
        let json = r#"{"txid":"ff","outputs":[{"address":"a","coins":"1"}]}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.outputs[0].hours, "");
        assert!(tx.inputs.is_empty());
    }
}
