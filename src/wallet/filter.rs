//! Spendable address filtering

use super::types::Address;

/// Keep only addresses holding a positive coin balance, in their original order
pub fn filter_spendable(addresses: &[Address]) -> Vec<Address> {
    addresses
        .iter()
        .filter(|a| a.is_spendable())
        .cloned()
        .collect()
}
