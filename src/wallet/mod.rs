//! Wallet state consumed by the send form
//!
//! Wallets and their addresses are read-only snapshots:
//! - `types` defines the snapshots and droplet conversion
//! - `filter` narrows a wallet to its spendable addresses
//! - `registry` supplies wallets from a wallets.json file

pub mod filter;
pub mod registry;
pub mod types;

pub use filter::filter_spendable;
pub use registry::{WalletRegistry, WalletSource};
pub use types::{coins_to_droplets, droplets_to_coins, Address, Wallet, DROPLETS_PER_COIN};
