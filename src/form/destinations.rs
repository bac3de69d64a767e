//! Destination list management
//!
//! Destinations are edited as raw text, exactly as typed, and only parsed
//! when totals are computed or the list is validated.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::wallet::types::{coins_to_droplets, MAX_COIN_DECIMALS};

use super::hours::HoursPolicy;
use super::numeric::{decimal_units_ceil, parse_float, parse_int};

/// Droplets a coin field draws from the budget, rounded up to a whole droplet.
///
/// Unparseable or non-positive text counts as zero; unbounded values saturate.
pub(crate) fn requested_droplets(raw: &str) -> u64 {
    if let Some(droplets) = decimal_units_ceil(raw, MAX_COIN_DECIMALS as u32) {
        return droplets;
    }
    match parse_float(raw) {
        Some(v) if v.is_infinite() && v > 0.0 => u64::MAX,
        Some(v) => coins_to_droplets(v),
        None => 0,
    }
}

/// A single payment line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// Recipient address
    #[serde(default)]
    pub address: String,

    /// Coin amount as entered
    #[serde(default)]
    pub coins: String,

    /// Hour amount as entered (only meaningful under manual hours)
    #[serde(default)]
    pub hours: String,
}

impl Destination {
    pub fn new(
        address: impl Into<String>,
        coins: impl Into<String>,
        hours: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            coins: coins.into(),
            hours: hours.into(),
        }
    }

    /// Parse a `address:coins[:hours]` command-line spec
    pub fn parse_spec(spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.split(':').collect();
        match parts.as_slice() {
            [address, coins] if !address.is_empty() => Ok(Self::new(*address, *coins, "")),
            [address, coins, hours] if !address.is_empty() => {
                Ok(Self::new(*address, *coins, *hours))
            }
            _ => Err(Error::InvalidDestination(format!(
                "expected address:coins[:hours], got '{}'",
                spec
            ))),
        }
    }
}

/// Destination as sent to the transaction service
///
/// `hours` is omitted entirely under automatic hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationPayload {
    pub address: String,
    pub coins: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
}

/// Ordered, never-empty list of destinations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationList {
    entries: Vec<Destination>,
}

impl Default for DestinationList {
    fn default() -> Self {
        Self::new()
    }
}

impl DestinationList {
    /// Create a list holding one empty destination
    pub fn new() -> Self {
        Self {
            entries: vec![Destination::default()],
        }
    }

    /// Create a list from existing entries; an empty input yields one empty entry
    pub fn from_entries(entries: Vec<Destination>) -> Self {
        if entries.is_empty() {
            return Self::new();
        }
        Self { entries }
    }

    /// Append an empty destination
    pub fn add_destination(&mut self) {
        self.entries.push(Destination::default());
        debug!("Added destination, {} total", self.entries.len());
    }

    /// Remove the destination at `index`
    ///
    /// The last remaining entry can never be removed.
    pub fn remove_destination(&mut self, index: usize) -> Result<Destination> {
        if index >= self.entries.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        if self.entries.len() == 1 {
            return Err(Error::LastDestination);
        }

        let removed = self.entries.remove(index);
        debug!("Removed destination {}, {} left", index, self.entries.len());
        Ok(removed)
    }

    pub fn get(&self, index: usize) -> Option<&Destination> {
        self.entries.get(index)
    }

    /// Mutable access for in-place edits
    pub fn get_mut(&mut self, index: usize) -> Result<&mut Destination> {
        let len = self.entries.len();
        self.entries
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Destination> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Destination] {
        &self.entries
    }

    /// Total requested coins in droplets; unparseable entries count as zero
    pub fn total_droplets(&self) -> u64 {
        self.entries
            .iter()
            .map(|d| requested_droplets(&d.coins))
            .fold(0u64, u64::saturating_add)
    }

    /// Sum of the coin fields as entered; unparseable entries are skipped
    pub fn total_coins(&self) -> f64 {
        self.entries
            .iter()
            .filter_map(|d| parse_float(&d.coins))
            .sum()
    }

    /// Total requested hours; zero under automatic hours
    pub fn total_hours(&self, policy: &HoursPolicy) -> u64 {
        if policy.is_auto() {
            return 0;
        }
        self.entries
            .iter()
            .filter_map(|d| parse_int(&d.hours))
            .filter(|h| *h > 0.0)
            .map(|h| h as u64)
            .fold(0u64, u64::saturating_add)
    }

    /// Recipient addresses in list order
    pub fn recipients(&self) -> Vec<String> {
        self.entries.iter().map(|d| d.address.clone()).collect()
    }

    /// Resolve entries into the outgoing payload, dropping hours under automatic hours
    pub fn to_payload(&self, policy: &HoursPolicy) -> Vec<DestinationPayload> {
        let manual = !policy.is_auto();
        self.entries
            .iter()
            .map(|d| DestinationPayload {
                address: d.address.clone(),
                coins: d.coins.clone(),
                hours: manual.then(|| d.hours.clone()),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a DestinationList {
    type Item = &'a Destination;
    type IntoIter = std::slice::Iter<'a, Destination>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
