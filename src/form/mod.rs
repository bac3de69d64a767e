//! Advanced send form
//!
//! Holds everything the user edits before a transaction is requested:
//!
//! ```text
//! Wallet ─► filter_spendable ─► selected addresses ─┐
//!                                                    ├─► validate ─► ValidationResult
//! DestinationList + HoursPolicy ────────────────────┘
//! ```
//!
//! Every mutation re-runs validation, so [`SendForm::validation`] always
//! reflects the current state.

pub mod destinations;
pub mod hours;
pub mod numeric;
pub mod validator;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::wallet::filter::filter_spendable;
use crate::wallet::types::{Address, Wallet};

pub use destinations::{Destination, DestinationList, DestinationPayload};
pub use hours::{AutoHoursMode, HoursPolicy, HoursSelection, DEFAULT_SHARE_FACTOR};
pub use validator::{validate, Field, InvalidReason, ValidationResult};

/// Separator used when listing selected addresses
pub const ADDRESS_LABEL_SEPARATOR: &str = " \u{2022} ";

/// Snapshot of a form as it was submitted; enough to restore it for editing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSnapshot {
    pub wallet: Wallet,
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub change_address: String,
    pub destinations: Vec<DestinationPayload>,
    pub hours_selection: HoursSelection,
    #[serde(default)]
    pub auto_options: bool,
}

/// Form state
#[derive(Debug, Clone)]
pub struct SendForm {
    wallet: Option<Wallet>,
    /// Addresses the user can pick from (spendable only)
    selectable: Vec<Address>,
    /// `None` until a wallet is chosen
    selected: Option<Vec<Address>>,
    change_address: String,
    destinations: DestinationList,
    policy: HoursPolicy,
    validation: ValidationResult,
}

impl Default for SendForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SendForm {
    /// Empty form with automatic hours at the default share factor
    pub fn new() -> Self {
        Self::with_policy(HoursPolicy::default())
    }

    pub fn with_policy(policy: HoursPolicy) -> Self {
        Self {
            wallet: None,
            selectable: Vec::new(),
            selected: None,
            change_address: String::new(),
            destinations: DestinationList::new(),
            policy,
            validation: ValidationResult::MissingSelection,
        }
    }

    /// Rebuild a form from a submitted snapshot, e.g. when returning from the confirmation step
    pub fn restore(snapshot: &FormSnapshot) -> Self {
        let mut policy = HoursPolicy::from_selection(&snapshot.hours_selection);
        policy.set_options_expanded(snapshot.auto_options);

        let selectable = filter_spendable(&snapshot.wallet.addresses);
        let selected: Vec<Address> = snapshot
            .addresses
            .iter()
            .filter_map(|a| selectable.iter().find(|s| s.same_address(a)).cloned())
            .collect();

        if selected.len() != snapshot.addresses.len() {
            warn!(
                "{} previously selected addresses are no longer spendable",
                snapshot.addresses.len() - selected.len()
            );
        }

        let destinations = DestinationList::from_entries(
            snapshot
                .destinations
                .iter()
                .map(|d| Destination {
                    address: d.address.clone(),
                    coins: d.coins.clone(),
                    hours: d.hours.clone().unwrap_or_default(),
                })
                .collect(),
        );

        let mut form = Self {
            wallet: Some(snapshot.wallet.clone()),
            selectable,
            selected: Some(selected),
            change_address: snapshot.change_address.clone(),
            destinations,
            policy,
            validation: ValidationResult::MissingSelection,
        };
        form.revalidate();
        form
    }

    /// Choose the source wallet. Clears the address selection.
    pub fn set_wallet(&mut self, wallet: Wallet) {
        self.selectable = filter_spendable(&wallet.addresses);
        debug!(
            wallet = %wallet.id,
            spendable = self.selectable.len(),
            "Wallet selected"
        );
        self.wallet = Some(wallet);
        self.selected = Some(Vec::new());
        self.revalidate();
    }

    /// Select source addresses by identifier, in the order given
    pub fn select_addresses<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<()> {
        if self.wallet.is_none() {
            return Err(Error::NoWalletSelected);
        }

        let selected = ids
            .iter()
            .map(|id| {
                let id = id.as_ref();
                self.selectable
                    .iter()
                    .find(|a| a.address == id)
                    .cloned()
                    .ok_or_else(|| Error::UnknownAddress(id.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        self.selected = Some(selected);
        self.revalidate();
        Ok(())
    }

    pub fn set_change_address(&mut self, address: impl Into<String>) {
        self.change_address = address.into();
    }

    pub fn add_destination(&mut self) {
        self.destinations.add_destination();
        self.revalidate();
    }

    pub fn remove_destination(&mut self, index: usize) -> Result<Destination> {
        let removed = self.destinations.remove_destination(index)?;
        self.revalidate();
        Ok(removed)
    }

    /// Edit a destination in place
    pub fn update_destination<F>(&mut self, index: usize, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Destination),
    {
        edit(self.destinations.get_mut(index)?);
        self.revalidate();
        Ok(())
    }

    /// Replace a destination wholesale
    pub fn set_destination(&mut self, index: usize, destination: Destination) -> Result<()> {
        self.update_destination(index, |d| *d = destination)
    }

    pub fn set_auto_hours(&mut self, enabled: bool) {
        self.policy.set_auto_hours(enabled);
        self.revalidate();
    }

    pub fn set_share_value(&mut self, raw: &str) -> Result<()> {
        self.policy.set_share_value(raw)
    }

    pub fn toggle_options(&mut self) {
        self.policy.toggle_options();
    }

    fn revalidate(&mut self) {
        self.validation = validate(
            self.selected.as_deref(),
            self.destinations.as_slice(),
            &self.policy,
        );
        debug!(result = %self.validation, "Form revalidated");
    }

    /// Current validation state
    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    /// Ready to submit: wallet chosen and destinations valid
    pub fn is_valid(&self) -> bool {
        self.wallet.is_some() && self.validation.is_valid()
    }

    pub fn wallet(&self) -> Option<&Wallet> {
        self.wallet.as_ref()
    }

    pub fn selectable_addresses(&self) -> &[Address] {
        &self.selectable
    }

    pub fn selected_addresses(&self) -> &[Address] {
        self.selected.as_deref().unwrap_or(&[])
    }

    /// Selected address identifiers joined for display
    pub fn selected_addresses_label(&self) -> String {
        self.selected_addresses()
            .iter()
            .map(|a| a.address.as_str())
            .collect::<Vec<_>>()
            .join(ADDRESS_LABEL_SEPARATOR)
    }

    pub fn change_address(&self) -> &str {
        &self.change_address
    }

    /// Change address to transmit; blank means none
    pub fn change_address_opt(&self) -> Option<String> {
        let trimmed = self.change_address.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    pub fn destinations(&self) -> &DestinationList {
        &self.destinations
    }

    pub fn policy(&self) -> &HoursPolicy {
        &self.policy
    }

    /// Destinations as they will be transmitted
    pub fn destination_payload(&self) -> Vec<DestinationPayload> {
        self.destinations.to_payload(&self.policy)
    }

    pub fn hours_selection(&self) -> HoursSelection {
        self.policy.hours_selection()
    }

    /// Capture the form for the submission event
    pub fn snapshot(&self) -> Result<FormSnapshot> {
        let wallet = self.wallet.clone().ok_or(Error::NoWalletSelected)?;
        Ok(FormSnapshot {
            wallet,
            addresses: self.selected_addresses().to_vec(),
            change_address: self.change_address.clone(),
            destinations: self.destination_payload(),
            hours_selection: self.hours_selection(),
            auto_options: self.policy.options_expanded(),
        })
    }
}
