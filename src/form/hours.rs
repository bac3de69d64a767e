//! Coin-hour allocation policy
//!
//! Under manual hours every destination carries its own hour amount. Under
//! automatic hours the transaction service distributes hours itself, sending
//! `share_factor` of the available hours to the destinations.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::numeric::{parse_float, to_fixed_2};

/// Default share factor for automatic hours
pub const DEFAULT_SHARE_FACTOR: &str = "0.5";

/// How automatic hours are distributed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoHoursMode {
    /// Send a fraction of the available hours, split across destinations by coins
    Share,
}

/// Resolved hours policy as sent to the transaction service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HoursSelection {
    Manual,
    Auto {
        mode: AutoHoursMode,
        share_factor: String,
    },
}

impl HoursSelection {
    pub fn is_auto(&self) -> bool {
        matches!(self, HoursSelection::Auto { .. })
    }
}

/// Hours policy state held by the form
#[derive(Debug, Clone, PartialEq)]
pub struct HoursPolicy {
    auto: bool,
    share_factor: String,
    options_expanded: bool,
}

impl Default for HoursPolicy {
    fn default() -> Self {
        Self {
            auto: true,
            share_factor: DEFAULT_SHARE_FACTOR.to_string(),
            options_expanded: false,
        }
    }
}

impl HoursPolicy {
    /// Create a policy with the given mode and share factor
    pub fn new(auto: bool, share_factor: impl Into<String>) -> Self {
        Self {
            auto,
            share_factor: share_factor.into(),
            options_expanded: false,
        }
    }

    pub fn is_auto(&self) -> bool {
        self.auto
    }

    pub fn share_factor(&self) -> &str {
        &self.share_factor
    }

    /// Whether the advanced (share factor) options are expanded
    pub fn options_expanded(&self) -> bool {
        self.options_expanded
    }

    /// Switch between automatic and manual hours.
    ///
    /// Returns true if the mode changed. Entering automatic mode collapses the
    /// advanced options; hour values stored on destinations are never touched.
    pub fn set_auto_hours(&mut self, enabled: bool) -> bool {
        let changed = self.auto != enabled;
        self.auto = enabled;

        if enabled && changed {
            self.options_expanded = false;
        }

        debug!(auto = enabled, changed, "Hours policy set");
        changed
    }

    /// Update the share factor from raw slider/text input, formatted to two decimals.
    ///
    /// The value is not bounded to [0, 1].
    pub fn set_share_value(&mut self, raw: &str) -> Result<()> {
        let value = parse_float(raw)
            .filter(|v| v.is_finite())
            .ok_or_else(|| Error::InvalidShareFactor(raw.to_string()))?;

        if !(0.0..=1.0).contains(&value) {
            warn!("Share factor {} is outside [0, 1]", value);
        }

        self.share_factor = to_fixed_2(value);
        Ok(())
    }

    /// Flip the advanced options panel
    pub fn toggle_options(&mut self) {
        self.options_expanded = !self.options_expanded;
    }

    pub(crate) fn set_options_expanded(&mut self, expanded: bool) {
        self.options_expanded = expanded;
    }

    /// Resolve into the selection sent with the transaction request
    pub fn hours_selection(&self) -> HoursSelection {
        if self.auto {
            HoursSelection::Auto {
                mode: AutoHoursMode::Share,
                share_factor: self.share_factor.clone(),
            }
        } else {
            HoursSelection::Manual
        }
    }

    /// Rebuild the policy from a previously resolved selection
    pub fn from_selection(selection: &HoursSelection) -> Self {
        match selection {
            HoursSelection::Manual => Self::new(false, DEFAULT_SHARE_FACTOR),
            HoursSelection::Auto { share_factor, .. } => Self::new(true, share_factor.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = HoursPolicy::default();
        assert!(policy.is_auto());
        assert_eq!(policy.share_factor(), "0.5");
        assert!(!policy.options_expanded());
    }

    #[test]
    fn test_entering_auto_collapses_options() {
        let mut policy = HoursPolicy::default();
        policy.set_auto_hours(false);
        policy.toggle_options();
        assert!(policy.options_expanded());

        assert!(policy.set_auto_hours(true));
        assert!(!policy.options_expanded());
    }

    #[test]
    fn test_entering_manual_keeps_options() {
        let mut policy = HoursPolicy::default();
        policy.toggle_options();

        assert!(policy.set_auto_hours(false));
        assert!(policy.options_expanded());
        assert!(!policy.set_auto_hours(false));
    }

    #[test]
    fn test_share_value_formatting() {
        let mut policy = HoursPolicy::default();

        policy.set_share_value("0.333").unwrap();
        assert_eq!(policy.share_factor(), "0.33");

        policy.set_share_value("1").unwrap();
        assert_eq!(policy.share_factor(), "1.00");

        // Exact ties round up
        policy.set_share_value("0.125").unwrap();
        assert_eq!(policy.share_factor(), "0.13");
        policy.set_share_value("0.625").unwrap();
        assert_eq!(policy.share_factor(), "0.63");

        // Not clamped
        policy.set_share_value("1.5").unwrap();
        assert_eq!(policy.share_factor(), "1.50");
    }

    #[test]
    fn test_share_value_rejects_garbage() {
        let mut policy = HoursPolicy::default();
        let result = policy.set_share_value("half");
        assert!(matches!(result, Err(Error::InvalidShareFactor(_))));
        assert_eq!(policy.share_factor(), "0.5");
    }

    #[test]
    fn test_selection_wire_format() {
        let auto = HoursPolicy::default().hours_selection();
        assert_eq!(
            serde_json::to_value(&auto).unwrap(),
            serde_json::json!({"type": "auto", "mode": "share", "share_factor": "0.5"})
        );

        let manual = HoursPolicy::new(false, "0.5").hours_selection();
        assert_eq!(
            serde_json::to_value(&manual).unwrap(),
            serde_json::json!({"type": "manual"})
        );
    }

    #[test]
    fn test_from_selection() {
        let selection = HoursSelection::Auto {
            mode: AutoHoursMode::Share,
            share_factor: "0.25".to_string(),
        };
        let policy = HoursPolicy::from_selection(&selection);
        assert!(policy.is_auto());
        assert_eq!(policy.share_factor(), "0.25");

        assert!(!HoursPolicy::from_selection(&HoursSelection::Manual).is_auto());
    }
}
