//! Destination validation against the selected source addresses
//!
//! Validation is two-phase: every required field is checked syntactically
//! first, then the destination totals are checked against the balance of the
//! selected addresses. The first failure wins.

use std::fmt;

use crate::wallet::types::{droplets_to_coins, Address, MAX_COIN_DECIMALS};

use super::destinations::{requested_droplets, Destination};
use super::hours::HoursPolicy;
use super::numeric::{parse_float, parse_int, to_number};

/// Destination field being checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Coins,
    Hours,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Coins => write!(f, "coins"),
            Field::Hours => write!(f, "hours"),
        }
    }
}

/// Why a destination list is invalid
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidReason {
    /// Field is blank or not a number
    NotNumeric { index: usize, field: Field },

    /// Field is zero or negative
    NotPositive { index: usize, field: Field },

    /// Coin amount has more than 6 decimal places
    TooManyDecimals { index: usize },

    /// Hour amount is below one or fractional
    NotWholeHours { index: usize },

    /// Destinations request more coins than the selected addresses hold
    InsufficientCoins { requested: f64, available: f64 },

    /// Destinations request more hours than the selected addresses hold
    InsufficientHours { requested: u64, available: u64 },
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::NotNumeric { index, field } => {
                write!(f, "Destination {}: {} must be a number", index + 1, field)
            }
            InvalidReason::NotPositive { index, field } => {
                write!(f, "Destination {}: {} must be positive", index + 1, field)
            }
            InvalidReason::TooManyDecimals { index } => {
                write!(
                    f,
                    "Destination {}: coins allow at most {} decimal places",
                    index + 1,
                    MAX_COIN_DECIMALS
                )
            }
            InvalidReason::NotWholeHours { index } => {
                write!(f, "Destination {}: hours must be a whole number", index + 1)
            }
            InvalidReason::InsufficientCoins {
                requested,
                available,
            } => {
                write!(
                    f,
                    "Requested {} coins but selected addresses hold {}",
                    requested, available
                )
            }
            InvalidReason::InsufficientHours {
                requested,
                available,
            } => {
                write!(
                    f,
                    "Requested {} hours but selected addresses hold {}",
                    requested, available
                )
            }
        }
    }
}

/// Outcome of validating a destination list
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Valid,
    Invalid { reason: InvalidReason },
    MissingSelection,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    fn invalid(reason: InvalidReason) -> Self {
        ValidationResult::Invalid { reason }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationResult::Valid => write!(f, "valid"),
            ValidationResult::Invalid { reason } => write!(f, "invalid: {}", reason),
            ValidationResult::MissingSelection => write!(f, "no source addresses selected"),
        }
    }
}

/// Validate destinations against the selected source addresses.
///
/// `selected` is `None` when no selection has been made; an empty selection
/// is treated the same way.
pub fn validate(
    selected: Option<&[Address]>,
    destinations: &[Destination],
    policy: &HoursPolicy,
) -> ValidationResult {
    let selected = match selected {
        Some(addresses) if !addresses.is_empty() => addresses,
        _ => return ValidationResult::MissingSelection,
    };

    let manual = !policy.is_auto();

    for (index, destination) in destinations.iter().enumerate() {
        if let Some(reason) = check_field(index, Field::Coins, &destination.coins) {
            return ValidationResult::invalid(reason);
        }
        if manual {
            if let Some(reason) = check_field(index, Field::Hours, &destination.hours) {
                return ValidationResult::invalid(reason);
            }
        }
    }

    let available_droplets = selected
        .iter()
        .map(Address::droplets)
        .fold(0u64, u64::saturating_add);
    let available_hours = selected
        .iter()
        .map(|a| a.hours)
        .fold(0u64, u64::saturating_add);

    let requested = destinations
        .iter()
        .map(|d| requested_droplets(&d.coins))
        .fold(0u64, u64::saturating_add);

    if requested > available_droplets {
        return ValidationResult::invalid(InvalidReason::InsufficientCoins {
            requested: droplets_to_coins(requested),
            available: droplets_to_coins(available_droplets),
        });
    }

    if manual {
        let requested_hours = destinations
            .iter()
            .map(|d| budget_hours(&d.hours))
            .fold(0u64, u64::saturating_add);

        if requested_hours > available_hours {
            return ValidationResult::invalid(InvalidReason::InsufficientHours {
                requested: requested_hours,
                available: available_hours,
            });
        }
    }

    ValidationResult::Valid
}

/// Syntactic check of one field. Returns the first rule it breaks.
fn check_field(index: usize, field: Field, raw: &str) -> Option<InvalidReason> {
    // A space is swapped for '=' before parsing, so any space rejects the field
    let value = raw.replacen(' ', "=", 1);

    let number = match to_number(&value) {
        Some(n) if !value.trim().is_empty() => n,
        _ => return Some(InvalidReason::NotNumeric { index, field }),
    };

    if parse_float(&value).map_or(true, |v| v <= 0.0) {
        return Some(InvalidReason::NotPositive { index, field });
    }

    match field {
        Field::Coins => {
            let parts: Vec<&str> = value.split('.').collect();
            if parts.len() == 2 && parts[1].chars().count() > MAX_COIN_DECIMALS {
                return Some(InvalidReason::TooManyDecimals { index });
            }
        }
        Field::Hours => {
            let whole = match (parse_int(&value), parse_float(&value)) {
                (Some(int), Some(float)) => int == float,
                _ => false,
            };
            if number < 1.0 || !whole {
                return Some(InvalidReason::NotWholeHours { index });
            }
        }
    }

    None
}

/// Hours a validated hour field draws from the budget
fn budget_hours(raw: &str) -> u64 {
    match parse_int(raw) {
        Some(v) if v > 0.0 => v as u64,
        _ => 0,
    }
}
