//! # Inventory Ledger Rules
//!
//! The state of an inventory unit is derived from rental rows, never stored.
//!
//! ## Unit State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │              check_out(rental_id)                                      │
//! │   ┌───────────┐ ─────────────────────► ┌──────────────────────────┐    │
//! │   │ Available │                        │ CheckedOut { rental_id } │    │
//! │   └───────────┘ ◄───────────────────── └──────────────────────────┘    │
//! │         ▲          check_in(rental_id)                                  │
//! │         │                                                               │
//! │      initial                                                            │
//! │                                                                         │
//! │   check_out on CheckedOut  → AlreadyRented                             │
//! │   check_in  on Available   → AlreadyReturned                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A unit is `CheckedOut` iff exactly one rental for it has no return date.
//! The database enforces "at most one"; [`derive_states`] computes the view.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{InventoryId, Rental, RentalId};

/// Derived state of one inventory unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
#[ts(export)]
pub enum UnitState {
    /// No open rental references the unit.
    #[default]
    Available,
    /// `rental_id` is the one open rental of the unit.
    CheckedOut { rental_id: RentalId },
}

impl UnitState {
    /// Builds the state from the id of the unit's open rental, if any.
    #[inline]
    pub fn from_open_rental(open_rental: Option<RentalId>) -> Self {
        match open_rental {
            Some(rental_id) => UnitState::CheckedOut { rental_id },
            None => UnitState::Available,
        }
    }

    /// True iff the unit can be rented right now.
    #[inline]
    pub fn is_available(&self) -> bool {
        matches!(self, UnitState::Available)
    }

    /// The open rental, if the unit is checked out.
    #[inline]
    pub fn open_rental(&self) -> Option<RentalId> {
        match self {
            UnitState::Available => None,
            UnitState::CheckedOut { rental_id } => Some(*rental_id),
        }
    }

    /// `Available -> CheckedOut`.
    ///
    /// ## Errors
    /// `AlreadyRented` if the unit already has an open rental.
    pub fn check_out(self, inventory_id: InventoryId, rental_id: RentalId) -> CoreResult<Self> {
        match self {
            UnitState::Available => Ok(UnitState::CheckedOut { rental_id }),
            UnitState::CheckedOut { .. } => Err(CoreError::AlreadyRented { inventory_id }),
        }
    }

    /// `CheckedOut -> Available` for the rental that checked the unit out.
    ///
    /// ## Errors
    /// `AlreadyReturned` if the unit is free, or if its open rental is a
    /// different (later) one, which means `rental_id` was closed earlier.
    pub fn check_in(self, rental_id: RentalId) -> CoreResult<Self> {
        match self {
            UnitState::CheckedOut { rental_id: open } if open == rental_id => {
                Ok(UnitState::Available)
            }
            _ => Err(CoreError::AlreadyReturned { rental_id }),
        }
    }
}

/// Derives the state of every unit from a set of rental rows.
///
/// Units with no rentals at all are `Available`. Rentals for units not in
/// `units` are ignored.
///
/// ## Example
/// ```rust
/// use sakila_core::ledger::{derive_states, UnitState};
///
/// let states = derive_states([1, 2], &[]);
/// assert_eq!(states[&1], UnitState::Available);
/// assert_eq!(states.len(), 2);
/// ```
pub fn derive_states(
    units: impl IntoIterator<Item = InventoryId>,
    rentals: &[Rental],
) -> BTreeMap<InventoryId, UnitState> {
    let mut states: BTreeMap<InventoryId, UnitState> = units
        .into_iter()
        .map(|id| (id, UnitState::Available))
        .collect();

    for rental in rentals.iter().filter(|r| r.is_open()) {
        if let Some(state) = states.get_mut(&rental.inventory_id) {
            *state = rental.unit_state();
        }
    }

    states
}

/// The available units of a derived state map.
pub fn available_units(states: &BTreeMap<InventoryId, UnitState>) -> BTreeSet<InventoryId> {
    states
        .iter()
        .filter(|(_, state)| state.is_available())
        .map(|(id, _)| *id)
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn rental(rental_id: RentalId, inventory_id: InventoryId, open: bool) -> Rental {
        let opened = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Rental {
            rental_id,
            inventory_id,
            customer_id: 7,
            staff_id: 1,
            rental_date: opened,
            return_date: if open { None } else { Some(opened) },
            rate_cents: 299,
            return_staff_id: None,
        }
    }

    #[test]
    fn test_check_out_then_in() {
        let state = UnitState::default();
        assert!(state.is_available());

        let out = state.check_out(42, 1001).unwrap();
        assert_eq!(out, UnitState::CheckedOut { rental_id: 1001 });
        assert_eq!(out.open_rental(), Some(1001));

        let back = out.check_in(1001).unwrap();
        assert!(back.is_available());
    }

    #[test]
    fn test_double_check_out_is_already_rented() {
        let out = UnitState::Available.check_out(42, 1001).unwrap();
        let err = out.check_out(42, 1002).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyRented { inventory_id: 42 }));
    }

    #[test]
    fn test_check_in_twice_is_already_returned() {
        let err = UnitState::Available.check_in(1001).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyReturned { rental_id: 1001 }));

        // The unit was returned and rented again under a new rental
        let rerented = UnitState::CheckedOut { rental_id: 1005 };
        let err = rerented.check_in(1001).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyReturned { rental_id: 1001 }));
    }

    #[test]
    fn test_derive_states_follows_open_rentals_only() {
        let rentals = vec![
            rental(1, 10, false),
            rental(2, 10, false),
            rental(3, 11, true),
            rental(4, 99, true), // unit not in the listing
        ];

        let states = derive_states([10, 11, 12], &rentals);
        assert_eq!(states[&10], UnitState::Available);
        assert_eq!(states[&11], UnitState::CheckedOut { rental_id: 3 });
        assert_eq!(states[&12], UnitState::Available);
        assert!(!states.contains_key(&99));

        let free: Vec<_> = available_units(&states).into_iter().collect();
        assert_eq!(free, vec![10, 12]);
    }

    #[test]
    fn test_state_serializes_with_tag() {
        let json = serde_json::to_string(&UnitState::CheckedOut { rental_id: 7 }).unwrap();
        assert_eq!(json, r#"{"state":"checked_out","rental_id":7}"#);
        let json = serde_json::to_string(&UnitState::Available).unwrap();
        assert_eq!(json, r#"{"state":"available"}"#);
    }
}
