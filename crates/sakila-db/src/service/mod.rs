//! # Rental Services
//!
//! The three components the desk calls on every request.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller (staff_id, customer_id passed explicitly)                      │
//! │       │                                                                 │
//! │       ├──► InventoryLedger     is_available / unit_state / available   │
//! │       │                        (read only, derived from rental rows)   │
//! │       │                                                                 │
//! │       ├──► RentalManager       open_rental / close_rental              │
//! │       │                        (one transaction each)                  │
//! │       │                                                                 │
//! │       └──► AvailabilityQuery   list_available (paged, filtered)        │
//! │                                                                         │
//! │  All three return CoreResult<T>; nothing is cached between calls.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod availability;
pub mod ledger;
pub mod lifecycle;
