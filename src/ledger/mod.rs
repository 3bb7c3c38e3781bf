//! Per-employee leave balance ledger.
//!
//! The [`BalanceLedger`] owns every lot granted to one employee together with
//! the transaction log and processed year-ends. It is the only place where
//! balances live; the calculation operations borrow it mutably.

mod balance_ledger;
mod invariants;

pub use balance_ledger::{AddLotOutcome, BalanceLedger};
pub use invariants::{verify_accumulation_cap, verify_ledger, verify_no_resurrection};
