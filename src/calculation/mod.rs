//! Calculation logic for the paid-leave engine.
//!
//! This module contains the statutory grant calculation, leave deduction
//! and reversal, fiscal year-end carry-over, and minimum-usage compliance
//! checks. Every mutating operation takes the employee's
//! [`BalanceLedger`](crate::ledger::BalanceLedger) explicitly.

mod carryover;
mod compliance;
mod deduction;
mod grant;

pub use carryover::{CarryoverReport, LotForfeiture, process_year_end};
pub use compliance::{
    ComplianceReport, ComplianceStatus, check_ledger_compliance, check_minimum_usage,
};
pub use deduction::{consume, reverse};
pub use grant::{
    DEFAULT_FIRST_GRANT_MONTHS, GrantCalculation, calculate_grant, grant_days, grant_schedule,
    issue_grant, seniority_from_f64,
};
