//! Core data models for the paid-leave engine.
//!
//! This module contains the records exchanged with collaborators: employee
//! references, fiscal periods, leave lots, leave transactions and audit steps.

mod audit;
mod employee;
mod fiscal_period;
mod leave_lot;
mod leave_transaction;

pub use audit::AuditStep;
pub use employee::Employee;
pub use fiscal_period::FiscalPeriod;
pub(crate) use leave_lot::is_half_day_multiple;
pub use leave_lot::{LeaveLot, LotStatus};
pub use leave_transaction::{DeductionOrder, LeaveTransaction, LotAllocation, TransactionKind};
