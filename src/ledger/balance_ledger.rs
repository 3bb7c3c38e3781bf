//! The per-employee balance ledger.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::CarryoverReport;
use crate::error::{EngineError, EngineResult};
use crate::models::{FiscalPeriod, LeaveLot, LeaveTransaction};

use super::invariants::{verify_ledger, verify_no_resurrection};

/// Result of adding a lot to a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddLotOutcome {
    /// The lot was appended.
    Added,
    /// An identical grant was already present; nothing changed.
    AlreadyPresent,
}

/// Owns the leave lots and transaction log of a single employee.
///
/// All mutating operations take `&mut self`, so a ledger has exactly one
/// writer at a time. Remaining balances can only be changed through
/// [`consume`](crate::calculation::consume),
/// [`reverse`](crate::calculation::reverse) and
/// [`process_year_end`](crate::calculation::process_year_end).
///
/// # Example
///
/// ```
/// use leave_engine::ledger::BalanceLedger;
/// use leave_engine::models::LeaveLot;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let mut ledger = BalanceLedger::new("emp_001");
/// let grant_date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
/// let lot = LeaveLot::new(
///     "emp_001",
///     Decimal::from(11),
///     grant_date,
///     LeaveLot::expiry_for(grant_date, 2).unwrap(),
///     2025,
/// )
/// .unwrap();
/// ledger.add_lot(lot).unwrap();
///
/// let as_of = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
/// assert_eq!(ledger.total_available(as_of), Decimal::from(11));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceLedger {
    employee_id: String,
    lots: Vec<LeaveLot>,
    transactions: Vec<LeaveTransaction>,
    #[serde(default)]
    year_ends: BTreeMap<i32, CarryoverReport>,
}

impl BalanceLedger {
    /// Creates an empty ledger for the given employee.
    pub fn new(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            lots: Vec::new(),
            transactions: Vec::new(),
            year_ends: BTreeMap::new(),
        }
    }

    /// Rebuilds a ledger from persisted lot, transaction and year-end records.
    ///
    /// The year-end reports keep processed fiscal years idempotent after the
    /// rebuild.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the records do not form a consistent
    /// ledger for `employee_id`, or if a fiscal year has more than one report.
    pub fn from_records(
        employee_id: impl Into<String>,
        lots: Vec<LeaveLot>,
        transactions: Vec<LeaveTransaction>,
        year_end_reports: Vec<CarryoverReport>,
    ) -> EngineResult<Self> {
        let employee_id = employee_id.into();
        let mut year_ends = BTreeMap::new();

        for report in year_end_reports {
            if report.employee_id != employee_id {
                return Err(EngineError::InvariantViolation {
                    message: format!(
                        "year-end report for '{}' cannot be added to the ledger of '{}'",
                        report.employee_id, employee_id
                    ),
                });
            }
            let fiscal_year = report.fiscal_year;
            if year_ends.insert(fiscal_year, report).is_some() {
                return Err(EngineError::InvariantViolation {
                    message: format!("fiscal year {} has more than one year-end report", fiscal_year),
                });
            }
        }

        let ledger = Self {
            employee_id,
            lots,
            transactions,
            year_ends,
        };
        ledger.verify()?;
        Ok(ledger)
    }

    /// Returns the stored year-end reports, oldest fiscal year first.
    pub fn year_end_reports(&self) -> impl Iterator<Item = &CarryoverReport> {
        self.year_ends.values()
    }

    /// Verifies every ledger invariant, for example after deserialising.
    pub fn verify(&self) -> EngineResult<()> {
        verify_ledger(self)
    }

    /// Returns the employee id.
    pub fn employee_id(&self) -> &str {
        &self.employee_id
    }

    /// Returns all lots, including exhausted and expired ones.
    pub fn lots(&self) -> &[LeaveLot] {
        &self.lots
    }

    /// Looks up a lot by id.
    pub fn lot(&self, lot_id: Uuid) -> Option<&LeaveLot> {
        self.lots.iter().find(|lot| lot.id() == lot_id)
    }

    /// Returns the transaction log in recording order.
    pub fn transactions(&self) -> &[LeaveTransaction] {
        &self.transactions
    }

    /// Looks up a transaction by id.
    pub fn transaction(&self, transaction_id: Uuid) -> Option<&LeaveTransaction> {
        self.transactions.iter().find(|tx| tx.id() == transaction_id)
    }

    /// Returns true if a reversal of the given transaction has been recorded.
    pub fn is_reversed(&self, transaction_id: Uuid) -> bool {
        self.transactions
            .iter()
            .any(|tx| tx.reverses() == Some(transaction_id))
    }

    /// Returns the days available on the given date.
    ///
    /// This is the sum of `amount_remaining` over lots that have been granted
    /// on or before `as_of` and are not expired as of that date.
    pub fn total_available(&self, as_of: NaiveDate) -> Decimal {
        self.lots
            .iter()
            .filter(|lot| lot.grant_date() <= as_of && !lot.is_expired_as_of(as_of))
            .map(LeaveLot::amount_remaining)
            .sum()
    }

    /// Returns the non-expired lots as of the given date, oldest grant first.
    pub fn breakdown(&self, as_of: NaiveDate) -> Vec<LeaveLot> {
        let mut lots: Vec<LeaveLot> = self
            .lots
            .iter()
            .filter(|lot| lot.grant_date() <= as_of && !lot.is_expired_as_of(as_of))
            .cloned()
            .collect();
        lots.sort_by_key(|lot| (lot.grant_date(), lot.id()));
        lots
    }

    /// Adds a newly granted lot.
    ///
    /// Granting is idempotent: re-adding a lot with the same grant event and
    /// terms is a no-op.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the lot belongs to another employee or is malformed
    /// - `DuplicateGrant` if a lot with different terms exists for the same
    ///   employee, fiscal year and grant date
    pub fn add_lot(&mut self, lot: LeaveLot) -> EngineResult<AddLotOutcome> {
        lot.validate()?;

        if lot.employee_id() != self.employee_id {
            return Err(EngineError::invalid_input(
                "employee_id",
                format!(
                    "lot for '{}' cannot be added to the ledger of '{}'",
                    lot.employee_id(),
                    self.employee_id
                ),
            ));
        }

        if let Some(existing) = self.lots.iter().find(|l| l.same_grant_event(&lot)) {
            if existing.same_grant_terms(&lot) {
                debug!(
                    employee_id = %self.employee_id,
                    fiscal_year = lot.fiscal_year(),
                    grant_date = %lot.grant_date(),
                    "Grant already recorded, skipping"
                );
                return Ok(AddLotOutcome::AlreadyPresent);
            }
            warn!(
                employee_id = %self.employee_id,
                fiscal_year = lot.fiscal_year(),
                grant_date = %lot.grant_date(),
                existing_days = %existing.amount_granted(),
                requested_days = %lot.amount_granted(),
                "Conflicting grant rejected"
            );
            return Err(EngineError::DuplicateGrant {
                employee_id: self.employee_id.clone(),
                fiscal_year: lot.fiscal_year(),
                grant_date: lot.grant_date(),
            });
        }

        if self.lots.iter().any(|l| l.id() == lot.id()) {
            return Err(EngineError::invalid_input(
                "id",
                format!("lot {} is already in the ledger", lot.id()),
            ));
        }

        info!(
            employee_id = %self.employee_id,
            lot_id = %lot.id(),
            fiscal_year = lot.fiscal_year(),
            days = %lot.amount_granted(),
            expiry_date = %lot.expiry_date(),
            "Leave lot granted"
        );
        self.lots.push(lot);
        Ok(AddLotOutcome::Added)
    }

    /// Returns the days granted by lots belonging to the given fiscal year.
    pub fn granted_in(&self, fiscal_year: i32) -> Decimal {
        self.lots
            .iter()
            .filter(|lot| lot.fiscal_year() == fiscal_year)
            .map(LeaveLot::amount_granted)
            .sum()
    }

    /// Returns the net days consumed on dates inside the given fiscal year.
    ///
    /// Consumptions that were later reversed do not count.
    pub fn consumed_in(&self, fiscal_period: &FiscalPeriod, fiscal_year: i32) -> Decimal {
        self.transactions
            .iter()
            .filter(|tx| tx.is_consumption())
            .filter(|tx| fiscal_period.contains(fiscal_year, tx.date()))
            .filter(|tx| !self.is_reversed(tx.id()))
            .map(LeaveTransaction::days_consumed)
            .sum()
    }

    /// Returns true if the year-end for the given fiscal year has been processed.
    pub fn is_year_processed(&self, fiscal_year: i32) -> bool {
        self.year_ends.contains_key(&fiscal_year)
    }

    /// Returns the stored carry-over report for a processed fiscal year.
    pub fn year_end_report(&self, fiscal_year: i32) -> Option<&CarryoverReport> {
        self.year_ends.get(&fiscal_year)
    }

    pub(crate) fn lots_mut(&mut self) -> &mut Vec<LeaveLot> {
        &mut self.lots
    }

    pub(crate) fn lot_mut(&mut self, lot_id: Uuid) -> Option<&mut LeaveLot> {
        self.lots.iter_mut().find(|lot| lot.id() == lot_id)
    }

    pub(crate) fn record_transaction(&mut self, transaction: LeaveTransaction) {
        self.transactions.push(transaction);
    }

    pub(crate) fn record_year_end(&mut self, report: CarryoverReport) {
        self.year_ends.insert(report.fiscal_year, report);
    }

    /// Runs a mutation and commits it only if every invariant still holds.
    ///
    /// On any error, from the mutation itself or from the post-mutation
    /// checks, the ledger is restored to its prior state.
    pub(crate) fn apply_checked<T>(
        &mut self,
        operation: &str,
        mutate: impl FnOnce(&mut Self) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let snapshot = self.clone();

        let result = mutate(self).and_then(|value| {
            verify_ledger(self)?;
            verify_no_resurrection(&snapshot.lots, &self.lots)?;
            Ok(value)
        });

        if let Err(err) = &result {
            warn!(
                employee_id = %self.employee_id,
                operation,
                error = %err,
                "Ledger mutation rolled back"
            );
            *self = snapshot;
        }

        result
    }
}
