//! Fiscal year-end carry-over processing.
//!
//! At each fiscal year boundary, lots past their retention window are
//! forfeited and the remaining balance is capped at the statutory
//! accumulation limit, reducing the oldest lots first.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::CarryoverRules;
use crate::error::{EngineError, EngineResult};
use crate::ledger::{BalanceLedger, verify_accumulation_cap};
use crate::models::{AuditStep, FiscalPeriod, LeaveLot};

/// Days removed from one lot at a year end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotForfeiture {
    /// The affected lot.
    pub lot_id: Uuid,
    /// The lot's grant date.
    pub grant_date: NaiveDate,
    /// Days forfeited from the lot.
    pub amount: Decimal,
}

/// The outcome of a year-end run for one employee.
///
/// Expiry forfeitures and cap forfeitures are reported separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryoverReport {
    /// The employee the report is for.
    pub employee_id: String,
    /// The fiscal year that ended.
    pub fiscal_year: i32,
    /// First day of the following fiscal year.
    pub boundary_date: NaiveDate,
    /// Lots that expired, with the days they still held.
    pub expired_lots: Vec<LotForfeiture>,
    /// Lots reduced to respect the accumulation cap.
    pub capped_lots: Vec<LotForfeiture>,
    /// Total days lost to expiry.
    pub forfeited_by_expiry: Decimal,
    /// Total days lost to the accumulation cap.
    pub forfeited_by_cap: Decimal,
    /// Days carried into the next fiscal year.
    pub carried_over: Decimal,
    /// The audit step recording this run.
    pub audit_step: AuditStep,
}

/// Closes a fiscal year for one employee.
///
/// 1. Every lot whose last usable day falls before the boundary date is marked
///    expired and its remaining days are forfeited. The last usable day is
///    the earlier of the lot's own expiry date and `grant_date +
///    retention_years - 1 day`.
/// 2. If the remaining lots granted before the boundary hold more than
///    `max_accumulation` days, the oldest lots are reduced first until the
///    total equals the cap.
///
/// Running a year end twice returns the first run's report without touching
/// the ledger.
///
/// # Errors
///
/// - `InvalidInput` if the rules or fiscal year are out of range
/// - `InvariantViolation` if a post-mutation check fails (rolled back)
pub fn process_year_end(
    ledger: &mut BalanceLedger,
    fiscal_period: &FiscalPeriod,
    fiscal_year_ending: i32,
    rules: &CarryoverRules,
) -> EngineResult<CarryoverReport> {
    rules.validate()?;

    if let Some(report) = ledger.year_end_report(fiscal_year_ending) {
        debug!(
            employee_id = %ledger.employee_id(),
            fiscal_year = fiscal_year_ending,
            "Year end already processed"
        );
        return Ok(report.clone());
    }

    let next_fiscal_year = fiscal_year_ending.checked_add(1).ok_or_else(|| {
        EngineError::invalid_input(
            "fiscal_year_ending",
            format!("{} is outside the supported date range", fiscal_year_ending),
        )
    })?;
    let boundary_date = fiscal_period.start_of(next_fiscal_year)?;

    let report = ledger.apply_checked("process_year_end", |ledger| {
        let balance_before: Decimal = ledger
            .lots()
            .iter()
            .filter(|lot| lot.grant_date() < boundary_date && !lot.is_marked_expired())
            .map(LeaveLot::amount_remaining)
            .sum();

        let mut expired_lots = Vec::new();
        for lot in ledger.lots_mut().iter_mut() {
            if lot.is_marked_expired() {
                continue;
            }
            let deadline = lot
                .expiry_date()
                .min(LeaveLot::expiry_for(lot.grant_date(), rules.retention_years)?);
            if boundary_date > deadline {
                let amount = lot.expire();
                expired_lots.push(LotForfeiture {
                    lot_id: lot.id(),
                    grant_date: lot.grant_date(),
                    amount,
                });
            }
        }

        let mut carried: Vec<&mut LeaveLot> = ledger
            .lots_mut()
            .iter_mut()
            .filter(|lot| lot.grant_date() < boundary_date && !lot.is_marked_expired())
            .collect();
        carried.sort_by_key(|lot| (lot.grant_date(), lot.id()));

        let total: Decimal = carried.iter().map(|lot| lot.amount_remaining()).sum();
        let mut excess = (total - rules.max_accumulation).max(Decimal::ZERO);

        let mut capped_lots = Vec::new();
        for lot in carried {
            if excess.is_zero() {
                break;
            }
            let cut = excess.min(lot.amount_remaining());
            if cut.is_zero() {
                continue;
            }
            lot.take(cut);
            capped_lots.push(LotForfeiture {
                lot_id: lot.id(),
                grant_date: lot.grant_date(),
                amount: cut,
            });
            excess -= cut;
        }

        let forfeited_by_expiry: Decimal = expired_lots.iter().map(|f| f.amount).sum();
        let forfeited_by_cap: Decimal = capped_lots.iter().map(|f| f.amount).sum();
        let carried_over = total - forfeited_by_cap;
        verify_accumulation_cap(carried_over, rules.max_accumulation)?;

        let audit_step = AuditStep {
            step_number: 1,
            rule_id: "year_end_carryover".to_string(),
            rule_name: "Year-End Carry-Over".to_string(),
            clause_ref: "carryover".to_string(),
            input: serde_json::json!({
                "fiscal_year": fiscal_year_ending,
                "boundary_date": boundary_date.to_string(),
                "retention_years": rules.retention_years,
                "max_accumulation": rules.max_accumulation.normalize().to_string(),
                "balance_before": balance_before.normalize().to_string()
            }),
            output: serde_json::json!({
                "forfeited_by_expiry": forfeited_by_expiry.normalize().to_string(),
                "forfeited_by_cap": forfeited_by_cap.normalize().to_string(),
                "carried_over": carried_over.normalize().to_string()
            }),
            reasoning: format!(
                "{} lot(s) expired forfeiting {} days; {} days exceeded the {} day cap; {} days carried into fiscal year {}",
                expired_lots.len(),
                forfeited_by_expiry.normalize(),
                forfeited_by_cap.normalize(),
                rules.max_accumulation.normalize(),
                carried_over.normalize(),
                next_fiscal_year
            ),
        };

        let report = CarryoverReport {
            employee_id: ledger.employee_id().to_string(),
            fiscal_year: fiscal_year_ending,
            boundary_date,
            expired_lots,
            capped_lots,
            forfeited_by_expiry,
            forfeited_by_cap,
            carried_over,
            audit_step,
        };
        ledger.record_year_end(report.clone());
        Ok(report)
    })?;

    info!(
        employee_id = %report.employee_id,
        fiscal_year = fiscal_year_ending,
        forfeited_by_expiry = %report.forfeited_by_expiry,
        forfeited_by_cap = %report.forfeited_by_cap,
        carried_over = %report.carried_over,
        "Year end processed"
    );

    Ok(report)
}
