//! Statutory grant calculation.
//!
//! This module maps seniority to granted leave days using the statutory
//! grant table, lists the grant dates of an employee, and issues lots into
//! a ledger.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{GrantTable, StatutoryRules};
use crate::error::{EngineError, EngineResult};
use crate::ledger::{AddLotOutcome, BalanceLedger};
use crate::models::{AuditStep, Employee, FiscalPeriod, LeaveLot};

/// Months of service before the first grant.
pub const DEFAULT_FIRST_GRANT_MONTHS: u32 = 6;

/// The result of a grant calculation, including the audit step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantCalculation {
    /// Seniority at the grant date, in years.
    pub seniority_years: Decimal,
    /// Days granted.
    pub days: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Returns the number of days granted at the given seniority.
///
/// The highest tier whose threshold is at or below `seniority_years` wins.
/// Seniority below the first threshold grants nothing, and seniority beyond
/// the last threshold stays at the statutory maximum.
///
/// # Errors
///
/// Returns `InvalidInput` if `seniority_years` is negative.
///
/// # Examples
///
/// ```
/// use leave_engine::calculation::grant_days;
/// use leave_engine::config::GrantTable;
/// use rust_decimal::Decimal;
///
/// let table = GrantTable::statutory();
///
/// assert_eq!(grant_days(Decimal::new(5, 1), &table).unwrap(), Decimal::from(10));
/// assert_eq!(grant_days(Decimal::new(4, 1), &table).unwrap(), Decimal::ZERO);
/// assert_eq!(grant_days(Decimal::from(30), &table).unwrap(), Decimal::from(20));
/// ```
pub fn grant_days(seniority_years: Decimal, table: &GrantTable) -> EngineResult<Decimal> {
    if seniority_years < Decimal::ZERO {
        return Err(EngineError::invalid_input(
            "seniority_years",
            format!("{} is negative", seniority_years),
        ));
    }

    Ok(table
        .tier_for(seniority_years)
        .map(|tier| tier.days)
        .unwrap_or(Decimal::ZERO))
}

/// Converts a floating point seniority into a decimal.
///
/// # Errors
///
/// Returns `InvalidInput` for NaN, infinite or negative values.
pub fn seniority_from_f64(seniority_years: f64) -> EngineResult<Decimal> {
    if !seniority_years.is_finite() || seniority_years < 0.0 {
        return Err(EngineError::invalid_input(
            "seniority_years",
            format!("{} is not a finite, non-negative number", seniority_years),
        ));
    }
    Decimal::from_f64(seniority_years).ok_or_else(|| {
        EngineError::invalid_input(
            "seniority_years",
            format!("{} cannot be represented as a decimal", seniority_years),
        )
    })
}

/// Calculates the grant for an employee on a grant date.
pub fn calculate_grant(
    employee: &Employee,
    grant_date: NaiveDate,
    table: &GrantTable,
    step_number: u32,
) -> EngineResult<GrantCalculation> {
    let seniority_years = employee.seniority_years(grant_date)?;
    let days = grant_days(seniority_years, table)?;
    let tier = table.tier_for(seniority_years);

    let reasoning = match tier {
        Some(tier) => format!(
            "{} years of seniority reaches the {} year tier: {} days granted",
            seniority_years.round_dp(2).normalize(),
            tier.min_seniority_years.normalize(),
            days.normalize()
        ),
        None => format!(
            "{} years of seniority is below the first tier: no days granted",
            seniority_years.round_dp(2).normalize()
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "annual_leave_grant".to_string(),
        rule_name: "Annual Leave Grant".to_string(),
        clause_ref: "grant_table".to_string(),
        input: serde_json::json!({
            "employee_id": employee.id,
            "hire_date": employee.hire_date.to_string(),
            "grant_date": grant_date.to_string(),
            "seniority_years": seniority_years.round_dp(4).normalize().to_string()
        }),
        output: serde_json::json!({
            "days": days.normalize().to_string(),
            "tier_min_seniority_years": tier.map(|t| t.min_seniority_years.normalize().to_string())
        }),
        reasoning,
    };

    Ok(GrantCalculation {
        seniority_years,
        days,
        audit_step,
    })
}

/// Lists the grant dates of an employee that fall within `[from, to]`.
///
/// The first grant falls `first_grant_months` after hire, then on every
/// anniversary of that date.
pub fn grant_schedule(
    hire_date: NaiveDate,
    from: NaiveDate,
    to: NaiveDate,
    first_grant_months: u32,
) -> EngineResult<Vec<NaiveDate>> {
    if to < from {
        return Err(EngineError::invalid_input(
            "to",
            format!("{} is before {}", to, from),
        ));
    }

    let mut dates = Vec::new();
    for year in 0u32.. {
        let Some(date) = hire_date.checked_add_months(Months::new(first_grant_months + year * 12))
        else {
            break;
        };
        if date > to {
            break;
        }
        if date >= from {
            dates.push(date);
        }
    }
    Ok(dates)
}

/// Computes the grant for `grant_date` and adds it to the ledger.
///
/// Returns the created lot, or `None` when the employee is not yet entitled
/// to any days. Issuing the same grant twice is a no-op that returns the
/// existing lot.
///
/// # Errors
///
/// - `InvalidInput` if the grant date is before hire or the ledger belongs to
///   another employee
/// - `DuplicateGrant` if a different lot already exists for this grant event
pub fn issue_grant(
    ledger: &mut BalanceLedger,
    employee: &Employee,
    grant_date: NaiveDate,
    rules: &StatutoryRules,
    fiscal_period: &FiscalPeriod,
) -> EngineResult<Option<LeaveLot>> {
    let calculation = calculate_grant(employee, grant_date, &rules.grant_table, 1)?;

    if calculation.days.is_zero() {
        debug!(
            employee_id = %employee.id,
            grant_date = %grant_date,
            seniority_years = %calculation.seniority_years,
            "No entitlement at this seniority"
        );
        return Ok(None);
    }

    let lot = LeaveLot::new(
        employee.id.clone(),
        calculation.days,
        grant_date,
        LeaveLot::expiry_for(grant_date, rules.carryover.retention_years)?,
        fiscal_period.fiscal_year_of(grant_date),
    )?;

    match ledger.add_lot(lot.clone())? {
        AddLotOutcome::Added => Ok(Some(lot)),
        AddLotOutcome::AlreadyPresent => Ok(ledger
            .lots()
            .iter()
            .find(|existing| existing.same_grant_event(&lot))
            .cloned()),
    }
}
