//! Minimum-usage compliance checks.
//!
//! Employees granted at least the eligibility floor in a fiscal year must
//! take a minimum number of days in that year. This module reports whether
//! they did; it never mutates a ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::MinimumUsageRules;
use crate::error::{EngineError, EngineResult};
use crate::ledger::BalanceLedger;
use crate::models::{AuditStep, FiscalPeriod};

/// Outcome of a minimum-usage check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    /// Granted fewer days than the eligibility floor; the rule does not apply.
    Exempt,
    /// The minimum was met.
    Compliant,
    /// The minimum is not yet met and the fiscal year is still open.
    AtRisk,
    /// The fiscal year closed without the minimum being met.
    NonCompliant,
}

/// A compliance verdict for one employee and fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// The employee checked.
    pub employee_id: String,
    /// The fiscal year checked.
    pub fiscal_year: i32,
    /// The verdict.
    pub status: ComplianceStatus,
    /// Days granted in the fiscal year.
    pub granted_total: Decimal,
    /// Days consumed in the fiscal year.
    pub consumed_total: Decimal,
    /// Days that had to be taken.
    pub threshold_days: Decimal,
    /// Days still missing; zero when met or exempt.
    pub shortfall: Decimal,
    /// The audit step recording this check.
    pub audit_step: AuditStep,
}

/// Checks the mandatory minimum-usage rule.
///
/// The threshold is inclusive: consuming exactly `threshold_days` is
/// compliant. Whether the fiscal year has closed is an explicit input so the
/// verdict never depends on the wall clock.
///
/// # Errors
///
/// Returns `InvalidInput` if either total is negative.
///
/// # Examples
///
/// ```
/// use leave_engine::calculation::{ComplianceStatus, check_minimum_usage};
/// use leave_engine::config::MinimumUsageRules;
/// use rust_decimal::Decimal;
///
/// let report = check_minimum_usage(
///     "emp_001",
///     2025,
///     Decimal::from(10),
///     Decimal::from(5),
///     true,
///     &MinimumUsageRules::default(),
/// )
/// .unwrap();
/// assert_eq!(report.status, ComplianceStatus::Compliant);
/// ```
pub fn check_minimum_usage(
    employee_id: &str,
    fiscal_year: i32,
    granted_total: Decimal,
    consumed_total: Decimal,
    fiscal_year_closed: bool,
    rules: &MinimumUsageRules,
) -> EngineResult<ComplianceReport> {
    if granted_total < Decimal::ZERO {
        return Err(EngineError::invalid_input(
            "granted_total",
            format!("{} is negative", granted_total),
        ));
    }
    if consumed_total < Decimal::ZERO {
        return Err(EngineError::invalid_input(
            "consumed_total",
            format!("{} is negative", consumed_total),
        ));
    }

    let (status, reasoning) = if granted_total < rules.eligibility_floor {
        (
            ComplianceStatus::Exempt,
            format!(
                "{} days granted is below the {} day eligibility floor; minimum usage does not apply",
                granted_total.normalize(),
                rules.eligibility_floor.normalize()
            ),
        )
    } else if consumed_total >= rules.threshold_days {
        (
            ComplianceStatus::Compliant,
            format!(
                "{} days taken meets the {} day minimum",
                consumed_total.normalize(),
                rules.threshold_days.normalize()
            ),
        )
    } else if fiscal_year_closed {
        (
            ComplianceStatus::NonCompliant,
            format!(
                "Fiscal year {} closed with {} days taken, below the {} day minimum",
                fiscal_year,
                consumed_total.normalize(),
                rules.threshold_days.normalize()
            ),
        )
    } else {
        (
            ComplianceStatus::AtRisk,
            format!(
                "{} days taken so far in fiscal year {}, below the {} day minimum",
                consumed_total.normalize(),
                fiscal_year,
                rules.threshold_days.normalize()
            ),
        )
    };

    let shortfall = match status {
        ComplianceStatus::AtRisk | ComplianceStatus::NonCompliant => {
            rules.threshold_days - consumed_total
        }
        ComplianceStatus::Exempt | ComplianceStatus::Compliant => Decimal::ZERO,
    };

    let audit_step = AuditStep {
        step_number: 1,
        rule_id: "minimum_usage_check".to_string(),
        rule_name: "Minimum Usage Check".to_string(),
        clause_ref: "minimum_usage".to_string(),
        input: serde_json::json!({
            "employee_id": employee_id,
            "fiscal_year": fiscal_year,
            "granted_total": granted_total.normalize().to_string(),
            "consumed_total": consumed_total.normalize().to_string(),
            "fiscal_year_closed": fiscal_year_closed,
            "threshold_days": rules.threshold_days.normalize().to_string(),
            "eligibility_floor": rules.eligibility_floor.normalize().to_string()
        }),
        output: serde_json::json!({
            "status": status,
            "shortfall": shortfall.normalize().to_string()
        }),
        reasoning,
    };

    Ok(ComplianceReport {
        employee_id: employee_id.to_string(),
        fiscal_year,
        status,
        granted_total,
        consumed_total,
        threshold_days: rules.threshold_days,
        shortfall,
        audit_step,
    })
}

/// Checks minimum usage straight from a ledger.
///
/// Granted days are those of lots belonging to `fiscal_year`; consumed days
/// are the net consumptions dated inside it.
pub fn check_ledger_compliance(
    ledger: &BalanceLedger,
    fiscal_period: &FiscalPeriod,
    fiscal_year: i32,
    fiscal_year_closed: bool,
    rules: &MinimumUsageRules,
) -> EngineResult<ComplianceReport> {
    check_minimum_usage(
        ledger.employee_id(),
        fiscal_year,
        ledger.granted_in(fiscal_year),
        ledger.consumed_in(fiscal_period, fiscal_year),
        fiscal_year_closed,
        rules,
    )
}
