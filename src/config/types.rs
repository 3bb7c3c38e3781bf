//! Configuration types for statutory leave rules.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files. Statutory values (grant
//! table, retention window, accumulation cap, minimum usage) are versioned by
//! effective date so a regulation change is a new file, not a code change.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{FiscalPeriod, is_half_day_multiple};

/// Metadata about the leave policy.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyMetadata {
    /// Short code identifying the policy (e.g., "LSA-39").
    pub code: String,
    /// The human-readable name of the policy.
    pub name: String,
    /// The version of the policy files.
    pub version: String,
    /// URL to the underlying statute or policy document.
    pub source_url: String,
}

/// Fiscal year start as written in `policy.yaml`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FiscalYearStart {
    /// Month the fiscal year starts in.
    pub month: u32,
    /// Day of month the fiscal year starts on.
    pub day: u32,
}

/// Policy file structure (`policy.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Policy metadata.
    #[serde(flatten)]
    pub metadata: PolicyMetadata,
    /// When the fiscal year starts.
    pub fiscal_year_start: FiscalYearStart,
}

/// One row of the seniority to granted-days table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantTier {
    /// Minimum seniority, in years, to reach this tier.
    pub min_seniority_years: Decimal,
    /// Days granted at this tier.
    pub days: Decimal,
}

impl GrantTier {
    fn new(min_seniority_years: Decimal, days: Decimal) -> Self {
        Self {
            min_seniority_years,
            days,
        }
    }
}

/// An ordered, validated seniority to granted-days table.
///
/// Thresholds are strictly increasing and granted days never decrease, so
/// the last tier holds the statutory maximum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GrantTier>", into = "Vec<GrantTier>")]
pub struct GrantTable {
    tiers: Vec<GrantTier>,
}

impl GrantTable {
    /// Creates a grant table from its tiers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the table is empty, a threshold is negative
    /// or not strictly greater than the previous one, or granted days are
    /// negative, not in half-day units, or decrease.
    pub fn new(tiers: Vec<GrantTier>) -> EngineResult<Self> {
        if tiers.is_empty() {
            return Err(EngineError::invalid_input("grant_table", "must not be empty"));
        }

        for (index, tier) in tiers.iter().enumerate() {
            if tier.min_seniority_years < Decimal::ZERO {
                return Err(EngineError::invalid_input(
                    "grant_table",
                    format!("tier {} has negative seniority threshold", index),
                ));
            }
            if tier.days < Decimal::ZERO || !is_half_day_multiple(tier.days) {
                return Err(EngineError::invalid_input(
                    "grant_table",
                    format!("tier {} grants {} days, not a half-day multiple", index, tier.days),
                ));
            }
            if let Some(previous) = index.checked_sub(1).map(|i| tiers[i]) {
                if tier.min_seniority_years <= previous.min_seniority_years {
                    return Err(EngineError::invalid_input(
                        "grant_table",
                        format!("tier {} threshold is not increasing", index),
                    ));
                }
                if tier.days < previous.days {
                    return Err(EngineError::invalid_input(
                        "grant_table",
                        format!("tier {} grants fewer days than tier {}", index, index - 1),
                    ));
                }
            }
        }

        Ok(Self { tiers })
    }

    /// The statutory table for full-time employees: 10 days after six months
    /// of service, rising to 20 days at six and a half years.
    pub fn statutory() -> Self {
        let tier = |tenths: i64, days: i64| GrantTier::new(Decimal::new(tenths, 1), Decimal::from(days));
        Self {
            tiers: vec![
                tier(5, 10),
                tier(15, 11),
                tier(25, 12),
                tier(35, 14),
                tier(45, 16),
                tier(55, 18),
                tier(65, 20),
            ],
        }
    }

    /// Returns the tiers in ascending threshold order.
    pub fn tiers(&self) -> &[GrantTier] {
        &self.tiers
    }

    /// Returns the tier with the highest threshold not above `seniority_years`.
    pub fn tier_for(&self, seniority_years: Decimal) -> Option<&GrantTier> {
        self.tiers
            .iter()
            .rfind(|tier| tier.min_seniority_years <= seniority_years)
    }

    /// Returns the statutory ceiling of granted days.
    pub fn maximum_days(&self) -> Decimal {
        self.tiers.last().map(|tier| tier.days).unwrap_or(Decimal::ZERO)
    }
}

impl TryFrom<Vec<GrantTier>> for GrantTable {
    type Error = EngineError;

    fn try_from(tiers: Vec<GrantTier>) -> Result<Self, Self::Error> {
        Self::new(tiers)
    }
}

impl From<GrantTable> for Vec<GrantTier> {
    fn from(table: GrantTable) -> Self {
        table.tiers
    }
}

/// Expiry and accumulation limits applied at each fiscal year end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryoverRules {
    /// Years a lot stays usable after its grant date.
    pub retention_years: u32,
    /// Maximum days that may be carried into the next fiscal year.
    pub max_accumulation: Decimal,
}

impl CarryoverRules {
    /// Checks the limits are usable.
    pub fn validate(&self) -> EngineResult<()> {
        if self.retention_years == 0 {
            return Err(EngineError::invalid_input(
                "retention_years",
                "must be at least one year",
            ));
        }
        if self.max_accumulation < Decimal::ZERO {
            return Err(EngineError::invalid_input(
                "max_accumulation",
                format!("{} is negative", self.max_accumulation),
            ));
        }
        Ok(())
    }
}

impl Default for CarryoverRules {
    fn default() -> Self {
        Self {
            retention_years: 2,
            max_accumulation: Decimal::from(40),
        }
    }
}

/// The mandatory minimum-usage rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimumUsageRules {
    /// Days that must be taken within the fiscal year.
    pub threshold_days: Decimal,
    /// Employees granted fewer days than this are exempt.
    pub eligibility_floor: Decimal,
}

impl MinimumUsageRules {
    /// Checks the thresholds are usable.
    pub fn validate(&self) -> EngineResult<()> {
        if self.threshold_days < Decimal::ZERO {
            return Err(EngineError::invalid_input(
                "threshold_days",
                format!("{} is negative", self.threshold_days),
            ));
        }
        if self.eligibility_floor < Decimal::ZERO {
            return Err(EngineError::invalid_input(
                "eligibility_floor",
                format!("{} is negative", self.eligibility_floor),
            ));
        }
        Ok(())
    }
}

impl Default for MinimumUsageRules {
    fn default() -> Self {
        Self {
            threshold_days: Decimal::from(5),
            eligibility_floor: Decimal::from(10),
        }
    }
}

/// One version of the statutory rules (`tables/<effective_date>.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatutoryRules {
    /// The date from which these rules apply.
    pub effective_date: NaiveDate,
    /// Seniority to granted-days table.
    pub grant_table: GrantTable,
    /// Expiry and accumulation limits.
    pub carryover: CarryoverRules,
    /// Minimum-usage rule.
    pub minimum_usage: MinimumUsageRules,
}

impl StatutoryRules {
    /// The statutory defaults effective from the given date.
    pub fn statutory(effective_date: NaiveDate) -> Self {
        Self {
            effective_date,
            grant_table: GrantTable::statutory(),
            carryover: CarryoverRules::default(),
            minimum_usage: MinimumUsageRules::default(),
        }
    }

    /// Validates the non-table parts of the rules.
    pub fn validate(&self) -> EngineResult<()> {
        self.carryover.validate()?;
        self.minimum_usage.validate()
    }
}

/// The complete leave policy loaded from YAML files.
#[derive(Debug, Clone)]
pub struct LeavePolicy {
    /// Policy metadata.
    metadata: PolicyMetadata,
    /// Fiscal year boundary.
    fiscal_period: FiscalPeriod,
    /// Rule versions by effective date (sorted oldest first).
    rules: Vec<StatutoryRules>,
}

impl LeavePolicy {
    /// Creates a new LeavePolicy from its component parts.
    pub fn new(
        metadata: PolicyMetadata,
        fiscal_period: FiscalPeriod,
        rules: Vec<StatutoryRules>,
    ) -> Self {
        let mut sorted_rules = rules;
        sorted_rules.sort_by(|a, b| a.effective_date.cmp(&b.effective_date));
        Self {
            metadata,
            fiscal_period,
            rules: sorted_rules,
        }
    }

    /// Returns the policy metadata.
    pub fn metadata(&self) -> &PolicyMetadata {
        &self.metadata
    }

    /// Returns the fiscal period.
    pub fn fiscal_period(&self) -> FiscalPeriod {
        self.fiscal_period
    }

    /// Returns all rule versions, oldest first.
    pub fn rules(&self) -> &[StatutoryRules] {
        &self.rules
    }
}
