//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading statutory
//! leave policies from YAML files.

use chrono::NaiveDate;
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::FiscalPeriod;

use super::types::{LeavePolicy, PolicyConfig, PolicyMetadata, StatutoryRules};

/// Loads and provides access to a leave policy.
///
/// The `ConfigLoader` reads YAML configuration files from a directory
/// and selects the statutory rules in force on a given date.
///
/// # Directory Structure
///
/// ```text
/// config/statutory/
/// ├── policy.yaml          # Policy metadata and fiscal year start
/// └── tables/
///     └── 2019-04-01.yaml  # Statutory rules effective from this date
/// ```
///
/// # Example
///
/// ```no_run
/// use leave_engine::config::ConfigLoader;
/// use chrono::NaiveDate;
///
/// let loader = ConfigLoader::load("./config/statutory").unwrap();
///
/// let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
/// let rules = loader.rules_on(date).unwrap();
/// println!("Accumulation cap: {}", rules.carryover.max_accumulation);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    policy: LeavePolicy,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/statutory")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing (`ConfigNotFound`)
    /// - Any file contains invalid YAML or out-of-range values (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        // Load policy.yaml
        let policy_path = path.join("policy.yaml");
        let policy = Self::load_yaml::<PolicyConfig>(&policy_path)?;
        let fiscal_period =
            FiscalPeriod::new(policy.fiscal_year_start.month, policy.fiscal_year_start.day)
                .map_err(|e| EngineError::ConfigParseError {
                    path: policy_path.display().to_string(),
                    message: e.to_string(),
                })?;

        // Load all rule versions from the tables directory
        let tables_dir = path.join("tables");
        let rules = Self::load_tables(&tables_dir)?;

        tracing::debug!(
            code = %policy.metadata.code,
            versions = rules.len(),
            "Loaded leave policy"
        );

        Ok(Self {
            policy: LeavePolicy::new(policy.metadata, fiscal_period, rules),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads all rule files from the tables directory.
    fn load_tables(tables_dir: &Path) -> EngineResult<Vec<StatutoryRules>> {
        let tables_dir_str = tables_dir.display().to_string();

        if !tables_dir.exists() {
            return Err(EngineError::ConfigNotFound {
                path: tables_dir_str,
            });
        }

        let entries = fs::read_dir(tables_dir).map_err(|_| EngineError::ConfigNotFound {
            path: tables_dir_str.clone(),
        })?;

        let mut rules = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: tables_dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                let table = Self::load_yaml::<StatutoryRules>(&path)?;
                table.validate().map_err(|e| EngineError::ConfigParseError {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                rules.push(table);
            }
        }

        if rules.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no statutory tables found)", tables_dir_str),
            });
        }

        Ok(rules)
    }

    /// Returns the underlying leave policy.
    pub fn policy(&self) -> &LeavePolicy {
        &self.policy
    }

    /// Returns the policy metadata.
    pub fn metadata(&self) -> &PolicyMetadata {
        self.policy.metadata()
    }

    /// Returns the fiscal period defined by the policy.
    pub fn fiscal_period(&self) -> FiscalPeriod {
        self.policy.fiscal_period()
    }

    /// Gets the statutory rules in force on a given date.
    ///
    /// The method finds the most recent table that is effective on or before
    /// the given date.
    ///
    /// # Errors
    ///
    /// Returns `RulesNotFound` if no table is effective on the date.
    pub fn rules_on(&self, date: NaiveDate) -> EngineResult<&StatutoryRules> {
        self.policy
            .rules()
            .iter()
            .rfind(|rules| rules.effective_date <= date)
            .ok_or(EngineError::RulesNotFound { date })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn config_path() -> &'static str {
        "./config/statutory"
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.metadata().code, "LSA-39");
    }

    #[test]
    fn test_fiscal_period_loaded() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let period = loader.fiscal_period();

        assert_eq!(period.start_month(), 4);
        assert_eq!(period.start_day(), 1);
    }

    #[test]
    fn test_rules_on_matches_statutory_defaults() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let rules = loader.rules_on(date).unwrap();

        assert_eq!(rules.grant_table, crate::config::GrantTable::statutory());
        assert_eq!(rules.carryover.retention_years, 2);
        assert_eq!(rules.carryover.max_accumulation, dec("40"));
        assert_eq!(rules.minimum_usage.threshold_days, dec("5"));
        assert_eq!(rules.minimum_usage.eligibility_floor, dec("10"));
    }

    #[test]
    fn test_older_table_selected_for_earlier_date() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let date = NaiveDate::from_ymd_opt(2018, 6, 1).unwrap();
        let rules = loader.rules_on(date).unwrap();

        assert_eq!(rules.effective_date, NaiveDate::from_ymd_opt(2010, 4, 1).unwrap());
        assert_eq!(rules.minimum_usage.threshold_days, Decimal::ZERO);
    }

    #[test]
    fn test_rules_not_found_before_first_table() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();

        match loader.rules_on(date) {
            Err(EngineError::RulesNotFound { date: d }) => assert_eq!(d, date),
            other => panic!("Expected RulesNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("policy.yaml"));
            }
            other => panic!("Expected ConfigNotFound error, got {:?}", other),
        }
    }
}
