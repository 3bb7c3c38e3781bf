//! Audit step model.
//!
//! Every calculated decision (a grant, a year-end carry-over, a compliance
//! verdict) carries an [`AuditStep`] recording its inputs, outputs and the
//! statutory rule applied.

use serde::{Deserialize, Serialize};

/// A single step in an audit trail recording a calculation decision.
///
/// # Example
///
/// ```
/// use leave_engine::models::AuditStep;
///
/// let step = AuditStep {
///     step_number: 1,
///     rule_id: "annual_leave_grant".to_string(),
///     rule_name: "Annual Leave Grant".to_string(),
///     clause_ref: "grant_table".to_string(),
///     input: serde_json::json!({"seniority_years": "0.5"}),
///     output: serde_json::json!({"days": "10"}),
///     reasoning: "0.5 years of seniority reaches the 0.5 year tier".to_string(),
/// };
/// assert_eq!(step.output["days"], "10");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// Reference to the statutory rule or configuration entry.
    pub clause_ref: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}
