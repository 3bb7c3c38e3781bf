//! Error types for the paid-leave engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while granting, consuming,
//! carrying over and auditing leave.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for the paid-leave engine.
///
/// All operations in the engine return this error type. Errors carry the
/// structured data a caller needs to build its own user-facing message
/// (for example the shortfall of a rejected leave request).
///
/// # Example
///
/// ```
/// use leave_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/policy.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/policy.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed or held invalid values.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// No statutory table is effective on the requested date.
    #[error("No statutory rules effective on {date}")]
    RulesNotFound {
        /// The date for which rules were requested.
        date: NaiveDate,
    },

    /// Input was malformed or outside its domain.
    #[error("Invalid input '{field}': {message}")]
    InvalidInput {
        /// The offending field or parameter.
        field: String,
        /// A description of what made the input invalid.
        message: String,
    },

    /// A different lot already exists for the same grant event.
    #[error(
        "Duplicate grant for employee '{employee_id}' in fiscal year {fiscal_year} on {grant_date}"
    )]
    DuplicateGrant {
        /// The employee the grant was for.
        employee_id: String,
        /// The fiscal year of the grant.
        fiscal_year: i32,
        /// The grant date of the existing lot.
        grant_date: NaiveDate,
    },

    /// A consumption request exceeds the available balance.
    #[error(
        "Insufficient balance for employee '{employee_id}': requested {requested}, available {available}, short by {shortfall}"
    )]
    InsufficientBalance {
        /// The employee whose ledger was debited.
        employee_id: String,
        /// Days requested.
        requested: Decimal,
        /// Days available on the request date.
        available: Decimal,
        /// `requested - available`.
        shortfall: Decimal,
    },

    /// A ledger invariant failed after a mutation; the mutation was rolled back.
    #[error("Ledger invariant violated: {message}")]
    InvariantViolation {
        /// A description of the violated invariant.
        message: String,
    },

    /// A referenced transaction does not exist in the ledger.
    #[error("Transaction not found: {transaction_id}")]
    TransactionNotFound {
        /// The transaction id that was looked up.
        transaction_id: Uuid,
    },
}

impl EngineError {
    pub(crate) fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
