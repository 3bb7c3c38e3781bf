//! Leave transaction models.
//!
//! A [`LeaveTransaction`] is the immutable audit record of one usage event
//! (or the reversal of one). It lists exactly which lots were touched and by
//! how much, so it can be replayed in reverse for cancellation flows.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// The order in which lots are drawn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionOrder {
    /// Newest grant date first. Older days are left to surface at expiry.
    #[default]
    Lifo,
    /// Oldest grant date first, for migrated balances.
    Fifo,
}

/// Days taken from a single lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotAllocation {
    /// The lot that was drawn down (or restored).
    pub lot_id: Uuid,
    /// Days moved.
    pub amount_taken: Decimal,
}

/// What a transaction did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionKind {
    /// Days were consumed.
    Consumption,
    /// Days from an earlier consumption were restored.
    Reversal {
        /// The consumption transaction this reverses.
        reverses: Uuid,
    },
}

/// Immutable record of one usage or reversal event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveTransaction {
    id: Uuid,
    employee_id: String,
    date: NaiveDate,
    days_consumed: Decimal,
    order: DeductionOrder,
    kind: TransactionKind,
    lots_affected: Vec<LotAllocation>,
}

impl LeaveTransaction {
    pub(crate) fn consumption(
        employee_id: &str,
        date: NaiveDate,
        order: DeductionOrder,
        lots_affected: Vec<LotAllocation>,
    ) -> Self {
        let days_consumed = lots_affected.iter().map(|a| a.amount_taken).sum();
        Self {
            id: Uuid::new_v4(),
            employee_id: employee_id.to_string(),
            date,
            days_consumed,
            order,
            kind: TransactionKind::Consumption,
            lots_affected,
        }
    }

    /// Builds the exact inverse of this transaction, touching the same lots
    /// by the same amounts in reverse order.
    pub(crate) fn reversal(&self, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id: self.employee_id.clone(),
            date,
            days_consumed: self.days_consumed,
            order: self.order,
            kind: TransactionKind::Reversal { reverses: self.id },
            lots_affected: self.lots_affected.iter().rev().copied().collect(),
        }
    }

    /// Checks the record-level invariants of this transaction.
    pub fn validate(&self) -> EngineResult<()> {
        if self.days_consumed <= Decimal::ZERO {
            return Err(EngineError::InvariantViolation {
                message: format!(
                    "transaction {} consumes non-positive {} days",
                    self.id, self.days_consumed
                ),
            });
        }
        if self.lots_affected.iter().any(|a| a.amount_taken <= Decimal::ZERO) {
            return Err(EngineError::InvariantViolation {
                message: format!("transaction {} has a non-positive allocation", self.id),
            });
        }
        let allocated: Decimal = self.lots_affected.iter().map(|a| a.amount_taken).sum();
        if allocated != self.days_consumed {
            return Err(EngineError::InvariantViolation {
                message: format!(
                    "transaction {} consumes {} but allocates {}",
                    self.id, self.days_consumed, allocated
                ),
            });
        }
        Ok(())
    }

    /// Returns the transaction id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the employee id.
    pub fn employee_id(&self) -> &str {
        &self.employee_id
    }

    /// Returns the date the leave was taken (or the reversal was recorded).
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the total number of days moved.
    pub fn days_consumed(&self) -> Decimal {
        self.days_consumed
    }

    /// Returns the deduction order that was applied.
    pub fn order(&self) -> DeductionOrder {
        self.order
    }

    /// Returns the transaction kind.
    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    /// Returns the per-lot allocations in the order they were applied.
    pub fn lots_affected(&self) -> &[LotAllocation] {
        &self.lots_affected
    }

    /// Returns true for consumption transactions.
    pub fn is_consumption(&self) -> bool {
        self.kind == TransactionKind::Consumption
    }

    /// Returns the id of the transaction reversed by this one, if any.
    pub fn reverses(&self) -> Option<Uuid> {
        match self.kind {
            TransactionKind::Reversal { reverses } => Some(reverses),
            TransactionKind::Consumption => None,
        }
    }
}
