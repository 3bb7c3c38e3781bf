//! Ledger invariant checks.
//!
//! These run after every mutation of a [`BalanceLedger`]; a failure rolls the
//! mutation back and surfaces `InvariantViolation`.

use std::collections::HashSet;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::LeaveLot;

use super::BalanceLedger;

/// Verifies the structural invariants of a ledger.
///
/// - every lot belongs to the ledger's employee and has `0 <= remaining <= granted`
/// - expired lots hold no remaining days
/// - lot ids and grant events are unique
/// - every transaction belongs to the employee, allocates exactly the days it
///   consumes and only references lots in the ledger
pub fn verify_ledger(ledger: &BalanceLedger) -> EngineResult<()> {
    let mut lot_ids = HashSet::new();

    for (index, lot) in ledger.lots().iter().enumerate() {
        lot.validate()?;

        if lot.employee_id() != ledger.employee_id() {
            return Err(violation(format!(
                "lot {} belongs to '{}' but ledger is for '{}'",
                lot.id(),
                lot.employee_id(),
                ledger.employee_id()
            )));
        }
        if !lot_ids.insert(lot.id()) {
            return Err(violation(format!("lot id {} appears twice", lot.id())));
        }
        if ledger.lots()[..index]
            .iter()
            .any(|earlier| earlier.same_grant_event(lot))
        {
            return Err(violation(format!(
                "grant on {} for fiscal year {} appears twice",
                lot.grant_date(),
                lot.fiscal_year()
            )));
        }
    }

    for transaction in ledger.transactions() {
        transaction.validate()?;

        if transaction.employee_id() != ledger.employee_id() {
            return Err(violation(format!(
                "transaction {} belongs to '{}'",
                transaction.id(),
                transaction.employee_id()
            )));
        }
        if let Some(missing) = transaction
            .lots_affected()
            .iter()
            .find(|a| !lot_ids.contains(&a.lot_id))
        {
            return Err(violation(format!(
                "transaction {} references unknown lot {}",
                transaction.id(),
                missing.lot_id
            )));
        }
    }

    Ok(())
}

/// Verifies that no lot marked expired before a mutation is active after it.
pub fn verify_no_resurrection(before: &[LeaveLot], after: &[LeaveLot]) -> EngineResult<()> {
    let expired: HashSet<Uuid> = before
        .iter()
        .filter(|lot| lot.is_marked_expired())
        .map(LeaveLot::id)
        .collect();

    match after
        .iter()
        .find(|lot| expired.contains(&lot.id()) && !lot.is_marked_expired())
    {
        Some(lot) => Err(violation(format!("expired lot {} was resurrected", lot.id()))),
        None => Ok(()),
    }
}

/// Verifies that a carried-over total respects the accumulation cap.
pub fn verify_accumulation_cap(carried_over: Decimal, max_accumulation: Decimal) -> EngineResult<()> {
    if carried_over > max_accumulation {
        return Err(violation(format!(
            "carried over {} exceeds accumulation cap {}",
            carried_over, max_accumulation
        )));
    }
    Ok(())
}

fn violation(message: String) -> EngineError {
    EngineError::InvariantViolation { message }
}
