//! Leave deduction functionality.
//!
//! This module draws requested leave days down from an employee's lots in a
//! declared order and records the result as a [`LeaveTransaction`]. It also
//! replays a transaction in reverse for cancelled requests.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::ledger::BalanceLedger;
use crate::models::{
    DeductionOrder, LeaveLot, LeaveTransaction, LotAllocation, is_half_day_multiple,
};

/// Plans which lots a request draws from, without touching the ledger.
///
/// Eligible lots are those usable on `date`, sorted by `(grant_date, id)`:
/// descending for LIFO, ascending for FIFO. Insertion order never matters.
fn plan_allocations(
    lots: &[LeaveLot],
    days_requested: Decimal,
    date: NaiveDate,
    order: DeductionOrder,
) -> (Vec<LotAllocation>, Decimal) {
    let mut eligible: Vec<&LeaveLot> = lots.iter().filter(|lot| lot.is_usable_on(date)).collect();
    eligible.sort_by_key(|lot| (lot.grant_date(), lot.id()));
    if order == DeductionOrder::Lifo {
        eligible.reverse();
    }

    let available: Decimal = eligible.iter().map(|lot| lot.amount_remaining()).sum();

    let mut outstanding = days_requested;
    let mut allocations = Vec::new();
    for lot in eligible {
        if outstanding.is_zero() {
            break;
        }
        let amount_taken = outstanding.min(lot.amount_remaining());
        allocations.push(LotAllocation {
            lot_id: lot.id(),
            amount_taken,
        });
        outstanding -= amount_taken;
    }

    (allocations, available)
}

/// Consumes leave days from the ledger.
///
/// Lots usable on `date` are walked in `order`; each gives
/// `min(outstanding, remaining)` until the request is covered. The request is
/// either fully applied or not applied at all.
///
/// # Arguments
///
/// * `ledger` - The employee's ledger
/// * `days_requested` - Days to consume, positive and in half-day units
/// * `date` - The date the leave is taken
/// * `order` - LIFO (newest grant first) or FIFO (oldest grant first)
///
/// # Errors
///
/// - `InvalidInput` if `days_requested` is not positive or not in half-day units
/// - `InsufficientBalance` if fewer days are available on `date`; the ledger
///   is left unchanged and the error carries the shortfall
/// - `InvariantViolation` if a post-mutation check fails (rolled back)
///
/// # Examples
///
/// ```
/// use leave_engine::calculation::consume;
/// use leave_engine::ledger::BalanceLedger;
/// use leave_engine::models::{DeductionOrder, LeaveLot};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let mut ledger = BalanceLedger::new("emp_001");
/// for (year, days) in [(2024, 11), (2025, 12)] {
///     let grant_date = NaiveDate::from_ymd_opt(year, 4, 1).unwrap();
///     let expiry = LeaveLot::expiry_for(grant_date, 2).unwrap();
///     let lot = LeaveLot::new("emp_001", Decimal::from(days), grant_date, expiry, year).unwrap();
///     ledger.add_lot(lot).unwrap();
/// }
///
/// let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
/// let tx = consume(&mut ledger, Decimal::from(3), date, DeductionOrder::Lifo).unwrap();
///
/// assert_eq!(tx.lots_affected().len(), 1);
/// assert_eq!(ledger.total_available(date), Decimal::from(20));
/// ```
pub fn consume(
    ledger: &mut BalanceLedger,
    days_requested: Decimal,
    date: NaiveDate,
    order: DeductionOrder,
) -> EngineResult<LeaveTransaction> {
    if days_requested <= Decimal::ZERO {
        return Err(EngineError::invalid_input(
            "days_requested",
            format!("{} must be positive", days_requested),
        ));
    }
    if !is_half_day_multiple(days_requested) {
        return Err(EngineError::invalid_input(
            "days_requested",
            format!("{} is not in half-day units", days_requested),
        ));
    }

    let (allocations, available) = plan_allocations(ledger.lots(), days_requested, date, order);

    if available < days_requested {
        let shortfall = days_requested - available;
        warn!(
            employee_id = %ledger.employee_id(),
            requested = %days_requested,
            available = %available,
            shortfall = %shortfall,
            "Leave request exceeds available balance"
        );
        return Err(EngineError::InsufficientBalance {
            employee_id: ledger.employee_id().to_string(),
            requested: days_requested,
            available,
            shortfall,
        });
    }

    let transaction = ledger.apply_checked("consume", |ledger| {
        for allocation in &allocations {
            let lot = ledger.lot_mut(allocation.lot_id).ok_or_else(|| {
                EngineError::InvariantViolation {
                    message: format!("planned lot {} disappeared", allocation.lot_id),
                }
            })?;
            lot.take(allocation.amount_taken);
        }

        let transaction =
            LeaveTransaction::consumption(ledger.employee_id(), date, order, allocations.clone());
        if transaction.days_consumed() != days_requested {
            return Err(EngineError::InvariantViolation {
                message: format!(
                    "allocated {} days for a request of {}",
                    transaction.days_consumed(),
                    days_requested
                ),
            });
        }
        ledger.record_transaction(transaction.clone());
        Ok(transaction)
    })?;

    info!(
        employee_id = %ledger.employee_id(),
        transaction_id = %transaction.id(),
        date = %date,
        days = %days_requested,
        lots = transaction.lots_affected().len(),
        order = ?order,
        "Leave consumed"
    );

    Ok(transaction)
}

/// Reverses an earlier consumption, restoring the same lots by the same amounts.
///
/// Restored days are not checked against the accumulation cap of a year end
/// that was already processed: reversing a consumption made before the
/// boundary can leave the carried balance above that cap. The cap applies
/// again at the next year end.
///
/// # Errors
///
/// - `TransactionNotFound` if the id is not in the ledger
/// - `InvalidInput` if the transaction is itself a reversal, has already
///   been reversed, or touched a lot that has since expired
pub fn reverse(
    ledger: &mut BalanceLedger,
    transaction_id: Uuid,
    date: NaiveDate,
) -> EngineResult<LeaveTransaction> {
    let original = ledger
        .transaction(transaction_id)
        .cloned()
        .ok_or(EngineError::TransactionNotFound { transaction_id })?;

    if !original.is_consumption() {
        return Err(EngineError::invalid_input(
            "transaction_id",
            format!("{} is a reversal and cannot be reversed", transaction_id),
        ));
    }
    if ledger.is_reversed(transaction_id) {
        return Err(EngineError::invalid_input(
            "transaction_id",
            format!("{} has already been reversed", transaction_id),
        ));
    }
    if let Some(expired) = original
        .lots_affected()
        .iter()
        .filter_map(|a| ledger.lot(a.lot_id))
        .find(|lot| lot.is_marked_expired())
    {
        warn!(
            employee_id = %ledger.employee_id(),
            transaction_id = %transaction_id,
            lot_id = %expired.id(),
            "Reversal blocked by expired lot"
        );
        return Err(EngineError::invalid_input(
            "transaction_id",
            format!(
                "{} drew from lot {} which has since expired",
                transaction_id,
                expired.id()
            ),
        ));
    }

    let reversal = original.reversal(date);

    ledger.apply_checked("reverse", |ledger| {
        for allocation in reversal.lots_affected() {
            let lot = ledger.lot_mut(allocation.lot_id).ok_or_else(|| {
                EngineError::InvariantViolation {
                    message: format!(
                        "transaction {} references missing lot {}",
                        transaction_id, allocation.lot_id
                    ),
                }
            })?;
            lot.restore(allocation.amount_taken);
        }
        ledger.record_transaction(reversal.clone());
        Ok(())
    })?;

    info!(
        employee_id = %ledger.employee_id(),
        transaction_id = %reversal.id(),
        reverses = %transaction_id,
        days = %reversal.days_consumed(),
        "Leave consumption reversed"
    );

    Ok(reversal)
}
