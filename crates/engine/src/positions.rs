//! Aggregate loan positions.
//!
//! Positions are never stored: they are recomputed from the loan rows on
//! every read.

use serde::{Deserialize, Serialize};

use crate::{LoanKind, LoanStatus, loans};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanPositions {
    /// Outstanding on `Lend` loans, bad debts excluded.
    pub total_receivable_minor: i64,
    /// Outstanding on `Borrow` loans, whatever their status.
    pub total_payable_minor: i64,
    pub net_position_minor: i64,
    pub loan_count: u64,
    /// Rows skipped because their stored values could not be trusted.
    pub integrity_warnings: u64,
}

enum Side {
    Receivable(i64),
    Payable(i64),
    Ignored,
}

fn classify(row: &loans::Model) -> Option<Side> {
    let kind = LoanKind::try_from(row.kind.as_str()).ok()?;
    let status = LoanStatus::try_from(row.status.as_str()).ok()?;
    if row.total_amount_minor <= 0 {
        return None;
    }
    let outstanding = row.total_amount_minor.checked_sub(row.paid_amount_minor)?;
    Some(match (kind, status) {
        (LoanKind::Lend, LoanStatus::BadDebt) => Side::Ignored,
        (LoanKind::Lend, _) => Side::Receivable(outstanding),
        (LoanKind::Borrow, _) => Side::Payable(outstanding),
    })
}

/// Folds loan rows into receivable/payable totals.
///
/// Outstanding is `total - paid` as stored, so an overpaid loan reduces its
/// side. Malformed rows contribute nothing and are counted in
/// `integrity_warnings`. A net position that does not fit in `i64` is
/// reported as 0 and counted there as well.
pub fn aggregate<'a, I>(rows: I) -> LoanPositions
where
    I: IntoIterator<Item = &'a loans::Model>,
{
    let mut positions = LoanPositions::default();
    for row in rows {
        positions.loan_count += 1;
        let applied = match classify(row) {
            Some(Side::Receivable(amount)) => positions
                .total_receivable_minor
                .checked_add(amount)
                .map(|total| positions.total_receivable_minor = total),
            Some(Side::Payable(amount)) => positions
                .total_payable_minor
                .checked_add(amount)
                .map(|total| positions.total_payable_minor = total),
            Some(Side::Ignored) => Some(()),
            None => None,
        };
        if applied.is_none() {
            positions.integrity_warnings += 1;
            tracing::warn!(
                loan_id = %row.id,
                kind = %row.kind,
                status = %row.status,
                total = row.total_amount_minor,
                paid = row.paid_amount_minor,
                "skipping malformed loan row in positions"
            );
        }
    }
    match positions
        .total_receivable_minor
        .checked_sub(positions.total_payable_minor)
    {
        Some(net) => positions.net_position_minor = net,
        None => {
            positions.integrity_warnings += 1;
            tracing::warn!(
                receivable = positions.total_receivable_minor,
                payable = positions.total_payable_minor,
                "net position overflows, reporting 0"
            );
        }
    }
    positions
}
