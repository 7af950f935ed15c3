use chrono::NaiveDate;

use crate::domain::RawTransaction;

/// Keeps a raw transaction iff it is posted (not pending), a debit
/// (positive amount), carries a valid `YYYY-MM-DD` date, and a
/// non-empty id. Order-preserving and stable, so that
/// `filter(t1 ++ t2) == filter(t1) ++ filter(t2)`.
pub fn is_eligible(tx: &RawTransaction) -> bool {
    !tx.pending
        && tx.amount.is_sign_positive()
        && !tx.amount.is_zero()
        && !tx.id.is_empty()
        && NaiveDate::parse_from_str(&tx.date, "%Y-%m-%d").is_ok()
}

/// Filters a batch of raw transactions down to the ones eligible for round-up.
pub fn filter_eligible(transactions: Vec<RawTransaction>) -> Vec<RawTransaction> {
    transactions.into_iter().filter(is_eligible).collect()
}
