use roundup_common::canonical::canonical_hash;
use roundup_common::domain::{ChainEntry, ChainHash, ChainPayload, RawTransaction};
use roundup_common::money::roundup;
use roundup_common::{Result, RoundupError};

/// Given a verified previous chain tip, an address, and an ordered
/// batch of eligible raw transactions, produces a sequence of linked,
/// hashed chain entries — one per input transaction, in input order.
///
/// An empty `raw_transactions` returns an empty sequence; callers
/// should treat that as a signal to skip enqueueing (§4.3 edge case).
pub fn build(
    address: &str,
    previous: &ChainEntry,
    raw_transactions: &[RawTransaction],
) -> Result<Vec<ChainEntry>> {
    if previous.payload.address != address {
        return Err(RoundupError::AddressMismatch(format!(
            "previous entry is tied to address {}, expected {address}",
            previous.payload.address
        )));
    }

    if previous.payload.currency.is_empty() {
        return Err(RoundupError::InvalidPreviousTransaction(
            "previous entry is missing a currency".to_string(),
        ));
    }

    let recomputed = canonical_hash(&previous.payload)?;
    if recomputed != previous.hash.value {
        return Err(RoundupError::PreviousTransactionHashMismatch(format!(
            "expected {}, recomputed {recomputed}",
            previous.hash.value
        )));
    }

    let mut entries = Vec::with_capacity(raw_transactions.len());
    let mut prev_count = previous.payload.count;
    let mut prev_balance = previous.payload.balance;
    let mut prev_hash_value = previous.hash.value.clone();
    let currency = previous.payload.currency.clone();
    let limit = previous.payload.limit;

    for raw in raw_transactions {
        if !raw.amount.is_sign_positive() || raw.amount.is_zero() {
            return Err(RoundupError::InvalidTransactionAmount(format!(
                "transaction {} has non-positive amount {}",
                raw.id, raw.amount
            )));
        }

        let entry_roundup = roundup(raw.amount);
        if entry_roundup.is_sign_negative() {
            return Err(RoundupError::InvalidTransactionRoundup(format!(
                "transaction {} produced a negative roundup",
                raw.id
            )));
        }

        let count = prev_count + 1;
        let balance = prev_balance - entry_roundup;
        let timestamp = if raw.date.is_empty() {
            chrono::Utc::now().to_rfc3339()
        } else {
            raw.date.clone()
        };

        let payload = ChainPayload {
            count,
            address: address.to_string(),
            amount: raw.amount,
            roundup: entry_roundup,
            balance,
            currency: currency.clone(),
            limit,
            previous: Some(prev_hash_value.clone()),
            timestamp,
            reference: raw.id.clone(),
        };

        let hash_value = canonical_hash(&payload)?;
        let entry = ChainEntry {
            hash: ChainHash::sha256(hash_value.clone()),
            payload,
            signatures: Vec::new(),
        };

        prev_count = count;
        prev_balance = balance;
        prev_hash_value = hash_value;
        entries.push(entry);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn raw(id: &str, amount: rust_decimal::Decimal, date: &str) -> RawTransaction {
        RawTransaction {
            id: id.to_string(),
            amount,
            date: date.to_string(),
            name: "merchant".to_string(),
            pending: false,
        }
    }

    fn genesis(address: &str) -> ChainEntry {
        ChainEntry::genesis(address.to_string(), "USD".to_string(), dec!(-10))
    }

    #[test]
    fn empty_batch_returns_empty_sequence() {
        let prev = genesis("addr-1");
        let out = build("addr-1", &prev, &[]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn s4_builds_linked_entries_with_expected_balances() {
        let address = "wVdC5Kb4";
        let prev = genesis(address);

        let amounts = [
            dec!(1.23), dec!(4.56), dec!(7.89), dec!(2.34), dec!(5.67),
            dec!(8.90), dec!(3.45), dec!(6.78), dec!(9.01),
        ];
        let txs: Vec<RawTransaction> = amounts
            .iter()
            .enumerate()
            .map(|(i, a)| raw(&format!("tx-{i}"), *a, "2026-01-01"))
            .collect();

        let entries = build(address, &prev, &txs).unwrap();
        assert_eq!(entries.len(), 9);

        let expected_balances = [
            dec!(-0.77), dec!(-1.21), dec!(-1.32), dec!(-1.98), dec!(-2.31),
            dec!(-2.41), dec!(-2.96), dec!(-3.18), dec!(-4.17),
        ];
        for (entry, expected) in entries.iter().zip(expected_balances.iter()) {
            assert_eq!(entry.payload.balance, *expected);
        }

        assert_eq!(entries.last().unwrap().payload.count, 9);

        let mut prior_hash = prev.hash.value.clone();
        for entry in &entries {
            assert_eq!(entry.payload.previous, Some(prior_hash.clone()));
            prior_hash = entry.hash.value.clone();
        }
    }

    #[test]
    fn s5_mismatched_previous_hash_fails() {
        let mut prev = genesis("wVdC5Kb4");
        prev.hash.value = "not-the-real-hash".to_string();

        let txs = vec![raw("tx-0", dec!(1.23), "2026-01-01")];
        let err = build("wVdC5Kb4", &prev, &txs).unwrap_err();
        assert!(matches!(err, RoundupError::PreviousTransactionHashMismatch(_)));
    }

    #[test]
    fn s6_address_mismatch_fails() {
        let prev = genesis("wVdC5Kb4");
        let txs = vec![raw("tx-0", dec!(1.23), "2026-01-01")];
        let err = build("different-address", &prev, &txs).unwrap_err();
        assert!(matches!(err, RoundupError::AddressMismatch(_)));
    }

    #[test]
    fn rejects_non_positive_transaction_amount() {
        let prev = genesis("addr-1");
        let txs = vec![raw("tx-0", dec!(-1.00), "2026-01-01")];
        let err = build("addr-1", &prev, &txs).unwrap_err();
        assert!(matches!(err, RoundupError::InvalidTransactionAmount(_)));
    }

    #[test]
    fn sum_property_final_balance_equals_previous_minus_total_roundup() {
        let prev = genesis("addr-1");
        let amounts = [dec!(1.23), dec!(4.00), dec!(9.99)];
        let txs: Vec<RawTransaction> = amounts
            .iter()
            .enumerate()
            .map(|(i, a)| raw(&format!("tx-{i}"), *a, "2026-01-01"))
            .collect();

        let entries = build("addr-1", &prev, &txs).unwrap();
        let total_roundup: rust_decimal::Decimal = entries.iter().map(|e| e.payload.roundup).sum();
        assert_eq!(entries.last().unwrap().payload.balance, prev.payload.balance - total_roundup);
    }

    #[test]
    fn hash_of_every_produced_entry_is_self_consistent() {
        let prev = genesis("addr-1");
        let txs = vec![raw("tx-0", dec!(1.23), "2026-01-01"), raw("tx-1", dec!(4.56), "2026-01-02")];
        let entries = build("addr-1", &prev, &txs).unwrap();
        for entry in &entries {
            assert_eq!(canonical_hash(&entry.payload).unwrap(), entry.hash.value);
        }
    }
}
