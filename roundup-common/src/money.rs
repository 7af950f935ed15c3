use rust_decimal::Decimal;

/// Two fractional digits, fixed-point: the precision all monetary
/// values in the pipeline are normalized to before hashing or persisting.
pub const MONEY_SCALE: u32 = 2;

/// Maps a monetary amount to its positive round-up to the next whole unit.
///
/// - fractional amount (e.g. `1.23`) -> `ceil(amount) - amount` (`0.77`)
/// - positive whole amount (e.g. `4.00`) -> `1.00`
/// - non-positive amount -> `0.00`
pub fn roundup(amount: Decimal) -> Decimal {
    let amount = amount.round_dp(MONEY_SCALE);
    if amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if amount.fract().is_zero() {
        return Decimal::ONE;
    }
    (amount.ceil() - amount).round_dp(MONEY_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn s1_fractional_amount() {
        assert_eq!(roundup(dec!(1.23)), dec!(0.77));
    }

    #[test]
    fn s2_whole_amount() {
        assert_eq!(roundup(dec!(4.00)), dec!(1.00));
    }

    #[test]
    fn s3_negative_amount() {
        assert_eq!(roundup(dec!(-5.50)), dec!(0.00));
    }

    #[test]
    fn zero_amount_has_no_roundup() {
        assert_eq!(roundup(dec!(0.00)), dec!(0.00));
    }
}
